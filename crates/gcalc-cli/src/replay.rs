//! Script replay: drive a session through a list of edits and report the
//! resulting equations and encoded program.
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   { "op": "create" },
//!   { "op": "edit", "id": 0, "text": "a=2" },
//!   { "op": "create" },
//!   { "op": "edit", "id": 1, "text": "y=ax" },
//!   { "op": "toggle", "id": 1 },
//!   { "op": "delete", "id": 0 }
//! ]
//! ```

use std::path::Path;

use gcalc_core::{EquationId, EquationView};
use gcalc_render::{encode, pack, EncodeError, EncoderConfig, RenderProgram};
use gcalc_session::{ActionHint, ExpressionCompiler, Session, SessionError, StepReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Create,
    Edit {
        id: u32,
        text: String,
        #[serde(default)]
        hint: Option<ActionHint>,
    },
    Refresh {
        id: u32,
    },
    Toggle {
        id: u32,
    },
    Delete {
        id: u32,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read script '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("step {index}: {source}")]
    Step { index: usize, source: SessionError },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl ReplayError {
    /// Process exit code: 1 for script problems, 3 for I/O.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReplayError::Io { .. } => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeLine {
    pub id: EquationId,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&StepReport> for OutcomeLine {
    fn from(step: &StepReport) -> Self {
        OutcomeLine {
            id: step.id,
            outcome: step.outcome.label(),
            error: step.outcome.error().map(|err| err.to_string()),
        }
    }
}

/// What one script step did.
#[derive(Debug, Clone, Serialize)]
pub struct StepLine {
    pub index: usize,
    pub id: EquationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OutcomeLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cascade: Vec<OutcomeLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextureSize {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutput {
    pub steps: Vec<StepLine>,
    pub equations: Vec<EquationView>,
    pub program: RenderProgram,
    pub texture: TextureSize,
}

pub fn load_script(path: &Path) -> Result<Vec<Step>, ReplayError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Runs every step in order and encodes the final program.
pub async fn replay<C: ExpressionCompiler>(
    session: &Session<C>,
    steps: &[Step],
    encoder: &EncoderConfig,
) -> Result<ReplayOutput, ReplayError> {
    let mut lines = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        let at = |source| ReplayError::Step { index, source };
        let line = match step {
            Step::Create => {
                let view = session.create().await.map_err(at)?;
                StepLine {
                    index,
                    id: view.id,
                    outcome: None,
                    cascade: Vec::new(),
                }
            }
            Step::Edit { id, text, hint } => {
                let report = session
                    .edit(EquationId(*id), text.as_str(), *hint)
                    .await
                    .map_err(at)?;
                StepLine {
                    index,
                    id: EquationId(*id),
                    outcome: Some(OutcomeLine::from(&report.origin)),
                    cascade: report.cascade.iter().map(OutcomeLine::from).collect(),
                }
            }
            Step::Refresh { id } => {
                let report = session.refresh(EquationId(*id)).await.map_err(at)?;
                StepLine {
                    index,
                    id: EquationId(*id),
                    outcome: Some(OutcomeLine::from(&report.origin)),
                    cascade: report.cascade.iter().map(OutcomeLine::from).collect(),
                }
            }
            Step::Toggle { id } => {
                session
                    .toggle_visibility(EquationId(*id))
                    .await
                    .map_err(at)?;
                StepLine {
                    index,
                    id: EquationId(*id),
                    outcome: None,
                    cascade: Vec::new(),
                }
            }
            Step::Delete { id } => {
                let report = session.delete(EquationId(*id)).await.map_err(at)?;
                if let Some(err) = &report.notification_error {
                    tracing::warn!("step {}: delete notification failed: {}", index, err);
                }
                StepLine {
                    index,
                    id: report.id,
                    outcome: None,
                    cascade: report.cascade.iter().map(OutcomeLine::from).collect(),
                }
            }
        };
        tracing::debug!("step {} done: {:?}", index, step);
        lines.push(line);
    }

    let program = encode(&session.snapshot())?;
    let texture = pack(&program, encoder)?;
    Ok(ReplayOutput {
        steps: lines,
        equations: session.views().await,
        program,
        texture: TextureSize {
            width: texture.width,
            height: texture.height,
        },
    })
}

#[cfg(test)]
mod tests {
    use gcalc_session::testing::RecordingCompiler;
    use gcalc_session::SessionConfig;

    use super::*;

    fn script(json: &str) -> Vec<Step> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_steps() {
        let steps = script(
            r#"[{"op":"create"},{"op":"edit","id":0,"text":"y=x","hint":"add"},{"op":"delete","id":0}]"#,
        );
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[1],
            Step::Edit {
                id: 0,
                text: "y=x".to_string(),
                hint: Some(ActionHint::Add)
            }
        );
    }

    #[tokio::test]
    async fn replays_into_an_encoded_program() {
        let session = Session::new(RecordingCompiler::new(), SessionConfig::default());
        let steps = script(
            r#"[
                {"op":"create"},
                {"op":"edit","id":0,"text":"a=2"},
                {"op":"create"},
                {"op":"edit","id":1,"text":"y=ax"},
                {"op":"create"},
                {"op":"edit","id":2,"text":"y=x"},
                {"op":"toggle","id":2}
            ]"#,
        );

        let output = replay(&session, &steps, &EncoderConfig::default())
            .await
            .unwrap();
        assert_eq!(output.steps.len(), 7);
        assert_eq!(output.steps[1].outcome.as_ref().unwrap().outcome, "evaluated");
        assert_eq!(output.equations.len(), 3);
        assert_eq!(output.program.slots().len(), 2);
        assert_eq!(output.program.slots()[1].rgba[3], 0.0);
        assert_eq!(output.texture.height, 1);
    }

    #[tokio::test]
    async fn unknown_id_names_the_step() {
        let session = Session::new(RecordingCompiler::new(), SessionConfig::default());
        let steps = script(r#"[{"op":"create"},{"op":"edit","id":5,"text":"y=x"}]"#);

        let err = replay(&session, &steps, &EncoderConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReplayError::Step { index: 1, .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
