//! Equation request/response types.

use gcalc_core::{EquationId, EquationView, Namespace, Symbol};
use gcalc_session::{ActionHint, CompilerError, DeleteReport, EditReport, StepOutcome, StepReport};
use serde::{Deserialize, Serialize};

/// Body of `PUT /equations/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct EditEquationRequest {
    pub text: String,
    /// Advisory; inferred from the length delta when absent.
    #[serde(default)]
    pub hint: Option<ActionHint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquationListResponse {
    /// In display order.
    pub equations: Vec<EquationView>,
    pub functions: Vec<Symbol>,
    pub variables: Vec<Symbol>,
}

/// One pass of the edit protocol over one equation.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub id: EquationId,
    /// `compiled`, `evaluated`, `cleared`, `stale`, or the failure category.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub undefined: Vec<Symbol>,
}

impl From<&StepReport> for StepView {
    fn from(step: &StepReport) -> Self {
        let value = match step.outcome {
            StepOutcome::Evaluated(value) => Some(value),
            _ => None,
        };
        let undefined = match &step.outcome {
            StepOutcome::Failed(gcalc_session::EquationError::Unresolved(names)) => names.clone(),
            _ => Vec::new(),
        };
        StepView {
            id: step.id,
            outcome: step.outcome.label(),
            value,
            error: step
                .outcome
                .error()
                .filter(|err| err.sets_error_flag())
                .map(|err| err.to_string()),
            undefined,
        }
    }
}

fn steps(steps: &[StepReport]) -> Vec<StepView> {
    steps.iter().map(StepView::from).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct EditEquationResponse {
    /// The edited equation after the edit.
    pub equation: EquationView,
    pub origin: StepView,
    /// Dependents re-checked because of this edit.
    pub cascade: Vec<StepView>,
}

impl EditEquationResponse {
    pub fn new(equation: EquationView, report: &EditReport) -> Self {
        EditEquationResponse {
            equation,
            origin: StepView::from(&report.origin),
            cascade: steps(&report.cascade),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleasedName {
    pub name: Symbol,
    pub namespace: Namespace,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteEquationResponse {
    pub success: bool,
    pub id: EquationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<ReleasedName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<CompilerError>,
    pub cascade: Vec<StepView>,
}

impl From<&DeleteReport> for DeleteEquationResponse {
    fn from(report: &DeleteReport) -> Self {
        DeleteEquationResponse {
            success: true,
            id: report.id,
            released: report
                .released
                .map(|(name, namespace)| ReleasedName { name, namespace }),
            notification_error: report.notification_error.clone(),
            cascade: steps(&report.cascade),
        }
    }
}

#[cfg(test)]
mod tests {
    use gcalc_session::EquationError;

    use super::*;

    #[test]
    fn unresolved_step_lists_names_without_error() {
        let view = StepView::from(&StepReport {
            id: EquationId(3),
            outcome: StepOutcome::Failed(EquationError::Unresolved(vec![Symbol('a')])),
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 3, "outcome": "unresolved", "undefined": ["a"] })
        );
    }

    #[test]
    fn evaluated_step_carries_value() {
        let view = StepView::from(&StepReport {
            id: EquationId(0),
            outcome: StepOutcome::Evaluated(2.5),
        });
        assert_eq!(view.outcome, "evaluated");
        assert_eq!(view.value, Some(2.5));
        assert!(view.error.is_none());
    }
}
