//! Edit hints, the per-step results of the Edit Protocol, and listings.

use gcalc_core::{EquationId, EquationView, Namespace, Symbol};
use serde::{Deserialize, Serialize};

use crate::error::{CompilerError, EquationError};

/// Advisory classification of an edit by its length delta.
///
/// Only ever used to decide whether dependents are re-checked under
/// [`CascadePolicy::FollowHint`](crate::config::CascadePolicy::FollowHint);
/// validation never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionHint {
    Add,
    Delete,
    Refresh,
}

impl ActionHint {
    /// Growth is `Add`, shrinking is `Delete`, equal length is `Refresh`.
    pub fn infer(old_text: &str, new_text: &str) -> Self {
        let (old, new) = (old_text.chars().count(), new_text.chars().count());
        match new.cmp(&old) {
            std::cmp::Ordering::Greater => ActionHint::Add,
            std::cmp::Ordering::Less => ActionHint::Delete,
            std::cmp::Ordering::Equal => ActionHint::Refresh,
        }
    }
}

/// How one pass of the protocol over one equation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A renderable artifact was stored.
    Compiled,
    /// A scalar result was stored.
    Evaluated(f64),
    /// The expression was empty; output cleared without an error.
    Cleared,
    /// The protocol stopped early; see the error.
    Failed(EquationError),
    /// The equation was edited or removed while its compile was in flight;
    /// the response was dropped.
    Stale,
}

impl StepOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            StepOutcome::Compiled => "compiled",
            StepOutcome::Evaluated(_) => "evaluated",
            StepOutcome::Cleared => "cleared",
            StepOutcome::Failed(err) => err.category(),
            StepOutcome::Stale => "stale",
        }
    }

    pub fn error(&self) -> Option<&EquationError> {
        match self {
            StepOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            StepOutcome::Compiled | StepOutcome::Evaluated(_) | StepOutcome::Cleared
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub id: EquationId,
    pub outcome: StepOutcome,
}

/// A dependent that failed while being refreshed by someone else's edit.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeFailure {
    pub id: EquationId,
    pub error: EquationError,
}

fn failures(steps: &[StepReport]) -> Vec<CascadeFailure> {
    steps
        .iter()
        .filter_map(|step| {
            step.outcome.error().map(|error| CascadeFailure {
                id: step.id,
                error: error.clone(),
            })
        })
        .collect()
}

/// Result of [`Session::edit`](crate::session::Session::edit).
#[derive(Debug, Clone, PartialEq)]
pub struct EditReport {
    pub origin: StepReport,
    /// Dependents re-checked, in the order they were processed.
    pub cascade: Vec<StepReport>,
}

impl EditReport {
    pub fn refreshed(&self) -> Vec<EquationId> {
        self.cascade.iter().map(|step| step.id).collect()
    }

    pub fn cascade_failures(&self) -> Vec<CascadeFailure> {
        failures(&self.cascade)
    }
}

/// Result of [`Session::delete`](crate::session::Session::delete).
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteReport {
    pub id: EquationId,
    pub released: Option<(Symbol, Namespace)>,
    /// The compiler refused the delete notification. The cascade still ran.
    pub notification_error: Option<CompilerError>,
    pub cascade: Vec<StepReport>,
}

impl DeleteReport {
    pub fn refreshed(&self) -> Vec<EquationId> {
        self.cascade.iter().map(|step| step.id).collect()
    }

    pub fn cascade_failures(&self) -> Vec<CascadeFailure> {
        failures(&self.cascade)
    }
}

/// Every equation and defined name, read under one registry lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub equations: Vec<EquationView>,
    pub functions: Vec<Symbol>,
    pub variables: Vec<Symbol>,
}
