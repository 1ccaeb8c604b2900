//! Stable ID newtype for equation rows.
//!
//! Equation ids are assigned monotonically by the [`EntityRegistry`] and are
//! never reused, so an id held by a stale compile response can never alias a
//! newer row.
//!
//! [`EntityRegistry`]: crate::registry::EntityRegistry

use std::fmt;

use serde::{Deserialize, Serialize};

/// Equation identity within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquationId(pub u32);

impl fmt::Display for EquationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equation_id_display() {
        assert_eq!(format!("{}", EquationId(7)), "7");
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&EquationId(42)).unwrap();
        assert_eq!(json, "42");
        let back: EquationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EquationId(42));
    }

    #[test]
    fn ids_order_by_creation() {
        assert!(EquationId(1) < EquationId(2));
    }
}
