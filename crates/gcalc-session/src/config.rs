//! Session configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// When a successful edit re-runs the protocol for dependents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadePolicy {
    /// Every successful bind re-checks the equations referencing the name.
    #[default]
    Always,
    /// An edit hinted as `Refresh` that rebinds the same name skips the
    /// cascade. New binds and releases still cascade.
    #[serde(rename = "hint")]
    FollowHint,
}

impl FromStr for CascadePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(CascadePolicy::Always),
            "hint" => Ok(CascadePolicy::FollowHint),
            other => Err(format!(
                "unknown cascade policy '{}': use always or hint",
                other
            )),
        }
    }
}

impl fmt::Display for CascadePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadePolicy::Always => write!(f, "always"),
            CascadePolicy::FollowHint => write!(f, "hint"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub cascade: CascadePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_names() {
        assert_eq!("always".parse::<CascadePolicy>(), Ok(CascadePolicy::Always));
        assert_eq!(" Hint ".parse::<CascadePolicy>(), Ok(CascadePolicy::FollowHint));
        assert!("sometimes".parse::<CascadePolicy>().is_err());
        assert_eq!(CascadePolicy::default(), CascadePolicy::Always);
    }

    #[test]
    fn serde_names_match_display() {
        for policy in [CascadePolicy::Always, CascadePolicy::FollowHint] {
            let json = serde_json::to_value(policy).unwrap();
            assert_eq!(json, serde_json::Value::String(policy.to_string()));
        }
    }
}
