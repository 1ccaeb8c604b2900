//! Offline text inspection types.

use gcalc_core::{Binding, Symbol};
use gcalc_check::ValidationError;
use serde::{Deserialize, Serialize};

/// Body of `POST /scan`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub text: String,
}

/// How a text would be classified, independent of any registry.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub normalized: String,
    pub free_symbols: Vec<Symbol>,
    /// Absent when the text binds a reserved name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<Binding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Names the text needs from elsewhere.
    pub references: Vec<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,
}

impl ScanResponse {
    pub fn scan(text: &str) -> Self {
        let (binding, body, error) = match gcalc_check::classify(text) {
            Ok(classification) => (Some(classification.binding), Some(classification.body), None),
            Err(err) => (None, None, Some(err)),
        };
        ScanResponse {
            normalized: gcalc_check::normalize(text),
            free_symbols: gcalc_check::free_symbols(text),
            binding,
            body,
            references: gcalc_check::references_of(text),
            error,
        }
    }
}
