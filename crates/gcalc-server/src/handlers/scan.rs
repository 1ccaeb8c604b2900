//! Offline text inspection handler.

use axum::Json;

use crate::schema::scan::{ScanRequest, ScanResponse};

/// Classifies a text and lists its symbols without touching the session.
///
/// `POST /scan`
pub async fn scan(Json(req): Json<ScanRequest>) -> Json<ScanResponse> {
    Json(ScanResponse::scan(&req.text))
}
