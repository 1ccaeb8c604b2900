//! Viewport request/response types.

use gcalc_render::Viewport;
use serde::{Deserialize, Serialize};

/// Body of `PUT /viewport`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ViewportRequest {
    Pan { dx: i32, dy: i32 },
    ZoomIn,
    ZoomOut,
    Home,
    /// Replace the whole viewport.
    Set { viewport: Viewport },
}

impl ViewportRequest {
    /// Applies the action to `viewport`. Returns false if the result would
    /// be invalid, leaving `viewport` untouched.
    pub fn apply(self, viewport: &mut Viewport) -> bool {
        match self {
            ViewportRequest::Pan { dx, dy } => viewport.pan(dx, dy),
            ViewportRequest::ZoomIn => viewport.zoom_in(),
            ViewportRequest::ZoomOut => viewport.zoom_out(),
            ViewportRequest::Home => viewport.home(),
            ViewportRequest::Set { viewport: next } => {
                if !next.is_valid() {
                    return false;
                }
                *viewport = next;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ViewportResponse {
    pub viewport: Viewport,
    /// World units per pixel.
    pub unit: f64,
    /// World units per grid square.
    pub square_size: f64,
}

impl From<Viewport> for ViewportResponse {
    fn from(viewport: Viewport) -> Self {
        ViewportResponse {
            viewport,
            unit: viewport.unit(),
            square_size: viewport.square_size(),
        }
    }
}
