//! HTTP handler modules for the gcalc API.
//!
//! Handlers are thin: they parse the request, delegate to the
//! [`Session`](gcalc_session::Session) or the render channels, and shape the
//! JSON response.

pub mod equations;
pub mod render;
pub mod scan;
