//! HTTP/JSON API for a graphing-calculator session.
//!
//! Exposes the equation list, the edit protocol, the viewport and the latest
//! rendered frame. The expression compiler is reached through any
//! [`ExpressionCompiler`](gcalc_session::ExpressionCompiler); the binary uses
//! the HTTP one.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod state;
