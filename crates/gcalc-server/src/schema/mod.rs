//! API schema types for request/response definitions.
//!
//! Each sub-module defines the request and response types for one API area.

pub mod equations;
pub mod frame;
pub mod scan;
pub mod viewport;
