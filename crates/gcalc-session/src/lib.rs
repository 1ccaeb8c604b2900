//! Calculator session orchestration.
//!
//! [`Session`] owns the entity registry and drives the Edit Protocol: static
//! checks, binding updates, compiler calls, the refresh cascade, and
//! publishing the encoded program to the render loop.
//!
//! The compiler sits behind [`ExpressionCompiler`]; [`HttpCompiler`] talks to
//! an external process. With the `testing` feature, `testing::RecordingCompiler`
//! runs in-process for tests.

pub mod compiler;
pub mod config;
pub mod error;
pub mod http;
pub mod report;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use compiler::{CompileOutput, CompileRequest, CompilerResponse, ExpressionCompiler, FunctionSignature};
pub use config::{CascadePolicy, SessionConfig};
pub use error::{CompilerError, EquationError, SessionError};
pub use http::{HttpCompiler, DEFAULT_COMPILER_URL};
pub use report::{
    ActionHint, CascadeFailure, DeleteReport, EditReport, Listing, StepOutcome, StepReport,
};
pub use session::Session;
