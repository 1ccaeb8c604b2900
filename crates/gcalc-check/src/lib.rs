//! Static checks over equation text.
//!
//! - [`scanner`]: free-symbol extraction from LaTeX.
//! - [`resolver`]: equation classification and binding validation.
//! - [`tracker`]: undefined-reference computation against the registry.
//!
//! Everything here is pure: the registry is only ever read.

pub mod diagnostics;
pub mod resolver;
pub mod scanner;
pub mod tracker;

pub use diagnostics::ValidationError;
pub use resolver::{classify, resolve, Classification, Resolution};
pub use scanner::{free_symbols, normalize};
pub use tracker::{references_any, references_of, undefined_references};
