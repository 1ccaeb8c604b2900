pub mod artifact;
pub mod color;
pub mod equation;
pub mod error;
pub mod id;
pub mod registry;
pub mod symbol;

// Re-export commonly used types
pub use artifact::{CompiledArtifact, Instruction, UnaryOp};
pub use color::{HslColor, Rgb8};
pub use equation::{Binding, Equation, EquationKind, EquationView};
pub use error::CoreError;
pub use id::EquationId;
pub use registry::{BindingChange, EntityRegistry};
pub use symbol::{Namespace, Symbol};
