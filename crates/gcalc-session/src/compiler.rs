//! The request/response contract with the external expression compiler.
//!
//! The compiler owns expression parsing, numeric evaluation and code
//! generation. The session only decides what to send and when; see
//! [`crate::session`].

use std::future::Future;

use gcalc_core::{Binding, CompiledArtifact, Instruction, Symbol};
use serde::{Deserialize, Serialize};

use crate::error::CompilerError;

/// What a successful compile produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutput {
    /// A renderable body.
    Artifact(CompiledArtifact),
    /// The expression is constant; show the value instead of drawing it.
    Scalar(f64),
}

/// `name(argument)` of a function definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: Symbol,
    pub argument: Symbol,
}

/// One compile request, keyed by equation binding and text.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileRequest {
    Relation { text: String },
    Function { signature: FunctionSignature, body: String },
    Variable { name: Symbol, body: String },
}

impl CompileRequest {
    /// Builds the request for a resolved binding.
    pub fn for_binding(binding: Binding, text: &str, body: &str) -> Self {
        match binding {
            Binding::Implicit => CompileRequest::Relation {
                text: text.to_string(),
            },
            Binding::Function { name, argument } => CompileRequest::Function {
                signature: FunctionSignature { name, argument },
                body: body.to_string(),
            },
            Binding::Variable { name } => CompileRequest::Variable {
                name,
                body: body.to_string(),
            },
        }
    }

    /// Sends the request through `compiler`.
    pub async fn dispatch<C: ExpressionCompiler + ?Sized>(
        &self,
        compiler: &C,
    ) -> Result<CompileOutput, CompilerError> {
        match self {
            CompileRequest::Relation { text } => compiler.compile_relation(text).await,
            CompileRequest::Function { signature, body } => {
                compiler.define_function(*signature, body).await
            }
            CompileRequest::Variable { name, body } => compiler
                .define_variable(*name, body)
                .await
                .map(CompileOutput::Scalar),
        }
    }
}

/// The external compiler.
///
/// Every method fails with [`CompilerError::Empty`] for an empty expression;
/// callers treat that as a silent no-op. Deletes are idempotent.
pub trait ExpressionCompiler: Send + Sync {
    /// Compiles an implicit relation or a plain expression.
    fn compile_relation(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<CompileOutput, CompilerError>> + Send;

    /// Defines (or redefines) a function. Fails if the name collides.
    fn define_function(
        &self,
        signature: FunctionSignature,
        body: &str,
    ) -> impl Future<Output = Result<CompileOutput, CompilerError>> + Send;

    /// Defines (or redefines) a constant. Fails if `body` uses a plot axis.
    fn define_variable(
        &self,
        name: Symbol,
        body: &str,
    ) -> impl Future<Output = Result<f64, CompilerError>> + Send;

    fn delete_function(&self, name: Symbol)
        -> impl Future<Output = Result<(), CompilerError>> + Send;

    fn delete_variable(&self, name: Symbol)
        -> impl Future<Output = Result<(), CompilerError>> + Send;
}

/// JSON body the compiler answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub bytecode: Vec<Instruction>,
    #[serde(default)]
    pub num: Option<f64>,
}

impl CompilerResponse {
    pub fn into_output(self) -> Result<CompileOutput, CompilerError> {
        match self.num {
            Some(value) => Ok(CompileOutput::Scalar(value)),
            None => Ok(CompileOutput::Artifact(CompiledArtifact::new(
                self.code,
                self.bytecode,
            )?)),
        }
    }

    pub fn into_scalar(self) -> Result<f64, CompilerError> {
        self.num.ok_or_else(|| {
            CompilerError::MalformedResponse("variable definition returned no value".to_string())
        })
    }
}

impl From<CompileOutput> for CompilerResponse {
    fn from(output: CompileOutput) -> Self {
        match output {
            CompileOutput::Artifact(artifact) => CompilerResponse {
                code: artifact.code().to_string(),
                bytecode: artifact.bytecode().to_vec(),
                num: None,
            },
            CompileOutput::Scalar(value) => CompilerResponse {
                code: String::new(),
                bytecode: Vec::new(),
                num: Some(value),
            },
        }
    }
}
