//! An in-process [`ExpressionCompiler`] that records every call.
//!
//! Only built for tests and with the `testing` feature. Behavior:
//!
//! - empty text fails with the empty sentinel;
//! - text containing a registered rejection fragment fails with its message;
//! - a numeric literal compiles to a scalar;
//! - anything else compiles to `[Push(n), Store]` with `n` counting up, so
//!   no two artifacts are equal;
//! - a variable body must be a numeric literal;
//! - text registered with [`RecordingCompiler::hold`] waits until released.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use gcalc_core::{CompiledArtifact, Instruction, Symbol};
use tokio::sync::Notify;

use crate::compiler::{CompileOutput, ExpressionCompiler, FunctionSignature};
use crate::error::{CompilerError, EMPTY_SENTINEL};

#[derive(Debug, Clone, PartialEq)]
pub enum CompilerCall {
    Relation(String),
    DefineFunction {
        name: Symbol,
        argument: Symbol,
        body: String,
    },
    DefineVariable {
        name: Symbol,
        body: String,
    },
    DeleteFunction(Symbol),
    DeleteVariable(Symbol),
}

impl CompilerCall {
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            CompilerCall::DeleteFunction(_) | CompilerCall::DeleteVariable(_)
        )
    }
}

#[derive(Default)]
struct State {
    calls: Vec<CompilerCall>,
    rejections: Vec<(String, String)>,
    gates: HashMap<String, Arc<Notify>>,
    fail_deletes: bool,
    compiled: u32,
    functions: BTreeSet<Symbol>,
    variables: BTreeMap<Symbol, f64>,
}

/// Cloning shares the recorder, so a test can keep a handle while the
/// session owns another.
#[derive(Clone, Default)]
pub struct RecordingCompiler {
    state: Arc<Mutex<State>>,
}

impl RecordingCompiler {
    pub fn new() -> Self {
        RecordingCompiler::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<CompilerCall> {
        self.state().calls.clone()
    }

    /// Number of compile calls (deletes excluded).
    pub fn compile_count(&self) -> usize {
        self.state().calls.iter().filter(|c| !c.is_delete()).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Fails every compile whose text contains `fragment`.
    pub fn reject(&self, fragment: impl Into<String>, message: impl Into<String>) {
        self.state()
            .rejections
            .push((fragment.into(), message.into()));
    }

    pub fn clear_rejections(&self) {
        self.state().rejections.clear();
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.state().fail_deletes = fail;
    }

    /// Makes compiles of exactly `text` wait for [`release`](Self::release).
    pub fn hold(&self, text: impl Into<String>) {
        self.state()
            .gates
            .insert(text.into(), Arc::new(Notify::new()));
    }

    pub fn release(&self, text: &str) {
        if let Some(gate) = self.state().gates.remove(text) {
            gate.notify_one();
        }
    }

    /// Yields until `call` has been recorded.
    pub async fn wait_for_call(&self, call: &CompilerCall) {
        while !self.state().calls.contains(call) {
            tokio::task::yield_now().await;
        }
    }

    pub fn defined_functions(&self) -> Vec<Symbol> {
        self.state().functions.iter().copied().collect()
    }

    pub fn defined_variables(&self) -> Vec<(Symbol, f64)> {
        self.state()
            .variables
            .iter()
            .map(|(name, value)| (*name, *value))
            .collect()
    }

    /// Records the call, then waits on a gate for `text` if one is set.
    async fn enter(&self, call: CompilerCall, text: &str) {
        let gate = {
            let mut state = self.state();
            state.calls.push(call);
            state.gates.get(text).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn check(&self, text: &str) -> Result<(), CompilerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CompilerError::Empty(format!(
                "{}: nothing to compile",
                EMPTY_SENTINEL
            )));
        }
        let state = self.state();
        match state
            .rejections
            .iter()
            .find(|(fragment, _)| text.contains(fragment.as_str()))
        {
            Some((_, message)) => Err(CompilerError::Rejected(message.clone())),
            None => Ok(()),
        }
    }

    fn compile(&self, text: &str) -> Result<CompileOutput, CompilerError> {
        self.check(text)?;
        let text = text.trim();
        if let Ok(value) = text.parse::<f64>() {
            return Ok(CompileOutput::Scalar(value));
        }

        let mut state = self.state();
        state.compiled += 1;
        let artifact = CompiledArtifact::new(
            format!("return {};", text),
            vec![Instruction::Push(f64::from(state.compiled)), Instruction::Store],
        )?;
        Ok(CompileOutput::Artifact(artifact))
    }
}

impl ExpressionCompiler for RecordingCompiler {
    async fn compile_relation(&self, text: &str) -> Result<CompileOutput, CompilerError> {
        self.enter(CompilerCall::Relation(text.to_string()), text)
            .await;
        self.compile(text)
    }

    async fn define_function(
        &self,
        signature: FunctionSignature,
        body: &str,
    ) -> Result<CompileOutput, CompilerError> {
        let call = CompilerCall::DefineFunction {
            name: signature.name,
            argument: signature.argument,
            body: body.to_string(),
        };
        self.enter(call, body).await;

        if self.state().variables.contains_key(&signature.name) {
            return Err(CompilerError::Rejected(format!(
                "'{}' is already a variable",
                signature.name
            )));
        }
        let output = self.compile(body)?;
        self.state().functions.insert(signature.name);
        Ok(output)
    }

    async fn define_variable(&self, name: Symbol, body: &str) -> Result<f64, CompilerError> {
        let call = CompilerCall::DefineVariable {
            name,
            body: body.to_string(),
        };
        self.enter(call, body).await;
        self.check(body)?;

        let value = body
            .trim()
            .parse::<f64>()
            .map_err(|_| CompilerError::Rejected(format!("cannot evaluate '{}'", body)))?;
        self.state().variables.insert(name, value);
        Ok(value)
    }

    async fn delete_function(&self, name: Symbol) -> Result<(), CompilerError> {
        let mut state = self.state();
        state.calls.push(CompilerCall::DeleteFunction(name));
        if state.fail_deletes {
            return Err(CompilerError::Transport("delete refused".to_string()));
        }
        state.functions.remove(&name);
        Ok(())
    }

    async fn delete_variable(&self, name: Symbol) -> Result<(), CompilerError> {
        let mut state = self.state();
        state.calls.push(CompilerCall::DeleteVariable(name));
        if state.fail_deletes {
            return Err(CompilerError::Transport("delete refused".to_string()));
        }
        state.variables.remove(&name);
        Ok(())
    }
}
