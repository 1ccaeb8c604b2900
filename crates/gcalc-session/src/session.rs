//! The Edit Protocol and Refresh Cascade.
//!
//! Each pass over one equation runs in three phases:
//!
//! 1. **Check** (registry locked): reset the error flag, resolve the binding,
//!    track undefined references and, if all of that passed, rebind the name.
//!    A failure here is recorded on the equation and ends the pass.
//! 2. **Compile** (unlocked): notify the compiler of a released name, then
//!    send the compile request. Other edits and the render loop keep running.
//! 3. **Apply** (registry locked): store the result, unless the equation was
//!    removed or started a newer pass in the meantime. A dropped result still
//!    reports the names phase 1 bound or released.
//!
//! After the originating pass, every other equation whose text references a
//! name that was bound or released is re-run from phase 1, breadth first.
//! A visited set keeps mutually recursive definitions from looping, and the
//! originating equation is never revisited.

use std::collections::{HashSet, VecDeque};

use gcalc_check::{classify, references_any, resolve, undefined_references};
use gcalc_core::{EntityRegistry, EquationId, EquationView, Namespace, Symbol};
use gcalc_render::{ProgramFeed, ProgramSnapshot};
use tokio::sync::Mutex;

use crate::compiler::{CompileOutput, CompileRequest, ExpressionCompiler};
use crate::config::{CascadePolicy, SessionConfig};
use crate::error::{CompilerError, EquationError, SessionError};
use crate::report::{ActionHint, DeleteReport, EditReport, Listing, StepOutcome, StepReport};

/// A pass that got through phase 1 and needs the compiler.
struct Pending {
    revision: u64,
    request: CompileRequest,
    released: Option<(Symbol, Namespace)>,
    /// Names whose meaning may have changed if this pass completes.
    changed: Vec<Symbol>,
    /// True if the set of bound names changed.
    rebound: bool,
}

/// The result of one pass over one equation.
struct Step {
    report: StepReport,
    changed: Vec<Symbol>,
    rebound: bool,
    hint: ActionHint,
}

impl Step {
    /// A pass whose compile result was dropped. Its phase 1 binding changes
    /// already happened, so dependents of those names still need a refresh.
    fn stale(id: EquationId, pending: Pending, hint: ActionHint) -> Self {
        Step {
            report: StepReport {
                id,
                outcome: StepOutcome::Stale,
            },
            changed: pending.changed,
            rebound: pending.rebound,
            hint,
        }
    }

    fn finished(id: EquationId, outcome: StepOutcome, hint: ActionHint) -> Self {
        Step {
            report: StepReport { id, outcome },
            changed: Vec::new(),
            rebound: false,
            hint,
        }
    }
}

/// One calculator session: the registry, the compiler, and the program feed
/// the render loop watches.
pub struct Session<C> {
    compiler: C,
    registry: Mutex<EntityRegistry>,
    feed: ProgramFeed,
    config: SessionConfig,
}

impl<C: ExpressionCompiler> Session<C> {
    pub fn new(compiler: C, config: SessionConfig) -> Self {
        Session::with_feed(compiler, config, ProgramFeed::new())
    }

    /// Creates a session publishing into an existing feed.
    pub fn with_feed(compiler: C, config: SessionConfig, feed: ProgramFeed) -> Self {
        Session {
            compiler,
            registry: Mutex::new(EntityRegistry::new()),
            feed,
            config,
        }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn feed(&self) -> &ProgramFeed {
        &self.feed
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// The program currently published to the render loop.
    pub fn snapshot(&self) -> ProgramSnapshot {
        self.feed.current()
    }

    /// Adds an empty implicit equation at the end of the list.
    pub async fn create(&self) -> Result<EquationView, SessionError> {
        let mut registry = self.registry.lock().await;
        let id = registry.create();
        tracing::debug!("created equation {}", id);
        Ok(registry.equation(id)?.view())
    }

    /// All equations in display order.
    pub async fn views(&self) -> Vec<EquationView> {
        let registry = self.registry.lock().await;
        registry.iter().map(|equation| equation.view()).collect()
    }

    pub async fn view(&self, id: EquationId) -> Result<EquationView, SessionError> {
        let registry = self.registry.lock().await;
        Ok(registry.equation(id)?.view())
    }

    /// Equations and both name maps, consistent with each other.
    pub async fn listing(&self) -> Listing {
        let registry = self.registry.lock().await;
        Listing {
            equations: registry.iter().map(|equation| equation.view()).collect(),
            functions: registry.function_names(),
            variables: registry.variable_names(),
        }
    }

    pub async fn function_names(&self) -> Vec<Symbol> {
        self.registry.lock().await.function_names()
    }

    pub async fn variable_names(&self) -> Vec<Symbol> {
        self.registry.lock().await.variable_names()
    }

    pub async fn check_consistency(&self) -> Result<(), SessionError> {
        Ok(self.registry.lock().await.check_consistency()?)
    }

    /// Flips visibility. Only the slot's alpha changes; nothing recompiles.
    pub async fn toggle_visibility(&self, id: EquationId) -> Result<EquationView, SessionError> {
        let mut registry = self.registry.lock().await;
        let visible = registry.equation_mut(id)?.toggle_visible();
        tracing::debug!("equation {} visible={}", id, visible);
        self.publish(&registry);
        Ok(registry.equation(id)?.view())
    }

    /// Runs the Edit Protocol for new text on equation `id`.
    ///
    /// Without a hint, one is inferred from the length delta.
    pub async fn edit(
        &self,
        id: EquationId,
        text: impl Into<String>,
        hint: Option<ActionHint>,
    ) -> Result<EditReport, SessionError> {
        let step = self.run_step(id, Some(text.into())).await?;
        let hint = hint.unwrap_or(step.hint);
        Ok(self.finish_origin(id, step, hint).await)
    }

    /// Re-runs the protocol on the current text; the manual retry path.
    pub async fn refresh(&self, id: EquationId) -> Result<EditReport, SessionError> {
        let step = self.run_step(id, None).await?;
        Ok(self.finish_origin(id, step, ActionHint::Refresh).await)
    }

    /// Removes an equation, tells the compiler its name is gone, and
    /// re-checks every equation that referenced it.
    pub async fn delete(&self, id: EquationId) -> Result<DeleteReport, SessionError> {
        let released = {
            let mut registry = self.registry.lock().await;
            let (_, released) = registry.remove(id)?;
            self.publish(&registry);
            released
        };
        tracing::info!("deleted equation {} (released {:?})", id, released);

        let (notification_error, cascade) = match released {
            Some((name, namespace)) => {
                let notified = self.notify_release(name, namespace).await.err();
                (notified, self.cascade(id, vec![name]).await)
            }
            None => (None, Vec::new()),
        };

        Ok(DeleteReport {
            id,
            released,
            notification_error,
            cascade,
        })
    }

    async fn finish_origin(&self, id: EquationId, step: Step, hint: ActionHint) -> EditReport {
        let cascade_wanted = match self.config.cascade {
            CascadePolicy::Always => true,
            CascadePolicy::FollowHint => step.rebound || hint != ActionHint::Refresh,
        };
        let names = if cascade_wanted {
            step.changed
        } else {
            tracing::debug!("equation {}: cascade skipped for {:?} edit", id, hint);
            Vec::new()
        };

        EditReport {
            origin: step.report,
            cascade: self.cascade(id, names).await,
        }
    }

    /// Re-runs the protocol for every equation depending on `names`.
    async fn cascade(&self, origin: EquationId, names: Vec<Symbol>) -> Vec<StepReport> {
        let mut reports = Vec::new();
        if names.is_empty() {
            return reports;
        }

        let mut visited = HashSet::from([origin]);
        let mut queue = VecDeque::new();
        self.enqueue_dependents(&names, &mut visited, &mut queue)
            .await;

        while let Some(id) = queue.pop_front() {
            match self.run_step(id, None).await {
                Ok(step) => {
                    if !step.changed.is_empty() {
                        self.enqueue_dependents(&step.changed, &mut visited, &mut queue)
                            .await;
                    }
                    if let Some(err) = step.report.outcome.error() {
                        tracing::debug!("cascade: equation {} failed: {}", id, err);
                    }
                    reports.push(step.report);
                }
                Err(err) => tracing::debug!("cascade: equation {} skipped: {}", id, err),
            }
        }

        reports
    }

    async fn enqueue_dependents(
        &self,
        names: &[Symbol],
        visited: &mut HashSet<EquationId>,
        queue: &mut VecDeque<EquationId>,
    ) {
        let registry = self.registry.lock().await;
        let before = queue.len();
        for equation in registry.iter() {
            let id = equation.id();
            if !visited.contains(&id) && references_any(equation.text(), names) {
                visited.insert(id);
                queue.push_back(id);
            }
        }
        if queue.len() > before {
            tracing::info!(
                "cascade: {} dependent(s) of {:?}",
                queue.len() - before,
                names
            );
        }
    }

    /// One full pass over one equation. `text` replaces the current text when
    /// given (an edit); otherwise the current text is re-checked (a refresh).
    async fn run_step(&self, id: EquationId, text: Option<String>) -> Result<Step, SessionError> {
        let (pending, hint) = {
            let mut registry = self.registry.lock().await;
            let equation = registry.equation_mut(id)?;
            let (revision, hint) = match text {
                Some(text) => {
                    let hint = ActionHint::infer(equation.text(), &text);
                    (equation.set_text(text), hint)
                }
                None => (equation.touch(), ActionHint::Refresh),
            };

            let checked = check(&mut registry, id, revision);
            self.publish(&registry);
            match checked? {
                Ok(pending) => (pending, hint),
                Err(err) => {
                    tracing::debug!("equation {}: {}", id, err);
                    return Ok(Step::finished(id, StepOutcome::Failed(err), hint));
                }
            }
        };

        if let Some((name, namespace)) = pending.released {
            // Failures are logged; the release already happened locally.
            let _ = self.notify_release(name, namespace).await;
        }

        tracing::debug!("equation {}: compiling {:?}", id, pending.request);
        let result = pending.request.dispatch(&self.compiler).await;

        let mut registry = self.registry.lock().await;
        let equation = match registry.equation_mut(id) {
            Ok(equation) => equation,
            Err(_) => {
                tracing::debug!("equation {}: removed while compiling, response dropped", id);
                return Ok(Step::stale(id, pending, hint));
            }
        };
        if equation.revision() != pending.revision {
            tracing::debug!(
                "equation {}: response for revision {} dropped (now {})",
                id,
                pending.revision,
                equation.revision()
            );
            return Ok(Step::stale(id, pending, hint));
        }

        let outcome = match result {
            Ok(CompileOutput::Artifact(artifact)) => {
                equation.set_compiled(artifact);
                StepOutcome::Compiled
            }
            Ok(CompileOutput::Scalar(value)) => {
                equation.set_result(value);
                StepOutcome::Evaluated(value)
            }
            Err(err) if err.is_empty_expression() => {
                equation.clear_output();
                StepOutcome::Cleared
            }
            Err(err) => {
                tracing::warn!("equation {}: compile failed: {}", id, err);
                equation.fail(err.to_string());
                StepOutcome::Failed(EquationError::Compile(err))
            }
        };
        self.publish(&registry);

        Ok(Step {
            report: StepReport { id, outcome },
            changed: pending.changed,
            rebound: pending.rebound,
            hint,
        })
    }

    async fn notify_release(&self, name: Symbol, namespace: Namespace) -> Result<(), CompilerError> {
        let result = match namespace {
            Namespace::Function => self.compiler.delete_function(name).await,
            Namespace::Variable => self.compiler.delete_variable(name).await,
        };
        if let Err(err) = &result {
            tracing::warn!("compiler refused to delete {} {}: {}", namespace, name, err);
        }
        result
    }

    fn publish(&self, registry: &EntityRegistry) {
        self.feed.publish(ProgramSnapshot::from_registry(registry));
    }
}

/// Phase 1 of a pass. The outer error is a registry failure; the inner one
/// is recorded on the equation.
fn check(
    registry: &mut EntityRegistry,
    id: EquationId,
    revision: u64,
) -> Result<Result<Pending, EquationError>, SessionError> {
    let equation = registry.equation_mut(id)?;
    equation.clear_error();
    let text = equation.text().to_string();
    equation.set_text_kind(classify(&text).ok().map(|c| c.binding.kind()));

    let resolution = match resolve(registry, id, &text) {
        Ok(resolution) => resolution,
        Err(err) => {
            let equation = registry.equation_mut(id)?;
            equation.set_undefined_refs([]);
            equation.fail(err.to_string());
            return Ok(Err(EquationError::Validation(err)));
        }
    };

    let undefined = undefined_references(registry, &resolution.references);
    registry
        .equation_mut(id)?
        .set_undefined_refs(undefined.iter().copied());
    if !undefined.is_empty() {
        return Ok(Err(EquationError::Unresolved(undefined)));
    }

    let change = registry.rebind(id, resolution.binding)?;
    let changed: Vec<Symbol> = change
        .bound
        .into_iter()
        .chain(change.released)
        .map(|(name, _)| name)
        .collect();

    Ok(Ok(Pending {
        revision,
        request: CompileRequest::for_binding(resolution.binding, &text, &resolution.body),
        released: change.released,
        changed,
        rebound: change.mutated_names(),
    }))
}
