//! Behaviour capability traits.
//!
//! A behaviour is authored as a [`BehaviourSpec`] factory. The tree compiler
//! clones the spec per referencing node; each time the leaf becomes active at
//! runtime the spec produces a fresh [`BehaviourExec`], which lives until the
//! behaviour completes or another behaviour interrupts it.

use volition_core::{ErrorReport, Name, VariableLayout, VariablePack};

/// Outcome of one tick of a leaf or of the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtResult {
    Success,
    Failure,
    InProgress,
}

/// What a running behaviour sees: the host world, the agent's variables and
/// the tick's error report. Executors may write variables mid-tick; later
/// instructions observe the new values.
pub struct BtContext<'a, W> {
    pub world: &'a mut W,
    pub vars: &'a mut VariablePack,
    pub errors: &'a mut ErrorReport,
}

/// Compile-time context handed to [`BehaviourSpec::compile_expressions`].
pub struct CompileContext<'a> {
    pub layout: &'a VariableLayout,
    pub errors: &'a mut ErrorReport,
}

/// Author-supplied behaviour factory.
pub trait BehaviourSpec<W> {
    /// Deep copy. The tree compiler owns the clones; the authoring tree keeps
    /// its originals.
    fn duplicate(&self) -> Box<dyn BehaviourSpec<W>>;

    /// Compile any expressions the behaviour carries. Report problems through
    /// `ctx.errors`; the tree build fails if anything is recorded.
    fn compile_expressions(&mut self, _ctx: &mut CompileContext<'_>) {}

    /// Create the per-activation executor. Called each time the leaf becomes
    /// active.
    fn new_exec(&self, origin: Name, ctx: &mut BtContext<'_, W>) -> Box<dyn BehaviourExec<W>>;
}

/// Stateful per-activation executor.
///
/// Lifecycle: `init` once, `execute` one or more times, `cleanup` once.
/// `cleanup` runs before any other exec becomes current; it is the only
/// interruption signal an executor receives.
pub trait BehaviourExec<W> {
    fn init(&mut self, _origin: Name, _ctx: &mut BtContext<'_, W>) {}

    /// Must not return an undefined result; return [`BtResult::InProgress`]
    /// to be ticked again.
    fn execute(&mut self, ctx: &mut BtContext<'_, W>) -> BtResult;

    fn cleanup(&mut self, _ctx: &mut BtContext<'_, W>) {}
}

/// The single active executor of one evaluator, with the lifecycle rules
/// both evaluation strategies share.
///
/// Behaviours are identified by their slot in the runtime's spec table.
/// Running a different slot interrupts the current exec (cleanup, then a
/// fresh exec for the new slot); a tick that never runs any slot leaves the
/// exec in place for the next tick that does.
pub(crate) struct ActiveBehaviour<W> {
    index: Option<u16>,
    exec: Option<Box<dyn BehaviourExec<W>>>,
}

impl<W> ActiveBehaviour<W> {
    pub(crate) fn new() -> Self {
        Self {
            index: None,
            exec: None,
        }
    }

    pub(crate) fn run(
        &mut self,
        index: u16,
        origin: Name,
        spec: &dyn BehaviourSpec<W>,
        ctx: &mut BtContext<'_, W>,
    ) -> BtResult {
        if self.index != Some(index) {
            if let Some(mut exec) = self.exec.take() {
                exec.cleanup(ctx);
            }

            self.index = Some(index);
            let mut exec = spec.new_exec(origin, ctx);
            exec.init(origin, ctx);
            self.exec = Some(exec);
        }

        let Some(exec) = self.exec.as_mut() else {
            return BtResult::Failure;
        };
        let result = exec.execute(ctx);

        if result != BtResult::InProgress {
            if let Some(mut exec) = self.exec.take() {
                exec.cleanup(ctx);
            }
            self.index = None;
        }

        result
    }

    pub(crate) fn abort(&mut self, ctx: &mut BtContext<'_, W>) {
        if let Some(mut exec) = self.exec.take() {
            exec.cleanup(ctx);
        }
        self.index = None;
    }
}
