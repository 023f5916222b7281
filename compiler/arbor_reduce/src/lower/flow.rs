//! `using` and `lock`.
//!
//! Both guard a body with `try`/`finally`. The resource or lock object is
//! evaluated once into a variable before the protected region starts.

use arbor_build::TryOptions;
use arbor_diagnostic::{ReduceError, ReduceResult};
use arbor_ir::{NodeId, UsingBlock};
use arbor_types::TypeId;

use super::Lowerer;

impl Lowerer<'_, '_> {
    /// `{ r = resource; try { body } finally { dispose(r) } }`.
    pub(crate) fn using(&mut self, node: UsingBlock) -> ReduceResult<NodeId> {
        if node.await_info.is_some() {
            return Err(ReduceError::NotImplemented {
                what: "await using",
            });
        }
        let ty = self.b.ty(node.body);
        let resource = match node.var {
            Some(var) => var,
            None => self.b.new_temp(self.b.ty(node.resource)),
        };
        let init = self.store(resource, node.resource)?;
        let protected = match self.dispose(resource, node.dispose)? {
            Some(dispose) => self.b.try_catch(TryOptions::new(node.body).finally(dispose))?,
            None => node.body,
        };
        Ok(self.b.block_typed(vec![resource], vec![init, protected], ty)?)
    }

    /// ```text
    /// { o = object; taken = false;
    ///   try { Monitor.Enter(o, ref taken); body }
    ///   finally { if (taken) Monitor.Exit(o) } }
    /// ```
    pub(crate) fn lock(&mut self, object: NodeId, body: NodeId) -> ReduceResult<NodeId> {
        let wk = self.b.pool().well_known().clone();
        let ty = self.b.ty(body);
        let monitor = self.b.new_temp(self.b.ty(object));
        let taken = self.b.new_temp(TypeId::BOOL);
        let init = self.store(monitor, object)?;
        let not_taken = self.b.bool(false);
        let reset = self.store(taken, not_taken)?;

        let o = self.b.variable(monitor);
        let flag = self.b.variable(taken);
        let enter = self.b.call(None, wk.monitor_enter, vec![o, flag])?;
        let guarded = self.b.block_typed(Vec::new(), vec![enter, body], ty)?;

        let o = self.b.variable(monitor);
        let exit = self.b.call(None, wk.monitor_exit, vec![o])?;
        let flag = self.b.variable(taken);
        let release = self.b.if_then(flag, exit)?;
        let protected = self.b.try_catch(TryOptions::new(guarded).finally(release))?;

        Ok(self
            .b
            .block_typed(vec![monitor, taken], vec![init, reset, protected], ty)?)
    }
}
