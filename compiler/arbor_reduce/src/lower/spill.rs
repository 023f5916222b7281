//! Temporaries for evaluate-once lowering.

use arbor_build::TreeBuilder;
use arbor_diagnostic::ReduceResult;
use arbor_ir::{NodeId, Prim, VarId};

/// Temporaries and the statements that fill them, in evaluation order.
#[derive(Debug, Default)]
pub(crate) struct Spill {
    vars: Vec<VarId>,
    exprs: Vec<NodeId>,
}

impl Spill {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `value` itself when reading it again is unobservable, otherwise a
    /// temporary holding it.
    pub(crate) fn keep(
        &mut self,
        b: &mut TreeBuilder<'_>,
        value: NodeId,
    ) -> ReduceResult<NodeId> {
        if is_pure(b, value) {
            Ok(value)
        } else {
            self.temp(b, value)
        }
    }

    /// A fresh temporary assigned `value`; returns a read of it.
    pub(crate) fn temp(
        &mut self,
        b: &mut TreeBuilder<'_>,
        value: NodeId,
    ) -> ReduceResult<NodeId> {
        let var = b.new_temp(b.ty(value));
        let read = b.variable(var);
        let init = b.assign(read, value)?;
        self.vars.push(var);
        self.exprs.push(init);
        Ok(read)
    }

    pub(crate) fn declare(&mut self, var: VarId) {
        self.vars.push(var);
    }

    pub(crate) fn push(&mut self, expr: NodeId) {
        self.exprs.push(expr);
    }

    /// A block running the spilled statements and then `tail`, typed as
    /// `tail`; `tail` itself when nothing was spilled.
    pub(crate) fn finish(
        mut self,
        b: &mut TreeBuilder<'_>,
        tail: NodeId,
    ) -> ReduceResult<NodeId> {
        if self.vars.is_empty() && self.exprs.is_empty() {
            return Ok(tail);
        }
        let ty = b.ty(tail);
        self.exprs.push(tail);
        Ok(b.block_typed(self.vars, self.exprs, ty)?)
    }

    /// A `void` block running the spilled statements.
    pub(crate) fn finish_void(self, b: &mut TreeBuilder<'_>) -> ReduceResult<NodeId> {
        Ok(b.block_typed(self.vars, self.exprs, arbor_types::TypeId::VOID)?)
    }
}

pub(crate) fn is_pure(b: &TreeBuilder<'_>, id: NodeId) -> bool {
    b.kind(id).as_prim().is_some_and(Prim::is_pure)
}
