//! One-step lowering rules.
//!
//! [`reduce`] dispatches on the node's family; each family's rules live in
//! their own submodule as methods of [`Lowerer`]:
//!
//! | Module | Lowers |
//! |---|---|
//! | `assign` | compound and increment/decrement assignment |
//! | `loops` | while, do, for, foreach |
//! | `switch` | value switch and switch expression |
//! | `patterns` | pattern tests, `is` |
//! | `flow` | using, lock |
//! | `interp` | interpolated strings and handler conversions |
//! | `dynamic` | late-bound operations |
//! | `tuple` | tuple literals and conversions |
//! | `bound` | parameter-bound calls |
//! | `target` | store targets shared by the rules above |

mod assign;
mod bound;
mod dynamic;
mod flow;
mod interp;
mod loops;
mod patterns;
mod spill;
mod switch;
mod target;
mod tuple;

use arbor_build::TreeBuilder;
use arbor_diagnostic::{ReduceError, ReduceResult};
use arbor_ir::{
    AssignKind, DisposeKind, FlowKind, InterpKind, LoopKind, NodeId, NodeKind, Prim, SwitchKind,
    TupleKind, UnaryOp, VarId,
};
use arbor_types::{ConstValue, TypeId};

pub(crate) use spill::Spill;

/// Reduce `id` by one step.
///
/// Nodes that need no reduction come back unchanged. The result has the
/// type of `id` but may still contain non-primitive nodes, its own root
/// included; [`reduce_all`](crate::reduce_all) repeats until it does not.
pub fn reduce(builder: &mut TreeBuilder<'_>, id: NodeId) -> ReduceResult<NodeId> {
    if !needs_reduction(builder, id) {
        return Ok(id);
    }
    let kind = builder.kind(id).clone();
    let ty = builder.ty(id);
    tracing::debug!(node = id.raw(), kind = kind.name(), "reducing node");

    let mut lower = Lowerer { b: builder };
    match kind {
        NodeKind::Prim(Prim::Assign { target, value }) => lower.assign_into_bound(target, value),
        NodeKind::Prim(_) => Ok(id),
        NodeKind::Assign(AssignKind::Compound(node)) => lower.compound(&node, ty),
        NodeKind::Assign(AssignKind::IncDec(node)) => lower.inc_dec(&node, ty),
        NodeKind::Loop(LoopKind::While {
            test,
            body,
            break_label,
            continue_label,
        }) => lower.while_loop(test, body, break_label, continue_label),
        NodeKind::Loop(LoopKind::DoWhile {
            body,
            test,
            break_label,
            continue_label,
        }) => lower.do_while(body, test, break_label, continue_label),
        NodeKind::Loop(LoopKind::For(node)) => lower.for_loop(*node),
        NodeKind::Loop(LoopKind::ForEach(node)) => lower.for_each(*node),
        NodeKind::Switch(SwitchKind::Statement(node)) => lower.switch_statement(*node),
        NodeKind::Switch(SwitchKind::GotoCase { value }) => {
            Err(ReduceError::GotoCaseOutsideSwitch {
                value: value.to_string(),
            })
        }
        NodeKind::Switch(SwitchKind::GotoDefault) => Err(ReduceError::GotoDefaultOutsideSwitch),
        NodeKind::Switch(SwitchKind::Expression(node)) => lower.switch_expression(*node, ty),
        NodeKind::Switch(SwitchKind::IsPattern { operand, pattern }) => {
            lower.is_pattern(operand, pattern)
        }
        NodeKind::Dynamic(op) => lower.dynamic(*op, ty),
        NodeKind::Flow(FlowKind::Using(node)) => lower.using(*node),
        NodeKind::Flow(FlowKind::Lock { object, body }) => lower.lock(object, body),
        NodeKind::Flow(FlowKind::Await { .. }) => Err(ReduceError::NotImplemented {
            what: "await",
        }),
        NodeKind::Interp(InterpKind::String { parts }) => lower.interpolated(&parts),
        NodeKind::Interp(InterpKind::HandlerConversion(node)) => lower.handler(&node, ty),
        NodeKind::Tuple(TupleKind::Literal { elements }) => lower.tuple(elements, ty),
        NodeKind::Tuple(TupleKind::Convert {
            operand,
            conversions,
        }) => lower.tuple_convert(operand, &conversions, ty),
        NodeKind::Bound(node) => lower.bound(node),
    }
}

/// Whether `id` is outside the primitive set.
///
/// A primitive assignment into a bound indexer counts too: its target has
/// to be split into receiver and arguments before it can be stored into.
pub(crate) fn needs_reduction(builder: &TreeBuilder<'_>, id: NodeId) -> bool {
    match builder.kind(id) {
        NodeKind::Prim(Prim::Assign { target, .. }) => !builder.kind(*target).is_primitive(),
        kind => !kind.is_primitive(),
    }
}

/// Lowering rules over a builder.
pub(crate) struct Lowerer<'b, 'a> {
    pub(crate) b: &'b mut TreeBuilder<'a>,
}

impl Lowerer<'_, '_> {
    pub(crate) fn is_pure(&self, id: NodeId) -> bool {
        spill::is_pure(self.b, id)
    }

    /// `var = value`.
    pub(crate) fn store(&mut self, var: VarId, value: NodeId) -> ReduceResult<NodeId> {
        let target = self.b.variable(var);
        Ok(self.b.assign(target, value)?)
    }

    pub(crate) fn not(&mut self, test: NodeId) -> ReduceResult<NodeId> {
        Ok(self.b.unary(UnaryOp::Not, test)?)
    }

    /// A `void` block.
    pub(crate) fn statements(
        &mut self,
        vars: Vec<VarId>,
        exprs: Vec<NodeId>,
    ) -> ReduceResult<NodeId> {
        Ok(self.b.block_typed(vars, exprs, TypeId::VOID)?)
    }

    /// `value` as a `ty`: unchanged when it converts implicitly, otherwise
    /// through an explicit (optionally checked) conversion.
    pub(crate) fn coerce(
        &mut self,
        value: NodeId,
        ty: TypeId,
        checked: bool,
    ) -> ReduceResult<NodeId> {
        let from = self.b.ty(value);
        if from == ty || self.b.pool().is_implicitly_convertible(ty, from) {
            return Ok(value);
        }
        Ok(if checked {
            self.b.convert_checked(value, ty)?
        } else {
            self.b.convert(value, ty)?
        })
    }

    /// `null` of `ty`, compared against `value`.
    pub(crate) fn is_not_null(&mut self, value: NodeId) -> ReduceResult<NodeId> {
        let ty = self.b.ty(value);
        let null = self.b.constant(ConstValue::Null, ty)?;
        Ok(self.b.binary(arbor_ir::BinaryOp::NotEqual, value, null)?)
    }

    /// Disposal of `resource` as its enumerator or resource type requires;
    /// `None` when nothing is to be done.
    pub(crate) fn dispose(
        &mut self,
        resource: VarId,
        kind: DisposeKind,
    ) -> ReduceResult<Option<NodeId>> {
        let dispose = self.b.pool().well_known().dispose;
        let disposable = self.b.pool().well_known().disposable;
        let read = self.b.variable(resource);
        let node = match kind {
            DisposeKind::None => return Ok(None),
            DisposeKind::Always => self.b.call(Some(read), dispose, Vec::new())?,
            DisposeKind::NullChecked => {
                let test = self.is_not_null(read)?;
                let call = self.b.call(Some(read), dispose, Vec::new())?;
                self.b.if_then(test, call)?
            }
            DisposeKind::Probe => {
                let probe = self.b.new_temp(disposable);
                let cast = self.b.type_as(read, disposable)?;
                let init = self.store(probe, cast)?;
                let probed = self.b.variable(probe);
                let test = self.is_not_null(probed)?;
                let call = self.b.call(Some(probed), dispose, Vec::new())?;
                let guarded = self.b.if_then(test, call)?;
                self.statements(vec![probe], vec![init, guarded])?
            }
        };
        Ok(Some(node))
    }
}
