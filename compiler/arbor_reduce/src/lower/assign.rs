//! Compound and increment/decrement assignment.
//!
//! `target op= value` becomes `target = final(op(left(target), value))` with
//! the target's receiver and arguments evaluated once. A built-in operator
//! whose result is wider than the target is narrowed back, checked when the
//! operator is. `x++` keeps the original value in a temporary.

use arbor_diagnostic::{BuildError, ReduceResult};
use arbor_ir::{
    BinaryOp, BinderFlags, CallSite, CompoundAssign, DynamicArg, DynamicKind, DynamicOp,
    IncDecAssign, NodeId, UnaryOp,
};
use arbor_types::{ConstValue, PrimitiveKind, TypeId};

use super::target::Target;
use super::{Lowerer, Spill};

impl Lowerer<'_, '_> {
    pub(crate) fn compound(&mut self, node: &CompoundAssign, ty: TypeId) -> ReduceResult<NodeId> {
        let mut spill = Spill::new();
        let target = self.prepare_target(&mut spill, node.target)?;
        let result = match (&target, node.op.binary()) {
            (_, None) => {
                let value = self.apply_opt(node.final_conversion, node.value)?;
                self.write(&target, value)?
            }
            (_, Some(BinaryOp::Coalesce)) => {
                let read = self.read(&target, BinderFlags::empty())?;
                let current = self.apply_opt(node.left_conversion, read)?;
                let value = self.apply_opt(node.final_conversion, node.value)?;
                let store = self.write(&target, value)?;
                let coalesced = self.b.binary(BinaryOp::Coalesce, current, store)?;
                self.coerce(coalesced, ty, false)?
            }
            (Target::Dynamic { ty: dyn_ty, .. }, Some(op)) => {
                let dyn_ty = *dyn_ty;
                let read = self.read(&target, BinderFlags::VALUE_FROM_COMPOUND_ASSIGNMENT)?;
                let mut flags = BinderFlags::empty();
                if op.is_checked() {
                    flags |= BinderFlags::CHECKED;
                }
                let combined = self.dynamic_binary(op, read, node.value, flags, dyn_ty)?;
                self.write(&target, combined)?
            }
            (Target::Node(_), Some(op)) => {
                let read = self.read(&target, BinderFlags::empty())?;
                let left = self.apply_opt(node.left_conversion, read)?;
                let combined = match node.method {
                    Some(method) => self.b.binary_with(op, left, node.value, method)?,
                    None => self.b.binary(op, left, node.value)?,
                };
                let value = match node.final_conversion {
                    Some(conversion) => self.apply(conversion, combined)?,
                    None => self.coerce(combined, ty, op.is_checked())?,
                };
                self.write(&target, value)?
            }
        };
        spill.finish(self.b, result)
    }

    pub(crate) fn inc_dec(&mut self, node: &IncDecAssign, ty: TypeId) -> ReduceResult<NodeId> {
        let mut spill = Spill::new();
        let target = self.prepare_target(&mut spill, node.operand)?;
        let read = self.read(&target, BinderFlags::VALUE_FROM_COMPOUND_ASSIGNMENT)?;
        let old = if node.op.is_prefix() {
            read
        } else {
            spill.temp(self.b, read)?
        };
        let stepped = self.step(node, &target, old, ty)?;
        let store = self.write(&target, stepped)?;
        if node.op.is_prefix() {
            spill.finish(self.b, store)
        } else {
            spill.push(store);
            spill.finish(self.b, old)
        }
    }

    /// `value + 1` or `value - 1` as the operand's type.
    fn step(
        &mut self,
        node: &IncDecAssign,
        target: &Target,
        value: NodeId,
        ty: TypeId,
    ) -> ReduceResult<NodeId> {
        let unary = if node.op.is_increment() {
            UnaryOp::Increment
        } else {
            UnaryOp::Decrement
        };
        if let Some(method) = node.method {
            return Ok(self.b.unary_with(unary, value, method)?);
        }
        if let Target::Dynamic { ty: dyn_ty, .. } = target {
            let mut flags = BinderFlags::empty();
            if node.checked {
                flags |= BinderFlags::CHECKED;
            }
            let op = DynamicOp::new(DynamicKind::Unary(unary), vec![DynamicArg::new(value)])
                .with_flags(flags);
            return Ok(self.b.dynamic_site(CallSite::of(&op), vec![value], *dyn_ty)?);
        }

        let pool = self.b.pool();
        let nullable = pool.is_nullable(ty);
        let base = pool.non_nullable(ty);
        let arithmetic_base = pool.enum_underlying(base).unwrap_or(base);
        let operand = if arithmetic_base == base {
            value
        } else if nullable {
            let lifted = self.b.pool_mut().nullable_of(arithmetic_base);
            self.b.convert(value, lifted)?
        } else {
            self.b.convert(value, arithmetic_base)?
        };

        let one = match arithmetic_base.primitive().and_then(ConstValue::one) {
            Some(one) => self.b.constant(one, arithmetic_base)?,
            None if arithmetic_base.primitive() == Some(PrimitiveKind::Char) => self.b.int(1),
            None => {
                return Err(BuildError::OperatorNotDefined {
                    op: node.op.name().to_owned(),
                    operands: format!("`{}`", self.b.pool().name(ty)),
                }
                .into())
            }
        };
        let sum = self.b.binary(node.op.binary(node.checked), operand, one)?;
        self.coerce(sum, ty, node.checked)
    }

    /// Late-bound `left op right`.
    fn dynamic_binary(
        &mut self,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        flags: BinderFlags,
        ty: TypeId,
    ) -> ReduceResult<NodeId> {
        let site = DynamicOp::new(
            DynamicKind::Binary(op),
            vec![DynamicArg::new(left), DynamicArg::new(right)],
        )
        .with_flags(flags | BinderFlags::VALUE_FROM_COMPOUND_ASSIGNMENT);
        Ok(self
            .b
            .dynamic_site(CallSite::of(&site), vec![left, right], ty)?)
    }

    /// Invoke a one-parameter conversion lambda.
    pub(crate) fn apply(&mut self, lambda: NodeId, value: NodeId) -> ReduceResult<NodeId> {
        Ok(self.b.invoke(lambda, vec![value])?)
    }

    pub(crate) fn apply_opt(
        &mut self,
        lambda: Option<NodeId>,
        value: NodeId,
    ) -> ReduceResult<NodeId> {
        match lambda {
            Some(lambda) => self.apply(lambda, value),
            None => Ok(value),
        }
    }
}
