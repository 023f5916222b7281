//! Checks shared by several factory families.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{
    walk_node, FlowKind, LabelId, LoopKind, NodeArena, NodeId, NodeKind, Prim, SwitchKind, VarId,
    Visitor,
};
use arbor_ir::{BinaryOp, DynamicKind, UnaryOp};
use arbor_types::{is_numeric_widening, PrimitiveKind, TypeId};
use rustc_hash::FxHashSet;

use super::{rejected, TreeBuilder};

/// How a node can be stored into.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum TargetShape {
    Variable,
    Field,
    /// Property or indexer: needs a write-back.
    Property,
    ArrayElement,
    /// Indexer with parameter-bound arguments.
    BoundIndex,
    /// Late-bound member or index.
    Dynamic,
}

impl TargetShape {
    /// Whether a by-reference argument can alias the target directly.
    pub(crate) fn is_direct(self) -> bool {
        matches!(
            self,
            TargetShape::Variable | TargetShape::Field | TargetShape::ArrayElement
        )
    }
}

/// Common numeric type of two operands, after promotion of the small
/// integral types to `int`.
pub(crate) fn promote(left: TypeId, right: TypeId) -> Option<TypeId> {
    use PrimitiveKind::{Byte, Char, Int16, Int32, Int64, SByte, UInt16, UInt32};

    let (lk, rk) = (left.primitive()?, right.primitive()?);
    let numeric = |k: PrimitiveKind| k.is_arithmetic() || k == Char;
    if !numeric(lk) || !numeric(rk) {
        return None;
    }
    let wider = if lk == rk {
        lk
    } else if is_numeric_widening(lk, rk) {
        rk
    } else if is_numeric_widening(rk, lk) {
        lk
    } else if matches!((lk, rk), (UInt32, SByte | Int16 | Int32) | (SByte | Int16 | Int32, UInt32))
    {
        Int64
    } else {
        return None;
    };
    Some(match wider {
        SByte | Byte | Int16 | UInt16 | Char => Int32.type_id(),
        k => k.type_id(),
    })
}

impl TreeBuilder<'_> {
    /// Whether `from` converts implicitly to `to`.
    #[inline]
    pub(crate) fn converts(&self, to: TypeId, from: TypeId) -> bool {
        self.pool.is_implicitly_convertible(to, from)
    }

    pub(crate) fn ensure_node_type(&self, ty: TypeId) -> BuildResult<()> {
        if self.pool.is_concrete(ty) {
            Ok(())
        } else {
            Err(rejected(BuildError::InvalidNodeType { ty: self.name(ty) }))
        }
    }

    pub(crate) fn ensure_value(&self, id: NodeId, context: &'static str) -> BuildResult<()> {
        if self.ty(id).is_void() {
            return Err(rejected(BuildError::VoidValue { context }));
        }
        Ok(())
    }

    pub(crate) fn ensure_bool(&self, id: NodeId, context: &'static str) -> BuildResult<()> {
        let ty = self.ty(id);
        if ty == TypeId::BOOL {
            Ok(())
        } else {
            Err(rejected(BuildError::NotBoolean {
                context,
                found: self.name(ty),
            }))
        }
    }

    /// `value` must convert implicitly to `to`.
    pub(crate) fn ensure_converts(
        &self,
        to: TypeId,
        value: NodeId,
        context: &'static str,
    ) -> BuildResult<()> {
        let from = self.ty(value);
        if self.converts(to, from) {
            Ok(())
        } else {
            Err(rejected(BuildError::IncompatibleTypes {
                context,
                expected: self.name(to),
                found: self.name(from),
            }))
        }
    }

    pub(crate) fn ensure_distinct_vars(&self, vars: &[VarId]) -> BuildResult<()> {
        let mut seen = FxHashSet::default();
        for &var in vars {
            if !seen.insert(var) {
                return Err(rejected(BuildError::DuplicateVariable {
                    name: self.var_name(var),
                }));
            }
        }
        Ok(())
    }

    // Lambdas

    /// Parameters and body of a lambda node.
    pub(crate) fn lambda_parts(
        &self,
        id: NodeId,
        what: &'static str,
    ) -> BuildResult<(Vec<VarId>, NodeId)> {
        match self.kind(id) {
            NodeKind::Prim(Prim::Lambda { params, body }) => Ok((params.clone(), *body)),
            _ => Err(rejected(BuildError::NotALambda { what })),
        }
    }

    /// Check a one-parameter conversion lambda accepting `input`, and return
    /// its result type.
    pub(crate) fn conversion_result(&self, lambda: NodeId, input: TypeId) -> BuildResult<TypeId> {
        let (params, body) = self.lambda_parts(lambda, "conversion")?;
        if params.len() != 1 {
            return Err(rejected(BuildError::ConversionParameterCount {
                found: params.len(),
            }));
        }
        let param_ty = self.var_ty(params[0]);
        if !self.converts(param_ty, input) {
            return Err(rejected(BuildError::ConversionType {
                position: "parameter",
                expected: self.name(input),
                found: self.name(param_ty),
            }));
        }
        Ok(self.ty(body))
    }

    /// Check a conversion lambda from `input` to `output`.
    pub(crate) fn check_conversion(
        &self,
        lambda: NodeId,
        input: TypeId,
        output: TypeId,
    ) -> BuildResult<()> {
        let result = self.conversion_result(lambda, input)?;
        if self.converts(output, result) {
            Ok(())
        } else {
            Err(rejected(BuildError::ConversionType {
                position: "result",
                expected: self.name(output),
                found: self.name(result),
            }))
        }
    }

    // Store targets

    /// Classify `id` as a store target. With `read_too`, the target must
    /// also be readable (compound assignment, increment, by-ref argument).
    pub(crate) fn target_shape(
        &self,
        id: NodeId,
        read_too: bool,
        context: &'static str,
    ) -> BuildResult<TargetShape> {
        match self.kind(id) {
            NodeKind::Prim(Prim::Variable(_)) => Ok(TargetShape::Variable),
            NodeKind::Prim(Prim::Field { field, .. }) => {
                let def = self.pool.field(*field);
                if def.is_readonly {
                    return Err(rejected(BuildError::ReadOnlyField {
                        field: def.name.clone(),
                    }));
                }
                Ok(TargetShape::Field)
            }
            NodeKind::Prim(Prim::Property { property, .. }) => {
                self.ensure_accessors(*property, read_too)?;
                Ok(TargetShape::Property)
            }
            NodeKind::Bound(arbor_ir::BoundKind::Index { indexer, .. }) => {
                self.ensure_accessors(*indexer, read_too)?;
                Ok(TargetShape::BoundIndex)
            }
            NodeKind::Prim(Prim::ArrayIndex { .. }) => Ok(TargetShape::ArrayElement),
            NodeKind::Dynamic(op)
                if matches!(op.kind, DynamicKind::GetMember { .. } | DynamicKind::GetIndex) =>
            {
                Ok(TargetShape::Dynamic)
            }
            _ => Err(rejected(BuildError::NotWritable { context })),
        }
    }

    fn ensure_accessors(
        &self,
        property: arbor_types::PropertyId,
        read_too: bool,
    ) -> BuildResult<()> {
        let def = self.pool.property(property);
        if def.setter.is_none() {
            return Err(rejected(BuildError::MissingSetter {
                member: def.name.clone(),
            }));
        }
        if read_too && def.getter.is_none() {
            return Err(rejected(BuildError::MissingGetter {
                member: def.name.clone(),
            }));
        }
        Ok(())
    }

    // Operator typing

    /// Result type of a built-in binary operator, or `None` when the
    /// operator is not defined for the operand types.
    pub(crate) fn binary_type(
        &mut self,
        op: BinaryOp,
        left: TypeId,
        right: TypeId,
    ) -> Option<TypeId> {
        let pool = &*self.pool;
        match op {
            BinaryOp::AndAlso | BinaryOp::OrElse => {
                (left == TypeId::BOOL && right == TypeId::BOOL).then_some(TypeId::BOOL)
            }
            BinaryOp::Coalesce => {
                if !pool.can_be_null(left) {
                    return None;
                }
                let underlying = pool.non_nullable(left);
                if pool.is_implicitly_convertible(underlying, right) {
                    Some(underlying)
                } else if pool.is_implicitly_convertible(left, right) {
                    Some(left)
                } else if pool.is_implicitly_convertible(right, left) {
                    Some(right)
                } else {
                    None
                }
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                let comparable = left == right
                    || pool.is_implicitly_convertible(left, right)
                    || pool.is_implicitly_convertible(right, left)
                    || promote(pool.non_nullable(left), pool.non_nullable(right)).is_some();
                comparable.then_some(TypeId::BOOL)
            }
            BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual => {
                let (l, r) = (pool.non_nullable(left), pool.non_nullable(right));
                let ordered = promote(l, r).is_some() || (pool.is_enum(l) && l == r);
                ordered.then_some(TypeId::BOOL)
            }
            _ => {
                let lifted = pool.is_nullable(left) || pool.is_nullable(right);
                let (l, r) = (pool.non_nullable(left), pool.non_nullable(right));
                let result = if op.is_bitwise() && l == TypeId::BOOL && r == TypeId::BOOL {
                    Some(TypeId::BOOL)
                } else if op.is_bitwise() && pool.is_enum(l) && l == r {
                    Some(l)
                } else if op.is_shift() {
                    let int_amount = pool.is_implicitly_convertible(TypeId::INT32, r);
                    promote(l, l)
                        .filter(|t| int_amount && pool.is_integral(*t))
                } else if op.is_bitwise() {
                    promote(l, r).filter(|t| pool.is_integral(*t))
                } else {
                    promote(l, r)
                };
                match result {
                    Some(ty) if lifted => Some(self.pool.nullable_of(ty)),
                    other => other,
                }
            }
        }
    }

    /// Result type of a built-in unary operator (conversions excluded).
    pub(crate) fn unary_type(&mut self, op: UnaryOp, operand: TypeId) -> Option<TypeId> {
        let pool = &*self.pool;
        let lifted = pool.is_nullable(operand);
        let base = pool.non_nullable(operand);
        let result = match op {
            UnaryOp::Negate | UnaryOp::NegateChecked | UnaryOp::Plus => {
                promote(base, base).filter(|_| pool.is_arithmetic(base) || base == TypeId::CHAR)
            }
            UnaryOp::Not => (base == TypeId::BOOL).then_some(TypeId::BOOL),
            UnaryOp::OnesComplement => {
                if pool.is_enum(base) {
                    Some(base)
                } else {
                    promote(base, base).filter(|t| pool.is_integral(*t))
                }
            }
            UnaryOp::Increment | UnaryOp::Decrement => {
                (pool.is_arithmetic(base) || base == TypeId::CHAR).then_some(base)
            }
            UnaryOp::IsTrue | UnaryOp::IsFalse => {
                return (operand == TypeId::BOOL).then_some(TypeId::BOOL);
            }
            UnaryOp::ArrayLength => {
                return match pool.array_element(operand) {
                    Some((_, 1)) => Some(TypeId::INT32),
                    _ => None,
                };
            }
            UnaryOp::Convert | UnaryOp::ConvertChecked | UnaryOp::TypeAs | UnaryOp::Unbox => {
                return None;
            }
        };
        match result {
            Some(ty) if lifted => Some(self.pool.nullable_of(ty)),
            other => other,
        }
    }

    // Tree scans

    /// Whether `id` contains an `await` outside nested lambdas.
    pub(crate) fn contains_await(&self, id: NodeId) -> bool {
        let mut finder = AwaitFinder { found: false };
        finder.visit_node(id, self.arena);
        finder.found
    }

    /// Whether `label` is already declared somewhere inside `id`.
    pub(crate) fn declares_label(&self, id: NodeId, label: LabelId) -> bool {
        let mut finder = LabelFinder {
            label,
            found: false,
        };
        finder.visit_node(id, self.arena);
        finder.found
    }

    /// Break and continue labels of a loop: distinct, the continue label
    /// void, and neither declared again inside the body.
    pub(crate) fn check_loop_labels(
        &self,
        body: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    ) -> BuildResult<()> {
        if let (Some(b), Some(c)) = (break_label, continue_label) {
            if b == c {
                return Err(rejected(BuildError::DuplicateLabel {
                    name: self.label_name(b),
                }));
            }
        }
        if let Some(c) = continue_label {
            if !self.label_ty(c).is_void() {
                return Err(rejected(BuildError::ContinueLabelNotVoid {
                    label: self.label_name(c),
                }));
            }
        }
        for label in [break_label, continue_label].into_iter().flatten() {
            if self.declares_label(body, label) {
                return Err(rejected(BuildError::DuplicateLabel {
                    name: self.label_name(label),
                }));
            }
        }
        Ok(())
    }
}

struct AwaitFinder {
    found: bool,
}

impl Visitor for AwaitFinder {
    fn visit_node(&mut self, id: NodeId, arena: &NodeArena) {
        if self.found {
            return;
        }
        match arena.kind(id) {
            NodeKind::Flow(FlowKind::Await { .. }) => self.found = true,
            NodeKind::Flow(FlowKind::Using(u)) if u.await_info.is_some() => self.found = true,
            NodeKind::Loop(LoopKind::ForEach(f)) if f.await_info.is_some() => self.found = true,
            NodeKind::Prim(Prim::Lambda { .. }) => {}
            _ => walk_node(self, id, arena),
        }
    }
}

/// Finds a node that declares a label as its own target.
struct LabelFinder {
    label: LabelId,
    found: bool,
}

impl Visitor for LabelFinder {
    fn visit_node(&mut self, id: NodeId, arena: &NodeArena) {
        if self.found {
            return;
        }
        let declares = match arena.kind(id) {
            NodeKind::Prim(Prim::Label { label, .. }) => *label == self.label,
            NodeKind::Prim(Prim::Loop {
                break_label,
                continue_label,
                ..
            }) => *break_label == Some(self.label) || *continue_label == Some(self.label),
            NodeKind::Loop(l) => {
                let (b, c) = l.labels();
                b == Some(self.label) || c == Some(self.label)
            }
            NodeKind::Switch(SwitchKind::Statement(s)) => s.break_label == self.label,
            _ => false,
        };
        if declares {
            self.found = true;
        } else {
            walk_node(self, id, arena);
        }
    }
}
