//! Compound and increment/decrement assignment.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{AssignKind, AssignOp, CompoundAssign, IncDecAssign, IncDecOp, NodeId, UnaryOp};
use arbor_types::TypeId;

use super::checks::TargetShape;
use super::{rejected, TreeBuilder};

impl TreeBuilder<'_> {
    /// `target op= value`.
    ///
    /// The target must be readable and writable (plain `Assign` only needs
    /// it writable). Conversion lambdas are checked for shape before the
    /// operator is typed. A built-in operator whose result is wider than the
    /// target is narrowed back when stored.
    pub fn compound_assign(&mut self, node: CompoundAssign) -> BuildResult<NodeId> {
        let read_too = node.op != AssignOp::Assign;
        let shape = self.target_shape(node.target, read_too, "compound assignment target")?;
        self.ensure_value(node.value, "assigned value")?;
        let target_ty = self.ty(node.target);

        let left_ty = match node.left_conversion {
            Some(lc) => self.conversion_result(lc, target_ty)?,
            None => target_ty,
        };
        if let Some(fc) = node.final_conversion {
            let (params, _) = self.lambda_parts(fc, "final conversion")?;
            if params.len() != 1 {
                return Err(rejected(BuildError::ConversionParameterCount {
                    found: params.len(),
                }));
            }
        }

        if shape == TargetShape::Dynamic {
            return Ok(self.push(AssignKind::Compound(node), target_ty));
        }

        let value_ty = self.ty(node.value);
        let result_ty = match (node.method, node.op.binary()) {
            (Some(method), _) => self.operator_method(method, &[left_ty, value_ty])?,
            (None, None) => value_ty,
            (None, Some(op)) => match self.binary_type(op, left_ty, value_ty) {
                Some(ty) => ty,
                None => return Err(self.operator_not_defined(op.symbol(), &[left_ty, value_ty])),
            },
        };

        match node.final_conversion {
            Some(fc) => self.check_conversion(fc, result_ty, target_ty)?,
            None => self.ensure_stores_back(target_ty, result_ty, node.method.is_none())?,
        }
        Ok(self.push(AssignKind::Compound(node), target_ty))
    }

    /// Shorthand for a compound assignment without method or conversions.
    pub fn compound(&mut self, op: AssignOp, target: NodeId, value: NodeId) -> BuildResult<NodeId> {
        self.compound_assign(CompoundAssign::new(op, target, value))
    }

    /// `++x`, `x--` and friends.
    pub fn inc_dec(&mut self, node: IncDecAssign) -> BuildResult<NodeId> {
        let shape = self.target_shape(node.operand, true, "increment operand")?;
        let ty = self.ty(node.operand);
        if shape == TargetShape::Dynamic {
            return Ok(self.push(AssignKind::IncDec(node), ty));
        }
        match node.method {
            Some(method) => {
                let result = self.operator_method(method, &[ty])?;
                self.ensure_stores_back(ty, result, false)?;
            }
            None => {
                let op = if node.op.is_increment() {
                    UnaryOp::Increment
                } else {
                    UnaryOp::Decrement
                };
                if self.unary_type(op, ty).is_none() && !self.pool.is_enum(ty) {
                    return Err(self.operator_not_defined(node.op.name(), &[ty]));
                }
            }
        }
        Ok(self.push(AssignKind::IncDec(node), ty))
    }

    /// Unchecked increment or decrement without a custom method.
    pub fn increment(&mut self, op: IncDecOp, operand: NodeId) -> BuildResult<NodeId> {
        self.inc_dec(IncDecAssign::new(op, operand))
    }

    /// An operator result can be stored into a target of type `target`:
    /// implicitly, or for built-in numeric operators by narrowing.
    fn ensure_stores_back(
        &self,
        target: TypeId,
        result: TypeId,
        builtin: bool,
    ) -> BuildResult<()> {
        let numeric = |ty: TypeId| {
            let ty = self.pool.non_nullable(ty);
            self.pool.is_arithmetic(ty) || ty == TypeId::CHAR || self.pool.is_enum(ty)
        };
        let narrows = builtin
            && numeric(target)
            && numeric(result)
            && self.pool.is_explicitly_convertible(target, result);
        if self.converts(target, result) || narrows {
            Ok(())
        } else {
            Err(rejected(BuildError::IncompatibleTypes {
                context: "compound assignment result",
                expected: self.name(target),
                found: self.name(result),
            }))
        }
    }
}
