//! Tuple literals and element-wise tuple conversions.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{NodeId, TupleKind};
use arbor_types::{TypeId, MAX_TUPLE_ARITY};

use super::{rejected, TreeBuilder};

impl TreeBuilder<'_> {
    /// `(a, b, ...)` typed as the value tuple of the element types.
    pub fn tuple(&mut self, elements: Vec<NodeId>) -> BuildResult<NodeId> {
        if elements.is_empty() || elements.len() > MAX_TUPLE_ARITY {
            return Err(rejected(BuildError::TupleArity {
                found: elements.len(),
            }));
        }
        let mut types = Vec::with_capacity(elements.len());
        for &e in &elements {
            self.ensure_value(e, "tuple element")?;
            types.push(self.ty(e));
        }
        let Some(ty) = self.pool.tuple_of(&types) else {
            return Err(rejected(BuildError::TupleArity {
                found: elements.len(),
            }));
        };
        Ok(self.push(TupleKind::Literal { elements }, ty))
    }

    /// Convert a tuple to `ty` with one conversion lambda per element.
    pub fn tuple_convert(
        &mut self,
        operand: NodeId,
        conversions: Vec<NodeId>,
        ty: TypeId,
    ) -> BuildResult<NodeId> {
        let from_ty = self.ty(operand);
        let (Some(from), Some(to)) = (
            self.pool.tuple_elements(from_ty).map(<[TypeId]>::to_vec),
            self.pool.tuple_elements(ty).map(<[TypeId]>::to_vec),
        ) else {
            return Err(rejected(BuildError::NotConvertible {
                from: self.name(from_ty),
                to: self.name(ty),
            }));
        };
        if from.len() != to.len() || conversions.len() != to.len() {
            return Err(rejected(BuildError::ArgumentCount {
                what: "tuple conversion".to_owned(),
                expected: to.len(),
                found: if from.len() == to.len() {
                    conversions.len()
                } else {
                    from.len()
                },
            }));
        }
        for ((&conv, &f), &t) in conversions.iter().zip(&from).zip(&to) {
            self.check_conversion(conv, f, t)?;
        }
        Ok(self.push(
            TupleKind::Convert {
                operand,
                conversions,
            },
            ty,
        ))
    }
}
