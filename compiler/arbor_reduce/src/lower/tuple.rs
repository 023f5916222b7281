//! Tuple literals and element-wise tuple conversions.

use arbor_diagnostic::{BuildError, ReduceResult};
use arbor_ir::NodeId;
use arbor_types::{CtorId, TypeId};

use super::{Lowerer, Spill};

impl Lowerer<'_, '_> {
    /// `new ValueTuple<..>(elements...)`.
    pub(crate) fn tuple(&mut self, elements: Vec<NodeId>, ty: TypeId) -> ReduceResult<NodeId> {
        let ctor = self.tuple_ctor(ty, elements.len())?;
        Ok(self.b.new_object(ctor, elements)?)
    }

    /// `{ t = operand; new ValueTuple<..>(conv1(t.Item1), conv2(t.Item2), ...) }`.
    pub(crate) fn tuple_convert(
        &mut self,
        operand: NodeId,
        conversions: &[NodeId],
        ty: TypeId,
    ) -> ReduceResult<NodeId> {
        let mut spill = Spill::new();
        let source = spill.keep(self.b, operand)?;
        let source_ty = self.b.ty(operand);
        let mut elements = Vec::with_capacity(conversions.len());
        for (i, &conversion) in conversions.iter().enumerate() {
            let name = format!("Item{}", i + 1);
            let Some(field) = self.b.pool().find_field(source_ty, &name) else {
                return Err(BuildError::MemberNotOnType {
                    member: name,
                    ty: self.b.pool().name(source_ty).to_owned(),
                }
                .into());
            };
            let item = self.b.field(Some(source), field)?;
            elements.push(self.apply(conversion, item)?);
        }
        let ctor = self.tuple_ctor(ty, elements.len())?;
        let tuple = self.b.new_object(ctor, elements)?;
        spill.finish(self.b, tuple)
    }

    fn tuple_ctor(&self, ty: TypeId, arity: usize) -> ReduceResult<CtorId> {
        self.b.pool().find_ctor(ty, arity).ok_or_else(|| {
            BuildError::TupleArity { found: arity }.into()
        })
    }
}
