//! Late-bound operations.
//!
//! A dynamic operation becomes a primitive call site. By-reference
//! arguments that are not plain locations pass through a temporary that is
//! stored back once the site has run. Arguments still run in the order
//! written.

use arbor_diagnostic::ReduceResult;
use arbor_ir::{CallSite, DynamicOp, NodeId, NodeKind, Prim};
use arbor_types::TypeId;

use super::target::Target;
use super::{Lowerer, Spill};

impl Lowerer<'_, '_> {
    pub(crate) fn dynamic(&mut self, op: DynamicOp, ty: TypeId) -> ReduceResult<NodeId> {
        let hoist = self.dynamic_needs_hoist(&op);
        let mut spill = Spill::new();
        let mut writebacks = Vec::new();
        let mut values = Vec::with_capacity(op.args.len());
        for arg in &op.args {
            let value = if arg.flags.is_by_ref() {
                self.dynamic_by_ref(&mut spill, arg.value, hoist, &mut writebacks)?
            } else if hoist {
                spill.keep(self.b, arg.value)?
            } else {
                arg.value
            };
            values.push(value);
        }
        let site = CallSite::of(&op);
        tracing::trace!(
            kind = op.kind.name(),
            args = values.len(),
            hoist,
            "lowering dynamic site"
        );
        let result = self.b.dynamic_site(site, values, ty)?;

        if writebacks.is_empty() {
            return spill.finish(self.b, result);
        }
        if ty.is_void() {
            spill.push(result);
            for writeback in writebacks {
                spill.push(writeback);
            }
            return spill.finish_void(self.b);
        }
        let value = spill.temp(self.b, result)?;
        for writeback in writebacks {
            spill.push(writeback);
        }
        spill.finish(self.b, value)
    }

    /// Arguments are evaluated into temporaries in written order as soon as
    /// one by-reference argument has parts of its own to evaluate first.
    fn dynamic_needs_hoist(&self, op: &DynamicOp) -> bool {
        op.args.iter().any(|a| {
            a.flags.is_by_ref()
                && !matches!(self.b.kind(a.value), NodeKind::Prim(Prim::Variable(_)))
        })
    }

    fn dynamic_by_ref(
        &mut self,
        spill: &mut Spill,
        value: NodeId,
        hoist: bool,
        writebacks: &mut Vec<NodeId>,
    ) -> ReduceResult<NodeId> {
        if matches!(self.b.kind(value), NodeKind::Prim(Prim::Variable(_))) {
            return Ok(value);
        }
        // Late-bound members have no location; the site sees their value.
        if matches!(self.b.kind(value), NodeKind::Dynamic(_)) {
            return if hoist {
                spill.keep(self.b, value)
            } else {
                Ok(value)
            };
        }
        let Target::Node(location) = self.prepare_target(spill, value)? else {
            return Ok(value);
        };
        if matches!(
            self.b.kind(location),
            NodeKind::Prim(Prim::Field { .. } | Prim::ArrayIndex { .. })
        ) {
            return Ok(location);
        }
        let temp = self.b.new_temp(self.b.ty(location));
        spill.declare(temp);
        let init = self.store(temp, location)?;
        spill.push(init);
        let read = self.b.variable(temp);
        writebacks.push(self.b.assign(location, read)?);
        Ok(self.b.variable(temp))
    }
}
