//! Store targets evaluated once.
//!
//! A compound assignment reads its target and then writes it. Everything
//! the target depends on (receiver, indices, arguments) is spilled first,
//! so the read and the write see the same location and side effects run
//! once.

use arbor_diagnostic::{BuildError, ReduceResult};
use arbor_ir::{
    BinderFlags, BoundKind, CallSite, DynamicArg, DynamicKind, DynamicOp, NodeId, NodeKind, Prim,
};
use arbor_types::{ParamOwner, TypeId};

use super::{Lowerer, Spill};

/// A store target whose dependencies have been evaluated.
#[derive(Clone, Debug)]
pub(crate) enum Target {
    /// A variable, field, array element, property or indexer node that can
    /// be both read and assigned.
    Node(NodeId),
    /// Late-bound member or index; written through the matching setter.
    Dynamic { get: DynamicOp, ty: TypeId },
}

impl Lowerer<'_, '_> {
    pub(crate) fn prepare_target(
        &mut self,
        spill: &mut Spill,
        target: NodeId,
    ) -> ReduceResult<Target> {
        let kind = self.b.kind(target).clone();
        let prepared = match kind {
            NodeKind::Prim(Prim::Variable(_) | Prim::Field { receiver: None, .. }) => target,
            NodeKind::Prim(Prim::Field {
                receiver: Some(receiver),
                field,
            }) => {
                let receiver = self.prepare_receiver(spill, receiver)?;
                let kind = Prim::Field {
                    receiver: Some(receiver),
                    field,
                };
                self.b.update(target, kind.into())?
            }
            NodeKind::Prim(Prim::ArrayIndex { array, indices }) => {
                let array = self.prepare_receiver(spill, array)?;
                let indices = indices
                    .into_iter()
                    .map(|i| spill.keep(self.b, i))
                    .collect::<ReduceResult<Vec<_>>>()?;
                self.b.update(target, Prim::ArrayIndex { array, indices }.into())?
            }
            NodeKind::Prim(Prim::Property {
                receiver,
                property,
                args,
            }) => {
                let receiver = match receiver {
                    Some(r) => Some(self.prepare_receiver(spill, r)?),
                    None => None,
                };
                let args = args
                    .into_iter()
                    .map(|a| spill.keep(self.b, a))
                    .collect::<ReduceResult<Vec<_>>>()?;
                let kind = Prim::Property {
                    receiver,
                    property,
                    args,
                };
                self.b.update(target, kind.into())?
            }
            NodeKind::Bound(BoundKind::Index {
                receiver,
                indexer,
                args,
            }) => {
                let receiver = self.prepare_receiver(spill, receiver)?;
                let params = self.b.pool().property(indexer).index_params.clone();
                let member = self.b.pool().property(indexer).name.clone();
                // Indexer parameters cannot be by-reference, so binding
                // never produces write-backs here.
                let mut writebacks = Vec::new();
                let args = self.bind_args(
                    spill,
                    ParamOwner::Indexer(indexer),
                    &params,
                    &args,
                    true,
                    &mut writebacks,
                    &member,
                )?;
                for writeback in writebacks {
                    spill.push(writeback);
                }
                self.b.property_node(Some(receiver), indexer, args)?
            }
            NodeKind::Dynamic(op)
                if matches!(op.kind, DynamicKind::GetMember { .. } | DynamicKind::GetIndex) =>
            {
                let mut get = *op;
                for arg in &mut get.args {
                    arg.value = spill.keep(self.b, arg.value)?;
                }
                return Ok(Target::Dynamic {
                    get,
                    ty: self.b.ty(target),
                });
            }
            _ => {
                return Err(BuildError::NotWritable {
                    context: "reduced store target",
                }
                .into())
            }
        };
        Ok(Target::Node(prepared))
    }

    /// A receiver evaluated once. A value-type receiver that is itself a
    /// location is kept as a location so stores reach the original.
    fn prepare_receiver(&mut self, spill: &mut Spill, receiver: NodeId) -> ReduceResult<NodeId> {
        let is_location = matches!(
            self.b.kind(receiver),
            NodeKind::Prim(Prim::Variable(_) | Prim::Field { .. } | Prim::ArrayIndex { .. })
        );
        if is_location && self.b.pool().is_value_type(self.b.ty(receiver)) {
            if let Target::Node(node) = self.prepare_target(spill, receiver)? {
                return Ok(node);
            }
        }
        spill.keep(self.b, receiver)
    }

    /// Current value of a prepared target.
    pub(crate) fn read(&mut self, target: &Target, flags: BinderFlags) -> ReduceResult<NodeId> {
        match target {
            Target::Node(node) => Ok(*node),
            Target::Dynamic { get, ty } => {
                let op = get.clone().with_flags(flags);
                let args = op.args.iter().map(|a| a.value).collect();
                Ok(self.b.dynamic_site(CallSite::of(&op), args, *ty)?)
            }
        }
    }

    /// Store `value` into a prepared target; yields the stored value.
    pub(crate) fn write(&mut self, target: &Target, value: NodeId) -> ReduceResult<NodeId> {
        match target {
            Target::Node(node) => Ok(self.b.assign(*node, value)?),
            Target::Dynamic { get, ty } => {
                let kind = match &get.kind {
                    DynamicKind::GetMember { name } => DynamicKind::SetMember { name: name.clone() },
                    _ => DynamicKind::SetIndex,
                };
                let mut args = get.args.clone();
                args.push(DynamicArg::new(value));
                let set = DynamicOp {
                    kind,
                    flags: get.flags,
                    context: get.context,
                    args,
                };
                let values = set.args.iter().map(|a| a.value).collect();
                Ok(self.b.dynamic_site(CallSite::of(&set), values, *ty)?)
            }
        }
    }

    /// `target = value` where `target` is a parameter-bound indexer.
    pub(crate) fn assign_into_bound(
        &mut self,
        target: NodeId,
        value: NodeId,
    ) -> ReduceResult<NodeId> {
        let mut spill = Spill::new();
        let prepared = self.prepare_target(&mut spill, target)?;
        let store = self.write(&prepared, value)?;
        spill.finish(self.b, store)
    }
}
