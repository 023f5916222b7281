//! Parameter-bound calls, indexers, constructions and invocations.
//!
//! Arguments run in the order written and are then passed in parameter
//! order. Omitted optional parameters receive their default. A by-reference
//! argument that is a property or indexer goes through a temporary that is
//! written back after the call.

use arbor_diagnostic::{BuildError, ReduceResult};
use arbor_ir::{BoundKind, NodeId, NodeKind, ParamAssignment, Prim};
use arbor_types::{ConstValue, ParamDef, ParamOwner};
use smallvec::{smallvec, SmallVec};

use super::target::Target;
use super::{Lowerer, Spill};

impl Lowerer<'_, '_> {
    pub(crate) fn bound(&mut self, node: BoundKind) -> ReduceResult<NodeId> {
        let hoist = self.needs_hoist(&node);
        let mut spill = Spill::new();
        let mut writebacks = Vec::new();
        let result = match node {
            BoundKind::Call {
                receiver,
                method,
                args,
            } => {
                let receiver = self.bound_receiver(&mut spill, receiver, hoist)?;
                let def = self.b.pool().method(method).clone();
                let args = self.bind_args(
                    &mut spill,
                    ParamOwner::Method(method),
                    &def.params,
                    &args,
                    hoist,
                    &mut writebacks,
                    &def.name,
                )?;
                self.b.call(receiver, method, args)?
            }
            BoundKind::Index {
                receiver,
                indexer,
                args,
            } => {
                let receiver = self.bound_receiver(&mut spill, Some(receiver), hoist)?;
                let def = self.b.pool().property(indexer).clone();
                let args = self.bind_args(
                    &mut spill,
                    ParamOwner::Indexer(indexer),
                    &def.index_params,
                    &args,
                    hoist,
                    &mut writebacks,
                    &def.name,
                )?;
                self.b.property_node(receiver, indexer, args)?
            }
            BoundKind::New { ctor, args } => {
                let def = self.b.pool().ctor(ctor).clone();
                let member = self.b.pool().name(def.declaring).to_owned();
                let args = self.bind_args(
                    &mut spill,
                    ParamOwner::Ctor(ctor),
                    &def.params,
                    &args,
                    hoist,
                    &mut writebacks,
                    &member,
                )?;
                self.b.new_object(ctor, args)?
            }
            BoundKind::Invoke { target, args } => {
                let target_ty = self.b.ty(target);
                let Some(invoke) = self.b.pool().delegate_invoke(target_ty) else {
                    return Err(BuildError::NotADelegate {
                        found: self.b.pool().name(target_ty).to_owned(),
                    }
                    .into());
                };
                let target = match self.bound_receiver(&mut spill, Some(target), hoist)? {
                    Some(t) => t,
                    None => target,
                };
                let params = self.b.pool().method(invoke).params.clone();
                let args = self.bind_args(
                    &mut spill,
                    ParamOwner::Method(invoke),
                    &params,
                    &args,
                    hoist,
                    &mut writebacks,
                    "Invoke",
                )?;
                self.b.invoke(target, args)?
            }
        };

        if writebacks.is_empty() {
            return spill.finish(self.b, result);
        }
        if self.b.ty(result).is_void() {
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

    /// Arguments are hoisted when written out of parameter order, or when
    /// a by-reference argument has parts of its own to evaluate first.
    fn needs_hoist(&self, node: &BoundKind) -> bool {
        !node.args_in_order()
            || node.args().iter().any(|a| {
                self.is_by_ref_param(a)
                    && !matches!(self.b.kind(a.value), NodeKind::Prim(Prim::Variable(_)))
            })
    }

    fn is_by_ref_param(&self, arg: &ParamAssignment) -> bool {
        self.b
            .pool()
            .param(arg.param)
            .is_some_and(|p| p.kind.is_by_ref())
    }

    fn bound_receiver(
        &mut self,
        spill: &mut Spill,
        receiver: Option<NodeId>,
        hoist: bool,
    ) -> ReduceResult<Option<NodeId>> {
        match receiver {
            Some(r) if hoist => Ok(Some(spill.keep(self.b, r)?)),
            other => Ok(other),
        }
    }

    /// Positional arguments for `params`, in parameter order.
    ///
    /// With `hoist`, every side-effecting argument is evaluated into a
    /// temporary in written order first. Write-backs for by-reference
    /// property arguments are appended to `writebacks` and must run after
    /// the call.
    #[expect(clippy::too_many_arguments, reason = "binding state is threaded through")]
    pub(crate) fn bind_args(
        &mut self,
        spill: &mut Spill,
        owner: ParamOwner,
        params: &[ParamDef],
        args: &[ParamAssignment],
        hoist: bool,
        writebacks: &mut Vec<NodeId>,
        member: &str,
    ) -> ReduceResult<Vec<NodeId>> {
        let mut slots: SmallVec<[Option<NodeId>; 8]> = smallvec![None; params.len()];
        for arg in args {
            let index = arg.param.index();
            let param = match params.get(index) {
                Some(p) if arg.param.owner == owner => p,
                _ => {
                    return Err(BuildError::ParameterNotOwned {
                        param: format!("#{}", arg.param.position),
                        member: member.to_owned(),
                    }
                    .into())
                }
            };
            let value = if param.kind.is_by_ref() {
                self.by_ref_arg(spill, param, arg.value, writebacks)?
            } else if hoist {
                spill.keep(self.b, arg.value)?
            } else {
                arg.value
            };
            slots[index] = Some(value);
        }

        params
            .iter()
            .zip(slots)
            .map(|(param, slot)| match slot {
                Some(value) => Ok(value),
                None => self.default_arg(param, member),
            })
            .collect()
    }

    /// A by-reference argument: variables, fields and array elements are
    /// passed as locations; properties and indexers go through a temporary.
    fn by_ref_arg(
        &mut self,
        spill: &mut Spill,
        param: &ParamDef,
        value: NodeId,
        writebacks: &mut Vec<NodeId>,
    ) -> ReduceResult<NodeId> {
        let Target::Node(location) = self.prepare_target(spill, value)? else {
            return Err(BuildError::ByRefArgumentNotWritable {
                param: param.name.clone(),
            }
            .into());
        };
        let direct = matches!(
            self.b.kind(location),
            NodeKind::Prim(Prim::Variable(_) | Prim::Field { .. } | Prim::ArrayIndex { .. })
        );
        if direct {
            return Ok(location);
        }
        let temp = self.b.new_temp(param.ty);
        spill.declare(temp);
        if param.kind != arbor_types::ParamKind::Out {
            let init = self.store(temp, location)?;
            spill.push(init);
        }
        let read = self.b.variable(temp);
        writebacks.push(self.b.assign(location, read)?);
        Ok(self.b.variable(temp))
    }

    fn default_arg(&mut self, param: &ParamDef, member: &str) -> ReduceResult<NodeId> {
        match &param.default {
            Some(ConstValue::Null) if !self.b.pool().can_be_null(param.ty) => {
                Ok(self.b.default(param.ty)?)
            }
            Some(value) => Ok(self.b.constant(value.clone(), param.ty)?),
            None => Err(BuildError::UnboundParameter {
                param: param.name.clone(),
                member: member.to_owned(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
