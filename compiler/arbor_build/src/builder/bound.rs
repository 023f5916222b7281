//! Calls, indexers, constructions and delegate invocations with
//! parameter-bound arguments.
//!
//! Every binding names its formal parameter, so arguments may come in any
//! order and optional parameters may be left out. Binding is complete when
//! no parameter is bound twice and every required parameter is bound.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{BoundKind, NodeId, ParamAssignment};
use arbor_types::{CtorId, MethodId, ParamDef, ParamOwner, PropertyId};
use smallvec::SmallVec;

use super::{rejected, TreeBuilder};

impl TreeBuilder<'_> {
    pub fn bound_call(
        &mut self,
        receiver: Option<NodeId>,
        method: MethodId,
        args: Vec<ParamAssignment>,
    ) -> BuildResult<NodeId> {
        let def = self.pool.method(method).clone();
        self.check_receiver(receiver, def.declaring, def.is_static, &def.name)?;
        self.check_bindings(ParamOwner::Method(method), &def.name, &def.params, &args)?;
        Ok(self.push(
            BoundKind::Call {
                receiver,
                method,
                args,
            },
            def.ret,
        ))
    }

    pub fn bound_index(
        &mut self,
        receiver: NodeId,
        indexer: PropertyId,
        args: Vec<ParamAssignment>,
    ) -> BuildResult<NodeId> {
        let def = self.pool.property(indexer).clone();
        let Some(accessor) = def.getter.or(def.setter) else {
            return Err(rejected(BuildError::MissingGetter { member: def.name }));
        };
        let is_static = self.pool.method(accessor).is_static;
        self.check_receiver(Some(receiver), def.declaring, is_static, &def.name)?;
        self.check_bindings(ParamOwner::Indexer(indexer), &def.name, &def.index_params, &args)?;
        Ok(self.push(
            BoundKind::Index {
                receiver,
                indexer,
                args,
            },
            def.ty,
        ))
    }

    pub fn bound_new(&mut self, ctor: CtorId, args: Vec<ParamAssignment>) -> BuildResult<NodeId> {
        let def = self.pool.ctor(ctor).clone();
        let member = self.name(def.declaring);
        self.check_bindings(ParamOwner::Ctor(ctor), &member, &def.params, &args)?;
        Ok(self.push(BoundKind::New { ctor, args }, def.declaring))
    }

    /// Delegate invocation; bindings name parameters of the delegate's
    /// `Invoke`.
    pub fn bound_invoke(
        &mut self,
        target: NodeId,
        args: Vec<ParamAssignment>,
    ) -> BuildResult<NodeId> {
        let invoke = self.delegate_invoke(target)?;
        let def = self.pool.method(invoke).clone();
        self.check_bindings(ParamOwner::Method(invoke), "Invoke", &def.params, &args)?;
        Ok(self.push(BoundKind::Invoke { target, args }, def.ret))
    }

    fn check_bindings(
        &self,
        owner: ParamOwner,
        member: &str,
        params: &[ParamDef],
        args: &[ParamAssignment],
    ) -> BuildResult<()> {
        if args.len() > params.len() {
            return Err(rejected(BuildError::TooManyArguments {
                member: member.to_owned(),
                expected: params.len(),
                found: args.len(),
            }));
        }
        let mut bound: SmallVec<[bool; 8]> = SmallVec::from_elem(false, params.len());
        for arg in args {
            let param = params
                .get(arg.param.index())
                .filter(|_| arg.param.owner == owner);
            let Some(param) = param else {
                return Err(rejected(BuildError::ParameterNotOwned {
                    param: format!("#{}", arg.param.position),
                    member: member.to_owned(),
                }));
            };
            if std::mem::replace(&mut bound[arg.param.index()], true) {
                return Err(rejected(BuildError::DuplicateParameterBinding {
                    param: param.name.clone(),
                }));
            }
            if param.kind.is_by_ref() {
                self.check_by_ref_arg(param, arg.value, false)?;
            } else {
                self.ensure_converts(param.ty, arg.value, "argument")?;
            }
        }
        if let Some(missing) = params
            .iter()
            .zip(&bound)
            .find(|(p, b)| !**b && !p.is_optional())
        {
            return Err(rejected(BuildError::UnboundParameter {
                param: missing.0.name.clone(),
                member: member.to_owned(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
