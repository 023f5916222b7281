//! `using`, `lock` and `await`.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{FlowKind, NodeId, UsingBlock, VarId};

use super::{rejected, TreeBuilder};

/// Inputs of a `using` block.
#[derive(Clone, Debug)]
pub struct UsingOptions {
    /// Variable the resource is bound to, if any.
    pub var: Option<VarId>,
    pub resource: NodeId,
    pub body: NodeId,
    /// `await using`: disposes through `DisposeAsync`.
    pub is_async: bool,
}

impl UsingOptions {
    pub fn new(var: Option<VarId>, resource: NodeId, body: NodeId) -> Self {
        Self {
            var,
            resource,
            body,
            is_async: false,
        }
    }
}

impl TreeBuilder<'_> {
    pub fn using_block(&mut self, options: UsingOptions) -> BuildResult<NodeId> {
        let UsingOptions {
            var,
            resource,
            body,
            is_async,
        } = options;
        self.ensure_value(resource, "using resource")?;
        let resource_ty = match var {
            Some(var) => {
                let var_ty = self.var_ty(var);
                self.ensure_converts(var_ty, resource, "using variable")?;
                var_ty
            }
            None => self.ty(resource),
        };

        let wk = self.pool.well_known();
        let interface = if is_async {
            wk.async_disposable
        } else {
            wk.disposable
        };
        if !self.pool.implements(resource_ty, interface) {
            return Err(rejected(BuildError::NotDisposable {
                found: self.name(resource_ty),
            }));
        }
        let await_info = if is_async {
            let Some(dispose_async) = self.pool.find_method(resource_ty, "DisposeAsync", 0) else {
                return Err(rejected(BuildError::NotDisposable {
                    found: self.name(resource_ty),
                }));
            };
            Some(self.resolve_await(self.pool.method(dispose_async).ret)?)
        } else {
            None
        };
        let dispose = self.dispose_kind(resource_ty, interface);
        let ty = self.ty(body);
        Ok(self.push(
            FlowKind::Using(Box::new(UsingBlock {
                var,
                resource,
                body,
                dispose,
                await_info,
            })),
            ty,
        ))
    }

    /// `lock (object) body`. The body may not await.
    pub fn lock(&mut self, object: NodeId, body: NodeId) -> BuildResult<NodeId> {
        let object_ty = self.ty(object);
        if !self.pool.is_reference_type(object_ty) {
            return Err(rejected(BuildError::NotReferenceType {
                context: "a lock object",
                found: self.name(object_ty),
            }));
        }
        if self.contains_await(body) {
            return Err(rejected(BuildError::AwaitForbidden {
                context: "a lock body",
            }));
        }
        let ty = self.ty(body);
        Ok(self.push(FlowKind::Lock { object, body }, ty))
    }

    /// `await operand`, typed by the awaiter's `GetResult`.
    pub fn await_(&mut self, operand: NodeId) -> BuildResult<NodeId> {
        self.ensure_value(operand, "awaited value")?;
        let info = self.resolve_await(self.ty(operand))?;
        let ty = info.result_type;
        Ok(self.push(FlowKind::Await { operand, info }, ty))
    }
}
