//! Resource-scoped and asynchronous control flow.

use super::descriptors::{AwaitInfo, DisposeKind};
use crate::{NodeId, VarId};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum FlowKind {
    Using(Box<UsingBlock>),
    /// `lock (object) body`.
    Lock { object: NodeId, body: NodeId },
    Await { operand: NodeId, info: AwaitInfo },
}

/// `using (var = resource) body`, or `await using` when `await_info` is set.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct UsingBlock {
    pub var: Option<VarId>,
    pub resource: NodeId,
    pub body: NodeId,
    pub dispose: DisposeKind,
    /// Awaiter protocol of `DisposeAsync`'s result.
    pub await_info: Option<AwaitInfo>,
}
