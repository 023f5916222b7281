//! Calls, indexers, constructions and delegate invocations with arguments
//! bound to named parameters.
//!
//! Arguments may be supplied in any order and optional parameters may be
//! omitted. Reduction evaluates arguments in the order written and then
//! passes them in parameter order, filling omitted ones with their defaults.

use arbor_types::{CtorId, MethodId, ParamRef, PropertyId};

use crate::NodeId;

/// Binds one formal parameter to an argument.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParamAssignment {
    pub param: ParamRef,
    pub value: NodeId,
}

impl ParamAssignment {
    pub const fn new(param: ParamRef, value: NodeId) -> Self {
        Self { param, value }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoundKind {
    Call {
        receiver: Option<NodeId>,
        method: MethodId,
        args: Vec<ParamAssignment>,
    },
    Index {
        receiver: NodeId,
        indexer: PropertyId,
        args: Vec<ParamAssignment>,
    },
    New {
        ctor: CtorId,
        args: Vec<ParamAssignment>,
    },
    /// Delegate invocation; parameters belong to the delegate's `Invoke`.
    Invoke {
        target: NodeId,
        args: Vec<ParamAssignment>,
    },
}

impl BoundKind {
    pub fn args(&self) -> &[ParamAssignment] {
        match self {
            BoundKind::Call { args, .. }
            | BoundKind::Index { args, .. }
            | BoundKind::New { args, .. }
            | BoundKind::Invoke { args, .. } => args,
        }
    }

    /// Whether arguments are written in parameter order.
    ///
    /// When they are, reduction can pass them straight through; otherwise
    /// side-effecting arguments are evaluated into temporaries first.
    pub fn args_in_order(&self) -> bool {
        self.args()
            .windows(2)
            .all(|w| w[0].param.position < w[1].param.position)
    }
}
