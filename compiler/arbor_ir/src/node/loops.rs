//! Structured loops. Each owns optional break and continue labels that
//! `Goto` nodes in its body may target.

use super::descriptors::{AwaitInfo, EnumeratorInfo};
use crate::{LabelId, NodeId, VarId};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum LoopKind {
    While {
        test: NodeId,
        body: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    },
    DoWhile {
        body: NodeId,
        test: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    },
    For(Box<ForLoop>),
    ForEach(Box<ForEachLoop>),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ForLoop {
    /// Variables scoped to the whole loop.
    pub vars: Vec<VarId>,
    pub initializers: Vec<NodeId>,
    /// Absent test loops until a jump leaves.
    pub test: Option<NodeId>,
    pub iterators: Vec<NodeId>,
    pub body: NodeId,
    pub break_label: Option<LabelId>,
    pub continue_label: Option<LabelId>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ForEachLoop {
    /// Iteration variables, bound afresh on each iteration. More than one
    /// requires `deconstruction`.
    pub vars: Vec<VarId>,
    pub collection: NodeId,
    /// Element-to-variable conversion lambda.
    pub conversion: Option<NodeId>,
    /// Lambda assigning the variables from one element.
    pub deconstruction: Option<NodeId>,
    pub body: NodeId,
    pub break_label: Option<LabelId>,
    pub continue_label: Option<LabelId>,
    pub info: EnumeratorInfo,
    /// Present for `await foreach`; awaits `DisposeAsync`.
    pub await_info: Option<AwaitInfo>,
}

impl LoopKind {
    pub fn labels(&self) -> (Option<LabelId>, Option<LabelId>) {
        match self {
            LoopKind::While {
                break_label,
                continue_label,
                ..
            }
            | LoopKind::DoWhile {
                break_label,
                continue_label,
                ..
            } => (*break_label, *continue_label),
            LoopKind::For(f) => (f.break_label, f.continue_label),
            LoopKind::ForEach(f) => (f.break_label, f.continue_label),
        }
    }
}
