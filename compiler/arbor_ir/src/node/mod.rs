//! The node model.
//!
//! [`NodeKind`] is a closed union with one inner enum per family. Only the
//! [`Prim`] family is understood by backends; every other family reduces to
//! it. Children are referenced by handle, so a kind is cheap to compare and
//! `update` can detect "nothing changed" with a plain equality test.

mod assign;
mod bound;
mod descriptors;
mod dynamic;
mod flow;
mod interp;
mod loops;
mod ops;
mod pattern;
mod prim;
mod switch;
mod tuple;

use arbor_types::TypeId;

pub use assign::{AssignKind, CompoundAssign, IncDecAssign};
pub use bound::{BoundKind, ParamAssignment};
pub use descriptors::{AwaitInfo, DisposeKind, EnumeratorInfo, EnumeratorShape};
pub use dynamic::{ArgFlags, ArgInfo, BinderFlags, CallSite, DynamicArg, DynamicKind, DynamicOp};
pub use flow::{FlowKind, UsingBlock};
pub use interp::{HandlerConversion, HandlerInfo, InterpKind, InterpPart};
pub use loops::{ForEachLoop, ForLoop, LoopKind};
pub use ops::{AssignOp, BinaryOp, GotoKind, IncDecOp, RelationalOp, UnaryOp};
pub use pattern::{MemberPattern, MemberRef, Pattern, PatternInfo};
pub use prim::{CatchHandler, Prim};
pub use switch::{SwitchArm, SwitchCase, SwitchExpression, SwitchKind, SwitchStatement};
pub use tuple::TupleKind;

/// A node: its kind and its static result type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: TypeId,
}

impl Node {
    pub fn new(kind: NodeKind, ty: TypeId) -> Self {
        Self { kind, ty }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Prim(Prim),
    Assign(AssignKind),
    Loop(LoopKind),
    Switch(SwitchKind),
    Dynamic(Box<DynamicOp>),
    Flow(FlowKind),
    Interp(InterpKind),
    Tuple(TupleKind),
    Bound(BoundKind),
}

impl NodeKind {
    /// Whether this node belongs to the primitive target set.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, NodeKind::Prim(_))
    }

    pub fn as_prim(&self) -> Option<&Prim> {
        match self {
            NodeKind::Prim(p) => Some(p),
            _ => None,
        }
    }

    /// Short name used by the dump format and in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Prim(p) => p.name(),
            NodeKind::Assign(AssignKind::Compound(c)) => c.op.name(),
            NodeKind::Assign(AssignKind::IncDec(u)) => u.op.name(),
            NodeKind::Loop(LoopKind::While { .. }) => "while",
            NodeKind::Loop(LoopKind::DoWhile { .. }) => "do-while",
            NodeKind::Loop(LoopKind::For(_)) => "for",
            NodeKind::Loop(LoopKind::ForEach(f)) if f.await_info.is_some() => "await-foreach",
            NodeKind::Loop(LoopKind::ForEach(_)) => "foreach",
            NodeKind::Switch(SwitchKind::Statement(_)) => "switch",
            NodeKind::Switch(SwitchKind::GotoCase { .. }) => "goto-case",
            NodeKind::Switch(SwitchKind::GotoDefault) => "goto-default",
            NodeKind::Switch(SwitchKind::Expression(_)) => "switch-expr",
            NodeKind::Switch(SwitchKind::IsPattern { .. }) => "is-pattern",
            NodeKind::Dynamic(_) => "dynamic-op",
            NodeKind::Flow(FlowKind::Using(u)) if u.await_info.is_some() => "await-using",
            NodeKind::Flow(FlowKind::Using(_)) => "using",
            NodeKind::Flow(FlowKind::Lock { .. }) => "lock",
            NodeKind::Flow(FlowKind::Await { .. }) => "await",
            NodeKind::Interp(InterpKind::String { .. }) => "interpolated",
            NodeKind::Interp(InterpKind::HandlerConversion(_)) => "handler",
            NodeKind::Tuple(TupleKind::Literal { .. }) => "tuple",
            NodeKind::Tuple(TupleKind::Convert { .. }) => "tuple-convert",
            NodeKind::Bound(BoundKind::Call { .. }) => "bound-call",
            NodeKind::Bound(BoundKind::Index { .. }) => "bound-index",
            NodeKind::Bound(BoundKind::New { .. }) => "bound-new",
            NodeKind::Bound(BoundKind::Invoke { .. }) => "bound-invoke",
        }
    }
}

macro_rules! family_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for NodeKind {
                fn from(kind: $ty) -> Self {
                    NodeKind::$variant(kind)
                }
            }
        )*
    };
}

family_from! {
    Prim => Prim,
    AssignKind => Assign,
    LoopKind => Loop,
    SwitchKind => Switch,
    FlowKind => Flow,
    InterpKind => Interp,
    TupleKind => Tuple,
    BoundKind => Bound,
}

impl From<DynamicOp> for NodeKind {
    fn from(op: DynamicOp) -> Self {
        NodeKind::Dynamic(Box::new(op))
    }
}
