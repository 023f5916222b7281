//! The primitive target set.
//!
//! Every high-level node reduces to a tree built only from these. A backend
//! that compiles or interprets this family can run any reduced tree.

use arbor_types::{ConstValue, CtorId, FieldId, MethodId, PropertyId, TypeId};

use super::dynamic::CallSite;
use super::ops::{BinaryOp, GotoKind, UnaryOp};
use crate::{LabelId, NodeId, VarId};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Prim {
    /// A literal of the node's type.
    Constant(ConstValue),
    /// The default value of the node's type (`void` for an empty statement).
    Default,
    /// Read of a variable.
    Variable(VarId),
    /// A sequence with block-scoped variables. The value is the last
    /// expression's, or nothing when the block is void.
    Block { vars: Vec<VarId>, exprs: Vec<NodeId> },
    /// Store into a variable, field, property, indexer or array element.
    /// Yields the assigned value.
    Assign { target: NodeId, value: NodeId },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        /// User-defined operator implementation.
        method: Option<MethodId>,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
        method: Option<MethodId>,
    },
    /// `test ? if_true : if_false`; a void conditional may omit `if_false`.
    Conditional {
        test: NodeId,
        if_true: NodeId,
        if_false: Option<NodeId>,
    },
    /// Infinite loop left only through `break_label` (or any other jump).
    Loop {
        body: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    },
    /// Jump target; yields `default` when reached by fall-through.
    Label {
        label: LabelId,
        default: Option<NodeId>,
    },
    Goto {
        kind: GotoKind,
        label: LabelId,
        value: Option<NodeId>,
    },
    Field {
        receiver: Option<NodeId>,
        field: FieldId,
    },
    /// Property read, or indexer read when `args` is non-empty.
    Property {
        receiver: Option<NodeId>,
        property: PropertyId,
        args: Vec<NodeId>,
    },
    ArrayIndex { array: NodeId, indices: Vec<NodeId> },
    Call {
        receiver: Option<NodeId>,
        method: MethodId,
        args: Vec<NodeId>,
    },
    /// Delegate invocation.
    Invoke { target: NodeId, args: Vec<NodeId> },
    New { ctor: CtorId, args: Vec<NodeId> },
    /// Single-dimensional array initialised from `elements`.
    NewArrayInit { elements: Vec<NodeId> },
    /// Array allocated with the given dimension lengths.
    NewArrayBounds { bounds: Vec<NodeId> },
    Lambda { params: Vec<VarId>, body: NodeId },
    Try {
        body: NodeId,
        handlers: Vec<CatchHandler>,
        finally: Option<NodeId>,
        fault: Option<NodeId>,
    },
    TypeIs { operand: NodeId, test_type: TypeId },
    /// Throw `value`, or rethrow the current exception when absent.
    Throw { value: Option<NodeId> },
    /// A late-bound call site.
    Dynamic { site: Box<CallSite>, args: Vec<NodeId> },
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CatchHandler {
    pub var: Option<VarId>,
    pub test_type: TypeId,
    pub filter: Option<NodeId>,
    pub body: NodeId,
}

impl Prim {
    /// Name used by the dump format and in diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            Prim::Constant(_) => "const",
            Prim::Default => "default",
            Prim::Variable(_) => "var",
            Prim::Block { .. } => "block",
            Prim::Assign { .. } => "assign",
            Prim::Binary { .. } => "binary",
            Prim::Unary { .. } => "unary",
            Prim::Conditional { .. } => "if",
            Prim::Loop { .. } => "loop",
            Prim::Label { .. } => "label",
            Prim::Goto { .. } => "goto",
            Prim::Field { .. } => "field",
            Prim::Property { .. } => "property",
            Prim::ArrayIndex { .. } => "index",
            Prim::Call { .. } => "call",
            Prim::Invoke { .. } => "invoke",
            Prim::New { .. } => "new",
            Prim::NewArrayInit { .. } => "new-array",
            Prim::NewArrayBounds { .. } => "new-array-bounds",
            Prim::Lambda { .. } => "lambda",
            Prim::Try { .. } => "try",
            Prim::TypeIs { .. } => "is",
            Prim::Throw { .. } => "throw",
            Prim::Dynamic { .. } => "dynamic",
        }
    }

    /// Evaluation has no side effects and reading it twice is unobservable.
    ///
    /// Lambdas qualify because creating one does not run its body.
    pub const fn is_pure(&self) -> bool {
        matches!(
            self,
            Prim::Constant(_) | Prim::Default | Prim::Variable(_) | Prim::Lambda { .. }
        )
    }
}
