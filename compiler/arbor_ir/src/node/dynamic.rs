//! Late-bound operations.
//!
//! A [`DynamicOp`] is the high-level node: its arguments may be passed by
//! reference and it may be the target of a compound assignment. It reduces to
//! a primitive `Dynamic` node carrying a [`CallSite`], which a backend binds
//! at run time.

use std::sync::Arc;

use arbor_types::TypeId;
use bitflags::bitflags;

use super::ops::{BinaryOp, UnaryOp};
use crate::NodeId;

bitflags! {
    /// Flags describing the operation as a whole.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct BinderFlags: u16 {
        /// Arithmetic is overflow-checked.
        const CHECKED = 1 << 0;
        /// The member was named without a receiver (`M()` rather than `x.M()`).
        const INVOKE_SIMPLE_NAME = 1 << 1;
        /// The member has a special name (operator or accessor).
        const INVOKE_SPECIAL_NAME = 1 << 2;
        /// The result is not used.
        const RESULT_DISCARDED = 1 << 3;
        /// The value feeds a compound assignment.
        const VALUE_FROM_COMPOUND_ASSIGNMENT = 1 << 4;
        /// The result is immediately indexed.
        const RESULT_INDEXED = 1 << 5;
        /// Conversion is explicit (a cast).
        const CONVERT_EXPLICIT = 1 << 6;
        /// Binary operation is `&&` or `||` over late-bound truth.
        const BINARY_OPERATION_LOGICAL = 1 << 7;
    }
}

bitflags! {
    /// Flags describing one argument.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ArgFlags: u8 {
        /// Bind using the compile-time type rather than the runtime type.
        const USE_COMPILE_TIME_TYPE = 1 << 0;
        const CONSTANT = 1 << 1;
        const NAMED_ARGUMENT = 1 << 2;
        const IS_REF = 1 << 3;
        const IS_OUT = 1 << 4;
        /// The argument denotes a type (static member access).
        const IS_STATIC_TYPE = 1 << 5;
    }
}

impl ArgFlags {
    pub fn is_by_ref(self) -> bool {
        self.intersects(ArgFlags::IS_REF | ArgFlags::IS_OUT)
    }
}

/// Which late-bound operation is performed.
///
/// Argument layout: the receiver (or invoked delegate) comes first for
/// member, index and invoke operations; setters take the value last.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum DynamicKind {
    Binary(BinaryOp),
    Unary(UnaryOp),
    /// Conversion to the node's type.
    Convert,
    Invoke,
    InvokeMember {
        name: Arc<str>,
        type_args: Vec<TypeId>,
    },
    GetMember {
        name: Arc<str>,
    },
    SetMember {
        name: Arc<str>,
    },
    GetIndex,
    SetIndex,
    /// Construct an instance of the node's type.
    InvokeConstructor,
}

impl DynamicKind {
    pub fn name(&self) -> &'static str {
        match self {
            DynamicKind::Binary(_) => "binary",
            DynamicKind::Unary(_) => "unary",
            DynamicKind::Convert => "convert",
            DynamicKind::Invoke => "invoke",
            DynamicKind::InvokeMember { .. } => "invoke-member",
            DynamicKind::GetMember { .. } => "get-member",
            DynamicKind::SetMember { .. } => "set-member",
            DynamicKind::GetIndex => "get-index",
            DynamicKind::SetIndex => "set-index",
            DynamicKind::InvokeConstructor => "new",
        }
    }

    /// Fixed argument count, when the operation has one.
    pub fn fixed_arity(&self) -> Option<usize> {
        match self {
            DynamicKind::Binary(_) | DynamicKind::SetMember { .. } => Some(2),
            DynamicKind::Unary(_) | DynamicKind::Convert | DynamicKind::GetMember { .. } => Some(1),
            _ => None,
        }
    }

    /// Minimum argument count for variadic operations.
    pub fn min_arity(&self) -> usize {
        match self {
            DynamicKind::Binary(_) | DynamicKind::SetMember { .. } | DynamicKind::GetIndex => 2,
            DynamicKind::SetIndex => 3,
            DynamicKind::InvokeConstructor => 0,
            _ => 1,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DynamicArg {
    pub value: NodeId,
    pub flags: ArgFlags,
    pub name: Option<Arc<str>>,
}

impl DynamicArg {
    pub fn new(value: NodeId) -> Self {
        Self {
            value,
            flags: ArgFlags::empty(),
            name: None,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ArgFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.flags |= ArgFlags::NAMED_ARGUMENT;
        self.name = Some(Arc::from(name));
        self
    }
}

/// High-level late-bound operation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DynamicOp {
    pub kind: DynamicKind,
    pub flags: BinderFlags,
    /// Type whose accessibility context the binder uses.
    pub context: Option<TypeId>,
    pub args: Vec<DynamicArg>,
}

impl DynamicOp {
    /// An operation with no binder flags and no accessibility context.
    pub fn new(kind: DynamicKind, args: Vec<DynamicArg>) -> Self {
        Self {
            kind,
            flags: BinderFlags::empty(),
            context: None,
            args,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: BinderFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// Per-argument binder information of a call site.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ArgInfo {
    pub flags: ArgFlags,
    pub name: Option<Arc<str>>,
}

/// Everything a run-time binder needs besides the argument values.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CallSite {
    pub kind: DynamicKind,
    pub flags: BinderFlags,
    pub context: Option<TypeId>,
    pub args: Vec<ArgInfo>,
}

impl CallSite {
    pub fn of(op: &DynamicOp) -> Self {
        Self {
            kind: op.kind.clone(),
            flags: op.flags,
            context: op.context,
            args: op
                .args
                .iter()
                .map(|a| ArgInfo {
                    flags: a.flags,
                    name: a.name.clone(),
                })
                .collect(),
        }
    }
}
