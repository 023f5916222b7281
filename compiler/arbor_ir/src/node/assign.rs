//! Compound and increment/decrement assignments.

use arbor_types::MethodId;

use super::ops::{AssignOp, IncDecOp};
use crate::NodeId;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum AssignKind {
    Compound(CompoundAssign),
    IncDec(IncDecAssign),
}

/// `target op= value`.
///
/// With `left_conversion` the current value of the target is converted
/// before the operator applies; with `final_conversion` the operator's
/// result is converted back before it is stored. Both are one-parameter
/// lambdas.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CompoundAssign {
    pub op: AssignOp,
    pub target: NodeId,
    pub value: NodeId,
    pub method: Option<MethodId>,
    pub left_conversion: Option<NodeId>,
    pub final_conversion: Option<NodeId>,
}

impl CompoundAssign {
    /// Options with no custom method and no conversions.
    pub fn new(op: AssignOp, target: NodeId, value: NodeId) -> Self {
        Self {
            op,
            target,
            value,
            method: None,
            left_conversion: None,
            final_conversion: None,
        }
    }
}

/// `++x`, `x--` and friends.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct IncDecAssign {
    pub op: IncDecOp,
    pub operand: NodeId,
    pub checked: bool,
    /// User-defined `op_Increment`/`op_Decrement`.
    pub method: Option<MethodId>,
}

impl IncDecAssign {
    /// Unchecked, with no custom method.
    pub fn new(op: IncDecOp, operand: NodeId) -> Self {
        Self {
            op,
            operand,
            checked: false,
            method: None,
        }
    }
}
