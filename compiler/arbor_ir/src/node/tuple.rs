//! Tuple literals and element-wise tuple conversions.

use crate::NodeId;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TupleKind {
    /// `(a, b, ...)` of a value-tuple type.
    Literal { elements: Vec<NodeId> },
    /// Converts `operand` to the node's tuple type, one conversion lambda
    /// per element.
    Convert {
        operand: NodeId,
        conversions: Vec<NodeId>,
    },
}
