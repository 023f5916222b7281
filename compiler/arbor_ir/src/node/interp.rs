//! Interpolated strings and their conversion to handler types.

use std::sync::Arc;

use crate::NodeId;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum InterpKind {
    /// `$"..."` of type `string`.
    String { parts: Vec<InterpPart> },
    /// An interpolated string converted to a handler type.
    HandlerConversion(Box<HandlerConversion>),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum InterpPart {
    Literal(Arc<str>),
    /// `{value,alignment:format}`.
    Insert {
        value: NodeId,
        alignment: Option<i32>,
        format: Option<Arc<str>>,
    },
}

impl InterpPart {
    pub fn literal(text: &str) -> Self {
        InterpPart::Literal(Arc::from(text))
    }

    pub fn insert(value: NodeId) -> Self {
        InterpPart::Insert {
            value,
            alignment: None,
            format: None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, InterpPart::Literal(_))
    }
}

/// How a handler is built and fed.
///
/// `construction` takes `(int literalLength, int formattedCount)` and an
/// optional trailing `out bool shouldAppend`, and returns the handler.
/// `appends` holds one lambda per segment, in order: each takes the handler
/// (by reference for value-type handlers) and the segment's payload, and
/// returns `void` or `bool` (all the same).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct HandlerInfo {
    pub construction: NodeId,
    pub appends: Vec<NodeId>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct HandlerConversion {
    /// The `InterpKind::String` node being converted.
    pub string: NodeId,
    pub info: HandlerInfo,
}
