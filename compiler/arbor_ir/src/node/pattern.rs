//! Patterns for switch expressions and `is` tests.
//!
//! Patterns live in the arena's pattern table and refer to sub-patterns by
//! [`PatternId`]. Each pattern records its input type (what it is matched
//! against) and its narrowed type (what a successful match proves) in
//! [`PatternInfo`].

use arbor_types::{ConstValue, FieldId, MethodId, PropertyId, TypeId};

use super::ops::RelationalOp;
use crate::{PatternId, VarId};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Pattern {
    /// `_`: matches anything.
    Discard,
    /// Equality with a constant (`null` tests for null).
    Constant(ConstValue),
    /// `T`: matches a non-null value of type `T`.
    Type(TypeId),
    /// `T x`: type test that binds the narrowed value.
    Declaration { ty: TypeId, var: VarId },
    /// `var x`: matches anything and binds it.
    Var(VarId),
    Relational { op: RelationalOp, value: ConstValue },
    Not(PatternId),
    And(PatternId, PatternId),
    Or(PatternId, PatternId),
    /// `T(p1, p2, ...) x`: deconstruction through `deconstruct` (a method
    /// with `out` parameters) or through tuple fields when absent.
    Positional {
        ty: TypeId,
        deconstruct: Option<MethodId>,
        subpatterns: Vec<PatternId>,
        var: Option<VarId>,
    },
    /// `T { A: p1, B: p2 } x`.
    Property {
        ty: TypeId,
        subpatterns: Vec<MemberPattern>,
        var: Option<VarId>,
    },
    /// `[p1, .., pn] x`. Arrays use the built-in length and element access;
    /// other types use `length` and `indexer`.
    List {
        length: Option<PropertyId>,
        indexer: Option<PropertyId>,
        /// `Slice(int start, int length)` used by a slice with a sub-pattern.
        slice: Option<MethodId>,
        subpatterns: Vec<PatternId>,
        var: Option<VarId>,
    },
    /// `..` or `.. p` inside a list pattern.
    Slice(Option<PatternId>),
}

/// A member a property pattern reads.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MemberRef {
    Field(FieldId),
    Property(PropertyId),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MemberPattern {
    pub member: MemberRef,
    pub pattern: PatternId,
}

/// Types attached to every pattern.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PatternInfo {
    pub input: TypeId,
    pub narrowed: TypeId,
}

impl Pattern {
    pub const fn name(&self) -> &'static str {
        match self {
            Pattern::Discard => "discard",
            Pattern::Constant(_) => "constant",
            Pattern::Type(_) => "type",
            Pattern::Declaration { .. } => "declaration",
            Pattern::Var(_) => "var",
            Pattern::Relational { .. } => "relational",
            Pattern::Not(_) => "not",
            Pattern::And(..) => "and",
            Pattern::Or(..) => "or",
            Pattern::Positional { .. } => "positional",
            Pattern::Property { .. } => "property",
            Pattern::List { .. } => "list",
            Pattern::Slice(_) => "slice",
        }
    }
}
