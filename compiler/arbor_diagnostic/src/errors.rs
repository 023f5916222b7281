//! Construction and reduction errors.
//!
//! Every variant carries the parameters its message needs, already rendered
//! (type and member names are strings), so a caller can both match on the
//! kind and print an exact diagnostic without access to the type pool.

use std::fmt;

use thiserror::Error;

use crate::ErrorCode;

/// Coarse grouping of construction errors.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCategory {
    /// Wrong parameter count or by-ref-ness of a lambda-like child.
    Shape,
    /// Operand, result or parameter types disagree.
    TypeCompatibility,
    /// Argument-to-parameter binding is incomplete or inconsistent.
    BindingCompleteness,
    /// Something that must be unique is not.
    Uniqueness,
    /// A member lacks a required accessor or has the wrong staticness.
    Accessor,
    /// The node is misplaced or malformed as a whole.
    Structural,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Shape => "shape",
            ErrorCategory::TypeCompatibility => "type compatibility",
            ErrorCategory::BindingCompleteness => "binding completeness",
            ErrorCategory::Uniqueness => "uniqueness",
            ErrorCategory::Accessor => "accessor",
            ErrorCategory::Structural => "structural",
        };
        f.write_str(name)
    }
}

/// A node could not be constructed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BuildError {
    // Shape
    #[error("conversion needs one parameter, found {found}")]
    ConversionParameterCount { found: usize },

    #[error("{what} must take {expected} parameters, found {found}")]
    LambdaParameterCount {
        what: &'static str,
        expected: String,
        found: usize,
    },

    #[error("expected {expected} append operations for the interpolated segments, found {found}")]
    AppendCountMismatch { expected: usize, found: usize },

    #[error("{what} expects {expected} arguments, found {found}")]
    ArgumentCount {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("{what} must be a lambda")]
    NotALambda { what: &'static str },

    #[error("parameter `{name}` must be passed by reference")]
    ParameterNotByRef { name: String },

    #[error("tuples must have between 1 and 7 elements, found {found}")]
    TupleArity { found: usize },

    #[error("array of rank {expected} indexed with {found} indices")]
    RankMismatch { expected: usize, found: usize },

    #[error("pattern on `{ty}` expects {expected} sub-patterns, found {found}")]
    PatternArity {
        ty: String,
        expected: usize,
        found: usize,
    },

    // Type compatibility
    #[error("incompatible types in {context}: expected `{expected}`, found `{found}`")]
    IncompatibleTypes {
        context: &'static str,
        expected: String,
        found: String,
    },

    #[error("{context} must be `bool`, found `{found}`")]
    NotBoolean { context: &'static str, found: String },

    #[error("`{found}` cannot be the governing type of a switch")]
    InvalidSwitchType { found: String },

    #[error("test value {value} is not a constant of the governing type `{governing}`")]
    TestValueType { value: String, governing: String },

    #[error("null test value on non-nullable governing type `{governing}`")]
    NullTestValue { governing: String },

    #[error("{context} cannot be void")]
    VoidValue { context: &'static str },

    #[error("operator `{op}` is not defined for {operands}")]
    OperatorNotDefined { op: String, operands: String },

    #[error("method `{method}` does not match the operator: {reason}")]
    MethodSignatureMismatch { method: String, reason: String },

    #[error("conversion {position} type mismatch: expected `{expected}`, found `{found}`")]
    ConversionType {
        position: &'static str,
        expected: String,
        found: String,
    },

    #[error("alignment parameter must be `int`, found `{found}`")]
    AlignmentNotInt { found: String },

    #[error("format parameter must be `string`, found `{found}`")]
    FormatNotString { found: String },

    #[error("{context} must be a reference type, found `{found}`")]
    NotReferenceType { context: &'static str, found: String },

    #[error("`{found}` is not disposable")]
    NotDisposable { found: String },

    #[error("no enumerable pattern for `{ty}`")]
    NoEnumerablePattern { ty: String },

    #[error("`{ty}` implements both `{first}` and `{second}`")]
    AmbiguousEnumerable {
        ty: String,
        first: String,
        second: String,
    },

    #[error("`{ty}` is not awaitable: {reason}")]
    NotAwaitable { ty: String, reason: String },

    #[error("no conversion from `{from}` to `{to}`")]
    NotConvertible { from: String, to: String },

    #[error("`{found}` is not a delegate type")]
    NotADelegate { found: String },

    #[error("{pattern} pattern cannot apply to `{input}`")]
    PatternTypeMismatch { pattern: &'static str, input: String },

    #[error("`{ty}` cannot be the type of a node")]
    InvalidNodeType { ty: String },

    #[error("{op} is not supported by late binding")]
    InvalidDynamicOperation { op: String },

    // Binding completeness
    #[error("parameter `{param}` is bound more than once")]
    DuplicateParameterBinding { param: String },

    #[error("required parameter `{param}` of `{member}` is not bound")]
    UnboundParameter { param: String, member: String },

    #[error("`{member}` takes {expected} arguments, found {found}")]
    TooManyArguments {
        member: String,
        expected: usize,
        found: usize,
    },

    #[error("parameter `{param}` does not belong to `{member}`")]
    ParameterNotOwned { param: String, member: String },

    #[error("argument for by-reference parameter `{param}` is not writable")]
    ByRefArgumentNotWritable { param: String },

    // Uniqueness
    #[error("duplicate test value {value}")]
    DuplicateTestValue { value: String },

    #[error("variable `{name}` is declared more than once")]
    DuplicateVariable { name: String },

    #[error("label `{name}` is used more than once")]
    DuplicateLabel { name: String },

    #[error("switch has more than one default case")]
    DuplicateDefaultCase,

    #[error("argument name `{name}` is used more than once")]
    DuplicateArgumentName { name: String },

    #[error("list pattern has more than one slice")]
    MultipleSlices,

    // Accessor
    #[error("`{member}` has no getter")]
    MissingGetter { member: String },

    #[error("`{member}` has no setter")]
    MissingSetter { member: String },

    #[error("static member `{member}` accessed with a receiver")]
    StaticMemberWithReceiver { member: String },

    #[error("instance member `{member}` accessed without a receiver")]
    InstanceMemberWithoutReceiver { member: String },

    #[error("enumerator type `{ty}` has no usable `{member}`")]
    EnumeratorMissingMember { ty: String, member: &'static str },

    #[error("{context} is not writable")]
    NotWritable { context: &'static str },

    #[error("read-only field `{field}` cannot be assigned")]
    ReadOnlyField { field: String },

    #[error("`{member}` is not a member of `{ty}`")]
    MemberNotOnType { member: String, ty: String },

    // Structural
    #[error("await cannot be used in {context}")]
    AwaitForbidden { context: &'static str },

    #[error("label `{label}` has type `{expected}`, jump carries `{found}`")]
    LabelTypeMismatch {
        label: String,
        expected: String,
        found: String,
    },

    #[error("continue label `{label}` must be void")]
    ContinueLabelNotVoid { label: String },

    #[error("block of type `{ty}` needs at least one expression")]
    EmptyNonVoidBlock { ty: String },

    #[error("{what} replaced by an identity of type `{found}`, expected `{expected}`")]
    IdentityTypeChanged {
        what: &'static str,
        expected: String,
        found: String,
    },

    #[error("slice pattern outside a list pattern")]
    SliceOutsideList,
}

impl BuildError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BuildError::ConversionParameterCount { .. } => ErrorCode::E1001,
            BuildError::LambdaParameterCount { .. } => ErrorCode::E1002,
            BuildError::AppendCountMismatch { .. } => ErrorCode::E1003,
            BuildError::ArgumentCount { .. } => ErrorCode::E1004,
            BuildError::NotALambda { .. } => ErrorCode::E1005,
            BuildError::ParameterNotByRef { .. } => ErrorCode::E1006,
            BuildError::TupleArity { .. } => ErrorCode::E1007,
            BuildError::RankMismatch { .. } => ErrorCode::E1008,
            BuildError::PatternArity { .. } => ErrorCode::E1009,
            BuildError::IncompatibleTypes { .. } => ErrorCode::E1101,
            BuildError::NotBoolean { .. } => ErrorCode::E1102,
            BuildError::InvalidSwitchType { .. } => ErrorCode::E1103,
            BuildError::TestValueType { .. } => ErrorCode::E1104,
            BuildError::NullTestValue { .. } => ErrorCode::E1105,
            BuildError::VoidValue { .. } => ErrorCode::E1106,
            BuildError::OperatorNotDefined { .. } => ErrorCode::E1107,
            BuildError::MethodSignatureMismatch { .. } => ErrorCode::E1108,
            BuildError::ConversionType { .. } => ErrorCode::E1109,
            BuildError::AlignmentNotInt { .. } => ErrorCode::E1110,
            BuildError::FormatNotString { .. } => ErrorCode::E1111,
            BuildError::NotReferenceType { .. } => ErrorCode::E1112,
            BuildError::NotDisposable { .. } => ErrorCode::E1113,
            BuildError::NoEnumerablePattern { .. } => ErrorCode::E1114,
            BuildError::AmbiguousEnumerable { .. } => ErrorCode::E1115,
            BuildError::NotAwaitable { .. } => ErrorCode::E1116,
            BuildError::NotConvertible { .. } => ErrorCode::E1117,
            BuildError::NotADelegate { .. } => ErrorCode::E1118,
            BuildError::PatternTypeMismatch { .. } => ErrorCode::E1119,
            BuildError::InvalidNodeType { .. } => ErrorCode::E1120,
            BuildError::InvalidDynamicOperation { .. } => ErrorCode::E1121,
            BuildError::DuplicateParameterBinding { .. } => ErrorCode::E1201,
            BuildError::UnboundParameter { .. } => ErrorCode::E1202,
            BuildError::TooManyArguments { .. } => ErrorCode::E1203,
            BuildError::ParameterNotOwned { .. } => ErrorCode::E1204,
            BuildError::ByRefArgumentNotWritable { .. } => ErrorCode::E1205,
            BuildError::DuplicateTestValue { .. } => ErrorCode::E1301,
            BuildError::DuplicateVariable { .. } => ErrorCode::E1302,
            BuildError::DuplicateLabel { .. } => ErrorCode::E1303,
            BuildError::DuplicateDefaultCase => ErrorCode::E1304,
            BuildError::DuplicateArgumentName { .. } => ErrorCode::E1305,
            BuildError::MultipleSlices => ErrorCode::E1306,
            BuildError::MissingGetter { .. } => ErrorCode::E1401,
            BuildError::MissingSetter { .. } => ErrorCode::E1402,
            BuildError::StaticMemberWithReceiver { .. } => ErrorCode::E1403,
            BuildError::InstanceMemberWithoutReceiver { .. } => ErrorCode::E1404,
            BuildError::EnumeratorMissingMember { .. } => ErrorCode::E1405,
            BuildError::NotWritable { .. } => ErrorCode::E1406,
            BuildError::ReadOnlyField { .. } => ErrorCode::E1407,
            BuildError::MemberNotOnType { .. } => ErrorCode::E1408,
            BuildError::AwaitForbidden { .. } => ErrorCode::E1501,
            BuildError::LabelTypeMismatch { .. } => ErrorCode::E1502,
            BuildError::ContinueLabelNotVoid { .. } => ErrorCode::E1503,
            BuildError::EmptyNonVoidBlock { .. } => ErrorCode::E1504,
            BuildError::IdentityTypeChanged { .. } => ErrorCode::E1505,
            BuildError::SliceOutsideList => ErrorCode::E1506,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code().as_str().as_bytes().get(2) {
            Some(b'0') => ErrorCategory::Shape,
            Some(b'1') => ErrorCategory::TypeCompatibility,
            Some(b'2') => ErrorCategory::BindingCompleteness,
            Some(b'3') => ErrorCategory::Uniqueness,
            Some(b'4') => ErrorCategory::Accessor,
            _ => ErrorCategory::Structural,
        }
    }
}

/// A node could not be reduced.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ReduceError {
    /// Building a node of the reduced tree failed. This indicates a bug in a
    /// lowering rule rather than in the input tree.
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("`goto case {value}` can only be reduced when embedded in a switch")]
    GotoCaseOutsideSwitch { value: String },

    #[error("`goto default` can only be reduced when embedded in a switch")]
    GotoDefaultOutsideSwitch,

    #[error("`goto case {value}` has no matching case in the enclosing switch")]
    NoMatchingCase { value: String },

    #[error("reduction of {what} is not implemented")]
    NotImplemented { what: &'static str },

    #[error("reduction did not finish after {passes} passes")]
    PassLimitExceeded { passes: u32 },

    #[error("reduced tree still contains a `{kind}` node")]
    NotPrimitive { kind: &'static str },
}

impl ReduceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ReduceError::Build(err) => err.code(),
            ReduceError::GotoCaseOutsideSwitch { .. } => ErrorCode::E2001,
            ReduceError::GotoDefaultOutsideSwitch => ErrorCode::E2002,
            ReduceError::NoMatchingCase { .. } => ErrorCode::E2003,
            ReduceError::NotImplemented { .. } => ErrorCode::E2004,
            ReduceError::PassLimitExceeded { .. } => ErrorCode::E2005,
            ReduceError::NotPrimitive { .. } => ErrorCode::E2006,
        }
    }
}
