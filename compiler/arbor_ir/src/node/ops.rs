//! Operator enums shared by primitive and high-level nodes.

use std::fmt;

/// Binary operators of the primitive set.
///
/// Checked arithmetic is a distinct opcode so that reduction can carry the
/// overflow-checking context of the source operator into its output.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    AddChecked,
    Subtract,
    SubtractChecked,
    Multiply,
    MultiplyChecked,
    Divide,
    Modulo,
    And,
    Or,
    ExclusiveOr,
    LeftShift,
    RightShift,
    AndAlso,
    OrElse,
    Coalesce,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl BinaryOp {
    pub const fn is_checked(self) -> bool {
        matches!(
            self,
            BinaryOp::AddChecked | BinaryOp::SubtractChecked | BinaryOp::MultiplyChecked
        )
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    /// `&&` and `||`.
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }

    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::AddChecked
                | BinaryOp::Subtract
                | BinaryOp::SubtractChecked
                | BinaryOp::Multiply
                | BinaryOp::MultiplyChecked
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }

    pub const fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::ExclusiveOr)
    }

    pub const fn is_shift(self) -> bool {
        matches!(self, BinaryOp::LeftShift | BinaryOp::RightShift)
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add | BinaryOp::AddChecked => "+",
            BinaryOp::Subtract | BinaryOp::SubtractChecked => "-",
            BinaryOp::Multiply | BinaryOp::MultiplyChecked => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::ExclusiveOr => "^",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::Coalesce => "??",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
        }
    }

    /// Lower-case name used by the dump format.
    pub const fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::AddChecked => "add.checked",
            BinaryOp::Subtract => "sub",
            BinaryOp::SubtractChecked => "sub.checked",
            BinaryOp::Multiply => "mul",
            BinaryOp::MultiplyChecked => "mul.checked",
            BinaryOp::Divide => "div",
            BinaryOp::Modulo => "rem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::ExclusiveOr => "xor",
            BinaryOp::LeftShift => "shl",
            BinaryOp::RightShift => "shr",
            BinaryOp::AndAlso => "andalso",
            BinaryOp::OrElse => "orelse",
            BinaryOp::Coalesce => "coalesce",
            BinaryOp::Equal => "eq",
            BinaryOp::NotEqual => "ne",
            BinaryOp::LessThan => "lt",
            BinaryOp::LessThanOrEqual => "le",
            BinaryOp::GreaterThan => "gt",
            BinaryOp::GreaterThanOrEqual => "ge",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators of the primitive set.
///
/// `Convert`, `ConvertChecked`, `TypeAs` and `Unbox` take their target type
/// from the node's type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Negate,
    NegateChecked,
    Plus,
    Not,
    OnesComplement,
    /// `x + 1` without assignment.
    Increment,
    /// `x - 1` without assignment.
    Decrement,
    Convert,
    ConvertChecked,
    TypeAs,
    Unbox,
    IsTrue,
    IsFalse,
    ArrayLength,
}

impl UnaryOp {
    pub const fn is_conversion(self) -> bool {
        matches!(
            self,
            UnaryOp::Convert | UnaryOp::ConvertChecked | UnaryOp::TypeAs | UnaryOp::Unbox
        )
    }

    pub const fn is_checked(self) -> bool {
        matches!(self, UnaryOp::NegateChecked | UnaryOp::ConvertChecked)
    }

    pub const fn name(self) -> &'static str {
        match self {
            UnaryOp::Negate => "neg",
            UnaryOp::NegateChecked => "neg.checked",
            UnaryOp::Plus => "plus",
            UnaryOp::Not => "not",
            UnaryOp::OnesComplement => "compl",
            UnaryOp::Increment => "inc",
            UnaryOp::Decrement => "dec",
            UnaryOp::Convert => "convert",
            UnaryOp::ConvertChecked => "convert.checked",
            UnaryOp::TypeAs => "as",
            UnaryOp::Unbox => "unbox",
            UnaryOp::IsTrue => "istrue",
            UnaryOp::IsFalse => "isfalse",
            UnaryOp::ArrayLength => "arraylength",
        }
    }
}

/// Operator of a compound assignment.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssignOp {
    /// Plain assignment, possibly with conversions.
    Assign,
    Add,
    AddChecked,
    Subtract,
    SubtractChecked,
    Multiply,
    MultiplyChecked,
    Divide,
    Modulo,
    And,
    Or,
    ExclusiveOr,
    LeftShift,
    RightShift,
    /// `??=`: assigns only when the target is null.
    Coalesce,
}

impl AssignOp {
    /// The binary operator applied to the current value and the operand.
    pub const fn binary(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::Assign => return None,
            AssignOp::Add => BinaryOp::Add,
            AssignOp::AddChecked => BinaryOp::AddChecked,
            AssignOp::Subtract => BinaryOp::Subtract,
            AssignOp::SubtractChecked => BinaryOp::SubtractChecked,
            AssignOp::Multiply => BinaryOp::Multiply,
            AssignOp::MultiplyChecked => BinaryOp::MultiplyChecked,
            AssignOp::Divide => BinaryOp::Divide,
            AssignOp::Modulo => BinaryOp::Modulo,
            AssignOp::And => BinaryOp::And,
            AssignOp::Or => BinaryOp::Or,
            AssignOp::ExclusiveOr => BinaryOp::ExclusiveOr,
            AssignOp::LeftShift => BinaryOp::LeftShift,
            AssignOp::RightShift => BinaryOp::RightShift,
            AssignOp::Coalesce => BinaryOp::Coalesce,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            AssignOp::Assign => "assign",
            AssignOp::Add => "add-assign",
            AssignOp::AddChecked => "add-assign.checked",
            AssignOp::Subtract => "sub-assign",
            AssignOp::SubtractChecked => "sub-assign.checked",
            AssignOp::Multiply => "mul-assign",
            AssignOp::MultiplyChecked => "mul-assign.checked",
            AssignOp::Divide => "div-assign",
            AssignOp::Modulo => "rem-assign",
            AssignOp::And => "and-assign",
            AssignOp::Or => "or-assign",
            AssignOp::ExclusiveOr => "xor-assign",
            AssignOp::LeftShift => "shl-assign",
            AssignOp::RightShift => "shr-assign",
            AssignOp::Coalesce => "coalesce-assign",
        }
    }
}

/// Increment/decrement assignment forms.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IncDecOp {
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl IncDecOp {
    /// Prefix forms yield the updated value; postfix forms the original.
    pub const fn is_prefix(self) -> bool {
        matches!(self, IncDecOp::PreIncrement | IncDecOp::PreDecrement)
    }

    pub const fn is_increment(self) -> bool {
        matches!(self, IncDecOp::PreIncrement | IncDecOp::PostIncrement)
    }

    /// The arithmetic operator applied to the operand and one.
    pub const fn binary(self, checked: bool) -> BinaryOp {
        match (self.is_increment(), checked) {
            (true, false) => BinaryOp::Add,
            (true, true) => BinaryOp::AddChecked,
            (false, false) => BinaryOp::Subtract,
            (false, true) => BinaryOp::SubtractChecked,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            IncDecOp::PreIncrement => "pre-inc",
            IncDecOp::PreDecrement => "pre-dec",
            IncDecOp::PostIncrement => "post-inc",
            IncDecOp::PostDecrement => "post-dec",
        }
    }
}

/// What a `Goto` node means at its source. All kinds lower identically.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum GotoKind {
    Goto,
    Break,
    Continue,
    Return,
}

impl GotoKind {
    pub const fn name(self) -> &'static str {
        match self {
            GotoKind::Goto => "goto",
            GotoKind::Break => "break",
            GotoKind::Continue => "continue",
            GotoKind::Return => "return",
        }
    }
}

/// Operators of relational patterns.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RelationalOp {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl RelationalOp {
    pub const fn binary(self) -> BinaryOp {
        match self {
            RelationalOp::LessThan => BinaryOp::LessThan,
            RelationalOp::LessThanOrEqual => BinaryOp::LessThanOrEqual,
            RelationalOp::GreaterThan => BinaryOp::GreaterThan,
            RelationalOp::GreaterThanOrEqual => BinaryOp::GreaterThanOrEqual,
        }
    }
}
