//! Compile-time constant values.
//!
//! Constants appear as literal nodes, switch test values, `goto case` targets
//! and optional-parameter defaults. The value carries no type of its own; the
//! surrounding node or parameter supplies it, and [`TypePool::const_fits`]
//! decides whether the two agree.
//!
//! Floats are stored as their bit pattern so the enum can derive `Eq` and
//! `Hash`, which duplicate-detection in switch statements relies on.
//!
//! [`TypePool::const_fits`]: crate::TypePool::const_fits

use std::fmt;
use std::sync::Arc;

use crate::{PrimitiveKind, TypeId};

#[derive(Clone, Eq, PartialEq, Hash)]
pub enum ConstValue {
    /// The null reference (or an empty nullable value).
    Null,
    Bool(bool),
    Char(char),
    /// Any signed or unsigned integer that fits in `i128`'s narrower half.
    Int(i64),
    /// Unsigned values above `i64::MAX`.
    UInt(u64),
    /// IEEE-754 bits of a `double` (single precision is widened).
    Float(u64),
    Str(Arc<str>),
}

impl ConstValue {
    pub fn float(value: f64) -> Self {
        ConstValue::Float(value.to_bits())
    }

    pub fn str(value: &str) -> Self {
        ConstValue::Str(Arc::from(value))
    }

    /// The constant `1` in the representation used for `kind`.
    ///
    /// Used by increment/decrement lowering.
    pub fn one(kind: PrimitiveKind) -> Option<Self> {
        if kind.is_integral() {
            Some(ConstValue::Int(1))
        } else if kind.is_floating() || kind == PrimitiveKind::Decimal {
            Some(ConstValue::float(1.0))
        } else {
            None
        }
    }

    /// Integral view of the value, if it has one.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            ConstValue::Int(v) => Some(i128::from(*v)),
            ConstValue::UInt(v) => Some(i128::from(*v)),
            ConstValue::Char(c) => Some(i128::from(u32::from(*c))),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConstValue::Null)
    }

    /// The natural type of the literal when no context type is supplied.
    pub fn natural_type(&self) -> TypeId {
        match self {
            ConstValue::Null => TypeId::OBJECT,
            ConstValue::Bool(_) => TypeId::BOOL,
            ConstValue::Char(_) => TypeId::CHAR,
            ConstValue::Int(v) => {
                if i32::try_from(*v).is_ok() {
                    TypeId::INT32
                } else {
                    TypeId::INT64
                }
            }
            ConstValue::UInt(_) => TypeId::UINT64,
            ConstValue::Float(_) => TypeId::DOUBLE,
            ConstValue::Str(_) => TypeId::STRING,
        }
    }
}

impl fmt::Debug for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => write!(f, "null"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Char(c) => write!(f, "'{}'", c.escape_default()),
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::UInt(v) => write!(f, "{v}"),
            ConstValue::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            ConstValue::Str(s) => write!(f, "{:?}", &**s),
        }
    }
}
