//! Type handles.
//!
//! `TypeId` is the only way nodes refer to types. All type definitions live in
//! the [`TypePool`](crate::TypePool) and are referenced by their 32-bit index.
//!
//! # Layout
//!
//! - Primitive types have fixed indices (0-15), interned when the pool is created
//! - Library and user types follow in registration order
//! - Type equality is handle equality; instantiations are memoized so that
//!   `IEnumerable<int>` requested twice yields the same handle

use std::fmt;

/// A 32-bit index into the type pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// The `void` type (statements, void calls).
    pub const VOID: Self = Self(0);
    /// The `bool` type.
    pub const BOOL: Self = Self(1);
    /// The `char` type (UTF-16 code unit in the source language, a scalar here).
    pub const CHAR: Self = Self(2);
    /// Signed 8-bit integer.
    pub const SBYTE: Self = Self(3);
    /// Unsigned 8-bit integer.
    pub const BYTE: Self = Self(4);
    /// Signed 16-bit integer.
    pub const INT16: Self = Self(5);
    /// Unsigned 16-bit integer.
    pub const UINT16: Self = Self(6);
    /// Signed 32-bit integer.
    pub const INT32: Self = Self(7);
    /// Unsigned 32-bit integer.
    pub const UINT32: Self = Self(8);
    /// Signed 64-bit integer.
    pub const INT64: Self = Self(9);
    /// Unsigned 64-bit integer.
    pub const UINT64: Self = Self(10);
    /// 32-bit floating point.
    pub const SINGLE: Self = Self(11);
    /// 64-bit floating point.
    pub const DOUBLE: Self = Self(12);
    /// 128-bit decimal.
    pub const DECIMAL: Self = Self(13);
    /// The `string` reference type.
    pub const STRING: Self = Self(14);
    /// The root `object` reference type.
    pub const OBJECT: Self = Self(15);

    /// Number of pre-interned primitive types.
    pub const PRIMITIVE_COUNT: u32 = 16;

    /// Sentinel value indicating no type.
    pub const NONE: Self = Self(u32::MAX);

    /// Create a handle from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is one of the pre-interned primitive types.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn is_void(self) -> bool {
        self.0 == Self::VOID.0
    }

    /// The primitive kind for pre-interned handles.
    pub const fn primitive(self) -> Option<PrimitiveKind> {
        Some(match self.0 {
            0 => PrimitiveKind::Void,
            1 => PrimitiveKind::Bool,
            2 => PrimitiveKind::Char,
            3 => PrimitiveKind::SByte,
            4 => PrimitiveKind::Byte,
            5 => PrimitiveKind::Int16,
            6 => PrimitiveKind::UInt16,
            7 => PrimitiveKind::Int32,
            8 => PrimitiveKind::UInt32,
            9 => PrimitiveKind::Int64,
            10 => PrimitiveKind::UInt64,
            11 => PrimitiveKind::Single,
            12 => PrimitiveKind::Double,
            13 => PrimitiveKind::Decimal,
            14 => PrimitiveKind::String,
            15 => PrimitiveKind::Object,
            _ => return None,
        })
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primitive() {
            Some(kind) => write!(f, "TypeId({})", kind.name()),
            None if self.is_none() => write!(f, "TypeId::NONE"),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}

impl Default for TypeId {
    fn default() -> Self {
        Self::NONE
    }
}

/// The built-in scalar and root types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PrimitiveKind {
    Void,
    Bool,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    String,
    Object,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 16] = [
        PrimitiveKind::Void,
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::SByte,
        PrimitiveKind::Byte,
        PrimitiveKind::Int16,
        PrimitiveKind::UInt16,
        PrimitiveKind::Int32,
        PrimitiveKind::UInt32,
        PrimitiveKind::Int64,
        PrimitiveKind::UInt64,
        PrimitiveKind::Single,
        PrimitiveKind::Double,
        PrimitiveKind::Decimal,
        PrimitiveKind::String,
        PrimitiveKind::Object,
    ];

    /// The pre-interned handle for this kind.
    pub const fn type_id(self) -> TypeId {
        TypeId(self as u32)
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::SByte => "sbyte",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Int16 => "short",
            PrimitiveKind::UInt16 => "ushort",
            PrimitiveKind::Int32 => "int",
            PrimitiveKind::UInt32 => "uint",
            PrimitiveKind::Int64 => "long",
            PrimitiveKind::UInt64 => "ulong",
            PrimitiveKind::Single => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Decimal => "decimal",
            PrimitiveKind::String => "string",
            PrimitiveKind::Object => "object",
        }
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::SByte
                | PrimitiveKind::Byte
                | PrimitiveKind::Int16
                | PrimitiveKind::UInt16
                | PrimitiveKind::Int32
                | PrimitiveKind::UInt32
                | PrimitiveKind::Int64
                | PrimitiveKind::UInt64
        )
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Single | PrimitiveKind::Double)
    }

    /// Integral, floating or decimal. `char` and `bool` are not arithmetic.
    pub const fn is_arithmetic(self) -> bool {
        self.is_integral() || self.is_floating() || matches!(self, PrimitiveKind::Decimal)
    }

    pub const fn is_value_type(self) -> bool {
        !matches!(
            self,
            PrimitiveKind::Void | PrimitiveKind::String | PrimitiveKind::Object
        )
    }

    /// Inclusive value range for integral kinds (and `char`).
    pub const fn int_range(self) -> Option<(i128, i128)> {
        Some(match self {
            PrimitiveKind::SByte => (i8::MIN as i128, i8::MAX as i128),
            PrimitiveKind::Byte => (0, u8::MAX as i128),
            PrimitiveKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            PrimitiveKind::UInt16 | PrimitiveKind::Char => (0, u16::MAX as i128),
            PrimitiveKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            PrimitiveKind::UInt32 => (0, u32::MAX as i128),
            PrimitiveKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            PrimitiveKind::UInt64 => (0, u64::MAX as i128),
            _ => return None,
        })
    }
}
