//! Type classification and conversion queries.
//!
//! The construction layer asks these questions when validating factories;
//! reduction asks them to pick between lowering strategies (null-checked
//! disposal, boxing of switch values, nullable lifting).

use crate::def::{TypeFlags, TypeKind};
use crate::{ConstValue, PrimitiveKind, TypeId, TypePool};

impl TypePool {
    #[inline]
    pub fn is_value_type(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::VALUE_TYPE)
    }

    #[inline]
    pub fn is_reference_type(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::REFERENCE_TYPE)
    }

    #[inline]
    pub fn is_nullable(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::NULLABLE)
    }

    #[inline]
    pub fn is_sealed(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::SEALED)
    }

    #[inline]
    pub fn is_interface(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::INTERFACE)
    }

    #[inline]
    pub fn is_delegate(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::DELEGATE)
    }

    #[inline]
    pub fn is_array(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::ARRAY)
    }

    #[inline]
    pub fn is_enum(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::ENUM)
    }

    /// Whether the type can be used as the type of a node.
    #[inline]
    pub fn is_concrete(&self, ty: TypeId) -> bool {
        !ty.is_none() && !self.flags(ty).contains(TypeFlags::GENERIC_DEFINITION)
    }

    /// Whether a null value inhabits the type.
    pub fn can_be_null(&self, ty: TypeId) -> bool {
        self.is_reference_type(ty) || self.is_nullable(ty)
    }

    /// `T` of `T?`.
    pub fn nullable_underlying(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Nullable { underlying } => Some(*underlying),
            _ => None,
        }
    }

    /// Strip one level of `Nullable<T>`.
    pub fn non_nullable(&self, ty: TypeId) -> TypeId {
        self.nullable_underlying(ty).unwrap_or(ty)
    }

    /// Underlying integral type of an enum.
    pub fn enum_underlying(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Enum { underlying } => Some(*underlying),
            _ => None,
        }
    }

    pub fn is_integral(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::INTEGRAL)
    }

    pub fn is_arithmetic(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::ARITHMETIC)
    }

    /// Whether `ty` is `base` or has it somewhere on its base chain.
    pub fn derives_from(&self, ty: TypeId, base: TypeId) -> bool {
        let mut current = Some(ty);
        while let Some(t) = current {
            if t.is_none() {
                return false;
            }
            if t == base {
                return true;
            }
            current = self.def(t).base;
        }
        false
    }

    /// Whether `ty` is or implements the interface `iface`.
    pub fn implements(&self, ty: TypeId, iface: TypeId) -> bool {
        ty == iface || self.all_interfaces(ty).contains(&iface)
    }

    /// Reference conversion: identity, base class, implemented interface, or
    /// anything to `object`.
    pub fn is_reference_assignable(&self, to: TypeId, from: TypeId) -> bool {
        if to == from {
            return true;
        }
        if !self.is_reference_type(to) || !self.is_reference_type(from) {
            return false;
        }
        to == TypeId::OBJECT || self.derives_from(from, to) || self.implements(from, to)
    }

    /// Implicit conversion as the construction layer understands it:
    /// identity, reference conversions, boxing, implicit numeric widening,
    /// and lifting into `Nullable<T>`.
    pub fn is_implicitly_convertible(&self, to: TypeId, from: TypeId) -> bool {
        if to == from {
            return true;
        }
        if to.is_none() || from.is_none() || to.is_void() || from.is_void() {
            return false;
        }
        if self.is_reference_assignable(to, from) {
            return true;
        }
        // Boxing
        if self.is_value_type(from) && self.is_reference_type(to) {
            return to == TypeId::OBJECT || self.implements(from, to);
        }
        if let Some(target) = self.nullable_underlying(to) {
            let source = self.non_nullable(from);
            return self.is_implicitly_convertible(target, source);
        }
        match (from.primitive(), to.primitive()) {
            (Some(f), Some(t)) => is_numeric_widening(f, t),
            _ => false,
        }
    }

    /// Explicit conversion (a cast): every implicit conversion plus numeric
    /// narrowing, enum and `char` conversions, reference down-casts,
    /// unboxing, and unwrapping of `Nullable<T>`.
    pub fn is_explicitly_convertible(&self, to: TypeId, from: TypeId) -> bool {
        if self.is_implicitly_convertible(to, from) {
            return true;
        }
        if to.is_none() || from.is_none() || to.is_void() || from.is_void() {
            return false;
        }
        if self.is_nullable(to) || self.is_nullable(from) {
            return self.is_explicitly_convertible(self.non_nullable(to), self.non_nullable(from));
        }
        let numeric_like =
            |ty: TypeId| self.is_arithmetic(ty) || ty == TypeId::CHAR || self.is_enum(ty);
        if numeric_like(to) && numeric_like(from) {
            return true;
        }
        if self.is_reference_type(from) && self.is_reference_type(to) {
            return self.derives_from(to, from) || self.is_interface(to) || self.is_interface(from);
        }
        if self.is_reference_type(from) && self.is_value_type(to) {
            return from == TypeId::OBJECT || self.implements(to, from);
        }
        false
    }

    /// Whether a value can be the governing expression of a switch
    /// statement: integral and char types, bool, string, enums and their
    /// nullable forms.
    pub fn is_valid_switch_type(&self, ty: TypeId) -> bool {
        let ty = self.non_nullable(ty);
        ty == TypeId::STRING
            || ty == TypeId::BOOL
            || ty == TypeId::CHAR
            || self.is_integral(ty)
            || self.is_enum(ty)
    }

    /// Whether `value` is a valid constant of type `ty`.
    pub fn const_fits(&self, value: &ConstValue, ty: TypeId) -> bool {
        if value.is_null() {
            return self.can_be_null(ty);
        }
        let ty = self.non_nullable(ty);
        if let Some(underlying) = self.enum_underlying(ty) {
            return self.const_fits(value, underlying);
        }
        if ty == TypeId::OBJECT {
            return true;
        }
        let Some(kind) = ty.primitive() else {
            return false;
        };
        match value {
            ConstValue::Null => false,
            ConstValue::Bool(_) => kind == PrimitiveKind::Bool,
            ConstValue::Char(_) => kind == PrimitiveKind::Char,
            ConstValue::Str(_) => kind == PrimitiveKind::String,
            ConstValue::Float(_) => kind.is_floating() || kind == PrimitiveKind::Decimal,
            ConstValue::Int(_) | ConstValue::UInt(_) => {
                if kind.is_floating() || kind == PrimitiveKind::Decimal {
                    return true;
                }
                match (kind.int_range(), value.as_i128()) {
                    (Some((lo, hi)), Some(v)) if kind != PrimitiveKind::Char => lo <= v && v <= hi,
                    _ => false,
                }
            }
        }
    }
}

/// Implicit numeric conversions between primitives.
pub fn is_numeric_widening(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::{
        Byte, Char, Decimal, Double, Int16, Int32, Int64, SByte, Single, UInt16, UInt32, UInt64,
    };
    match from {
        SByte => matches!(to, Int16 | Int32 | Int64 | Single | Double | Decimal),
        Byte => matches!(
            to,
            Int16 | UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
        ),
        Int16 => matches!(to, Int32 | Int64 | Single | Double | Decimal),
        UInt16 | Char => matches!(
            to,
            Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
        ) || (from == Char && to == UInt16),
        Int32 => matches!(to, Int64 | Single | Double | Decimal),
        UInt32 => matches!(to, Int64 | UInt64 | Single | Double | Decimal),
        Int64 | UInt64 => matches!(to, Single | Double | Decimal),
        Single => to == Double,
        _ => false,
    }
}
