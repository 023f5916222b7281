//! Type definitions stored in the pool.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::members::{CtorId, FieldId, MethodId, PropertyId};
use crate::{PrimitiveKind, TypeId};

bitflags! {
    /// Pre-computed type properties.
    ///
    /// Computed once when the type is registered so that conversion and
    /// validation queries never have to re-derive them.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u32 {
        /// Copied by value; never null unless wrapped in `Nullable<T>`.
        const VALUE_TYPE = 1 << 0;
        /// Held by reference; may be null.
        const REFERENCE_TYPE = 1 << 1;
        /// Cannot be derived from.
        const SEALED = 1 << 2;
        const ABSTRACT = 1 << 3;
        const INTERFACE = 1 << 4;
        /// An instantiation of `Nullable<T>`.
        const NULLABLE = 1 << 5;
        const ARRAY = 1 << 6;
        const ENUM = 1 << 7;
        const DELEGATE = 1 << 8;
        /// An open generic definition such as `IEnumerable<>`; not usable as a node type.
        const GENERIC_DEFINITION = 1 << 9;
        /// Integral, floating or decimal primitive.
        const ARITHMETIC = 1 << 10;
        /// Integral primitive.
        const INTEGRAL = 1 << 11;
        /// A `ValueTuple<...>` instantiation.
        const TUPLE = 1 << 12;
    }
}

/// Kind-specific payload of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Class,
    Struct,
    Interface,
    Enum {
        underlying: TypeId,
    },
    Array {
        element: TypeId,
        rank: u8,
    },
    Nullable {
        underlying: TypeId,
    },
    /// A delegate type; `invoke` is its `Invoke` method.
    Delegate {
        invoke: MethodId,
    },
    /// An open generic definition awaiting instantiation.
    GenericDefinition {
        arity: u8,
    },
}

/// The definition and arguments of a generic instantiation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericInst {
    pub definition: TypeId,
    pub args: SmallVec<[TypeId; 4]>,
}

/// Members declared directly on a type (inherited members are found by
/// walking `base` and `interfaces`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberTable {
    pub fields: Vec<FieldId>,
    pub properties: Vec<PropertyId>,
    pub methods: Vec<MethodId>,
    pub ctors: Vec<CtorId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDef {
    /// Display name; instantiations are rendered eagerly (`IEnumerable<int>`).
    pub name: String,
    pub kind: TypeKind,
    pub flags: TypeFlags,
    pub base: Option<TypeId>,
    pub interfaces: SmallVec<[TypeId; 2]>,
    pub generic: Option<GenericInst>,
    pub members: MemberTable,
}

impl TypeDef {
    pub(crate) fn new(name: impl Into<String>, kind: TypeKind, flags: TypeFlags) -> Self {
        Self {
            name: name.into(),
            kind,
            flags,
            base: None,
            interfaces: SmallVec::new(),
            generic: None,
            members: MemberTable::default(),
        }
    }

    pub(crate) fn primitive(kind: PrimitiveKind) -> Self {
        let mut flags = if kind.is_value_type() {
            TypeFlags::VALUE_TYPE | TypeFlags::SEALED
        } else if kind == PrimitiveKind::Void {
            TypeFlags::SEALED
        } else if kind == PrimitiveKind::String {
            TypeFlags::REFERENCE_TYPE | TypeFlags::SEALED
        } else {
            TypeFlags::REFERENCE_TYPE
        };
        if kind.is_arithmetic() {
            flags |= TypeFlags::ARITHMETIC;
        }
        if kind.is_integral() {
            flags |= TypeFlags::INTEGRAL;
        }
        let mut def = Self::new(kind.name(), TypeKind::Primitive(kind), flags);
        if kind != PrimitiveKind::Object && kind != PrimitiveKind::Void {
            def.base = Some(TypeId::OBJECT);
        }
        def
    }
}

/// Options for registering a user class.
#[derive(Clone, Debug, Default)]
pub struct ClassOptions {
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub sealed: bool,
    pub is_abstract: bool,
}
