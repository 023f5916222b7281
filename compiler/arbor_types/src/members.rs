//! Member definitions: fields, properties (including indexers), methods and
//! constructors, plus the parameter model shared by all of them.

use std::fmt;

use crate::{ConstValue, TypeId};

macro_rules! member_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

member_id!(
    /// Index of a field in the pool.
    FieldId
);
member_id!(
    /// Index of a property or indexer in the pool.
    PropertyId
);
member_id!(
    /// Index of a method (including accessors and delegate `Invoke`).
    MethodId
);
member_id!(
    /// Index of a constructor in the pool.
    CtorId
);

/// How an argument is passed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum ParamKind {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

impl ParamKind {
    /// `ref`, `out` and `in` parameters alias their argument.
    pub const fn is_by_ref(self) -> bool {
        !matches!(self, ParamKind::Value)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeId,
    pub kind: ParamKind,
    /// Default value; a parameter is optional exactly when this is set.
    pub default: Option<ConstValue>,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: ParamKind::Value,
            default: None,
        }
    }

    #[must_use]
    pub fn by_ref(mut self) -> Self {
        self.kind = ParamKind::Ref;
        self
    }

    #[must_use]
    pub fn out(mut self) -> Self {
        self.kind = ParamKind::Out;
        self
    }

    #[must_use]
    pub fn optional(mut self, default: ConstValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub declaring: TypeId,
    pub ty: TypeId,
    pub is_static: bool,
    pub is_readonly: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub declaring: TypeId,
    pub params: Vec<ParamDef>,
    pub ret: TypeId,
    pub is_static: bool,
}

impl MethodDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A property; indexers are properties with a non-empty `index_params`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub declaring: TypeId,
    pub ty: TypeId,
    pub getter: Option<MethodId>,
    pub setter: Option<MethodId>,
    pub index_params: Vec<ParamDef>,
}

impl PropertyDef {
    pub fn is_indexer(&self) -> bool {
        !self.index_params.is_empty()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CtorDef {
    pub declaring: TypeId,
    pub params: Vec<ParamDef>,
}

/// Which accessors a registered property gets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Accessors {
    Get,
    Set,
    GetSet,
}

impl Accessors {
    pub const fn has_get(self) -> bool {
        matches!(self, Accessors::Get | Accessors::GetSet)
    }

    pub const fn has_set(self) -> bool {
        matches!(self, Accessors::Set | Accessors::GetSet)
    }
}

/// The member that declares a parameter list.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParamOwner {
    Method(MethodId),
    Ctor(CtorId),
    Indexer(PropertyId),
}

/// Identity of one formal parameter: its owning member and position.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParamRef {
    pub owner: ParamOwner,
    pub position: u16,
}

impl ParamRef {
    pub const fn new(owner: ParamOwner, position: u16) -> Self {
        Self { owner, position }
    }

    pub const fn index(self) -> usize {
        self.position as usize
    }
}
