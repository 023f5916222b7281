//! The type pool: storage for every type and member definition.
//!
//! # Architecture
//!
//! ```text
//! TypePool
//!     ├── types       (TypeDef, indexed by TypeId)
//!     ├── fields      (FieldDef, indexed by FieldId)
//!     ├── properties  (PropertyDef, indexed by PropertyId)
//!     ├── methods     (MethodDef, indexed by MethodId)
//!     ├── ctors       (CtorDef, indexed by CtorId)
//!     └── memo tables (generic instantiations, arrays, delegates)
//! ```
//!
//! Primitives occupy the first [`TypeId::PRIMITIVE_COUNT`] slots. The
//! well-known library (enumerables, nullable, tuples, awaiters, ...) is
//! registered right after them by [`TypePool::new`].

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::def::{ClassOptions, TypeDef, TypeFlags, TypeKind};
use crate::library::WellKnown;
use crate::members::{
    Accessors, CtorDef, CtorId, FieldDef, FieldId, MethodDef, MethodId, ParamDef, ParamKind,
    ParamOwner, ParamRef, PropertyDef, PropertyId,
};
use crate::{PrimitiveKind, TypeId};

/// Key for memoized delegate types: parameter shapes plus return type.
pub(crate) type DelegateKey = (SmallVec<[(TypeId, ParamKind); 4]>, TypeId);

#[derive(Clone, Debug)]
pub struct TypePool {
    types: Vec<TypeDef>,
    fields: Vec<FieldDef>,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
    ctors: Vec<CtorDef>,
    by_name: FxHashMap<String, TypeId>,
    pub(crate) instances: FxHashMap<(TypeId, SmallVec<[TypeId; 4]>), TypeId>,
    pub(crate) arrays: FxHashMap<(TypeId, u8), TypeId>,
    pub(crate) delegates: FxHashMap<DelegateKey, TypeId>,
    pub(crate) well_known: WellKnown,
}

/// Convert a collection length into a `u32` handle index.
///
/// # Panics
/// Panics if the pool grows past `u32::MAX` entries.
pub(crate) fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("type pool overflow: too many {what}"))
}

impl TypePool {
    /// Create a pool with the primitives and the well-known library registered.
    pub fn new() -> Self {
        let mut pool = Self {
            types: Vec::with_capacity(128),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            ctors: Vec::new(),
            by_name: FxHashMap::default(),
            instances: FxHashMap::default(),
            arrays: FxHashMap::default(),
            delegates: FxHashMap::default(),
            well_known: WellKnown::unset(),
        };
        for kind in PrimitiveKind::ALL {
            pool.push_type(TypeDef::primitive(kind));
        }
        let well_known = crate::library::install(&mut pool);
        pool.well_known = well_known;
        pool
    }

    /// Handles of the library types and members reduction relies on.
    #[inline]
    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    // Storage

    pub(crate) fn push_type(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId::from_raw(to_u32(self.types.len(), "types"));
        self.by_name.entry(def.name.clone()).or_insert(id);
        self.types.push(def);
        id
    }

    pub(crate) fn def_mut(&mut self, ty: TypeId) -> &mut TypeDef {
        &mut self.types[ty.index()]
    }

    /// Get the definition of a type.
    ///
    /// # Panics
    /// Panics if `ty` was not produced by this pool.
    #[inline]
    pub fn def(&self, ty: TypeId) -> &TypeDef {
        &self.types[ty.index()]
    }

    #[inline]
    pub fn flags(&self, ty: TypeId) -> TypeFlags {
        if ty.is_none() {
            return TypeFlags::empty();
        }
        self.types[ty.index()].flags
    }

    #[inline]
    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.types[ty.index()].kind
    }

    /// Display name of a type, used in diagnostics.
    pub fn name(&self, ty: TypeId) -> &str {
        if ty.is_none() {
            return "<none>";
        }
        &self.types[ty.index()].name
    }

    /// Look up a registered type by display name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.index()]
    }

    #[inline]
    pub fn property(&self, id: PropertyId) -> &PropertyDef {
        &self.properties[id.index()]
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    #[inline]
    pub fn ctor(&self, id: CtorId) -> &CtorDef {
        &self.ctors[id.index()]
    }

    /// The parameter list declared by `owner`.
    pub fn params_of(&self, owner: ParamOwner) -> &[ParamDef] {
        match owner {
            ParamOwner::Method(m) => &self.method(m).params,
            ParamOwner::Ctor(c) => &self.ctor(c).params,
            ParamOwner::Indexer(p) => &self.property(p).index_params,
        }
    }

    /// Resolve a parameter reference, if its position exists.
    pub fn param(&self, param: ParamRef) -> Option<&ParamDef> {
        self.params_of(param.owner).get(param.index())
    }

    // User type registration

    /// Register a class.
    pub fn define_class(&mut self, name: &str, options: ClassOptions) -> TypeId {
        let mut flags = TypeFlags::REFERENCE_TYPE;
        if options.sealed {
            flags |= TypeFlags::SEALED;
        }
        if options.is_abstract {
            flags |= TypeFlags::ABSTRACT;
        }
        let mut def = TypeDef::new(name, TypeKind::Class, flags);
        def.base = Some(options.base.unwrap_or(TypeId::OBJECT));
        def.interfaces = options.interfaces.into_iter().collect();
        self.push_type(def)
    }

    /// Register a struct (always sealed).
    pub fn define_struct(&mut self, name: &str, interfaces: &[TypeId]) -> TypeId {
        let mut def = TypeDef::new(
            name,
            TypeKind::Struct,
            TypeFlags::VALUE_TYPE | TypeFlags::SEALED,
        );
        def.base = Some(TypeId::OBJECT);
        def.interfaces = interfaces.iter().copied().collect();
        self.push_type(def)
    }

    /// Register an interface.
    pub fn define_interface(&mut self, name: &str, inherits: &[TypeId]) -> TypeId {
        let mut def = TypeDef::new(
            name,
            TypeKind::Interface,
            TypeFlags::REFERENCE_TYPE | TypeFlags::INTERFACE | TypeFlags::ABSTRACT,
        );
        def.interfaces = inherits.iter().copied().collect();
        self.push_type(def)
    }

    /// Register an enum over an integral underlying type.
    pub fn define_enum(&mut self, name: &str, underlying: TypeId) -> TypeId {
        let mut def = TypeDef::new(
            name,
            TypeKind::Enum { underlying },
            TypeFlags::VALUE_TYPE | TypeFlags::SEALED | TypeFlags::ENUM,
        );
        def.base = Some(TypeId::OBJECT);
        self.push_type(def)
    }

    pub fn add_field(&mut self, owner: TypeId, name: &str, ty: TypeId) -> FieldId {
        self.push_field(owner, name, ty, false, false)
    }

    pub fn add_static_field(&mut self, owner: TypeId, name: &str, ty: TypeId) -> FieldId {
        self.push_field(owner, name, ty, true, false)
    }

    pub fn add_readonly_field(&mut self, owner: TypeId, name: &str, ty: TypeId) -> FieldId {
        self.push_field(owner, name, ty, false, true)
    }

    fn push_field(
        &mut self,
        owner: TypeId,
        name: &str,
        ty: TypeId,
        is_static: bool,
        is_readonly: bool,
    ) -> FieldId {
        let id = FieldId::new(to_u32(self.fields.len(), "fields"));
        self.fields.push(FieldDef {
            name: name.to_owned(),
            declaring: owner,
            ty,
            is_static,
            is_readonly,
        });
        self.def_mut(owner).members.fields.push(id);
        id
    }

    pub fn add_method(
        &mut self,
        owner: TypeId,
        name: &str,
        params: Vec<ParamDef>,
        ret: TypeId,
    ) -> MethodId {
        self.push_method(owner, name, params, ret, false, true)
    }

    pub fn add_static_method(
        &mut self,
        owner: TypeId,
        name: &str,
        params: Vec<ParamDef>,
        ret: TypeId,
    ) -> MethodId {
        self.push_method(owner, name, params, ret, true, true)
    }

    /// Allocate a method; `listed` controls whether name lookup can find it
    /// (accessors are reachable only through their property).
    fn push_method(
        &mut self,
        owner: TypeId,
        name: &str,
        params: Vec<ParamDef>,
        ret: TypeId,
        is_static: bool,
        listed: bool,
    ) -> MethodId {
        let id = MethodId::new(to_u32(self.methods.len(), "methods"));
        self.methods.push(MethodDef {
            name: name.to_owned(),
            declaring: owner,
            params,
            ret,
            is_static,
        });
        if listed {
            self.def_mut(owner).members.methods.push(id);
        }
        id
    }

    pub fn add_property(
        &mut self,
        owner: TypeId,
        name: &str,
        ty: TypeId,
        access: Accessors,
    ) -> PropertyId {
        self.push_property(owner, name, ty, Vec::new(), access, false)
    }

    pub fn add_static_property(
        &mut self,
        owner: TypeId,
        name: &str,
        ty: TypeId,
        access: Accessors,
    ) -> PropertyId {
        self.push_property(owner, name, ty, Vec::new(), access, true)
    }

    /// Register an indexer; `params` are the index parameters.
    pub fn add_indexer(
        &mut self,
        owner: TypeId,
        name: &str,
        params: Vec<ParamDef>,
        ty: TypeId,
        access: Accessors,
    ) -> PropertyId {
        self.push_property(owner, name, ty, params, access, false)
    }

    fn push_property(
        &mut self,
        owner: TypeId,
        name: &str,
        ty: TypeId,
        index_params: Vec<ParamDef>,
        access: Accessors,
        is_static: bool,
    ) -> PropertyId {
        let getter = access.has_get().then(|| {
            self.push_method(
                owner,
                &format!("get_{name}"),
                index_params.clone(),
                ty,
                is_static,
                false,
            )
        });
        let setter = access.has_set().then(|| {
            let mut params = index_params.clone();
            params.push(ParamDef::new("value", ty));
            self.push_method(
                owner,
                &format!("set_{name}"),
                params,
                TypeId::VOID,
                is_static,
                false,
            )
        });
        let id = PropertyId::new(to_u32(self.properties.len(), "properties"));
        self.properties.push(PropertyDef {
            name: name.to_owned(),
            declaring: owner,
            ty,
            getter,
            setter,
            index_params,
        });
        self.def_mut(owner).members.properties.push(id);
        id
    }

    pub fn add_ctor(&mut self, owner: TypeId, params: Vec<ParamDef>) -> CtorId {
        let id = CtorId::new(to_u32(self.ctors.len(), "constructors"));
        self.ctors.push(CtorDef {
            declaring: owner,
            params,
        });
        self.def_mut(owner).members.ctors.push(id);
        id
    }

    // Member lookup

    /// Types searched for members of `ty`, nearest first: the type itself,
    /// its base chain, then every implemented interface.
    pub fn lookup_chain(&self, ty: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = Some(ty);
        while let Some(t) = current {
            if t.is_none() || chain.contains(&t) {
                break;
            }
            chain.push(t);
            current = self.def(t).base;
        }
        for iface in self.all_interfaces(ty) {
            if !chain.contains(&iface) {
                chain.push(iface);
            }
        }
        chain
    }

    /// All interfaces implemented by `ty` (transitively, including bases').
    pub fn all_interfaces(&self, ty: TypeId) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = Vec::new();
        let mut stack: Vec<TypeId> = Vec::new();
        let mut current = Some(ty);
        while let Some(t) = current {
            if t.is_none() {
                break;
            }
            stack.extend(self.def(t).interfaces.iter().copied());
            current = self.def(t).base;
        }
        while let Some(iface) = stack.pop() {
            if iface == ty || out.contains(&iface) {
                continue;
            }
            out.push(iface);
            stack.extend(self.def(iface).interfaces.iter().copied());
        }
        out
    }

    /// Find a method by name and parameter count.
    pub fn find_method(&self, ty: TypeId, name: &str, arity: usize) -> Option<MethodId> {
        self.lookup_chain(ty).into_iter().find_map(|t| {
            self.def(t).members.methods.iter().copied().find(|&m| {
                let def = self.method(m);
                def.name == name && def.arity() == arity
            })
        })
    }

    /// Find a non-indexed property by name.
    pub fn find_property(&self, ty: TypeId, name: &str) -> Option<PropertyId> {
        self.lookup_chain(ty).into_iter().find_map(|t| {
            self.def(t).members.properties.iter().copied().find(|&p| {
                let def = self.property(p);
                def.name == name && !def.is_indexer()
            })
        })
    }

    /// Find the first indexer visible on `ty`.
    pub fn find_indexer(&self, ty: TypeId) -> Option<PropertyId> {
        self.lookup_chain(ty).into_iter().find_map(|t| {
            self.def(t)
                .members
                .properties
                .iter()
                .copied()
                .find(|&p| self.property(p).is_indexer())
        })
    }

    pub fn find_field(&self, ty: TypeId, name: &str) -> Option<FieldId> {
        let mut current = Some(ty);
        while let Some(t) = current {
            if t.is_none() {
                break;
            }
            let def = self.def(t);
            if let Some(f) = def
                .members
                .fields
                .iter()
                .copied()
                .find(|&f| self.field(f).name == name)
            {
                return Some(f);
            }
            current = def.base;
        }
        None
    }

    /// Find a constructor declared directly on `ty` with the given arity.
    pub fn find_ctor(&self, ty: TypeId, arity: usize) -> Option<CtorId> {
        self.def(ty)
            .members
            .ctors
            .iter()
            .copied()
            .find(|&c| self.ctor(c).params.len() == arity)
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
