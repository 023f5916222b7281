//! The well-known library.
//!
//! Reduction targets a handful of library types and members that every
//! backend is expected to provide: the enumeration and disposal interfaces,
//! `Nullable<T>`, value tuples, value tasks and their awaiters, `Monitor`,
//! string helpers and the switch-expression exception. They are registered
//! once by [`TypePool::new`] and their handles are collected in
//! [`WellKnown`]; generic instantiations are created on demand and memoized,
//! so the table never changes shape after construction.

use smallvec::SmallVec;

use crate::def::{TypeDef, TypeFlags, TypeKind};
use crate::members::{Accessors, CtorId, MethodId, ParamDef, ParamKind, PropertyId};
use crate::pool::{DelegateKey, TypePool};
use crate::TypeId;

/// Maximum tuple arity without nesting.
pub const MAX_TUPLE_ARITY: usize = 7;

/// Handles of library types and members.
#[derive(Clone, Debug)]
pub struct WellKnown {
    pub disposable: TypeId,
    pub async_disposable: TypeId,
    pub enumerable: TypeId,
    pub enumerator: TypeId,
    pub notify_completion: TypeId,
    pub array: TypeId,
    pub monitor: TypeId,
    pub exception: TypeId,
    pub switch_expression_exception: TypeId,
    pub value_task: TypeId,
    pub value_task_awaiter: TypeId,
    pub object_array: TypeId,

    pub enumerable_def: TypeId,
    pub enumerator_def: TypeId,
    pub async_enumerable_def: TypeId,
    pub async_enumerator_def: TypeId,
    pub nullable_def: TypeId,
    pub value_task_def: TypeId,
    pub value_task_awaiter_def: TypeId,
    pub value_tuple_defs: [TypeId; MAX_TUPLE_ARITY],

    pub dispose: MethodId,
    pub dispose_async: MethodId,
    pub enumerator_move_next: MethodId,
    pub enumerator_current: PropertyId,
    pub monitor_enter: MethodId,
    pub monitor_exit: MethodId,
    pub string_concat: MethodId,
    pub string_format: MethodId,
    pub string_equals: MethodId,
    pub string_length: PropertyId,
    pub string_chars: PropertyId,
    pub array_length: PropertyId,
    pub array_get_lower_bound: MethodId,
    pub array_get_upper_bound: MethodId,
    pub switch_exception_ctor: CtorId,
}

impl WellKnown {
    /// Placeholder used while the library itself is being installed.
    pub(crate) fn unset() -> Self {
        let t = TypeId::NONE;
        let m = MethodId::new(u32::MAX);
        let p = PropertyId::new(u32::MAX);
        Self {
            disposable: t,
            async_disposable: t,
            enumerable: t,
            enumerator: t,
            notify_completion: t,
            array: t,
            monitor: t,
            exception: t,
            switch_expression_exception: t,
            value_task: t,
            value_task_awaiter: t,
            object_array: t,
            enumerable_def: t,
            enumerator_def: t,
            async_enumerable_def: t,
            async_enumerator_def: t,
            nullable_def: t,
            value_task_def: t,
            value_task_awaiter_def: t,
            value_tuple_defs: [t; MAX_TUPLE_ARITY],
            dispose: m,
            dispose_async: m,
            enumerator_move_next: m,
            enumerator_current: p,
            monitor_enter: m,
            monitor_exit: m,
            string_concat: m,
            string_format: m,
            string_equals: m,
            string_length: p,
            string_chars: p,
            array_length: p,
            array_get_lower_bound: m,
            array_get_upper_bound: m,
            switch_exception_ctor: CtorId::new(u32::MAX),
        }
    }
}

fn generic_def(pool: &mut TypePool, name: &str, arity: u8) -> TypeId {
    pool.push_type(TypeDef::new(
        name,
        TypeKind::GenericDefinition { arity },
        TypeFlags::GENERIC_DEFINITION,
    ))
}

/// Register the library and return its handles.
pub(crate) fn install(pool: &mut TypePool) -> WellKnown {
    let mut wk = WellKnown::unset();

    // object
    pool.add_method(
        TypeId::OBJECT,
        "Equals",
        vec![ParamDef::new("obj", TypeId::OBJECT)],
        TypeId::BOOL,
    );
    pool.add_method(TypeId::OBJECT, "ToString", Vec::new(), TypeId::STRING);
    pool.add_method(TypeId::OBJECT, "GetHashCode", Vec::new(), TypeId::INT32);

    // Async disposal needs the non-generic value task first.
    wk.notify_completion = pool.define_interface("INotifyCompletion", &[]);
    wk.value_task_awaiter = pool.define_struct("ValueTaskAwaiter", &[wk.notify_completion]);
    pool.add_property(
        wk.value_task_awaiter,
        "IsCompleted",
        TypeId::BOOL,
        Accessors::Get,
    );
    pool.add_method(wk.value_task_awaiter, "GetResult", Vec::new(), TypeId::VOID);
    wk.value_task = pool.define_struct("ValueTask", &[]);
    pool.add_method(wk.value_task, "GetAwaiter", Vec::new(), wk.value_task_awaiter);

    // Disposal
    wk.disposable = pool.define_interface("IDisposable", &[]);
    wk.dispose = pool.add_method(wk.disposable, "Dispose", Vec::new(), TypeId::VOID);
    wk.async_disposable = pool.define_interface("IAsyncDisposable", &[]);
    wk.dispose_async = pool.add_method(wk.async_disposable, "DisposeAsync", Vec::new(), wk.value_task);

    // Non-generic enumeration
    wk.enumerator = pool.define_interface("IEnumerator", &[]);
    wk.enumerator_move_next = pool.add_method(wk.enumerator, "MoveNext", Vec::new(), TypeId::BOOL);
    wk.enumerator_current =
        pool.add_property(wk.enumerator, "Current", TypeId::OBJECT, Accessors::Get);
    pool.add_method(wk.enumerator, "Reset", Vec::new(), TypeId::VOID);
    wk.enumerable = pool.define_interface("IEnumerable", &[]);
    pool.add_method(wk.enumerable, "GetEnumerator", Vec::new(), wk.enumerator);

    // Generic definitions
    wk.enumerable_def = generic_def(pool, "IEnumerable", 1);
    wk.enumerator_def = generic_def(pool, "IEnumerator", 1);
    wk.async_enumerable_def = generic_def(pool, "IAsyncEnumerable", 1);
    wk.async_enumerator_def = generic_def(pool, "IAsyncEnumerator", 1);
    wk.nullable_def = generic_def(pool, "Nullable", 1);
    wk.value_task_def = generic_def(pool, "ValueTask", 1);
    wk.value_task_awaiter_def = generic_def(pool, "ValueTaskAwaiter", 1);
    for (i, slot) in wk.value_tuple_defs.iter_mut().enumerate() {
        let arity = u8::try_from(i + 1).unwrap_or(u8::MAX);
        *slot = generic_def(pool, "ValueTuple", arity);
    }

    // string
    wk.string_length = pool.add_property(TypeId::STRING, "Length", TypeId::INT32, Accessors::Get);
    wk.string_chars = pool.add_indexer(
        TypeId::STRING,
        "Chars",
        vec![ParamDef::new("index", TypeId::INT32)],
        TypeId::CHAR,
        Accessors::Get,
    );
    wk.string_concat = pool.add_static_method(
        TypeId::STRING,
        "Concat",
        vec![
            ParamDef::new("arg0", TypeId::OBJECT),
            ParamDef::new("arg1", TypeId::OBJECT),
        ],
        TypeId::STRING,
    );
    wk.string_equals = pool.add_static_method(
        TypeId::STRING,
        "Equals",
        vec![
            ParamDef::new("a", TypeId::STRING),
            ParamDef::new("b", TypeId::STRING),
        ],
        TypeId::BOOL,
    );

    // Arrays
    wk.array = pool.define_class(
        "Array",
        crate::ClassOptions {
            is_abstract: true,
            interfaces: vec![wk.enumerable],
            ..crate::ClassOptions::default()
        },
    );
    wk.array_length = pool.add_property(wk.array, "Length", TypeId::INT32, Accessors::Get);
    wk.array_get_lower_bound = pool.add_method(
        wk.array,
        "GetLowerBound",
        vec![ParamDef::new("dimension", TypeId::INT32)],
        TypeId::INT32,
    );
    wk.array_get_upper_bound = pool.add_method(
        wk.array,
        "GetUpperBound",
        vec![ParamDef::new("dimension", TypeId::INT32)],
        TypeId::INT32,
    );

    // From here on `array_of` needs the handles above.
    pool.well_known = wk.clone();
    wk.object_array = pool.array_of(TypeId::OBJECT);
    wk.string_format = pool.add_static_method(
        TypeId::STRING,
        "Format",
        vec![
            ParamDef::new("format", TypeId::STRING),
            ParamDef::new("args", wk.object_array),
        ],
        TypeId::STRING,
    );

    // Monitor
    wk.monitor = pool.define_class(
        "Monitor",
        crate::ClassOptions {
            sealed: true,
            is_abstract: true,
            ..crate::ClassOptions::default()
        },
    );
    wk.monitor_enter = pool.add_static_method(
        wk.monitor,
        "Enter",
        vec![
            ParamDef::new("obj", TypeId::OBJECT),
            ParamDef::new("lockTaken", TypeId::BOOL).by_ref(),
        ],
        TypeId::VOID,
    );
    wk.monitor_exit = pool.add_static_method(
        wk.monitor,
        "Exit",
        vec![ParamDef::new("obj", TypeId::OBJECT)],
        TypeId::VOID,
    );

    // Exceptions
    wk.exception = pool.define_class("Exception", crate::ClassOptions::default());
    pool.add_ctor(wk.exception, Vec::new());
    pool.add_ctor(wk.exception, vec![ParamDef::new("message", TypeId::STRING)]);
    wk.switch_expression_exception = pool.define_class(
        "SwitchExpressionException",
        crate::ClassOptions {
            base: Some(wk.exception),
            sealed: true,
            ..crate::ClassOptions::default()
        },
    );
    wk.switch_exception_ctor = pool.add_ctor(
        wk.switch_expression_exception,
        vec![ParamDef::new("unmatchedValue", TypeId::OBJECT)],
    );

    wk
}

impl TypePool {
    /// Memoized instantiation of a library generic definition.
    fn instantiate(&mut self, definition: TypeId, args: &[TypeId]) -> TypeId {
        let key: (TypeId, SmallVec<[TypeId; 4]>) = (definition, args.iter().copied().collect());
        if let Some(&existing) = self.instances.get(&key) {
            return existing;
        }
        let wk = self.well_known.clone();
        let arg_names: Vec<&str> = args.iter().map(|&a| self.name(a)).collect();
        let name = if definition == wk.nullable_def {
            format!("{}?", arg_names.join(", "))
        } else if wk.value_tuple_defs.contains(&definition) {
            format!("({})", arg_names.join(", "))
        } else {
            format!("{}<{}>", self.name(definition), arg_names.join(", "))
        };

        let (kind, flags) = if definition == wk.nullable_def {
            (
                TypeKind::Nullable { underlying: args[0] },
                TypeFlags::VALUE_TYPE | TypeFlags::SEALED | TypeFlags::NULLABLE,
            )
        } else if definition == wk.value_task_def || definition == wk.value_task_awaiter_def {
            (TypeKind::Struct, TypeFlags::VALUE_TYPE | TypeFlags::SEALED)
        } else if wk.value_tuple_defs.contains(&definition) {
            (
                TypeKind::Struct,
                TypeFlags::VALUE_TYPE | TypeFlags::SEALED | TypeFlags::TUPLE,
            )
        } else {
            (
                TypeKind::Interface,
                TypeFlags::REFERENCE_TYPE | TypeFlags::INTERFACE | TypeFlags::ABSTRACT,
            )
        };
        let mut def = TypeDef::new(name, kind, flags);
        def.generic = Some(crate::def::GenericInst {
            definition,
            args: args.iter().copied().collect(),
        });
        if flags.contains(TypeFlags::VALUE_TYPE) {
            def.base = Some(TypeId::OBJECT);
        }
        let ty = self.push_type(def);
        self.instances.insert(key, ty);
        self.populate_instance(&wk, definition, ty, args);
        ty
    }

    fn populate_instance(&mut self, wk: &WellKnown, definition: TypeId, ty: TypeId, args: &[TypeId]) {
        let t = args[0];
        if definition == wk.enumerable_def {
            self.def_mut(ty).interfaces.push(wk.enumerable);
            let enumerator = self.enumerator_of(t);
            self.add_method(ty, "GetEnumerator", Vec::new(), enumerator);
        } else if definition == wk.enumerator_def {
            self.def_mut(ty).interfaces.push(wk.enumerator);
            self.def_mut(ty).interfaces.push(wk.disposable);
            self.add_property(ty, "Current", t, Accessors::Get);
        } else if definition == wk.async_enumerable_def {
            let enumerator = self.async_enumerator_of(t);
            self.add_method(ty, "GetAsyncEnumerator", Vec::new(), enumerator);
        } else if definition == wk.async_enumerator_def {
            self.def_mut(ty).interfaces.push(wk.async_disposable);
            let task = self.value_task_of(TypeId::BOOL);
            self.add_method(ty, "MoveNextAsync", Vec::new(), task);
            self.add_property(ty, "Current", t, Accessors::Get);
        } else if definition == wk.nullable_def {
            self.add_property(ty, "HasValue", TypeId::BOOL, Accessors::Get);
            self.add_property(ty, "Value", t, Accessors::Get);
            self.add_method(ty, "GetValueOrDefault", Vec::new(), t);
            self.add_ctor(ty, vec![ParamDef::new("value", t)]);
        } else if definition == wk.value_task_def {
            let awaiter = self.instantiate(wk.value_task_awaiter_def, &[t]);
            self.add_method(ty, "GetAwaiter", Vec::new(), awaiter);
        } else if definition == wk.value_task_awaiter_def {
            self.def_mut(ty).interfaces.push(wk.notify_completion);
            self.add_property(ty, "IsCompleted", TypeId::BOOL, Accessors::Get);
            self.add_method(ty, "GetResult", Vec::new(), t);
        } else if wk.value_tuple_defs.contains(&definition) {
            let mut params = Vec::with_capacity(args.len());
            for (i, &arg) in args.iter().enumerate() {
                let field = format!("Item{}", i + 1);
                self.add_field(ty, &field, arg);
                params.push(ParamDef::new(field.to_lowercase(), arg));
            }
            self.add_ctor(ty, params);
        }
    }

    /// `IEnumerable<T>`.
    pub fn enumerable_of(&mut self, element: TypeId) -> TypeId {
        let def = self.well_known.enumerable_def;
        self.instantiate(def, &[element])
    }

    /// `IEnumerator<T>`.
    pub fn enumerator_of(&mut self, element: TypeId) -> TypeId {
        let def = self.well_known.enumerator_def;
        self.instantiate(def, &[element])
    }

    /// `IAsyncEnumerable<T>`.
    pub fn async_enumerable_of(&mut self, element: TypeId) -> TypeId {
        let def = self.well_known.async_enumerable_def;
        self.instantiate(def, &[element])
    }

    /// `IAsyncEnumerator<T>`.
    pub fn async_enumerator_of(&mut self, element: TypeId) -> TypeId {
        let def = self.well_known.async_enumerator_def;
        self.instantiate(def, &[element])
    }

    /// `ValueTask<T>`.
    pub fn value_task_of(&mut self, result: TypeId) -> TypeId {
        let def = self.well_known.value_task_def;
        self.instantiate(def, &[result])
    }

    /// `T?` for value types. Reference types and nullable types are already
    /// nullable and are returned unchanged.
    pub fn nullable_of(&mut self, ty: TypeId) -> TypeId {
        if !self.is_value_type(ty) || self.is_nullable(ty) {
            return ty;
        }
        let def = self.well_known.nullable_def;
        self.instantiate(def, &[ty])
    }

    /// `ValueTuple<T1, ..., Tn>` for `1 <= n <= 7`.
    pub fn tuple_of(&mut self, elements: &[TypeId]) -> Option<TypeId> {
        if elements.is_empty() || elements.len() > MAX_TUPLE_ARITY {
            return None;
        }
        let def = self.well_known.value_tuple_defs[elements.len() - 1];
        Some(self.instantiate(def, elements))
    }

    /// Single-dimensional array of `element`.
    pub fn array_of(&mut self, element: TypeId) -> TypeId {
        self.array_of_rank(element, 1)
    }

    /// Array of `element` with `rank` dimensions.
    pub fn array_of_rank(&mut self, element: TypeId, rank: u8) -> TypeId {
        let rank = rank.max(1);
        if let Some(&existing) = self.arrays.get(&(element, rank)) {
            return existing;
        }
        let commas = ",".repeat(usize::from(rank) - 1);
        let name = format!("{}[{commas}]", self.name(element));
        let mut def = TypeDef::new(
            name,
            TypeKind::Array { element, rank },
            TypeFlags::REFERENCE_TYPE | TypeFlags::SEALED | TypeFlags::ARRAY,
        );
        def.base = Some(self.well_known.array);
        let ty = self.push_type(def);
        self.arrays.insert((element, rank), ty);
        if rank == 1 {
            let enumerable = self.enumerable_of(element);
            self.def_mut(ty).interfaces.push(enumerable);
        }
        ty
    }

    /// A delegate type with the given parameter shapes and return type.
    ///
    /// Lambdas are typed by these; two lambdas with the same signature share
    /// one delegate type.
    pub fn delegate_of(&mut self, params: &[(TypeId, ParamKind)], ret: TypeId) -> TypeId {
        let key: DelegateKey = (params.iter().copied().collect(), ret);
        if let Some(&existing) = self.delegates.get(&key) {
            return existing;
        }
        let rendered: Vec<String> = params
            .iter()
            .map(|&(ty, kind)| match kind {
                ParamKind::Value => self.name(ty).to_owned(),
                ParamKind::Ref => format!("ref {}", self.name(ty)),
                ParamKind::Out => format!("out {}", self.name(ty)),
                ParamKind::In => format!("in {}", self.name(ty)),
            })
            .collect();
        let name = format!("delegate({}) -> {}", rendered.join(", "), self.name(ret));
        // The Invoke method is allocated first so the kind can point at it.
        let mut def = TypeDef::new(
            name,
            TypeKind::GenericDefinition { arity: 0 },
            TypeFlags::REFERENCE_TYPE | TypeFlags::SEALED | TypeFlags::DELEGATE,
        );
        def.base = Some(TypeId::OBJECT);
        let ty = self.push_type(def);
        let invoke_params = params
            .iter()
            .enumerate()
            .map(|(i, &(pty, kind))| ParamDef {
                name: format!("arg{i}"),
                ty: pty,
                kind,
                default: None,
            })
            .collect();
        let invoke = self.add_method(ty, "Invoke", invoke_params, ret);
        self.def_mut(ty).kind = TypeKind::Delegate { invoke };
        self.delegates.insert(key, ty);
        ty
    }

    /// The `Invoke` method of a delegate type.
    pub fn delegate_invoke(&self, ty: TypeId) -> Option<MethodId> {
        match self.kind(ty) {
            TypeKind::Delegate { invoke } => Some(*invoke),
            _ => None,
        }
    }

    /// Generic definition and arguments of an instantiation.
    pub fn generic_args(&self, ty: TypeId) -> Option<(TypeId, &[TypeId])> {
        self.def(ty)
            .generic
            .as_ref()
            .map(|g| (g.definition, g.args.as_slice()))
    }

    /// The `T` of an `IEnumerable<T>` (or other single-argument) instantiation
    /// of `definition`.
    pub fn single_arg_of(&self, ty: TypeId, definition: TypeId) -> Option<TypeId> {
        match self.generic_args(ty) {
            Some((def, args)) if def == definition && args.len() == 1 => Some(args[0]),
            _ => None,
        }
    }

    /// Element type and rank of an array type.
    pub fn array_element(&self, ty: TypeId) -> Option<(TypeId, u8)> {
        match self.kind(ty) {
            TypeKind::Array { element, rank } => Some((*element, *rank)),
            _ => None,
        }
    }

    /// Element types of a value tuple.
    pub fn tuple_elements(&self, ty: TypeId) -> Option<&[TypeId]> {
        if !self.flags(ty).contains(TypeFlags::TUPLE) {
            return None;
        }
        self.generic_args(ty).map(|(_, args)| args)
    }
}
