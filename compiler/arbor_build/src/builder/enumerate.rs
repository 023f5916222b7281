//! Enumerator and awaiter protocol resolution.
//!
//! A `foreach` collection is resolved in a fixed order: string, array, the
//! `GetEnumerator` pattern on the collection's own class chain, a generic
//! enumerable interface, and finally the non-generic enumerable interface.
//! The first match wins. The result is stored in the node as an
//! [`EnumeratorInfo`] so reduction never searches again.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{AwaitInfo, DisposeKind, EnumeratorInfo, EnumeratorShape};
use arbor_types::{MethodId, PropertyId, TypeId};

use super::{rejected, TreeBuilder};

impl TreeBuilder<'_> {
    /// How a synchronous `foreach` walks `collection`.
    pub fn resolve_enumerator(&self, collection: TypeId) -> BuildResult<EnumeratorInfo> {
        if collection == TypeId::STRING {
            return Ok(index_loop(EnumeratorShape::String, collection, TypeId::CHAR));
        }
        if let Some((element, rank)) = self.pool.array_element(collection) {
            return Ok(index_loop(EnumeratorShape::Array { rank }, collection, element));
        }

        let get_enumerator = match self.class_chain_method(collection, "GetEnumerator") {
            Some(m) => m,
            None => self.enumerable_interface_method(collection, false)?,
        };
        let enumerator = self.pool.method(get_enumerator).ret;
        let move_next = self
            .pool
            .find_method(enumerator, "MoveNext", 0)
            .filter(|&m| self.pool.method(m).ret == TypeId::BOOL)
            .ok_or_else(|| self.missing_member(enumerator, "MoveNext"))?;
        let (current, element) = self.current_of(enumerator)?;
        let disposable = self.pool.well_known().disposable;
        Ok(EnumeratorInfo {
            shape: EnumeratorShape::Pattern,
            collection_type: collection,
            get_enumerator: Some(get_enumerator),
            move_next: Some(move_next),
            current: Some(current),
            enumerator_type: enumerator,
            element_type: element,
            dispose: self.dispose_kind(enumerator, disposable),
            move_next_await: None,
        })
    }

    /// How an `await foreach` walks `collection`, plus the awaiter of the
    /// enumerator's `DisposeAsync`.
    pub fn resolve_async_enumerator(
        &self,
        collection: TypeId,
    ) -> BuildResult<(EnumeratorInfo, AwaitInfo)> {
        if collection == TypeId::STRING || self.pool.is_array(collection) {
            return Err(rejected(BuildError::NoEnumerablePattern {
                ty: self.name(collection),
            }));
        }
        let get_enumerator = match self.class_chain_method(collection, "GetAsyncEnumerator") {
            Some(m) => m,
            None => self.enumerable_interface_method(collection, true)?,
        };
        let enumerator = self.pool.method(get_enumerator).ret;

        let Some(move_next) = self.pool.find_method(enumerator, "MoveNextAsync", 0) else {
            return Err(self.missing_member(enumerator, "MoveNextAsync"));
        };
        let move_next_await = self.resolve_await(self.pool.method(move_next).ret)?;
        if move_next_await.result_type != TypeId::BOOL {
            return Err(self.missing_member(enumerator, "MoveNextAsync"));
        }
        let (current, element) = self.current_of(enumerator)?;

        let Some(dispose_async) = self.pool.find_method(enumerator, "DisposeAsync", 0) else {
            return Err(rejected(BuildError::NotDisposable {
                found: self.name(enumerator),
            }));
        };
        let dispose_await = self.resolve_await(self.pool.method(dispose_async).ret)?;
        let async_disposable = self.pool.well_known().async_disposable;
        let info = EnumeratorInfo {
            shape: EnumeratorShape::Pattern,
            collection_type: collection,
            get_enumerator: Some(get_enumerator),
            move_next: Some(move_next),
            current: Some(current),
            enumerator_type: enumerator,
            element_type: element,
            dispose: self.dispose_kind(enumerator, async_disposable),
            move_next_await: Some(move_next_await),
        };
        Ok((info, dispose_await))
    }

    /// The awaiter protocol of `ty`: `GetAwaiter()`, an awaiter implementing
    /// the completion-notification interface, a `bool IsCompleted` getter
    /// and `GetResult()`.
    pub fn resolve_await(&self, ty: TypeId) -> BuildResult<AwaitInfo> {
        let not_awaitable = |reason: String| {
            rejected(BuildError::NotAwaitable {
                ty: self.name(ty),
                reason,
            })
        };
        let pool = &*self.pool;
        let get_awaiter = pool
            .find_method(ty, "GetAwaiter", 0)
            .filter(|&m| !pool.method(m).is_static)
            .ok_or_else(|| not_awaitable("no `GetAwaiter()` method".to_owned()))?;
        let awaiter = pool.method(get_awaiter).ret;
        if !pool.implements(awaiter, pool.well_known().notify_completion) {
            return Err(not_awaitable(format!(
                "`{}` does not implement `INotifyCompletion`",
                pool.name(awaiter)
            )));
        }
        let is_completed = pool
            .find_property(awaiter, "IsCompleted")
            .filter(|&p| {
                let def = pool.property(p);
                def.ty == TypeId::BOOL && def.getter.is_some()
            })
            .ok_or_else(|| not_awaitable("awaiter has no `bool IsCompleted` getter".to_owned()))?;
        let get_result = pool
            .find_method(awaiter, "GetResult", 0)
            .ok_or_else(|| not_awaitable("awaiter has no `GetResult()` method".to_owned()))?;
        Ok(AwaitInfo {
            awaitable_type: ty,
            get_awaiter,
            awaiter_type: awaiter,
            is_completed,
            get_result,
            result_type: pool.method(get_result).ret,
        })
    }

    /// Disposal needed for a value of type `ty` against `interface`.
    pub(crate) fn dispose_kind(&self, ty: TypeId, interface: TypeId) -> DisposeKind {
        let pool = &*self.pool;
        match (pool.implements(ty, interface), pool.is_value_type(ty)) {
            (true, true) => DisposeKind::Always,
            (true, false) => DisposeKind::NullChecked,
            (false, _) if pool.is_value_type(ty) || pool.is_sealed(ty) => DisposeKind::None,
            (false, _) => DisposeKind::Probe,
        }
    }

    /// A parameterless instance method declared on `ty` or its base classes.
    /// Interfaces the type implements are not searched.
    fn class_chain_method(&self, ty: TypeId, name: &str) -> Option<MethodId> {
        let pool = &*self.pool;
        let mut current = Some(ty);
        while let Some(t) = current {
            if t.is_none() {
                break;
            }
            let def = pool.def(t);
            let found = def.members.methods.iter().copied().find(|&m| {
                let method = pool.method(m);
                method.name == name && method.params.is_empty() && !method.is_static
            });
            if found.is_some() {
                return found;
            }
            current = def.base;
        }
        None
    }

    /// `GetEnumerator` (or `GetAsyncEnumerator`) through the single generic
    /// enumerable interface `ty` implements, or the non-generic one.
    fn enumerable_interface_method(&self, ty: TypeId, is_async: bool) -> BuildResult<MethodId> {
        let pool = &*self.pool;
        let wk = pool.well_known();
        let (definition, method) = if is_async {
            (wk.async_enumerable_def, "GetAsyncEnumerator")
        } else {
            (wk.enumerable_def, "GetEnumerator")
        };
        let candidates: Vec<TypeId> = pool
            .all_interfaces(ty)
            .into_iter()
            .filter(|&i| pool.single_arg_of(i, definition).is_some())
            .collect();
        let interface = match candidates.as_slice() {
            [one] => Some(*one),
            [first, second, ..] => {
                return Err(rejected(BuildError::AmbiguousEnumerable {
                    ty: self.name(ty),
                    first: self.name(*first),
                    second: self.name(*second),
                }));
            }
            [] if !is_async && pool.implements(ty, wk.enumerable) => Some(wk.enumerable),
            [] => None,
        };
        interface
            .and_then(|i| pool.find_method(i, method, 0))
            .ok_or_else(|| rejected(BuildError::NoEnumerablePattern { ty: self.name(ty) }))
    }

    fn current_of(&self, enumerator: TypeId) -> BuildResult<(PropertyId, TypeId)> {
        let pool = &*self.pool;
        pool.find_property(enumerator, "Current")
            .filter(|&p| pool.property(p).getter.is_some())
            .map(|p| (p, pool.property(p).ty))
            .ok_or_else(|| self.missing_member(enumerator, "Current"))
    }

    fn missing_member(&self, enumerator: TypeId, member: &'static str) -> BuildError {
        rejected(BuildError::EnumeratorMissingMember {
            ty: self.name(enumerator),
            member,
        })
    }
}

fn index_loop(shape: EnumeratorShape, collection: TypeId, element: TypeId) -> EnumeratorInfo {
    EnumeratorInfo {
        shape,
        collection_type: collection,
        get_enumerator: None,
        move_next: None,
        current: None,
        enumerator_type: TypeId::INT32,
        element_type: element,
        dispose: DisposeKind::None,
        move_next_await: None,
    }
}
