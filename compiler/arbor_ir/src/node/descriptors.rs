//! Resolved protocol descriptors.
//!
//! Validation resolves how a `foreach` enumerates and how an `await`
//! awaits, once, and stores the result in the node. Reduction consumes the
//! descriptor instead of searching the type again.

use arbor_types::{MethodId, PropertyId, TypeId};

/// How a `foreach` walks its collection.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EnumeratorShape {
    /// Index loop over a string's characters.
    String,
    /// Index loop over an array; multi-dimensional arrays nest one loop per
    /// dimension.
    Array { rank: u8 },
    /// `GetEnumerator`/`MoveNext`/`Current`, found directly on the
    /// collection type or through an enumerable interface.
    Pattern,
}

/// What happens to the enumerator (or resource) when the loop exits.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DisposeKind {
    /// Sealed or value type that is not disposable: nothing to do.
    None,
    /// Value type implementing the disposable interface: always dispose.
    Always,
    /// Reference type implementing the disposable interface: dispose when
    /// not null.
    NullChecked,
    /// Unsealed reference type that is not statically disposable: probe
    /// with an `as` cast and dispose when the probe succeeds.
    Probe,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EnumeratorInfo {
    pub shape: EnumeratorShape,
    pub collection_type: TypeId,
    /// `GetEnumerator` (or `GetAsyncEnumerator`); absent for index loops.
    pub get_enumerator: Option<MethodId>,
    /// `MoveNext` (or `MoveNextAsync`).
    pub move_next: Option<MethodId>,
    pub current: Option<PropertyId>,
    pub enumerator_type: TypeId,
    /// Type of `Current` (or of the indexed element).
    pub element_type: TypeId,
    pub dispose: DisposeKind,
    /// Awaiter protocol for `MoveNextAsync` in asynchronous iteration.
    pub move_next_await: Option<AwaitInfo>,
}

/// The resolved awaiter protocol of an awaitable type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AwaitInfo {
    pub awaitable_type: TypeId,
    pub get_awaiter: MethodId,
    pub awaiter_type: TypeId,
    pub is_completed: PropertyId,
    pub get_result: MethodId,
    pub result_type: TypeId,
}
