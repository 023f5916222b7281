//! Type model for Arbor expression trees.
//!
//! Every node in a tree carries a [`TypeId`]. This crate owns the pool those
//! handles point into, the member tables (fields, properties, indexers,
//! methods, constructors) that nodes reference, and the conversion queries
//! the construction layer validates against.
//!
//! The pool comes pre-populated with the primitives and a small well-known
//! library (see [`WellKnown`]) that reduction lowers onto.

mod conversions;
mod def;
mod library;
mod members;
mod pool;
mod type_id;
mod value;

pub use conversions::is_numeric_widening;
pub use def::{ClassOptions, GenericInst, MemberTable, TypeDef, TypeFlags, TypeKind};
pub use library::{WellKnown, MAX_TUPLE_ARITY};
pub use members::{
    Accessors, CtorDef, CtorId, FieldDef, FieldId, MethodDef, MethodId, ParamDef, ParamKind,
    ParamOwner, ParamRef, PropertyDef, PropertyId,
};
pub use pool::TypePool;
pub use type_id::{PrimitiveKind, TypeId};
pub use value::ConstValue;
