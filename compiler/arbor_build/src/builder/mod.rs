//! Validated node construction.
//!
//! [`TreeBuilder`] is the only way nodes should enter a [`NodeArena`]. Each
//! factory checks its inputs against the node's contract and either
//! allocates the node or returns a [`BuildError`]; no invalid node is ever
//! allocated.
//!
//! Factories are grouped by family, one submodule each, all adding methods
//! to the same `impl TreeBuilder`:
//!
//! | Module | Families |
//! |---|---|
//! | `prim` | primitive target set |
//! | `assign` | compound and increment/decrement assignment |
//! | `loops` | while, do, for, foreach |
//! | `enumerate` | enumerator and awaiter protocol resolution |
//! | `switch` | value switch, goto case/default, switch expression, is-pattern |
//! | `pattern` | patterns |
//! | `dynamic` | late-bound operations |
//! | `flow` | using, lock, await |
//! | `interp` | interpolated strings and handler conversions |
//! | `tuple` | tuple literals and conversions |
//! | `bound` | calls with parameter-bound arguments |
//! | `checks` | checks shared across families |

mod assign;
mod bound;
mod checks;
mod dynamic;
mod enumerate;
mod flow;
mod interp;
mod loops;
mod pattern;
mod prim;
mod switch;
mod tuple;

use arbor_diagnostic::BuildError;
use arbor_ir::{LabelId, Node, NodeArena, NodeId, NodeKind, Pattern, PatternId, PatternInfo, VarId};
use arbor_types::{TypeId, TypePool};

pub use flow::UsingOptions;
pub use interp::HandlerOptions;
pub use loops::ForEachOptions;
pub use prim::TryOptions;

/// Factory surface over an arena and the type pool it is typed against.
///
/// The pool is borrowed mutably because construction may instantiate
/// library generics (arrays, delegates, tuples, nullables) on demand.
pub struct TreeBuilder<'a> {
    arena: &'a mut NodeArena,
    pool: &'a mut TypePool,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(arena: &'a mut NodeArena, pool: &'a mut TypePool) -> Self {
        Self { arena, pool }
    }

    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &*self.arena
    }

    #[inline]
    pub fn pool(&self) -> &TypePool {
        &*self.pool
    }

    /// Mutable pool access, for registering types while building.
    #[inline]
    pub fn pool_mut(&mut self) -> &mut TypePool {
        &mut *self.pool
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.arena.kind(id)
    }

    #[inline]
    pub fn ty(&self, id: NodeId) -> TypeId {
        self.arena.ty(id)
    }

    // Identities

    pub fn new_var(&mut self, name: &str, ty: TypeId) -> VarId {
        self.arena.new_var(name, ty)
    }

    /// A by-reference lambda parameter.
    pub fn new_ref_var(&mut self, name: &str, ty: TypeId) -> VarId {
        self.arena.new_ref_var(name, ty)
    }

    pub fn new_temp(&mut self, ty: TypeId) -> VarId {
        self.arena.new_temp(ty)
    }

    pub fn new_label(&mut self, name: Option<&str>, ty: TypeId) -> LabelId {
        self.arena.new_label(name, ty)
    }

    #[inline]
    pub fn pattern(&self, id: PatternId) -> &Pattern {
        self.arena.pattern(id)
    }

    #[inline]
    pub fn pattern_info(&self, id: PatternId) -> PatternInfo {
        self.arena.pattern_info(id)
    }

    #[inline]
    pub fn var_ty(&self, var: VarId) -> TypeId {
        self.arena.var(var).ty
    }

    #[inline]
    pub fn label_ty(&self, label: LabelId) -> TypeId {
        self.arena.label(label).ty
    }

    // Allocation

    /// Allocate an already validated node.
    pub(crate) fn push(&mut self, kind: impl Into<NodeKind>, ty: TypeId) -> NodeId {
        self.arena.push(Node::new(kind.into(), ty))
    }

    pub(crate) fn push_pattern(&mut self, pattern: Pattern, info: PatternInfo) -> PatternId {
        self.arena.push_pattern(pattern, info)
    }

    /// Display name of a type, for error payloads.
    pub(crate) fn name(&self, ty: TypeId) -> String {
        self.pool.name(ty).to_owned()
    }

    pub(crate) fn var_name(&self, var: VarId) -> String {
        self.arena.var(var).name.clone()
    }

    pub(crate) fn label_name(&self, label: LabelId) -> String {
        match &self.arena.label(label).name {
            Some(name) => name.clone(),
            None => format!("L{}", label.raw()),
        }
    }
}

/// Log a rejected construction and hand the error back.
pub(crate) fn rejected(err: BuildError) -> BuildError {
    tracing::trace!(code = %err.code(), error = %err, "node rejected");
    err
}
