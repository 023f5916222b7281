//! Read-only tree traversal.
//!
//! Default implementations call `walk_*` functions that traverse children
//! in fold order. Override `visit_*` methods to add behavior at specific
//! nodes and call the matching `walk_*` to keep descending.
//!
//! # Example
//!
//! ```text
//! struct CountConstants {
//!     count: usize,
//! }
//!
//! impl Visitor for CountConstants {
//!     fn visit_node(&mut self, id: NodeId, arena: &NodeArena) {
//!         if let NodeKind::Prim(Prim::Constant(_)) = arena.kind(id) {
//!             self.count += 1;
//!         }
//!         walk_node(self, id, arena);
//!     }
//! }
//! ```
//!
//! Rebuilding passes use `Rewriter` in `arbor_build` instead, which routes
//! every changed node back through validation.

use crate::fold::Child;
use crate::stack::ensure_sufficient_stack;
use crate::{LabelId, NodeArena, NodeId, PatternId, VarId};

pub trait Visitor {
    fn visit_node(&mut self, id: NodeId, arena: &NodeArena) {
        walk_node(self, id, arena);
    }

    /// Called for every occurrence of a variable, declaring or using.
    fn visit_var(&mut self, _var: VarId, _arena: &NodeArena) {}

    /// Called for every occurrence of a label, declaring or jumping.
    fn visit_label(&mut self, _label: LabelId, _arena: &NodeArena) {}

    fn visit_pattern(&mut self, id: PatternId, arena: &NodeArena) {
        walk_pattern(self, id, arena);
    }
}

fn visit_child<V: Visitor + ?Sized>(visitor: &mut V, child: Child, arena: &NodeArena) {
    match child {
        Child::Node(id) => visitor.visit_node(id, arena),
        Child::Var(var) => visitor.visit_var(var, arena),
        Child::Label(label) => visitor.visit_label(label, arena),
        Child::Pattern(pattern) => visitor.visit_pattern(pattern, arena),
    }
}

/// Visit every child of a node.
pub fn walk_node<V: Visitor + ?Sized>(visitor: &mut V, id: NodeId, arena: &NodeArena) {
    ensure_sufficient_stack(|| {
        for child in arena.kind(id).children() {
            visit_child(visitor, child, arena);
        }
    });
}

/// Visit the sub-patterns and bound variables of a pattern.
pub fn walk_pattern<V: Visitor + ?Sized>(visitor: &mut V, id: PatternId, arena: &NodeArena) {
    ensure_sufficient_stack(|| {
        for child in arena.pattern(id).children() {
            visit_child(visitor, child, arena);
        }
    });
}

#[cfg(test)]
mod tests;
