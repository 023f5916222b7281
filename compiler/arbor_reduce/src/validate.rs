//! Check of the primitive-only invariant.
//!
//! Runs after [`reduce_all`](crate::reduce_all) when
//! `ReduceOptions::validate_output` is set (the default in debug builds),
//! and is public so backends can check trees they receive from elsewhere.

use arbor_diagnostic::{ReduceError, ReduceResult};
use arbor_ir::{walk_node, NodeArena, NodeId, NodeKind, Prim, Visitor};

/// Fails with the first non-primitive node found under `root`, in fold
/// order. A primitive assignment into a non-primitive target counts as
/// non-primitive too.
pub fn validate_primitive(arena: &NodeArena, root: NodeId) -> ReduceResult<()> {
    let mut finder = FirstNonPrimitive { found: None };
    finder.visit_node(root, arena);
    match finder.found {
        Some(kind) => Err(ReduceError::NotPrimitive { kind }),
        None => Ok(()),
    }
}

struct FirstNonPrimitive {
    found: Option<&'static str>,
}

impl Visitor for FirstNonPrimitive {
    fn visit_node(&mut self, id: NodeId, arena: &NodeArena) {
        if self.found.is_some() {
            return;
        }
        match arena.kind(id) {
            NodeKind::Prim(Prim::Assign { target, .. }) if !arena.kind(*target).is_primitive() => {
                self.found = Some(arena.kind(*target).name());
            }
            NodeKind::Prim(_) => walk_node(self, id, arena),
            kind => self.found = Some(kind.name()),
        }
    }
}
