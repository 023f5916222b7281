//! Node arena with variable, label and pattern side tables.
//!
//! # Index Spaces
//!
//! - `kinds`/`types`: parallel arrays indexed by [`NodeId`]
//! - `vars`: declarations indexed by [`VarId`]
//! - `labels`: declarations indexed by [`LabelId`]
//! - `patterns`/`pattern_info`: parallel arrays indexed by [`PatternId`]
//!
//! The arena only grows. A rebuilt node is a new entry; the node it replaces
//! stays valid, so any handle held elsewhere keeps pointing at the tree it
//! was taken from.

use arbor_types::TypeId;

use crate::node::{Node, NodeKind, Pattern, PatternInfo};
use crate::{LabelId, NodeId, PatternId, VarId};

/// Declaration of a variable identity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeId,
    /// A by-reference parameter (`ref`/`out`/`in`) of a lambda.
    pub by_ref: bool,
}

/// Declaration of a label identity. Jumps to a label carry a value of its
/// type; loop and switch labels are `void`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LabelDecl {
    pub name: Option<String>,
    pub ty: TypeId,
}

/// Convert a collection length into a `u32` handle index.
///
/// # Panics
/// Panics if the arena grows past `u32::MAX` entries.
pub(crate) fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("node arena overflow: too many {what}"))
}

#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    kinds: Vec<NodeKind>,
    types: Vec<TypeId>,
    vars: Vec<VarDecl>,
    labels: Vec<LabelDecl>,
    patterns: Vec<Pattern>,
    pattern_info: Vec<PatternInfo>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its handle.
    ///
    /// The arena does not validate; nodes should be created through the
    /// construction layer.
    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(to_u32(self.kinds.len(), "nodes"));
        self.kinds.push(node.kind);
        self.types.push(node.ty);
        id
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.kinds[id.index()]
    }

    #[inline]
    pub fn ty(&self, id: NodeId) -> TypeId {
        self.types[id.index()]
    }

    /// Reconstruct a full `Node` from the parallel arrays.
    pub fn get(&self, id: NodeId) -> Node {
        Node {
            kind: self.kinds[id.index()].clone(),
            ty: self.types[id.index()],
        }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // Variables

    pub fn new_var(&mut self, name: &str, ty: TypeId) -> VarId {
        self.push_var(VarDecl {
            name: name.to_owned(),
            ty,
            by_ref: false,
        })
    }

    /// A by-reference lambda parameter.
    pub fn new_ref_var(&mut self, name: &str, ty: TypeId) -> VarId {
        self.push_var(VarDecl {
            name: name.to_owned(),
            ty,
            by_ref: true,
        })
    }

    /// A compiler-introduced temporary. The name is for display only.
    pub fn new_temp(&mut self, ty: TypeId) -> VarId {
        let name = format!("$t{}", self.vars.len());
        self.push_var(VarDecl {
            name,
            ty,
            by_ref: false,
        })
    }

    pub fn push_var(&mut self, decl: VarDecl) -> VarId {
        let id = VarId::new(to_u32(self.vars.len(), "variables"));
        self.vars.push(decl);
        id
    }

    #[inline]
    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.index()]
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    // Labels

    pub fn new_label(&mut self, name: Option<&str>, ty: TypeId) -> LabelId {
        let id = LabelId::new(to_u32(self.labels.len(), "labels"));
        self.labels.push(LabelDecl {
            name: name.map(str::to_owned),
            ty,
        });
        id
    }

    #[inline]
    pub fn label(&self, id: LabelId) -> &LabelDecl {
        &self.labels[id.index()]
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    // Patterns

    pub fn push_pattern(&mut self, pattern: Pattern, info: PatternInfo) -> PatternId {
        let id = PatternId::new(to_u32(self.patterns.len(), "patterns"));
        self.patterns.push(pattern);
        self.pattern_info.push(info);
        id
    }

    #[inline]
    pub fn pattern(&self, id: PatternId) -> &Pattern {
        &self.patterns[id.index()]
    }

    #[inline]
    pub fn pattern_info(&self, id: PatternId) -> PatternInfo {
        self.pattern_info[id.index()]
    }
}
