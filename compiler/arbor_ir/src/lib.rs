//! Arbor IR - the expression-tree node model.
//!
//! This crate holds the data side of arbor trees:
//! - Handles for nodes, variables, labels and patterns
//! - The closed node union: primitives plus every higher-level family
//! - An append-only arena storing kinds and result types
//! - Child mapping (`Fold`), read-only traversal (`Visitor`) and a dump format
//!
//! Construction with validation lives in `arbor_build`; lowering to
//! primitives lives in `arbor_reduce`.
//!
//! # Design Philosophy
//!
//! - **Flatten Everything**: children are `NodeId(u32)` handles, never boxes
//! - **Immutable Nodes**: a node is never edited after allocation; changed
//!   trees share every unchanged subtree with the original
//! - **One Child Map**: every traversal goes through `NodeKind::fold_with`

mod arena;
mod dump;
mod fold;
mod ids;
pub mod node;
mod stack;
pub mod visitor;

pub use arena::{LabelDecl, NodeArena, VarDecl};
pub use dump::dump;
pub use fold::{Child, Fold};
pub use ids::{LabelId, NodeId, PatternId, VarId};
pub use node::*;
pub use stack::ensure_sufficient_stack;
pub use visitor::{walk_node, walk_pattern, Visitor};
