//! Validated construction and rebuilding of arbor expression trees.
//!
//! Nodes enter an arena only through a [`TreeBuilder`] factory, which checks
//! the node's contract first. Existing trees change only through
//! [`TreeBuilder::update`] (or a [`Rewriter`] built on it), which re-runs
//! the same checks.
//!
//! # Pipeline Position
//!
//! ```text
//! front-end → **arbor_build** → arbor_ir tree → arbor_reduce → primitive tree → backend
//! ```

mod builder;
pub mod rewrite;
mod update;

pub use builder::{ForEachOptions, HandlerOptions, TreeBuilder, TryOptions, UsingOptions};
pub use rewrite::{walk_rewrite, walk_rewrite_pattern, Rewriter};

pub use arbor_diagnostic::{BuildError, BuildResult};
