//! Reduction of arbor expression trees to the primitive node set.
//!
//! Every non-primitive node kind has a lowering rule that expresses it with
//! simpler nodes. [`reduce`] applies one rule to one node; [`reduce_all`]
//! rewrites a whole tree, top-down, until only `Prim` nodes remain.
//!
//! # Pipeline Position
//!
//! ```text
//! front-end → arbor_build → arbor_ir tree → **arbor_reduce** → primitive tree → backend
//! ```
//!
//! # Guarantees
//!
//! - Side-effecting sub-expressions used more than once are hoisted into
//!   temporaries in evaluation order. Constants, defaults, variable reads
//!   and lambdas are used in place.
//! - Property and indexer targets are read and written back through a
//!   receiver evaluated once; fields and array elements are used directly.
//! - Checked operators stay checked.
//! - Reduced nodes are built through the validating factories, so a reduced
//!   tree is exactly as well-typed as its input.
//!
//! Lowering runs top-down: a `switch` is lowered before its case bodies, so
//! the `goto case` jumps inside it can still find their targets.

mod driver;
mod lower;
mod validate;

#[cfg(test)]
mod test_interp;

pub use driver::{reduce_all, ReduceOptions};
pub use lower::reduce;
pub use validate::validate_primitive;

pub use arbor_diagnostic::{ReduceError, ReduceResult};
