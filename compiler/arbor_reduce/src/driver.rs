//! Whole-tree reduction.

use arbor_build::{walk_rewrite, Rewriter, TreeBuilder};
use arbor_diagnostic::{ReduceError, ReduceResult};
use arbor_ir::NodeId;

use crate::lower::{needs_reduction, reduce};
use crate::validate::validate_primitive;

/// Settings for [`reduce_all`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReduceOptions {
    /// Check that the result contains primitive nodes only.
    pub validate_output: bool,
    /// Most lowering steps applied to a single node before its result has
    /// to be primitive.
    pub max_passes: u32,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            validate_output: cfg!(debug_assertions),
            max_passes: 32,
        }
    }
}

/// Reduce the tree rooted at `root` to primitives.
///
/// Each node is lowered until its root is primitive, then its children are
/// reduced the same way. Subtrees that are already primitive come back as
/// the same handles.
#[tracing::instrument(level = "debug", skip_all, fields(root = root.raw()))]
pub fn reduce_all(
    builder: &mut TreeBuilder<'_>,
    root: NodeId,
    options: &ReduceOptions,
) -> ReduceResult<NodeId> {
    let before = builder.arena().len();
    let mut reducer = ReduceAll {
        max_passes: options.max_passes,
    };
    let reduced = reducer.rewrite_node(builder, root)?;
    if options.validate_output {
        validate_primitive(builder.arena(), reduced)?;
    }
    tracing::debug!(
        allocated = builder.arena().len() - before,
        "tree reduced"
    );
    Ok(reduced)
}

struct ReduceAll {
    max_passes: u32,
}

impl Rewriter for ReduceAll {
    type Error = ReduceError;

    fn rewrite_node(&mut self, builder: &mut TreeBuilder<'_>, id: NodeId) -> ReduceResult<NodeId> {
        let mut current = id;
        let mut passes = 0;
        while needs_reduction(builder, current) {
            if passes == self.max_passes {
                return Err(ReduceError::PassLimitExceeded { passes });
            }
            current = reduce(builder, current)?;
            passes += 1;
        }
        walk_rewrite(self, builder, current)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
