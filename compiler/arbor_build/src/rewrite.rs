//! Rebuilding traversal.
//!
//! A [`Rewriter`] maps a tree to a new tree. The default methods descend
//! into every child and rebuild the parent through
//! [`TreeBuilder::update`], so an untouched subtree comes back as the very
//! same handle and a changed one is validated again on the way up.
//!
//! # Example
//!
//! ```text
//! struct Rename {
//!     from: VarId,
//!     to: VarId,
//! }
//!
//! impl Rewriter for Rename {
//!     type Error = BuildError;
//!
//!     fn rewrite_var(&mut self, _: &mut TreeBuilder<'_>, var: VarId) -> BuildResult<VarId> {
//!         Ok(if var == self.from { self.to } else { var })
//!     }
//! }
//! ```

use arbor_diagnostic::BuildError;
use arbor_ir::{ensure_sufficient_stack, Fold, LabelId, NodeId, PatternId, VarId};
use arbor_types::TypeId;

use crate::builder::{rejected, TreeBuilder};

pub trait Rewriter {
    /// Rewriters may fail with their own errors as long as construction
    /// errors convert into them.
    type Error: From<BuildError>;

    fn rewrite_node(
        &mut self,
        builder: &mut TreeBuilder<'_>,
        id: NodeId,
    ) -> Result<NodeId, Self::Error> {
        walk_rewrite(self, builder, id)
    }

    /// Called for every occurrence of a variable. A replacement must have
    /// the same type.
    fn rewrite_var(
        &mut self,
        _builder: &mut TreeBuilder<'_>,
        var: VarId,
    ) -> Result<VarId, Self::Error> {
        Ok(var)
    }

    /// Called for every occurrence of a label. A replacement must have the
    /// same type.
    fn rewrite_label(
        &mut self,
        _builder: &mut TreeBuilder<'_>,
        label: LabelId,
    ) -> Result<LabelId, Self::Error> {
        Ok(label)
    }

    fn rewrite_pattern(
        &mut self,
        builder: &mut TreeBuilder<'_>,
        id: PatternId,
    ) -> Result<PatternId, Self::Error> {
        walk_rewrite_pattern(self, builder, id)
    }
}

/// Rewrite every child of `id`, then update `id` with the results.
pub fn walk_rewrite<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    builder: &mut TreeBuilder<'_>,
    id: NodeId,
) -> Result<NodeId, R::Error> {
    ensure_sufficient_stack(|| {
        let kind = builder.kind(id).clone();
        let folded = kind.fold_with(&mut Adapter {
            rewriter: &mut *rewriter,
            builder: &mut *builder,
        })?;
        Ok(builder.update(id, folded)?)
    })
}

/// Rewrite every sub-pattern and identity of `id`, then rebuild it against
/// its original input type if anything changed.
pub fn walk_rewrite_pattern<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    builder: &mut TreeBuilder<'_>,
    id: PatternId,
) -> Result<PatternId, R::Error> {
    ensure_sufficient_stack(|| {
        let pattern = builder.pattern(id).clone();
        let folded = pattern.fold_with(&mut Adapter {
            rewriter: &mut *rewriter,
            builder: &mut *builder,
        })?;
        Ok(builder.update_pattern(id, folded)?)
    })
}

/// Routes child mapping to a rewriter and checks replaced identities.
struct Adapter<'r, 'a, R: ?Sized> {
    rewriter: &'r mut R,
    builder: &'r mut TreeBuilder<'a>,
}

impl<R: Rewriter + ?Sized> Fold for Adapter<'_, '_, R> {
    type Error = R::Error;

    fn fold_node(&mut self, id: NodeId) -> Result<NodeId, R::Error> {
        self.rewriter.rewrite_node(self.builder, id)
    }

    fn fold_var(&mut self, var: VarId) -> Result<VarId, R::Error> {
        let new = self.rewriter.rewrite_var(self.builder, var)?;
        let (expected, found) = (self.builder.var_ty(var), self.builder.var_ty(new));
        if expected != found {
            return Err(self.identity_changed("variable", expected, found));
        }
        Ok(new)
    }

    fn fold_label(&mut self, label: LabelId) -> Result<LabelId, R::Error> {
        let new = self.rewriter.rewrite_label(self.builder, label)?;
        let (expected, found) = (self.builder.label_ty(label), self.builder.label_ty(new));
        if expected != found {
            return Err(self.identity_changed("label", expected, found));
        }
        Ok(new)
    }

    fn fold_pattern(&mut self, id: PatternId) -> Result<PatternId, R::Error> {
        self.rewriter.rewrite_pattern(self.builder, id)
    }
}

impl<R: Rewriter + ?Sized> Adapter<'_, '_, R> {
    fn identity_changed(
        &self,
        what: &'static str,
        expected: TypeId,
        found: TypeId,
    ) -> R::Error {
        let pool = self.builder.pool();
        rejected(BuildError::IdentityTypeChanged {
            what,
            expected: pool.name(expected).to_owned(),
            found: pool.name(found).to_owned(),
        })
        .into()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
