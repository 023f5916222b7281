//! Late-bound operations.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{ArgFlags, BinaryOp, DynamicKind, DynamicOp, NodeId, UnaryOp};
use arbor_types::TypeId;
use rustc_hash::FxHashSet;

use super::checks::TargetShape;
use super::{rejected, TreeBuilder};

impl TreeBuilder<'_> {
    /// A late-bound operation producing `ty`.
    pub fn dynamic(&mut self, op: DynamicOp, ty: TypeId) -> BuildResult<NodeId> {
        self.ensure_node_type(ty)?;
        let found = op.args.len();
        let what = || format!("late-bound {}", op.kind.name());
        match op.kind.fixed_arity() {
            Some(expected) if expected != found => {
                return Err(rejected(BuildError::ArgumentCount {
                    what: what(),
                    expected,
                    found,
                }));
            }
            None if found < op.kind.min_arity() => {
                return Err(rejected(BuildError::ArgumentCount {
                    what: what(),
                    expected: op.kind.min_arity(),
                    found,
                }));
            }
            _ => {}
        }

        match &op.kind {
            DynamicKind::Binary(
                binary @ (BinaryOp::AndAlso | BinaryOp::OrElse | BinaryOp::Coalesce),
            ) => {
                return Err(rejected(BuildError::InvalidDynamicOperation {
                    op: format!("operator `{}`", binary.symbol()),
                }));
            }
            DynamicKind::Unary(
                unary @ (UnaryOp::Convert
                | UnaryOp::ConvertChecked
                | UnaryOp::TypeAs
                | UnaryOp::Unbox
                | UnaryOp::ArrayLength),
            ) => {
                return Err(rejected(BuildError::InvalidDynamicOperation {
                    op: format!("unary `{}`", unary.name()),
                }));
            }
            _ => {}
        }

        let mut names = FxHashSet::default();
        for (i, arg) in op.args.iter().enumerate() {
            self.ensure_value(arg.value, "late-bound argument")?;
            if let Some(name) = &arg.name {
                if !names.insert(name.clone()) {
                    return Err(rejected(BuildError::DuplicateArgumentName {
                        name: name.to_string(),
                    }));
                }
            }
            if arg.flags.is_by_ref() {
                let read_too = !arg.flags.contains(ArgFlags::IS_OUT);
                let writable = matches!(
                    self.target_shape(arg.value, read_too, "by-reference argument"),
                    Ok(shape) if shape != TargetShape::Dynamic
                );
                if !writable {
                    let param = arg
                        .name
                        .as_deref()
                        .map_or_else(|| format!("#{i}"), str::to_owned);
                    return Err(rejected(BuildError::ByRefArgumentNotWritable { param }));
                }
            }
        }
        Ok(self.push(op, ty))
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
