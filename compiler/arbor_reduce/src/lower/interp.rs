//! Interpolated strings.
//!
//! A string with no inserts folds to a constant. Otherwise it becomes a
//! `String.Format` call over a composite format string and an `object[]`
//! of the inserted values. A handler conversion constructs the handler and
//! then feeds it every segment through the append lambdas.

use std::fmt::Write as _;

use arbor_diagnostic::{ReduceError, ReduceResult};
use arbor_ir::{BinaryOp, HandlerConversion, InterpKind, InterpPart, NodeId, NodeKind};
use arbor_types::TypeId;

use super::Lowerer;

impl Lowerer<'_, '_> {
    pub(crate) fn interpolated(&mut self, parts: &[InterpPart]) -> ReduceResult<NodeId> {
        let mut format = String::new();
        let mut values = Vec::new();
        for part in parts {
            match part {
                InterpPart::Literal(text) => escape_into(&mut format, text),
                InterpPart::Insert {
                    value,
                    alignment,
                    format: spec,
                } => {
                    let _ = write!(format, "{{{}", values.len());
                    if let Some(alignment) = alignment {
                        let _ = write!(format, ",{alignment}");
                    }
                    if let Some(spec) = spec {
                        let _ = write!(format, ":{spec}");
                    }
                    format.push('}');
                    values.push(*value);
                }
            }
        }

        if values.is_empty() {
            let text: String = parts
                .iter()
                .filter_map(|p| match p {
                    InterpPart::Literal(text) => Some(&**text),
                    InterpPart::Insert { .. } => None,
                })
                .collect();
            return Ok(self.b.string(&text));
        }

        let boxed = values
            .into_iter()
            .map(|v| self.boxed(v))
            .collect::<ReduceResult<Vec<_>>>()?;
        let args = self.b.new_array_init(TypeId::OBJECT, boxed)?;
        let format = self.b.string(&format);
        let string_format = self.b.pool().well_known().string_format;
        Ok(self.b.call(None, string_format, vec![format, args])?)
    }

    /// `value` as an `object`, boxing value types explicitly.
    fn boxed(&mut self, value: NodeId) -> ReduceResult<NodeId> {
        if self.b.pool().is_value_type(self.b.ty(value)) {
            Ok(self.b.convert(value, TypeId::OBJECT)?)
        } else {
            Ok(value)
        }
    }

    /// ```text
    /// { h = construction(literalLength, formattedCount[, out flag]);
    ///   appends...; h }
    /// ```
    ///
    /// `bool` appends stop at the first `false`; with a should-append flag
    /// nothing is appended unless the construction set it.
    pub(crate) fn handler(&mut self, node: &HandlerConversion, ty: TypeId) -> ReduceResult<NodeId> {
        let NodeKind::Interp(InterpKind::String { parts }) = self.b.kind(node.string).clone()
        else {
            return Err(ReduceError::NotImplemented {
                what: "handler conversion of a non-interpolated string",
            });
        };
        let literal_length: usize = parts
            .iter()
            .map(|p| match p {
                InterpPart::Literal(text) => text.encode_utf16().count(),
                InterpPart::Insert { .. } => 0,
            })
            .sum();
        let formatted_count = parts.iter().filter(|p| !p.is_literal()).count();

        let handler = self.b.new_temp(ty);
        let mut vars = vec![handler];
        let mut ctor_args = vec![
            self.b.int(saturate(literal_length)),
            self.b.int(saturate(formatted_count)),
        ];
        let construction_arity = self.lambda_arity(node.info.construction);
        let flag = (construction_arity == 3).then(|| self.b.new_temp(TypeId::BOOL));
        if let Some(flag) = flag {
            vars.push(flag);
            ctor_args.push(self.b.variable(flag));
        }
        let constructed = self.b.invoke(node.info.construction, ctor_args)?;
        let mut exprs = vec![self.store(handler, constructed)?];

        let mut calls = Vec::with_capacity(parts.len());
        for (part, &append) in parts.iter().zip(&node.info.appends) {
            let mut args = vec![self.b.variable(handler)];
            match part {
                InterpPart::Literal(text) => args.push(self.b.string(text)),
                InterpPart::Insert {
                    value,
                    alignment,
                    format,
                } => {
                    args.push(*value);
                    if let Some(alignment) = alignment {
                        args.push(self.b.int(*alignment));
                    }
                    if let Some(format) = format {
                        args.push(self.b.string(format));
                    }
                }
            }
            calls.push(self.b.invoke(append, args)?);
        }

        let returns_bool = calls.first().is_some_and(|&c| self.b.ty(c) == TypeId::BOOL);
        if returns_bool {
            let mut chain = flag.map(|f| self.b.variable(f));
            for call in calls {
                chain = Some(match chain {
                    Some(left) => self.b.binary(BinaryOp::AndAlso, left, call)?,
                    None => call,
                });
            }
            exprs.extend(chain);
        } else if let Some(flag) = flag {
            let appends = self.statements(Vec::new(), calls)?;
            let test = self.b.variable(flag);
            exprs.push(self.b.if_then(test, appends)?);
        } else {
            exprs.extend(calls);
        }

        exprs.push(self.b.variable(handler));
        Ok(self.b.block_typed(vars, exprs, ty)?)
    }

    fn lambda_arity(&self, lambda: NodeId) -> usize {
        match self.b.kind(lambda) {
            NodeKind::Prim(arbor_ir::Prim::Lambda { params, .. }) => params.len(),
            _ => self
                .b
                .pool()
                .delegate_invoke(self.b.ty(lambda))
                .map_or(0, |m| self.b.pool().method(m).params.len()),
        }
    }
}

/// Append `text` to a composite format string, doubling braces.
fn escape_into(format: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '{' => format.push_str("{{"),
            '}' => format.push_str("}}"),
            c => format.push(c),
        }
    }
}

fn saturate(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
