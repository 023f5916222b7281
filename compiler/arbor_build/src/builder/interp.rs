//! Interpolated strings and their conversion to handler types.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{HandlerConversion, HandlerInfo, InterpKind, InterpPart, NodeId, NodeKind, VarId};
use arbor_types::TypeId;

use super::{rejected, TreeBuilder};

/// Inputs of an interpolated-string-handler conversion.
#[derive(Clone, Debug)]
pub struct HandlerOptions {
    /// The interpolated string node.
    pub string: NodeId,
    /// `(int literalLength, int formattedCount[, out bool shouldAppend])`
    /// returning the handler.
    pub construction: NodeId,
    /// One lambda per segment of the string, in order.
    pub appends: Vec<NodeId>,
    pub handler_ty: TypeId,
}

impl TreeBuilder<'_> {
    /// `$"..."`.
    pub fn interpolated(&mut self, parts: Vec<InterpPart>) -> BuildResult<NodeId> {
        for part in &parts {
            if let InterpPart::Insert { value, .. } = part {
                self.ensure_value(*value, "interpolated value")?;
            }
        }
        Ok(self.push(InterpKind::String { parts }, TypeId::STRING))
    }

    /// Convert an interpolated string to a handler type.
    ///
    /// Appends take the handler (by reference when it is a value type) and
    /// the segment: a `string` for literals, or the value followed by the
    /// optional `int` alignment and `string` format. They all return `void`
    /// or all return `bool`.
    pub fn handler_conversion(&mut self, options: HandlerOptions) -> BuildResult<NodeId> {
        let HandlerOptions {
            string,
            construction,
            appends,
            handler_ty,
        } = options;
        self.ensure_node_type(handler_ty)?;
        let parts = match self.kind(string) {
            NodeKind::Interp(InterpKind::String { parts }) => parts.clone(),
            other => {
                return Err(rejected(BuildError::IncompatibleTypes {
                    context: "handler conversion",
                    expected: "an interpolated string".to_owned(),
                    found: other.name().to_owned(),
                }));
            }
        };

        self.check_construction(construction, handler_ty)?;
        if appends.len() != parts.len() {
            return Err(rejected(BuildError::AppendCountMismatch {
                expected: parts.len(),
                found: appends.len(),
            }));
        }
        let mut result_ty: Option<TypeId> = None;
        for (part, &append) in parts.iter().zip(&appends) {
            let ret = self.check_append(append, part, handler_ty)?;
            match result_ty {
                None if ret.is_void() || ret == TypeId::BOOL => result_ty = Some(ret),
                Some(first) if first == ret => {}
                expected => {
                    return Err(rejected(BuildError::IncompatibleTypes {
                        context: "append result",
                        expected: self.name(expected.unwrap_or(TypeId::BOOL)),
                        found: self.name(ret),
                    }));
                }
            }
        }

        Ok(self.push(
            InterpKind::HandlerConversion(Box::new(HandlerConversion {
                string,
                info: HandlerInfo {
                    construction,
                    appends,
                },
            })),
            handler_ty,
        ))
    }

    fn check_construction(&self, lambda: NodeId, handler_ty: TypeId) -> BuildResult<()> {
        let (params, body) = self.lambda_parts(lambda, "handler construction")?;
        if !(2..=3).contains(&params.len()) {
            return Err(rejected(BuildError::LambdaParameterCount {
                what: "handler construction",
                expected: "2 or 3".to_owned(),
                found: params.len(),
            }));
        }
        for &p in &params[..2] {
            self.ensure_param_type(p, TypeId::INT32, "handler construction parameter")?;
        }
        if let Some(&flag) = params.get(2) {
            self.ensure_param_type(flag, TypeId::BOOL, "should-append flag")?;
            self.ensure_by_ref(flag)?;
        }
        let ret = self.ty(body);
        if self.converts(handler_ty, ret) {
            Ok(())
        } else {
            Err(rejected(BuildError::ConversionType {
                position: "result",
                expected: self.name(handler_ty),
                found: self.name(ret),
            }))
        }
    }

    /// Check one append lambda against its segment and return its result
    /// type.
    fn check_append(
        &self,
        lambda: NodeId,
        part: &InterpPart,
        handler_ty: TypeId,
    ) -> BuildResult<TypeId> {
        let (params, body) = self.lambda_parts(lambda, "append")?;
        let expected = match part {
            InterpPart::Literal(_) => 2,
            InterpPart::Insert {
                alignment, format, ..
            } => 2 + usize::from(alignment.is_some()) + usize::from(format.is_some()),
        };
        if params.len() != expected {
            return Err(rejected(BuildError::LambdaParameterCount {
                what: "append",
                expected: expected.to_string(),
                found: params.len(),
            }));
        }

        let handler = params[0];
        if self.var_ty(handler) != handler_ty {
            return Err(rejected(BuildError::IncompatibleTypes {
                context: "append handler parameter",
                expected: self.name(handler_ty),
                found: self.name(self.var_ty(handler)),
            }));
        }
        if self.pool.is_value_type(handler_ty) {
            self.ensure_by_ref(handler)?;
        }

        match part {
            InterpPart::Literal(_) => {
                self.ensure_param_accepts(params[1], TypeId::STRING, "literal append parameter")?;
            }
            InterpPart::Insert {
                value,
                alignment,
                format,
            } => {
                self.ensure_param_accepts(params[1], self.ty(*value), "append value parameter")?;
                let mut rest = params[2..].iter();
                if alignment.is_some() {
                    if let Some(&p) = rest.next() {
                        let ty = self.var_ty(p);
                        if ty != TypeId::INT32 {
                            return Err(rejected(BuildError::AlignmentNotInt {
                                found: self.name(ty),
                            }));
                        }
                    }
                }
                if format.is_some() {
                    if let Some(&p) = rest.next() {
                        let ty = self.var_ty(p);
                        if ty != TypeId::STRING {
                            return Err(rejected(BuildError::FormatNotString {
                                found: self.name(ty),
                            }));
                        }
                    }
                }
            }
        }
        Ok(self.ty(body))
    }

    fn ensure_param_type(&self, param: VarId, ty: TypeId, context: &'static str) -> BuildResult<()> {
        let found = self.var_ty(param);
        if found == ty {
            Ok(())
        } else {
            Err(rejected(BuildError::IncompatibleTypes {
                context,
                expected: self.name(ty),
                found: self.name(found),
            }))
        }
    }

    fn ensure_param_accepts(
        &self,
        param: VarId,
        ty: TypeId,
        context: &'static str,
    ) -> BuildResult<()> {
        let found = self.var_ty(param);
        if self.converts(found, ty) {
            Ok(())
        } else {
            Err(rejected(BuildError::IncompatibleTypes {
                context,
                expected: self.name(ty),
                found: self.name(found),
            }))
        }
    }

    fn ensure_by_ref(&self, param: VarId) -> BuildResult<()> {
        if self.arena.var(param).by_ref {
            Ok(())
        } else {
            Err(rejected(BuildError::ParameterNotByRef {
                name: self.var_name(param),
            }))
        }
    }
}
