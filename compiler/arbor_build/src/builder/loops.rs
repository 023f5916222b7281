//! Structured loops.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{ForEachLoop, ForLoop, LabelId, LoopKind, NodeId, VarId};
use arbor_types::TypeId;

use super::{rejected, TreeBuilder};

/// Inputs of a `foreach`.
///
/// The enumeration protocol is resolved from the collection's type; the
/// caller supplies only the parts a source language would.
#[derive(Clone, Debug)]
pub struct ForEachOptions {
    pub vars: Vec<VarId>,
    pub collection: NodeId,
    pub body: NodeId,
    /// Element-to-variable conversion lambda.
    pub conversion: Option<NodeId>,
    /// One-parameter lambda assigning `vars` from an element.
    pub deconstruction: Option<NodeId>,
    pub break_label: Option<LabelId>,
    pub continue_label: Option<LabelId>,
    pub is_async: bool,
}

impl ForEachOptions {
    pub fn new(var: VarId, collection: NodeId, body: NodeId) -> Self {
        Self {
            vars: vec![var],
            collection,
            body,
            conversion: None,
            deconstruction: None,
            break_label: None,
            continue_label: None,
            is_async: false,
        }
    }

    #[must_use]
    pub fn labels(mut self, break_label: Option<LabelId>, continue_label: Option<LabelId>) -> Self {
        self.break_label = break_label;
        self.continue_label = continue_label;
        self
    }
}

impl TreeBuilder<'_> {
    pub fn while_loop(
        &mut self,
        test: NodeId,
        body: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    ) -> BuildResult<NodeId> {
        self.ensure_bool(test, "loop test")?;
        self.check_loop_labels(body, break_label, continue_label)?;
        Ok(self.push(
            LoopKind::While {
                test,
                body,
                break_label,
                continue_label,
            },
            TypeId::VOID,
        ))
    }

    pub fn do_while(
        &mut self,
        body: NodeId,
        test: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    ) -> BuildResult<NodeId> {
        self.ensure_bool(test, "loop test")?;
        self.check_loop_labels(body, break_label, continue_label)?;
        Ok(self.push(
            LoopKind::DoWhile {
                body,
                test,
                break_label,
                continue_label,
            },
            TypeId::VOID,
        ))
    }

    pub fn for_loop(&mut self, node: ForLoop) -> BuildResult<NodeId> {
        self.ensure_distinct_vars(&node.vars)?;
        if let Some(test) = node.test {
            self.ensure_bool(test, "loop test")?;
        }
        self.check_loop_labels(node.body, node.break_label, node.continue_label)?;
        Ok(self.push(LoopKind::For(Box::new(node)), TypeId::VOID))
    }

    pub fn for_each(&mut self, options: ForEachOptions) -> BuildResult<NodeId> {
        let ForEachOptions {
            vars,
            collection,
            body,
            conversion,
            deconstruction,
            break_label,
            continue_label,
            is_async,
        } = options;

        if vars.is_empty() {
            return Err(rejected(BuildError::ArgumentCount {
                what: "foreach variables".to_owned(),
                expected: 1,
                found: 0,
            }));
        }
        self.ensure_distinct_vars(&vars)?;
        self.ensure_value(collection, "foreach collection")?;
        let collection_ty = self.ty(collection);
        let (info, await_info) = if is_async {
            let (info, dispose) = self.resolve_async_enumerator(collection_ty)?;
            (info, Some(dispose))
        } else {
            (self.resolve_enumerator(collection_ty)?, None)
        };

        let element = info.element_type;
        let converted = match (conversion, deconstruction) {
            (Some(conv), Some(_)) => self.conversion_result(conv, element)?,
            (Some(conv), None) => {
                let var_ty = self.var_ty(vars[0]);
                self.check_conversion(conv, element, var_ty)?;
                var_ty
            }
            (None, _) => element,
        };
        match deconstruction {
            Some(decon) => self.check_deconstruction(decon, converted)?,
            None if vars.len() > 1 => {
                return Err(rejected(BuildError::NotALambda {
                    what: "deconstruction of several foreach variables",
                }));
            }
            None if conversion.is_none() => {
                let var_ty = self.var_ty(vars[0]);
                if !self.converts(var_ty, element) {
                    return Err(rejected(BuildError::IncompatibleTypes {
                        context: "foreach variable",
                        expected: self.name(var_ty),
                        found: self.name(element),
                    }));
                }
            }
            None => {}
        }
        self.check_loop_labels(body, break_label, continue_label)?;

        Ok(self.push(
            LoopKind::ForEach(Box::new(ForEachLoop {
                vars,
                collection,
                conversion,
                deconstruction,
                body,
                break_label,
                continue_label,
                info,
                await_info,
            })),
            TypeId::VOID,
        ))
    }

    fn check_deconstruction(&self, lambda: NodeId, element: TypeId) -> BuildResult<()> {
        let (params, _) = self.lambda_parts(lambda, "deconstruction")?;
        if params.len() != 1 {
            return Err(rejected(BuildError::LambdaParameterCount {
                what: "deconstruction",
                expected: "1".to_owned(),
                found: params.len(),
            }));
        }
        let param_ty = self.var_ty(params[0]);
        if self.converts(param_ty, element) {
            Ok(())
        } else {
            Err(rejected(BuildError::ConversionType {
                position: "parameter",
                expected: self.name(element),
                found: self.name(param_ty),
            }))
        }
    }
}
