//! Value switches, switch expressions and their jumps.
//!
//! A value switch becomes a chain of equality tests that jump to one label
//! per case, followed by the case bodies in order. Each body that does not
//! already end in a jump or throw is closed with a jump to the break label.
//! `goto case` and `goto default` inside the bodies are resolved to the
//! case labels here; outside any switch they cannot be reduced.

use arbor_build::{walk_rewrite, Rewriter, TreeBuilder};
use arbor_diagnostic::{ReduceError, ReduceResult};
use arbor_ir::{
    BinaryOp, GotoKind, LabelId, NodeId, NodeKind, Prim, SwitchExpression, SwitchKind,
    SwitchStatement, VarId,
};
use arbor_types::{ConstValue, TypeId};
use rustc_hash::FxHashMap;

use super::Lowerer;

impl Lowerer<'_, '_> {
    pub(crate) fn switch_statement(&mut self, node: SwitchStatement) -> ReduceResult<NodeId> {
        let SwitchStatement {
            value,
            mut vars,
            cases,
            break_label,
        } = node;
        let governing = self.b.ty(value);
        let subject = self.b.new_temp(governing);
        vars.push(subject);

        let case_labels: Vec<LabelId> = cases
            .iter()
            .map(|_| self.b.new_label(None, TypeId::VOID))
            .collect();
        let default_label = cases
            .iter()
            .position(|c| c.is_default)
            .map(|i| case_labels[i]);

        let mut exprs = vec![self.store(subject, value)?];
        for (case, &label) in cases.iter().zip(&case_labels) {
            for test_value in &case.test_values {
                let test = self.case_test(subject, test_value, governing)?;
                let jump = self.b.goto_label(label)?;
                exprs.push(self.b.if_then(test, jump)?);
            }
        }
        exprs.push(self.b.goto_label(default_label.unwrap_or(break_label))?);

        let mut jumps = CaseJumps {
            cases: cases
                .iter()
                .zip(&case_labels)
                .flat_map(|(case, &label)| case.test_values.iter().map(move |v| (v.clone(), label)))
                .collect(),
            default: default_label,
        };
        for (case, &label) in cases.iter().zip(&case_labels) {
            exprs.push(self.b.label(label, None)?);
            for &statement in &case.body {
                exprs.push(jumps.rewrite_node(self.b, statement)?);
            }
            let ends_in_jump = case.body.last().is_some_and(|&last| self.leaves_case(last));
            if !ends_in_jump {
                exprs.push(self.b.break_to(break_label)?);
            }
        }
        exprs.push(self.b.label(break_label, None)?);
        tracing::trace!(cases = cases.len(), "lowered switch statement");
        self.statements(vars, exprs)
    }

    /// `subject == value`; strings compare by content.
    fn case_test(
        &mut self,
        subject: VarId,
        value: &ConstValue,
        governing: TypeId,
    ) -> ReduceResult<NodeId> {
        let read = self.b.variable(subject);
        if value.is_null() {
            let null = self.b.null(governing)?;
            return Ok(self.b.binary(BinaryOp::Equal, read, null)?);
        }
        let ty = self.b.pool().non_nullable(governing);
        let constant = self.b.constant(value.clone(), ty)?;
        if ty == TypeId::STRING {
            let equals = self.b.pool().well_known().string_equals;
            return Ok(self.b.call(None, equals, vec![read, constant])?);
        }
        Ok(self.b.binary(BinaryOp::Equal, read, constant)?)
    }

    /// Whether control never falls out of `statement`.
    fn leaves_case(&self, statement: NodeId) -> bool {
        matches!(
            self.b.kind(statement),
            NodeKind::Prim(Prim::Goto { .. } | Prim::Throw { .. })
                | NodeKind::Switch(SwitchKind::GotoCase { .. } | SwitchKind::GotoDefault)
        )
    }

    /// Arms are tried in order; the first whose pattern and guard hold
    /// jumps to the end with its value. Falling through every arm throws.
    pub(crate) fn switch_expression(
        &mut self,
        node: SwitchExpression,
        ty: TypeId,
    ) -> ReduceResult<NodeId> {
        let SwitchExpression { value, arms } = node;
        let subject = self.b.new_temp(self.b.ty(value));
        let done = self.b.new_label(None, ty);
        let mut exprs = vec![self.store(subject, value)?];

        for arm in arms {
            let mut scope = arm.vars;
            let input = self.b.variable(subject);
            let mut test = self.pattern_test(&mut scope, input, arm.pattern)?;
            if let Some(guard) = arm.guard {
                test = self.b.binary(BinaryOp::AndAlso, test, guard)?;
            }
            let result = if self.b.ty(arm.value) == ty {
                arm.value
            } else {
                self.b.convert(arm.value, ty)?
            };
            let exit = self.b.goto(GotoKind::Goto, done, Some(result))?;
            let taken = self.b.if_then(test, exit)?;
            exprs.push(self.statements(scope, vec![taken])?);
        }

        let wk = self.b.pool().well_known().clone();
        let unmatched = self.b.variable(subject);
        let unmatched = self.b.convert(unmatched, TypeId::OBJECT)?;
        let exception = self.b.new_object(wk.switch_exception_ctor, vec![unmatched])?;
        exprs.push(self.b.throw(exception)?);
        let fallback = self.b.default(ty)?;
        exprs.push(self.b.label(done, Some(fallback))?);
        Ok(self.b.block_typed(vec![subject], exprs, ty)?)
    }
}

/// Resolves `goto case` and `goto default` of one switch to its case
/// labels. Nested switches and lambdas keep their own jumps.
struct CaseJumps {
    cases: FxHashMap<ConstValue, LabelId>,
    default: Option<LabelId>,
}

impl Rewriter for CaseJumps {
    type Error = ReduceError;

    fn rewrite_node(&mut self, builder: &mut TreeBuilder<'_>, id: NodeId) -> ReduceResult<NodeId> {
        match builder.kind(id) {
            NodeKind::Switch(SwitchKind::GotoCase { value }) => {
                let Some(&label) = self.cases.get(value) else {
                    return Err(ReduceError::NoMatchingCase {
                        value: value.to_string(),
                    });
                };
                Ok(builder.goto_label(label)?)
            }
            NodeKind::Switch(SwitchKind::GotoDefault) => match self.default {
                Some(label) => Ok(builder.goto_label(label)?),
                None => Err(ReduceError::NoMatchingCase {
                    value: "default".to_owned(),
                }),
            },
            NodeKind::Switch(SwitchKind::Statement(_)) | NodeKind::Prim(Prim::Lambda { .. }) => {
                Ok(id)
            }
            _ => walk_rewrite(self, builder, id),
        }
    }
}
