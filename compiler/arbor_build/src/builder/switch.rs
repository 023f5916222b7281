//! Value switches, `goto case`/`goto default`, switch expressions and
//! `is` pattern tests.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{NodeId, PatternId, SwitchArm, SwitchExpression, SwitchKind, SwitchStatement};
use arbor_types::{ConstValue, TypeId};
use rustc_hash::FxHashSet;

use super::{rejected, TreeBuilder};

impl TreeBuilder<'_> {
    /// A value switch. Test values must be distinct constants of the
    /// governing type; at most one case is the default.
    pub fn switch_statement(&mut self, node: SwitchStatement) -> BuildResult<NodeId> {
        self.ensure_value(node.value, "switch value")?;
        let governing = self.ty(node.value);
        if !self.pool.is_valid_switch_type(governing) {
            return Err(rejected(BuildError::InvalidSwitchType {
                found: self.name(governing),
            }));
        }
        self.ensure_distinct_vars(&node.vars)?;

        let mut seen: FxHashSet<&ConstValue> = FxHashSet::default();
        let mut has_default = false;
        for case in &node.cases {
            if case.is_default {
                if has_default {
                    return Err(rejected(BuildError::DuplicateDefaultCase));
                }
                has_default = true;
            }
            for value in &case.test_values {
                if value.is_null() {
                    if !self.pool.can_be_null(governing) {
                        return Err(rejected(BuildError::NullTestValue {
                            governing: self.name(governing),
                        }));
                    }
                } else if !self.pool.const_fits(value, governing) {
                    return Err(rejected(BuildError::TestValueType {
                        value: value.to_string(),
                        governing: self.name(governing),
                    }));
                }
                if !seen.insert(value) {
                    return Err(rejected(BuildError::DuplicateTestValue {
                        value: value.to_string(),
                    }));
                }
            }
        }

        let label_ty = self.label_ty(node.break_label);
        if !label_ty.is_void() {
            return Err(rejected(BuildError::LabelTypeMismatch {
                label: self.label_name(node.break_label),
                expected: self.name(TypeId::VOID),
                found: self.name(label_ty),
            }));
        }
        Ok(self.push(SwitchKind::Statement(Box::new(node)), TypeId::VOID))
    }

    /// `goto case value`; only reducible inside a switch with that case.
    pub fn goto_case(&mut self, value: ConstValue) -> NodeId {
        self.push(SwitchKind::GotoCase { value }, TypeId::VOID)
    }

    /// `goto default`; only reducible inside a switch with a default case.
    pub fn goto_default(&mut self) -> NodeId {
        self.push(SwitchKind::GotoDefault, TypeId::VOID)
    }

    /// `value switch { arms }` of type `ty`. No arm matching throws at run
    /// time.
    pub fn switch_expression(
        &mut self,
        value: NodeId,
        arms: Vec<SwitchArm>,
        ty: TypeId,
    ) -> BuildResult<NodeId> {
        self.ensure_value(value, "switch expression value")?;
        self.ensure_node_type(ty)?;
        if ty.is_void() {
            return Err(rejected(BuildError::VoidValue {
                context: "a switch expression",
            }));
        }
        let input = self.ty(value);
        for arm in &arms {
            self.ensure_distinct_vars(&arm.vars)?;
            self.ensure_pattern_input(arm.pattern, input)?;
            if let Some(guard) = arm.guard {
                self.ensure_bool(guard, "when clause")?;
            }
            self.ensure_value(arm.value, "switch arm value")?;
            self.ensure_converts(ty, arm.value, "switch arm value")?;
        }
        Ok(self.push(
            SwitchKind::Expression(Box::new(SwitchExpression { value, arms })),
            ty,
        ))
    }

    /// `operand is pattern`.
    pub fn is_pattern(&mut self, operand: NodeId, pattern: PatternId) -> BuildResult<NodeId> {
        self.ensure_value(operand, "pattern operand")?;
        let input = self.ty(operand);
        self.ensure_pattern_input(pattern, input)?;
        Ok(self.push(SwitchKind::IsPattern { operand, pattern }, TypeId::BOOL))
    }
}
