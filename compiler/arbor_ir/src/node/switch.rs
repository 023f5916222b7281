//! Value switches, `goto case`/`goto default`, switch expressions and `is`
//! pattern tests.

use arbor_types::ConstValue;

use crate::{LabelId, NodeId, PatternId, VarId};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum SwitchKind {
    Statement(Box<SwitchStatement>),
    /// Jump to the case of the enclosing switch labelled `value`.
    GotoCase { value: ConstValue },
    /// Jump to the default case of the enclosing switch.
    GotoDefault,
    Expression(Box<SwitchExpression>),
    IsPattern { operand: NodeId, pattern: PatternId },
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SwitchStatement {
    pub value: NodeId,
    /// Variables scoped to the whole switch block.
    pub vars: Vec<VarId>,
    pub cases: Vec<SwitchCase>,
    pub break_label: LabelId,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SwitchCase {
    pub test_values: Vec<ConstValue>,
    pub is_default: bool,
    pub body: Vec<NodeId>,
}

impl SwitchCase {
    pub fn new(test_values: Vec<ConstValue>, body: Vec<NodeId>) -> Self {
        Self {
            test_values,
            is_default: false,
            body,
        }
    }

    pub fn default_case(body: Vec<NodeId>) -> Self {
        Self {
            test_values: Vec::new(),
            is_default: true,
            body,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SwitchExpression {
    pub value: NodeId,
    pub arms: Vec<SwitchArm>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SwitchArm {
    /// Variables bound by the pattern, scoped to the arm.
    pub vars: Vec<VarId>,
    pub pattern: PatternId,
    /// `when` clause.
    pub guard: Option<NodeId>,
    pub value: NodeId,
}
