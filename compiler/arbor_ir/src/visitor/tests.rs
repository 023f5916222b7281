use super::*;
use crate::node::{BinaryOp, Node, NodeKind, Prim};
use arbor_types::{ConstValue, TypeId};

#[derive(Default)]
struct Counter {
    nodes: usize,
    constants: usize,
    vars: Vec<VarId>,
    labels: usize,
}

impl Visitor for Counter {
    fn visit_node(&mut self, id: NodeId, arena: &NodeArena) {
        self.nodes += 1;
        if let NodeKind::Prim(Prim::Constant(_)) = arena.kind(id) {
            self.constants += 1;
        }
        walk_node(self, id, arena);
    }

    fn visit_var(&mut self, var: VarId, _arena: &NodeArena) {
        self.vars.push(var);
    }

    fn visit_label(&mut self, _label: LabelId, _arena: &NodeArena) {
        self.labels += 1;
    }
}

#[test]
fn counts_every_node() {
    let mut arena = NodeArena::new();
    let x = arena.new_var("x", TypeId::INT32);
    let one = arena.push(Node::new(
        Prim::Constant(ConstValue::Int(1)).into(),
        TypeId::INT32,
    ));
    let read = arena.push(Node::new(Prim::Variable(x).into(), TypeId::INT32));
    let sum = arena.push(Node::new(
        Prim::Binary {
            op: BinaryOp::Add,
            left: read,
            right: one,
            method: None,
        }
        .into(),
        TypeId::INT32,
    ));
    let target = arena.push(Node::new(Prim::Variable(x).into(), TypeId::INT32));
    let assign = arena.push(Node::new(
        Prim::Assign { target, value: sum }.into(),
        TypeId::INT32,
    ));
    let block = arena.push(Node::new(
        Prim::Block {
            vars: vec![x],
            exprs: vec![assign],
        }
        .into(),
        TypeId::INT32,
    ));

    let mut counter = Counter::default();
    counter.visit_node(block, &arena);

    assert_eq!(counter.nodes, 6);
    assert_eq!(counter.constants, 1);
    // declaration, then the two uses
    assert_eq!(counter.vars, vec![x, x, x]);
    assert_eq!(counter.labels, 0);
}

#[test]
fn labels_are_visited() {
    let mut arena = NodeArena::new();
    let brk = arena.new_label(None, TypeId::VOID);
    let goto = arena.push(Node::new(
        Prim::Goto {
            kind: crate::node::GotoKind::Break,
            label: brk,
            value: None,
        }
        .into(),
        TypeId::VOID,
    ));
    let lp = arena.push(Node::new(
        Prim::Loop {
            body: goto,
            break_label: Some(brk),
            continue_label: None,
        }
        .into(),
        TypeId::VOID,
    ));

    let mut counter = Counter::default();
    counter.visit_node(lp, &arena);
    assert_eq!(counter.labels, 2);
    assert_eq!(counter.nodes, 2);
}

#[test]
fn deep_chain_walks_without_overflow() {
    let mut arena = NodeArena::new();
    let mut current = arena.push(Node::new(
        Prim::Constant(ConstValue::Int(0)).into(),
        TypeId::INT32,
    ));
    for _ in 0..100_000 {
        current = arena.push(Node::new(
            Prim::Unary {
                op: crate::node::UnaryOp::Negate,
                operand: current,
                method: None,
            }
            .into(),
            TypeId::INT32,
        ));
    }

    let mut counter = Counter::default();
    counter.visit_node(current, &arena);
    assert_eq!(counter.nodes, 100_001);
    assert_eq!(counter.constants, 1);
}
