use super::*;
use crate::test_interp::{Machine, Value};
use arbor_ir::{
    AssignOp, BinaryOp, DynamicArg, DynamicKind, DynamicOp, Node, NodeArena, Prim, RelationalOp,
};
use arbor_types::{ConstValue, TypeId, TypePool};
use pretty_assertions::assert_eq;

#[test]
fn primitive_trees_come_back_untouched() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let x = b.new_var("x", TypeId::INT32);
    let xr = b.variable(x);
    let two = b.int(2);
    let doubled = b.binary(BinaryOp::Multiply, xr, two).unwrap();
    let target = b.variable(x);
    let store = b.assign(target, doubled).unwrap();
    let root = b.block(Vec::new(), vec![store, doubled]).unwrap();
    let before = b.arena().len();

    assert_eq!(
        reduce_all(&mut b, root, &ReduceOptions::default()).unwrap(),
        root
    );
    assert_eq!(b.arena().len(), before);
}

#[test]
fn nested_statements_are_reduced_inside_primitive_parents() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let (x, root) = {
        let mut b = TreeBuilder::new(&mut arena, &mut pool);
        let x = b.new_var("x", TypeId::INT32);
        let (xr, limit) = (b.variable(x), b.int(100));
        let test = b.binary(BinaryOp::LessThan, xr, limit).unwrap();
        let xr = b.variable(x);
        let three = b.int(3);
        let step = b.compound(AssignOp::Multiply, xr, three).unwrap();
        let looped = b.while_loop(test, step, None, None).unwrap();
        let result = b.variable(x);
        let root = b.block(Vec::new(), vec![looped, result]).unwrap();

        let options = ReduceOptions {
            validate_output: true,
            ..ReduceOptions::default()
        };
        let reduced = reduce_all(&mut b, root, &options).unwrap();
        assert_ne!(reduced, root);
        (x, reduced)
    };

    let mut m = Machine::new(&arena, &pool);
    m.set(x, Value::int(2));
    assert_eq!(m.run(root).unwrap(), Value::int(162));
}

#[test]
fn pass_limit_stops_runaway_lowering() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let x = b.new_var("x", TypeId::INT32);
    let xr = b.variable(x);
    let one = b.int(1);
    let add = b.compound(AssignOp::Add, xr, one).unwrap();

    let options = ReduceOptions {
        max_passes: 0,
        ..ReduceOptions::default()
    };
    assert_eq!(
        reduce_all(&mut b, add, &options).unwrap_err(),
        ReduceError::PassLimitExceeded { passes: 0 }
    );
    // A single pass is enough for a compound assignment to a local.
    let options = ReduceOptions {
        max_passes: 1,
        ..ReduceOptions::default()
    };
    assert!(reduce_all(&mut b, add, &options).is_ok());
}

#[test]
fn validation_reports_the_first_non_primitive_node() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let x = b.new_var("x", TypeId::INT32);
    let xr = b.variable(x);
    let one = b.int(1);
    let add = b.compound(AssignOp::Add, xr, one).unwrap();
    let pattern = b
        .relational_pattern(TypeId::INT32, RelationalOp::GreaterThan, ConstValue::Int(0))
        .unwrap();
    let positive = b.is_pattern(add, pattern).unwrap();
    let wrapped = b.block(Vec::new(), vec![add, positive]).unwrap();

    assert_eq!(
        validate_primitive(b.arena(), wrapped).unwrap_err(),
        ReduceError::NotPrimitive { kind: "add-assign" }
    );
    assert_eq!(
        validate_primitive(b.arena(), positive).unwrap_err(),
        ReduceError::NotPrimitive { kind: "is-pattern" }
    );
    let reduced = reduce_all(&mut b, wrapped, &ReduceOptions::default()).unwrap();
    assert_eq!(validate_primitive(b.arena(), reduced), Ok(()));
}

#[test]
fn assignment_into_a_late_bound_target_is_not_primitive() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let (assign, mut b) = {
        let d = arena.new_var("d", TypeId::OBJECT);
        let dr = arena.push(Node::new(Prim::Variable(d).into(), TypeId::OBJECT));
        let member = arena.push(Node::new(
            DynamicOp::new(
                DynamicKind::GetMember {
                    name: "Count".into(),
                },
                vec![DynamicArg::new(dr)],
            )
            .into(),
            TypeId::OBJECT,
        ));
        let one = arena.push(Node::new(
            Prim::Constant(ConstValue::Int(1)).into(),
            TypeId::INT32,
        ));
        let assign = arena.push(Node::new(
            Prim::Assign {
                target: member,
                value: one,
            }
            .into(),
            TypeId::OBJECT,
        ));
        (assign, TreeBuilder::new(&mut arena, &mut pool))
    };

    assert_eq!(
        validate_primitive(b.arena(), assign).unwrap_err(),
        ReduceError::NotPrimitive { kind: "dynamic-op" }
    );
    let reduced = reduce_all(&mut b, assign, &ReduceOptions::default()).unwrap();
    assert_eq!(
        dump_of(&b, reduced),
        "(dynamic set-member d 1)"
    );
}

fn dump_of(b: &TreeBuilder<'_>, id: NodeId) -> String {
    arbor_ir::dump(b.arena(), b.pool(), id)
}
