use super::*;
use arbor_ir::{BinderFlags, DynamicArg, NodeArena};
use arbor_types::TypePool;
use pretty_assertions::assert_eq;

#[test]
fn arity_is_checked_per_operation() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let d = b.new_var("d", TypeId::OBJECT);
    let dr = b.variable(d);
    let one = b.int(1);

    let add = DynamicOp::new(
        DynamicKind::Binary(BinaryOp::Add),
        vec![DynamicArg::new(dr), DynamicArg::new(one)],
    )
    .with_flags(BinderFlags::CHECKED);
    let id = b.dynamic(add, TypeId::OBJECT).unwrap();
    assert_eq!(b.ty(id), TypeId::OBJECT);

    let lonely = DynamicOp::new(DynamicKind::Binary(BinaryOp::Add), vec![DynamicArg::new(dr)]);
    assert_eq!(
        b.dynamic(lonely, TypeId::OBJECT).unwrap_err(),
        BuildError::ArgumentCount {
            what: "late-bound binary".to_owned(),
            expected: 2,
            found: 1,
        }
    );

    let set_index = DynamicOp::new(
        DynamicKind::SetIndex,
        vec![DynamicArg::new(dr), DynamicArg::new(one)],
    );
    assert_eq!(
        b.dynamic(set_index, TypeId::OBJECT).unwrap_err(),
        BuildError::ArgumentCount {
            what: "late-bound set-index".to_owned(),
            expected: 3,
            found: 2,
        }
    );
    let construct = DynamicOp::new(DynamicKind::InvokeConstructor, vec![]);
    assert!(b.dynamic(construct, TypeId::OBJECT).is_ok());
}

#[test]
fn some_operators_are_never_late_bound() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let d = b.new_var("d", TypeId::OBJECT);
    let dr = b.variable(d);

    let and_also = DynamicOp::new(
        DynamicKind::Binary(BinaryOp::AndAlso),
        vec![DynamicArg::new(dr), DynamicArg::new(dr)],
    );
    assert_eq!(
        b.dynamic(and_also, TypeId::OBJECT).unwrap_err(),
        BuildError::InvalidDynamicOperation {
            op: "operator `&&`".to_owned()
        }
    );
    let convert = DynamicOp::new(DynamicKind::Unary(UnaryOp::Convert), vec![DynamicArg::new(dr)]);
    assert_eq!(
        b.dynamic(convert, TypeId::OBJECT).unwrap_err(),
        BuildError::InvalidDynamicOperation {
            op: "unary `convert`".to_owned()
        }
    );
    let negate = DynamicOp::new(DynamicKind::Unary(UnaryOp::Negate), vec![DynamicArg::new(dr)]);
    assert!(b.dynamic(negate, TypeId::OBJECT).is_ok());
}

#[test]
fn arguments() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let d = b.new_var("d", TypeId::OBJECT);
    let x = b.new_var("x", TypeId::INT32);
    let (dr, xr) = (b.variable(d), b.variable(x));
    let one = b.int(1);
    let nothing = b.empty();
    let call = |args: Vec<DynamicArg>| {
        DynamicOp::new(
            DynamicKind::InvokeMember {
                name: "Run".into(),
                type_args: vec![],
            },
            args,
        )
    };

    let by_ref = call(vec![
        DynamicArg::new(dr),
        DynamicArg::new(xr).with_flags(ArgFlags::IS_REF),
        DynamicArg::new(one).named("count"),
    ]);
    assert!(b.dynamic(by_ref, TypeId::OBJECT).is_ok());

    let constant_ref = call(vec![
        DynamicArg::new(dr),
        DynamicArg::new(one).with_flags(ArgFlags::IS_OUT),
    ]);
    assert_eq!(
        b.dynamic(constant_ref, TypeId::OBJECT).unwrap_err(),
        BuildError::ByRefArgumentNotWritable {
            param: "#1".to_owned()
        }
    );

    let twice = call(vec![
        DynamicArg::new(dr),
        DynamicArg::new(one).named("n"),
        DynamicArg::new(xr).named("n"),
    ]);
    assert_eq!(
        b.dynamic(twice, TypeId::OBJECT).unwrap_err(),
        BuildError::DuplicateArgumentName {
            name: "n".to_owned()
        }
    );

    let void_arg = call(vec![DynamicArg::new(dr), DynamicArg::new(nothing)]);
    assert!(matches!(
        b.dynamic(void_arg, TypeId::OBJECT).unwrap_err(),
        BuildError::VoidValue { .. }
    ));
}
