use super::*;
use arbor_ir::NodeArena;
use arbor_types::{Accessors, ClassOptions, ConstValue, ParamRef, TypeId, TypePool};
use pretty_assertions::assert_eq;

fn arg(owner: ParamOwner, position: u16, value: NodeId) -> ParamAssignment {
    ParamAssignment::new(ParamRef::new(owner, position), value)
}

#[test]
fn named_arguments_bind_in_any_order() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let math = pool.define_class("Math", ClassOptions::default());
    let clamp = pool.add_static_method(
        math,
        "Clamp",
        vec![
            ParamDef::new("value", TypeId::INT32),
            ParamDef::new("min", TypeId::INT32),
            ParamDef::new("max", TypeId::INT32).optional(ConstValue::Int(100)),
        ],
        TypeId::INT32,
    );
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let owner = ParamOwner::Method(clamp);
    let (five, zero) = (b.int(5), b.int(0));

    let call = b
        .bound_call(None, clamp, vec![arg(owner, 1, zero), arg(owner, 0, five)])
        .unwrap();
    assert_eq!(b.ty(call), TypeId::INT32);

    assert_eq!(
        b.bound_call(None, clamp, vec![arg(owner, 0, five)])
            .unwrap_err(),
        BuildError::UnboundParameter {
            param: "min".to_owned(),
            member: "Clamp".to_owned(),
        }
    );
    assert_eq!(
        b.bound_call(None, clamp, vec![arg(owner, 0, five), arg(owner, 0, zero)])
            .unwrap_err(),
        BuildError::DuplicateParameterBinding {
            param: "value".to_owned()
        }
    );
    let text = b.string("x");
    assert!(matches!(
        b.bound_call(None, clamp, vec![arg(owner, 0, text), arg(owner, 1, zero)])
            .unwrap_err(),
        BuildError::IncompatibleTypes {
            context: "argument",
            ..
        }
    ));
}

#[test]
fn bindings_must_belong_to_the_member() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let math = pool.define_class("Math", ClassOptions::default());
    let abs = pool.add_static_method(
        math,
        "Abs",
        vec![ParamDef::new("value", TypeId::INT32)],
        TypeId::INT32,
    );
    let neg = pool.add_static_method(
        math,
        "Neg",
        vec![ParamDef::new("value", TypeId::INT32)],
        TypeId::INT32,
    );
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let one = b.int(1);

    assert_eq!(
        b.bound_call(None, abs, vec![arg(ParamOwner::Method(neg), 0, one)])
            .unwrap_err(),
        BuildError::ParameterNotOwned {
            param: "#0".to_owned(),
            member: "Abs".to_owned(),
        }
    );
    assert_eq!(
        b.bound_call(None, abs, vec![arg(ParamOwner::Method(abs), 3, one)])
            .unwrap_err(),
        BuildError::ParameterNotOwned {
            param: "#3".to_owned(),
            member: "Abs".to_owned(),
        }
    );
    let owner = ParamOwner::Method(abs);
    assert_eq!(
        b.bound_call(None, abs, vec![arg(owner, 0, one), arg(owner, 0, one)])
            .unwrap_err(),
        BuildError::TooManyArguments {
            member: "Abs".to_owned(),
            expected: 1,
            found: 2,
        }
    );
}

#[test]
fn instance_members_need_a_receiver() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let list = pool.define_class("List", ClassOptions::default());
    let add = pool.add_method(
        list,
        "Add",
        vec![ParamDef::new("item", TypeId::STRING)],
        TypeId::VOID,
    );
    let item = pool.add_indexer(
        list,
        "Item",
        vec![ParamDef::new("index", TypeId::INT32)],
        TypeId::STRING,
        Accessors::GetSet,
    );
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let l = b.new_var("l", list);
    let lr = b.variable(l);
    let (text, zero) = (b.string("a"), b.int(0));

    let add_arg = arg(ParamOwner::Method(add), 0, text);
    assert!(b.bound_call(Some(lr), add, vec![add_arg.clone()]).is_ok());
    assert!(matches!(
        b.bound_call(None, add, vec![add_arg]).unwrap_err(),
        BuildError::InstanceMemberWithoutReceiver { .. }
    ));

    let index = b
        .bound_index(lr, item, vec![arg(ParamOwner::Indexer(item), 0, zero)])
        .unwrap();
    assert_eq!(b.ty(index), TypeId::STRING);
}

#[test]
fn constructions_and_delegates() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let point = pool.define_class("Point", ClassOptions::default());
    let ctor = pool.add_ctor(
        point,
        vec![
            ParamDef::new("x", TypeId::INT32),
            ParamDef::new("y", TypeId::INT32).optional(ConstValue::Int(0)),
        ],
    );
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let one = b.int(1);

    let made = b
        .bound_new(ctor, vec![arg(ParamOwner::Ctor(ctor), 0, one)])
        .unwrap();
    assert_eq!(b.ty(made), point);
    assert_eq!(
        b.bound_new(ctor, vec![]).unwrap_err(),
        BuildError::UnboundParameter {
            param: "x".to_owned(),
            member: "Point".to_owned(),
        }
    );

    let p = b.new_var("p", TypeId::INT32);
    let pr = b.variable(p);
    let twice = b.binary(arbor_ir::BinaryOp::Add, pr, pr).unwrap();
    let double = b.lambda(vec![p], twice).unwrap();
    let invoke = b
        .pool()
        .delegate_invoke(b.ty(double))
        .unwrap_or_else(|| panic!("lambda has a delegate type"));
    let result = b
        .bound_invoke(double, vec![arg(ParamOwner::Method(invoke), 0, one)])
        .unwrap();
    assert_eq!(b.ty(result), TypeId::INT32);

    assert!(matches!(
        b.bound_invoke(one, vec![]).unwrap_err(),
        BuildError::NotADelegate { .. }
    ));
}
