use super::*;
use crate::test_interp::{Machine, Signal, Value};
use crate::{reduce_all, ReduceError, ReduceOptions};
use arbor_build::TreeBuilder;
use arbor_ir::{dump, BinaryOp, Node, NodeArena};
use arbor_types::{Accessors, ClassOptions, MethodId, ParamRef, TypeId, TypePool};
use pretty_assertions::assert_eq;

fn arg(owner: ParamOwner, position: u16, value: NodeId) -> ParamAssignment {
    ParamAssignment::new(ParamRef::new(owner, position), value)
}

/// A static `Tag(string) -> int` whose host records the tag and returns
/// its length.
fn tag_method(pool: &mut TypePool, host: TypeId) -> MethodId {
    pool.add_static_method(
        host,
        "Tag",
        vec![ParamDef::new("name", TypeId::STRING)],
        TypeId::INT32,
    )
}

fn install_tag(m: &mut Machine<'_>, tag: MethodId) {
    m.host(tag, |m, _, args| {
        let [Value::Str(name)] = &*args else {
            return Err(Signal::Fault("tag argument"));
        };
        let len = name.len();
        m.record(name.to_string());
        Ok(Value::Int(len as i128))
    });
}

#[test]
fn arguments_run_in_written_order_and_pass_in_parameter_order() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let host = pool.define_class("Host", ClassOptions::default());
    let tag = tag_method(&mut pool, host);
    let pair = pool.add_static_method(
        host,
        "Pair",
        vec![
            ParamDef::new("a", TypeId::INT32),
            ParamDef::new("b", TypeId::INT32),
        ],
        TypeId::INT32,
    );
    let root = {
        let mut b = TreeBuilder::new(&mut arena, &mut pool);
        let owner = ParamOwner::Method(pair);
        let bee = b.string("bb");
        let second = b.call(None, tag, vec![bee]).unwrap();
        let a = b.string("a");
        let first = b.call(None, tag, vec![a]).unwrap();
        let call = b
            .bound_call(None, pair, vec![arg(owner, 1, second), arg(owner, 0, first)])
            .unwrap();
        reduce_all(&mut b, call, &ReduceOptions::default()).unwrap()
    };

    let mut m = Machine::new(&arena, &pool);
    install_tag(&mut m, tag);
    m.host(pair, |_, _, args| match &*args {
        [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a * 10 + b)),
        _ => Err(Signal::Fault("pair arguments")),
    });
    assert_eq!(m.run(root).unwrap(), Value::int(12));
    assert_eq!(m.log, ["bb", "a"]);
}

#[test]
fn omitted_optionals_receive_their_defaults() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let host = pool.define_class("Host", ClassOptions::default());
    let money = pool.define_struct("Money", &[]);
    let scale = pool.add_static_method(
        host,
        "Scale",
        vec![
            ParamDef::new("value", TypeId::INT32),
            ParamDef::new("factor", TypeId::INT32).optional(ConstValue::Int(2)),
            ParamDef::new("unit", money).optional(ConstValue::Null),
            ParamDef::new("label", TypeId::STRING).optional(ConstValue::Null),
        ],
        TypeId::INT32,
    );
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let owner = ParamOwner::Method(scale);
    let five = b.int(5);
    let call = b.bound_call(None, scale, vec![arg(owner, 0, five)]).unwrap();

    let reduced = reduce_all(&mut b, call, &ReduceOptions::default()).unwrap();
    assert_eq!(
        dump(b.arena(), b.pool(), reduced),
        "(call Host.Scale 5 2 (default Money) null)"
    );
}

#[test]
fn by_ref_property_argument_is_written_back() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let host = pool.define_class("Host", ClassOptions::default());
    let bump = pool.add_static_method(
        host,
        "Bump",
        vec![ParamDef::new("value", TypeId::INT32).by_ref()],
        TypeId::VOID,
    );
    let counter = pool.define_class("Counter", ClassOptions::default());
    let backing = pool.add_field(counter, "count", TypeId::INT32);
    let count = pool.add_property(counter, "Count", TypeId::INT32, Accessors::GetSet);
    let getter = pool.property(count).getter.unwrap();
    let setter = pool.property(count).setter.unwrap();
    let (c, root) = {
        let mut b = TreeBuilder::new(&mut arena, &mut pool);
        let c = b.new_var("c", counter);
        let cr = b.variable(c);
        let location = b.property(Some(cr), count).unwrap();
        let owner = ParamOwner::Method(bump);
        let call = b.bound_call(None, bump, vec![arg(owner, 0, location)]).unwrap();
        let root = reduce_all(&mut b, call, &ReduceOptions::default()).unwrap();
        assert_eq!(b.ty(root), TypeId::VOID);
        (c, root)
    };

    let mut m = Machine::new(&arena, &pool);
    m.host(bump, |m, _, args| {
        m.record("bump");
        if let [Value::Int(v)] = args {
            *v += 1;
        }
        Ok(Value::Void)
    });
    m.host(getter, move |m, receiver, _| {
        m.record("get");
        let Some(Value::Object(o)) = receiver else {
            return Err(Signal::Fault("receiver"));
        };
        let value = o.borrow().fields.get(&backing).cloned();
        Ok(value.unwrap_or(Value::Int(0)))
    });
    m.host(setter, move |m, receiver, args| {
        m.record("set");
        let (Some(Value::Object(o)), [value]) = (receiver, &*args) else {
            return Err(Signal::Fault("setter arguments"));
        };
        o.borrow_mut().fields.insert(backing, value.clone());
        Ok(Value::Void)
    });
    let instance = Value::object(counter);
    m.set(c, instance.clone());
    m.run(root).unwrap();
    assert_eq!(m.log, ["get", "bump", "set"]);
    let Value::Object(o) = instance else {
        panic!("expected an object");
    };
    assert_eq!(o.borrow().fields.get(&backing), Some(&Value::int(1)));
}

#[test]
fn by_ref_local_is_passed_directly() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let host = pool.define_class("Host", ClassOptions::default());
    let swap = pool.add_static_method(
        host,
        "Swap",
        vec![
            ParamDef::new("a", TypeId::INT32).by_ref(),
            ParamDef::new("b", TypeId::INT32).by_ref(),
        ],
        TypeId::VOID,
    );
    let (x, y, root) = {
        let mut b = TreeBuilder::new(&mut arena, &mut pool);
        let x = b.new_var("x", TypeId::INT32);
        let y = b.new_var("y", TypeId::INT32);
        let (xr, yr) = (b.variable(x), b.variable(y));
        let owner = ParamOwner::Method(swap);
        let call = b
            .bound_call(None, swap, vec![arg(owner, 1, yr), arg(owner, 0, xr)])
            .unwrap();
        let root = reduce_all(&mut b, call, &ReduceOptions::default()).unwrap();
        assert_eq!(dump(b.arena(), b.pool(), root), "(call Host.Swap x y)");
        (x, y, root)
    };

    let mut m = Machine::new(&arena, &pool);
    m.host(swap, |_, _, args| {
        args.swap(0, 1);
        Ok(Value::Void)
    });
    m.set(x, Value::int(1));
    m.set(y, Value::int(2));
    m.run(root).unwrap();
    assert_eq!((m.get(x), m.get(y)), (Value::int(2), Value::int(1)));
}

#[test]
fn bound_indexer_and_constructor() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let grid = pool.define_class("Grid", ClassOptions::default());
    let cell = pool.add_indexer(
        grid,
        "Item",
        vec![
            ParamDef::new("row", TypeId::INT32),
            ParamDef::new("col", TypeId::INT32),
        ],
        TypeId::INT32,
        Accessors::Get,
    );
    let make = pool.add_ctor(
        grid,
        vec![ParamDef::new("size", TypeId::INT32).optional(ConstValue::Int(3))],
    );
    let tag = tag_method(&mut pool, grid);
    let getter = pool.property(cell).getter.unwrap();
    let root = {
        let mut b = TreeBuilder::new(&mut arena, &mut pool);
        let created = b.bound_new(make, Vec::new()).unwrap();
        let owner = ParamOwner::Indexer(cell);
        let c = b.string("col");
        let col = b.call(None, tag, vec![c]).unwrap();
        let r = b.string("r");
        let row = b.call(None, tag, vec![r]).unwrap();
        let index = b
            .bound_index(created, cell, vec![arg(owner, 1, col), arg(owner, 0, row)])
            .unwrap();
        reduce_all(&mut b, index, &ReduceOptions::default()).unwrap()
    };

    let mut m = Machine::new(&arena, &pool);
    install_tag(&mut m, tag);
    m.host(getter, |_, receiver, args| {
        let Some(Value::Object(o)) = receiver else {
            return Err(Signal::Fault("receiver"));
        };
        let size = match o.borrow().args.first() {
            Some(Value::Int(size)) => *size,
            _ => return Err(Signal::Fault("constructor arguments")),
        };
        match &*args {
            [Value::Int(row), Value::Int(col)] => Ok(Value::Int(row * size + col)),
            _ => Err(Signal::Fault("indexer arguments")),
        }
    });
    // row = 1, col = 3 on a default-sized grid.
    assert_eq!(m.run(root).unwrap(), Value::int(6));
    assert_eq!(m.log, ["col", "r"]);
}

#[test]
fn bound_delegate_invocation() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let root = {
        let mut b = TreeBuilder::new(&mut arena, &mut pool);
        let x = b.new_var("x", TypeId::INT32);
        let y = b.new_var("y", TypeId::INT32);
        let (xr, yr) = (b.variable(x), b.variable(y));
        let body = b.binary(BinaryOp::Subtract, xr, yr).unwrap();
        let lambda = b.lambda(vec![x, y], body).unwrap();
        let invoke = b.pool().delegate_invoke(b.ty(lambda)).unwrap();
        let owner = ParamOwner::Method(invoke);
        let (ten, one) = (b.int(10), b.int(1));
        let call = b
            .bound_invoke(lambda, vec![arg(owner, 1, one), arg(owner, 0, ten)])
            .unwrap();
        reduce_all(&mut b, call, &ReduceOptions::default()).unwrap()
    };

    let mut m = Machine::new(&arena, &pool);
    assert_eq!(m.run(root).unwrap(), Value::int(9));
}

#[test]
fn unbound_required_parameter_is_reported() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let host = pool.define_class("Host", ClassOptions::default());
    let clamp = pool.add_static_method(
        host,
        "Clamp",
        vec![
            ParamDef::new("value", TypeId::INT32),
            ParamDef::new("min", TypeId::INT32),
        ],
        TypeId::INT32,
    );
    let other = pool.add_static_method(
        host,
        "Other",
        vec![ParamDef::new("v", TypeId::INT32)],
        TypeId::VOID,
    );
    // Nodes that never went through the validating factories.
    let five = arena.push(Node::new(Prim::Constant(ConstValue::Int(5)).into(), TypeId::INT32));
    let missing = arena.push(Node::new(
        NodeKind::Bound(BoundKind::Call {
            receiver: None,
            method: clamp,
            args: vec![arg(ParamOwner::Method(clamp), 0, five)],
        }),
        TypeId::INT32,
    ));
    let foreign = arena.push(Node::new(
        NodeKind::Bound(BoundKind::Call {
            receiver: None,
            method: clamp,
            args: vec![arg(ParamOwner::Method(other), 0, five)],
        }),
        TypeId::INT32,
    ));
    let mut b = TreeBuilder::new(&mut arena, &mut pool);

    assert_eq!(
        reduce_all(&mut b, missing, &ReduceOptions::default()).unwrap_err(),
        ReduceError::Build(BuildError::UnboundParameter {
            param: "min".to_owned(),
            member: "Clamp".to_owned(),
        })
    );
    assert_eq!(
        reduce_all(&mut b, foreign, &ReduceOptions::default()).unwrap_err(),
        ReduceError::Build(BuildError::ParameterNotOwned {
            param: "#0".to_owned(),
            member: "Clamp".to_owned(),
        })
    );
}
