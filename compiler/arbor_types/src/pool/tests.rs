use pretty_assertions::assert_eq;

use super::*;
use crate::ConstValue;

#[test]
fn primitives_occupy_fixed_slots() {
    let pool = TypePool::new();
    for kind in PrimitiveKind::ALL {
        assert_eq!(pool.name(kind.type_id()), kind.name());
    }
    assert_eq!(pool.def(TypeId::INT32).base, Some(TypeId::OBJECT));
    assert_eq!(pool.def(TypeId::OBJECT).base, None);
    assert!(pool.len() > TypeId::PRIMITIVE_COUNT as usize);
}

#[test]
fn lookup_by_name() {
    let mut pool = TypePool::new();
    let widget = pool.define_class("Widget", ClassOptions::default());
    assert_eq!(pool.lookup("Widget"), Some(widget));
    assert_eq!(pool.lookup("int"), Some(TypeId::INT32));
    assert_eq!(pool.lookup("Gadget"), None);
}

#[test]
fn property_accessors_are_generated() {
    let mut pool = TypePool::new();
    let widget = pool.define_class("Widget", ClassOptions::default());
    let size = pool.add_property(widget, "Size", TypeId::INT32, Accessors::GetSet);
    let def = pool.property(size).clone();

    let getter = def.getter.map(|m| pool.method(m).clone());
    let setter = def.setter.map(|m| pool.method(m).clone());
    assert_eq!(getter.as_ref().map(|g| g.name.as_str()), Some("get_Size"));
    assert_eq!(getter.map(|g| g.ret), Some(TypeId::INT32));
    let setter = setter.unwrap_or_else(|| panic!("setter missing"));
    assert_eq!(setter.name, "set_Size");
    assert_eq!(setter.params.len(), 1);
    assert_eq!(setter.ret, TypeId::VOID);

    // Accessors are not visible to name lookup.
    assert_eq!(pool.find_method(widget, "get_Size", 0), None);
    assert_eq!(pool.find_property(widget, "Size"), Some(size));
}

#[test]
fn read_only_property_has_no_setter() {
    let mut pool = TypePool::new();
    let widget = pool.define_class("Widget", ClassOptions::default());
    let p = pool.add_property(widget, "Id", TypeId::INT32, Accessors::Get);
    assert!(pool.property(p).getter.is_some());
    assert!(pool.property(p).setter.is_none());
}

#[test]
fn indexer_setter_takes_index_then_value() {
    let mut pool = TypePool::new();
    let list = pool.define_class("List", ClassOptions::default());
    let item = pool.add_indexer(
        list,
        "Item",
        vec![ParamDef::new("index", TypeId::INT32)],
        TypeId::STRING,
        Accessors::GetSet,
    );
    assert_eq!(pool.find_indexer(list), Some(item));
    assert_eq!(pool.find_property(list, "Item"), None);
    let setter = pool.property(item).setter.map(|m| pool.method(m).params.clone());
    let names: Vec<String> = setter
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["index".to_owned(), "value".to_owned()]);
    let param = pool.param(ParamRef::new(ParamOwner::Indexer(item), 0));
    assert_eq!(param.map(|p| p.ty), Some(TypeId::INT32));
}

#[test]
fn members_are_found_through_bases_and_interfaces() {
    let mut pool = TypePool::new();
    let shape = pool.define_interface("IShape", &[]);
    let area = pool.add_method(shape, "Area", Vec::new(), TypeId::DOUBLE);
    let base = pool.define_class(
        "Base",
        ClassOptions {
            interfaces: vec![shape],
            ..ClassOptions::default()
        },
    );
    let name = pool.add_field(base, "name", TypeId::STRING);
    let derived = pool.define_class(
        "Derived",
        ClassOptions {
            base: Some(base),
            ..ClassOptions::default()
        },
    );

    assert_eq!(pool.find_method(derived, "Area", 0), Some(area));
    assert_eq!(pool.find_method(derived, "Area", 1), None);
    assert_eq!(pool.find_field(derived, "name"), Some(name));
    assert_eq!(pool.all_interfaces(derived), vec![shape]);
    assert!(pool.find_method(derived, "ToString", 0).is_some());
}

#[test]
fn ctor_lookup_is_by_arity() {
    let mut pool = TypePool::new();
    let point = pool.define_struct("Point", &[]);
    let c0 = pool.add_ctor(point, Vec::new());
    let c2 = pool.add_ctor(
        point,
        vec![
            ParamDef::new("x", TypeId::INT32),
            ParamDef::new("y", TypeId::INT32),
        ],
    );
    assert_eq!(pool.find_ctor(point, 0), Some(c0));
    assert_eq!(pool.find_ctor(point, 2), Some(c2));
    assert_eq!(pool.find_ctor(point, 1), None);
}

#[test]
fn optional_and_by_ref_params() {
    let p = ParamDef::new("count", TypeId::INT32).optional(ConstValue::Int(3));
    assert!(p.is_optional());
    assert!(!p.kind.is_by_ref());
    let r = ParamDef::new("value", TypeId::INT32).by_ref();
    assert!(r.kind.is_by_ref());
    assert!(ParamDef::new("o", TypeId::INT32).out().kind.is_by_ref());
}

#[test]
fn enum_registration() {
    let mut pool = TypePool::new();
    let color = pool.define_enum("Color", TypeId::BYTE);
    assert!(pool.is_enum(color));
    assert!(pool.is_value_type(color));
    assert_eq!(pool.enum_underlying(color), Some(TypeId::BYTE));
}
