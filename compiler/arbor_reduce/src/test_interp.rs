//! Reference evaluator for primitive trees.
//!
//! Tests reduce a tree and run the result here, checking values, side
//! effects (through the host log) and thrown values. Only the `Prim` family
//! is understood: running an unreduced node is a fault.
//!
//! Library members are host functions keyed by `MethodId`. The well-known
//! ones (`String.Format`, `Monitor.Enter`, `IDisposable.Dispose`, ...) are
//! installed by [`Machine::new`]; tests add their own with
//! [`Machine::host`].

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::Once;

use arbor_ir::{
    BinaryOp, CallSite, CatchHandler, DynamicKind, LabelId, NodeArena, NodeId, NodeKind, Prim,
    UnaryOp, VarId,
};
use arbor_types::{ConstValue, FieldId, MethodId, PrimitiveKind, PropertyId, TypeId, TypePool};
use rustc_hash::FxHashMap;

static TRACING_INIT: Once = Once::new();

/// Route `tracing` output to the test writer when `RUST_LOG` is set.
pub(crate) fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer().with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

#[derive(Clone, Debug)]
pub(crate) enum Value {
    Void,
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Char(char),
    Str(Rc<str>),
    /// A value type seen through a reference type.
    Boxed(TypeId, Box<Value>),
    Object(Rc<RefCell<Object>>),
    Array(Rc<RefCell<Array>>),
    Lambda { params: Vec<VarId>, body: NodeId },
}

#[derive(Clone, Debug)]
pub(crate) struct Object {
    pub ty: TypeId,
    pub fields: FxHashMap<FieldId, Value>,
    /// Constructor arguments of objects without a host constructor.
    pub args: Vec<Value>,
}

#[derive(Clone, Debug)]
pub(crate) struct Array {
    pub ty: TypeId,
    pub dims: Vec<usize>,
    /// First valid index per dimension.
    pub lower: Vec<i128>,
    pub items: Vec<Value>,
}

impl Value {
    pub(crate) fn int(v: i64) -> Self {
        Value::Int(i128::from(v))
    }

    pub(crate) fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub(crate) fn object(ty: TypeId) -> Self {
        Value::Object(Rc::new(RefCell::new(Object {
            ty,
            fields: FxHashMap::default(),
            args: Vec::new(),
        })))
    }

    pub(crate) fn array(ty: TypeId, items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(Array {
            ty,
            dims: vec![items.len()],
            lower: vec![0],
            items,
        })))
    }

    fn truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    fn number(&self) -> Option<Number> {
        match self {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Char(c) => Some(Number::Int(i128::from(u32::from(*c)))),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::Boxed(_, inner) => inner.number(),
            _ => None,
        }
    }
}

/// Structural equality for assertions; objects and arrays compare by
/// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Boxed(t, a), Value::Boxed(u, b)) => t == u && a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Lambda { body: a, .. }, Value::Lambda { body: b, .. }) => a == b,
            _ => false,
        }
    }
}

#[derive(Copy, Clone)]
enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            #[expect(clippy::cast_precision_loss, reason = "evaluator mirrors runtime widening")]
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// Why evaluation stopped early.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Signal {
    Jump { label: LabelId, value: Value },
    Throw(Value),
    /// A runtime fault the evaluator does not model as a catchable value.
    Fault(&'static str),
}

pub(crate) type Eval = Result<Value, Signal>;

pub(crate) type HostFn = Rc<dyn Fn(&mut Machine<'_>, Option<Value>, &mut [Value]) -> Eval>;

enum Place {
    Var(VarId),
    Static(FieldId),
    Field(Rc<RefCell<Object>>, FieldId),
    Elem(Rc<RefCell<Array>>, usize),
    Prop {
        receiver: Option<Value>,
        property: PropertyId,
        args: Vec<Value>,
    },
}

const STEP_LIMIT: u64 = 1_000_000;

pub(crate) struct Machine<'a> {
    arena: &'a NodeArena,
    pool: &'a TypePool,
    vars: FxHashMap<VarId, Value>,
    statics: FxHashMap<FieldId, Value>,
    methods: FxHashMap<MethodId, HostFn>,
    exception: Option<Value>,
    steps: u64,
    /// Side effects recorded by host functions, in order.
    pub(crate) log: Vec<String>,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(arena: &'a NodeArena, pool: &'a TypePool) -> Self {
        init_tracing();
        let mut machine = Self {
            arena,
            pool,
            vars: FxHashMap::default(),
            statics: FxHashMap::default(),
            methods: FxHashMap::default(),
            exception: None,
            steps: 0,
            log: Vec::new(),
        };
        machine.install_library();
        machine
    }

    pub(crate) fn host(
        &mut self,
        method: MethodId,
        f: impl Fn(&mut Machine<'_>, Option<Value>, &mut [Value]) -> Eval + 'static,
    ) {
        self.methods.insert(method, Rc::new(f));
    }

    pub(crate) fn set(&mut self, var: VarId, value: Value) {
        self.vars.insert(var, value);
    }

    pub(crate) fn get(&self, var: VarId) -> Value {
        self.vars
            .get(&var)
            .cloned()
            .unwrap_or_else(|| self.default_of(self.arena.var(var).ty))
    }

    pub(crate) fn record(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
    }

    /// Evaluate a whole tree. A jump nothing caught is a fault.
    pub(crate) fn run(&mut self, root: NodeId) -> Eval {
        match self.eval(root) {
            Err(Signal::Jump { .. }) => Err(Signal::Fault("jump to a label outside the tree")),
            other => other,
        }
    }

    fn install_library(&mut self) {
        let wk = self.pool.well_known().clone();
        self.host(wk.string_format, |m, _, args| {
            let [Value::Str(format), items] = args else {
                return Err(Signal::Fault("String.Format arguments"));
            };
            let items = match items {
                Value::Array(a) => a.borrow().items.clone(),
                _ => Vec::new(),
            };
            Ok(Value::str(&m.composite_format(format, &items)?))
        });
        self.host(wk.string_equals, |_, _, args| match args {
            [Value::Null, Value::Null] => Ok(Value::Bool(true)),
            [Value::Str(a), Value::Str(b)] => Ok(Value::Bool(a == b)),
            _ => Ok(Value::Bool(false)),
        });
        self.host(wk.string_concat, |m, _, args| {
            let text: String = args.iter().map(|v| m.display(v)).collect();
            Ok(Value::str(&text))
        });
        self.host(wk.monitor_enter, |m, _, args| {
            m.record("enter");
            if let Some(taken) = args.get_mut(1) {
                *taken = Value::Bool(true);
            }
            Ok(Value::Void)
        });
        self.host(wk.monitor_exit, |m, _, _| {
            m.record("exit");
            Ok(Value::Void)
        });
        self.host(wk.dispose, |m, _, _| {
            m.record("dispose");
            Ok(Value::Void)
        });
        self.host(wk.array_get_lower_bound, |_, receiver, args| {
            let (lower, _) = dimension_bounds(receiver.as_ref(), args)?;
            Ok(Value::Int(lower))
        });
        self.host(wk.array_get_upper_bound, |_, receiver, args| {
            let (_, upper) = dimension_bounds(receiver.as_ref(), args)?;
            Ok(Value::Int(upper))
        });
    }

    // Evaluation

    pub(crate) fn eval(&mut self, id: NodeId) -> Eval {
        self.steps += 1;
        if self.steps > STEP_LIMIT {
            return Err(Signal::Fault("step limit"));
        }
        let arena = self.arena;
        let ty = arena.ty(id);
        let NodeKind::Prim(prim) = arena.kind(id) else {
            return Err(Signal::Fault("non-primitive node"));
        };
        match prim {
            Prim::Constant(c) => Ok(self.constant(c, ty)),
            Prim::Default => Ok(self.default_of(ty)),
            Prim::Variable(v) => Ok(self.get(*v)),
            Prim::Block { vars, exprs } => self.block(vars, exprs),
            Prim::Assign { target, value } => {
                let place = self.place(*target)?;
                let value = self.eval(*value)?;
                let value = self.copied(value);
                self.store(place, value.clone())?;
                Ok(value)
            }
            Prim::Binary {
                op,
                left,
                right,
                method,
            } => match method {
                Some(m) => {
                    let mut args = [self.eval(*left)?, self.eval(*right)?];
                    self.call_host(*m, None, &mut args)
                }
                None => self.binary(*op, *left, *right, ty),
            },
            Prim::Unary {
                op,
                operand,
                method,
            } => {
                let value = self.eval(*operand)?;
                match method {
                    Some(m) => self.call_host(*m, None, &mut [value]),
                    None => self.unary(*op, value, arena.ty(*operand), ty),
                }
            }
            Prim::Conditional {
                test,
                if_true,
                if_false,
            } => {
                if self.eval(*test)?.truthy() {
                    self.eval(*if_true)
                } else if let Some(f) = if_false {
                    self.eval(*f)
                } else {
                    Ok(Value::Void)
                }
            }
            Prim::Loop {
                body,
                break_label,
                continue_label,
            } => loop {
                match self.eval(*body) {
                    Ok(_) => {}
                    Err(Signal::Jump { label, value }) if Some(label) == *break_label => {
                        return Ok(value);
                    }
                    Err(Signal::Jump { label, .. }) if Some(label) == *continue_label => {}
                    Err(other) => return Err(other),
                }
            },
            Prim::Label { default, .. } => match default {
                Some(d) => self.eval(*d),
                None => Ok(Value::Void),
            },
            Prim::Goto { label, value, .. } => {
                let value = match value {
                    Some(v) => self.eval(*v)?,
                    None => Value::Void,
                };
                Err(Signal::Jump {
                    label: *label,
                    value,
                })
            }
            Prim::Field { .. } | Prim::ArrayIndex { .. } | Prim::Property { .. } => {
                let place = self.place(id)?;
                self.load(&place)
            }
            Prim::Call {
                receiver,
                method,
                args,
            } => self.call(*receiver, *method, args),
            Prim::Invoke { target, args } => {
                let target = self.eval(*target)?;
                self.invoke(target, args)
            }
            Prim::New { ctor, args } => {
                let values = args
                    .iter()
                    .map(|&a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.construct(self.pool.ctor(*ctor).declaring, values))
            }
            Prim::NewArrayInit { elements } => {
                let items = elements
                    .iter()
                    .map(|&e| self.eval(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(ty, items))
            }
            Prim::NewArrayBounds { bounds } => {
                let mut dims = Vec::with_capacity(bounds.len());
                for &b in bounds {
                    let Value::Int(n) = self.eval(b)? else {
                        return Err(Signal::Fault("array bound"));
                    };
                    dims.push(usize::try_from(n).map_err(|_| Signal::Fault("negative bound"))?);
                }
                let element = self.pool.array_element(ty).map_or(TypeId::OBJECT, |(e, _)| e);
                let items = vec![self.default_of(element); dims.iter().product()];
                let lower = vec![0; dims.len()];
                Ok(Value::Array(Rc::new(RefCell::new(Array {
                    ty,
                    dims,
                    lower,
                    items,
                }))))
            }
            Prim::Lambda { params, body } => Ok(Value::Lambda {
                params: params.clone(),
                body: *body,
            }),
            Prim::Try {
                body,
                handlers,
                finally,
                fault,
            } => self.try_block(*body, handlers, *finally, *fault),
            Prim::TypeIs {
                operand,
                test_type,
            } => {
                let value = self.eval(*operand)?;
                Ok(Value::Bool(self.is_instance(&value, *test_type, arena.ty(*operand))))
            }
            Prim::Throw { value } => match value {
                Some(v) => match self.eval(*v)? {
                    Value::Null => Err(Signal::Fault("null reference")),
                    thrown => Err(Signal::Throw(thrown)),
                },
                None => match self.exception.clone() {
                    Some(current) => Err(Signal::Throw(current)),
                    None => Err(Signal::Fault("rethrow outside a handler")),
                },
            },
            Prim::Dynamic { site, args } => {
                let by_ref: Vec<bool> = site.args.iter().map(|a| a.flags.is_by_ref()).collect();
                let (mut values, places) = self.arguments(args, &by_ref)?;
                let result = self.dynamic(site, &mut values)?;
                self.write_back(places, values)?;
                Ok(result)
            }
        }
    }

    /// Runs `exprs` in order. A jump to a label among them resumes after
    /// that label, which yields the jump's value.
    fn block(&mut self, vars: &[VarId], exprs: &[NodeId]) -> Eval {
        for &var in vars {
            let initial = self.default_of(self.arena.var(var).ty);
            self.vars.insert(var, initial);
        }
        let mut last = Value::Void;
        let mut i = 0;
        while let Some(&expr) = exprs.get(i) {
            match self.eval(expr) {
                Ok(value) => {
                    last = value;
                    i += 1;
                }
                Err(Signal::Jump { label, value }) => {
                    let Some(j) = exprs.iter().position(|&e| self.is_label(e, label)) else {
                        return Err(Signal::Jump { label, value });
                    };
                    last = match value {
                        Value::Void => self.eval(exprs[j])?,
                        value => value,
                    };
                    i = j + 1;
                }
                Err(other) => return Err(other),
            }
        }
        Ok(last)
    }

    fn is_label(&self, id: NodeId, label: LabelId) -> bool {
        matches!(self.arena.kind(id), NodeKind::Prim(Prim::Label { label: l, .. }) if *l == label)
    }

    fn try_block(
        &mut self,
        body: NodeId,
        handlers: &[CatchHandler],
        finally: Option<NodeId>,
        fault: Option<NodeId>,
    ) -> Eval {
        let mut result = self.eval(body);
        if let Err(Signal::Throw(thrown)) = &result {
            let thrown = thrown.clone();
            for handler in handlers {
                if !self.is_instance(&thrown, handler.test_type, TypeId::OBJECT) {
                    continue;
                }
                if let Some(var) = handler.var {
                    self.vars.insert(var, thrown.clone());
                }
                if let Some(filter) = handler.filter {
                    if !self.eval(filter)?.truthy() {
                        continue;
                    }
                }
                let outer = self.exception.replace(thrown.clone());
                result = self.eval(handler.body);
                self.exception = outer;
                break;
            }
        }
        if result.is_err() {
            if let Some(fault) = fault {
                self.eval(fault)?;
            }
        }
        if let Some(finally) = finally {
            self.eval(finally)?;
        }
        result
    }

    // Locations

    fn place(&mut self, target: NodeId) -> Result<Place, Signal> {
        let arena = self.arena;
        match arena.kind(target) {
            NodeKind::Prim(Prim::Variable(v)) => Ok(Place::Var(*v)),
            NodeKind::Prim(Prim::Field {
                receiver: None,
                field,
            }) => Ok(Place::Static(*field)),
            NodeKind::Prim(Prim::Field {
                receiver: Some(r),
                field,
            }) => match self.eval(*r)? {
                Value::Object(o) => Ok(Place::Field(o, *field)),
                Value::Boxed(_, inner) => match *inner {
                    Value::Object(o) => Ok(Place::Field(o, *field)),
                    _ => Err(Signal::Fault("field of a non-object")),
                },
                Value::Null => Err(Signal::Fault("null reference")),
                _ => Err(Signal::Fault("field of a non-object")),
            },
            NodeKind::Prim(Prim::ArrayIndex { array, indices }) => {
                let Value::Array(a) = self.eval(*array)? else {
                    return Err(Signal::Fault("null reference"));
                };
                let mut flat = 0usize;
                for (d, &index) in indices.iter().enumerate() {
                    let Value::Int(i) = self.eval(index)? else {
                        return Err(Signal::Fault("array index"));
                    };
                    let (extent, lower) = {
                        let a = a.borrow();
                        (
                            a.dims.get(d).copied().unwrap_or(0),
                            a.lower.get(d).copied().unwrap_or(0),
                        )
                    };
                    let i = usize::try_from(i - lower)
                        .ok()
                        .filter(|&i| i < extent)
                        .ok_or(Signal::Fault("index out of range"))?;
                    flat = flat * extent + i;
                }
                Ok(Place::Elem(a, flat))
            }
            NodeKind::Prim(Prim::Property {
                receiver,
                property,
                args,
            }) => {
                let receiver = match receiver {
                    Some(r) => Some(self.eval(*r)?),
                    None => None,
                };
                let args = args
                    .iter()
                    .map(|&a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Place::Prop {
                    receiver,
                    property: *property,
                    args,
                })
            }
            _ => Err(Signal::Fault("not a location")),
        }
    }

    fn load(&mut self, place: &Place) -> Eval {
        Ok(match place {
            Place::Var(v) => self.get(*v),
            Place::Static(f) => match self.statics.get(f) {
                Some(v) => v.clone(),
                None => self.default_of(self.pool.field(*f).ty),
            },
            Place::Field(o, f) => match o.borrow().fields.get(f) {
                Some(v) => v.clone(),
                None => self.default_of(self.pool.field(*f).ty),
            },
            Place::Elem(a, i) => a.borrow().items.get(*i).cloned().unwrap_or(Value::Null),
            Place::Prop {
                receiver,
                property,
                args,
            } => return self.get_property(receiver.clone(), *property, args.clone()),
        })
    }

    fn store(&mut self, place: Place, value: Value) -> Result<(), Signal> {
        match place {
            Place::Var(v) => {
                self.vars.insert(v, value);
            }
            Place::Static(f) => {
                self.statics.insert(f, value);
            }
            Place::Field(o, f) => {
                o.borrow_mut().fields.insert(f, value);
            }
            Place::Elem(a, i) => {
                if let Some(slot) = a.borrow_mut().items.get_mut(i) {
                    *slot = value;
                }
            }
            Place::Prop {
                receiver,
                property,
                mut args,
            } => {
                let Some(setter) = self.pool.property(property).setter else {
                    return Err(Signal::Fault("property without a setter"));
                };
                args.push(value);
                self.call_host(setter, receiver, &mut args)?;
            }
        }
        Ok(())
    }

    fn get_property(
        &mut self,
        receiver: Option<Value>,
        property: PropertyId,
        mut args: Vec<Value>,
    ) -> Eval {
        let wk = self.pool.well_known();
        if property == wk.string_length {
            let Some(Value::Str(s)) = receiver else {
                return Err(Signal::Fault("null reference"));
            };
            return Ok(Value::Int(s.chars().count() as i128));
        }
        if property == wk.string_chars {
            let (Some(Value::Str(s)), [Value::Int(i)]) = (receiver, args.as_slice()) else {
                return Err(Signal::Fault("string indexer arguments"));
            };
            return usize::try_from(*i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(Value::Char)
                .ok_or(Signal::Fault("index out of range"));
        }
        if property == wk.array_length {
            let Some(Value::Array(a)) = receiver else {
                return Err(Signal::Fault("null reference"));
            };
            let len = a.borrow().items.len();
            return Ok(Value::Int(len as i128));
        }
        let Some(getter) = self.pool.property(property).getter else {
            return Err(Signal::Fault("property without a getter"));
        };
        self.call_host(getter, receiver, &mut args)
    }

    // Calls

    fn call(&mut self, receiver: Option<NodeId>, method: MethodId, args: &[NodeId]) -> Eval {
        let receiver = match receiver {
            Some(r) => match self.eval(r)? {
                Value::Null => return Err(Signal::Fault("null reference")),
                value => Some(value),
            },
            None => None,
        };
        let params = &self.pool.method(method).params;
        let by_ref: Vec<bool> = (0..args.len())
            .map(|i| params.get(i).is_some_and(|p| p.kind.is_by_ref()))
            .collect();
        let (mut values, places) = self.arguments(args, &by_ref)?;
        let result = self.call_host(method, receiver, &mut values)?;
        self.write_back(places, values)?;
        Ok(result)
    }

    fn invoke(&mut self, target: Value, args: &[NodeId]) -> Eval {
        let Value::Lambda { params, body } = target else {
            return Err(Signal::Fault("invoke of a non-lambda"));
        };
        let by_ref: Vec<bool> = params.iter().map(|&p| self.arena.var(p).by_ref).collect();
        let (values, places) = self.arguments(args, &by_ref)?;
        let saved: Vec<Option<Value>> = params.iter().map(|p| self.vars.get(p).cloned()).collect();
        for (&param, value) in params.iter().zip(values) {
            self.vars.insert(param, value);
        }
        let result = match self.eval(body) {
            Err(Signal::Jump { .. }) => Err(Signal::Fault("jump out of a lambda")),
            other => other,
        };
        let outputs: Vec<Value> = params.iter().map(|&p| self.get(p)).collect();
        for (&param, old) in params.iter().zip(saved) {
            match old {
                Some(old) => self.vars.insert(param, old),
                None => self.vars.remove(&param),
            };
        }
        let result = result?;
        self.write_back(places, outputs)?;
        Ok(result)
    }

    #[expect(clippy::type_complexity, reason = "values and their write-back places")]
    fn arguments(
        &mut self,
        args: &[NodeId],
        by_ref: &[bool],
    ) -> Result<(Vec<Value>, Vec<Option<Place>>), Signal> {
        let mut values = Vec::with_capacity(args.len());
        let mut places = Vec::with_capacity(args.len());
        for (i, &arg) in args.iter().enumerate() {
            if by_ref.get(i).copied().unwrap_or(false) {
                let place = self.place(arg)?;
                values.push(self.load(&place)?);
                places.push(Some(place));
            } else {
                let value = self.eval(arg)?;
                values.push(self.copied(value));
                places.push(None);
            }
        }
        Ok((values, places))
    }

    fn write_back(&mut self, places: Vec<Option<Place>>, values: Vec<Value>) -> Result<(), Signal> {
        for (place, value) in places.into_iter().zip(values) {
            if let Some(place) = place {
                self.store(place, value)?;
            }
        }
        Ok(())
    }

    pub(crate) fn call_host(
        &mut self,
        method: MethodId,
        receiver: Option<Value>,
        args: &mut [Value],
    ) -> Eval {
        let Some(f) = self.methods.get(&method).cloned() else {
            tracing::warn!(method = %self.pool.method(method).name, "no host function");
            return Err(Signal::Fault("no host function"));
        };
        f(self, receiver, args)
    }

    /// A fresh instance. Tuple fields are filled from the arguments; other
    /// types keep them for inspection.
    fn construct(&self, ty: TypeId, args: Vec<Value>) -> Value {
        let value = Value::object(ty);
        if let Value::Object(o) = &value {
            let mut o = o.borrow_mut();
            if self.pool.tuple_elements(ty).is_some() {
                for (i, arg) in args.into_iter().enumerate() {
                    if let Some(field) = self.pool.find_field(ty, &format!("Item{}", i + 1)) {
                        o.fields.insert(field, arg);
                    }
                }
            } else {
                o.args = args;
            }
        }
        value
    }

    fn dynamic(&mut self, site: &CallSite, values: &mut [Value]) -> Eval {
        match (&site.kind, values) {
            (DynamicKind::Binary(op), [left, right]) => {
                self.apply_binary(*op, left.clone(), right.clone(), None)
            }
            (DynamicKind::Unary(op), [operand]) => {
                self.unary(*op, operand.clone(), TypeId::OBJECT, TypeId::OBJECT)
            }
            (DynamicKind::Convert, [operand]) => Ok(operand.clone()),
            (DynamicKind::GetMember { name }, [receiver]) => {
                let (object, field) = self.member(receiver, name)?;
                let place = Place::Field(object, field);
                self.load(&place)
            }
            (DynamicKind::SetMember { name }, [receiver, value]) => {
                let (object, field) = self.member(receiver, name)?;
                self.store(Place::Field(object, field), value.clone())?;
                Ok(value.clone())
            }
            (DynamicKind::GetIndex, [Value::Array(a), Value::Int(i)]) => {
                let i = usize::try_from(*i).map_err(|_| Signal::Fault("index out of range"))?;
                a.borrow()
                    .items
                    .get(i)
                    .cloned()
                    .ok_or(Signal::Fault("index out of range"))
            }
            (DynamicKind::SetIndex, [Value::Array(a), Value::Int(i), value]) => {
                let i = usize::try_from(*i).map_err(|_| Signal::Fault("index out of range"))?;
                if let Some(slot) = a.borrow_mut().items.get_mut(i) {
                    *slot = value.clone();
                }
                Ok(value.clone())
            }
            (DynamicKind::InvokeMember { name, .. }, [receiver, rest @ ..]) => {
                let ty = match receiver {
                    Value::Object(o) => o.borrow().ty,
                    _ => return Err(Signal::Fault("dynamic call on a non-object")),
                };
                let Some(method) = self.pool.find_method(ty, name, rest.len()) else {
                    return Err(Signal::Fault("no such dynamic member"));
                };
                self.call_host(method, Some(receiver.clone()), rest)
            }
            _ => Err(Signal::Fault("unsupported dynamic site")),
        }
    }

    fn member(&self, receiver: &Value, name: &str) -> Result<(Rc<RefCell<Object>>, FieldId), Signal> {
        let Value::Object(o) = receiver else {
            return Err(Signal::Fault("dynamic member of a non-object"));
        };
        let ty = o.borrow().ty;
        let field = self
            .pool
            .find_field(ty, name)
            .ok_or(Signal::Fault("no such dynamic member"))?;
        Ok((Rc::clone(o), field))
    }

    // Operators

    fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId, ty: TypeId) -> Eval {
        match op {
            BinaryOp::AndAlso => {
                if !self.eval(left)?.truthy() {
                    return Ok(Value::Bool(false));
                }
                self.eval(right)
            }
            BinaryOp::OrElse => {
                if self.eval(left)?.truthy() {
                    return Ok(Value::Bool(true));
                }
                self.eval(right)
            }
            BinaryOp::Coalesce => match self.eval(left)? {
                Value::Null => self.eval(right),
                value => Ok(value),
            },
            _ => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                self.apply_binary(op, l, r, Some(ty))
            }
        }
    }

    /// `ty` is the static result type; `None` for late-bound operations,
    /// which do not wrap.
    fn apply_binary(&mut self, op: BinaryOp, l: Value, r: Value, ty: Option<TypeId>) -> Eval {
        if op == BinaryOp::Equal || op == BinaryOp::NotEqual {
            let equal = self.values_equal(&l, &r);
            return Ok(Value::Bool(equal == (op == BinaryOp::Equal)));
        }
        if op.is_comparison() {
            let (Some(a), Some(b)) = (l.number(), r.number()) else {
                return Ok(Value::Bool(false));
            };
            let ordering = match (a, b) {
                (Number::Int(a), Number::Int(b)) => a.partial_cmp(&b),
                (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            return Ok(Value::Bool(match op {
                BinaryOp::LessThan => ordering.is_lt(),
                BinaryOp::LessThanOrEqual => ordering.is_le(),
                BinaryOp::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            }));
        }
        if matches!(l, Value::Null) || matches!(r, Value::Null) {
            return Ok(Value::Null);
        }
        if let (Value::Bool(a), Value::Bool(b)) = (&l, &r) {
            return match op {
                BinaryOp::And => Ok(Value::Bool(*a & *b)),
                BinaryOp::Or => Ok(Value::Bool(*a | *b)),
                BinaryOp::ExclusiveOr => Ok(Value::Bool(*a ^ *b)),
                _ => Err(Signal::Fault("operator on bool")),
            };
        }
        let (Some(a), Some(b)) = (l.number(), r.number()) else {
            return Err(Signal::Fault("operator on non-numbers"));
        };
        let kind = ty.and_then(|t| self.arithmetic_kind(t));
        match (a, b) {
            (Number::Int(a), Number::Int(b)) if !kind.is_some_and(PrimitiveKind::is_floating) => {
                let raw = match op {
                    BinaryOp::Add | BinaryOp::AddChecked => a + b,
                    BinaryOp::Subtract | BinaryOp::SubtractChecked => a - b,
                    BinaryOp::Multiply | BinaryOp::MultiplyChecked => a * b,
                    BinaryOp::Divide | BinaryOp::Modulo if b == 0 => {
                        return Err(Signal::Fault("divide by zero"))
                    }
                    BinaryOp::Divide => a / b,
                    BinaryOp::Modulo => a % b,
                    BinaryOp::And => a & b,
                    BinaryOp::Or => a | b,
                    BinaryOp::ExclusiveOr => a ^ b,
                    BinaryOp::LeftShift => a << (b & 63),
                    BinaryOp::RightShift => a >> (b & 63),
                    _ => return Err(Signal::Fault("unsupported operator")),
                };
                match kind {
                    Some(kind) => fit(raw, kind, op.is_checked()).map(Value::Int),
                    None => Ok(Value::Int(raw)),
                }
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                Ok(Value::Float(match op {
                    BinaryOp::Add | BinaryOp::AddChecked => a + b,
                    BinaryOp::Subtract | BinaryOp::SubtractChecked => a - b,
                    BinaryOp::Multiply | BinaryOp::MultiplyChecked => a * b,
                    BinaryOp::Divide => a / b,
                    BinaryOp::Modulo => a % b,
                    _ => return Err(Signal::Fault("unsupported operator")),
                }))
            }
        }
    }

    fn unary(&mut self, op: UnaryOp, value: Value, from: TypeId, ty: TypeId) -> Eval {
        if matches!(value, Value::Null)
            && !matches!(op, UnaryOp::Convert | UnaryOp::ConvertChecked | UnaryOp::TypeAs)
        {
            return match op {
                UnaryOp::Unbox | UnaryOp::ArrayLength => Err(Signal::Fault("null reference")),
                _ => Ok(Value::Null),
            };
        }
        let kind = self.arithmetic_kind(ty);
        match op {
            UnaryOp::Not => match value {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                Value::Int(i) => Ok(Value::Int(!i)),
                _ => Err(Signal::Fault("not on a non-bool")),
            },
            UnaryOp::IsTrue => Ok(Value::Bool(value.truthy())),
            UnaryOp::IsFalse => Ok(Value::Bool(matches!(value, Value::Bool(false)))),
            UnaryOp::Plus => Ok(value),
            UnaryOp::Negate | UnaryOp::NegateChecked => match value.number() {
                Some(Number::Int(i)) => match kind {
                    Some(k) => fit(-i, k, op.is_checked()).map(Value::Int),
                    None => Ok(Value::Int(-i)),
                },
                Some(Number::Float(f)) => Ok(Value::Float(-f)),
                None => Err(Signal::Fault("negate on a non-number")),
            },
            UnaryOp::OnesComplement => match value.number() {
                Some(Number::Int(i)) => match kind {
                    Some(k) => fit(!i, k, false).map(Value::Int),
                    None => Ok(Value::Int(!i)),
                },
                _ => Err(Signal::Fault("complement on a non-integer")),
            },
            UnaryOp::Increment | UnaryOp::Decrement => {
                let step = if op == UnaryOp::Increment { 1 } else { -1 };
                match value.number() {
                    Some(Number::Int(i)) => match kind {
                        Some(k) => fit(i + step, k, false).map(|v| retype(v, k)),
                        None => Ok(Value::Int(i + step)),
                    },
                    #[expect(clippy::cast_precision_loss, reason = "step is one")]
                    Some(Number::Float(f)) => Ok(Value::Float(f + step as f64)),
                    None => Err(Signal::Fault("increment on a non-number")),
                }
            }
            UnaryOp::Convert | UnaryOp::ConvertChecked => {
                self.convert(value, from, ty, op == UnaryOp::ConvertChecked)
            }
            UnaryOp::TypeAs => {
                let target = self.pool.non_nullable(ty);
                if !self.is_instance(&value, target, from) {
                    return Ok(Value::Null);
                }
                match value {
                    Value::Boxed(_, inner) if self.pool.is_value_type(target) => Ok(*inner),
                    other => Ok(other),
                }
            }
            UnaryOp::Unbox => match value {
                Value::Boxed(_, inner) => Ok(*inner),
                other => Ok(other),
            },
            UnaryOp::ArrayLength => match value {
                Value::Array(a) => Ok(Value::Int(a.borrow().items.len() as i128)),
                _ => Err(Signal::Fault("length of a non-array")),
            },
        }
    }

    fn convert(&self, value: Value, from: TypeId, to: TypeId, checked: bool) -> Eval {
        let pool = self.pool;
        if matches!(value, Value::Null) {
            return if pool.can_be_null(to) {
                Ok(Value::Null)
            } else {
                Err(Signal::Fault("null value"))
            };
        }
        let target = pool.non_nullable(to);
        if pool.is_reference_type(target) {
            let source = pool.non_nullable(from);
            return Ok(match value {
                Value::Boxed(..) | Value::Str(_) | Value::Array(_) | Value::Lambda { .. } => value,
                Value::Object(ref o) if !pool.is_value_type(o.borrow().ty) => value,
                other if pool.is_value_type(source) => Value::Boxed(source, Box::new(other)),
                other => other,
            });
        }
        let value = match value {
            Value::Boxed(_, inner) => *inner,
            other => other,
        };
        let Some(kind) = self.arithmetic_kind(target) else {
            return Ok(value);
        };
        if kind == PrimitiveKind::Bool {
            return Ok(value);
        }
        match (value.number(), kind) {
            (Some(n), k) if k.is_floating() || k == PrimitiveKind::Decimal => {
                Ok(Value::Float(n.as_f64()))
            }
            (Some(n), k) => {
                let raw = match n {
                    Number::Int(i) => i,
                    #[expect(clippy::cast_possible_truncation, reason = "float to integer truncates")]
                    Number::Float(f) => {
                        if checked && !f.is_finite() {
                            return Err(Signal::Fault("overflow"));
                        }
                        f.trunc() as i128
                    }
                };
                fit(raw, k, checked).map(|v| retype(v, k))
            }
            (None, _) => Ok(value),
        }
    }

    /// The primitive kind arithmetic on `ty` works in: enums use their
    /// underlying type.
    fn arithmetic_kind(&self, ty: TypeId) -> Option<PrimitiveKind> {
        let base = self.pool.non_nullable(ty);
        let base = self.pool.enum_underlying(base).unwrap_or(base);
        base.primitive()
    }

    // Runtime types

    pub(crate) fn is_instance(&self, value: &Value, ty: TypeId, static_ty: TypeId) -> bool {
        let pool = self.pool;
        let target = pool.non_nullable(ty);
        let reference_match = |actual: TypeId| {
            actual == target || (pool.is_reference_type(target) && pool.is_implicitly_convertible(target, actual))
        };
        match value {
            Value::Void | Value::Null => false,
            Value::Boxed(actual, _) => reference_match(*actual),
            Value::Object(o) => reference_match(o.borrow().ty),
            Value::Array(a) => reference_match(a.borrow().ty),
            Value::Str(_) => reference_match(TypeId::STRING),
            Value::Lambda { .. } => target == TypeId::OBJECT,
            _ => reference_match(pool.non_nullable(static_ty)),
        }
    }

    fn values_equal(&self, l: &Value, r: &Value) -> bool {
        match (l, r) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Boxed(..), _) | (_, Value::Boxed(..)) => false,
            _ => match (l.number(), r.number()) {
                (Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
                #[expect(clippy::float_cmp, reason = "runtime equality is exact")]
                (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
                _ => false,
            },
        }
    }

    fn constant(&self, c: &ConstValue, ty: TypeId) -> Value {
        let value = match c {
            ConstValue::Null => return Value::Null,
            ConstValue::Bool(b) => Value::Bool(*b),
            ConstValue::Char(ch) => Value::Char(*ch),
            ConstValue::Int(i) => {
                if self.arithmetic_kind(ty).is_some_and(|k| k.is_floating() || k == PrimitiveKind::Decimal) {
                    #[expect(clippy::cast_precision_loss, reason = "constant widening")]
                    Value::Float(*i as f64)
                } else {
                    Value::Int(i128::from(*i))
                }
            }
            ConstValue::UInt(u) => Value::Int(i128::from(*u)),
            ConstValue::Float(bits) => Value::Float(f64::from_bits(*bits)),
            ConstValue::Str(s) => return Value::str(s),
        };
        if self.pool.is_reference_type(ty) {
            Value::Boxed(c.natural_type(), Box::new(value))
        } else {
            value
        }
    }

    pub(crate) fn default_of(&self, ty: TypeId) -> Value {
        let pool = self.pool;
        if pool.can_be_null(ty) {
            return Value::Null;
        }
        match self.arithmetic_kind(ty) {
            Some(PrimitiveKind::Bool) => Value::Bool(false),
            Some(PrimitiveKind::Char) => Value::Char('\0'),
            Some(k) if k.is_floating() || k == PrimitiveKind::Decimal => Value::Float(0.0),
            Some(k) if k.is_integral() => Value::Int(0),
            Some(PrimitiveKind::Void) => Value::Void,
            _ => Value::object(ty),
        }
    }

    /// Value-type objects are copied on assignment.
    fn copied(&self, value: Value) -> Value {
        match value {
            Value::Object(o) if self.pool.is_value_type(o.borrow().ty) => {
                let copy = o.borrow().clone();
                Value::Object(Rc::new(RefCell::new(copy)))
            }
            other => other,
        }
    }

    // Formatting

    pub(crate) fn display(&self, value: &Value) -> String {
        match value {
            Value::Void | Value::Null => String::new(),
            Value::Bool(true) => "True".to_owned(),
            Value::Bool(false) => "False".to_owned(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Str(s) => s.to_string(),
            Value::Boxed(_, inner) => self.display(inner),
            Value::Object(o) => self.pool.name(o.borrow().ty).to_owned(),
            Value::Array(a) => self.pool.name(a.borrow().ty).to_owned(),
            Value::Lambda { .. } => "lambda".to_owned(),
        }
    }

    /// `{index[,alignment][:format]}` items with `{{`/`}}` escapes. Formats
    /// understood: `D<n>` zero padding and `X`/`x` hexadecimal.
    fn composite_format(&self, format: &str, items: &[Value]) -> Result<String, Signal> {
        let mut out = String::new();
        let mut chars = format.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut spec = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        spec.push(c);
                    }
                    let (head, format) = match spec.split_once(':') {
                        Some((head, format)) => (head, Some(format)),
                        None => (spec.as_str(), None),
                    };
                    let (index, alignment) = match head.split_once(',') {
                        Some((index, alignment)) => (index, alignment.trim().parse::<i64>().ok()),
                        None => (head, None),
                    };
                    let index: usize = index
                        .trim()
                        .parse()
                        .map_err(|_| Signal::Fault("format item index"))?;
                    let item = items.get(index).ok_or(Signal::Fault("format item index"))?;
                    let text = self.format_item(item, format);
                    let width = alignment.map_or(0, |a| usize::try_from(a.unsigned_abs()).unwrap_or(0));
                    if alignment.is_some_and(|a| a < 0) {
                        let _ = write!(out, "{text:<width$}");
                    } else {
                        let _ = write!(out, "{text:>width$}");
                    }
                }
                c => out.push(c),
            }
        }
        Ok(out)
    }

    fn format_item(&self, item: &Value, format: Option<&str>) -> String {
        let number = match item {
            Value::Boxed(_, inner) => match **inner {
                Value::Int(i) => Some(i),
                _ => None,
            },
            Value::Int(i) => Some(*i),
            _ => None,
        };
        match (format, number) {
            (Some(f), Some(n)) if f.starts_with('D') => {
                let width: usize = f[1..].parse().unwrap_or(0);
                format!("{n:0width$}")
            }
            (Some("X"), Some(n)) => format!("{n:X}"),
            (Some("x"), Some(n)) => format!("{n:x}"),
            _ => self.display(item),
        }
    }
}

/// Lower and upper index of the requested dimension of an array receiver.
fn dimension_bounds(receiver: Option<&Value>, args: &[Value]) -> Result<(i128, i128), Signal> {
    let (Some(Value::Array(a)), [Value::Int(d)]) = (receiver, args) else {
        return Err(Signal::Fault("array bound arguments"));
    };
    let a = a.borrow();
    let d = usize::try_from(*d).map_err(|_| Signal::Fault("index out of range"))?;
    let (Some(&extent), Some(&lower)) = (a.dims.get(d), a.lower.get(d)) else {
        return Err(Signal::Fault("index out of range"));
    };
    let extent = i128::try_from(extent).map_err(|_| Signal::Fault("array extent"))?;
    Ok((lower, lower + extent - 1))
}

/// `raw` in the range of `kind`: wrapped, or a fault when `checked`.
fn fit(raw: i128, kind: PrimitiveKind, checked: bool) -> Result<i128, Signal> {
    let Some((min, max)) = kind.int_range() else {
        return Ok(raw);
    };
    if (min..=max).contains(&raw) {
        return Ok(raw);
    }
    if checked {
        return Err(Signal::Fault("overflow"));
    }
    let width = max - min + 1;
    Ok((raw - min).rem_euclid(width) + min)
}

fn retype(raw: i128, kind: PrimitiveKind) -> Value {
    if kind == PrimitiveKind::Char {
        u32::try_from(raw)
            .ok()
            .and_then(char::from_u32)
            .map_or(Value::Int(raw), Value::Char)
    } else {
        Value::Int(raw)
    }
}
