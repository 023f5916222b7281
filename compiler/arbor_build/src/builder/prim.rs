//! Factories for the primitive target set.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{BinaryOp, CallSite, CatchHandler, GotoKind, LabelId, NodeId, Prim, UnaryOp, VarId};
use arbor_types::{
    ConstValue, CtorId, FieldId, MethodId, ParamDef, ParamKind, PropertyId, TypeId,
};

use super::{rejected, TreeBuilder};

/// Inputs of a `try` node.
#[derive(Clone, Debug)]
pub struct TryOptions {
    pub body: NodeId,
    pub handlers: Vec<CatchHandler>,
    pub finally: Option<NodeId>,
    pub fault: Option<NodeId>,
}

impl TryOptions {
    pub fn new(body: NodeId) -> Self {
        Self {
            body,
            handlers: Vec::new(),
            finally: None,
            fault: None,
        }
    }

    #[must_use]
    pub fn catch(mut self, handler: CatchHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    #[must_use]
    pub fn finally(mut self, finally: NodeId) -> Self {
        self.finally = Some(finally);
        self
    }
}

impl TreeBuilder<'_> {
    // Leaves

    pub fn constant(&mut self, value: ConstValue, ty: TypeId) -> BuildResult<NodeId> {
        self.ensure_node_type(ty)?;
        if !self.pool.const_fits(&value, ty) {
            return Err(rejected(BuildError::IncompatibleTypes {
                context: "constant",
                expected: self.name(ty),
                found: self.name(value.natural_type()),
            }));
        }
        Ok(self.push(Prim::Constant(value), ty))
    }

    pub fn int(&mut self, value: i32) -> NodeId {
        self.push(Prim::Constant(ConstValue::Int(i64::from(value))), TypeId::INT32)
    }

    pub fn bool(&mut self, value: bool) -> NodeId {
        self.push(Prim::Constant(ConstValue::Bool(value)), TypeId::BOOL)
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.push(Prim::Constant(ConstValue::str(value)), TypeId::STRING)
    }

    pub fn null(&mut self, ty: TypeId) -> BuildResult<NodeId> {
        self.constant(ConstValue::Null, ty)
    }

    pub fn default(&mut self, ty: TypeId) -> BuildResult<NodeId> {
        self.ensure_node_type(ty)?;
        Ok(self.push(Prim::Default, ty))
    }

    /// The empty statement.
    pub fn empty(&mut self) -> NodeId {
        self.push(Prim::Default, TypeId::VOID)
    }

    pub fn variable(&mut self, var: VarId) -> NodeId {
        let ty = self.var_ty(var);
        self.push(Prim::Variable(var), ty)
    }

    // Sequencing

    /// A block typed by its last expression (`void` when empty).
    pub fn block(&mut self, vars: Vec<VarId>, exprs: Vec<NodeId>) -> BuildResult<NodeId> {
        let ty = exprs.last().map_or(TypeId::VOID, |&last| self.ty(last));
        self.block_typed(vars, exprs, ty)
    }

    /// A block with an explicit type. A `void` block discards the value of
    /// its last expression.
    pub fn block_typed(
        &mut self,
        vars: Vec<VarId>,
        exprs: Vec<NodeId>,
        ty: TypeId,
    ) -> BuildResult<NodeId> {
        self.ensure_node_type(ty)?;
        self.ensure_distinct_vars(&vars)?;
        match exprs.last() {
            None if !ty.is_void() => {
                return Err(rejected(BuildError::EmptyNonVoidBlock { ty: self.name(ty) }));
            }
            Some(&last) if !ty.is_void() => self.ensure_converts(ty, last, "block result")?,
            _ => {}
        }
        Ok(self.push(Prim::Block { vars, exprs }, ty))
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> BuildResult<NodeId> {
        let shape = self.target_shape(target, false, "assignment target")?;
        if shape == super::checks::TargetShape::Dynamic {
            return Err(rejected(BuildError::NotWritable {
                context: "late-bound member in a plain assignment",
            }));
        }
        let ty = self.ty(target);
        self.ensure_converts(ty, value, "assignment")?;
        Ok(self.push(Prim::Assign { target, value }, ty))
    }

    // Operators

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> BuildResult<NodeId> {
        self.ensure_value(left, "left operand")?;
        self.ensure_value(right, "right operand")?;
        let (lt, rt) = (self.ty(left), self.ty(right));
        let Some(ty) = self.binary_type(op, lt, rt) else {
            return Err(self.operator_not_defined(op.symbol(), &[lt, rt]));
        };
        Ok(self.push(
            Prim::Binary {
                op,
                left,
                right,
                method: None,
            },
            ty,
        ))
    }

    /// A binary operator implemented by a static two-parameter method.
    pub fn binary_with(
        &mut self,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        method: MethodId,
    ) -> BuildResult<NodeId> {
        let ty = self.operator_method(method, &[self.ty(left), self.ty(right)])?;
        if op.is_short_circuit() && ty != TypeId::BOOL {
            return Err(rejected(BuildError::MethodSignatureMismatch {
                method: self.pool.method(method).name.clone(),
                reason: "short-circuit operators must return `bool`".to_owned(),
            }));
        }
        Ok(self.push(
            Prim::Binary {
                op,
                left,
                right,
                method: Some(method),
            },
            ty,
        ))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> BuildResult<NodeId> {
        self.ensure_value(operand, "operand")?;
        let from = self.ty(operand);
        let ty = if op.is_conversion() {
            None
        } else {
            self.unary_type(op, from)
        };
        let Some(ty) = ty else {
            return Err(self.operator_not_defined(op.name(), &[from]));
        };
        Ok(self.push(
            Prim::Unary {
                op,
                operand,
                method: None,
            },
            ty,
        ))
    }

    /// A unary operator implemented by a static one-parameter method.
    pub fn unary_with(
        &mut self,
        op: UnaryOp,
        operand: NodeId,
        method: MethodId,
    ) -> BuildResult<NodeId> {
        let ty = self.operator_method(method, &[self.ty(operand)])?;
        Ok(self.push(
            Prim::Unary {
                op,
                operand,
                method: Some(method),
            },
            ty,
        ))
    }

    pub fn convert(&mut self, operand: NodeId, ty: TypeId) -> BuildResult<NodeId> {
        self.conversion(UnaryOp::Convert, operand, ty)
    }

    pub fn convert_checked(&mut self, operand: NodeId, ty: TypeId) -> BuildResult<NodeId> {
        self.conversion(UnaryOp::ConvertChecked, operand, ty)
    }

    /// `operand as ty`; `ty` must admit null.
    pub fn type_as(&mut self, operand: NodeId, ty: TypeId) -> BuildResult<NodeId> {
        if !self.pool.can_be_null(ty) {
            return Err(rejected(BuildError::NotReferenceType {
                context: "the target of `as`",
                found: self.name(ty),
            }));
        }
        self.conversion(UnaryOp::TypeAs, operand, ty)
    }

    pub fn unbox(&mut self, operand: NodeId, ty: TypeId) -> BuildResult<NodeId> {
        let from = self.ty(operand);
        if !self.pool.is_reference_type(from) {
            return Err(rejected(BuildError::NotReferenceType {
                context: "an unboxed operand",
                found: self.name(from),
            }));
        }
        self.conversion(UnaryOp::Unbox, operand, ty)
    }

    fn conversion(&mut self, op: UnaryOp, operand: NodeId, ty: TypeId) -> BuildResult<NodeId> {
        self.ensure_node_type(ty)?;
        self.ensure_value(operand, "converted value")?;
        let from = self.ty(operand);
        if !self.pool.is_explicitly_convertible(ty, from) {
            return Err(rejected(BuildError::NotConvertible {
                from: self.name(from),
                to: self.name(ty),
            }));
        }
        Ok(self.push(
            Prim::Unary {
                op,
                operand,
                method: None,
            },
            ty,
        ))
    }

    /// Check an operator method against its operand types and return its
    /// result type.
    pub(crate) fn operator_method(
        &self,
        method: MethodId,
        operands: &[TypeId],
    ) -> BuildResult<TypeId> {
        let def = self.pool.method(method);
        let mismatch = |reason: String| {
            rejected(BuildError::MethodSignatureMismatch {
                method: def.name.clone(),
                reason,
            })
        };
        if !def.is_static {
            return Err(mismatch("operator methods must be static".to_owned()));
        }
        if def.params.len() != operands.len() {
            return Err(mismatch(format!(
                "expected {} parameters, found {}",
                operands.len(),
                def.params.len()
            )));
        }
        for (param, &ty) in def.params.iter().zip(operands) {
            if !self.converts(param.ty, ty) {
                return Err(mismatch(format!(
                    "parameter `{}` takes `{}`, operand is `{}`",
                    param.name,
                    self.name(param.ty),
                    self.name(ty)
                )));
            }
        }
        if def.ret.is_void() {
            return Err(mismatch("operator methods must return a value".to_owned()));
        }
        Ok(def.ret)
    }

    pub(crate) fn operator_not_defined(&self, op: &str, operands: &[TypeId]) -> BuildError {
        let operands = operands
            .iter()
            .map(|&t| format!("`{}`", self.name(t)))
            .collect::<Vec<_>>()
            .join(" and ");
        rejected(BuildError::OperatorNotDefined {
            op: op.to_owned(),
            operands,
        })
    }

    // Control flow

    /// `test ? if_true : if_false`, typed by the wider branch.
    pub fn condition(
        &mut self,
        test: NodeId,
        if_true: NodeId,
        if_false: NodeId,
    ) -> BuildResult<NodeId> {
        let (tt, ft) = (self.ty(if_true), self.ty(if_false));
        let ty = if tt == ft || self.converts(tt, ft) {
            tt
        } else if self.converts(ft, tt) {
            ft
        } else {
            return Err(rejected(BuildError::IncompatibleTypes {
                context: "conditional branches",
                expected: self.name(tt),
                found: self.name(ft),
            }));
        };
        self.condition_typed(test, if_true, Some(if_false), ty)
    }

    /// `if (test) body`.
    pub fn if_then(&mut self, test: NodeId, body: NodeId) -> BuildResult<NodeId> {
        self.condition_typed(test, body, None, TypeId::VOID)
    }

    pub fn condition_typed(
        &mut self,
        test: NodeId,
        if_true: NodeId,
        if_false: Option<NodeId>,
        ty: TypeId,
    ) -> BuildResult<NodeId> {
        self.ensure_bool(test, "condition")?;
        if !ty.is_void() {
            let Some(if_false) = if_false else {
                return Err(rejected(BuildError::VoidValue {
                    context: "the missing else branch of a typed conditional",
                }));
            };
            self.ensure_converts(ty, if_true, "conditional branch")?;
            self.ensure_converts(ty, if_false, "conditional branch")?;
        }
        Ok(self.push(
            Prim::Conditional {
                test,
                if_true,
                if_false,
            },
            ty,
        ))
    }

    /// A loop left only by jumping; typed by its break label.
    pub fn infinite_loop(
        &mut self,
        body: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    ) -> BuildResult<NodeId> {
        self.check_loop_labels(body, break_label, continue_label)?;
        let ty = break_label.map_or(TypeId::VOID, |l| self.label_ty(l));
        Ok(self.push(
            Prim::Loop {
                body,
                break_label,
                continue_label,
            },
            ty,
        ))
    }

    /// Jump target. A typed label needs a default value for fall-through.
    pub fn label(&mut self, label: LabelId, default: Option<NodeId>) -> BuildResult<NodeId> {
        let ty = self.label_ty(label);
        self.check_label_value(label, default)?;
        Ok(self.push(Prim::Label { label, default }, ty))
    }

    pub fn goto(
        &mut self,
        kind: GotoKind,
        label: LabelId,
        value: Option<NodeId>,
    ) -> BuildResult<NodeId> {
        self.check_label_value(label, value)?;
        Ok(self.push(Prim::Goto { kind, label, value }, TypeId::VOID))
    }

    pub fn goto_label(&mut self, label: LabelId) -> BuildResult<NodeId> {
        self.goto(GotoKind::Goto, label, None)
    }

    pub fn break_to(&mut self, label: LabelId) -> BuildResult<NodeId> {
        self.goto(GotoKind::Break, label, None)
    }

    pub fn continue_to(&mut self, label: LabelId) -> BuildResult<NodeId> {
        self.goto(GotoKind::Continue, label, None)
    }

    pub fn return_to(&mut self, label: LabelId, value: Option<NodeId>) -> BuildResult<NodeId> {
        self.goto(GotoKind::Return, label, value)
    }

    fn check_label_value(&self, label: LabelId, value: Option<NodeId>) -> BuildResult<()> {
        let expected = self.label_ty(label);
        let found = value.map_or(TypeId::VOID, |v| self.ty(v));
        let ok = if expected.is_void() {
            value.is_none()
        } else {
            value.is_some() && self.converts(expected, found)
        };
        if ok {
            Ok(())
        } else {
            Err(rejected(BuildError::LabelTypeMismatch {
                label: self.label_name(label),
                expected: self.name(expected),
                found: self.name(found),
            }))
        }
    }

    // Members

    pub fn field(&mut self, receiver: Option<NodeId>, field: FieldId) -> BuildResult<NodeId> {
        let def = self.pool.field(field);
        let (declaring, is_static, ty) = (def.declaring, def.is_static, def.ty);
        let name = def.name.clone();
        self.check_receiver(receiver, declaring, is_static, &name)?;
        Ok(self.push(Prim::Field { receiver, field }, ty))
    }

    /// Property read.
    pub fn property(
        &mut self,
        receiver: Option<NodeId>,
        property: PropertyId,
    ) -> BuildResult<NodeId> {
        self.property_access(receiver, property, Vec::new(), true)
    }

    /// A property node that is only ever stored into; needs a setter but no
    /// getter.
    pub fn property_target(
        &mut self,
        receiver: Option<NodeId>,
        property: PropertyId,
    ) -> BuildResult<NodeId> {
        self.property_access(receiver, property, Vec::new(), false)
    }

    /// Indexer read (or store target) with arguments in parameter order.
    pub fn indexer(
        &mut self,
        receiver: NodeId,
        indexer: PropertyId,
        args: Vec<NodeId>,
    ) -> BuildResult<NodeId> {
        let readable = self.pool.property(indexer).getter.is_some();
        self.property_access(Some(receiver), indexer, args, readable)
    }

    /// Property or indexer node that is readable when the property has a
    /// getter. Used when rebuilding a node that may be a store target.
    pub fn property_node(
        &mut self,
        receiver: Option<NodeId>,
        property: PropertyId,
        args: Vec<NodeId>,
    ) -> BuildResult<NodeId> {
        let readable = self.pool.property(property).getter.is_some();
        self.property_access(receiver, property, args, readable)
    }

    pub(crate) fn property_access(
        &mut self,
        receiver: Option<NodeId>,
        property: PropertyId,
        args: Vec<NodeId>,
        need_get: bool,
    ) -> BuildResult<NodeId> {
        let def = self.pool.property(property).clone();
        if need_get && def.getter.is_none() {
            return Err(rejected(BuildError::MissingGetter { member: def.name }));
        }
        let Some(accessor) = def.getter.or(def.setter) else {
            return Err(rejected(BuildError::MissingGetter { member: def.name }));
        };
        let is_static = self.pool.method(accessor).is_static;
        self.check_receiver(receiver, def.declaring, is_static, &def.name)?;
        self.check_args(&def.name, &def.index_params, &args)?;
        Ok(self.push(
            Prim::Property {
                receiver,
                property,
                args,
            },
            def.ty,
        ))
    }

    pub fn array_index(&mut self, array: NodeId, indices: Vec<NodeId>) -> BuildResult<NodeId> {
        let array_ty = self.ty(array);
        let Some((element, rank)) = self.pool.array_element(array_ty) else {
            return Err(rejected(BuildError::IncompatibleTypes {
                context: "array access",
                expected: "an array".to_owned(),
                found: self.name(array_ty),
            }));
        };
        if indices.len() != usize::from(rank) {
            return Err(rejected(BuildError::RankMismatch {
                expected: usize::from(rank),
                found: indices.len(),
            }));
        }
        for &index in &indices {
            self.ensure_converts(TypeId::INT32, index, "array index")?;
        }
        Ok(self.push(Prim::ArrayIndex { array, indices }, element))
    }

    pub fn call(
        &mut self,
        receiver: Option<NodeId>,
        method: MethodId,
        args: Vec<NodeId>,
    ) -> BuildResult<NodeId> {
        let def = self.pool.method(method).clone();
        self.check_receiver(receiver, def.declaring, def.is_static, &def.name)?;
        self.check_args(&def.name, &def.params, &args)?;
        Ok(self.push(
            Prim::Call {
                receiver,
                method,
                args,
            },
            def.ret,
        ))
    }

    /// Delegate invocation.
    pub fn invoke(&mut self, target: NodeId, args: Vec<NodeId>) -> BuildResult<NodeId> {
        let invoke = self.delegate_invoke(target)?;
        let def = self.pool.method(invoke).clone();
        self.check_args("Invoke", &def.params, &args)?;
        Ok(self.push(Prim::Invoke { target, args }, def.ret))
    }

    pub(crate) fn delegate_invoke(&self, target: NodeId) -> BuildResult<MethodId> {
        let ty = self.ty(target);
        self.pool.delegate_invoke(ty).ok_or_else(|| {
            rejected(BuildError::NotADelegate {
                found: self.name(ty),
            })
        })
    }

    pub fn new_object(&mut self, ctor: CtorId, args: Vec<NodeId>) -> BuildResult<NodeId> {
        let def = self.pool.ctor(ctor).clone();
        let what = self.name(def.declaring);
        self.check_args(&what, &def.params, &args)?;
        Ok(self.push(Prim::New { ctor, args }, def.declaring))
    }

    /// One-dimensional array of `element` holding `elements`.
    pub fn new_array_init(
        &mut self,
        element: TypeId,
        elements: Vec<NodeId>,
    ) -> BuildResult<NodeId> {
        self.ensure_node_type(element)?;
        for &e in &elements {
            self.ensure_converts(element, e, "array element")?;
        }
        let ty = self.pool.array_of(element);
        Ok(self.push(Prim::NewArrayInit { elements }, ty))
    }

    /// Array of `element` with one dimension per bound.
    pub fn new_array_bounds(
        &mut self,
        element: TypeId,
        bounds: Vec<NodeId>,
    ) -> BuildResult<NodeId> {
        self.ensure_node_type(element)?;
        let rank = match u8::try_from(bounds.len()) {
            Ok(rank) if rank > 0 => rank,
            _ => {
                return Err(rejected(BuildError::RankMismatch {
                    expected: 1,
                    found: bounds.len(),
                }))
            }
        };
        for &b in &bounds {
            self.ensure_converts(TypeId::INT32, b, "array bound")?;
        }
        let ty = self.pool.array_of_rank(element, rank);
        Ok(self.push(Prim::NewArrayBounds { bounds }, ty))
    }

    /// A lambda typed as a delegate over its parameters and body.
    pub fn lambda(&mut self, params: Vec<VarId>, body: NodeId) -> BuildResult<NodeId> {
        self.ensure_distinct_vars(&params)?;
        let signature: Vec<(TypeId, ParamKind)> = params
            .iter()
            .map(|&p| {
                let decl = self.arena.var(p);
                let kind = if decl.by_ref {
                    ParamKind::Ref
                } else {
                    ParamKind::Value
                };
                (decl.ty, kind)
            })
            .collect();
        let ret = self.ty(body);
        let ty = self.pool.delegate_of(&signature, ret);
        Ok(self.push(Prim::Lambda { params, body }, ty))
    }

    pub fn try_catch(&mut self, options: TryOptions) -> BuildResult<NodeId> {
        let TryOptions {
            body,
            handlers,
            finally,
            fault,
        } = options;
        let ty = self.ty(body);
        for handler in &handlers {
            self.ensure_node_type(handler.test_type)?;
            if let Some(var) = handler.var {
                let var_ty = self.var_ty(var);
                if var_ty != handler.test_type {
                    return Err(rejected(BuildError::IncompatibleTypes {
                        context: "catch variable",
                        expected: self.name(handler.test_type),
                        found: self.name(var_ty),
                    }));
                }
            }
            if let Some(filter) = handler.filter {
                self.ensure_bool(filter, "catch filter")?;
                if self.contains_await(filter) {
                    return Err(rejected(BuildError::AwaitForbidden {
                        context: "a catch filter",
                    }));
                }
            }
            if !ty.is_void() {
                self.ensure_converts(ty, handler.body, "catch body")?;
            }
        }
        Ok(self.push(
            Prim::Try {
                body,
                handlers,
                finally,
                fault,
            },
            ty,
        ))
    }

    pub fn type_is(&mut self, operand: NodeId, test_type: TypeId) -> BuildResult<NodeId> {
        self.ensure_value(operand, "type-tested operand")?;
        self.ensure_node_type(test_type)?;
        Ok(self.push(Prim::TypeIs { operand, test_type }, TypeId::BOOL))
    }

    /// `throw value` as a statement.
    pub fn throw(&mut self, value: NodeId) -> BuildResult<NodeId> {
        self.throw_typed(Some(value), TypeId::VOID)
    }

    pub fn rethrow(&mut self) -> NodeId {
        self.push(Prim::Throw { value: None }, TypeId::VOID)
    }

    /// `throw` in expression position, typed as its context requires.
    pub fn throw_typed(&mut self, value: Option<NodeId>, ty: TypeId) -> BuildResult<NodeId> {
        self.ensure_node_type(ty)?;
        if let Some(value) = value {
            let found = self.ty(value);
            if !self.pool.is_reference_type(found) {
                return Err(rejected(BuildError::NotReferenceType {
                    context: "a thrown value",
                    found: self.name(found),
                }));
            }
        }
        Ok(self.push(Prim::Throw { value }, ty))
    }

    /// A primitive late-bound call site; one argument per site argument.
    pub fn dynamic_site(
        &mut self,
        site: CallSite,
        args: Vec<NodeId>,
        ty: TypeId,
    ) -> BuildResult<NodeId> {
        self.ensure_node_type(ty)?;
        if site.args.len() != args.len() {
            return Err(rejected(BuildError::ArgumentCount {
                what: format!("late-bound {}", site.kind.name()),
                expected: site.args.len(),
                found: args.len(),
            }));
        }
        Ok(self.push(
            Prim::Dynamic {
                site: Box::new(site),
                args,
            },
            ty,
        ))
    }

    // Shared member checks

    /// Whether members declared on `declaring` are reachable from `ty`.
    pub(crate) fn owns_member(&self, ty: TypeId, declaring: TypeId) -> bool {
        let ty = if self.pool.is_nullable(ty) && !self.pool.is_nullable(declaring) {
            self.pool.non_nullable(ty)
        } else {
            ty
        };
        declaring == TypeId::OBJECT
            || self.pool.derives_from(ty, declaring)
            || self.pool.implements(ty, declaring)
    }

    pub(crate) fn check_receiver(
        &self,
        receiver: Option<NodeId>,
        declaring: TypeId,
        is_static: bool,
        member: &str,
    ) -> BuildResult<()> {
        match (receiver, is_static) {
            (Some(_), true) => Err(rejected(BuildError::StaticMemberWithReceiver {
                member: member.to_owned(),
            })),
            (None, false) => Err(rejected(BuildError::InstanceMemberWithoutReceiver {
                member: member.to_owned(),
            })),
            (Some(r), false) => {
                let ty = self.ty(r);
                if self.owns_member(ty, declaring) {
                    Ok(())
                } else {
                    Err(rejected(BuildError::MemberNotOnType {
                        member: member.to_owned(),
                        ty: self.name(ty),
                    }))
                }
            }
            (None, true) => Ok(()),
        }
    }

    /// Positional arguments against a parameter list.
    ///
    /// By-reference parameters need an argument of exactly the parameter
    /// type that can be aliased directly.
    pub(crate) fn check_args(
        &self,
        what: &str,
        params: &[ParamDef],
        args: &[NodeId],
    ) -> BuildResult<()> {
        if params.len() != args.len() {
            return Err(rejected(BuildError::ArgumentCount {
                what: what.to_owned(),
                expected: params.len(),
                found: args.len(),
            }));
        }
        for (param, &arg) in params.iter().zip(args) {
            if param.kind.is_by_ref() {
                self.check_by_ref_arg(param, arg, true)?;
            } else {
                self.ensure_converts(param.ty, arg, "argument")?;
            }
        }
        Ok(())
    }

    /// `direct_only` restricts the argument to targets that can be aliased
    /// without a write-back.
    pub(crate) fn check_by_ref_arg(
        &self,
        param: &ParamDef,
        arg: NodeId,
        direct_only: bool,
    ) -> BuildResult<()> {
        let found = self.ty(arg);
        if found != param.ty {
            return Err(rejected(BuildError::IncompatibleTypes {
                context: "by-reference argument",
                expected: self.name(param.ty),
                found: self.name(found),
            }));
        }
        let read_too = param.kind != ParamKind::Out;
        let writable = match self.target_shape(arg, read_too, "by-reference argument") {
            Ok(shape) => {
                shape != super::checks::TargetShape::Dynamic && (!direct_only || shape.is_direct())
            }
            Err(_) => false,
        };
        if writable {
            Ok(())
        } else {
            Err(rejected(BuildError::ByRefArgumentNotWritable {
                param: param.name.clone(),
            }))
        }
    }
}

