//! Identity-preserving update.
//!
//! Nodes are immutable, so "changing" a node means asking for a node of the
//! same kind with different children. [`TreeBuilder::update`] returns the
//! original handle when nothing changed and otherwise runs the kind's
//! factory again, so an updated node is validated exactly like a new one.
//!
//! Kinds whose type is not derivable from their children (constants,
//! defaults, typed blocks, conversions, typed throws, late-bound operations,
//! switch expressions, tuple conversions, handler conversions) keep the
//! original node's type.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{
    AssignKind, BoundKind, CompoundAssign, FlowKind, ForEachLoop, ForLoop, InterpKind, LoopKind,
    NodeId, NodeKind, Pattern, PatternId, Prim, SwitchKind, SwitchStatement, TupleKind, UnaryOp,
    VarId,
};
use arbor_types::TypeId;

use crate::builder::{
    rejected, ForEachOptions, HandlerOptions, TreeBuilder, TryOptions, UsingOptions,
};

impl TreeBuilder<'_> {
    /// `id` with its kind replaced by `kind`.
    ///
    /// Returns `id` itself when `kind` equals the current kind; otherwise
    /// allocates a new node through the matching factory. The original
    /// node is left untouched either way.
    pub fn update(&mut self, id: NodeId, kind: NodeKind) -> BuildResult<NodeId> {
        if *self.kind(id) == kind {
            return Ok(id);
        }
        tracing::trace!(node = id.raw(), kind = kind.name(), "rebuilding node");
        let ty = self.ty(id);
        self.rebuild(kind, ty)
    }

    pub fn update_block(
        &mut self,
        id: NodeId,
        vars: Vec<VarId>,
        exprs: Vec<NodeId>,
    ) -> BuildResult<NodeId> {
        self.update(id, Prim::Block { vars, exprs }.into())
    }

    pub fn update_compound(&mut self, id: NodeId, node: CompoundAssign) -> BuildResult<NodeId> {
        self.update(id, AssignKind::Compound(node).into())
    }

    pub fn update_for(&mut self, id: NodeId, node: ForLoop) -> BuildResult<NodeId> {
        self.update(id, LoopKind::For(Box::new(node)).into())
    }

    /// The enumeration protocol is resolved again when anything changed.
    pub fn update_for_each(&mut self, id: NodeId, node: ForEachLoop) -> BuildResult<NodeId> {
        self.update(id, LoopKind::ForEach(Box::new(node)).into())
    }

    pub fn update_switch(&mut self, id: NodeId, node: SwitchStatement) -> BuildResult<NodeId> {
        self.update(id, SwitchKind::Statement(Box::new(node)).into())
    }

    /// Pattern counterpart of [`update`](Self::update), against the original
    /// pattern's input type.
    pub fn update_pattern(&mut self, id: PatternId, pattern: Pattern) -> BuildResult<PatternId> {
        if *self.pattern(id) == pattern {
            return Ok(id);
        }
        let input = self.pattern_info(id).input;
        self.rebuild_pattern(input, pattern)
    }

    /// Route `kind` through its factory; `ty` is the type of the node being
    /// replaced.
    fn rebuild(&mut self, kind: NodeKind, ty: TypeId) -> BuildResult<NodeId> {
        match kind {
            NodeKind::Prim(prim) => self.rebuild_prim(prim, ty),
            NodeKind::Assign(AssignKind::Compound(node)) => self.compound_assign(node),
            NodeKind::Assign(AssignKind::IncDec(node)) => self.inc_dec(node),
            NodeKind::Loop(node) => self.rebuild_loop(node),
            NodeKind::Switch(node) => self.rebuild_switch(node, ty),
            NodeKind::Dynamic(op) => self.dynamic(*op, ty),
            NodeKind::Flow(FlowKind::Using(node)) => self.using_block(UsingOptions {
                var: node.var,
                resource: node.resource,
                body: node.body,
                is_async: node.await_info.is_some(),
            }),
            NodeKind::Flow(FlowKind::Lock { object, body }) => self.lock(object, body),
            NodeKind::Flow(FlowKind::Await { operand, .. }) => self.await_(operand),
            NodeKind::Interp(InterpKind::String { parts }) => self.interpolated(parts),
            NodeKind::Interp(InterpKind::HandlerConversion(node)) => {
                let node = *node;
                self.handler_conversion(HandlerOptions {
                    string: node.string,
                    construction: node.info.construction,
                    appends: node.info.appends,
                    handler_ty: ty,
                })
            }
            NodeKind::Tuple(TupleKind::Literal { elements }) => self.tuple(elements),
            NodeKind::Tuple(TupleKind::Convert {
                operand,
                conversions,
            }) => self.tuple_convert(operand, conversions, ty),
            NodeKind::Bound(node) => self.rebuild_bound(node),
        }
    }

    fn rebuild_prim(&mut self, prim: Prim, ty: TypeId) -> BuildResult<NodeId> {
        match prim {
            Prim::Constant(value) => self.constant(value, ty),
            Prim::Default => self.default(ty),
            Prim::Variable(var) => Ok(self.variable(var)),
            Prim::Block { vars, exprs } => self.block_typed(vars, exprs, ty),
            Prim::Assign { target, value } => self.assign(target, value),
            Prim::Binary {
                op,
                left,
                right,
                method,
            } => match method {
                Some(method) => self.binary_with(op, left, right, method),
                None => self.binary(op, left, right),
            },
            Prim::Unary {
                op,
                operand,
                method,
            } => match (op, method) {
                (op, Some(method)) => self.unary_with(op, operand, method),
                (UnaryOp::Convert, None) => self.convert(operand, ty),
                (UnaryOp::ConvertChecked, None) => self.convert_checked(operand, ty),
                (UnaryOp::TypeAs, None) => self.type_as(operand, ty),
                (UnaryOp::Unbox, None) => self.unbox(operand, ty),
                (op, None) => self.unary(op, operand),
            },
            Prim::Conditional {
                test,
                if_true,
                if_false,
            } => self.condition_typed(test, if_true, if_false, ty),
            Prim::Loop {
                body,
                break_label,
                continue_label,
            } => self.infinite_loop(body, break_label, continue_label),
            Prim::Label { label, default } => self.label(label, default),
            Prim::Goto { kind, label, value } => self.goto(kind, label, value),
            Prim::Field { receiver, field } => self.field(receiver, field),
            Prim::Property {
                receiver,
                property,
                args,
            } => self.property_node(receiver, property, args),
            Prim::ArrayIndex { array, indices } => self.array_index(array, indices),
            Prim::Call {
                receiver,
                method,
                args,
            } => self.call(receiver, method, args),
            Prim::Invoke { target, args } => self.invoke(target, args),
            Prim::New { ctor, args } => self.new_object(ctor, args),
            Prim::NewArrayInit { elements } => {
                let element = self.array_element(ty)?;
                self.new_array_init(element, elements)
            }
            Prim::NewArrayBounds { bounds } => {
                let element = self.array_element(ty)?;
                self.new_array_bounds(element, bounds)
            }
            Prim::Lambda { params, body } => self.lambda(params, body),
            Prim::Try {
                body,
                handlers,
                finally,
                fault,
            } => self.try_catch(TryOptions {
                body,
                handlers,
                finally,
                fault,
            }),
            Prim::TypeIs { operand, test_type } => self.type_is(operand, test_type),
            Prim::Throw { value } => self.throw_typed(value, ty),
            Prim::Dynamic { site, args } => self.dynamic_site(*site, args, ty),
        }
    }

    fn rebuild_loop(&mut self, node: LoopKind) -> BuildResult<NodeId> {
        match node {
            LoopKind::While {
                test,
                body,
                break_label,
                continue_label,
            } => self.while_loop(test, body, break_label, continue_label),
            LoopKind::DoWhile {
                body,
                test,
                break_label,
                continue_label,
            } => self.do_while(body, test, break_label, continue_label),
            LoopKind::For(node) => self.for_loop(*node),
            LoopKind::ForEach(node) => {
                let node = *node;
                self.for_each(ForEachOptions {
                    vars: node.vars,
                    collection: node.collection,
                    body: node.body,
                    conversion: node.conversion,
                    deconstruction: node.deconstruction,
                    break_label: node.break_label,
                    continue_label: node.continue_label,
                    is_async: node.await_info.is_some(),
                })
            }
        }
    }

    fn rebuild_switch(&mut self, node: SwitchKind, ty: TypeId) -> BuildResult<NodeId> {
        match node {
            SwitchKind::Statement(node) => self.switch_statement(*node),
            SwitchKind::GotoCase { value } => Ok(self.goto_case(value)),
            SwitchKind::GotoDefault => Ok(self.goto_default()),
            SwitchKind::Expression(node) => {
                let node = *node;
                self.switch_expression(node.value, node.arms, ty)
            }
            SwitchKind::IsPattern { operand, pattern } => self.is_pattern(operand, pattern),
        }
    }

    fn rebuild_bound(&mut self, node: BoundKind) -> BuildResult<NodeId> {
        match node {
            BoundKind::Call {
                receiver,
                method,
                args,
            } => self.bound_call(receiver, method, args),
            BoundKind::Index {
                receiver,
                indexer,
                args,
            } => self.bound_index(receiver, indexer, args),
            BoundKind::New { ctor, args } => self.bound_new(ctor, args),
            BoundKind::Invoke { target, args } => self.bound_invoke(target, args),
        }
    }

    fn array_element(&self, ty: TypeId) -> BuildResult<TypeId> {
        self.pool()
            .array_element(ty)
            .map(|(element, _)| element)
            .ok_or_else(|| {
                rejected(BuildError::InvalidNodeType {
                    ty: self.pool().name(ty).to_owned(),
                })
            })
    }
}
