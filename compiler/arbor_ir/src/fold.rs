//! Child mapping.
//!
//! [`NodeKind::fold_with`] is the single place that knows where every child
//! of every kind lives. It rebuilds a kind with each child handle passed
//! through a [`Fold`]; descriptors and constants are copied unchanged.
//! Children are visited in evaluation order, declarations (variables,
//! labels) before the expressions that use them.
//!
//! The read-only visitor, the rewriter and the reducer's substitution
//! passes are all built on it.

use std::convert::Infallible;

use smallvec::SmallVec;

use crate::node::{
    AssignKind, BoundKind, CatchHandler, CompoundAssign, FlowKind, ForEachLoop,
    ForLoop, HandlerConversion, HandlerInfo, IncDecAssign, InterpKind, InterpPart, LoopKind,
    MemberPattern, NodeKind, ParamAssignment, Pattern, Prim, SwitchArm, SwitchCase,
    SwitchExpression, SwitchKind, SwitchStatement, TupleKind, UsingBlock,
};
use crate::{LabelId, NodeId, PatternId, VarId};

/// Maps child handles of a node.
pub trait Fold {
    type Error;

    fn fold_node(&mut self, id: NodeId) -> Result<NodeId, Self::Error>;

    fn fold_var(&mut self, id: VarId) -> Result<VarId, Self::Error> {
        Ok(id)
    }

    fn fold_label(&mut self, id: LabelId) -> Result<LabelId, Self::Error> {
        Ok(id)
    }

    fn fold_pattern(&mut self, id: PatternId) -> Result<PatternId, Self::Error> {
        Ok(id)
    }
}

fn nodes<F: Fold + ?Sized>(f: &mut F, ids: &[NodeId]) -> Result<Vec<NodeId>, F::Error> {
    ids.iter().map(|&id| f.fold_node(id)).collect()
}

fn opt_node<F: Fold + ?Sized>(f: &mut F, id: Option<NodeId>) -> Result<Option<NodeId>, F::Error> {
    id.map(|id| f.fold_node(id)).transpose()
}

fn vars<F: Fold + ?Sized>(f: &mut F, ids: &[VarId]) -> Result<Vec<VarId>, F::Error> {
    ids.iter().map(|&id| f.fold_var(id)).collect()
}

fn opt_var<F: Fold + ?Sized>(f: &mut F, id: Option<VarId>) -> Result<Option<VarId>, F::Error> {
    id.map(|id| f.fold_var(id)).transpose()
}

fn opt_label<F: Fold + ?Sized>(
    f: &mut F,
    id: Option<LabelId>,
) -> Result<Option<LabelId>, F::Error> {
    id.map(|id| f.fold_label(id)).transpose()
}

fn params<F: Fold + ?Sized>(
    f: &mut F,
    args: &[ParamAssignment],
) -> Result<Vec<ParamAssignment>, F::Error> {
    args.iter()
        .map(|a| Ok(ParamAssignment::new(a.param, f.fold_node(a.value)?)))
        .collect()
}

impl NodeKind {
    /// Rebuild this kind with every child mapped through `f`.
    pub fn fold_with<F: Fold + ?Sized>(&self, f: &mut F) -> Result<NodeKind, F::Error> {
        Ok(match self {
            NodeKind::Prim(p) => NodeKind::Prim(fold_prim(p, f)?),
            NodeKind::Assign(a) => NodeKind::Assign(fold_assign(a, f)?),
            NodeKind::Loop(l) => NodeKind::Loop(fold_loop(l, f)?),
            NodeKind::Switch(s) => NodeKind::Switch(fold_switch(s, f)?),
            NodeKind::Dynamic(d) => {
                let mut op = (**d).clone();
                for arg in &mut op.args {
                    arg.value = f.fold_node(arg.value)?;
                }
                NodeKind::Dynamic(Box::new(op))
            }
            NodeKind::Flow(flow) => NodeKind::Flow(fold_flow(flow, f)?),
            NodeKind::Interp(i) => NodeKind::Interp(fold_interp(i, f)?),
            NodeKind::Tuple(t) => NodeKind::Tuple(match t {
                TupleKind::Literal { elements } => TupleKind::Literal {
                    elements: nodes(f, elements)?,
                },
                TupleKind::Convert {
                    operand,
                    conversions,
                } => TupleKind::Convert {
                    operand: f.fold_node(*operand)?,
                    conversions: nodes(f, conversions)?,
                },
            }),
            NodeKind::Bound(b) => NodeKind::Bound(match b {
                BoundKind::Call {
                    receiver,
                    method,
                    args,
                } => BoundKind::Call {
                    receiver: opt_node(f, *receiver)?,
                    method: *method,
                    args: params(f, args)?,
                },
                BoundKind::Index {
                    receiver,
                    indexer,
                    args,
                } => BoundKind::Index {
                    receiver: f.fold_node(*receiver)?,
                    indexer: *indexer,
                    args: params(f, args)?,
                },
                BoundKind::New { ctor, args } => BoundKind::New {
                    ctor: *ctor,
                    args: params(f, args)?,
                },
                BoundKind::Invoke { target, args } => BoundKind::Invoke {
                    target: f.fold_node(*target)?,
                    args: params(f, args)?,
                },
            }),
        })
    }

    /// Every child, in fold order.
    pub fn children(&self) -> SmallVec<[Child; 8]> {
        let mut collect = Collect(SmallVec::new());
        let _ = self.fold_with(&mut collect);
        collect.0
    }

    /// Node children only, in fold order.
    pub fn child_nodes(&self) -> SmallVec<[NodeId; 8]> {
        self.children()
            .into_iter()
            .filter_map(|c| match c {
                Child::Node(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

fn fold_prim<F: Fold + ?Sized>(p: &Prim, f: &mut F) -> Result<Prim, F::Error> {
    Ok(match p {
        Prim::Constant(_) | Prim::Default => p.clone(),
        Prim::Variable(v) => Prim::Variable(f.fold_var(*v)?),
        Prim::Block { vars: vs, exprs } => Prim::Block {
            vars: vars(f, vs)?,
            exprs: nodes(f, exprs)?,
        },
        Prim::Assign { target, value } => Prim::Assign {
            target: f.fold_node(*target)?,
            value: f.fold_node(*value)?,
        },
        Prim::Binary {
            op,
            left,
            right,
            method,
        } => Prim::Binary {
            op: *op,
            left: f.fold_node(*left)?,
            right: f.fold_node(*right)?,
            method: *method,
        },
        Prim::Unary {
            op,
            operand,
            method,
        } => Prim::Unary {
            op: *op,
            operand: f.fold_node(*operand)?,
            method: *method,
        },
        Prim::Conditional {
            test,
            if_true,
            if_false,
        } => Prim::Conditional {
            test: f.fold_node(*test)?,
            if_true: f.fold_node(*if_true)?,
            if_false: opt_node(f, *if_false)?,
        },
        Prim::Loop {
            body,
            break_label,
            continue_label,
        } => {
            let break_label = opt_label(f, *break_label)?;
            let continue_label = opt_label(f, *continue_label)?;
            Prim::Loop {
                body: f.fold_node(*body)?,
                break_label,
                continue_label,
            }
        }
        Prim::Label { label, default } => Prim::Label {
            label: f.fold_label(*label)?,
            default: opt_node(f, *default)?,
        },
        Prim::Goto { kind, label, value } => Prim::Goto {
            kind: *kind,
            label: f.fold_label(*label)?,
            value: opt_node(f, *value)?,
        },
        Prim::Field { receiver, field } => Prim::Field {
            receiver: opt_node(f, *receiver)?,
            field: *field,
        },
        Prim::Property {
            receiver,
            property,
            args,
        } => Prim::Property {
            receiver: opt_node(f, *receiver)?,
            property: *property,
            args: nodes(f, args)?,
        },
        Prim::ArrayIndex { array, indices } => Prim::ArrayIndex {
            array: f.fold_node(*array)?,
            indices: nodes(f, indices)?,
        },
        Prim::Call {
            receiver,
            method,
            args,
        } => Prim::Call {
            receiver: opt_node(f, *receiver)?,
            method: *method,
            args: nodes(f, args)?,
        },
        Prim::Invoke { target, args } => Prim::Invoke {
            target: f.fold_node(*target)?,
            args: nodes(f, args)?,
        },
        Prim::New { ctor, args } => Prim::New {
            ctor: *ctor,
            args: nodes(f, args)?,
        },
        Prim::NewArrayInit { elements } => Prim::NewArrayInit {
            elements: nodes(f, elements)?,
        },
        Prim::NewArrayBounds { bounds } => Prim::NewArrayBounds {
            bounds: nodes(f, bounds)?,
        },
        Prim::Lambda { params, body } => Prim::Lambda {
            params: vars(f, params)?,
            body: f.fold_node(*body)?,
        },
        Prim::Try {
            body,
            handlers,
            finally,
            fault,
        } => {
            let body = f.fold_node(*body)?;
            let handlers = handlers
                .iter()
                .map(|h| {
                    Ok(CatchHandler {
                        var: opt_var(f, h.var)?,
                        test_type: h.test_type,
                        filter: opt_node(f, h.filter)?,
                        body: f.fold_node(h.body)?,
                    })
                })
                .collect::<Result<Vec<_>, F::Error>>()?;
            Prim::Try {
                body,
                handlers,
                finally: opt_node(f, *finally)?,
                fault: opt_node(f, *fault)?,
            }
        }
        Prim::TypeIs { operand, test_type } => Prim::TypeIs {
            operand: f.fold_node(*operand)?,
            test_type: *test_type,
        },
        Prim::Throw { value } => Prim::Throw {
            value: opt_node(f, *value)?,
        },
        Prim::Dynamic { site, args } => Prim::Dynamic {
            site: site.clone(),
            args: nodes(f, args)?,
        },
    })
}

fn fold_assign<F: Fold + ?Sized>(a: &AssignKind, f: &mut F) -> Result<AssignKind, F::Error> {
    Ok(match a {
        AssignKind::Compound(c) => AssignKind::Compound(CompoundAssign {
            op: c.op,
            target: f.fold_node(c.target)?,
            value: f.fold_node(c.value)?,
            method: c.method,
            left_conversion: opt_node(f, c.left_conversion)?,
            final_conversion: opt_node(f, c.final_conversion)?,
        }),
        AssignKind::IncDec(u) => AssignKind::IncDec(IncDecAssign {
            op: u.op,
            operand: f.fold_node(u.operand)?,
            checked: u.checked,
            method: u.method,
        }),
    })
}

fn fold_loop<F: Fold + ?Sized>(l: &LoopKind, f: &mut F) -> Result<LoopKind, F::Error> {
    Ok(match l {
        LoopKind::While {
            test,
            body,
            break_label,
            continue_label,
        } => {
            let break_label = opt_label(f, *break_label)?;
            let continue_label = opt_label(f, *continue_label)?;
            LoopKind::While {
                test: f.fold_node(*test)?,
                body: f.fold_node(*body)?,
                break_label,
                continue_label,
            }
        }
        LoopKind::DoWhile {
            body,
            test,
            break_label,
            continue_label,
        } => {
            let break_label = opt_label(f, *break_label)?;
            let continue_label = opt_label(f, *continue_label)?;
            LoopKind::DoWhile {
                body: f.fold_node(*body)?,
                test: f.fold_node(*test)?,
                break_label,
                continue_label,
            }
        }
        LoopKind::For(l) => {
            let vs = vars(f, &l.vars)?;
            let break_label = opt_label(f, l.break_label)?;
            let continue_label = opt_label(f, l.continue_label)?;
            LoopKind::For(Box::new(ForLoop {
                vars: vs,
                initializers: nodes(f, &l.initializers)?,
                test: opt_node(f, l.test)?,
                iterators: nodes(f, &l.iterators)?,
                body: f.fold_node(l.body)?,
                break_label,
                continue_label,
            }))
        }
        LoopKind::ForEach(l) => {
            let vs = vars(f, &l.vars)?;
            let break_label = opt_label(f, l.break_label)?;
            let continue_label = opt_label(f, l.continue_label)?;
            LoopKind::ForEach(Box::new(ForEachLoop {
                vars: vs,
                collection: f.fold_node(l.collection)?,
                conversion: opt_node(f, l.conversion)?,
                deconstruction: opt_node(f, l.deconstruction)?,
                body: f.fold_node(l.body)?,
                break_label,
                continue_label,
                info: l.info.clone(),
                await_info: l.await_info.clone(),
            }))
        }
    })
}

fn fold_switch<F: Fold + ?Sized>(s: &SwitchKind, f: &mut F) -> Result<SwitchKind, F::Error> {
    Ok(match s {
        SwitchKind::Statement(sw) => {
            let value = f.fold_node(sw.value)?;
            let vs = vars(f, &sw.vars)?;
            let break_label = f.fold_label(sw.break_label)?;
            let cases = sw
                .cases
                .iter()
                .map(|c| {
                    Ok(SwitchCase {
                        test_values: c.test_values.clone(),
                        is_default: c.is_default,
                        body: nodes(f, &c.body)?,
                    })
                })
                .collect::<Result<Vec<_>, F::Error>>()?;
            SwitchKind::Statement(Box::new(SwitchStatement {
                value,
                vars: vs,
                cases,
                break_label,
            }))
        }
        SwitchKind::GotoCase { .. } | SwitchKind::GotoDefault => s.clone(),
        SwitchKind::Expression(e) => {
            let value = f.fold_node(e.value)?;
            let arms = e
                .arms
                .iter()
                .map(|arm| {
                    Ok(SwitchArm {
                        vars: vars(f, &arm.vars)?,
                        pattern: f.fold_pattern(arm.pattern)?,
                        guard: opt_node(f, arm.guard)?,
                        value: f.fold_node(arm.value)?,
                    })
                })
                .collect::<Result<Vec<_>, F::Error>>()?;
            SwitchKind::Expression(Box::new(SwitchExpression { value, arms }))
        }
        SwitchKind::IsPattern { operand, pattern } => SwitchKind::IsPattern {
            operand: f.fold_node(*operand)?,
            pattern: f.fold_pattern(*pattern)?,
        },
    })
}

fn fold_flow<F: Fold + ?Sized>(flow: &FlowKind, f: &mut F) -> Result<FlowKind, F::Error> {
    Ok(match flow {
        FlowKind::Using(u) => {
            let var = opt_var(f, u.var)?;
            FlowKind::Using(Box::new(UsingBlock {
                var,
                resource: f.fold_node(u.resource)?,
                body: f.fold_node(u.body)?,
                dispose: u.dispose,
                await_info: u.await_info.clone(),
            }))
        }
        FlowKind::Lock { object, body } => FlowKind::Lock {
            object: f.fold_node(*object)?,
            body: f.fold_node(*body)?,
        },
        FlowKind::Await { operand, info } => FlowKind::Await {
            operand: f.fold_node(*operand)?,
            info: info.clone(),
        },
    })
}

fn fold_interp<F: Fold + ?Sized>(i: &InterpKind, f: &mut F) -> Result<InterpKind, F::Error> {
    Ok(match i {
        InterpKind::String { parts } => InterpKind::String {
            parts: parts
                .iter()
                .map(|p| match p {
                    InterpPart::Literal(_) => Ok(p.clone()),
                    InterpPart::Insert {
                        value,
                        alignment,
                        format,
                    } => Ok(InterpPart::Insert {
                        value: f.fold_node(*value)?,
                        alignment: *alignment,
                        format: format.clone(),
                    }),
                })
                .collect::<Result<Vec<_>, F::Error>>()?,
        },
        InterpKind::HandlerConversion(h) => {
            InterpKind::HandlerConversion(Box::new(HandlerConversion {
                string: f.fold_node(h.string)?,
                info: HandlerInfo {
                    construction: f.fold_node(h.info.construction)?,
                    appends: nodes(f, &h.info.appends)?,
                },
            }))
        }
    })
}

impl Pattern {
    /// Rebuild this pattern with sub-patterns and bound variables mapped.
    pub fn fold_with<F: Fold + ?Sized>(&self, f: &mut F) -> Result<Pattern, F::Error> {
        Ok(match self {
            Pattern::Discard
            | Pattern::Constant(_)
            | Pattern::Type(_)
            | Pattern::Relational { .. } => self.clone(),
            Pattern::Declaration { ty, var } => Pattern::Declaration {
                ty: *ty,
                var: f.fold_var(*var)?,
            },
            Pattern::Var(v) => Pattern::Var(f.fold_var(*v)?),
            Pattern::Not(p) => Pattern::Not(f.fold_pattern(*p)?),
            Pattern::And(a, b) => Pattern::And(f.fold_pattern(*a)?, f.fold_pattern(*b)?),
            Pattern::Or(a, b) => Pattern::Or(f.fold_pattern(*a)?, f.fold_pattern(*b)?),
            Pattern::Positional {
                ty,
                deconstruct,
                subpatterns,
                var,
            } => Pattern::Positional {
                ty: *ty,
                deconstruct: *deconstruct,
                subpatterns: subpatterns
                    .iter()
                    .map(|&p| f.fold_pattern(p))
                    .collect::<Result<_, _>>()?,
                var: opt_var(f, *var)?,
            },
            Pattern::Property {
                ty,
                subpatterns,
                var,
            } => Pattern::Property {
                ty: *ty,
                subpatterns: subpatterns
                    .iter()
                    .map(|m| {
                        Ok(MemberPattern {
                            member: m.member,
                            pattern: f.fold_pattern(m.pattern)?,
                        })
                    })
                    .collect::<Result<_, F::Error>>()?,
                var: opt_var(f, *var)?,
            },
            Pattern::List {
                length,
                indexer,
                slice,
                subpatterns,
                var,
            } => Pattern::List {
                length: *length,
                indexer: *indexer,
                slice: *slice,
                subpatterns: subpatterns
                    .iter()
                    .map(|&p| f.fold_pattern(p))
                    .collect::<Result<_, _>>()?,
                var: opt_var(f, *var)?,
            },
            Pattern::Slice(p) => Pattern::Slice(p.map(|p| f.fold_pattern(p)).transpose()?),
        })
    }

    /// Sub-patterns and bound variables, in fold order.
    pub fn children(&self) -> SmallVec<[Child; 8]> {
        let mut collect = Collect(SmallVec::new());
        let _ = self.fold_with(&mut collect);
        collect.0
    }
}

/// A child handle of a node or pattern.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Child {
    Node(NodeId),
    Var(VarId),
    Label(LabelId),
    Pattern(PatternId),
}

struct Collect(SmallVec<[Child; 8]>);

impl Fold for Collect {
    type Error = Infallible;

    fn fold_node(&mut self, id: NodeId) -> Result<NodeId, Infallible> {
        self.0.push(Child::Node(id));
        Ok(id)
    }

    fn fold_var(&mut self, id: VarId) -> Result<VarId, Infallible> {
        self.0.push(Child::Var(id));
        Ok(id)
    }

    fn fold_label(&mut self, id: LabelId) -> Result<LabelId, Infallible> {
        self.0.push(Child::Label(id));
        Ok(id)
    }

    fn fold_pattern(&mut self, id: PatternId) -> Result<PatternId, Infallible> {
        self.0.push(Child::Pattern(id));
        Ok(id)
    }
}
