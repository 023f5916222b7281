//! Structured loops.
//!
//! Every loop becomes an infinite `Loop` left by a jump to its break label.
//! A continue label is placed where `continue` has to resume: before the
//! test of a `do`, before the iterators of a `for`, and at the end of a
//! `foreach` body. `while` keeps it on the loop itself, since resuming at
//! the top re-evaluates the test.

use arbor_build::TryOptions;
use arbor_diagnostic::{ReduceError, ReduceResult};
use arbor_ir::{BinaryOp, EnumeratorShape, ForEachLoop, ForLoop, LabelId, NodeId, VarId};
use arbor_types::TypeId;

use super::Lowerer;

impl Lowerer<'_, '_> {
    pub(crate) fn while_loop(
        &mut self,
        test: NodeId,
        body: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    ) -> ReduceResult<NodeId> {
        let brk = self.break_label(break_label);
        let exit = self.b.break_to(brk)?;
        let step = self.b.condition_typed(test, body, Some(exit), TypeId::VOID)?;
        Ok(self.b.infinite_loop(step, Some(brk), continue_label)?)
    }

    pub(crate) fn do_while(
        &mut self,
        body: NodeId,
        test: NodeId,
        break_label: Option<LabelId>,
        continue_label: Option<LabelId>,
    ) -> ReduceResult<NodeId> {
        let brk = self.break_label(break_label);
        let mut exprs = vec![body];
        if let Some(cont) = continue_label {
            exprs.push(self.b.label(cont, None)?);
        }
        exprs.push(self.exit_unless(test, brk)?);
        let iteration = self.statements(Vec::new(), exprs)?;
        Ok(self.b.infinite_loop(iteration, Some(brk), None)?)
    }

    pub(crate) fn for_loop(&mut self, node: ForLoop) -> ReduceResult<NodeId> {
        let ForLoop {
            vars,
            initializers,
            test,
            iterators,
            body,
            break_label,
            continue_label,
        } = node;
        let brk = self.break_label(break_label);
        let mut exprs = Vec::with_capacity(iterators.len() + 3);
        if let Some(test) = test {
            exprs.push(self.exit_unless(test, brk)?);
        }
        exprs.push(body);
        if let Some(cont) = continue_label {
            exprs.push(self.b.label(cont, None)?);
        }
        exprs.extend(iterators);
        let iteration = self.statements(Vec::new(), exprs)?;
        let looped = self.b.infinite_loop(iteration, Some(brk), None)?;

        let mut outer = initializers;
        outer.push(looped);
        self.statements(vars, outer)
    }

    pub(crate) fn for_each(&mut self, node: ForEachLoop) -> ReduceResult<NodeId> {
        if node.await_info.is_some() {
            return Err(ReduceError::NotImplemented {
                what: "await foreach",
            });
        }
        tracing::trace!(shape = ?node.info.shape, "lowering foreach");
        match node.info.shape {
            EnumeratorShape::String => self.for_each_string(&node),
            EnumeratorShape::Array { rank: 1 } => self.for_each_vector(&node),
            EnumeratorShape::Array { rank } => self.for_each_array(&node, rank),
            EnumeratorShape::Pattern => self.for_each_enumerator(&node),
        }
    }

    /// `for (i = 0; i < s.Length; i++)` over the characters of a string.
    fn for_each_string(&mut self, node: &ForEachLoop) -> ReduceResult<NodeId> {
        let wk = self.b.pool().well_known().clone();
        let source = self.b.new_temp(TypeId::STRING);
        let init = self.store(source, node.collection)?;
        let s = self.b.variable(source);
        let length = self.b.property(Some(s), wk.string_length)?;
        self.index_loop(node, source, init, length, |lower, index| {
            Ok(lower.b.indexer(s, wk.string_chars, vec![index])?)
        })
    }

    /// Index loop over a single-dimensional array.
    fn for_each_vector(&mut self, node: &ForEachLoop) -> ReduceResult<NodeId> {
        let array_ty = self.b.ty(node.collection);
        let source = self.b.new_temp(array_ty);
        let init = self.store(source, node.collection)?;
        let a = self.b.variable(source);
        let length = self.b.unary(arbor_ir::UnaryOp::ArrayLength, a)?;
        self.index_loop(node, source, init, length, |lower, index| {
            Ok(lower.b.array_index(a, vec![index])?)
        })
    }

    /// `Block([src, i])[src = coll, i = 0, loop { if !(i < len) break; body; i++ }]`.
    fn index_loop(
        &mut self,
        node: &ForEachLoop,
        source: VarId,
        init: NodeId,
        length: NodeId,
        element: impl FnOnce(&mut Self, NodeId) -> ReduceResult<NodeId>,
    ) -> ReduceResult<NodeId> {
        let brk = self.break_label(node.break_label);
        let index = self.b.new_temp(TypeId::INT32);
        let zero = self.b.int(0);
        let start = self.store(index, zero)?;

        let i = self.b.variable(index);
        let test = self.b.binary(BinaryOp::LessThan, i, length)?;
        let exit = self.exit_unless(test, brk)?;
        let current = element(self, i)?;
        let mut exprs = vec![exit, self.iteration(node, current)?];
        if let Some(cont) = node.continue_label {
            exprs.push(self.b.label(cont, None)?);
        }
        exprs.push(self.advance(index)?);
        let iteration = self.statements(Vec::new(), exprs)?;
        let looped = self.b.infinite_loop(iteration, Some(brk), None)?;
        self.statements(vec![source, index], vec![init, start, looped])
    }

    /// One nested index loop per dimension, running from `GetLowerBound(d)`
    /// to `GetUpperBound(d)` inclusive. All bounds are read once up front.
    fn for_each_array(&mut self, node: &ForEachLoop, rank: u8) -> ReduceResult<NodeId> {
        let wk = self.b.pool().well_known();
        let (get_lower, get_upper) = (wk.array_get_lower_bound, wk.array_get_upper_bound);
        let array_ty = self.b.ty(node.collection);
        let source = self.b.new_temp(array_ty);
        let mut vars = vec![source];
        let mut exprs = vec![self.store(source, node.collection)?];

        let mut lowers = Vec::with_capacity(usize::from(rank));
        let mut uppers = Vec::with_capacity(usize::from(rank));
        let mut indices = Vec::with_capacity(usize::from(rank));
        for dimension in 0..i32::from(rank) {
            for (method, bounds) in [(get_lower, &mut lowers), (get_upper, &mut uppers)] {
                let a = self.b.variable(source);
                let d = self.b.int(dimension);
                let read = self.b.call(Some(a), method, vec![d])?;
                let bound = self.b.new_temp(TypeId::INT32);
                exprs.push(self.store(bound, read)?);
                bounds.push(bound);
            }
            indices.push(self.b.new_temp(TypeId::INT32));
        }
        vars.extend(&lowers);
        vars.extend(&uppers);
        vars.extend(&indices);

        let a = self.b.variable(source);
        let reads = indices.iter().map(|&i| self.b.variable(i)).collect();
        let current = self.b.array_index(a, reads)?;
        let mut inner = vec![self.iteration(node, current)?];
        if let Some(cont) = node.continue_label {
            inner.push(self.b.label(cont, None)?);
        }
        let mut body = self.statements(Vec::new(), inner)?;

        let dimensions = indices.iter().zip(lowers.iter().zip(&uppers)).enumerate();
        for (dimension, (&index, (&lower, &upper))) in dimensions.rev() {
            let brk = if dimension == 0 {
                self.break_label(node.break_label)
            } else {
                self.b.new_label(None, TypeId::VOID)
            };
            let i = self.b.variable(index);
            let last = self.b.variable(upper);
            let test = self.b.binary(BinaryOp::LessThanOrEqual, i, last)?;
            let exit = self.exit_unless(test, brk)?;
            let step = self.advance(index)?;
            let iteration = self.statements(Vec::new(), vec![exit, body, step])?;
            let looped = self.b.infinite_loop(iteration, Some(brk), None)?;
            let first = self.b.variable(lower);
            let start = self.store(index, first)?;
            body = self.statements(Vec::new(), vec![start, looped])?;
        }
        exprs.push(body);
        self.statements(vars, exprs)
    }

    /// `GetEnumerator`/`MoveNext`/`Current`, disposing the enumerator when
    /// the loop is left.
    fn for_each_enumerator(&mut self, node: &ForEachLoop) -> ReduceResult<NodeId> {
        let info = &node.info;
        let (Some(get_enumerator), Some(move_next), Some(current)) =
            (info.get_enumerator, info.move_next, info.current)
        else {
            return Err(ReduceError::NotImplemented {
                what: "foreach without an enumerator protocol",
            });
        };
        let brk = self.break_label(node.break_label);
        let enumerator = self.b.new_temp(info.enumerator_type);
        let get = self.b.call(Some(node.collection), get_enumerator, Vec::new())?;
        let init = self.store(enumerator, get)?;

        let e = self.b.variable(enumerator);
        let advanced = self.b.call(Some(e), move_next, Vec::new())?;
        let exit = self.exit_unless(advanced, brk)?;
        let e = self.b.variable(enumerator);
        let element = self.b.property(Some(e), current)?;
        let mut exprs = vec![exit, self.iteration(node, element)?];
        if let Some(cont) = node.continue_label {
            exprs.push(self.b.label(cont, None)?);
        }
        let iteration = self.statements(Vec::new(), exprs)?;
        let looped = self.b.infinite_loop(iteration, Some(brk), None)?;

        let protected = match self.dispose(enumerator, info.dispose)? {
            Some(dispose) => self.b.try_catch(TryOptions::new(looped).finally(dispose))?,
            None => looped,
        };
        self.statements(vec![enumerator], vec![init, protected])
    }

    /// The per-iteration scope: the loop variables bound from `element`,
    /// then the body. Conversion runs before deconstruction.
    fn iteration(&mut self, node: &ForEachLoop, element: NodeId) -> ReduceResult<NodeId> {
        let converted = self.apply_opt(node.conversion, element)?;
        let bind = match (node.deconstruction, node.vars.first()) {
            (Some(deconstruction), _) => self.apply(deconstruction, converted)?,
            (None, Some(&var)) => self.store(var, converted)?,
            (None, None) => converted,
        };
        self.statements(node.vars.clone(), vec![bind, node.body])
    }

    fn break_label(&mut self, label: Option<LabelId>) -> LabelId {
        label.unwrap_or_else(|| self.b.new_label(None, TypeId::VOID))
    }

    /// `if (!test) break label`.
    fn exit_unless(&mut self, test: NodeId, label: LabelId) -> ReduceResult<NodeId> {
        let negated = self.not(test)?;
        let exit = self.b.break_to(label)?;
        Ok(self.b.if_then(negated, exit)?)
    }

    /// `index = index + 1`.
    fn advance(&mut self, index: VarId) -> ReduceResult<NodeId> {
        let i = self.b.variable(index);
        let one = self.b.int(1);
        let next = self.b.binary(BinaryOp::Add, i, one)?;
        self.store(index, next)
    }
}
