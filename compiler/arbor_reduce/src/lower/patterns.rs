//! Pattern tests.
//!
//! A pattern becomes a `bool` expression over an input that may be read
//! any number of times. Bindings and intermediate values are expressed as
//! `{ x = value; true }` blocks inside a `&&` chain, so a binding happens
//! only once every test to its left has passed. Temporaries are collected
//! for the enclosing block to declare.

use arbor_diagnostic::{BuildError, ReduceError, ReduceResult};
use arbor_ir::{BinaryOp, MemberRef, NodeId, Pattern, PatternId, VarId};
use arbor_types::{ConstValue, MethodId, PropertyId, TypeId};

use super::{Lowerer, Spill};

/// Tests joined with `&&`, left to right.
#[derive(Default)]
struct Conjunction {
    tests: Vec<NodeId>,
}

impl Conjunction {
    fn push(&mut self, test: NodeId) {
        self.tests.push(test);
    }

    fn finish(self, lower: &mut Lowerer<'_, '_>) -> ReduceResult<NodeId> {
        let mut tests = self.tests.into_iter();
        let Some(first) = tests.next() else {
            return Ok(lower.b.bool(true));
        };
        tests.try_fold(first, |acc, next| {
            Ok(lower.b.binary(BinaryOp::AndAlso, acc, next)?)
        })
    }
}

impl Lowerer<'_, '_> {
    pub(crate) fn is_pattern(&mut self, operand: NodeId, pattern: PatternId) -> ReduceResult<NodeId> {
        let mut spill = Spill::new();
        let input = if self.is_pure(operand) {
            operand
        } else {
            spill.temp(self.b, operand)?
        };
        let mut scope = Vec::new();
        let test = self.pattern_test(&mut scope, input, pattern)?;
        for var in scope {
            spill.declare(var);
        }
        spill.finish(self.b, test)
    }

    /// `input` matches `pattern`. `input` must be safe to read repeatedly.
    pub(crate) fn pattern_test(
        &mut self,
        scope: &mut Vec<VarId>,
        input: NodeId,
        pattern: PatternId,
    ) -> ReduceResult<NodeId> {
        let narrowed = self.b.pattern_info(pattern).narrowed;
        match self.b.pattern(pattern).clone() {
            Pattern::Discard => Ok(self.b.bool(true)),
            Pattern::Constant(value) => self.constant_test(input, &value, narrowed),
            Pattern::Type(ty) => Ok(self.b.type_is(input, ty)?),
            Pattern::Declaration { ty, var } => {
                let mut all = Conjunction::default();
                all.push(self.b.type_is(input, ty)?);
                let value = self.narrow(input, ty)?;
                all.push(self.bind(var, value)?);
                all.finish(self)
            }
            Pattern::Var(var) => self.bind(var, input),
            Pattern::Relational { op, value } => {
                let mut all = Conjunction::default();
                let (operand, ty) = self.typed_operand(&mut all, input, &value, narrowed)?;
                let constant = self.b.constant(value, ty)?;
                all.push(self.b.binary(op.binary(), operand, constant)?);
                all.finish(self)
            }
            Pattern::Not(inner) => {
                let test = self.pattern_test(scope, input, inner)?;
                self.not(test)
            }
            Pattern::And(left, right) => {
                let left = self.pattern_test(scope, input, left)?;
                let right = self.pattern_test(scope, input, right)?;
                Ok(self.b.binary(BinaryOp::AndAlso, left, right)?)
            }
            Pattern::Or(left, right) => {
                let left = self.pattern_test(scope, input, left)?;
                let right = self.pattern_test(scope, input, right)?;
                Ok(self.b.binary(BinaryOp::OrElse, left, right)?)
            }
            Pattern::Positional {
                ty,
                deconstruct,
                subpatterns,
                var,
            } => {
                let mut all = Conjunction::default();
                let value = self.narrowed_input(scope, &mut all, input, ty)?;
                match deconstruct {
                    Some(method) => {
                        self.deconstruct(scope, &mut all, value, method, &subpatterns)?;
                    }
                    None => self.tuple_items(scope, &mut all, value, ty, &subpatterns)?,
                }
                if let Some(var) = var {
                    all.push(self.bind(var, value)?);
                }
                all.finish(self)
            }
            Pattern::Property {
                ty,
                subpatterns,
                var,
            } => {
                let mut all = Conjunction::default();
                let value = self.narrowed_input(scope, &mut all, input, ty)?;
                for member in subpatterns {
                    let read = match member.member {
                        MemberRef::Field(field) => self.b.field(Some(value), field)?,
                        MemberRef::Property(property) => self.b.property(Some(value), property)?,
                    };
                    self.sub_test(scope, &mut all, read, member.pattern)?;
                }
                if let Some(var) = var {
                    all.push(self.bind(var, value)?);
                }
                all.finish(self)
            }
            Pattern::List {
                length,
                indexer,
                slice,
                subpatterns,
                var,
            } => {
                let mut all = Conjunction::default();
                let ty = self.b.ty(input);
                let value = self.narrowed_input(scope, &mut all, input, ty)?;
                let list = ListAccess {
                    value,
                    length,
                    indexer,
                    slice,
                };
                self.list_test(scope, &mut all, &list, &subpatterns)?;
                if let Some(var) = var {
                    all.push(self.bind(var, value)?);
                }
                all.finish(self)
            }
            Pattern::Slice(_) => Err(ReduceError::NotImplemented {
                what: "slice pattern outside a list pattern",
            }),
        }
    }

    /// Equality with a constant. Inputs that cannot hold the constant
    /// directly are type-tested and narrowed first.
    fn constant_test(
        &mut self,
        input: NodeId,
        value: &ConstValue,
        narrowed: TypeId,
    ) -> ReduceResult<NodeId> {
        let input_ty = self.b.ty(input);
        if value.is_null() {
            let null = self.b.null(input_ty)?;
            return Ok(self.b.binary(BinaryOp::Equal, input, null)?);
        }
        let mut all = Conjunction::default();
        let (operand, ty) = self.typed_operand(&mut all, input, value, narrowed)?;
        let constant = self.b.constant(value.clone(), ty)?;
        let equal = if ty == TypeId::STRING {
            let equals = self.b.pool().well_known().string_equals;
            self.b.call(None, equals, vec![operand, constant])?
        } else {
            self.b.binary(BinaryOp::Equal, operand, constant)?
        };
        all.push(equal);
        all.finish(self)
    }

    /// The operand a constant is compared against, and the constant's type.
    fn typed_operand(
        &mut self,
        all: &mut Conjunction,
        input: NodeId,
        value: &ConstValue,
        narrowed: TypeId,
    ) -> ReduceResult<(NodeId, TypeId)> {
        let input_ty = self.b.ty(input);
        let base = self.b.pool().non_nullable(input_ty);
        if base != TypeId::OBJECT && self.b.pool().const_fits(value, base) {
            return Ok((input, base));
        }
        let ty = self.b.pool().non_nullable(narrowed);
        all.push(self.b.type_is(input, ty)?);
        Ok((self.narrow(input, ty)?, ty))
    }

    /// `input` as `ty` after whatever test proves the conversion: a type
    /// test, or a null test when the input already has the type. Values
    /// that are not already a variable are kept in a temporary.
    fn narrowed_input(
        &mut self,
        scope: &mut Vec<VarId>,
        all: &mut Conjunction,
        input: NodeId,
        ty: TypeId,
    ) -> ReduceResult<NodeId> {
        let input_ty = self.b.ty(input);
        let statically = input_ty == ty || self.b.pool().is_implicitly_convertible(ty, input_ty);
        if statically {
            if self.b.pool().can_be_null(input_ty) {
                let null = self.b.null(input_ty)?;
                all.push(self.b.binary(BinaryOp::NotEqual, input, null)?);
            }
            if input_ty == ty {
                return Ok(input);
            }
        } else {
            all.push(self.b.type_is(input, ty)?);
        }
        let value = self.narrow(input, ty)?;
        self.hold(scope, all, value)
    }

    /// The conversion of `value` to `ty` once a test has shown it holds.
    fn narrow(&mut self, value: NodeId, ty: TypeId) -> ReduceResult<NodeId> {
        let from = self.b.ty(value);
        let pool = self.b.pool();
        if from == ty {
            Ok(value)
        } else if pool.is_implicitly_convertible(ty, from) {
            Ok(self.b.convert(value, ty)?)
        } else if pool.can_be_null(ty) {
            Ok(self.b.type_as(value, ty)?)
        } else if pool.is_reference_type(from) {
            Ok(self.b.unbox(value, ty)?)
        } else {
            Ok(self.b.convert(value, ty)?)
        }
    }

    /// `value` in a fresh temporary, assigned as part of the test chain.
    fn hold(
        &mut self,
        scope: &mut Vec<VarId>,
        all: &mut Conjunction,
        value: NodeId,
    ) -> ReduceResult<NodeId> {
        if self.is_pure(value) {
            return Ok(value);
        }
        let temp = self.b.new_temp(self.b.ty(value));
        scope.push(temp);
        all.push(self.bind(temp, value)?);
        Ok(self.b.variable(temp))
    }

    /// `{ var = value; true }`.
    fn bind(&mut self, var: VarId, value: NodeId) -> ReduceResult<NodeId> {
        let store = self.store(var, value)?;
        let yes = self.b.bool(true);
        Ok(self.b.block_typed(Vec::new(), vec![store, yes], TypeId::BOOL)?)
    }

    fn sub_test(
        &mut self,
        scope: &mut Vec<VarId>,
        all: &mut Conjunction,
        value: NodeId,
        pattern: PatternId,
    ) -> ReduceResult<()> {
        if matches!(self.b.pattern(pattern), Pattern::Discard) {
            return Ok(());
        }
        let value = self.hold(scope, all, value)?;
        let test = self.pattern_test(scope, value, pattern)?;
        all.push(test);
        Ok(())
    }

    /// `value.Deconstruct(out a, out b, ...)` then the element tests.
    fn deconstruct(
        &mut self,
        scope: &mut Vec<VarId>,
        all: &mut Conjunction,
        value: NodeId,
        method: MethodId,
        subpatterns: &[PatternId],
    ) -> ReduceResult<()> {
        let outs: Vec<TypeId> = self.b.pool().method(method).params.iter().map(|p| p.ty).collect();
        let temps: Vec<VarId> = outs.into_iter().map(|ty| self.b.new_temp(ty)).collect();
        scope.extend(&temps);
        let args = temps.iter().map(|&t| self.b.variable(t)).collect();
        let call = self.b.call(Some(value), method, args)?;
        let yes = self.b.bool(true);
        all.push(self.b.block_typed(Vec::new(), vec![call, yes], TypeId::BOOL)?);

        for (&temp, &pattern) in temps.iter().zip(subpatterns) {
            let read = self.b.variable(temp);
            self.sub_test(scope, all, read, pattern)?;
        }
        Ok(())
    }

    /// Element tests through the `ItemN` fields of a value tuple.
    fn tuple_items(
        &mut self,
        scope: &mut Vec<VarId>,
        all: &mut Conjunction,
        value: NodeId,
        ty: TypeId,
        subpatterns: &[PatternId],
    ) -> ReduceResult<()> {
        for (i, &pattern) in subpatterns.iter().enumerate() {
            let name = format!("Item{}", i + 1);
            let Some(field) = self.b.pool().find_field(ty, &name) else {
                return Err(BuildError::MemberNotOnType {
                    member: name,
                    ty: self.b.pool().name(ty).to_owned(),
                }
                .into());
            };
            let read = self.b.field(Some(value), field)?;
            self.sub_test(scope, all, read, pattern)?;
        }
        Ok(())
    }

    /// Length check, then element and slice tests. Elements after a slice
    /// are addressed from the end.
    fn list_test(
        &mut self,
        scope: &mut Vec<VarId>,
        all: &mut Conjunction,
        list: &ListAccess,
        subpatterns: &[PatternId],
    ) -> ReduceResult<()> {
        let slice_at = subpatterns
            .iter()
            .position(|&p| matches!(self.b.pattern(p), Pattern::Slice(_)));
        let fixed = subpatterns.len() - usize::from(slice_at.is_some());
        let fixed_i32 = count(fixed)?;

        let length = self.list_length(list)?;
        let length = self.hold(scope, all, length)?;
        let expected = self.b.int(fixed_i32);
        let op = if slice_at.is_some() {
            BinaryOp::GreaterThanOrEqual
        } else {
            BinaryOp::Equal
        };
        all.push(self.b.binary(op, length, expected)?);

        for (position, &pattern) in subpatterns.iter().enumerate() {
            let index = match slice_at {
                Some(slice) if position == slice => {
                    if let Pattern::Slice(Some(inner)) = self.b.pattern(pattern).clone() {
                        let start = self.b.int(count(slice)?);
                        let taken = self.b.int(fixed_i32);
                        let span = self.b.binary(BinaryOp::Subtract, length, taken)?;
                        let sliced = self.list_slice(list, start, span)?;
                        self.sub_test(scope, all, sliced, inner)?;
                    }
                    continue;
                }
                Some(slice) if position > slice => {
                    let from_end = self.b.int(count(subpatterns.len() - position)?);
                    self.b.binary(BinaryOp::Subtract, length, from_end)?
                }
                _ => self.b.int(count(position)?),
            };
            let element = self.list_element(list, index)?;
            self.sub_test(scope, all, element, pattern)?;
        }
        Ok(())
    }

    fn list_length(&mut self, list: &ListAccess) -> ReduceResult<NodeId> {
        match list.length {
            Some(length) => Ok(self.b.property(Some(list.value), length)?),
            None => Ok(self.b.unary(arbor_ir::UnaryOp::ArrayLength, list.value)?),
        }
    }

    fn list_element(&mut self, list: &ListAccess, index: NodeId) -> ReduceResult<NodeId> {
        match list.indexer {
            Some(indexer) => Ok(self.b.indexer(list.value, indexer, vec![index])?),
            None => Ok(self.b.array_index(list.value, vec![index])?),
        }
    }

    fn list_slice(
        &mut self,
        list: &ListAccess,
        start: NodeId,
        length: NodeId,
    ) -> ReduceResult<NodeId> {
        let Some(slice) = list.slice else {
            return Err(ReduceError::NotImplemented {
                what: "slice sub-pattern without a Slice method",
            });
        };
        Ok(self.b.call(Some(list.value), slice, vec![start, length])?)
    }
}

/// How a list pattern reads its input.
struct ListAccess {
    value: NodeId,
    length: Option<PropertyId>,
    indexer: Option<PropertyId>,
    slice: Option<MethodId>,
}

fn count(n: usize) -> ReduceResult<i32> {
    i32::try_from(n).map_err(|_| ReduceError::NotImplemented {
        what: "list pattern with more than i32::MAX elements",
    })
}
