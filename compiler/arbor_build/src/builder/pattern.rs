//! Pattern factories.
//!
//! Every factory takes the input type the pattern is matched against and
//! records it, with the narrowed type a match proves, in the pattern's
//! [`PatternInfo`]. Sub-patterns must have been built against the type
//! their parent feeds them.

use arbor_diagnostic::{BuildError, BuildResult};
use arbor_ir::{MemberPattern, MemberRef, Pattern, PatternId, PatternInfo, RelationalOp, VarId};
use arbor_types::{ConstValue, MethodId, ParamKind, PropertyId, TypeId};

use super::{rejected, TreeBuilder};

impl TreeBuilder<'_> {
    pub fn discard_pattern(&mut self, input: TypeId) -> PatternId {
        self.push_pattern(Pattern::Discard, info(input, input))
    }

    /// Equality with a constant; `null` tests for null.
    pub fn constant_pattern(&mut self, input: TypeId, value: ConstValue) -> BuildResult<PatternId> {
        let narrowed = if value.is_null() {
            if !self.pool.can_be_null(input) {
                return Err(self.pattern_mismatch("constant", input));
            }
            input
        } else if self.pool.const_fits(&value, input) && input != TypeId::OBJECT {
            self.pool.non_nullable(input)
        } else if self.pool.is_explicitly_convertible(value.natural_type(), input) {
            value.natural_type()
        } else {
            return Err(self.pattern_mismatch("constant", input));
        };
        Ok(self.push_pattern(Pattern::Constant(value), info(input, narrowed)))
    }

    /// `T`: a non-null value of type `T`.
    pub fn type_pattern(&mut self, input: TypeId, ty: TypeId) -> BuildResult<PatternId> {
        self.ensure_type_test(input, ty, "type")?;
        Ok(self.push_pattern(Pattern::Type(ty), info(input, ty)))
    }

    /// `T x`.
    pub fn declaration_pattern(
        &mut self,
        input: TypeId,
        ty: TypeId,
        var: VarId,
    ) -> BuildResult<PatternId> {
        self.ensure_type_test(input, ty, "declaration")?;
        self.ensure_binds(var, ty)?;
        Ok(self.push_pattern(Pattern::Declaration { ty, var }, info(input, ty)))
    }

    /// `var x`.
    pub fn var_pattern(&mut self, input: TypeId, var: VarId) -> BuildResult<PatternId> {
        self.ensure_binds(var, input)?;
        Ok(self.push_pattern(Pattern::Var(var), info(input, input)))
    }

    /// `< value`, `>= value` and so on. The input must be ordered and the
    /// value a constant of its underlying type.
    pub fn relational_pattern(
        &mut self,
        input: TypeId,
        op: RelationalOp,
        value: ConstValue,
    ) -> BuildResult<PatternId> {
        let base = self.pool.non_nullable(input);
        let ordered = self.pool.is_arithmetic(base) || base == TypeId::CHAR || self.pool.is_enum(base);
        if !ordered || value.is_null() || !self.pool.const_fits(&value, base) {
            return Err(self.pattern_mismatch("relational", input));
        }
        Ok(self.push_pattern(Pattern::Relational { op, value }, info(input, base)))
    }

    pub fn not_pattern(&mut self, input: TypeId, pattern: PatternId) -> BuildResult<PatternId> {
        self.ensure_pattern_input(pattern, input)?;
        Ok(self.push_pattern(Pattern::Not(pattern), info(input, input)))
    }

    /// `left and right`; `right` may be built against what `left` proves.
    pub fn and_pattern(
        &mut self,
        input: TypeId,
        left: PatternId,
        right: PatternId,
    ) -> BuildResult<PatternId> {
        self.ensure_pattern_input(left, input)?;
        let narrowed = self.pattern_info(left).narrowed;
        if self.ensure_pattern_input(right, narrowed).is_err() {
            self.ensure_pattern_input(right, input)?;
        }
        let narrowed = self.pattern_info(right).narrowed;
        Ok(self.push_pattern(Pattern::And(left, right), info(input, narrowed)))
    }

    pub fn or_pattern(
        &mut self,
        input: TypeId,
        left: PatternId,
        right: PatternId,
    ) -> BuildResult<PatternId> {
        self.ensure_pattern_input(left, input)?;
        self.ensure_pattern_input(right, input)?;
        let (l, r) = (self.pattern_info(left).narrowed, self.pattern_info(right).narrowed);
        let narrowed = if l == r { l } else { input };
        Ok(self.push_pattern(Pattern::Or(left, right), info(input, narrowed)))
    }

    /// `T(p1, ..., pn) x` through a `deconstruct` method with `out`
    /// parameters, or through the elements of a tuple type.
    pub fn positional_pattern(
        &mut self,
        input: TypeId,
        ty: TypeId,
        deconstruct: Option<MethodId>,
        subpatterns: Vec<PatternId>,
        var: Option<VarId>,
    ) -> BuildResult<PatternId> {
        self.ensure_type_test(input, ty, "positional")?;
        let parts: Vec<TypeId> = match deconstruct {
            Some(method) => {
                let def = self.pool.method(method);
                let all_out = def.params.iter().all(|p| p.kind == ParamKind::Out);
                if def.is_static || !all_out || !self.owns_member(ty, def.declaring) {
                    return Err(rejected(BuildError::MethodSignatureMismatch {
                        method: def.name.clone(),
                        reason: "deconstruct must be an instance method with only out parameters"
                            .to_owned(),
                    }));
                }
                def.params.iter().map(|p| p.ty).collect()
            }
            None => match self.pool.tuple_elements(ty) {
                Some(elements) => elements.to_vec(),
                None => return Err(self.pattern_mismatch("positional", ty)),
            },
        };
        if parts.len() != subpatterns.len() {
            return Err(rejected(BuildError::PatternArity {
                ty: self.name(ty),
                expected: parts.len(),
                found: subpatterns.len(),
            }));
        }
        for (&sub, &part) in subpatterns.iter().zip(&parts) {
            self.ensure_pattern_input(sub, part)?;
        }
        if let Some(var) = var {
            self.ensure_binds(var, ty)?;
        }
        Ok(self.push_pattern(
            Pattern::Positional {
                ty,
                deconstruct,
                subpatterns,
                var,
            },
            info(input, ty),
        ))
    }

    /// `T { A: p1, B: p2 } x`. Every member must be readable on `ty`.
    pub fn property_pattern(
        &mut self,
        input: TypeId,
        ty: TypeId,
        subpatterns: Vec<MemberPattern>,
        var: Option<VarId>,
    ) -> BuildResult<PatternId> {
        self.ensure_type_test(input, ty, "property")?;
        for sub in &subpatterns {
            let (name, declaring, member_ty) = match sub.member {
                MemberRef::Field(f) => {
                    let def = self.pool.field(f);
                    (def.name.clone(), def.declaring, def.ty)
                }
                MemberRef::Property(p) => {
                    let def = self.pool.property(p);
                    if def.getter.is_none() {
                        return Err(rejected(BuildError::MissingGetter {
                            member: def.name.clone(),
                        }));
                    }
                    (def.name.clone(), def.declaring, def.ty)
                }
            };
            if !self.owns_member(ty, declaring) {
                return Err(rejected(BuildError::MemberNotOnType {
                    member: name,
                    ty: self.name(ty),
                }));
            }
            self.ensure_pattern_input(sub.pattern, member_ty)?;
        }
        if let Some(var) = var {
            self.ensure_binds(var, ty)?;
        }
        Ok(self.push_pattern(
            Pattern::Property {
                ty,
                subpatterns,
                var,
            },
            info(input, ty),
        ))
    }

    /// `[p1, .., pn] x`.
    ///
    /// One-dimensional arrays use the built-in length and element access.
    /// Other types need an `int Count` or `int Length` getter and an indexer
    /// taking one `int`; a slice with a sub-pattern also needs
    /// `Slice(int, int)`.
    pub fn list_pattern(
        &mut self,
        input: TypeId,
        subpatterns: Vec<PatternId>,
        var: Option<VarId>,
    ) -> BuildResult<PatternId> {
        let slices: Vec<PatternId> = subpatterns
            .iter()
            .copied()
            .filter(|&p| matches!(self.pattern(p), Pattern::Slice(_)))
            .collect();
        if slices.len() > 1 {
            return Err(rejected(BuildError::MultipleSlices));
        }
        let slice_sub = slices.first().and_then(|&s| match self.pattern(s) {
            Pattern::Slice(sub) => *sub,
            _ => None,
        });

        let (element, length, indexer, slice) = match self.pool.array_element(input) {
            Some((element, 1)) => {
                if slice_sub.is_some() {
                    return Err(self.pattern_mismatch("slice", input));
                }
                (element, None, None, None)
            }
            Some(_) => return Err(self.pattern_mismatch("list", input)),
            None => {
                let Some((length, indexer, element)) = self.countable_indexable(input) else {
                    return Err(self.pattern_mismatch("list", input));
                };
                let slice = match slice_sub {
                    Some(sub) => {
                        let method = self.slice_method(input)?;
                        self.ensure_pattern_input(sub, self.pool.method(method).ret)?;
                        Some(method)
                    }
                    None => None,
                };
                (element, Some(length), Some(indexer), slice)
            }
        };
        for &sub in &subpatterns {
            if slices.contains(&sub) {
                if self.pattern_info(sub).input != input {
                    return Err(self.pattern_mismatch("slice", input));
                }
            } else {
                self.ensure_pattern_input(sub, element)?;
            }
        }
        if let Some(var) = var {
            self.ensure_binds(var, input)?;
        }
        Ok(self.push_pattern(
            Pattern::List {
                length,
                indexer,
                slice,
                subpatterns,
                var,
            },
            info(input, self.pool.non_nullable(input)),
        ))
    }

    /// `..` or `.. p` inside a list pattern over `input`. The sub-pattern is
    /// matched against the sliced value.
    pub fn slice_pattern(&mut self, input: TypeId, sub: Option<PatternId>) -> PatternId {
        self.push_pattern(Pattern::Slice(sub), info(input, input))
    }

    /// Rebuild `pattern` against `input` through its factory.
    pub fn rebuild_pattern(&mut self, input: TypeId, pattern: Pattern) -> BuildResult<PatternId> {
        match pattern {
            Pattern::Discard => Ok(self.discard_pattern(input)),
            Pattern::Constant(value) => self.constant_pattern(input, value),
            Pattern::Type(ty) => self.type_pattern(input, ty),
            Pattern::Declaration { ty, var } => self.declaration_pattern(input, ty, var),
            Pattern::Var(var) => self.var_pattern(input, var),
            Pattern::Relational { op, value } => self.relational_pattern(input, op, value),
            Pattern::Not(p) => self.not_pattern(input, p),
            Pattern::And(l, r) => self.and_pattern(input, l, r),
            Pattern::Or(l, r) => self.or_pattern(input, l, r),
            Pattern::Positional {
                ty,
                deconstruct,
                subpatterns,
                var,
            } => self.positional_pattern(input, ty, deconstruct, subpatterns, var),
            Pattern::Property {
                ty,
                subpatterns,
                var,
            } => self.property_pattern(input, ty, subpatterns, var),
            Pattern::List {
                subpatterns, var, ..
            } => self.list_pattern(input, subpatterns, var),
            Pattern::Slice(sub) => Ok(self.slice_pattern(input, sub)),
        }
    }

    // Checks

    /// `pattern` was built against a type `input` feeds. Slices are only
    /// valid directly inside a list pattern.
    pub(crate) fn ensure_pattern_input(&self, pattern: PatternId, input: TypeId) -> BuildResult<()> {
        let p = self.pattern(pattern);
        if matches!(p, Pattern::Slice(_)) {
            return Err(rejected(BuildError::SliceOutsideList));
        }
        let expected = self.pattern_info(pattern).input;
        if expected == input || self.converts(expected, input) {
            Ok(())
        } else {
            Err(self.pattern_mismatch(p.name(), input))
        }
    }

    fn ensure_type_test(&self, input: TypeId, ty: TypeId, pattern: &'static str) -> BuildResult<()> {
        self.ensure_node_type(ty)?;
        if self.pool.is_explicitly_convertible(ty, input) {
            Ok(())
        } else {
            Err(self.pattern_mismatch(pattern, input))
        }
    }

    fn ensure_binds(&self, var: VarId, ty: TypeId) -> BuildResult<()> {
        let var_ty = self.var_ty(var);
        if self.converts(var_ty, ty) {
            Ok(())
        } else {
            Err(rejected(BuildError::IncompatibleTypes {
                context: "pattern variable",
                expected: self.name(ty),
                found: self.name(var_ty),
            }))
        }
    }

    fn countable_indexable(&self, ty: TypeId) -> Option<(PropertyId, PropertyId, TypeId)> {
        let pool = &*self.pool;
        let readable_int = |p: PropertyId| {
            let def = pool.property(p);
            def.ty == TypeId::INT32 && def.getter.is_some()
        };
        let length = pool
            .find_property(ty, "Count")
            .filter(|&p| readable_int(p))
            .or_else(|| pool.find_property(ty, "Length").filter(|&p| readable_int(p)))?;
        let indexer = pool.find_indexer(ty).filter(|&p| {
            let def = pool.property(p);
            def.getter.is_some()
                && matches!(def.index_params.as_slice(), [param] if param.ty == TypeId::INT32)
        })?;
        Some((length, indexer, pool.property(indexer).ty))
    }

    fn slice_method(&self, ty: TypeId) -> BuildResult<MethodId> {
        self.pool
            .find_method(ty, "Slice", 2)
            .filter(|&m| {
                let def = self.pool.method(m);
                !def.is_static && def.params.iter().all(|p| p.ty == TypeId::INT32)
            })
            .ok_or_else(|| self.pattern_mismatch("slice", ty))
    }

    fn pattern_mismatch(&self, pattern: &'static str, input: TypeId) -> BuildError {
        rejected(BuildError::PatternTypeMismatch {
            pattern,
            input: self.name(input),
        })
    }
}

fn info(input: TypeId, narrowed: TypeId) -> PatternInfo {
    PatternInfo { input, narrowed }
}
