use super::*;
use arbor_ir::{BinaryOp, NodeArena, NodeKind, Pattern, Prim};
use arbor_types::{ConstValue, TypePool};
use pretty_assertions::assert_eq;

struct Unchanged;

impl Rewriter for Unchanged {
    type Error = BuildError;
}

struct Rename {
    from: VarId,
    to: VarId,
}

impl Rewriter for Rename {
    type Error = BuildError;

    fn rewrite_var(&mut self, _: &mut TreeBuilder<'_>, var: VarId) -> Result<VarId, BuildError> {
        Ok(if var == self.from { self.to } else { var })
    }
}

/// Replaces every `int` constant with `with`.
struct Replace {
    with: NodeId,
}

impl Rewriter for Replace {
    type Error = BuildError;

    fn rewrite_node(
        &mut self,
        builder: &mut TreeBuilder<'_>,
        id: NodeId,
    ) -> Result<NodeId, BuildError> {
        match builder.kind(id) {
            NodeKind::Prim(Prim::Constant(ConstValue::Int(_))) => Ok(self.with),
            _ => walk_rewrite(self, builder, id),
        }
    }
}

#[test]
fn untouched_trees_keep_their_handles() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let x = b.new_var("x", TypeId::INT32);
    let xr = b.variable(x);
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, xr, one).unwrap();
    let store = b.assign(xr, sum).unwrap();
    let block = b.block(vec![x], vec![store, xr]).unwrap();
    let before = b.arena().len();

    let result = Unchanged.rewrite_node(&mut b, block).unwrap();
    assert_eq!(result, block);
    assert_eq!(b.arena().len(), before);
}

#[test]
fn renaming_rebuilds_only_the_changed_spine() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let x = b.new_var("x", TypeId::INT32);
    let y = b.new_var("y", TypeId::INT32);
    let xr = b.variable(x);
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, xr, one).unwrap();
    let block = b.block(vec![], vec![one, sum]).unwrap();

    let result = Rename { from: x, to: y }
        .rewrite_node(&mut b, block)
        .unwrap();
    assert_ne!(result, block);
    let NodeKind::Prim(Prim::Block { exprs, .. }) = b.kind(result).clone() else {
        panic!("expected a block");
    };
    // The constant is shared, the sum is new.
    assert_eq!(exprs[0], one);
    assert_ne!(exprs[1], sum);
    let NodeKind::Prim(Prim::Binary { left, right, .. }) = b.kind(exprs[1]).clone() else {
        panic!("expected a binary node");
    };
    assert_eq!(*b.kind(left), NodeKind::Prim(Prim::Variable(y)));
    assert_eq!(right, one);
    // The original tree is unchanged.
    assert_eq!(*b.kind(xr), NodeKind::Prim(Prim::Variable(x)));
}

#[test]
fn replacements_keep_identity_types() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let x = b.new_var("x", TypeId::INT32);
    let s = b.new_var("s", TypeId::STRING);
    let xr = b.variable(x);

    let err = Rename { from: x, to: s }.rewrite_node(&mut b, xr).unwrap_err();
    assert_eq!(
        err,
        BuildError::IdentityTypeChanged {
            what: "variable",
            expected: "int".to_owned(),
            found: "string".to_owned(),
        }
    );
}

#[test]
fn rebuilt_parents_are_validated() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let x = b.new_var("x", TypeId::INT64);
    let xr = b.variable(x);
    let one = b.int(1);
    let diff = b.binary(BinaryOp::Subtract, xr, one).unwrap();

    let two = b.int(2);
    let replaced = Replace { with: two }.rewrite_node(&mut b, diff).unwrap();
    assert_eq!(b.ty(replaced), TypeId::INT64);

    let text = b.string("two");
    assert_eq!(
        Replace { with: text }.rewrite_node(&mut b, diff).unwrap_err(),
        BuildError::OperatorNotDefined {
            op: "-".to_owned(),
            operands: "`long` and `string`".to_owned(),
        }
    );
}

#[test]
fn patterns_are_rewritten_through_their_bindings() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let o = b.new_var("o", TypeId::OBJECT);
    let s = b.new_var("s", TypeId::STRING);
    let t = b.new_var("t", TypeId::STRING);
    let or = b.variable(o);
    let binds = b.declaration_pattern(TypeId::OBJECT, TypeId::STRING, s).unwrap();
    let test = b.is_pattern(or, binds).unwrap();

    let same = Rename { from: t, to: s }.rewrite_node(&mut b, test).unwrap();
    assert_eq!(same, test);

    let renamed = Rename { from: s, to: t }.rewrite_node(&mut b, test).unwrap();
    let NodeKind::Switch(arbor_ir::SwitchKind::IsPattern { pattern, .. }) =
        b.kind(renamed).clone()
    else {
        panic!("expected an is-pattern node");
    };
    assert_ne!(pattern, binds);
    assert_eq!(
        *b.pattern(pattern),
        Pattern::Declaration {
            ty: TypeId::STRING,
            var: t
        }
    );
    assert_eq!(b.pattern_info(pattern), b.pattern_info(binds));
}

/// Stops at the first occurrence of a variable.
#[derive(Debug, PartialEq)]
enum Search {
    Found(VarId),
    Build(BuildError),
}

impl From<BuildError> for Search {
    fn from(err: BuildError) -> Self {
        Search::Build(err)
    }
}

struct FindVar;

impl Rewriter for FindVar {
    type Error = Search;

    fn rewrite_var(&mut self, _: &mut TreeBuilder<'_>, var: VarId) -> Result<VarId, Search> {
        Err(Search::Found(var))
    }
}

#[test]
fn rewriters_carry_their_own_errors() {
    let mut arena = NodeArena::new();
    let mut pool = TypePool::new();
    let mut b = TreeBuilder::new(&mut arena, &mut pool);
    let x = b.new_var("x", TypeId::INT32);
    let xr = b.variable(x);
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, one, xr).unwrap();

    assert_eq!(FindVar.rewrite_node(&mut b, sum), Err(Search::Found(x)));
    assert_eq!(FindVar.rewrite_node(&mut b, one), Ok(one));
}
