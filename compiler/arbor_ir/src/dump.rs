//! S-expression dump of a tree, for debugging and shape assertions in tests.
//!
//! ```text
//! (assign x (add x y))
//! (block $t2 (assign $t2 (call Counter.Create)) (assign (property Count $t2) 3))
//! (loop (block ...) :break)
//! ```
//!
//! Variables print as their declared names, labels as `:name` (or `:L<index>`
//! when unnamed). Primitive nodes name the member or type they use; other
//! families print their kind name followed by their children in fold order.

use std::fmt::Write;

use arbor_types::TypePool;

use crate::node::{InterpKind, InterpPart, NodeKind, Pattern, Prim, SwitchKind};
use crate::visitor::{walk_node, walk_pattern, Visitor};
use crate::{LabelId, NodeArena, NodeId, PatternId, VarId};

/// Render the tree rooted at `id` on one line.
pub fn dump(arena: &NodeArena, pool: &TypePool, id: NodeId) -> String {
    let mut dumper = Dumper {
        pool,
        out: String::new(),
    };
    dumper.visit_node(id, arena);
    dumper.out
}

struct Dumper<'a> {
    pool: &'a TypePool,
    out: String,
}

impl Dumper<'_> {
    fn sep(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('(') {
            self.out.push(' ');
        }
    }

    fn token(&mut self, text: &str) {
        self.sep();
        self.out.push_str(text);
    }

    fn open(&mut self, head: &str) {
        self.sep();
        self.out.push('(');
        self.out.push_str(head);
    }

    fn close(&mut self) {
        self.out.push(')');
    }

    fn label_name(arena: &NodeArena, label: LabelId) -> String {
        match &arena.label(label).name {
            Some(name) => name.clone(),
            None => format!("L{}", label.raw()),
        }
    }

    fn prim_head(&self, prim: &Prim, id: NodeId, arena: &NodeArena) -> String {
        let pool = self.pool;
        let ty = pool.name(arena.ty(id));
        match prim {
            Prim::Binary { op, method, .. } => match method {
                Some(m) => format!("{} :method {}", op.name(), pool.method(*m).name),
                None => op.name().to_owned(),
            },
            Prim::Unary { op, method, .. } => match method {
                Some(m) => format!("{} :method {}", op.name(), pool.method(*m).name),
                None if op.is_conversion() => format!("{} {ty}", op.name()),
                None => op.name().to_owned(),
            },
            Prim::Field { receiver, field } => {
                let def = pool.field(*field);
                if receiver.is_some() {
                    format!("field {}", def.name)
                } else {
                    format!("field {}.{}", pool.name(def.declaring), def.name)
                }
            }
            Prim::Property {
                receiver, property, ..
            } => {
                let def = pool.property(*property);
                if receiver.is_some() {
                    format!("property {}", def.name)
                } else {
                    format!("property {}.{}", pool.name(def.declaring), def.name)
                }
            }
            Prim::Call {
                receiver, method, ..
            } => {
                let def = pool.method(*method);
                if receiver.is_some() {
                    format!("call {}", def.name)
                } else {
                    format!("call {}.{}", pool.name(def.declaring), def.name)
                }
            }
            Prim::New { .. } | Prim::NewArrayInit { .. } | Prim::NewArrayBounds { .. } => {
                format!("{} {ty}", prim.name())
            }
            Prim::TypeIs { test_type, .. } => format!("is {}", pool.name(*test_type)),
            Prim::Throw { value: None } => "rethrow".to_owned(),
            Prim::Goto { kind, .. } => kind.name().to_owned(),
            Prim::Dynamic { site, .. } => format!("dynamic {}", site.kind.name()),
            Prim::Try { handlers, .. } if !handlers.is_empty() => {
                let types: Vec<&str> = handlers.iter().map(|h| pool.name(h.test_type)).collect();
                format!("try :catch {}", types.join(","))
            }
            _ => prim.name().to_owned(),
        }
    }

    fn dump_switch(&mut self, id: NodeId, arena: &NodeArena) -> bool {
        let NodeKind::Switch(SwitchKind::Statement(sw)) = arena.kind(id) else {
            return false;
        };
        self.open("switch");
        self.visit_node(sw.value, arena);
        for case in &sw.cases {
            self.open("case");
            for value in &case.test_values {
                self.token(&value.to_string());
            }
            if case.is_default {
                self.token("default");
            }
            for &stmt in &case.body {
                self.visit_node(stmt, arena);
            }
            self.close();
        }
        self.close();
        true
    }

    fn dump_interpolated(&mut self, id: NodeId, arena: &NodeArena) -> bool {
        let NodeKind::Interp(InterpKind::String { parts }) = arena.kind(id) else {
            return false;
        };
        self.open("interpolated");
        for part in parts {
            match part {
                InterpPart::Literal(text) => self.token(&format!("{:?}", &**text)),
                InterpPart::Insert { value, .. } => self.visit_node(*value, arena),
            }
        }
        self.close();
        true
    }
}

impl Visitor for Dumper<'_> {
    fn visit_node(&mut self, id: NodeId, arena: &NodeArena) {
        if self.dump_switch(id, arena) || self.dump_interpolated(id, arena) {
            return;
        }
        match arena.kind(id) {
            NodeKind::Prim(Prim::Constant(value)) => self.token(&value.to_string()),
            NodeKind::Prim(Prim::Variable(var)) => self.token(&arena.var(*var).name),
            NodeKind::Prim(Prim::Default) => {
                let head = format!("default {}", self.pool.name(arena.ty(id)));
                self.open(&head);
                self.close();
            }
            NodeKind::Prim(prim) => {
                let head = self.prim_head(prim, id, arena);
                self.open(&head);
                walk_node(self, id, arena);
                self.close();
            }
            NodeKind::Switch(SwitchKind::GotoCase { value }) => {
                self.open(&format!("goto-case {value}"));
                self.close();
            }
            kind => {
                self.open(kind.name());
                walk_node(self, id, arena);
                self.close();
            }
        }
    }

    fn visit_var(&mut self, var: VarId, arena: &NodeArena) {
        self.token(&arena.var(var).name);
    }

    fn visit_label(&mut self, label: LabelId, arena: &NodeArena) {
        let name = Self::label_name(arena, label);
        self.token(&format!(":{name}"));
    }

    fn visit_pattern(&mut self, id: PatternId, arena: &NodeArena) {
        let pool = self.pool;
        let mut head = String::from(arena.pattern(id).name());
        match arena.pattern(id) {
            Pattern::Constant(value) => {
                let _ = write!(head, " {value}");
            }
            Pattern::Relational { op, value } => {
                let _ = write!(head, " {} {value}", op.binary().symbol());
            }
            Pattern::Type(ty)
            | Pattern::Declaration { ty, .. }
            | Pattern::Positional { ty, .. }
            | Pattern::Property { ty, .. } => {
                let _ = write!(head, " {}", pool.name(*ty));
            }
            _ => {}
        }
        self.open(&head);
        walk_pattern(self, id, arena);
        self.close();
    }
}
