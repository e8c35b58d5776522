//! S-expression dump of a scope tree.
//!
//! Positions are not printed, so two trees built from the same text at
//! different offsets dump identically.  Deferred bodies print as
//! `(deferred "<raw text>")`.

use crate::isolate::Isolate;
use crate::parser::ast::{Node, NodeKind, NodeRef, ScopeRef};
use crate::parser::scanner::TokenKind;
use crate::parser::scope::ScopeBody;

/// Dump `scope` and everything below it.
pub fn dump(isolate: &Isolate, scope: ScopeRef) -> String {
    let mut printer = TreePrinter::new(isolate);
    printer.scope(scope);
    printer.finish()
}

/// Dump a single node and everything below it.
pub fn dump_node(isolate: &Isolate, node: NodeRef) -> String {
    let mut printer = TreePrinter::new(isolate);
    printer.node(node);
    printer.finish()
}

fn symbol(op: TokenKind) -> &'static str {
    op.describe().trim_matches('\'')
}

struct TreePrinter<'iso> {
    isolate: &'iso Isolate,
    output: String,
    indent: usize,
}

impl<'iso> TreePrinter<'iso> {
    fn new(isolate: &'iso Isolate) -> Self {
        Self {
            isolate,
            output: String::new(),
            indent: 0,
        }
    }

    fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        self.output.push('\n');
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
    }

    fn scope(&mut self, handle: ScopeRef) {
        let Some(scope) = self.isolate.scope(handle) else {
            self.write("<stale>");
            return;
        };
        match scope.body() {
            ScopeBody::Unparsed { raw } => {
                self.write(&format!("(deferred {:?})", raw.trim()));
            }
            ScopeBody::Parsed { nodes } => {
                self.write("(scope");
                self.indent += 1;
                for &node in nodes {
                    self.newline();
                    self.node(node);
                }
                self.indent -= 1;
                self.write(")");
            }
        }
    }

    /// A child scope on its own indented line.
    fn body(&mut self, handle: ScopeRef) {
        self.indent += 1;
        self.newline();
        self.scope(handle);
        self.indent -= 1;
    }

    fn opt(&mut self, node: Option<NodeRef>) {
        match node {
            Some(n) => self.node(n),
            None => self.write("_"),
        }
    }

    fn list(&mut self, nodes: &[NodeRef]) {
        for &n in nodes {
            self.write(" ");
            self.node(n);
        }
    }

    fn open(&mut self, node: &Node) {
        self.write("(");
        self.write(node.label());
        self.modifiers(node);
    }

    fn modifiers(&mut self, node: &Node) {
        if node.is_export {
            self.write(" :export");
        }
        for v in &node.visibility {
            self.write(" :");
            self.write(v.as_str());
        }
    }

    fn node(&mut self, handle: NodeRef) {
        let isolate = self.isolate;
        let Some(node) = isolate.node(handle) else {
            self.write("<stale>");
            return;
        };
        match &node.kind {
            NodeKind::Literal(lit) => {
                let text = match lit.lit_type {
                    TokenKind::Str => format!("{:?}", lit.value),
                    TokenKind::Char => format!("'{}'", lit.value),
                    _ => lit.value.clone(),
                };
                let text = match (lit.unary, lit.is_post) {
                    (Some(op), true) => format!("{text}{}", symbol(op)),
                    (Some(op), false) => format!("{}{text}", symbol(op)),
                    (None, _) => text,
                };
                self.bare(node, &text);
            }
            NodeKind::Undefined => self.bare(node, "undefined"),
            NodeKind::BinaryExpr(b) => {
                self.write("(");
                self.write(symbol(b.op));
                self.modifiers(node);
                if let Some(left) = b.left {
                    self.write(" ");
                    self.node(left);
                }
                self.write(" ");
                self.node(b.right);
                self.write(")");
            }
            NodeKind::Func(f) => {
                self.open(node);
                self.write(&format!(" {} (args", f.name));
                self.list(&f.args);
                self.write(")");
                self.body(f.body);
                self.write(")");
            }
            NodeKind::Var(v) => {
                self.open(node);
                self.write(" ");
                self.write(&v.base_name);
                if v.is_array {
                    self.write("[]");
                }
                if !v.name.is_empty() {
                    self.write(" ");
                    self.write(&v.name);
                }
                if let Some(value) = v.value {
                    if let Some(op) = v.assignment.filter(|op| op.is_assignment()) {
                        self.write(" ");
                        self.write(symbol(op));
                    }
                    self.write(" ");
                    self.node(value);
                }
                self.write(")");
            }
            NodeKind::Array(a) => {
                self.open(node);
                self.list(&a.members);
                self.write(")");
            }
            NodeKind::FuncCall(c) => {
                self.write(if c.is_internal { "(native" } else { "(call" });
                self.modifiers(node);
                self.write(" ");
                self.write(&c.name);
                self.list(&c.params);
                self.write(")");
            }
            NodeKind::For(f) => {
                self.open(node);
                self.write(" ");
                self.opt(f.init);
                self.write(" ");
                self.node(f.condition);
                self.write(" ");
                self.opt(f.tick);
                self.body(f.body);
                self.write(")");
            }
            NodeKind::While(w) => {
                self.open(node);
                self.write(" ");
                self.node(w.condition);
                self.body(w.body);
                self.write(")");
            }
            NodeKind::TryCatch(t) => {
                self.open(node);
                self.body(t.try_body);
                self.indent += 1;
                self.newline();
                self.write("(catch (args");
                self.list(&t.catch_params);
                self.write(")");
                self.body(t.catch_body);
                self.write(")");
                self.indent -= 1;
                self.write(")");
            }
            NodeKind::Throw(t) => {
                self.open(node);
                self.write(" ");
                self.opt(t.value);
                self.write(")");
            }
            NodeKind::Return(r) => {
                self.open(node);
                if let Some(value) = r.value {
                    self.write(" ");
                    self.node(value);
                }
                self.write(")");
            }
            NodeKind::If(i) => {
                self.open(node);
                self.write(" ");
                self.node(i.condition);
                self.body(i.body);
                self.indent += 1;
                for &branch in &i.else_ifs {
                    self.newline();
                    self.branch("elif", branch, true);
                }
                if let Some(branch) = i.else_branch {
                    self.newline();
                    self.branch("else", branch, false);
                }
                self.indent -= 1;
                self.write(")");
            }
            NodeKind::Delete(d) => {
                self.open(node);
                self.write(" ");
                self.node(d.target);
                self.write(")");
            }
            NodeKind::Switch(s) => {
                self.open(node);
                self.write(" ");
                self.node(s.value);
                self.indent += 1;
                for &case in &s.cases {
                    self.newline();
                    self.node(case);
                }
                self.indent -= 1;
                self.write(")");
            }
            NodeKind::Case(c) => {
                match c.condition {
                    Some(cond) => {
                        self.write("(case ");
                        self.node(cond);
                    }
                    None => self.write("(default"),
                }
                self.body(c.body);
                self.write(")");
            }
            NodeKind::Object(o) => {
                self.open(node);
                self.write(&format!(" {} (keys", o.name));
                self.list(&o.keys);
                self.write(")");
                self.body(o.body);
                self.write(")");
            }
            NodeKind::Import(m) | NodeKind::Include(m) => {
                self.open(node);
                self.write(&format!(" {:?}", m.name));
                if let Some(alias) = &m.alias {
                    self.write(&format!(" as {alias:?}"));
                }
                self.write(")");
            }
        }
    }

    /// A leaf value; wrapped with its label only when it carries modifiers.
    fn bare(&mut self, node: &Node, text: &str) {
        if !node.is_export && node.visibility.is_empty() {
            self.write(text);
            return;
        }
        self.open(node);
        self.write(" ");
        self.write(text);
        self.write(")");
    }

    /// An `elif`/`else` arm of an if chain.
    fn branch(&mut self, label: &str, handle: NodeRef, with_condition: bool) {
        let isolate = self.isolate;
        let Some(branch) = isolate.node(handle).and_then(Node::as_if) else {
            self.write("<stale>");
            return;
        };
        self.write("(");
        self.write(label);
        if with_condition {
            self.write(" ");
            self.node(branch.condition);
        }
        self.body(branch.body);
        self.write(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParserFlags, parse};

    fn dump_source(source: &str) -> String {
        let mut iso = Isolate::new();
        let root = parse(&mut iso, source, ParserFlags::default()).unwrap();
        dump(&iso, root)
    }

    #[test]
    fn test_dump_func_with_deferred_body() {
        let out = dump_source("func add(int a, int b){ return a + b; }");
        assert_eq!(
            out,
            "(scope\n  (func add (args (var int a) (var int b))\n    (deferred \"return a + b;\")))"
        );
    }

    #[test]
    fn test_dump_var_values() {
        let out = dump_source("var x = 1; string s = \"hi\"; int n;");
        assert_eq!(
            out,
            "(scope\n  (var var x = 1)\n  (var string s = \"hi\")\n  (var int n undefined))"
        );
    }

    #[test]
    fn test_dump_right_associative_chain() {
        let out = dump_source("x = a - b - c;");
        assert_eq!(out, "(scope\n  (= x (- a (- b c))))");
    }

    #[test]
    fn test_dump_modifiers_and_unary() {
        let out = dump_source("export var i = 0; public static var j = i++;");
        assert_eq!(
            out,
            "(scope\n  (var :export var i = 0)\n  (var :public :static var j = i++))"
        );
    }

    #[test]
    fn test_dump_if_chain() {
        let out = dump_source("if (a) { x(); } else if (b) { y(); } else { z(); }");
        assert_eq!(
            out,
            "(scope\n  (if a\n    (deferred \"x();\")\n    (elif b\n      (deferred \"y();\"))\n    (else\n      (deferred \"z();\"))))"
        );
    }

    #[test]
    fn test_dump_modifiers_on_expression_nodes() {
        let mut iso = Isolate::new();
        let root = parse(&mut iso, "x = 1; f(y); z;", ParserFlags::default()).unwrap();
        let stmts = iso.scope(root).unwrap().nodes().to_vec();
        for &n in &stmts {
            let node = iso.node_mut(n).unwrap();
            node.is_export = true;
        }
        assert_eq!(dump_node(&iso, stmts[0]), "(= :export x 1)");
        assert_eq!(dump_node(&iso, stmts[1]), "(call :export f y)");
        assert_eq!(dump_node(&iso, stmts[2]), "(literal :export z)");
    }

    #[test]
    fn test_dump_stale_scope() {
        let mut iso = Isolate::new();
        let root = parse(&mut iso, "", ParserFlags::default()).unwrap();
        iso.dispose();
        assert_eq!(dump(&iso, root), "<stale>");
    }
}
