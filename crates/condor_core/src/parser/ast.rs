//! Condor Abstract Syntax Tree node definitions.
//!
//! Nodes are plain data.  They live in the isolate's node arena and refer to
//! each other through [`NodeRef`] handles; bodies that belong to a construct
//! (function, loop, branch, object) are separate [`Scope`]s referenced by
//! [`ScopeRef`].
//!
//! # Structure
//!
//! - [`Node`]: attributes shared by every node (position, export flag,
//!   visibility modifiers) plus the variant payload.
//! - [`NodeKind`]: one variant per construct.
//! - Payload structs: [`FuncNode`], [`VarNode`], [`LiteralNode`],
//!   [`BinaryNode`], [`CallNode`], [`IfNode`], ...

use smallvec::SmallVec;

use crate::gc::handle::Handle;
use crate::gc::trace::{Trace, Tracer};
use crate::parser::scanner::TokenKind;
use crate::parser::scope::Scope;

/// Handle to a node in the isolate's node arena.
pub type NodeRef = Handle<Node>;
/// Handle to a scope in the isolate's scope arena.
pub type ScopeRef = Handle<Scope>;

// ─────────────────────────────────────────────────────────────────────────────
// Modifiers
// ─────────────────────────────────────────────────────────────────────────────

/// A visibility modifier keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Static,
    Private,
    Protected,
}

impl Visibility {
    /// The modifier a token spells, if it spells one.
    pub fn from_token(kind: TokenKind) -> Option<Visibility> {
        match kind {
            TokenKind::Public => Some(Visibility::Public),
            TokenKind::Static => Some(Visibility::Static),
            TokenKind::Private => Some(Visibility::Private),
            TokenKind::Protected => Some(Visibility::Protected),
            _ => None,
        }
    }

    /// The keyword as written in source.
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Static => "static",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        }
    }
}

/// Ordered visibility modifiers.  Declarations rarely carry more than two,
/// so they are stored inline.
pub type Modifiers = SmallVec<[Visibility; 4]>;

// ─────────────────────────────────────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────────────────────────────────────

/// One AST node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// 1-based source line of the node's first token.
    pub row: u32,
    /// 1-based source column of the node's first token.
    pub col: u32,
    pub is_export: bool,
    pub visibility: Modifiers,
}

impl Node {
    /// A node with no modifiers.
    pub fn new(kind: NodeKind, row: u32, col: u32) -> Self {
        Self {
            kind,
            row,
            col,
            is_export: false,
            visibility: Modifiers::new(),
        }
    }

    /// The identifying name used by scope lookup, if the node has one.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Func(f) => Some(&f.name),
            NodeKind::Var(v) => Some(&v.name),
            NodeKind::Object(o) => Some(&o.name),
            NodeKind::FuncCall(c) => Some(&c.name),
            NodeKind::Import(m) | NodeKind::Include(m) => Some(&m.name),
            NodeKind::Literal(l) => Some(&l.value),
            _ => None,
        }
    }

    /// Short lowercase label for the variant, as used in tree dumps.
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn as_func(&self) -> Option<&FuncNode> {
        match &self.kind {
            NodeKind::Func(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&VarNode> {
        match &self.kind {
            NodeKind::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralNode> {
        match &self.kind {
            NodeKind::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryNode> {
        match &self.kind {
            NodeKind::BinaryExpr(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_if(&self) -> Option<&IfNode> {
        match &self.kind {
            NodeKind::If(i) => Some(i),
            _ => None,
        }
    }
}

impl Trace for Node {
    fn trace(&self, tracer: &mut Tracer) {
        self.kind.trace(tracer);
    }
}

/// Variant payload of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `func name(args) { body }`
    Func(FuncNode),
    /// A variable declaration or a function argument.
    Var(VarNode),
    /// An identifier, number, string, char or boolean term.
    Literal(LiteralNode),
    /// `left op right`, or a prefix operator when `left` is absent.
    BinaryExpr(BinaryNode),
    /// `[a, b, c]`
    Array(ArrayNode),
    /// `name(params)` or `%name(params)`.
    FuncCall(CallNode),
    /// `for (init; condition; tick) { body }`
    For(ForNode),
    /// `while (condition) { body }`
    While(WhileNode),
    /// `try { } catch (params) { }`
    TryCatch(TryCatchNode),
    /// `throw value`
    Throw(ThrowNode),
    /// `if (condition) { } else if ... else { }`
    If(IfNode),
    /// `delete name;`
    Delete(DeleteNode),
    /// `switch (value) { case ...: { } }`
    Switch(SwitchNode),
    /// One `case` or `default` arm.
    Case(CaseNode),
    /// `object name { members }`
    Object(ObjectNode),
    /// `import "name" [as "alias"]`
    Import(ModuleNode),
    /// `include "name" [as "alias"]`
    Include(ModuleNode),
    /// `return [value]`
    Return(ReturnNode),
    /// The value of a declared-but-unassigned variable.
    Undefined,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Func(_) => "func",
            NodeKind::Var(_) => "var",
            NodeKind::Literal(_) => "literal",
            NodeKind::BinaryExpr(_) => "binary",
            NodeKind::Array(_) => "array",
            NodeKind::FuncCall(_) => "call",
            NodeKind::For(_) => "for",
            NodeKind::While(_) => "while",
            NodeKind::TryCatch(_) => "try",
            NodeKind::Throw(_) => "throw",
            NodeKind::If(_) => "if",
            NodeKind::Delete(_) => "delete",
            NodeKind::Switch(_) => "switch",
            NodeKind::Case(_) => "case",
            NodeKind::Object(_) => "object",
            NodeKind::Import(_) => "import",
            NodeKind::Include(_) => "include",
            NodeKind::Return(_) => "return",
            NodeKind::Undefined => "undefined",
        }
    }
}

impl Trace for NodeKind {
    fn trace(&self, tracer: &mut Tracer) {
        fn opt(tracer: &mut Tracer, node: Option<NodeRef>) {
            if let Some(n) = node {
                tracer.mark_node(n);
            }
        }
        fn all(tracer: &mut Tracer, nodes: &[NodeRef]) {
            for &n in nodes {
                tracer.mark_node(n);
            }
        }

        match self {
            NodeKind::Func(f) => {
                all(tracer, &f.args);
                tracer.mark_scope(f.body);
            }
            NodeKind::Var(v) => opt(tracer, v.value),
            NodeKind::Literal(_) | NodeKind::Import(_) | NodeKind::Include(_) => {}
            NodeKind::BinaryExpr(b) => {
                opt(tracer, b.left);
                tracer.mark_node(b.right);
            }
            NodeKind::Array(a) => all(tracer, &a.members),
            NodeKind::FuncCall(c) => all(tracer, &c.params),
            NodeKind::For(f) => {
                opt(tracer, f.init);
                tracer.mark_node(f.condition);
                opt(tracer, f.tick);
                tracer.mark_scope(f.body);
            }
            NodeKind::While(w) => {
                tracer.mark_node(w.condition);
                tracer.mark_scope(w.body);
            }
            NodeKind::TryCatch(t) => {
                tracer.mark_scope(t.try_body);
                all(tracer, &t.catch_params);
                tracer.mark_scope(t.catch_body);
            }
            NodeKind::Throw(t) => opt(tracer, t.value),
            NodeKind::If(i) => {
                tracer.mark_node(i.condition);
                tracer.mark_scope(i.body);
                all(tracer, &i.else_ifs);
                opt(tracer, i.else_branch);
            }
            NodeKind::Delete(d) => tracer.mark_node(d.target),
            NodeKind::Switch(s) => {
                tracer.mark_node(s.value);
                all(tracer, &s.cases);
            }
            NodeKind::Case(c) => {
                opt(tracer, c.condition);
                tracer.mark_scope(c.body);
            }
            NodeKind::Object(o) => {
                tracer.mark_scope(o.body);
                for &key in &o.keys {
                    tracer.mark_key(key);
                }
            }
            NodeKind::Return(r) => opt(tracer, r.value),
            NodeKind::Undefined => {}
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FuncNode {
    pub name: String,
    /// [`VarNode`] arguments in declaration order.
    pub args: Vec<NodeRef>,
    pub body: ScopeRef,
}

/// A variable declaration.
///
/// For a function argument, `base_type`/`base_name` hold the first token of
/// the argument (its type) and `name` the optional second identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct VarNode {
    pub name: String,
    /// Raw text of the type token (`var`, `int`, a type name, ...).
    pub base_name: String,
    pub base_type: TokenKind,
    /// The assignment operator used, `None` for arguments.
    pub assignment: Option<TokenKind>,
    pub value: Option<NodeRef>,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralNode {
    /// Raw text of the term (strings without their quotes).
    pub value: String,
    /// Kind of the token the term was read from.
    pub lit_type: TokenKind,
    /// `++` or `--` applied to the term.
    pub unary: Option<TokenKind>,
    /// `true` when `unary` was written after the term.
    pub is_post: bool,
}

impl LiteralNode {
    pub fn new(value: impl Into<String>, lit_type: TokenKind) -> Self {
        Self {
            value: value.into(),
            lit_type,
            unary: None,
            is_post: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryNode {
    pub left: Option<NodeRef>,
    pub op: TokenKind,
    pub right: NodeRef,
    /// Set when the expression is used as a condition.
    pub is_boolean: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    pub members: Vec<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    pub name: String,
    pub params: Vec<NodeRef>,
    /// `%name(...)` native call.
    pub is_internal: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub init: Option<NodeRef>,
    pub condition: NodeRef,
    pub tick: Option<NodeRef>,
    pub body: ScopeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileNode {
    pub condition: NodeRef,
    pub body: ScopeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryCatchNode {
    pub try_body: ScopeRef,
    pub catch_params: Vec<NodeRef>,
    pub catch_body: ScopeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowNode {
    pub value: Option<NodeRef>,
}

/// An `if` with its flat chain of `else if` branches.
///
/// Each entry of `else_ifs` is itself an `If` node with empty chains.  A
/// trailing `else` is an `If` node whose condition is a synthetic `true`
/// literal.
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub condition: NodeRef,
    pub body: ScopeRef,
    pub else_ifs: Vec<NodeRef>,
    pub else_branch: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteNode {
    pub target: NodeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchNode {
    pub value: NodeRef,
    pub cases: Vec<NodeRef>,
}

/// A `case` arm, or the `default` arm when `condition` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseNode {
    pub condition: Option<NodeRef>,
    pub body: ScopeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub name: String,
    pub body: ScopeRef,
    /// One identifier literal per named member, in declaration order.
    pub keys: Vec<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleNode {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnNode {
    pub value: Option<NodeRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::handle::Slots;
    use crate::gc::pool::SizeClass;

    fn scope_handle() -> ScopeRef {
        let mut scopes = Slots::new();
        scopes.insert(Scope::new(), SizeClass::Medium, 0)
    }

    #[test]
    fn test_visibility_from_token() {
        assert_eq!(Visibility::from_token(TokenKind::Public), Some(Visibility::Public));
        assert_eq!(Visibility::from_token(TokenKind::Protected), Some(Visibility::Protected));
        assert_eq!(Visibility::from_token(TokenKind::Export), None);
        assert_eq!(Visibility::Static.as_str(), "static");
    }

    #[test]
    fn test_new_node_has_no_modifiers() {
        let node = Node::new(NodeKind::Undefined, 2, 5);
        assert!(!node.is_export);
        assert!(node.visibility.is_empty());
        assert_eq!((node.row, node.col), (2, 5));
        assert_eq!(node.label(), "undefined");
    }

    #[test]
    fn test_modifiers_stay_inline() {
        let mut node = Node::new(NodeKind::Undefined, 1, 1);
        node.visibility.push(Visibility::Public);
        node.visibility.push(Visibility::Static);
        assert!(!node.visibility.spilled());
    }

    #[test]
    fn test_identifying_names() {
        let body = scope_handle();
        let func = Node::new(
            NodeKind::Func(FuncNode {
                name: "add".into(),
                args: Vec::new(),
                body,
            }),
            1,
            1,
        );
        assert_eq!(func.name(), Some("add"));
        assert_eq!(func.as_func().map(|f| f.body), Some(body));

        let import = Node::new(
            NodeKind::Import(ModuleNode {
                name: "io".into(),
                alias: Some("std".into()),
            }),
            1,
            1,
        );
        assert_eq!(import.name(), Some("io"));

        let lit = Node::new(NodeKind::Literal(LiteralNode::new("x", TokenKind::Ident)), 1, 1);
        assert_eq!(lit.name(), Some("x"));

        assert_eq!(Node::new(NodeKind::Undefined, 1, 1).name(), None);
    }
}
