//! Tracing support for the collector.
//!
//! The collectable graph has two kinds of vertices, AST nodes and scopes,
//! named uniformly by [`GcRef`].  Types that hold references into that graph
//! implement [`Trace`] and report each outgoing edge to a [`Tracer`], which
//! decides from its [`TraceOptions`] whether the edge is followed.

use crate::parser::ast::{NodeRef, ScopeRef};

/// A reference to any collectable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcRef {
    Node(NodeRef),
    Scope(ScopeRef),
}

impl From<NodeRef> for GcRef {
    fn from(node: NodeRef) -> Self {
        GcRef::Node(node)
    }
}

impl From<ScopeRef> for GcRef {
    fn from(scope: ScopeRef) -> Self {
        GcRef::Scope(scope)
    }
}

/// Which edges a trace follows.
///
/// Scope→node and node→node edges are always followed.  Node→scope edges
/// (function bodies, loop bodies, ...) are followed only when `deep` is set,
/// and object key nodes only when `include_object_keys` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceOptions {
    pub deep: bool,
    pub include_object_keys: bool,
}

impl TraceOptions {
    /// Follow every edge.
    pub const FULL: TraceOptions = TraceOptions {
        deep: true,
        include_object_keys: true,
    };
}

/// Drives the mark-and-trace traversal during a collection.
///
/// The tracer maintains a grey stack of objects that have been reached but
/// whose outgoing references have not yet been visited.  The collector pops
/// entries from the grey stack and calls [`Trace::trace`] on them, which in
/// turn pushes their referents onto the grey stack.
pub struct Tracer {
    pub(crate) gray_stack: Vec<GcRef>,
    options: TraceOptions,
}

impl Tracer {
    /// Create a new, empty `Tracer`.
    pub fn new(options: TraceOptions) -> Self {
        Self {
            gray_stack: Vec::new(),
            options,
        }
    }

    /// The options this tracer was created with.
    pub fn options(&self) -> TraceOptions {
        self.options
    }

    /// Report a node→node or scope→node edge.
    pub fn mark_node(&mut self, node: NodeRef) {
        self.gray_stack.push(GcRef::Node(node));
    }

    /// Report an edge into a child scope; followed only on deep traces.
    pub fn mark_scope(&mut self, scope: ScopeRef) {
        if self.options.deep {
            self.gray_stack.push(GcRef::Scope(scope));
        }
    }

    /// Report an object key node; followed only when keys are included.
    pub fn mark_key(&mut self, key: NodeRef) {
        if self.options.include_object_keys {
            self.gray_stack.push(GcRef::Node(key));
        }
    }

    /// Enqueue `root` unconditionally.
    pub fn push_root(&mut self, root: GcRef) {
        self.gray_stack.push(root);
    }

    /// Take the next grey object.
    pub fn pop(&mut self) -> Option<GcRef> {
        self.gray_stack.pop()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(TraceOptions::default())
    }
}

/// Every type that holds references into the collectable graph implements
/// `Trace` to expose them to the collector.
///
/// # Contract
/// An implementation must report every [`NodeRef`] and [`ScopeRef`] it owns
/// through the matching [`Tracer`] method.  Anything not reported is treated
/// as unreachable from this object.  A scope's `outer` link is not an owning
/// reference and is never reported.
pub trait Trace {
    /// Visit all outgoing references, reporting each to the tracer.
    fn trace(&self, tracer: &mut Tracer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::handle::Slots;
    use crate::gc::pool::SizeClass;
    use crate::parser::ast::{FuncNode, LiteralNode, Node, NodeKind, ObjectNode};
    use crate::parser::scope::Scope;
    use crate::parser::scanner::TokenKind;

    struct Graph {
        nodes: Slots<Node>,
        scopes: Slots<Scope>,
    }

    impl Graph {
        fn new() -> Self {
            Self {
                nodes: Slots::new(),
                scopes: Slots::new(),
            }
        }

        fn node(&mut self, kind: NodeKind) -> NodeRef {
            self.nodes.insert(Node::new(kind, 1, 1), SizeClass::Medium, 0)
        }

        fn scope(&mut self) -> ScopeRef {
            self.scopes.insert(Scope::new(), SizeClass::Medium, 0)
        }

        fn literal(&mut self, value: &str) -> NodeRef {
            self.node(NodeKind::Literal(LiteralNode::new(value, TokenKind::Ident)))
        }
    }

    fn drain(tracer: &mut Tracer) -> Vec<GcRef> {
        let mut out = Vec::new();
        while let Some(r) = tracer.pop() {
            out.push(r);
        }
        out
    }

    // ── Tracer ───────────────────────────────────────────────────────────────

    #[test]
    fn test_shallow_tracer_skips_scope_edges() {
        let mut g = Graph::new();
        let s = g.scope();
        let mut tracer = Tracer::default();
        tracer.mark_scope(s);
        assert!(tracer.gray_stack.is_empty());
    }

    #[test]
    fn test_deep_tracer_follows_scope_edges() {
        let mut g = Graph::new();
        let s = g.scope();
        let mut tracer = Tracer::new(TraceOptions {
            deep: true,
            include_object_keys: false,
        });
        tracer.mark_scope(s);
        assert_eq!(tracer.gray_stack, vec![GcRef::Scope(s)]);
    }

    #[test]
    fn test_keys_only_when_requested() {
        let mut g = Graph::new();
        let k = g.literal("k");
        let mut tracer = Tracer::default();
        tracer.mark_key(k);
        assert!(tracer.gray_stack.is_empty());
        let mut tracer = Tracer::new(TraceOptions::FULL);
        tracer.mark_key(k);
        assert_eq!(tracer.gray_stack.len(), 1);
    }

    // ── Scope / Node tracing ─────────────────────────────────────────────────

    #[test]
    fn test_scope_reports_its_nodes() {
        let mut g = Graph::new();
        let a = g.literal("a");
        let b = g.literal("b");
        let s = g.scope();
        let scope = g.scopes.get_mut(s).unwrap();
        scope.insert(a).unwrap();
        scope.insert(b).unwrap();
        let mut tracer = Tracer::default();
        g.scopes.get(s).unwrap().trace(&mut tracer);
        let mut seen = drain(&mut tracer);
        seen.sort_by_key(|r| match r {
            GcRef::Node(n) => n.index(),
            GcRef::Scope(s) => s.index(),
        });
        assert_eq!(seen, vec![GcRef::Node(a), GcRef::Node(b)]);
    }

    #[test]
    fn test_func_body_followed_only_when_deep() {
        let mut g = Graph::new();
        let body = g.scope();
        let func = g.node(NodeKind::Func(FuncNode {
            name: "f".into(),
            args: Vec::new(),
            body,
        }));
        let node = g.nodes.get(func).unwrap();

        let mut shallow = Tracer::default();
        node.trace(&mut shallow);
        assert!(drain(&mut shallow).is_empty());

        let mut deep = Tracer::new(TraceOptions {
            deep: true,
            include_object_keys: false,
        });
        node.trace(&mut deep);
        assert_eq!(drain(&mut deep), vec![GcRef::Scope(body)]);
    }

    #[test]
    fn test_object_keys_and_body() {
        let mut g = Graph::new();
        let body = g.scope();
        let key = g.literal("x");
        let obj = g.node(NodeKind::Object(ObjectNode {
            name: "point".into(),
            body,
            keys: vec![key],
        }));
        let mut full = Tracer::new(TraceOptions::FULL);
        g.nodes.get(obj).unwrap().trace(&mut full);
        let seen = drain(&mut full);
        assert!(seen.contains(&GcRef::Scope(body)));
        assert!(seen.contains(&GcRef::Node(key)));
    }
}
