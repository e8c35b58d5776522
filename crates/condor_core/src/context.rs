//! The per-isolate compilation context.

use crate::gc::trace::GcRef;
use crate::parser::ast::{NodeRef, ScopeRef};

/// State shared by every parse run on one isolate: the root scopes of
/// completed top-level parses and the imports/includes they declared.
///
/// Everything the context records is a collector root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Context {
    roots: Vec<ScopeRef>,
    imports: Vec<NodeRef>,
    includes: Vec<NodeRef>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root scopes of completed top-level parses, oldest first.
    pub fn roots(&self) -> &[ScopeRef] {
        &self.roots
    }

    pub fn imports(&self) -> &[NodeRef] {
        &self.imports
    }

    pub fn includes(&self) -> &[NodeRef] {
        &self.includes
    }

    pub(crate) fn register_root(&mut self, scope: ScopeRef) {
        if !self.roots.contains(&scope) {
            self.roots.push(scope);
        }
    }

    /// Forget `scope` as a root.  Returns `true` if it was registered.
    pub fn unregister_root(&mut self, scope: ScopeRef) -> bool {
        let before = self.roots.len();
        self.roots.retain(|&r| r != scope);
        self.roots.len() != before
    }

    pub(crate) fn register_imports(&mut self, imports: &[NodeRef], includes: &[NodeRef]) {
        self.imports.extend_from_slice(imports);
        self.includes.extend_from_slice(includes);
    }

    /// Every collector root this context holds.
    pub fn gc_roots(&self) -> impl Iterator<Item = GcRef> + '_ {
        self.roots
            .iter()
            .map(|&s| GcRef::Scope(s))
            .chain(self.imports.iter().map(|&n| GcRef::Node(n)))
            .chain(self.includes.iter().map(|&n| GcRef::Node(n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isolate::Isolate;
    use crate::parser::scope::Scope;

    #[test]
    fn test_register_root_is_idempotent() {
        let mut iso = Isolate::new();
        let s = iso.alloc_scope(Scope::new()).unwrap();
        let mut ctx = Context::new();
        ctx.register_root(s);
        ctx.register_root(s);
        assert_eq!(ctx.roots(), &[s]);
        assert!(ctx.unregister_root(s));
        assert!(!ctx.unregister_root(s));
        assert!(ctx.roots().is_empty());
    }

    #[test]
    fn test_gc_roots_cover_everything() {
        let mut iso = Isolate::new();
        let s = iso.alloc_scope(Scope::new()).unwrap();
        let a = iso
            .alloc_node(crate::parser::ast::Node::new(
                crate::parser::ast::NodeKind::Undefined,
                1,
                1,
            ))
            .unwrap();
        let mut ctx = Context::new();
        ctx.register_root(s);
        ctx.register_imports(&[a], &[]);
        let roots: Vec<GcRef> = ctx.gc_roots().collect();
        assert_eq!(roots, vec![GcRef::Scope(s), GcRef::Node(a)]);
    }
}
