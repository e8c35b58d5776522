//! Lexical scopes.
//!
//! # Overview
//!
//! A [`Scope`] is an ordered container of the statements (AST nodes) that
//! make up one lexical region: the program, a function body, a loop body, an
//! object body.  Scopes nest through a non-owning `outer` link, which is what
//! [`Scope::lookup`] walks for a deep lookup.
//!
//! # Deferred bodies
//!
//! A scope starts in one of two states:
//!
//! - **Parsed**: it holds its statements.  Containers built eagerly by the
//!   parser start here.
//! - **Unparsed**: it holds only the raw source text of a body the parser
//!   skipped over.  It gains its statements exactly once, when the body is
//!   realized, and keeps the raw text afterwards for reference.
//!
//! Inserting into an unparsed scope is an internal error: its content is
//! still text.

use crate::error::{CondorError, CondorResult, ErrorKind};
use crate::gc::trace::{Trace, Tracer};
use crate::isolate::Isolate;

pub use crate::parser::ast::{NodeRef, ScopeRef};

/// The content of a [`Scope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeBody {
    /// A deferred body: just its source text.
    Unparsed { raw: String },
    /// Statements in program order.
    Parsed { nodes: Vec<NodeRef> },
}

/// One lexical scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    body: ScopeBody,
    /// Source text retained after a deferred body is realized.
    source: Option<String>,
    outer: Option<ScopeRef>,
}

impl Scope {
    /// An empty, parsed scope with no enclosing scope.
    pub fn new() -> Self {
        Self {
            body: ScopeBody::Parsed { nodes: Vec::new() },
            source: None,
            outer: None,
        }
    }

    /// An unparsed scope holding the raw text of a skipped body.
    pub fn deferred(raw: impl Into<String>, outer: Option<ScopeRef>) -> Self {
        Self {
            body: ScopeBody::Unparsed { raw: raw.into() },
            source: None,
            outer,
        }
    }

    /// The body, for callers that want to match on the state directly.
    pub fn body(&self) -> &ScopeBody {
        &self.body
    }

    // ── Content ──────────────────────────────────────────────────────────

    /// Append `node` in program order.
    pub fn insert(&mut self, node: NodeRef) -> CondorResult<()> {
        match &mut self.body {
            ScopeBody::Parsed { nodes } => {
                nodes.push(node);
                Ok(())
            }
            ScopeBody::Unparsed { .. } => Err(ErrorKind::InternalScopeError.into()),
        }
    }

    /// Insert `node` ahead of every existing statement.
    pub fn insert_before(&mut self, node: NodeRef) -> CondorResult<()> {
        match &mut self.body {
            ScopeBody::Parsed { nodes } => {
                nodes.insert(0, node);
                Ok(())
            }
            ScopeBody::Unparsed { .. } => Err(ErrorKind::InternalScopeError.into()),
        }
    }

    /// Number of statements.  Zero for an unparsed scope.
    pub fn size(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The statement at `index`.
    pub fn get(&self, index: usize) -> CondorResult<NodeRef> {
        let nodes = self.nodes();
        nodes.get(index).copied().ok_or_else(|| {
            CondorError::from(ErrorKind::IndexOutOfRange {
                index,
                size: nodes.len(),
            })
        })
    }

    /// Statements in program order.  Empty for an unparsed scope.
    pub fn nodes(&self) -> &[NodeRef] {
        match &self.body {
            ScopeBody::Parsed { nodes } => nodes,
            ScopeBody::Unparsed { .. } => &[],
        }
    }

    /// Move the statements out, leaving the scope parsed and empty.
    pub(crate) fn take_nodes(&mut self) -> Vec<NodeRef> {
        match &mut self.body {
            ScopeBody::Parsed { nodes } => std::mem::take(nodes),
            ScopeBody::Unparsed { .. } => Vec::new(),
        }
    }

    // ── Lookup ───────────────────────────────────────────────────────────

    /// Every node whose identifying name is `name`, local matches first.
    ///
    /// With `deep` set the search continues through each enclosing scope and
    /// accumulates their matches after the local ones.  Stale or unparsed
    /// scopes simply contribute nothing; lookup never fails.
    pub fn lookup(&self, isolate: &Isolate, name: &str, deep: bool) -> Vec<NodeRef> {
        let mut found = self.local_matches(isolate, name);
        if !deep {
            return found;
        }
        let mut next = self.outer;
        // Bounded by the number of live scopes in case the outer chain cycles.
        let mut hops = isolate.live_scopes();
        while let Some(handle) = next {
            if hops == 0 {
                break;
            }
            let Some(scope) = isolate.scope(handle) else {
                break;
            };
            found.extend(scope.local_matches(isolate, name));
            next = scope.outer;
            hops -= 1;
        }
        found
    }

    fn local_matches(&self, isolate: &Isolate, name: &str) -> Vec<NodeRef> {
        self.nodes()
            .iter()
            .copied()
            .filter(|&n| isolate.node(n).and_then(|node| node.name()) == Some(name))
            .collect()
    }

    // ── State ────────────────────────────────────────────────────────────

    pub fn is_parsed(&self) -> bool {
        matches!(self.body, ScopeBody::Parsed { .. })
    }

    /// Transition unparsed → parsed with no statements.  A parsed scope is
    /// left untouched.
    pub fn mark_parsed(&mut self) {
        if let ScopeBody::Unparsed { raw } = &mut self.body {
            self.source = Some(std::mem::take(raw));
            self.body = ScopeBody::Parsed { nodes: Vec::new() };
        }
    }

    /// Transition unparsed → parsed with `nodes` as the content.
    pub fn realize(&mut self, nodes: Vec<NodeRef>) -> CondorResult<()> {
        let ScopeBody::Unparsed { raw } = &mut self.body else {
            return Err(ErrorKind::InternalScopeError.into());
        };
        self.source = Some(std::mem::take(raw));
        self.body = ScopeBody::Parsed { nodes };
        Ok(())
    }

    /// The deferred source text, or the retained text once realized.  Empty
    /// for a scope that was never deferred.
    pub fn raw(&self) -> &str {
        match &self.body {
            ScopeBody::Unparsed { raw } => raw,
            ScopeBody::Parsed { .. } => self.source.as_deref().unwrap_or(""),
        }
    }

    pub fn outer(&self) -> Option<ScopeRef> {
        self.outer
    }

    pub(crate) fn set_outer(&mut self, outer: Option<ScopeRef>) {
        self.outer = outer;
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace for Scope {
    fn trace(&self, tracer: &mut Tracer) {
        for &node in self.nodes() {
            tracer.mark_node(node);
        }
    }
}
