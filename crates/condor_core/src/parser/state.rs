//! Parser state shared by the statement, expression and lazy-body rules.
//!
//! A [`Parser`] owns one token of lookahead, the stack of open scopes and a
//! log of everything it allocated, so that a failed parse can hand the
//! partial tree back to the isolate.  Every live parser is charged to the
//! isolate's self pool for as long as it exists.

use std::mem::{size_of, take};

use tracing::debug;

use crate::error::{CondorError, CondorResult, ErrorKind};
use crate::gc::collector::CollectStats;
use crate::gc::trace::{GcRef, TraceOptions};
use crate::isolate::Isolate;
use crate::parser::ast::{Node, NodeKind, NodeRef, ScopeRef};
use crate::parser::scanner::{Position, Scanner, Token, TokenKind};
use crate::parser::scope::Scope;

/// Switches fixed for the lifetime of one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserFlags {
    /// Accept `%name(...)` native calls.
    pub allow_natives: bool,
    /// Emit a debug event for every grammar rule entered.
    pub trace: bool,
    /// Emit an event for every variable declared.
    pub print_variables: bool,
}

/// What a successful parse leaves behind.
pub(crate) struct ParseOutcome {
    pub root: ScopeRef,
    pub imports: Vec<NodeRef>,
    pub includes: Vec<NodeRef>,
    pub allocations: Vec<GcRef>,
}

pub(crate) struct Parser<'iso, 'src> {
    pub(super) isolate: &'iso mut Isolate,
    scanner: Scanner<'src>,
    /// The single token of lookahead.
    pub(super) tok: Token,
    /// Start of the token before `tok`.
    prev: Position,
    /// Scanner position just past `tok`.
    cur: Position,
    /// Open scopes; the root is always at the bottom.
    scopes: Vec<ScopeRef>,
    root: ScopeRef,
    pub(super) imports: Vec<NodeRef>,
    pub(super) includes: Vec<NodeRef>,
    pub(super) flags: ParserFlags,
    allocations: Vec<GcRef>,
    /// Bytes of the current token's text charged to the self pool.
    tok_charge: usize,
}

fn footprint() -> usize {
    size_of::<Parser<'static, 'static>>()
}

impl<'iso, 'src> Parser<'iso, 'src> {
    pub fn new(isolate: &'iso mut Isolate, source: &'src str, flags: ParserFlags) -> CondorResult<Self> {
        isolate.reserve_self(footprint())?;
        let root = match isolate.alloc_scope(Scope::new()) {
            Ok(root) => root,
            Err(err) => {
                isolate.release_self(footprint());
                return Err(err);
            }
        };
        Ok(Self {
            isolate,
            scanner: Scanner::new(source),
            tok: Token {
                kind: TokenKind::End,
                raw: String::new(),
                span: Default::default(),
            },
            prev: Position::default(),
            cur: Position::default(),
            scopes: vec![root],
            root,
            imports: Vec::new(),
            includes: Vec::new(),
            flags,
            allocations: vec![GcRef::Scope(root)],
            tok_charge: 0,
        })
    }

    pub fn root(&self) -> ScopeRef {
        self.root
    }

    // ── Tokens ────────────────────────────────────────────────────────────

    /// Advance to the next token.  The new token's text is charged to the
    /// self pool until the parser moves past it.
    pub(super) fn next(&mut self) -> CondorResult<()> {
        self.prev = self.tok.span.start;
        let tok = self.scanner.next_token()?;
        self.isolate.release_self(take(&mut self.tok_charge));
        self.isolate.reserve_self(tok.raw.len())?;
        self.tok_charge = tok.raw.len();
        self.tok = tok;
        self.cur = self.scanner.position();
        Ok(())
    }

    pub(super) fn is(&self, kind: TokenKind) -> bool {
        self.tok.kind == kind
    }

    /// Fail with `Expected(kind)` unless the current token is `kind`.
    pub(super) fn expect(&self, kind: TokenKind) -> CondorResult<()> {
        if self.is(kind) {
            Ok(())
        } else {
            Err(self.error(ErrorKind::Expected(kind)))
        }
    }

    /// [`expect`][Self::expect] then advance.
    pub(super) fn eat(&mut self, kind: TokenKind) -> CondorResult<()> {
        self.expect(kind)?;
        self.next()
    }

    /// Start position of the current token.
    pub(super) fn here(&self) -> Position {
        self.tok.span.start
    }

    pub(super) fn error(&self, kind: ErrorKind) -> CondorError {
        CondorError::at(kind, self.here()).with_raw(self.tok.raw.clone())
    }

    /// Exact source text between two byte offsets.
    pub(super) fn slice(&self, start: usize, end: usize) -> &'src str {
        self.scanner.substr(start, end)
    }

    pub(super) fn trace(&self, rule: &str) {
        if self.flags.trace {
            debug!(
                target: "condor::parser",
                row = self.here().line,
                col = self.here().column,
                prev_row = self.prev.line,
                end_col = self.cur.column,
                token = %self.tok.kind,
                raw = %self.tok.raw,
                "{rule}"
            );
        }
    }

    // ── Allocation ────────────────────────────────────────────────────────

    /// Allocate a node positioned at `at`.
    pub(super) fn alloc(&mut self, kind: NodeKind, at: Position) -> CondorResult<NodeRef> {
        let node = self.isolate.alloc_node(Node::new(kind, at.line, at.column))?;
        self.allocations.push(GcRef::Node(node));
        Ok(node)
    }

    pub(super) fn alloc_scope(&mut self, scope: Scope) -> CondorResult<ScopeRef> {
        let scope = self.isolate.alloc_scope(scope)?;
        self.allocations.push(GcRef::Scope(scope));
        Ok(scope)
    }

    /// Return a node this parser allocated but no longer needs.
    pub(super) fn free(&mut self, node: NodeRef) -> CondorResult<Node> {
        self.isolate.free_node(node)
    }

    pub(super) fn node_mut(&mut self, node: NodeRef) -> CondorResult<&mut Node> {
        self.isolate.try_node_mut(node)
    }

    // ── Scopes ────────────────────────────────────────────────────────────

    pub(super) fn current_scope(&self) -> ScopeRef {
        self.scopes.last().copied().unwrap_or(self.root)
    }

    /// Make `scope` the current scope, nested in the one that was current.
    pub(super) fn open_scope(&mut self, scope: ScopeRef) -> CondorResult<()> {
        let outer = self.current_scope();
        self.isolate.try_scope_mut(scope)?.set_outer(Some(outer));
        self.scopes.push(scope);
        Ok(())
    }

    /// Leave the current scope.  The root scope cannot be closed.
    pub(super) fn close_scope(&mut self) -> CondorResult<ScopeRef> {
        if self.scopes.len() <= 1 {
            return Err(self.error(ErrorKind::InternalScopeError));
        }
        self.scopes
            .pop()
            .ok_or_else(|| self.error(ErrorKind::InternalScopeError))
    }

    /// Append `node` to the current scope.
    pub(super) fn insert(&mut self, node: NodeRef) -> CondorResult<()> {
        let scope = self.current_scope();
        self.isolate.try_scope_mut(scope)?.insert(node)
    }

    // ── Completion ────────────────────────────────────────────────────────

    /// Hand the parsed tree over to the caller.
    pub fn finish(mut self) -> ParseOutcome {
        ParseOutcome {
            root: self.root,
            imports: take(&mut self.imports),
            includes: take(&mut self.includes),
            allocations: take(&mut self.allocations),
        }
    }

    /// Give back everything this parser allocated after a failure.
    ///
    /// The tree hanging off the root is collected first; whatever was
    /// allocated but never linked into it is released from the log.
    pub fn abandon(mut self) -> CollectStats {
        let mut stats = self.isolate.collect(self.root, TraceOptions::FULL);
        let rest = self.isolate.release_all(&take(&mut self.allocations));
        stats.nodes_freed += rest.nodes_freed;
        stats.scopes_freed += rest.scopes_freed;
        stats.bytes_freed += rest.bytes_freed;
        debug!(
            target: "condor::parser",
            nodes = stats.nodes_freed,
            scopes = stats.scopes_freed,
            "discarded partial tree"
        );
        stats
    }
}

impl Drop for Parser<'_, '_> {
    fn drop(&mut self) {
        self.isolate.release_self(footprint() + self.tok_charge);
    }
}
