//! Lazy body deferral.
//!
//! On the first pass the parser does not build statements for function,
//! loop, branch, `try`/`catch` or `case` bodies.  It scans to the matching
//! `}` by brace depth, keeps the exact source between the braces, and stores
//! it in an unparsed [`Scope`].  [`realize`] later parses that text into the
//! very same scope slot, so handles to it stay valid.

use tracing::debug;

use crate::error::{CondorError, CondorResult, ErrorKind};
use crate::gc::trace::GcRef;
use crate::isolate::Isolate;
use crate::parser::ast::ScopeRef;
use crate::parser::scanner::TokenKind;
use crate::parser::scope::Scope;
use crate::parser::state::{Parser, ParserFlags};

impl Parser<'_, '_> {
    /// Skip a `{ ... }` body and return an unparsed scope holding its text.
    /// The new scope's outer is the current scope.
    pub(crate) fn lazy_parse_body(&mut self) -> CondorResult<ScopeRef> {
        self.trace("Storing body for later");
        self.expect(TokenKind::LBrace)?;
        let open = self.tok.span;
        let mut depth: usize = 1;
        loop {
            self.next()?;
            match self.tok.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::End => {
                    return Err(CondorError::at(ErrorKind::UnexpectedEndOfFile, open.start)
                        .with_raw("{"));
                }
                _ => {}
            }
        }
        let raw = self.slice(open.end.offset, self.tok.span.start.offset);
        let outer = self.current_scope();
        let scope = self.alloc_scope(Scope::deferred(raw, Some(outer)))?;
        self.next()?;
        Ok(scope)
    }
}

/// Parse the deferred text of `scope` in place.
///
/// An already parsed scope is returned unchanged.  Otherwise the raw text is
/// parsed by a fresh parser; on success its statements move into `scope`,
/// scopes nested directly in the body are re-pointed at `scope`, and the
/// scope becomes parsed while keeping its raw text.  On failure everything
/// the attempt allocated is released and `scope` stays unparsed.
pub fn realize(isolate: &mut Isolate, scope: ScopeRef, flags: ParserFlags) -> CondorResult<ScopeRef> {
    let target = isolate.try_scope(scope)?;
    if target.is_parsed() {
        return Ok(scope);
    }
    let raw = target.raw().to_owned();

    let mut parser = Parser::new(isolate, &raw, flags)?;
    if let Err(err) = parser.parse_program() {
        parser.abandon();
        return Err(err);
    }
    let outcome = parser.finish();

    let nodes = isolate.try_scope_mut(outcome.root)?.take_nodes();
    for r in &outcome.allocations {
        if let GcRef::Scope(child) = *r
            && let Some(child) = isolate.scope_mut(child)
            && child.outer() == Some(outcome.root)
        {
            child.set_outer(Some(scope));
        }
    }
    isolate.free_scope(outcome.root)?;
    let count = nodes.len();
    isolate.try_scope_mut(scope)?.realize(nodes)?;
    if !outcome.imports.is_empty() || !outcome.includes.is_empty() {
        isolate
            .create_context()?
            .register_imports(&outcome.imports, &outcome.includes);
    }
    debug!(target: "condor::parser", ?scope, statements = count, "realized deferred body");
    Ok(scope)
}
