//! Condor parser infrastructure.
//!
//! - [`scanner`]: lexer that converts raw source text into a stream of
//!   [`scanner::Token`]s.
//! - [`ast`]: AST node catalogue.
//! - [`scope`]: lexical scopes, including deferred (unparsed) bodies.
//! - [`printer`]: S-expression dump of a scope tree.
//!
//! The grammar itself is a single-token-lookahead recursive-descent parser
//! split across `state`, `stmt`, `expr` and `lazy`.  Its two entry points
//! are [`parse`] for a whole source text and [`parse_scope`] for realizing a
//! body that the first pass deferred.
//!
//! # Example
//!
//! ```
//! use condor_core::isolate::Isolate;
//! use condor_core::parser::{parse, parse_scope, ParserFlags};
//!
//! let mut iso = Isolate::new();
//! let root = parse(&mut iso, "func add(int a, int b){ return a + b; }", ParserFlags::default()).unwrap();
//! let func = iso.scope(root).unwrap().get(0).unwrap();
//! let body = iso.node(func).unwrap().as_func().unwrap().body;
//! assert!(!iso.scope(body).unwrap().is_parsed());
//!
//! parse_scope(&mut iso, body, ParserFlags::default()).unwrap();
//! assert_eq!(iso.scope(body).unwrap().size(), 1);
//! ```

/// AST node catalogue.
pub mod ast;
mod expr;
mod lazy;
/// S-expression dump of scope trees.
pub mod printer;
/// Condor lexer.
pub mod scanner;
/// Lexical scopes and deferred bodies.
pub mod scope;
mod state;
mod stmt;

pub use state::ParserFlags;

use crate::error::CondorResult;
use crate::isolate::Isolate;
use crate::parser::ast::ScopeRef;
use crate::parser::state::Parser;

/// Parse a whole source text into a new root scope.
///
/// Bodies are deferred; see [`parse_scope`].  On success the root is
/// registered with the isolate's context, together with the imports and
/// includes the source declared, which keeps the tree alive across
/// collections.  On failure every node and scope the attempt allocated is
/// released before the error is returned.
pub fn parse(isolate: &mut Isolate, source: &str, flags: ParserFlags) -> CondorResult<ScopeRef> {
    isolate.create_context()?;
    let mut parser = Parser::new(isolate, source, flags)?;
    if let Err(err) = parser.parse_program() {
        parser.abandon();
        return Err(err);
    }
    let outcome = parser.finish();
    if let Some(context) = isolate.context_mut() {
        context.register_root(outcome.root);
        context.register_imports(&outcome.imports, &outcome.includes);
    }
    Ok(outcome.root)
}

/// Realize a deferred scope in place and return it.
///
/// Idempotent: a scope that is already parsed comes back unchanged.
pub fn parse_scope(isolate: &mut Isolate, scope: ScopeRef, flags: ParserFlags) -> CondorResult<ScopeRef> {
    lazy::realize(isolate, scope, flags)
}
