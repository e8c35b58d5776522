//! `condor_core`: front end and memory model for the Condor language.
//!
//! # Crate layout
//!
//! - [`parser`]: scanner, AST, scopes and the recursive-descent parser with
//!   lazy body deferral.
//! - [`isolate`]: the owner of every node, scope and raw block, backed by
//!   size-classed pools.
//! - [`gc`]: pools, generational handles, tracing and the mark/sweep
//!   collector.
//! - [`context`]: the per-isolate program context holding parse roots and
//!   module declarations.
//! - [`error`]: the error kinds shared by every module.

/// Per-isolate program context.
pub mod context;
/// Error kinds and positioned errors.
pub mod error;
/// Memory pools, handles, tracing and collection.
pub mod gc;
/// Isolate: owner of all parser-produced objects.
pub mod isolate;
/// Condor scanner, AST and parser.
pub mod parser;

pub use error::{CondorError, CondorResult, ErrorKind};
pub use isolate::{Isolate, IsolateConfig};
pub use parser::{ParserFlags, parse, parse_scope};
