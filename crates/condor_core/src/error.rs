//! Error types for the Condor front end.
//!
//! Every grammar violation, scanning failure and memory-model failure is one
//! [`ErrorKind`].  A [`CondorError`] wraps the kind together with the source
//! position (when one is known) and the raw text of the offending token, and
//! is what every fallible operation returns through [`CondorResult`].

use thiserror::Error;

use crate::gc::pool::SizeClass;
use crate::parser::scanner::{Position, TokenKind};

/// The enumerated taxonomy of front-end errors.
///
/// Each kind renders a fixed human-readable message.  The parameterized
/// kinds ([`ErrorKind::Expected`], [`ErrorKind::Unexpected`],
/// [`ErrorKind::Scanner`]) interpolate the token or text they carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // ── Mode / scanning ──────────────────────────────────────────────────
    /// An unknown `mode` directive.
    #[error("Invalid mode")]
    InvalidMode,
    /// A `mode` directive was required but missing.
    #[error("Expected mode")]
    ExpectedMode,
    /// The requested mode is not known to this front end.
    #[error("Mode unknown")]
    ModeUnknown,
    /// The scanner rejected the input; carries the offending raw text.
    #[error("{0}")]
    Scanner(String),

    // ── Declarations ─────────────────────────────────────────────────────
    #[error("Expected variable type")]
    ExpectedVariableType,
    #[error("var not allowed in strict mode")]
    VarNotAllowedInStrictMode,
    #[error("Expected var")]
    ExpectedVar,
    #[error("Different type already defined in scope")]
    DifferentTypeAlreadyDefinedInScope,
    #[error("Parse var error")]
    ParseVarError,

    // ── Statements / expressions ─────────────────────────────────────────
    #[error("Invalid statement")]
    InvalidStatement,
    #[error("Missing Expression")]
    MissingExpression,
    #[error("Invalid Expression")]
    InvalidExpression,
    #[error("Invalid left expression")]
    InvalidLeftExpression,
    #[error("Invalid function call")]
    InvalidFunctionCall,
    #[error("Invalid function call")]
    InvalidFuncCall,
    #[error("Invalid object member")]
    InvalidObjectMember,
    #[error("Invalid char value")]
    InvalidCharValue,
    #[error("Unexpected return")]
    UnexpectedReturn,
    #[error("Expected argument name")]
    ExpectedArgumentName,
    #[error("Missing func body")]
    MissingFuncBody,
    #[error("Expected operator")]
    ExpectedOperator,
    #[error("Invalid operator")]
    InvalidOperator,
    #[error("Expected parameter")]
    ExpectedParameter,
    #[error("Invalid argument type")]
    InvalidArgumentType,
    #[error("Can't have null func arg")]
    CantHaveNullFuncArg,
    #[error("Invalid include or import")]
    InvalidIncludeImport,
    #[error("Invalid use of export")]
    InvalidUseOfExport,
    #[error("Unexpected character")]
    UnexpectedCharacter,
    #[error("Unexpected end of file")]
    UnexpectedEndOfFile,

    // ── Structural / semantic ────────────────────────────────────────────
    #[error("Internal scope error")]
    InternalScopeError,
    #[error("Undefined variable")]
    UndefinedVariable,
    #[error("Undefined func")]
    UndefinedFunc,
    #[error("Undefined object")]
    UndefinedObject,
    #[error("Cannot concatenate type")]
    CannotConcatenateType,
    #[error("Cannot subtract type")]
    CannotSubtract,
    #[error("Cannot minus unlike values")]
    CannotMinusUnlikeValues,
    #[error("Cannot add unlike values")]
    CannotAddUnlikeValues,
    #[error("Unable to access private member")]
    UnableToAccessPrivateMember,
    #[error("Unknown cast type")]
    UnknownCastType,
    #[error("Unidentified object member")]
    UnidentifiedObjectMember,
    #[error("Compilation error")]
    CompilationError,

    // ── Generic / parameterized ──────────────────────────────────────────
    /// A specific token was required; renders `Expected <token>`.
    #[error("Expected {0}")]
    Expected(TokenKind),
    /// The token cannot start or continue the current construct.
    #[error("Unexpected {0}")]
    Unexpected(TokenKind),
    #[error("Undefined")]
    Undefined,

    // ── Memory model ─────────────────────────────────────────────────────
    /// No pool can satisfy the request, or the covering pool is exhausted.
    #[error("out of memory: {requested} bytes requested from the {class} pool")]
    OutOfMemory {
        class: SizeClass,
        requested: usize,
    },
    /// The request is larger than every size class.
    #[error("out of memory: {0} bytes exceeds the largest size class")]
    AllocationTooLarge(usize),
    /// A handle whose slot has been freed (or reused) was dereferenced.
    #[error("stale handle")]
    StaleHandle,
    /// `free` was called with a size different from the allocation's size.
    #[error("free size mismatch: allocated {allocated} bytes, freed {freed}")]
    FreeSizeMismatch { allocated: usize, freed: usize },
    /// Positional access past the end of a scope.
    #[error("index {index} out of range for scope of size {size}")]
    IndexOutOfRange { index: usize, size: usize },
}

/// A front-end error: an [`ErrorKind`] plus where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", location_suffix(.position, .raw))]
pub struct CondorError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Source position of the offending token, when one is known.
    pub position: Option<Position>,
    /// Raw text of the offending token, when one is known.
    pub raw: Option<String>,
}

impl CondorError {
    /// An error at a known source position.
    pub fn at(kind: ErrorKind, position: Position) -> Self {
        Self {
            kind,
            position: Some(position),
            raw: None,
        }
    }

    /// Attach the raw text of the offending token.
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Source row (1-based) or 0 when no position is known.
    pub fn row(&self) -> u32 {
        self.position.map_or(0, |p| p.line)
    }

    /// Source column (1-based) or 0 when no position is known.
    pub fn column(&self) -> u32 {
        self.position.map_or(0, |p| p.column)
    }
}

impl From<ErrorKind> for CondorError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            position: None,
            raw: None,
        }
    }
}

fn location_suffix(position: &Option<Position>, raw: &Option<String>) -> String {
    let mut out = String::new();
    if let Some(raw) = raw.as_deref().filter(|r| !r.is_empty()) {
        out.push_str(&format!(" near `{raw}`"));
    }
    if let Some(p) = position {
        out.push_str(&format!(" at {}:{}", p.line, p.column));
    }
    out
}

/// Convenient `Result` alias for fallible front-end operations.
pub type CondorResult<T> = Result<T, CondorError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, column: u32) -> Position {
        Position {
            offset: 0,
            line,
            column,
        }
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(ErrorKind::InvalidMode.to_string(), "Invalid mode");
        assert_eq!(ErrorKind::MissingExpression.to_string(), "Missing Expression");
        assert_eq!(
            ErrorKind::DifferentTypeAlreadyDefinedInScope.to_string(),
            "Different type already defined in scope"
        );
        assert_eq!(ErrorKind::InternalScopeError.to_string(), "Internal scope error");
    }

    #[test]
    fn test_expected_renders_token() {
        assert_eq!(
            ErrorKind::Expected(TokenKind::Ident).to_string(),
            "Expected identifier"
        );
        assert_eq!(ErrorKind::Expected(TokenKind::RParen).to_string(), "Expected ')'");
    }

    #[test]
    fn test_unexpected_renders_token() {
        assert_eq!(
            ErrorKind::Unexpected(TokenKind::Else).to_string(),
            "Unexpected 'else'"
        );
    }

    #[test]
    fn test_scanner_carries_raw_text() {
        let kind = ErrorKind::Scanner("unterminated string literal".into());
        assert_eq!(kind.to_string(), "unterminated string literal");
    }

    #[test]
    fn test_error_without_position() {
        let err = CondorError::from(ErrorKind::StaleHandle);
        assert_eq!(err.to_string(), "stale handle");
        assert_eq!(err.row(), 0);
        assert_eq!(err.column(), 0);
    }

    #[test]
    fn test_error_with_position_and_raw() {
        let err = CondorError::at(ErrorKind::Unexpected(TokenKind::RBrace), pos(3, 7)).with_raw("}");
        assert_eq!(err.to_string(), "Unexpected '}' near `}` at 3:7");
        assert_eq!(err.row(), 3);
        assert_eq!(err.column(), 7);
    }

    #[test]
    fn test_out_of_memory_names_pool() {
        let kind = ErrorKind::OutOfMemory {
            class: SizeClass::Small,
            requested: 48,
        };
        assert_eq!(
            kind.to_string(),
            "out of memory: 48 bytes requested from the small pool"
        );
    }
}
