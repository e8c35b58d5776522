//! Condor lexer (scanner).
//!
//! See [`Scanner`] for the main entry point.  The parser pulls one token at a
//! time through [`Scanner::next_token`] and mirrors the scanner's running
//! [`Position`] after each advance; lazily deferred bodies are captured with
//! [`Scanner::substr`].

use std::fmt;

use crate::error::{CondorError, CondorResult, ErrorKind};

// ─────────────────────────────────────────────────────────────────────────────
// Position / Span
// ─────────────────────────────────────────────────────────────────────────────

/// A byte offset + line/column location in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the beginning of the source string.
    pub offset: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, measured in Unicode scalar values.
    pub column: u32,
}

/// A half-open `[start, end)` source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Inclusive start of the span.
    pub start: Position,
    /// Exclusive end of the span.
    pub end: Position,
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic category of a Condor lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────────────────
    /// An identifier that is not a reserved word.
    Ident,
    /// Integer literal (decimal or `0x…`).
    Number,
    /// Floating-point literal.
    Float,
    /// String literal enclosed in `"`.
    Str,
    /// Character literal enclosed in `'`.
    Char,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,

    // ── Type keywords ─────────────────────────────────────────────────────
    /// `int`
    Int,
    /// `float`
    FloatType,
    /// `double`
    Double,
    /// `boolean`
    Boolean,
    /// `char`
    CharType,
    /// `string`
    StringType,
    /// `var`
    Var,

    // ── Keywords ──────────────────────────────────────────────────────────
    /// `import`
    Import,
    /// `include`
    Include,
    /// `as`
    As,
    /// `export`
    Export,
    /// `public`
    Public,
    /// `static`
    Static,
    /// `private`
    Private,
    /// `protected`
    Protected,
    /// `func`
    Func,
    /// `for`
    For,
    /// `while`
    While,
    /// `try`
    Try,
    /// `catch`
    Catch,
    /// `throw`
    Throw,
    /// `if`
    If,
    /// `else`
    Else,
    /// `delete`
    Delete,
    /// `switch`
    Switch,
    /// `case`
    Case,
    /// `default`
    Default,
    /// `object`
    Object,
    /// `return`
    Return,
    /// A host builtin written `%name`; the raw text is `name`.
    Internal,

    // ── Punctuators ───────────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBrack,
    /// `]`
    RBrack,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Period,

    // ── Arithmetic operators ──────────────────────────────────────────────
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `++`
    Inc,
    /// `--`
    Dec,

    // ── Boolean / bitwise operators ───────────────────────────────────────
    /// `&&`
    LAnd,
    /// `||`
    LOr,
    /// `==`
    Eql,
    /// `!=`
    Neq,
    /// `<`
    Lss,
    /// `>`
    Gtr,
    /// `<=`
    Leq,
    /// `>=`
    Geq,
    /// `!`
    Not,
    /// `^`
    Xor,
    /// `&`
    And,
    /// `|`
    Or,

    // ── Assignment ────────────────────────────────────────────────────────
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
    /// `&=`
    AndAssign,
    /// `|=`
    OrAssign,
    /// `^=`
    XorAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `&^=`
    AndNotAssign,

    // ── End of file ───────────────────────────────────────────────────────
    /// End of input.
    End,
}

impl TokenKind {
    /// Arithmetic operators that continue a binary expression.
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Add
                | TokenKind::Sub
                | TokenKind::Mod
                | TokenKind::Div
                | TokenKind::Mul
                | TokenKind::Shl
                | TokenKind::Shr
        )
    }

    /// Boolean and comparison operators that continue a binary expression.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            TokenKind::LAnd
                | TokenKind::LOr
                | TokenKind::Eql
                | TokenKind::Lss
                | TokenKind::Gtr
                | TokenKind::Neq
                | TokenKind::Leq
                | TokenKind::Geq
                | TokenKind::Not
                | TokenKind::Xor
                | TokenKind::And
                | TokenKind::Or
        )
    }

    /// `=` and the compound assignment operators.
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::AddAssign
                | TokenKind::SubAssign
                | TokenKind::MulAssign
                | TokenKind::DivAssign
                | TokenKind::ModAssign
                | TokenKind::AndAssign
                | TokenKind::OrAssign
                | TokenKind::XorAssign
                | TokenKind::ShlAssign
                | TokenKind::ShrAssign
                | TokenKind::AndNotAssign
        )
    }

    /// Keywords that open a variable declaration list.
    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::FloatType
                | TokenKind::Double
                | TokenKind::Boolean
                | TokenKind::CharType
                | TokenKind::StringType
                | TokenKind::Var
        )
    }

    /// Tokens that can stand in value position as a literal term.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Number
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::Char
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Tokens an operand can end with, so that a following `%` is modulo.
    pub fn ends_operand(self) -> bool {
        self.is_value()
            || matches!(
                self,
                TokenKind::RParen | TokenKind::RBrack | TokenKind::Inc | TokenKind::Dec
            )
    }

    /// `public`, `static`, `private`, `protected`.
    pub fn is_visibility(self) -> bool {
        matches!(
            self,
            TokenKind::Public | TokenKind::Static | TokenKind::Private | TokenKind::Protected
        )
    }

    /// Human-readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number",
            TokenKind::Float => "float literal",
            TokenKind::Str => "string literal",
            TokenKind::Char => "char literal",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
            TokenKind::Int => "'int'",
            TokenKind::FloatType => "'float'",
            TokenKind::Double => "'double'",
            TokenKind::Boolean => "'boolean'",
            TokenKind::CharType => "'char'",
            TokenKind::StringType => "'string'",
            TokenKind::Var => "'var'",
            TokenKind::Import => "'import'",
            TokenKind::Include => "'include'",
            TokenKind::As => "'as'",
            TokenKind::Export => "'export'",
            TokenKind::Public => "'public'",
            TokenKind::Static => "'static'",
            TokenKind::Private => "'private'",
            TokenKind::Protected => "'protected'",
            TokenKind::Func => "'func'",
            TokenKind::For => "'for'",
            TokenKind::While => "'while'",
            TokenKind::Try => "'try'",
            TokenKind::Catch => "'catch'",
            TokenKind::Throw => "'throw'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::Delete => "'delete'",
            TokenKind::Switch => "'switch'",
            TokenKind::Case => "'case'",
            TokenKind::Default => "'default'",
            TokenKind::Object => "'object'",
            TokenKind::Return => "'return'",
            TokenKind::Internal => "native call",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBrack => "'['",
            TokenKind::RBrack => "']'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Period => "'.'",
            TokenKind::Add => "'+'",
            TokenKind::Sub => "'-'",
            TokenKind::Mul => "'*'",
            TokenKind::Div => "'/'",
            TokenKind::Mod => "'%'",
            TokenKind::Shl => "'<<'",
            TokenKind::Shr => "'>>'",
            TokenKind::Inc => "'++'",
            TokenKind::Dec => "'--'",
            TokenKind::LAnd => "'&&'",
            TokenKind::LOr => "'||'",
            TokenKind::Eql => "'=='",
            TokenKind::Neq => "'!='",
            TokenKind::Lss => "'<'",
            TokenKind::Gtr => "'>'",
            TokenKind::Leq => "'<='",
            TokenKind::Geq => "'>='",
            TokenKind::Not => "'!'",
            TokenKind::Xor => "'^'",
            TokenKind::And => "'&'",
            TokenKind::Or => "'|'",
            TokenKind::Assign => "'='",
            TokenKind::AddAssign => "'+='",
            TokenKind::SubAssign => "'-='",
            TokenKind::MulAssign => "'*='",
            TokenKind::DivAssign => "'/='",
            TokenKind::ModAssign => "'%='",
            TokenKind::AndAssign => "'&='",
            TokenKind::OrAssign => "'|='",
            TokenKind::XorAssign => "'^='",
            TokenKind::ShlAssign => "'<<='",
            TokenKind::ShrAssign => "'>>='",
            TokenKind::AndNotAssign => "'&^='",
            TokenKind::End => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

/// A single lexical token produced by the [`Scanner`].
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The syntactic category.
    pub kind: TokenKind,
    /// Raw text.  For string and char literals this is the cooked contents
    /// without quotes; for native calls it is the name without `%`.
    pub raw: String,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Byte length of the token in the source text.
    pub fn len(&self) -> usize {
        self.span.end.offset - self.span.start.offset
    }

    /// Returns `true` for the zero-width end-of-input token.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Character-classification helpers
// ─────────────────────────────────────────────────────────────────────────────

fn is_id_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_id_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Map an identifier string to a keyword [`TokenKind`], or return `None` for
/// plain identifiers.
fn keyword_kind(s: &str) -> Option<TokenKind> {
    match s {
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "null" => Some(TokenKind::Null),
        "int" => Some(TokenKind::Int),
        "float" => Some(TokenKind::FloatType),
        "double" => Some(TokenKind::Double),
        "boolean" => Some(TokenKind::Boolean),
        "char" => Some(TokenKind::CharType),
        "string" => Some(TokenKind::StringType),
        "var" => Some(TokenKind::Var),
        "import" => Some(TokenKind::Import),
        "include" => Some(TokenKind::Include),
        "as" => Some(TokenKind::As),
        "export" => Some(TokenKind::Export),
        "public" => Some(TokenKind::Public),
        "static" => Some(TokenKind::Static),
        "private" => Some(TokenKind::Private),
        "protected" => Some(TokenKind::Protected),
        "func" => Some(TokenKind::Func),
        "for" => Some(TokenKind::For),
        "while" => Some(TokenKind::While),
        "try" => Some(TokenKind::Try),
        "catch" => Some(TokenKind::Catch),
        "throw" => Some(TokenKind::Throw),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "delete" => Some(TokenKind::Delete),
        "switch" => Some(TokenKind::Switch),
        "case" => Some(TokenKind::Case),
        "default" => Some(TokenKind::Default),
        "object" => Some(TokenKind::Object),
        "return" => Some(TokenKind::Return),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// Condor lexer.
///
/// Produces a stream of [`Token`]s from a UTF-8 source string.  Call
/// [`Scanner::next_token`] repeatedly until a token with [`TokenKind::End`]
/// is returned.  Comments (`// …` and `/* … */`) are skipped.
///
/// # Example
///
/// ```
/// use condor_core::parser::scanner::{Scanner, TokenKind};
///
/// let mut sc = Scanner::new("var x = 42;");
/// let mut kinds = Vec::new();
/// loop {
///     let tok = sc.next_token().unwrap();
///     if tok.kind == TokenKind::End { break; }
///     kinds.push(tok.kind);
/// }
/// assert_eq!(kinds.len(), 5);
/// ```
pub struct Scanner<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    /// Kind of the last token returned; decides whether `%name` is a native
    /// call or the modulo operator.
    last: TokenKind,
}

impl<'src> Scanner<'src> {
    /// Create a new scanner for the given UTF-8 source string.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            last: TokenKind::End,
        }
    }

    /// Returns `true` when all input has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// The scanner's running position (just past the last token).
    pub fn position(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Exact source slice `[start, end)` in bytes.  Out-of-range or
    /// non-boundary offsets yield an empty string.
    pub fn substr(&self, start: usize, end: usize) -> &'src str {
        self.source.get(start..end).unwrap_or("")
    }

    // ── Low-level character helpers ─────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.source[self.pos..].chars();
        it.next();
        it.next()
    }

    /// Advance past the current character and update line/column tracking.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, message: &str, at: Position) -> CondorError {
        CondorError::at(ErrorKind::Scanner(message.to_string()), at)
    }

    // ── Trivia ──────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) -> CondorResult<()> {
        loop {
            match (self.peek(), self.peek2()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.position();
                    self.advance();
                    self.advance();
                    loop {
                        match (self.peek(), self.peek2()) {
                            (None, _) => {
                                return Err(self.error("unterminated block comment", start));
                            }
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // ── Literals ────────────────────────────────────────────────────────────

    /// Consume one escape sequence after the leading `\` and return its
    /// cooked character.
    fn scan_escape(&mut self, start: Position) -> CondorResult<char> {
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some(c @ ('\\' | '"' | '\'')) => Ok(c),
            Some(_) => Err(self.error("invalid escape sequence", start)),
            None => Err(self.error("unterminated escape sequence", start)),
        }
    }

    fn scan_string(&mut self, start: Position) -> CondorResult<Token> {
        let mut cooked = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(self.error("unterminated string literal", start));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    cooked.push(self.scan_escape(start)?);
                }
                Some(c) => {
                    self.advance();
                    cooked.push(c);
                }
            }
        }
        Ok(self.token(TokenKind::Str, cooked, start))
    }

    fn scan_char(&mut self, start: Position) -> CondorResult<Token> {
        let value = match self.advance() {
            Some('\\') => self.scan_escape(start)?,
            Some('\'') | Some('\n') | None => {
                return Err(CondorError::at(ErrorKind::InvalidCharValue, start));
            }
            Some(c) => c,
        };
        if self.advance() != Some('\'') {
            return Err(CondorError::at(ErrorKind::InvalidCharValue, start));
        }
        Ok(self.token(TokenKind::Char, value.to_string(), start))
    }

    /// Scan a numeric literal whose first digit has already been consumed.
    fn scan_number(&mut self, first: char, start: Position) -> Token {
        let mut kind = TokenKind::Number;
        if first == '0' && matches!(self.peek(), Some('x') | Some('X')) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance();
            }
        } else {
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            if self.peek() == Some('.') && matches!(self.peek2(), Some(c) if c.is_ascii_digit()) {
                kind = TokenKind::Float;
                self.advance();
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        let raw = self.source[start.offset..self.pos].to_string();
        self.token(kind, raw, start)
    }

    fn scan_identifier(&mut self, start: Position) -> Token {
        while matches!(self.peek(), Some(c) if is_id_continue(c)) {
            self.advance();
        }
        let name = &self.source[start.offset..self.pos];
        let kind = keyword_kind(name).unwrap_or(TokenKind::Ident);
        self.token(kind, name.to_string(), start)
    }

    fn token(&self, kind: TokenKind, raw: String, start: Position) -> Token {
        Token {
            kind,
            raw,
            span: Span {
                start,
                end: self.position(),
            },
        }
    }

    /// Consume `next` if it follows, yielding `yes`; otherwise `no`.
    fn select(&mut self, next: char, yes: TokenKind, no: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.advance();
            yes
        } else {
            no
        }
    }

    // ── Main public API ─────────────────────────────────────────────────────

    /// Scan and return the next [`Token`].
    ///
    /// Returns a token with [`TokenKind::End`] when the input is exhausted.
    pub fn next_token(&mut self) -> CondorResult<Token> {
        let tok = self.scan()?;
        self.last = tok.kind;
        Ok(tok)
    }

    fn scan(&mut self) -> CondorResult<Token> {
        self.skip_trivia()?;
        let start = self.position();
        let Some(c) = self.advance() else {
            return Ok(self.token(TokenKind::End, String::new(), start));
        };

        let kind = match c {
            '"' => return self.scan_string(start),
            '\'' => return self.scan_char(start),
            c if c.is_ascii_digit() => return Ok(self.scan_number(c, start)),
            c if is_id_start(c) => return Ok(self.scan_identifier(start)),
            '%' if !self.last.ends_operand() && matches!(self.peek(), Some(n) if is_id_start(n)) => {
                let name_start = self.position();
                while matches!(self.peek(), Some(n) if is_id_continue(n)) {
                    self.advance();
                }
                let name = self.source[name_start.offset..self.pos].to_string();
                return Ok(self.token(TokenKind::Internal, name, start));
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBrack,
            ']' => TokenKind::RBrack,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Period,
            '+' => match self.peek() {
                Some('+') => {
                    self.advance();
                    TokenKind::Inc
                }
                _ => self.select('=', TokenKind::AddAssign, TokenKind::Add),
            },
            '-' => match self.peek() {
                Some('-') => {
                    self.advance();
                    TokenKind::Dec
                }
                _ => self.select('=', TokenKind::SubAssign, TokenKind::Sub),
            },
            '*' => self.select('=', TokenKind::MulAssign, TokenKind::Mul),
            '/' => self.select('=', TokenKind::DivAssign, TokenKind::Div),
            '%' => self.select('=', TokenKind::ModAssign, TokenKind::Mod),
            '^' => self.select('=', TokenKind::XorAssign, TokenKind::Xor),
            '!' => self.select('=', TokenKind::Neq, TokenKind::Not),
            '=' => self.select('=', TokenKind::Eql, TokenKind::Assign),
            '|' => match self.peek() {
                Some('|') => {
                    self.advance();
                    TokenKind::LOr
                }
                _ => self.select('=', TokenKind::OrAssign, TokenKind::Or),
            },
            '&' => match (self.peek(), self.peek2()) {
                (Some('&'), _) => {
                    self.advance();
                    TokenKind::LAnd
                }
                (Some('^'), Some('=')) => {
                    self.advance();
                    self.advance();
                    TokenKind::AndNotAssign
                }
                _ => self.select('=', TokenKind::AndAssign, TokenKind::And),
            },
            '<' => match self.peek() {
                Some('<') => {
                    self.advance();
                    self.select('=', TokenKind::ShlAssign, TokenKind::Shl)
                }
                _ => self.select('=', TokenKind::Leq, TokenKind::Lss),
            },
            '>' => match self.peek() {
                Some('>') => {
                    self.advance();
                    self.select('=', TokenKind::ShrAssign, TokenKind::Shr)
                }
                _ => self.select('=', TokenKind::Geq, TokenKind::Gtr),
            },
            other => {
                return Err(CondorError::at(ErrorKind::Scanner(format!(
                    "unexpected character '{other}'"
                )), start)
                .with_raw(other.to_string()));
            }
        };

        let raw = self.source[start.offset..self.pos].to_string();
        Ok(self.token(kind, raw, start))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut sc = Scanner::new(src);
        let mut out = Vec::new();
        loop {
            let tok = sc.next_token().unwrap();
            if tok.kind == TokenKind::End {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    fn first(src: &str) -> Token {
        Scanner::new(src).next_token().unwrap()
    }

    // ── Keywords and identifiers ─────────────────────────────────────────────

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("func var int string export public object"),
            vec![
                TokenKind::Func,
                TokenKind::Var,
                TokenKind::Int,
                TokenKind::StringType,
                TokenKind::Export,
                TokenKind::Public,
                TokenKind::Object,
            ]
        );
    }

    #[test]
    fn test_identifier_raw() {
        let tok = first("counter_1");
        assert_eq!(tok.kind, TokenKind::Ident);
        assert_eq!(tok.raw, "counter_1");
        assert_eq!(tok.len(), 9);
    }

    #[test]
    fn test_internal_call_name() {
        let tok = first("%print(x)");
        assert_eq!(tok.kind, TokenKind::Internal);
        assert_eq!(tok.raw, "print");
    }

    #[test]
    fn test_percent_after_operand_is_modulo() {
        assert_eq!(
            kinds("a%b (c)%d x[0]%y"),
            vec![
                TokenKind::Ident,
                TokenKind::Mod,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Mod,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::LBrack,
                TokenKind::Number,
                TokenKind::RBrack,
                TokenKind::Mod,
                TokenKind::Ident,
            ]
        );
        assert_eq!(
            kinds("x = %len(s);"),
            vec![
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Internal,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Semicolon,
            ]
        );
    }

    // ── Literals ─────────────────────────────────────────────────────────────

    #[test]
    fn test_numbers() {
        assert_eq!(first("42").kind, TokenKind::Number);
        assert_eq!(first("0x1F").raw, "0x1F");
        let f = first("3.25");
        assert_eq!(f.kind, TokenKind::Float);
        assert_eq!(f.raw, "3.25");
    }

    #[test]
    fn test_string_is_cooked() {
        let tok = first(r#""a\tb\"c""#);
        assert_eq!(tok.kind, TokenKind::Str);
        assert_eq!(tok.raw, "a\tb\"c");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Scanner::new("\"abc").next_token().unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::Scanner("unterminated string literal".into())
        );
    }

    #[test]
    fn test_char_literal() {
        let tok = first("'x'");
        assert_eq!(tok.kind, TokenKind::Char);
        assert_eq!(tok.raw, "x");
        let err = Scanner::new("'xy'").next_token().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCharValue);
    }

    // ── Operators ────────────────────────────────────────────────────────────

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ ++ += << <<= <= && &^= != ! %"),
            vec![
                TokenKind::Add,
                TokenKind::Inc,
                TokenKind::AddAssign,
                TokenKind::Shl,
                TokenKind::ShlAssign,
                TokenKind::Leq,
                TokenKind::LAnd,
                TokenKind::AndNotAssign,
                TokenKind::Neq,
                TokenKind::Not,
                TokenKind::Mod,
            ]
        );
    }

    #[test]
    fn test_unknown_character() {
        let err = Scanner::new("@").next_token().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Scanner(_)));
        assert_eq!(err.raw.as_deref(), Some("@"));
    }

    // ── Trivia and positions ─────────────────────────────────────────────────

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("a // line\n /* block\n comment */ b"),
            vec![TokenKind::Ident, TokenKind::Ident]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert!(Scanner::new("/* open").next_token().is_err());
    }

    #[test]
    fn test_positions_track_lines() {
        let mut sc = Scanner::new("a\n  b");
        let a = sc.next_token().unwrap();
        let b = sc.next_token().unwrap();
        assert_eq!((a.span.start.line, a.span.start.column), (1, 1));
        assert_eq!((b.span.start.line, b.span.start.column), (2, 3));
        assert_eq!(b.span.start.offset, 4);
    }

    #[test]
    fn test_substr() {
        let sc = Scanner::new("func f() { x; }");
        assert_eq!(sc.substr(10, 13), " x;");
        assert_eq!(sc.substr(10, 100), "");
    }

    #[test]
    fn test_empty_source() {
        let tok = first("   ");
        assert_eq!(tok.kind, TokenKind::End);
        assert!(tok.is_empty());
    }
}
