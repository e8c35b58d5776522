//! Expression rules.
//!
//! Expressions are parsed right-associatively with no precedence levels:
//! `a - b - c` is `a - (b - c)`.  Every arithmetic, boolean and assignment
//! operator continues the chain; the whole chain is folded from the right
//! once its last term is read.

use crate::error::{CondorResult, ErrorKind};
use crate::parser::ast::{ArrayNode, BinaryNode, CallNode, LiteralNode, NodeKind, NodeRef};
use crate::parser::scanner::{Position, TokenKind};
use crate::parser::state::Parser;

impl Parser<'_, '_> {
    /// A binary expression, consuming a trailing `;` if present.
    pub(crate) fn parse_expr(&mut self) -> CondorResult<Option<NodeRef>> {
        let expr = self.parse_binary()?;
        if self.is(TokenKind::Semicolon) {
            self.next()?;
        }
        Ok(expr)
    }

    /// A condition: a required expression, flagged boolean when it is a
    /// binary expression.
    pub(crate) fn parse_boolean(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing boolean");
        let expr = self
            .parse_binary()?
            .ok_or_else(|| self.error(ErrorKind::MissingExpression))?;
        if let NodeKind::BinaryExpr(binary) = &mut self.node_mut(expr)?.kind {
            binary.is_boolean = true;
        }
        Ok(expr)
    }

    /// `term {op term}`, folded right: `a - b - c` is `a - (b - c)`.
    ///
    /// Returns `None` when the current token cannot start an expression.
    /// The chain is collected iteratively, so long operator chains do not
    /// grow the call stack.
    pub(crate) fn parse_binary(&mut self) -> CondorResult<Option<NodeRef>> {
        self.trace("Parsing binary expression");
        let mut at = self.here();
        let (mut term, mut is_array) = self.parse_term()?;

        let mut chain: Vec<(Option<NodeRef>, TokenKind, Position)> = Vec::new();
        while !is_array {
            let op = self.tok.kind;
            if !(op.is_operator() || op.is_boolean() || op.is_assignment()) {
                break;
            }
            self.next()?;
            chain.push((term, op, at));
            at = self.here();
            let (right, array) = self.parse_term()?;
            term = Some(right.ok_or_else(|| self.error(ErrorKind::MissingExpression))?);
            is_array = array;
        }

        let mut expr = term;
        while let Some((left, op, at)) = chain.pop() {
            let right = expr.ok_or_else(|| self.error(ErrorKind::MissingExpression))?;
            let binary = NodeKind::BinaryExpr(BinaryNode {
                left,
                op,
                right,
                is_boolean: false,
            });
            expr = Some(self.alloc(binary, at)?);
        }
        Ok(expr)
    }

    /// `[++|--] value [( args )] [++|--]`, or an array literal.  The flag is
    /// set when the term was an array literal, which ends the chain.
    fn parse_term(&mut self) -> CondorResult<(Option<NodeRef>, bool)> {
        let at = self.here();

        let prefix = if self.is(TokenKind::Inc) || self.is(TokenKind::Dec) {
            let op = self.tok.kind;
            self.next()?;
            Some(op)
        } else {
            None
        };

        let mut expr = None;
        if self.tok.kind.is_value() {
            expr = Some(self.parse_var_type()?);
        }
        if self.is(TokenKind::LParen) {
            expr = Some(self.parse_func_call(expr, at)?);
        }

        if let Some(op) = prefix {
            self.apply_unary(expr, op, false)?;
        } else if self.is(TokenKind::Inc) || self.is(TokenKind::Dec) {
            let op = self.tok.kind;
            self.apply_unary(expr, op, true)?;
            self.next()?;
        }

        if self.is(TokenKind::LBrack) {
            if let Some(term) = expr {
                self.free(term)?;
            }
            return Ok((Some(self.parse_array(at)?), true));
        }
        Ok((expr, false))
    }

    /// Record `++`/`--` on a literal term.
    fn apply_unary(&mut self, expr: Option<NodeRef>, op: TokenKind, is_post: bool) -> CondorResult<()> {
        let Some(expr) = expr else {
            return Err(self.error(ErrorKind::InvalidLeftExpression));
        };
        if let NodeKind::Literal(lit) = &mut self.node_mut(expr)?.kind {
            lit.unary = Some(op);
            lit.is_post = is_post;
            return Ok(());
        }
        Err(self.error(ErrorKind::InvalidLeftExpression))
    }

    /// A single value token as a literal.
    pub(crate) fn parse_var_type(&mut self) -> CondorResult<NodeRef> {
        let kind = self.tok.kind;
        if !kind.is_value() {
            return Err(self.error(ErrorKind::Unexpected(kind)));
        }
        let at = self.here();
        let value = self.tok.raw.clone();
        self.next()?;
        self.alloc(NodeKind::Literal(LiteralNode::new(value, kind)), at)
    }

    /// `callee ( args )`.  The callee literal only supplies the name and is
    /// released once the call node exists.
    fn parse_func_call(&mut self, callee: Option<NodeRef>, at: Position) -> CondorResult<NodeRef> {
        self.trace("Parsing func call");
        let Some(callee) = callee else {
            return Err(self.error(ErrorKind::InvalidFunctionCall));
        };
        let name = match self.isolate.try_node(callee)?.as_literal() {
            Some(lit) if lit.lit_type == TokenKind::Ident => lit.value.clone(),
            _ => return Err(self.error(ErrorKind::InvalidFunctionCall)),
        };
        let call = self.parse_call_args(name, false, at)?;
        self.free(callee)?;
        Ok(call)
    }

    /// `( [expr {, expr}] )` into a call node named `name`.
    pub(crate) fn parse_call_args(&mut self, name: String, is_internal: bool, at: Position) -> CondorResult<NodeRef> {
        self.eat(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.is(TokenKind::RParen) {
            let param = self
                .parse_expr()?
                .ok_or_else(|| self.error(ErrorKind::ExpectedParameter))?;
            params.push(param);
            if self.is(TokenKind::RParen) {
                break;
            }
            if !self.is(TokenKind::Comma) {
                return Err(self.error(ErrorKind::ExpectedParameter));
            }
            self.next()?;
        }
        self.next()?;
        self.alloc(
            NodeKind::FuncCall(CallNode {
                name,
                params,
                is_internal,
            }),
            at,
        )
    }

    /// `[ [expr {, expr}] ]`
    fn parse_array(&mut self, at: Position) -> CondorResult<NodeRef> {
        self.trace("Parsing array");
        self.eat(TokenKind::LBrack)?;
        let mut members = Vec::new();
        while !self.is(TokenKind::RBrack) {
            if self.is(TokenKind::End) {
                return Err(self.error(ErrorKind::Expected(TokenKind::RBrack)));
            }
            let member = self
                .parse_expr()?
                .ok_or_else(|| self.error(ErrorKind::InvalidExpression))?;
            members.push(member);
            if self.is(TokenKind::Comma) {
                self.next()?;
            }
        }
        self.next()?;
        self.alloc(NodeKind::Array(ArrayNode { members }), at)
    }
}
