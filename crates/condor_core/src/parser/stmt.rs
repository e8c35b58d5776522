//! Statement and declaration rules.

use smallvec::SmallVec;
use tracing::info;

use crate::error::{CondorResult, ErrorKind};
use crate::parser::ast::{
    CaseNode, DeleteNode, ForNode, FuncNode, IfNode, LiteralNode, Modifiers, ModuleNode, NodeKind,
    NodeRef, ObjectNode, ReturnNode, ScopeRef, SwitchNode, ThrowNode, TryCatchNode, VarNode,
    Visibility, WhileNode,
};
use crate::parser::scanner::{Position, TokenKind};
use crate::parser::scope::Scope;
use crate::parser::state::Parser;

/// Nodes yielded by one declaration.  Almost always exactly one.
type Yield = SmallVec<[NodeRef; 1]>;

#[derive(Debug, Default)]
struct DeclModifiers {
    is_export: bool,
    visibility: Modifiers,
}

impl Parser<'_, '_> {
    /// Program := import-block statement-list End
    pub(crate) fn parse_program(&mut self) -> CondorResult<()> {
        self.next()?;
        self.parse_imports()?;
        self.parse_stmt_list(TokenKind::End)
    }

    // ── Imports / includes ────────────────────────────────────────────────

    /// A run of `import`/`include` declarations.  Each is either bare,
    /// `import "a" as "b"`, or grouped, `import { "a", "b" as "c" }`; one
    /// block uses a single form throughout.
    fn parse_imports(&mut self) -> CondorResult<()> {
        let mut grouped_form: Option<bool> = None;
        while self.is(TokenKind::Import) || self.is(TokenKind::Include) {
            self.trace("Parsing import/include");
            let is_import = self.is(TokenKind::Import);
            self.next()?;
            let grouped = self.is(TokenKind::LBrace);
            if *grouped_form.get_or_insert(grouped) != grouped {
                return Err(self.error(ErrorKind::InvalidIncludeImport));
            }
            if grouped {
                self.next()?;
                while !self.is(TokenKind::RBrace) {
                    self.parse_module_entry(is_import)?;
                    if self.is(TokenKind::Comma) {
                        self.next()?;
                    } else if !self.is(TokenKind::RBrace) {
                        return Err(self.error(ErrorKind::InvalidIncludeImport));
                    }
                }
                self.next()?;
            } else {
                self.parse_module_entry(is_import)?;
            }
            if self.is(TokenKind::Semicolon) {
                self.next()?;
            }
        }
        Ok(())
    }

    fn parse_module_entry(&mut self, is_import: bool) -> CondorResult<()> {
        if !self.is(TokenKind::Str) {
            return Err(self.error(ErrorKind::InvalidIncludeImport));
        }
        let at = self.here();
        let name = self.tok.raw.clone();
        self.next()?;
        let alias = self.parse_alias()?;
        let module = ModuleNode { name, alias };
        if is_import {
            let node = self.alloc(NodeKind::Import(module), at)?;
            self.imports.push(node);
        } else {
            let node = self.alloc(NodeKind::Include(module), at)?;
            self.includes.push(node);
        }
        Ok(())
    }

    /// `as "alias"`, if present.
    fn parse_alias(&mut self) -> CondorResult<Option<String>> {
        if !self.is(TokenKind::As) {
            return Ok(None);
        }
        self.next()?;
        if !self.is(TokenKind::Str) {
            return Err(self.error(ErrorKind::InvalidIncludeImport));
        }
        let alias = self.tok.raw.clone();
        self.next()?;
        Ok(Some(alias))
    }

    // ── Statement list ────────────────────────────────────────────────────

    /// Statements into the current scope until `terminator` (not consumed).
    pub(crate) fn parse_stmt_list(&mut self, terminator: TokenKind) -> CondorResult<()> {
        while !self.is(terminator) {
            if self.is(TokenKind::End) {
                return Err(self.error(ErrorKind::UnexpectedEndOfFile));
            }
            if self.is(TokenKind::Semicolon) {
                self.next()?;
                continue;
            }
            let modifiers = self.parse_modifiers()?;
            if modifiers.is_export || !modifiers.visibility.is_empty() {
                self.expect_declaration(&modifiers)?;
            }
            for node in self.parse_statement()? {
                if modifiers.is_export || !modifiers.visibility.is_empty() {
                    let target = self.node_mut(node)?;
                    target.is_export = modifiers.is_export;
                    target.visibility = modifiers.visibility.clone();
                }
                self.insert(node)?;
            }
        }
        Ok(())
    }

    /// `export`, or any run of visibility keywords.
    fn parse_modifiers(&mut self) -> CondorResult<DeclModifiers> {
        let mut modifiers = DeclModifiers::default();
        if self.is(TokenKind::Export) {
            modifiers.is_export = true;
            self.next()?;
            if self.tok.kind.is_visibility() {
                return Err(self.error(ErrorKind::InvalidUseOfExport));
            }
            return Ok(modifiers);
        }
        while let Some(v) = Visibility::from_token(self.tok.kind) {
            modifiers.visibility.push(v);
            self.next()?;
        }
        Ok(modifiers)
    }

    /// Modifiers only attach to a function, variable or object declaration.
    fn expect_declaration(&self, modifiers: &DeclModifiers) -> CondorResult<()> {
        let kind = self.tok.kind;
        if matches!(kind, TokenKind::Func | TokenKind::Object) || kind.is_type_keyword() {
            return Ok(());
        }
        if modifiers.is_export {
            Err(self.error(ErrorKind::InvalidUseOfExport))
        } else {
            Err(self.error(ErrorKind::InvalidStatement))
        }
    }

    fn parse_statement(&mut self) -> CondorResult<Yield> {
        let one = |node: NodeRef| -> Yield { SmallVec::from_buf([node]) };
        match self.tok.kind {
            TokenKind::Func => self.parse_func().map(one),
            TokenKind::Ident => self.parse_expr_stmt().map(one),
            TokenKind::For => self.parse_for().map(one),
            TokenKind::While => self.parse_while().map(one),
            TokenKind::Try => self.parse_try_catch().map(one),
            TokenKind::Throw => self.parse_throw().map(one),
            TokenKind::If => self.parse_if().map(one),
            TokenKind::Delete => self.parse_delete().map(one),
            TokenKind::Switch => self.parse_switch().map(one),
            TokenKind::Object => self.parse_object().map(one),
            TokenKind::Internal => self.parse_internal().map(one),
            TokenKind::Return => self.parse_return().map(one),
            kind if kind.is_type_keyword() => self.parse_var_list(),
            kind => Err(self.error(ErrorKind::Unexpected(kind))),
        }
    }

    // ── Declarations ──────────────────────────────────────────────────────

    /// `func name(args) { body }`
    fn parse_func(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing func");
        let at = self.here();
        self.eat(TokenKind::Func)?;
        self.expect(TokenKind::Ident)?;
        let name = self.tok.raw.clone();
        self.next()?;
        let args = self.parse_func_args()?;
        if !self.is(TokenKind::LBrace) {
            return Err(self.error(ErrorKind::MissingFuncBody));
        }
        let body = self.lazy_parse_body()?;
        self.alloc(NodeKind::Func(FuncNode { name, args, body }), at)
    }

    /// `( [type [name]] {, type [name]} )`.  Each argument is a `Var` whose
    /// base type/name come from the first token and whose name is the
    /// optional second identifier.
    pub(super) fn parse_func_args(&mut self) -> CondorResult<Vec<NodeRef>> {
        self.trace("Parsing func args");
        self.eat(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.is(TokenKind::RParen) {
            let kind = self.tok.kind;
            if kind != TokenKind::Ident && !kind.is_type_keyword() {
                return Err(self.error(ErrorKind::InvalidArgumentType));
            }
            let at = self.here();
            let base_name = self.tok.raw.clone();
            self.next()?;
            let name = if self.is(TokenKind::Ident) {
                let name = self.tok.raw.clone();
                self.next()?;
                name
            } else {
                String::new()
            };
            let arg = self.alloc(
                NodeKind::Var(VarNode {
                    name,
                    base_name,
                    base_type: kind,
                    assignment: None,
                    value: None,
                    is_array: false,
                }),
                at,
            )?;
            args.push(arg);
            if self.is(TokenKind::RParen) {
                break;
            }
            self.eat(TokenKind::Comma)?;
        }
        self.next()?;
        Ok(args)
    }

    /// `type[ [] ] name [op expr] [;]` or `type[ [] ] { name [op expr]; ... }`
    pub(super) fn parse_var_list(&mut self) -> CondorResult<Yield> {
        self.trace("Parsing var list");
        let base_type = self.tok.kind;
        let base_name = self.tok.raw.clone();
        self.next()?;
        let is_array = self.is(TokenKind::LBrack);
        if is_array {
            self.next()?;
            self.eat(TokenKind::RBrack)?;
        }
        let grouped = self.is(TokenKind::LBrace);
        if grouped {
            self.next()?;
        }

        let mut vars = Yield::new();
        loop {
            if grouped && self.is(TokenKind::RBrace) {
                self.next()?;
                break;
            }
            self.expect(TokenKind::Ident)?;
            let at = self.here();
            let name = self.tok.raw.clone();
            self.next()?;

            let assignment = self.tok.kind;
            let value = if self.is(TokenKind::Semicolon) {
                self.next()?;
                None
            } else if assignment.is_assignment() {
                self.next()?;
                self.parse_expr()?
            } else {
                return Err(self.error(ErrorKind::InvalidOperator));
            };
            let value = match value {
                Some(v) => v,
                None => self.alloc(NodeKind::Undefined, at)?,
            };

            if self.flags.print_variables {
                info!(
                    target: "condor::parser",
                    name = %name,
                    base = %base_name,
                    is_array,
                    row = at.line,
                    "variable"
                );
            }
            let var = self.alloc(
                NodeKind::Var(VarNode {
                    name,
                    base_name: base_name.clone(),
                    base_type,
                    assignment: Some(assignment),
                    value: Some(value),
                    is_array,
                }),
                at,
            )?;
            vars.push(var);
            if !grouped {
                break;
            }
        }
        Ok(vars)
    }

    /// `object name { statements }`, parsed eagerly into a nested scope.
    fn parse_object(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing object");
        let at = self.here();
        self.next()?;
        self.expect(TokenKind::Ident)?;
        let name = self.tok.raw.clone();
        self.next()?;
        self.eat(TokenKind::LBrace)?;

        let body = self.alloc_scope(Scope::new())?;
        self.open_scope(body)?;
        self.parse_stmt_list(TokenKind::RBrace)?;
        self.close_scope()?;
        self.eat(TokenKind::RBrace)?;

        let members: Vec<(String, Position)> = self
            .isolate
            .try_scope(body)?
            .nodes()
            .iter()
            .filter_map(|&n| self.isolate.node(n))
            .filter(|node| {
                matches!(
                    node.kind,
                    NodeKind::Func(_) | NodeKind::Var(_) | NodeKind::Object(_)
                )
            })
            .filter_map(|node| {
                node.name().map(|name| {
                    let pos = Position {
                        offset: 0,
                        line: node.row,
                        column: node.col,
                    };
                    (name.to_string(), pos)
                })
            })
            .collect();
        let mut keys = Vec::with_capacity(members.len());
        for (name, pos) in members {
            keys.push(self.alloc(NodeKind::Literal(LiteralNode::new(name, TokenKind::Ident)), pos)?);
        }
        self.alloc(NodeKind::Object(ObjectNode { name, body, keys }), at)
    }

    // ── Statements ────────────────────────────────────────────────────────

    /// An expression statement starting with an identifier.
    fn parse_expr_stmt(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing expression statement");
        self.parse_expr()?
            .ok_or_else(|| self.error(ErrorKind::MissingExpression))
    }

    /// `for ( [init] ; condition ; [tick] ) { body }`
    fn parse_for(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing for");
        let at = self.here();
        self.next()?;
        self.eat(TokenKind::LParen)?;

        let init = if self.tok.kind.is_type_keyword() {
            let mut vars = self.parse_var_list()?;
            if vars.len() != 1 {
                return Err(self.error(ErrorKind::InvalidStatement));
            }
            vars.pop()
        } else if self.is(TokenKind::Semicolon) {
            self.next()?;
            None
        } else {
            self.parse_expr()?
        };

        let condition = self.parse_boolean()?;
        if self.is(TokenKind::Semicolon) {
            self.next()?;
        }
        let tick = if self.is(TokenKind::RParen) {
            None
        } else {
            self.parse_expr()?
        };
        self.eat(TokenKind::RParen)?;
        let body = self.lazy_parse_body()?;
        self.alloc(
            NodeKind::For(ForNode {
                init,
                condition,
                tick,
                body,
            }),
            at,
        )
    }

    /// `while ( condition ) { body }`
    fn parse_while(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing while");
        let at = self.here();
        self.next()?;
        self.eat(TokenKind::LParen)?;
        let condition = self.parse_boolean()?;
        self.eat(TokenKind::RParen)?;
        let body = self.lazy_parse_body()?;
        self.alloc(NodeKind::While(WhileNode { condition, body }), at)
    }

    /// `try { } catch ( args ) { }`
    fn parse_try_catch(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing try/catch");
        let at = self.here();
        self.next()?;
        let try_body = self.lazy_parse_body()?;
        self.eat(TokenKind::Catch)?;
        let catch_params = self.parse_func_args()?;
        let catch_body = self.lazy_parse_body()?;
        self.alloc(
            NodeKind::TryCatch(TryCatchNode {
                try_body,
                catch_params,
                catch_body,
            }),
            at,
        )
    }

    /// `throw expr`
    fn parse_throw(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing throw");
        let at = self.here();
        self.next()?;
        let value = self.parse_expr()?;
        self.alloc(NodeKind::Throw(ThrowNode { value }), at)
    }

    /// `if (c) { } [else if (c) { }]* [else { }]`
    fn parse_if(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing if");
        let at = self.here();
        let (condition, body) = self.parse_if_branch()?;

        let mut else_ifs = Vec::new();
        let mut else_branch = None;
        while self.is(TokenKind::Else) {
            let else_at = self.here();
            self.next()?;
            if self.is(TokenKind::If) {
                let branch_at = self.here();
                let (condition, body) = self.parse_if_branch()?;
                else_ifs.push(self.alloc(NodeKind::If(IfNode::branch(condition, body)), branch_at)?);
            } else {
                self.expect(TokenKind::LBrace)?;
                let always = self.alloc(
                    NodeKind::Literal(LiteralNode::new("true", TokenKind::True)),
                    else_at,
                )?;
                let body = self.lazy_parse_body()?;
                else_branch = Some(self.alloc(NodeKind::If(IfNode::branch(always, body)), else_at)?);
                break;
            }
        }

        self.alloc(
            NodeKind::If(IfNode {
                condition,
                body,
                else_ifs,
                else_branch,
            }),
            at,
        )
    }

    /// `if ( condition ) { body }`
    fn parse_if_branch(&mut self) -> CondorResult<(NodeRef, ScopeRef)> {
        self.eat(TokenKind::If)?;
        self.eat(TokenKind::LParen)?;
        let condition = self.parse_boolean()?;
        self.eat(TokenKind::RParen)?;
        let body = self.lazy_parse_body()?;
        Ok((condition, body))
    }

    /// `delete name;`
    fn parse_delete(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing delete");
        let at = self.here();
        self.next()?;
        self.expect(TokenKind::Ident)?;
        let target = self.parse_var_type()?;
        self.eat(TokenKind::Semicolon)?;
        self.alloc(NodeKind::Delete(DeleteNode { target }), at)
    }

    /// `switch ( expr ) { case literal: { } ... default: { } }`
    fn parse_switch(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing switch");
        let at = self.here();
        self.next()?;
        self.eat(TokenKind::LParen)?;
        let value = self
            .parse_expr()?
            .ok_or_else(|| self.error(ErrorKind::MissingExpression))?;
        self.eat(TokenKind::RParen)?;
        self.eat(TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while self.is(TokenKind::Case) || self.is(TokenKind::Default) {
            cases.push(self.parse_case()?);
        }
        self.eat(TokenKind::RBrace)?;
        self.alloc(NodeKind::Switch(SwitchNode { value, cases }), at)
    }

    fn parse_case(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing case");
        let at = self.here();
        let condition = if self.is(TokenKind::Default) {
            self.next()?;
            None
        } else {
            self.next()?;
            Some(self.parse_var_type()?)
        };
        self.eat(TokenKind::Colon)?;
        let body = self.lazy_parse_body()?;
        self.alloc(NodeKind::Case(CaseNode { condition, body }), at)
    }

    /// `%name(args)`, accepted only when natives are enabled.
    fn parse_internal(&mut self) -> CondorResult<NodeRef> {
        if !self.flags.allow_natives {
            return Err(self.error(ErrorKind::Unexpected(TokenKind::Internal)));
        }
        self.trace("Parsing native call");
        let at = self.here();
        let name = self.tok.raw.clone();
        self.next()?;
        let call = self.parse_call_args(name, true, at)?;
        if self.is(TokenKind::Semicolon) {
            self.next()?;
        }
        Ok(call)
    }

    /// `return [expr]`
    fn parse_return(&mut self) -> CondorResult<NodeRef> {
        self.trace("Parsing return");
        let at = self.here();
        self.next()?;
        let value = self.parse_expr()?;
        self.alloc(NodeKind::Return(ReturnNode { value }), at)
    }
}

impl IfNode {
    /// A single branch with no chained alternatives.
    fn branch(condition: NodeRef, body: ScopeRef) -> Self {
        Self {
            condition,
            body,
            else_ifs: Vec::new(),
            else_branch: None,
        }
    }
}
