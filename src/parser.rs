/// Recursive-descent parser for the Chirp surface syntax.
///
/// Produces the fixed AST vocabulary of `ast.rs`. Name resolution
/// happens here: declared params/locals become Local nodes, capitalized
/// names become Global nodes, and anything else becomes a Slot node
/// inside a method body or a Local node in a top-level command.
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Ast, Code, Command, Definition};
use crate::lexer::{LexError, Lexer, Token, TokenKind};
use crate::value::Value;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parse error [{line}:{col}]: {msg}")]
    Error {
        msg: String,
        line: usize,
        col: usize,
    },
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> ParseError {
        let LexError::Error { msg, line, col } = err;
        ParseError::Error { msg, line, col }
    }
}

/// Parse one top-level command: optional `|x y|` declarations plus a
/// statement sequence.
pub fn parse_command(source: &str) -> Result<Command, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(tokens, Context::Workspace);
    let decls = parser.parse_decls()?;
    parser.push_scope(&decls);
    if parser.current_is(&TokenKind::Eof) {
        return Err(parser.error("Expected an expression"));
    }
    let body = parser.parse_seq(&TokenKind::Eof)?;
    parser.expect(&TokenKind::Eof)?;
    Ok(Command { decls, body })
}

/// Parse one definition record: `Name |slots|` or `Name pattern body`.
pub fn parse_definition(source: &str) -> Result<Definition, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(tokens, Context::Method);

    let class = parser.expect_ident("a class name")?;
    if !starts_upper(&class) {
        return Err(parser.error(format!("Class name '{}' must be capitalized", class)));
    }

    // Layout definition: `Name |slot1 slot2|`
    if parser.current_is(&TokenKind::VBar) {
        let slots = parser.parse_decls()?;
        parser.expect(&TokenKind::Eof)?;
        return Ok(Definition::Layout { class, slots });
    }

    // Method definition: selector pattern, then body.
    let (selector, params) = parser.parse_selector_pattern()?;
    let locals = parser.parse_decls()?;
    let mut names = params.clone();
    names.extend(locals.iter().cloned());
    parser.push_scope(&names);
    if parser.current_is(&TokenKind::Eof) {
        return Err(parser.error(format!("Method '{}' has an empty body", selector)));
    }
    let body = parser.parse_seq(&TokenKind::Eof)?;
    parser.expect(&TokenKind::Eof)?;

    Ok(Definition::Method {
        class,
        selector,
        code: Rc::new(Code {
            params,
            locals,
            body,
        }),
    })
}

/// Where undeclared lowercase names resolve to: slots inside a method
/// body, workspace variables at the top level.
#[derive(Clone, Copy, PartialEq)]
enum Context {
    Workspace,
    Method,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    context: Context,
    scopes: Vec<Vec<String>>,
}

impl Parser {
    fn new(tokens: Vec<Token>, context: Context) -> Self {
        Parser {
            tokens,
            pos: 0,
            context,
            scopes: Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Statements and expressions
    // -----------------------------------------------------------------

    /// `expr. expr. ...` folded into Then nodes; a trailing dot before
    /// the terminator is allowed.
    fn parse_seq(&mut self, term: &TokenKind) -> Result<Rc<Ast>, ParseError> {
        if self.current_is(term) {
            return Ok(Rc::new(Ast::Constant(Value::Nil)));
        }
        let mut expr = self.parse_expr()?;
        while self.current_is(&TokenKind::Dot) {
            self.advance();
            if self.current_is(term) {
                break;
            }
            let next = self.parse_expr()?;
            expr = Rc::new(Ast::Then(expr, next));
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Rc<Ast>, ParseError> {
        if let TokenKind::Ident(name) = &self.current().kind {
            if self.peek(1).kind == TokenKind::Assign {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                return Ok(Rc::new(self.resolve_put(&name, value)));
            }
        }
        self.parse_cascade()
    }

    /// `expr; msg; msg: arg` — every segment sends to the value of the
    /// expression to its left, and the cascade yields that value.
    fn parse_cascade(&mut self) -> Result<Rc<Ast>, ParseError> {
        let mut expr = self.parse_keyword()?;
        while self.current_is(&TokenKind::Semi) {
            self.advance();
            let (selector, operands) = self.parse_message()?;
            expr = Rc::new(Ast::Cascade {
                subject: expr,
                selector,
                operands,
            });
        }
        Ok(expr)
    }

    /// One cascaded message: unary, binary or keyword form.
    fn parse_message(&mut self) -> Result<(String, Vec<Rc<Ast>>), ParseError> {
        match self.current().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, Vec::new()))
            }
            TokenKind::BinOp(op) => {
                self.advance();
                let arg = self.parse_binary()?;
                Ok((op, vec![arg]))
            }
            TokenKind::VBar => {
                self.advance();
                let arg = self.parse_binary()?;
                Ok(("|".to_string(), vec![arg]))
            }
            TokenKind::Keyword(_) => {
                let mut selector = String::new();
                let mut operands = Vec::new();
                while let TokenKind::Keyword(segment) = self.current().kind.clone() {
                    selector.push_str(&segment);
                    self.advance();
                    operands.push(self.parse_binary()?);
                }
                Ok((selector, operands))
            }
            _ => Err(self.error("Expected a message after ';'")),
        }
    }

    fn parse_keyword(&mut self) -> Result<Rc<Ast>, ParseError> {
        let subject = self.parse_binary()?;
        if !matches!(self.current().kind, TokenKind::Keyword(_)) {
            return Ok(subject);
        }
        let mut selector = String::new();
        let mut operands = Vec::new();
        while let TokenKind::Keyword(segment) = self.current().kind.clone() {
            selector.push_str(&segment);
            self.advance();
            operands.push(self.parse_binary()?);
        }
        Ok(Rc::new(Ast::Send {
            subject,
            selector,
            operands,
        }))
    }

    fn parse_binary(&mut self) -> Result<Rc<Ast>, ParseError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::BinOp(op) => op.clone(),
                TokenKind::VBar => "|".to_string(),
                _ => break,
            };
            self.advance();
            let arg = self.parse_unary()?;
            expr = Rc::new(Ast::Send {
                subject: expr,
                selector: op,
                operands: vec![arg],
            });
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Rc<Ast>, ParseError> {
        let mut expr = self.parse_primary()?;
        while let TokenKind::Ident(name) = self.current().kind.clone() {
            self.advance();
            expr = Rc::new(Ast::Send {
                subject: expr,
                selector: name,
                operands: Vec::new(),
            });
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Rc<Ast>, ParseError> {
        match self.current().kind.clone() {
            TokenKind::Int(i) => {
                self.advance();
                Ok(Rc::new(Ast::Constant(Value::Int(i))))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Rc::new(Ast::Constant(Value::Float(f))))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Rc::new(Ast::Constant(Value::str(&s))))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Rc::new(match name.as_str() {
                    "self" => Ast::SelfRef,
                    "true" => Ast::Constant(Value::Bool(true)),
                    "false" => Ast::Constant(Value::Bool(false)),
                    "nil" => Ast::Constant(Value::Nil),
                    _ => self.resolve_get(&name),
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_seq(&TokenKind::RParen)?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_block(),
            TokenKind::HashParen => {
                let items = self.parse_list_literal()?;
                Ok(Rc::new(Ast::Constant(items)))
            }
            _ => Err(self.error("Expected an expression")),
        }
    }

    /// `[:x :y | |tmp| body]`
    fn parse_block(&mut self) -> Result<Rc<Ast>, ParseError> {
        self.advance(); // '['
        let mut params = Vec::new();
        while let TokenKind::BlockParam(name) = self.current().kind.clone() {
            params.push(name);
            self.advance();
        }
        if !params.is_empty() {
            self.expect(&TokenKind::VBar)?;
        }
        let locals = self.parse_decls()?;
        let mut names = params.clone();
        names.extend(locals.iter().cloned());
        self.push_scope(&names);
        let body = self.parse_seq(&TokenKind::RBracket)?;
        self.expect(&TokenKind::RBracket)?;
        self.pop_scope();
        Ok(Rc::new(Ast::Code(Rc::new(Code {
            params,
            locals,
            body,
        }))))
    }

    /// `#(1 2.5 'three' #(4) true nil)` — nested literal constants only.
    fn parse_list_literal(&mut self) -> Result<Value, ParseError> {
        self.advance(); // '#('
        let mut items = Vec::new();
        loop {
            match self.current().kind.clone() {
                TokenKind::RParen => {
                    self.advance();
                    return Ok(Value::list(items));
                }
                TokenKind::Int(i) => {
                    self.advance();
                    items.push(Value::Int(i));
                }
                TokenKind::Float(f) => {
                    self.advance();
                    items.push(Value::Float(f));
                }
                TokenKind::Str(s) => {
                    self.advance();
                    items.push(Value::str(&s));
                }
                // `#(1 -2)` lexes the minus as an operator run.
                TokenKind::BinOp(op) if op == "-" => {
                    self.advance();
                    match self.current().kind.clone() {
                        TokenKind::Int(i) => {
                            self.advance();
                            items.push(Value::Int(-i));
                        }
                        TokenKind::Float(f) => {
                            self.advance();
                            items.push(Value::Float(-f));
                        }
                        _ => return Err(self.error("Expected a number after '-'")),
                    }
                }
                TokenKind::Ident(name) => {
                    self.advance();
                    match name.as_str() {
                        "true" => items.push(Value::Bool(true)),
                        "false" => items.push(Value::Bool(false)),
                        "nil" => items.push(Value::Nil),
                        other => {
                            return Err(self.error(format!(
                                "'{}' is not a literal; list literals hold literals only",
                                other
                            )))
                        }
                    }
                }
                TokenKind::HashParen => {
                    let nested = self.parse_list_literal()?;
                    items.push(nested);
                }
                _ => return Err(self.error("Expected a literal or ')' in a list literal")),
            }
        }
    }

    // -----------------------------------------------------------------
    // Declarations and selector patterns
    // -----------------------------------------------------------------

    /// `|a b c|` — empty when the next token is not a bar.
    fn parse_decls(&mut self) -> Result<Vec<String>, ParseError> {
        if !self.current_is(&TokenKind::VBar) {
            return Ok(Vec::new());
        }
        self.advance();
        let mut names = Vec::new();
        loop {
            match self.current().kind.clone() {
                TokenKind::VBar => {
                    self.advance();
                    return Ok(names);
                }
                TokenKind::Ident(name) => {
                    self.advance();
                    names.push(name);
                }
                _ => return Err(self.error("Expected a name or '|' in a declaration list")),
            }
        }
    }

    /// The header of a method definition: `reset`, `+ other` or
    /// `at: key put: val`. Answers (selector, parameter names).
    fn parse_selector_pattern(&mut self) -> Result<(String, Vec<String>), ParseError> {
        match self.current().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, Vec::new()))
            }
            TokenKind::BinOp(op) => {
                self.advance();
                let param = self.expect_ident("a parameter name")?;
                Ok((op, vec![param]))
            }
            TokenKind::Keyword(_) => {
                let mut selector = String::new();
                let mut params = Vec::new();
                while let TokenKind::Keyword(segment) = self.current().kind.clone() {
                    selector.push_str(&segment);
                    self.advance();
                    params.push(self.expect_ident("a parameter name")?);
                }
                Ok((selector, params))
            }
            _ => Err(self.error("Expected a selector pattern")),
        }
    }

    // -----------------------------------------------------------------
    // Name resolution
    // -----------------------------------------------------------------

    fn resolve_get(&self, name: &str) -> Ast {
        if self.in_scope(name) {
            Ast::LocalGet(name.to_string())
        } else if starts_upper(name) {
            Ast::GlobalGet(name.to_string())
        } else if self.context == Context::Method {
            Ast::SlotGet(name.to_string())
        } else {
            Ast::LocalGet(name.to_string())
        }
    }

    fn resolve_put(&self, name: &str, value: Rc<Ast>) -> Ast {
        if !self.in_scope(name) && !starts_upper(name) && self.context == Context::Method {
            Ast::SlotPut(name.to_string(), value)
        } else {
            Ast::LocalPut(name.to_string(), value)
        }
    }

    fn in_scope(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.iter().any(|n| n == name))
    }

    fn push_scope(&mut self, names: &[String]) {
        self.scopes.push(names.to_vec());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    // -----------------------------------------------------------------
    // Token plumbing
    // -----------------------------------------------------------------

    fn current(&self) -> &Token {
        self.at(self.pos)
    }

    fn peek(&self, offset: usize) -> &Token {
        self.at(self.pos + offset)
    }

    fn at(&self, idx: usize) -> &Token {
        if idx < self.tokens.len() {
            &self.tokens[idx]
        } else {
            // tokenize always ends with Eof
            self.tokens.last().expect("empty token stream")
        }
    }

    fn current_is(&self, kind: &TokenKind) -> bool {
        self.current().kind == *kind
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.current_is(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected {:?}", kind)))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        if let TokenKind::Ident(name) = self.current().kind.clone() {
            self.advance();
            Ok(name)
        } else {
            Err(self.error(format!("Expected {}", what)))
        }
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        let tok = self.current();
        ParseError::Error {
            msg: msg.into(),
            line: tok.line,
            col: tok.col,
        }
    }
}

fn starts_upper(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
