/// Tokenizer for the Chirp surface syntax: identifiers, keyword selector
/// segments, binary-operator runs, literals and the handful of
/// punctuation marks the grammar needs.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    /// `'single-quoted'`, with `''` escaping a quote.
    Str(String),
    /// Plain identifier: a variable name or a unary selector.
    Ident(String),
    /// `name:` — one segment of a keyword selector.
    Keyword(String),
    /// `:name` — a block parameter.
    BlockParam(String),
    /// A run of binary-selector characters: `+`, `<=`, `~=`, `,`, ...
    BinOp(String),
    Assign, // :=
    LParen,
    RParen,
    LBracket,
    RBracket,
    /// `#(` — opens a list literal.
    HashParen,
    VBar, // |
    Semi, // ;
    Dot,  // .
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Error)]
pub enum LexError {
    #[error("Lex error [{line}:{col}]: {msg}")]
    Error {
        msg: String,
        line: usize,
        col: usize,
    },
}

const BINOP_CHARS: &str = "+-*/\\~<>=&@%,";

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    /// Whether the previous token could end an operand — decides whether
    /// `-3` is a negative literal or a binary minus.
    after_operand: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            after_operand: false,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_blank()?;
            let (line, col) = (self.line, self.col);
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line,
                    col,
                });
                return Ok(tokens);
            };
            let kind = self.next_kind(c, line, col)?;
            self.after_operand = matches!(
                kind,
                TokenKind::Int(_)
                    | TokenKind::Float(_)
                    | TokenKind::Str(_)
                    | TokenKind::Ident(_)
                    | TokenKind::RParen
                    | TokenKind::RBracket
            );
            tokens.push(Token { kind, line, col });
        }
    }

    fn next_kind(&mut self, c: char, line: usize, col: usize) -> Result<TokenKind, LexError> {
        if c.is_ascii_digit() {
            return self.lex_number(false, line, col);
        }
        if c == '-' && !self.after_operand && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
            self.advance();
            return self.lex_number(true, line, col);
        }
        if c.is_alphabetic() || c == '_' {
            let name = self.lex_name();
            // `name:` is a keyword segment unless it is really `name := ...`
            if self.peek() == Some(':') && self.peek_at(1) != Some('=') {
                self.advance();
                return Ok(TokenKind::Keyword(format!("{}:", name)));
            }
            return Ok(TokenKind::Ident(name));
        }
        match c {
            '\'' => self.lex_string(line, col),
            ':' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(TokenKind::Assign)
                } else if self.peek().is_some_and(|d| d.is_alphabetic() || d == '_') {
                    Ok(TokenKind::BlockParam(self.lex_name()))
                } else {
                    Err(self.error("Expected ':=' or a block parameter after ':'", line, col))
                }
            }
            '#' => {
                self.advance();
                if self.peek() == Some('(') {
                    self.advance();
                    Ok(TokenKind::HashParen)
                } else {
                    Err(self.error("Expected '(' after '#'", line, col))
                }
            }
            '(' => {
                self.advance();
                Ok(TokenKind::LParen)
            }
            ')' => {
                self.advance();
                Ok(TokenKind::RParen)
            }
            '[' => {
                self.advance();
                Ok(TokenKind::LBracket)
            }
            ']' => {
                self.advance();
                Ok(TokenKind::RBracket)
            }
            '|' => {
                self.advance();
                Ok(TokenKind::VBar)
            }
            ';' => {
                self.advance();
                Ok(TokenKind::Semi)
            }
            '.' => {
                self.advance();
                Ok(TokenKind::Dot)
            }
            c if BINOP_CHARS.contains(c) => {
                let mut op = String::new();
                while let Some(d) = self.peek() {
                    if !BINOP_CHARS.contains(d) {
                        break;
                    }
                    op.push(d);
                    self.advance();
                }
                Ok(TokenKind::BinOp(op))
            }
            other => Err(self.error(format!("Unexpected character '{}'", other), line, col)),
        }
    }

    fn lex_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            self.advance();
        }
        name
    }

    fn lex_number(&mut self, negative: bool, line: usize, col: usize) -> Result<TokenKind, LexError> {
        let mut text = String::new();
        if negative {
            text.push('-');
        }
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.advance();
        }
        // A dot is only a radix point when a digit follows; otherwise it
        // is the statement separator.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
            text.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                text.push(c);
                self.advance();
            }
            let value: f64 = text
                .parse()
                .map_err(|_| self.error(format!("Bad float literal '{}'", text), line, col))?;
            return Ok(TokenKind::Float(value));
        }
        let value: i64 = text
            .parse()
            .map_err(|_| self.error(format!("Bad integer literal '{}'", text), line, col))?;
        Ok(TokenKind::Int(value))
    }

    fn lex_string(&mut self, line: usize, col: usize) -> Result<TokenKind, LexError> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated string", line, col)),
                Some('\'') => {
                    self.advance();
                    if self.peek() == Some('\'') {
                        text.push('\'');
                        self.advance();
                    } else {
                        return Ok(TokenKind::Str(text));
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Skip whitespace and `"double-quoted"` comments.
    fn skip_blank(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('"') => {
                    let (line, col) = (self.line, self.col);
                    self.advance();
                    loop {
                        match self.peek() {
                            None => return Err(self.error("Unterminated comment", line, col)),
                            Some('"') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn error(&self, msg: impl Into<String>, line: usize, col: usize) -> LexError {
        LexError::Error {
            msg: msg.into(),
            line,
            col,
        }
    }
}
