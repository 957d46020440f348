//! # SQL Lexer - Zero-Copy Tokenizer
//!
//! Tokenizes a query string without allocating: identifier and literal
//! tokens are borrowed slices of the input. The token alphabet is the one
//! the parser relies on:
//!
//! - Whitespace (space, tab, carriage return, newline) separates tokens
//!   and is discarded.
//! - Single-character tokens: `,`, `(`, `)`, `*`, `=`.
//! - `>`, `<`, `!` optionally followed by `=`; `<>` is inequality.
//! - `'` and `"` open a quoted literal whose body is the uninterpreted
//!   span up to the matching quote. No escape processing.
//! - Numbers are an optional `-`, digits, and at most one `.`.
//! - Any other run of identifier characters is an identifier, checked
//!   against the keyword table (`phf` perfect hash, O(1)) after a single
//!   uppercase normalization, so keywords are case-insensitive everywhere.
//!
//! Invalid input produces `Token::Error` with a description; the parser
//! turns it into a spanned diagnostic. Line and column are tracked for
//! error messages on multi-line query strings.

use phf::phf_map;

use crate::token::{Keyword, Token};

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "SELECT" => Keyword::Select,
    "FROM" => Keyword::From,
    "WHERE" => Keyword::Where,
    "AS" => Keyword::As,
    "JOIN" => Keyword::Join,
    "NATURAL" => Keyword::Natural,
    "CROSS" => Keyword::Cross,
    "AND" => Keyword::And,
    "OR" => Keyword::Or,
    "NOT" => Keyword::Not,
};

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();

        if self.is_eof() {
            return Token::Eof;
        }

        let ch = self.current();

        if ch.is_ascii_alphabetic() || ch == b'_' {
            return self.scan_identifier_or_keyword();
        }

        if ch.is_ascii_digit() {
            return self.scan_number();
        }

        match ch {
            b'\'' | b'"' => self.scan_string(ch),
            b'-' => self.scan_minus(),
            b'=' => {
                self.advance();
                Token::Eq
            }
            b'<' => self.scan_less_than(),
            b'>' => self.scan_greater_than(),
            b'!' => self.scan_exclamation(),
            b'*' => {
                self.advance();
                Token::Star
            }
            b',' => {
                self.advance();
                Token::Comma
            }
            b'(' => {
                self.advance();
                Token::LParen
            }
            b')' => {
                self.advance();
                Token::RParen
            }
            _ => {
                self.advance();
                Token::Error("unexpected character")
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn peek_char(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            if self.current() == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() {
            match self.current() {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
                _ => break,
            }
        }
    }

    fn scan_identifier_or_keyword(&mut self) -> Token<'a> {
        let start = self.pos;

        while !self.is_eof() && (self.current().is_ascii_alphanumeric() || self.current() == b'_') {
            self.advance();
        }

        let ident = &self.input[start..self.pos];
        let upper = ident.to_ascii_uppercase();

        if let Some(&keyword) = KEYWORDS.get(&upper) {
            Token::Keyword(keyword)
        } else {
            Token::Ident(ident)
        }
    }

    fn scan_minus(&mut self) -> Token<'a> {
        if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.scan_number()
        } else {
            self.advance();
            Token::Error("expected digits after `-`")
        }
    }

    fn scan_number(&mut self) -> Token<'a> {
        let start = self.pos;

        if self.current() == b'-' {
            self.advance();
        }
        while !self.is_eof() && self.current().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;
        if !self.is_eof() && self.current() == b'.' {
            is_float = true;
            self.advance();
            while !self.is_eof() && self.current().is_ascii_digit() {
                self.advance();
            }
        }

        let text = &self.input[start..self.pos];
        if is_float {
            Token::Float(text)
        } else {
            Token::Integer(text)
        }
    }

    fn scan_string(&mut self, quote: u8) -> Token<'a> {
        self.advance();
        let start = self.pos;

        while !self.is_eof() && self.current() != quote {
            self.advance();
        }

        if self.is_eof() {
            return Token::Error("missing closing quote");
        }

        let end = self.pos;
        self.advance();
        Token::String(&self.input[start..end])
    }

    fn scan_less_than(&mut self) -> Token<'a> {
        self.advance();
        if !self.is_eof() {
            match self.current() {
                b'=' => {
                    self.advance();
                    return Token::LtEq;
                }
                b'>' => {
                    self.advance();
                    return Token::NotEq;
                }
                _ => {}
            }
        }
        Token::Lt
    }

    fn scan_greater_than(&mut self) -> Token<'a> {
        self.advance();
        if !self.is_eof() && self.current() == b'=' {
            self.advance();
            return Token::GtEq;
        }
        Token::Gt
    }

    fn scan_exclamation(&mut self) -> Token<'a> {
        self.advance();
        if !self.is_eof() && self.current() == b'=' {
            self.advance();
            Token::NotEq
        } else {
            Token::Error("expected `=` after `!`")
        }
    }
}
