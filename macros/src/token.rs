//! Token and keyword definitions for the SQL lexer.

/// Reserved words, matched case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    As,
    Join,
    Natural,
    Cross,
    And,
    Or,
    Not,
}

/// One lexical token. String-carrying variants borrow from the input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Token<'a> {
    Keyword(Keyword),
    /// Unquoted identifier (column or table name).
    Ident(&'a str),
    /// Integer literal, unparsed.
    Integer(&'a str),
    /// Decimal literal, unparsed.
    Float(&'a str),
    /// Quoted literal body, without the quotes and uninterpreted.
    String(&'a str),
    Star,
    Comma,
    LParen,
    RParen,
    Eq,
    /// `<>` or `!=`.
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// Lexical error with a static description.
    Error(&'static str),
    Eof,
}

impl Token<'_> {
    /// Render for diagnostics: the token as the user wrote it.
    pub fn describe(&self) -> String {
        match self {
            Token::Keyword(k) => format!("keyword `{}`", format!("{k:?}").to_uppercase()),
            Token::Ident(s) => format!("`{s}`"),
            Token::Integer(s) | Token::Float(s) => format!("`{s}`"),
            Token::String(s) => format!("string literal `{s}`"),
            Token::Star => "`*`".into(),
            Token::Comma => "`,`".into(),
            Token::LParen => "`(`".into(),
            Token::RParen => "`)`".into(),
            Token::Eq => "`=`".into(),
            Token::NotEq => "`<>`".into(),
            Token::Lt => "`<`".into(),
            Token::LtEq => "`<=`".into(),
            Token::Gt => "`>`".into(),
            Token::GtEq => "`>=`".into(),
            Token::Error(msg) => format!("invalid token ({msg})"),
            Token::Eof => "end of query".into(),
        }
    }
}
