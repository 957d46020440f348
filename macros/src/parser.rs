//! # SQL Parser - Recursive Descent
//!
//! Parses the token stream of one query string into an arena-allocated
//! AST. The grammar is deliberately small:
//!
//! ```text
//! root        := SELECT select_list FROM from_clause
//! select_list := '*' | col_item (',' col_item)*
//! col_item    := id [ AS id ]
//! from_clause := source [ (NATURAL|CROSS)? JOIN source ] [ WHERE or_expr ]
//! source      := id | '(' root ')'
//! or_expr     := and_expr (OR and_expr)*
//! and_expr    := not_expr (AND not_expr)*
//! not_expr    := NOT not_expr | comp_expr
//! comp_expr   := term [ ('='|'<>'|'!='|'<'|'<='|'>'|'>=') term ]
//! term        := '(' or_expr ')' | quoted | number | id
//! ```
//!
//! `OR` is left-associative and loosest; `AND` binds tighter, `NOT`
//! tighter still (and right-associative, so `NOT NOT x` is fine),
//! comparisons tightest. A bare `JOIN` is a `CROSS JOIN`.
//!
//! Every failure path produces a distinct [`QueryError`] naming the
//! offending token and the lexer position; the macro entry point turns it
//! into a compile error on the query's string literal.

use bumpalo::Bump;

use crate::ast::{
    CmpOp, Expr, JoinClause, JoinKind, SelectColumn, SelectList, SelectStmt, Source,
};
use crate::error::{QueryError, Result};
use crate::lexer::Lexer;
use crate::token::{Keyword, Token};

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<'a>(arena: &'a Bump, sql: &'a str) -> Result<&'a SelectStmt<'a>> {
        parse_query(sql, arena)
    }

    #[test]
    fn simple_select_star() {
        let arena = Bump::new();
        let stmt = parse(&arena, "SELECT * FROM books").unwrap();
        assert!(matches!(stmt.columns, SelectList::Star));
        assert!(matches!(stmt.from, Source::Table("books")));
        assert!(stmt.join.is_none());
        assert!(stmt.filter.is_none());
    }

    #[test]
    fn select_columns_with_aliases() {
        let arena = Bump::new();
        let stmt = parse(&arena, "SELECT title, genre AS type FROM books").unwrap();
        let SelectList::Columns(cols) = &stmt.columns else {
            panic!("expected a column list");
        };
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "title");
        assert_eq!(cols[0].alias, None);
        assert_eq!(cols[1].name, "genre");
        assert_eq!(cols[1].alias, Some("type"));
    }

    #[test]
    fn natural_and_cross_joins() {
        let arena = Bump::new();
        let stmt = parse(&arena, "SELECT * FROM a NATURAL JOIN b").unwrap();
        assert_eq!(stmt.join.as_ref().unwrap().kind, JoinKind::Natural);

        let stmt = parse(&arena, "SELECT * FROM a CROSS JOIN b").unwrap();
        assert_eq!(stmt.join.as_ref().unwrap().kind, JoinKind::Cross);

        // A bare JOIN is a cross join.
        let stmt = parse(&arena, "SELECT * FROM a JOIN b").unwrap();
        assert_eq!(stmt.join.as_ref().unwrap().kind, JoinKind::Cross);
    }

    #[test]
    fn subquery_source() {
        let arena = Bump::new();
        let stmt = parse(&arena, "SELECT * FROM (SELECT * FROM books WHERE year > 1960)").unwrap();
        let Source::Subquery(inner) = &stmt.from else {
            panic!("expected a subquery source");
        };
        assert!(inner.filter.is_some());
    }

    #[test]
    fn where_precedence_or_loosest() {
        let arena = Bump::new();
        let stmt = parse(&arena, "SELECT * FROM t WHERE a = 1 OR b = 2 AND c = 3").unwrap();
        // OR at the root, AND underneath.
        assert!(matches!(
            stmt.filter.unwrap(),
            Expr::Or(Expr::Cmp { .. }, Expr::And(..))
        ));
    }

    #[test]
    fn not_is_right_associative() {
        let arena = Bump::new();
        let stmt = parse(&arena, "SELECT * FROM t WHERE NOT NOT year > 1970").unwrap();
        assert!(matches!(
            stmt.filter.unwrap(),
            Expr::Not(Expr::Not(Expr::Cmp { op: CmpOp::Gt, .. }))
        ));
    }

    #[test]
    fn parenthesized_expression_overrides_precedence() {
        let arena = Bump::new();
        let stmt = parse(&arena, "SELECT * FROM t WHERE (a = 1 OR b = 2) AND c = 3").unwrap();
        assert!(matches!(
            stmt.filter.unwrap(),
            Expr::And(Expr::Or(..), Expr::Cmp { .. })
        ));
    }

    #[test]
    fn literal_forms() {
        let arena = Bump::new();
        let stmt = parse(
            &arena,
            "SELECT * FROM t WHERE a = -5 OR b = 19.75 OR c = 'quoted' OR d = \"double\"",
        )
        .unwrap();
        let mut literals = Vec::new();
        fn walk<'a>(expr: &'a Expr<'a>, out: &mut Vec<String>) {
            match expr {
                Expr::Or(l, r) | Expr::And(l, r) => {
                    walk(l, out);
                    walk(r, out);
                }
                Expr::Not(e) => walk(e, out),
                Expr::Cmp { rhs, .. } => walk(rhs, out),
                Expr::Integer(v) => out.push(v.to_string()),
                Expr::Float(v) => out.push(v.to_string()),
                Expr::String(s) => out.push((*s).to_string()),
                Expr::Column(_) => {}
            }
        }
        walk(stmt.filter.unwrap(), &mut literals);
        assert_eq!(literals, vec!["-5", "19.75", "quoted", "double"]);
    }

    #[test]
    fn keywords_parse_case_insensitively() {
        let arena = Bump::new();
        let stmt = parse(
            &arena,
            "select title from books natural join authored where year > 1960",
        )
        .unwrap();
        assert_eq!(stmt.join.as_ref().unwrap().kind, JoinKind::Natural);
    }

    #[test]
    fn error_missing_select() {
        let arena = Bump::new();
        let err = parse(&arena, "FROM books").unwrap_err();
        assert!(err.message().contains("expected keyword `SELECT`"), "{err}");
    }

    #[test]
    fn error_missing_from() {
        let arena = Bump::new();
        let err = parse(&arena, "SELECT *").unwrap_err();
        assert!(err.message().contains("expected keyword `FROM`"), "{err}");
    }

    #[test]
    fn error_missing_comma_or_from_between_columns() {
        let arena = Bump::new();
        let err = parse(&arena, "SELECT title genre FROM books").unwrap_err();
        assert!(err.message().contains("expected `,` or `FROM`"), "{err}");
    }

    #[test]
    fn error_missing_closing_parenthesis() {
        let arena = Bump::new();
        let err = parse(&arena, "SELECT * FROM (SELECT * FROM books").unwrap_err();
        assert!(err.message().contains("missing closing parenthesis"), "{err}");

        let err = parse(&arena, "SELECT * FROM t WHERE (a = 1 OR b = 2").unwrap_err();
        assert!(err.message().contains("missing closing parenthesis"), "{err}");
    }

    #[test]
    fn error_missing_closing_quote() {
        let arena = Bump::new();
        let err = parse(&arena, "SELECT * FROM t WHERE name = \"open").unwrap_err();
        assert!(err.message().contains("missing closing quote"), "{err}");
    }

    #[test]
    fn error_malformed_comparison() {
        let arena = Bump::new();
        let err = parse(&arena, "SELECT * FROM t WHERE year >").unwrap_err();
        assert!(err.message().contains("malformed comparison"), "{err}");

        let err = parse(&arena, "SELECT * FROM t WHERE = 5").unwrap_err();
        assert!(err.message().contains("malformed comparison"), "{err}");
    }

    #[test]
    fn error_trailing_tokens() {
        let arena = Bump::new();
        let err = parse(&arena, "SELECT * FROM books )").unwrap_err();
        assert!(err.message().contains("unexpected"), "{err}");
    }

    #[test]
    fn error_alias_without_name() {
        let arena = Bump::new();
        let err = parse(&arena, "SELECT title AS FROM books").unwrap_err();
        assert!(err.message().contains("expected an alias"), "{err}");
    }
}

/// Parses one query string to its AST root.
pub fn parse_query<'a>(input: &'a str, arena: &'a Bump) -> Result<&'a SelectStmt<'a>> {
    let mut parser = Parser::new(input, arena);
    let stmt = parser.parse_select()?;
    parser.expect_eof()?;
    Ok(stmt)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    arena: &'a Bump,
    current: Token<'a>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, arena: &'a Bump) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            arena,
            current,
        }
    }

    fn advance(&mut self) -> Token<'a> {
        std::mem::replace(&mut self.current, self.lexer.next_token())
    }

    fn error_here(&self, message: impl std::fmt::Display) -> QueryError {
        QueryError::at(message, self.lexer.line(), self.lexer.column())
    }

    /// Surfaces lexical errors (bad character, unterminated quote) before
    /// the grammar gets a chance to misreport them.
    fn check_lexical(&self) -> Result<()> {
        if let Token::Error(msg) = self.current {
            Err(self.error_here(msg))
        } else {
            Ok(())
        }
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.current, Token::Keyword(k) if k == keyword)
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        self.check_lexical()?;
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected keyword `{}`, found {}",
                format!("{keyword:?}").to_uppercase(),
                self.current.describe()
            )))
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<&'a str> {
        self.check_lexical()?;
        if let Token::Ident(name) = self.current {
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here(format!("{context}, found {}", self.current.describe())))
        }
    }

    fn expect_rparen(&mut self) -> Result<()> {
        self.check_lexical()?;
        if matches!(self.current, Token::RParen) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(format!(
                "missing closing parenthesis, found {}",
                self.current.describe()
            )))
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        self.check_lexical()?;
        if matches!(self.current, Token::Eof) {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "unexpected {} after the end of the query",
                self.current.describe()
            )))
        }
    }

    fn parse_select(&mut self) -> Result<&'a SelectStmt<'a>> {
        self.expect_keyword(Keyword::Select)?;
        let columns = self.parse_select_list()?;
        self.expect_keyword(Keyword::From)?;
        let from = self.parse_source()?;
        let join = self.parse_join_clause()?;
        let filter = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_or()?)
        } else {
            None
        };

        Ok(self.arena.alloc(SelectStmt {
            columns,
            from,
            join,
            filter,
        }))
    }

    fn parse_select_list(&mut self) -> Result<SelectList<'a>> {
        self.check_lexical()?;
        if matches!(self.current, Token::Star) {
            self.advance();
            return Ok(SelectList::Star);
        }

        let mut columns = Vec::new();
        loop {
            let name = self.expect_ident("expected a column name in the select list")?;
            let alias = if self.consume_keyword(Keyword::As) {
                Some(self.expect_ident("expected an alias after `AS`")?)
            } else {
                None
            };
            columns.push(SelectColumn { name, alias });

            self.check_lexical()?;
            match self.current {
                Token::Comma => {
                    self.advance();
                }
                Token::Keyword(Keyword::From) => break,
                _ => {
                    return Err(self.error_here(format!(
                        "expected `,` or `FROM` after a select column, found {}",
                        self.current.describe()
                    )))
                }
            }
        }
        Ok(SelectList::Columns(columns))
    }

    fn parse_source(&mut self) -> Result<Source<'a>> {
        self.check_lexical()?;
        match self.current {
            Token::Ident(name) => {
                self.advance();
                Ok(Source::Table(name))
            }
            Token::LParen => {
                self.advance();
                let stmt = self.parse_select()?;
                self.expect_rparen()?;
                Ok(Source::Subquery(stmt))
            }
            _ => Err(self.error_here(format!(
                "expected a table name or a parenthesized query, found {}",
                self.current.describe()
            ))),
        }
    }

    fn parse_join_clause(&mut self) -> Result<Option<JoinClause<'a>>> {
        let kind = if self.consume_keyword(Keyword::Natural) {
            self.expect_keyword(Keyword::Join)?;
            JoinKind::Natural
        } else if self.consume_keyword(Keyword::Cross) {
            self.expect_keyword(Keyword::Join)?;
            JoinKind::Cross
        } else if self.consume_keyword(Keyword::Join) {
            JoinKind::Cross
        } else {
            return Ok(None);
        };

        let right = self.parse_source()?;
        Ok(Some(JoinClause { kind, right }))
    }

    fn parse_or(&mut self) -> Result<&'a Expr<'a>> {
        let mut node = self.parse_and()?;
        while self.consume_keyword(Keyword::Or) {
            let rhs = self.parse_and()?;
            node = self.arena.alloc(Expr::Or(node, rhs));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<&'a Expr<'a>> {
        let mut node = self.parse_not()?;
        while self.consume_keyword(Keyword::And) {
            let rhs = self.parse_not()?;
            node = self.arena.alloc(Expr::And(node, rhs));
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> Result<&'a Expr<'a>> {
        if self.consume_keyword(Keyword::Not) {
            let inner = self.parse_not()?;
            Ok(self.arena.alloc(Expr::Not(inner)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<&'a Expr<'a>> {
        let lhs = self.parse_term()?;
        if let Some(op) = self.comparison_op() {
            let rhs = self.parse_term()?;
            Ok(self.arena.alloc(Expr::Cmp { op, lhs, rhs }))
        } else {
            Ok(lhs)
        }
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.current {
            Token::Eq => CmpOp::Eq,
            Token::NotEq => CmpOp::Ne,
            Token::Lt => CmpOp::Lt,
            Token::LtEq => CmpOp::Le,
            Token::Gt => CmpOp::Gt,
            Token::GtEq => CmpOp::Ge,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_term(&mut self) -> Result<&'a Expr<'a>> {
        self.check_lexical()?;
        match self.current {
            Token::LParen => {
                self.advance();
                let expr = self.parse_or()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Token::String(text) => {
                self.advance();
                Ok(self.arena.alloc(Expr::String(text)))
            }
            Token::Integer(text) => {
                let value: i64 = text
                    .parse()
                    .map_err(|_| self.error_here(format!("integer literal `{text}` out of range")))?;
                self.advance();
                Ok(self.arena.alloc(Expr::Integer(value)))
            }
            Token::Float(text) => {
                let value: f64 = text
                    .parse()
                    .map_err(|_| self.error_here(format!("invalid decimal literal `{text}`")))?;
                self.advance();
                Ok(self.arena.alloc(Expr::Float(value)))
            }
            Token::Ident(name) => {
                self.advance();
                Ok(self.arena.alloc(Expr::Column(name)))
            }
            _ => Err(self.error_here(format!(
                "malformed comparison: expected a value or column name, found {}",
                self.current.describe()
            ))),
        }
    }
}
