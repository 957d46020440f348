//! Abstract syntax tree produced by the SQL parser.
//!
//! Nodes are allocated in a bumpalo arena and borrow identifier and
//! literal text from the query string, so a parse allocates nothing it
//! has to free node by node. The shapes mirror the grammar: one statement
//! form (`SELECT ... FROM ... [JOIN ...] [WHERE ...]`), sources that are
//! tables or parenthesized subqueries, and a layered boolean expression
//! tree for the WHERE clause.

/// A full `SELECT` statement (top level or parenthesized source).
#[derive(Debug)]
pub struct SelectStmt<'a> {
    pub columns: SelectList<'a>,
    pub from: Source<'a>,
    pub join: Option<JoinClause<'a>>,
    pub filter: Option<&'a Expr<'a>>,
}

#[derive(Debug)]
pub enum SelectList<'a> {
    /// `SELECT *`
    Star,
    /// Explicit column list, in declaration order.
    Columns(Vec<SelectColumn<'a>>),
}

#[derive(Debug)]
pub struct SelectColumn<'a> {
    pub name: &'a str,
    /// `AS` alias, when present.
    pub alias: Option<&'a str>,
}

#[derive(Debug)]
pub enum Source<'a> {
    Table(&'a str),
    Subquery(&'a SelectStmt<'a>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    /// `CROSS JOIN`, or bare `JOIN`.
    Cross,
    /// `NATURAL JOIN`.
    Natural,
}

#[derive(Debug)]
pub struct JoinClause<'a> {
    pub kind: JoinKind,
    pub right: Source<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// WHERE-clause expression. Precedence is encoded by the parser: `OR`
/// loosest, then `AND`, then `NOT`, comparisons tightest.
#[derive(Debug)]
pub enum Expr<'a> {
    Or(&'a Expr<'a>, &'a Expr<'a>),
    And(&'a Expr<'a>, &'a Expr<'a>),
    Not(&'a Expr<'a>),
    Cmp {
        op: CmpOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
    Column(&'a str),
    Integer(i64),
    Float(f64),
    String(&'a str),
}
