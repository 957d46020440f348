//! # Query Planner - Name Resolution and Typing
//!
//! Turns the parsed AST of one query into a typed plan tree against the
//! block's table declarations. This is where the remaining compile-time
//! guarantees are enforced:
//!
//! - every `FROM`/`JOIN` source names a declared table;
//! - every column reference resolves against the row produced by the
//!   FROM clause (so `WHERE` sees source names, never `AS` aliases);
//! - join outputs have unique column names: a natural join coalesces
//!   the shared leading column, and any other collision is rejected
//!   rather than silently shadowed;
//! - each comparison gets a single evaluation domain: integers compare
//!   as `i64`, any float operand promotes both sides to `f64`, strings
//!   compare as `String`, and mixing a string with a number is an error;
//! - natural-join keys must agree in name and type on both sides, and
//!   may not be floats (no total order or hash to build the cache with).
//!
//! The plan mirrors the operator tree the code generator will emit; each
//! node carries its output shape (column names and Rust types) so the
//! generator never re-derives typing.

use quote::ToTokens;
use syn::{Attribute, Ident, Type};

use crate::ast::{self, SelectList, SelectStmt, Source};
use crate::error::{QueryError, Result};
use crate::input::{sql_name, TableDecl};

/// Value categories a column (or literal) can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Float,
    Text,
}

impl ScalarKind {
    pub fn from_type(ty: &Type) -> Option<ScalarKind> {
        let Type::Path(path) = ty else { return None };
        if path.qself.is_some() {
            return None;
        }
        let seg = path.path.segments.last()?;
        if !seg.arguments.is_empty() {
            return None;
        }
        match seg.ident.to_string().as_str() {
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" => Some(Self::Int),
            "f32" | "f64" => Some(Self::Float),
            "String" => Some(Self::Text),
            _ => None,
        }
    }
}

/// A declared table after validation.
#[derive(Debug)]
pub struct TableDef {
    pub ident: Ident,
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub columns: Vec<ColumnDef>,
    /// Positions of the index columns, in index declaration order.
    pub index: Vec<usize>,
}

#[derive(Debug)]
pub struct ColumnDef {
    pub ident: Ident,
    pub name: String,
    pub ty: Type,
    pub kind: ScalarKind,
}

/// Validates the table declarations of one block.
pub fn build_tables(decls: Vec<TableDecl>) -> syn::Result<Vec<TableDef>> {
    let mut tables: Vec<TableDef> = Vec::with_capacity(decls.len());

    for decl in decls {
        let name = sql_name(&decl.name);
        if tables.iter().any(|t| t.name == name) {
            return Err(syn::Error::new(
                decl.name.span(),
                format!("table `{name}` is declared twice"),
            ));
        }

        let mut columns: Vec<ColumnDef> = Vec::with_capacity(decl.columns.len());
        for column in decl.columns {
            let col_name = sql_name(&column.name);
            if columns.iter().any(|c| c.name == col_name) {
                return Err(syn::Error::new(
                    column.name.span(),
                    format!("column `{col_name}` is declared twice in table `{name}`"),
                ));
            }
            let kind = ScalarKind::from_type(&column.ty).ok_or_else(|| {
                syn::Error::new_spanned(
                    &column.ty,
                    format!(
                        "unsupported column type `{}`; supported types are \
                         i8-i64, u8-u64, f32, f64, and String",
                        column.ty.to_token_stream()
                    ),
                )
            })?;
            columns.push(ColumnDef {
                ident: column.name,
                name: col_name,
                ty: column.ty,
                kind,
            });
        }

        let mut index = Vec::with_capacity(decl.index.len());
        for key in &decl.index {
            let key_name = sql_name(key);
            let position = columns.iter().position(|c| c.name == key_name).ok_or_else(|| {
                syn::Error::new(
                    key.span(),
                    format!("index column `{key_name}` is not a column of table `{name}`"),
                )
            })?;
            if index.contains(&position) {
                return Err(syn::Error::new(
                    key.span(),
                    format!("index column `{key_name}` is listed twice"),
                ));
            }
            index.push(position);
        }

        tables.push(TableDef {
            ident: decl.name,
            name,
            attrs: decl.attrs,
            columns,
            index,
        });
    }

    Ok(tables)
}

/// One column of a plan node's output row.
#[derive(Clone, Debug)]
pub struct ColInfo {
    pub name: String,
    pub ty: Type,
    pub kind: ScalarKind,
}

/// A typed plan node annotated with its output shape.
#[derive(Debug)]
pub struct Plan {
    pub node: Node,
    pub shape: Vec<ColInfo>,
}

#[derive(Debug)]
pub enum Node {
    Relation {
        table: usize,
    },
    Selection {
        input: Box<Plan>,
        predicate: Pred,
    },
    /// By-name column subset; the shape keeps the source names.
    Projection {
        input: Box<Plan>,
        fields: Vec<usize>,
    },
    /// Positional renaming of its projection input; the shape carries the
    /// `AS` aliases.
    Rename {
        input: Box<Plan>,
    },
    Cross {
        left: Box<Plan>,
        right: Box<Plan>,
    },
    Natural {
        left: Box<Plan>,
        right: Box<Plan>,
    },
}

/// Evaluation domain of one comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    Int,
    Float,
    Text,
    Bool,
}

impl Domain {
    fn describe(self) -> &'static str {
        match self {
            Domain::Int => "an integer",
            Domain::Float => "a float",
            Domain::Text => "a string",
            Domain::Bool => "a boolean",
        }
    }
}

#[derive(Debug)]
pub enum Pred {
    And(Box<Pred>, Box<Pred>),
    Or(Box<Pred>, Box<Pred>),
    Not(Box<Pred>),
    Cmp {
        op: ast::CmpOp,
        domain: Domain,
        lhs: Operand,
        rhs: Operand,
    },
}

#[derive(Debug)]
pub enum Operand {
    /// Index into the input shape.
    Column(usize),
    Int(i64),
    Float(f64),
    Str(String),
    /// Parenthesized boolean expression used as a comparison operand.
    Nested(Box<Pred>),
}

/// Plans one parsed query against the declared tables.
pub fn plan_query(stmt: &SelectStmt<'_>, tables: &[TableDef]) -> Result<Plan> {
    plan_select(stmt, tables)
}

fn plan_select(stmt: &SelectStmt<'_>, tables: &[TableDef]) -> Result<Plan> {
    let mut plan = plan_from(stmt, tables)?;

    if let Some(filter) = stmt.filter {
        let predicate = plan_predicate(filter, &plan.shape)?;
        let shape = plan.shape.clone();
        plan = Plan {
            node: Node::Selection {
                input: Box::new(plan),
                predicate,
            },
            shape,
        };
    }

    match &stmt.columns {
        SelectList::Star => Ok(plan),
        SelectList::Columns(cols) => plan_projection(plan, cols),
    }
}

fn plan_from(stmt: &SelectStmt<'_>, tables: &[TableDef]) -> Result<Plan> {
    let left = plan_source(&stmt.from, tables)?;
    let Some(join) = &stmt.join else {
        return Ok(left);
    };
    let right = plan_source(&join.right, tables)?;

    match join.kind {
        ast::JoinKind::Natural => {
            let (lh, rh) = (&left.shape[0], &right.shape[0]);
            if lh.name != rh.name {
                return Err(QueryError::new(format!(
                    "natural join requires both sides to share their leading column; \
                     the left side starts with `{}`, the right side with `{}`",
                    lh.name, rh.name
                )));
            }
            if type_text(&lh.ty) != type_text(&rh.ty) {
                return Err(QueryError::new(format!(
                    "natural join key `{}` has type `{}` on the left but `{}` on the right",
                    lh.name,
                    type_text(&lh.ty),
                    type_text(&rh.ty)
                )));
            }
            if lh.kind == ScalarKind::Float {
                return Err(QueryError::new(format!(
                    "natural join key `{}` cannot be a floating-point column",
                    lh.name
                )));
            }

            let shape = merge_shapes(&left.shape, &right.shape[1..])?;
            Ok(Plan {
                node: Node::Natural {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                shape,
            })
        }
        ast::JoinKind::Cross => {
            let shape = merge_shapes(&left.shape, &right.shape)?;
            Ok(Plan {
                node: Node::Cross {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                shape,
            })
        }
    }
}

fn merge_shapes(left: &[ColInfo], right: &[ColInfo]) -> Result<Vec<ColInfo>> {
    for col in right {
        if left.iter().any(|l| l.name == col.name) {
            return Err(QueryError::new(format!(
                "column `{}` appears on both sides of the join; \
                 project or rename one side in a subquery first",
                col.name
            )));
        }
    }
    Ok(left.iter().chain(right).cloned().collect())
}

fn plan_source(source: &Source<'_>, tables: &[TableDef]) -> Result<Plan> {
    match source {
        Source::Table(name) => {
            let table = tables.iter().position(|t| t.name == *name).ok_or_else(|| {
                QueryError::new(format!(
                    "unknown table `{name}` in FROM; declared tables: {}",
                    name_list(tables.iter().map(|t| t.name.as_str()))
                ))
            })?;
            let shape = tables[table]
                .columns
                .iter()
                .map(|c| ColInfo {
                    name: c.name.clone(),
                    ty: c.ty.clone(),
                    kind: c.kind,
                })
                .collect();
            Ok(Plan {
                node: Node::Relation { table },
                shape,
            })
        }
        Source::Subquery(stmt) => plan_select(stmt, tables),
    }
}

fn plan_projection(input: Plan, cols: &[ast::SelectColumn<'_>]) -> Result<Plan> {
    let mut fields = Vec::with_capacity(cols.len());
    for col in cols {
        let index = resolve_column(col.name, &input.shape)?;
        if fields.contains(&index) {
            return Err(QueryError::new(format!(
                "column `{}` is selected twice; select it once and alias the copy",
                col.name
            )));
        }
        fields.push(index);
    }

    let mut output_names: Vec<&str> = Vec::with_capacity(cols.len());
    for col in cols {
        let name = col.alias.unwrap_or(col.name);
        if output_names.contains(&name) {
            return Err(QueryError::new(format!(
                "duplicate output column `{name}`; rename one occurrence with AS"
            )));
        }
        output_names.push(name);
    }

    let projected: Vec<ColInfo> = fields
        .iter()
        .map(|&index| input.shape[index].clone())
        .collect();
    let renamed = cols.iter().any(|c| c.alias.is_some());

    let plan = Plan {
        shape: projected.clone(),
        node: Node::Projection {
            input: Box::new(input),
            fields,
        },
    };

    if !renamed {
        return Ok(plan);
    }

    let shape = projected
        .into_iter()
        .zip(&output_names)
        .map(|(col, name)| ColInfo {
            name: (*name).to_string(),
            ..col
        })
        .collect();
    Ok(Plan {
        node: Node::Rename {
            input: Box::new(plan),
        },
        shape,
    })
}

fn resolve_column(name: &str, shape: &[ColInfo]) -> Result<usize> {
    shape.iter().position(|c| c.name == name).ok_or_else(|| {
        QueryError::new(format!(
            "unknown column `{name}`; the row in scope has columns {}",
            name_list(shape.iter().map(|c| c.name.as_str()))
        ))
    })
}

fn plan_predicate(expr: &ast::Expr<'_>, shape: &[ColInfo]) -> Result<Pred> {
    match expr {
        ast::Expr::Or(lhs, rhs) => Ok(Pred::Or(
            Box::new(plan_predicate(lhs, shape)?),
            Box::new(plan_predicate(rhs, shape)?),
        )),
        ast::Expr::And(lhs, rhs) => Ok(Pred::And(
            Box::new(plan_predicate(lhs, shape)?),
            Box::new(plan_predicate(rhs, shape)?),
        )),
        ast::Expr::Not(inner) => Ok(Pred::Not(Box::new(plan_predicate(inner, shape)?))),
        ast::Expr::Cmp { op, lhs, rhs } => plan_comparison(*op, lhs, rhs, shape),
        ast::Expr::Column(name) => {
            // Resolve first so an unknown name gets the better message.
            resolve_column(name, shape)?;
            Err(QueryError::new(format!(
                "column `{name}` is not a predicate by itself; compare it against something"
            )))
        }
        ast::Expr::Integer(_) | ast::Expr::Float(_) | ast::Expr::String(_) => {
            Err(QueryError::new(
                "a bare literal is not a predicate; expected a comparison",
            ))
        }
    }
}

fn plan_comparison(
    op: ast::CmpOp,
    lhs: &ast::Expr<'_>,
    rhs: &ast::Expr<'_>,
    shape: &[ColInfo],
) -> Result<Pred> {
    let (lhs, lhs_domain, lhs_desc) = plan_operand(lhs, shape)?;
    let (rhs, rhs_domain, rhs_desc) = plan_operand(rhs, shape)?;

    let domain = match (lhs_domain, rhs_domain) {
        (Domain::Int, Domain::Int) => Domain::Int,
        (Domain::Int | Domain::Float, Domain::Int | Domain::Float) => Domain::Float,
        (Domain::Text, Domain::Text) => Domain::Text,
        (Domain::Bool, Domain::Bool) => Domain::Bool,
        _ => {
            return Err(QueryError::new(format!(
                "type mismatch in comparison: {lhs_desc} is {} but {rhs_desc} is {}",
                lhs_domain.describe(),
                rhs_domain.describe()
            )))
        }
    };

    Ok(Pred::Cmp {
        op,
        domain,
        lhs,
        rhs,
    })
}

fn plan_operand(expr: &ast::Expr<'_>, shape: &[ColInfo]) -> Result<(Operand, Domain, String)> {
    match expr {
        ast::Expr::Column(name) => {
            let index = resolve_column(name, shape)?;
            let domain = match shape[index].kind {
                ScalarKind::Int => Domain::Int,
                ScalarKind::Float => Domain::Float,
                ScalarKind::Text => Domain::Text,
            };
            Ok((Operand::Column(index), domain, format!("column `{name}`")))
        }
        ast::Expr::Integer(value) => Ok((
            Operand::Int(*value),
            Domain::Int,
            format!("literal `{value}`"),
        )),
        ast::Expr::Float(value) => Ok((
            Operand::Float(*value),
            Domain::Float,
            format!("literal `{value}`"),
        )),
        ast::Expr::String(text) => Ok((
            Operand::Str((*text).to_string()),
            Domain::Text,
            format!("string literal `\"{text}\"`"),
        )),
        nested @ (ast::Expr::Or(..) | ast::Expr::And(..) | ast::Expr::Not(_) | ast::Expr::Cmp { .. }) => {
            let pred = plan_predicate(nested, shape)?;
            Ok((
                Operand::Nested(Box::new(pred)),
                Domain::Bool,
                "a boolean expression".to_string(),
            ))
        }
    }
}

fn type_text(ty: &Type) -> String {
    ty.to_token_stream().to_string()
}

fn name_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let list: Vec<String> = names.map(|n| format!("`{n}`")).collect();
    list.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ColumnDecl, TableDecl};
    use bumpalo::Bump;
    use proc_macro2::Span;
    use syn::parse_quote;

    fn ident(name: &str) -> Ident {
        Ident::new(name, Span::call_site())
    }

    fn column(name: &str, ty: Type) -> ColumnDecl {
        ColumnDecl {
            name: ident(name),
            ty,
        }
    }

    fn library() -> Vec<TableDef> {
        build_tables(vec![
            TableDecl {
                attrs: vec![],
                name: ident("books"),
                columns: vec![
                    column("title", parse_quote!(String)),
                    column("genre", parse_quote!(String)),
                    column("year", parse_quote!(u32)),
                ],
                index: vec![ident("title")],
            },
            TableDecl {
                attrs: vec![],
                name: ident("authored"),
                columns: vec![
                    column("title", parse_quote!(String)),
                    column("name", parse_quote!(String)),
                ],
                index: vec![],
            },
        ])
        .unwrap()
    }

    fn plan(sql: &str, tables: &[TableDef]) -> Result<Plan> {
        let arena = Bump::new();
        let stmt = crate::parser::parse_query(arena.alloc_str(sql), &arena)?;
        plan_query(stmt, tables)
    }

    #[test]
    fn star_query_keeps_table_shape() {
        let tables = library();
        let plan = plan("SELECT * FROM books", &tables).unwrap();
        assert!(matches!(plan.node, Node::Relation { table: 0 }));
        assert_eq!(plan.shape.len(), 3);
        assert_eq!(plan.shape[0].name, "title");
    }

    #[test]
    fn projection_narrows_and_orders_columns() {
        let tables = library();
        let plan = plan("SELECT year, title FROM books", &tables).unwrap();
        assert_eq!(plan.shape[0].name, "year");
        assert_eq!(plan.shape[1].name, "title");
        let Node::Projection { fields, .. } = &plan.node else {
            panic!("expected projection at the root");
        };
        assert_eq!(fields, &[2, 0]);
    }

    #[test]
    fn aliases_wrap_projection_in_rename() {
        let tables = library();
        let plan = plan("SELECT genre AS kind FROM books", &tables).unwrap();
        assert_eq!(plan.shape[0].name, "kind");
        let Node::Rename { input } = &plan.node else {
            panic!("expected rename at the root");
        };
        assert_eq!(input.shape[0].name, "genre");
        assert!(matches!(input.node, Node::Projection { .. }));
    }

    #[test]
    fn natural_join_coalesces_the_shared_head() {
        let tables = library();
        let plan = plan("SELECT * FROM books NATURAL JOIN authored", &tables).unwrap();
        let names: Vec<&str> = plan.shape.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["title", "genre", "year", "name"]);
        assert!(matches!(plan.node, Node::Natural { .. }));
    }

    #[test]
    fn where_resolves_against_the_joined_row() {
        let tables = library();
        let plan = plan(
            "SELECT name FROM books NATURAL JOIN authored WHERE year > 1960",
            &tables,
        )
        .unwrap();
        let Node::Projection { input, .. } = &plan.node else {
            panic!("expected projection at the root");
        };
        assert!(matches!(input.node, Node::Selection { .. }));
    }

    #[test]
    fn comparison_domains_unify() {
        let tables = build_tables(vec![TableDecl {
            attrs: vec![],
            name: ident("t"),
            columns: vec![
                column("a", parse_quote!(u32)),
                column("b", parse_quote!(f64)),
            ],
            index: vec![],
        }])
        .unwrap();

        let plan = plan("SELECT * FROM t WHERE a < 5 AND b > 1 AND a < b", &tables).unwrap();
        let Node::Selection { predicate, .. } = &plan.node else {
            panic!("expected selection");
        };
        let Pred::And(lhs, rhs) = predicate else {
            panic!("expected AND");
        };
        let Pred::And(first, second) = &**lhs else {
            panic!("expected nested AND");
        };
        assert!(matches!(**first, Pred::Cmp { domain: Domain::Int, .. }));
        assert!(matches!(**second, Pred::Cmp { domain: Domain::Float, .. }));
        assert!(matches!(**rhs, Pred::Cmp { domain: Domain::Float, .. }));
    }

    #[test]
    fn error_unknown_table() {
        let tables = library();
        let err = plan("SELECT * FROM missing", &tables).unwrap_err();
        assert!(err.message().contains("unknown table `missing`"), "{err}");
        assert!(err.message().contains("`books`"), "{err}");
    }

    #[test]
    fn error_unknown_column() {
        let tables = library();
        let err = plan("SELECT pages FROM books", &tables).unwrap_err();
        assert!(err.message().contains("unknown column `pages`"), "{err}");

        let err = plan("SELECT title FROM books WHERE pages > 100", &tables).unwrap_err();
        assert!(err.message().contains("unknown column `pages`"), "{err}");
    }

    #[test]
    fn error_where_cannot_see_aliases() {
        let tables = library();
        let err = plan(
            "SELECT genre AS kind FROM books WHERE kind = 'sci'",
            &tables,
        )
        .unwrap_err();
        assert!(err.message().contains("unknown column `kind`"), "{err}");
    }

    #[test]
    fn error_string_compared_to_number() {
        let tables = library();
        let err = plan("SELECT * FROM books WHERE year = '1967'", &tables).unwrap_err();
        assert!(err.message().contains("type mismatch"), "{err}");
        assert!(err.message().contains("column `year`"), "{err}");
    }

    #[test]
    fn error_natural_join_without_shared_head() {
        let tables = build_tables(vec![
            TableDecl {
                attrs: vec![],
                name: ident("a"),
                columns: vec![column("x", parse_quote!(i64))],
                index: vec![],
            },
            TableDecl {
                attrs: vec![],
                name: ident("b"),
                columns: vec![column("y", parse_quote!(i64))],
                index: vec![],
            },
        ])
        .unwrap();
        let err = plan("SELECT * FROM a NATURAL JOIN b", &tables).unwrap_err();
        assert!(err.message().contains("leading column"), "{err}");
    }

    #[test]
    fn error_natural_join_float_key() {
        let tables = build_tables(vec![
            TableDecl {
                attrs: vec![],
                name: ident("a"),
                columns: vec![column("k", parse_quote!(f64)), column("x", parse_quote!(i64))],
                index: vec![],
            },
            TableDecl {
                attrs: vec![],
                name: ident("b"),
                columns: vec![column("k", parse_quote!(f64)), column("y", parse_quote!(i64))],
                index: vec![],
            },
        ])
        .unwrap();
        let err = plan("SELECT * FROM a NATURAL JOIN b", &tables).unwrap_err();
        assert!(err.message().contains("floating-point"), "{err}");
    }

    #[test]
    fn error_cross_join_with_colliding_columns() {
        let tables = library();
        let err = plan("SELECT * FROM books CROSS JOIN authored", &tables).unwrap_err();
        assert!(err.message().contains("both sides of the join"), "{err}");
    }

    #[test]
    fn error_bare_column_as_predicate() {
        let tables = library();
        let err = plan("SELECT * FROM books WHERE genre", &tables).unwrap_err();
        assert!(err.message().contains("not a predicate"), "{err}");
    }

    #[test]
    fn error_duplicate_output_column() {
        let tables = library();
        let err = plan("SELECT title, genre AS title FROM books", &tables).unwrap_err();
        assert!(err.message().contains("duplicate output column"), "{err}");
    }

    #[test]
    fn error_unsupported_column_type() {
        let err = build_tables(vec![TableDecl {
            attrs: vec![],
            name: ident("t"),
            columns: vec![column("v", parse_quote!(Vec<u8>))],
            index: vec![],
        }])
        .unwrap_err();
        assert!(err.to_string().contains("unsupported column type"), "{err}");
    }

    #[test]
    fn error_index_on_missing_column() {
        let err = build_tables(vec![TableDecl {
            attrs: vec![],
            name: ident("t"),
            columns: vec![column("a", parse_quote!(i64))],
            index: vec![ident("b")],
        }])
        .unwrap_err();
        assert!(err.to_string().contains("not a column"), "{err}");
    }

    #[test]
    fn subquery_rename_feeds_cross_join() {
        let tables = library();
        let plan = plan(
            "SELECT title, author FROM books CROSS JOIN \
             (SELECT title AS t2, name AS author FROM authored) \
             WHERE title = t2",
            &tables,
        )
        .unwrap();
        let names: Vec<&str> = plan.shape.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["title", "author"]);
    }
}
