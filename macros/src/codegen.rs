//! # Code Generation
//!
//! Emits the module a `database!` block expands to:
//!
//! - per table: the row struct, a `Table` alias, and impls of `Record`
//!   (index comparison), `FromRecord`/`IntoRecord` (delimited text), plus
//!   a columnar `from_columns` constructor;
//! - per distinct join pair: the merged row struct with its `Merge` impl,
//!   and `JoinKey` impls for natural-join operands;
//! - per query: output row structs and a constructor function assembling
//!   the operator pipeline out of `quern::ra` values, with predicates
//!   built from `quern::expr` nodes.
//!
//! Everything refers to the runtime crate through absolute `::quern`
//! paths so the expansion works regardless of what the caller imports.

use std::collections::{HashMap, HashSet};

use bumpalo::Bump;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, ToTokens};
use syn::Ident;

use crate::ast::CmpOp;
use crate::input::{sql_name, DatabaseInput, QueryDecl};
use crate::parser::parse_query;
use crate::planner::{
    self, ColInfo, Domain, Node, Operand, Plan, Pred, ScalarKind, TableDef,
};

pub fn expand(input: DatabaseInput) -> syn::Result<TokenStream> {
    let DatabaseInput {
        attrs,
        vis,
        ident,
        tables,
        queries,
    } = input;

    let tables = planner::build_tables(tables)?;
    check_query_names(&queries, &tables)?;

    let mut generator = Generator::new(&tables);
    let table_items: Vec<TokenStream> = tables.iter().map(|t| generator.table_items(t)).collect();

    let mut query_items = Vec::new();
    for query in &queries {
        query_items.push(generator.query_items(query)?);
    }

    let shared_items = generator.shared_items;
    Ok(quote! {
        #(#attrs)*
        #vis mod #ident {
            #(#table_items)*
            #(#shared_items)*
            #(#query_items)*
        }
    })
}

fn check_query_names(queries: &[QueryDecl], tables: &[TableDef]) -> syn::Result<()> {
    let mut seen = HashSet::new();
    for query in queries {
        let name = sql_name(&query.name);
        if !seen.insert(name.clone()) {
            return Err(syn::Error::new(
                query.name.span(),
                format!("query `{name}` is declared twice"),
            ));
        }
        if tables.iter().any(|t| t.name == name) {
            return Err(syn::Error::new(
                query.name.span(),
                format!("query `{name}` collides with the table of the same name"),
            ));
        }
    }
    Ok(())
}

/// Where a projection or rename node should put its output struct.
enum StructHint {
    /// Use this exact ident (the root of a query).
    Named(Ident),
    /// Use this ident and keep the struct out of the docs (the
    /// source-named intermediate under a rename).
    Hidden(Ident),
    /// Mint a fresh `{Query}Sub{N}Row` ident on demand.
    Sub,
}

impl StructHint {
    fn resolve(self, ctx: &mut QueryCtx) -> (Ident, bool) {
        match self {
            StructHint::Named(ident) => (ident, false),
            StructHint::Hidden(ident) => (ident, true),
            StructHint::Sub => (ctx.fresh_sub(), false),
        }
    }
}

struct Generator<'a> {
    tables: &'a [TableDef],
    /// Merged row structs and join-key impls, shared between queries.
    shared_items: Vec<TokenStream>,
    merges: HashMap<(String, String), Ident>,
    join_keys: HashSet<String>,
}

struct QueryCtx {
    base: String,
    subqueries: usize,
    items: Vec<TokenStream>,
}

impl QueryCtx {
    fn fresh_sub(&mut self) -> Ident {
        self.subqueries += 1;
        format_ident!("{}Sub{}Row", self.base.as_str(), self.subqueries)
    }
}

impl<'a> Generator<'a> {
    fn new(tables: &'a [TableDef]) -> Self {
        Self {
            tables,
            shared_items: Vec::new(),
            merges: HashMap::new(),
            join_keys: HashSet::new(),
        }
    }

    // ---- tables ---------------------------------------------------------

    fn table_items(&mut self, table: &TableDef) -> TokenStream {
        let row_ident = row_ident(&table.ident);
        let alias_ident = pascal_ident(&table.ident);
        let attrs = &table.attrs;
        let table_name = &table.name;

        let field_idents: Vec<Ident> = table.columns.iter().map(|c| c.ident.clone()).collect();
        let field_types: Vec<&syn::Type> = table.columns.iter().map(|c| &c.ty).collect();
        let column_names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();

        let cmp_body = if table.index.is_empty() {
            quote!(::core::cmp::Ordering::Equal)
        } else {
            let mut chain = TokenStream::new();
            for (position, &col) in table.index.iter().enumerate() {
                let field = &field_idents[col];
                let step = match table.columns[col].kind {
                    ScalarKind::Float => quote! {
                        self.#field
                            .partial_cmp(&other.#field)
                            .unwrap_or(::core::cmp::Ordering::Equal)
                    },
                    _ => quote!(self.#field.cmp(&other.#field)),
                };
                if position == 0 {
                    chain = step;
                } else {
                    chain = quote!(#chain.then_with(|| #step));
                }
            }
            chain
        };

        let field_count = table.columns.len();
        let write_fields = write_record_body(&field_idents);

        let alias_doc = format!("Container of `{table_name}` rows.");
        let row_doc = format!("One row of the `{table_name}` table.");

        quote! {
            #(#attrs)*
            #[doc = #row_doc]
            #[derive(Clone, Debug, PartialEq)]
            pub struct #row_ident {
                #(pub #field_idents: #field_types,)*
            }

            #[doc = #alias_doc]
            pub type #alias_ident = ::quern::Table<#row_ident>;

            impl ::quern::Record for #row_ident {
                const TABLE: &'static str = #table_name;
                const COLUMNS: &'static [&'static str] = &[#(#column_names),*];

                fn cmp_index(&self, other: &Self) -> ::core::cmp::Ordering {
                    #cmp_body
                }
            }

            impl #row_ident {
                /// Builds rows from per-column vectors, stopping at the
                /// shortest column.
                pub fn from_columns(
                    #(#field_idents: ::std::vec::Vec<#field_types>,)*
                ) -> ::std::vec::Vec<Self> {
                    #(let mut #field_idents = #field_idents.into_iter();)*
                    let mut rows = ::std::vec::Vec::new();
                    while let (#(::core::option::Option::Some(#field_idents),)*) =
                        (#(#field_idents.next(),)*)
                    {
                        rows.push(Self { #(#field_idents),* });
                    }
                    rows
                }
            }

            impl ::quern::load::FromRecord for #row_ident {
                fn from_record(record: &str, delimiter: char) -> ::quern::load::Result<Self> {
                    let mut fields = record.splitn(#field_count, delimiter);
                    Ok(Self {
                        #(#field_idents: ::quern::load::field(fields.next(), #column_names)?,)*
                    })
                }
            }

            impl ::quern::load::IntoRecord for #row_ident {
                fn write_record(&self, out: &mut ::std::string::String, delimiter: char) {
                    #write_fields
                }
            }
        }
    }

    // ---- queries --------------------------------------------------------

    fn query_items(&mut self, query: &QueryDecl) -> syn::Result<TokenStream> {
        let arena = Bump::new();
        let sql = arena.alloc_str(&query.sql.value());
        let spanned = |err: crate::error::QueryError| syn::Error::new(query.sql.span(), err.message());

        let stmt = parse_query(sql, &arena).map_err(spanned)?;
        let plan = planner::plan_query(stmt, self.tables).map_err(spanned)?;

        let base = pascal(&sql_name(&query.name));
        let base_row = format_ident!("{}Row", base.as_str());
        let mut ctx = QueryCtx {
            base,
            subqueries: 0,
            items: Vec::new(),
        };

        let (root, out_ident) =
            self.gen_node(&plan, StructHint::Named(base_row.clone()), &mut ctx);

        let mut used = Vec::new();
        collect_tables(&plan, &mut used);
        let param_idents: Vec<&Ident> = used.iter().map(|&i| &self.tables[i].ident).collect();
        let param_types: Vec<Ident> = used
            .iter()
            .map(|&i| pascal_ident(&self.tables[i].ident))
            .collect();

        let attrs = &query.attrs;
        let fn_ident = &query.name;
        let alias = if out_ident != base_row {
            let doc = format!("Row type produced by [`{fn_ident}`].");
            quote! {
                #[doc = #doc]
                pub type #base_row = #out_ident;
            }
        } else {
            TokenStream::new()
        };

        let items = &ctx.items;
        Ok(quote! {
            #(#items)*
            #alias

            #(#attrs)*
            pub fn #fn_ident<'a>(
                #(#param_idents: &'a #param_types,)*
            ) -> ::quern::Query<impl ::quern::Operator<Row = #out_ident> + 'a> {
                ::quern::Query::new(#root)
            }
        })
    }

    /// Emits the operator expression for one plan node and reports the row
    /// struct it produces.
    fn gen_node(
        &mut self,
        plan: &Plan,
        hint: StructHint,
        ctx: &mut QueryCtx,
    ) -> (TokenStream, Ident) {
        match &plan.node {
            Node::Relation { table } => {
                let table = &self.tables[*table];
                let param = &table.ident;
                (
                    quote!(::quern::ra::Relation::new(#param)),
                    row_ident(&table.ident),
                )
            }
            Node::Selection { input, predicate } => {
                let (input_tokens, input_ident) = self.gen_node(input, hint, ctx);
                let pred = gen_pred(predicate, &input_ident, &input.shape);
                (
                    quote!(::quern::ra::Selection::new(#input_tokens, #pred)),
                    input_ident,
                )
            }
            Node::Projection { input, fields } => {
                let (out_ident, hidden) = hint.resolve(ctx);
                let (input_tokens, input_ident) = self.gen_node(input, StructHint::Sub, ctx);

                let out_fields: Vec<Ident> =
                    plan.shape.iter().map(|c| make_ident(&c.name)).collect();
                let src_fields: Vec<Ident> = fields
                    .iter()
                    .map(|&i| make_ident(&input.shape[i].name))
                    .collect();

                ctx.items.push(row_struct(&out_ident, &plan.shape, hidden));
                if !hidden {
                    ctx.items.push(into_record_impl(&out_ident, &plan.shape));
                }
                (
                    quote! {
                        ::quern::ra::Projection::new(#input_tokens, |row: #input_ident| #out_ident {
                            #(#out_fields: row.#src_fields,)*
                        })
                    },
                    out_ident,
                )
            }
            Node::Rename { input } => {
                let (out_ident, hidden) = hint.resolve(ctx);
                let cols_ident = format_ident!("{}Cols", strip_row(&out_ident));
                let (input_tokens, input_ident) =
                    self.gen_node(input, StructHint::Hidden(cols_ident), ctx);

                let out_fields: Vec<Ident> =
                    plan.shape.iter().map(|c| make_ident(&c.name)).collect();
                let src_fields: Vec<Ident> =
                    input.shape.iter().map(|c| make_ident(&c.name)).collect();

                ctx.items.push(row_struct(&out_ident, &plan.shape, hidden));
                if !hidden {
                    ctx.items.push(into_record_impl(&out_ident, &plan.shape));
                }
                (
                    quote! {
                        ::quern::ra::Rename::new(#input_tokens, |row: #input_ident| #out_ident {
                            #(#out_fields: row.#src_fields,)*
                        })
                    },
                    out_ident,
                )
            }
            Node::Cross { left, right } => {
                let (left_tokens, left_ident) = self.gen_node(left, StructHint::Sub, ctx);
                let (right_tokens, right_ident) = self.gen_node(right, StructHint::Sub, ctx);
                let merged = self.merged_struct(
                    &left_ident,
                    &right_ident,
                    &left.shape,
                    &right.shape,
                    &plan.shape,
                    false,
                );
                (
                    quote!(::quern::ra::Cross::new(#left_tokens, #right_tokens)),
                    merged,
                )
            }
            Node::Natural { left, right } => {
                let (left_tokens, left_ident) = self.gen_node(left, StructHint::Sub, ctx);
                let (right_tokens, right_ident) = self.gen_node(right, StructHint::Sub, ctx);
                self.join_key_impl(&left_ident, &left.shape);
                self.join_key_impl(&right_ident, &right.shape);
                let merged = self.merged_struct(
                    &left_ident,
                    &right_ident,
                    &left.shape,
                    &right.shape,
                    &plan.shape,
                    true,
                );
                (
                    quote!(::quern::ra::Natural::new(#left_tokens, #right_tokens)),
                    merged,
                )
            }
        }
    }

    /// Merged row struct plus `Merge` impl for one ordered join pair,
    /// shared by every query of the block joining the same pair.
    fn merged_struct(
        &mut self,
        left: &Ident,
        right: &Ident,
        left_shape: &[ColInfo],
        right_shape: &[ColInfo],
        merged_shape: &[ColInfo],
        coalesce_head: bool,
    ) -> Ident {
        let key = (left.to_string(), right.to_string());
        if let Some(existing) = self.merges.get(&key) {
            return existing.clone();
        }

        let merged = format_ident!("{}{}Row", strip_row(left), strip_row(right));
        self.shared_items.push(row_struct(&merged, merged_shape, true));
        self.shared_items.push(into_record_impl(&merged, merged_shape));

        let left_assigns: Vec<TokenStream> = left_shape
            .iter()
            .map(|col| merge_assign(col, quote!(self)))
            .collect();
        let skip = usize::from(coalesce_head);
        let right_assigns: Vec<TokenStream> = right_shape[skip..]
            .iter()
            .map(|col| merge_assign(col, quote!(other)))
            .collect();

        self.shared_items.push(quote! {
            impl ::quern::Merge<#right> for #left {
                type Output = #merged;

                fn merge(&self, other: &#right) -> #merged {
                    #merged {
                        #(#left_assigns,)*
                        #(#right_assigns,)*
                    }
                }
            }
        });

        self.merges.insert(key, merged.clone());
        merged
    }

    fn join_key_impl(&mut self, row: &Ident, shape: &[ColInfo]) {
        if !self.join_keys.insert(row.to_string()) {
            return;
        }
        let head = &shape[0];
        let field = make_ident(&head.name);
        let key_ty = &head.ty;
        self.shared_items.push(quote! {
            impl ::quern::JoinKey for #row {
                type Key = #key_ty;

                fn key(&self) -> &#key_ty {
                    &self.#field
                }
            }
        });
    }
}

// ---- shared helpers -----------------------------------------------------

fn row_struct(ident: &Ident, shape: &[ColInfo], hidden: bool) -> TokenStream {
    let fields: Vec<Ident> = shape.iter().map(|c| make_ident(&c.name)).collect();
    let types: Vec<&syn::Type> = shape.iter().map(|c| &c.ty).collect();
    let doc = if hidden {
        quote!(#[doc(hidden)])
    } else {
        TokenStream::new()
    };
    quote! {
        #doc
        #[derive(Clone, Debug, PartialEq)]
        pub struct #ident {
            #(pub #fields: #types,)*
        }
    }
}

fn into_record_impl(ident: &Ident, shape: &[ColInfo]) -> TokenStream {
    let idents: Vec<Ident> = shape.iter().map(|c| make_ident(&c.name)).collect();
    let body = write_record_body(&idents);
    quote! {
        impl ::quern::load::IntoRecord for #ident {
            fn write_record(&self, out: &mut ::std::string::String, delimiter: char) {
                #body
            }
        }
    }
}

fn write_record_body(idents: &[Ident]) -> TokenStream {
    let mut body = TokenStream::new();
    for (position, field) in idents.iter().enumerate() {
        body.extend(quote!(::quern::load::put(out, &self.#field);));
        if position + 1 < idents.len() {
            body.extend(quote!(out.push(delimiter);));
        }
    }
    body
}

fn merge_assign(col: &ColInfo, source: TokenStream) -> TokenStream {
    let field = make_ident(&col.name);
    match col.kind {
        ScalarKind::Text => quote!(#field: #source.#field.clone()),
        _ => quote!(#field: #source.#field),
    }
}

fn gen_pred(pred: &Pred, row: &Ident, shape: &[ColInfo]) -> TokenStream {
    match pred {
        Pred::And(lhs, rhs) => {
            let lhs = gen_pred(lhs, row, shape);
            let rhs = gen_pred(rhs, row, shape);
            quote!(::quern::expr::and(#lhs, #rhs))
        }
        Pred::Or(lhs, rhs) => {
            let lhs = gen_pred(lhs, row, shape);
            let rhs = gen_pred(rhs, row, shape);
            quote!(::quern::expr::or(#lhs, #rhs))
        }
        Pred::Not(inner) => {
            let inner = gen_pred(inner, row, shape);
            quote!(::quern::expr::not(#inner))
        }
        Pred::Cmp {
            op,
            domain,
            lhs,
            rhs,
        } => {
            let ctor = match op {
                CmpOp::Eq => quote!(::quern::expr::eq),
                CmpOp::Ne => quote!(::quern::expr::ne),
                CmpOp::Lt => quote!(::quern::expr::lt),
                CmpOp::Le => quote!(::quern::expr::le),
                CmpOp::Gt => quote!(::quern::expr::gt),
                CmpOp::Ge => quote!(::quern::expr::ge),
            };
            let lhs = gen_operand(lhs, *domain, row, shape);
            let rhs = gen_operand(rhs, *domain, row, shape);
            quote!(#ctor(#lhs, #rhs))
        }
    }
}

fn gen_operand(operand: &Operand, domain: Domain, row: &Ident, shape: &[ColInfo]) -> TokenStream {
    match operand {
        Operand::Column(index) => {
            let col = &shape[*index];
            let field = make_ident(&col.name);
            let access = match domain {
                Domain::Int if type_is(&col.ty, "i64") => quote!(row.#field),
                Domain::Int => quote!(row.#field as i64),
                Domain::Float if type_is(&col.ty, "f64") => quote!(row.#field),
                Domain::Float => quote!(row.#field as f64),
                Domain::Text => quote!(row.#field.clone()),
                // Columns are never boolean; nested predicates handle Bool.
                Domain::Bool => quote!(row.#field),
            };
            quote!(::quern::expr::col(|row: &#row| #access))
        }
        Operand::Int(value) => match domain {
            Domain::Float => {
                let value = *value as f64;
                quote!(::quern::expr::lit(#value))
            }
            _ => quote!(::quern::expr::lit(#value)),
        },
        Operand::Float(value) => quote!(::quern::expr::lit(#value)),
        Operand::Str(text) => quote!(::quern::expr::lit(::std::string::String::from(#text))),
        Operand::Nested(pred) => gen_pred(pred, row, shape),
    }
}

fn collect_tables(plan: &Plan, used: &mut Vec<usize>) {
    match &plan.node {
        Node::Relation { table } => {
            if !used.contains(table) {
                used.push(*table);
            }
        }
        Node::Selection { input, .. } | Node::Projection { input, .. } | Node::Rename { input } => {
            collect_tables(input, used);
        }
        Node::Cross { left, right } | Node::Natural { left, right } => {
            collect_tables(left, used);
            collect_tables(right, used);
        }
    }
}

fn type_is(ty: &syn::Type, name: &str) -> bool {
    ty.to_token_stream().to_string() == name
}

/// `books` → `Books`
fn pascal(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn pascal_ident(ident: &Ident) -> Ident {
    Ident::new(&pascal(&sql_name(ident)), ident.span())
}

fn row_ident(ident: &Ident) -> Ident {
    Ident::new(&format!("{}Row", pascal(&sql_name(ident))), ident.span())
}

fn strip_row(ident: &Ident) -> String {
    let text = ident.to_string();
    text.strip_suffix("Row").unwrap_or(&text).to_string()
}

/// Field ident for a SQL column name; keywords become raw identifiers
/// (`genre AS type` yields a field named `r#type`).
fn make_ident(name: &str) -> Ident {
    syn::parse_str::<Ident>(name).unwrap_or_else(|_| Ident::new_raw(name, Span::call_site()))
}
