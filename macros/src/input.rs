//! Parsing of the `database!` block itself (the part of the input that is
//! Rust-adjacent syntax rather than SQL).
//!
//! ```text
//! database! {
//!     pub mod library {
//!         table books(title: String, year: u32) index(title);
//!         query recent = "SELECT title FROM books WHERE year > 1970";
//!     }
//! }
//! ```
//!
//! This module is purely structural; name and type checking happens in
//! the planner, with spans pointing back at the offending item.

use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{braced, parenthesized, Attribute, Ident, LitStr, Token, Type, Visibility};

mod kw {
    syn::custom_keyword!(table);
    syn::custom_keyword!(query);
    syn::custom_keyword!(index);
}

#[derive(Debug)]
pub struct DatabaseInput {
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    pub ident: Ident,
    pub tables: Vec<TableDecl>,
    pub queries: Vec<QueryDecl>,
}

#[derive(Debug)]
pub struct TableDecl {
    pub attrs: Vec<Attribute>,
    pub name: Ident,
    pub columns: Vec<ColumnDecl>,
    pub index: Vec<Ident>,
}

#[derive(Debug)]
pub struct ColumnDecl {
    pub name: Ident,
    pub ty: Type,
}

#[derive(Debug)]
pub struct QueryDecl {
    pub attrs: Vec<Attribute>,
    pub name: Ident,
    pub sql: LitStr,
}

impl Parse for DatabaseInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        input.parse::<Token![mod]>()?;
        let ident: Ident = input.parse()?;

        let content;
        braced!(content in input);

        let mut tables = Vec::new();
        let mut queries = Vec::new();
        while !content.is_empty() {
            let item_attrs = content.call(Attribute::parse_outer)?;
            let lookahead = content.lookahead1();
            if lookahead.peek(kw::table) {
                tables.push(TableDecl::parse_rest(&content, item_attrs)?);
            } else if lookahead.peek(kw::query) {
                queries.push(QueryDecl::parse_rest(&content, item_attrs)?);
            } else {
                return Err(lookahead.error());
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected a single `mod { ... }` block"));
        }

        Ok(Self {
            attrs,
            vis,
            ident,
            tables,
            queries,
        })
    }
}

impl TableDecl {
    fn parse_rest(input: ParseStream, attrs: Vec<Attribute>) -> syn::Result<Self> {
        input.parse::<kw::table>()?;
        let name: Ident = input.parse()?;

        let columns_input;
        parenthesized!(columns_input in input);
        let columns: Punctuated<ColumnDecl, Token![,]> =
            columns_input.parse_terminated(ColumnDecl::parse, Token![,])?;
        if columns.is_empty() {
            return Err(syn::Error::new(
                name.span(),
                format!("table `{name}` declares no columns"),
            ));
        }

        let index = if input.peek(kw::index) {
            input.parse::<kw::index>()?;
            let index_input;
            parenthesized!(index_input in input);
            let cols: Punctuated<Ident, Token![,]> =
                index_input.parse_terminated(Ident::parse_any, Token![,])?;
            cols.into_iter().collect()
        } else {
            Vec::new()
        };

        input.parse::<Token![;]>()?;

        Ok(Self {
            attrs,
            name,
            columns: columns.into_iter().collect(),
            index,
        })
    }
}

impl Parse for ColumnDecl {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: Ident = input.call(Ident::parse_any)?;
        input.parse::<Token![:]>()?;
        let ty: Type = input.parse()?;
        Ok(Self { name, ty })
    }
}

impl QueryDecl {
    fn parse_rest(input: ParseStream, attrs: Vec<Attribute>) -> syn::Result<Self> {
        input.parse::<kw::query>()?;
        let name: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let sql: LitStr = input.parse()?;
        input.parse::<Token![;]>()?;
        Ok(Self { attrs, name, sql })
    }
}

/// SQL-visible name of a declared identifier (`r#type` → `type`).
pub fn sql_name(ident: &Ident) -> String {
    ident.unraw().to_string()
}
