//! # quern-macros - Compile-Time SQL Front-End
//!
//! Procedural-macro side of the quern query engine. The single entry
//! point, [`database!`], takes a module of table and query declarations;
//! every query string is tokenized, parsed, and type-checked here, during
//! expansion, and compiles down to a typed operator pipeline over the
//! `quern` runtime crate.
//!
//! ```text
//! database! block
//!     │  input::DatabaseInput      (syn: tables, queries)
//!     ▼
//! lexer::Lexer ── token::Token     (zero-copy SQL tokens)
//!     ▼
//! parser::parse_query ── ast::*    (arena-allocated AST)
//!     ▼
//! planner::plan_query              (names resolved, comparisons typed)
//!     ▼
//! codegen::expand                  (row structs, Table aliases, query fns)
//! ```
//!
//! Diagnostics from the SQL layers carry the position inside the query
//! string and are reported on the query's string literal.
//!
//! This crate is an implementation detail of `quern`; depend on `quern`
//! and use the re-exported macro.

mod ast;
mod codegen;
mod error;
mod input;
mod lexer;
mod parser;
mod planner;
mod token;

use proc_macro::TokenStream;
use syn::parse_macro_input;

/// Declares a module of in-memory tables and compile-time-checked queries.
///
/// ```ignore
/// quern::database! {
///     pub mod library {
///         table books(title: String, genre: String, year: u32) index(title);
///         table authored(title: String, name: String);
///
///         query classics =
///             "SELECT title AS book, name AS author
///              FROM books NATURAL JOIN authored
///              WHERE year = 1967 OR year >= 1972";
///     }
/// }
/// ```
///
/// For every `table` this generates a row struct (`BooksRow`), a
/// container alias (`Books`), and delimited-text conversions; for every
/// `query`, an output row struct (`ClassicsRow`) and a constructor
/// function (`classics(&Books, &Authored)`) returning an iterable
/// [`Query`]. Malformed SQL, unknown tables or columns, and comparison
/// type mismatches fail the build with a message on the query string.
///
/// [`Query`]: ../quern/struct.Query.html
#[proc_macro]
pub fn database(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as input::DatabaseInput);
    codegen::expand(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
