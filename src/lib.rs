//! # Quern - Compile-Time Embedded SQL
//!
//! Quern is an embedded relational query engine whose SQL front-end runs
//! entirely at build time. Table schemas and query strings are declared
//! together in a [`database!`] block; the macro tokenizes, parses, and
//! type-checks every query during compilation and generates a typed,
//! pull-based operator pipeline for it. Syntax errors, unknown tables or
//! columns, and type mismatches are build failures; at runtime there is
//! no query planning, no string interpretation, and no value-erased data
//! access: every column reference is a struct-field access.
//!
//! ## Quick Start
//!
//! ```ignore
//! quern::database! {
//!     pub mod library {
//!         table books(title: String, genre: String, year: u32, pages: u32) index(title);
//!         table authored(title: String, name: String);
//!
//!         query classics =
//!             "SELECT title AS book, name AS author, pages
//!              FROM books NATURAL JOIN authored
//!              WHERE year = 1967 OR year >= 1972";
//!     }
//! }
//!
//! use library::{classics, Authored, AuthoredRow, Books};
//!
//! let books: Books = quern::load::load("books.tsv", '\t')?;
//! let mut authored = Authored::new();
//! authored.insert(AuthoredRow { title: "vlr".into(), name: "ellison".into() });
//!
//! for row in classics(&books, &authored) {
//!     println!("{}\t{}\t{}", row.book, row.author, row.pages);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ database! macro (quern-macros, build time) │
//! │   DSL parse → SQL lexer → parser → planner │
//! │            → code generation               │
//! ├────────────────────────────────────────────┤
//! │ Generated code (your crate)                │
//! │   row structs, Table aliases, query fns    │
//! ├────────────────────────────────────────────┤
//! │ Execution kernel (this crate, run time)    │
//! │   ra:: operators │ expr:: predicates       │
//! │   Table storage  │ Query iterator          │
//! ├────────────────────────────────────────────┤
//! │ load:: delimited-text ingestion/storage    │
//! └────────────────────────────────────────────┘
//! ```
//!
//! Each query compiles to a tree of value-carrying operators pulled from
//! the root ([`ra::Operator::next`]): `Relation` leaves scan borrowed
//! [`Table`]s, `Selection` filters through a typed predicate tree
//! ([`expr`]), `Projection`/`Rename` reshape rows, and `Cross`/`Natural`
//! combine two inputs. End-of-stream is an `Option`, handled only by the
//! joins (advance the outer side, rewind the inner) and by the query
//! iterator (stop).
//!
//! ## Module Overview
//!
//! - [`ra`]: pull-based relational-algebra operators
//! - [`expr`]: predicate expression tree used by selections
//! - [`load`]: TSV/CSV-style load and store collaborator
//! - `row` / `table` / `query`: row-model traits, table storage, and the
//!   query façade, re-exported at the crate root
//!
//! ## Semantics Worth Knowing
//!
//! - A table with an `index(...)` clause stores rows as an ordered
//!   multiset under lexicographic comparison of the index columns; equal
//!   keys and index-less tables keep insertion order.
//! - `CROSS` iterates left-major, so `a CROSS JOIN b` enumerates all of
//!   `b` for the first row of `a` before touching the second.
//! - `NATURAL` joins hash the right input once per query value and reuse
//!   the cache across [`Query::reset`].
//! - Keywords are case-insensitive; quoted literals (`'x'` or `"x"`) are
//!   uninterpreted spans with no escape processing.

mod query;
mod row;
mod table;

pub mod expr;
pub mod load;
pub mod ra;

pub use query::Query;
pub use ra::Operator;
pub use row::{JoinKey, Merge, Record};
pub use table::Table;

pub use quern_macros::database;
