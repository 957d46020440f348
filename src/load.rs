//! Delimited-text ingestion and storage.
//!
//! The loader is the only collaborator that touches the filesystem: one
//! row per line, fields separated by a caller-supplied single-character
//! delimiter, the last field running to the line break. String fields
//! take the span between delimiters verbatim; numeric fields go through
//! the standard `FromStr` conversions. Blank lines and a trailing newline
//! produce no rows.
//!
//! The per-row conversions ([`FromRecord`], [`IntoRecord`]) are generated
//! by the `database!` macro for every declared table.

use std::fmt::{Display, Write as _};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use eyre::{eyre, WrapErr};
use tracing::debug;

use crate::row::Record;
use crate::table::Table;

pub use eyre::Result;

/// Parses one delimited line into a row.
pub trait FromRecord: Sized {
    fn from_record(record: &str, delimiter: char) -> Result<Self>;
}

/// Writes a row as one delimited line (no trailing newline).
pub trait IntoRecord {
    fn write_record(&self, out: &mut String, delimiter: char);
}

impl<T: IntoRecord> IntoRecord for &T {
    fn write_record(&self, out: &mut String, delimiter: char) {
        (*self).write_record(out, delimiter);
    }
}

/// Reads a delimited-text file into a [`Table`].
pub fn load<R>(path: impl AsRef<Path>, delimiter: char) -> Result<Table<R>>
where
    R: Record + FromRecord,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;

    let mut table = Table::new();
    for (number, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let row = R::from_record(line, delimiter)
            .wrap_err_with(|| format!("{}:{}: malformed record", path.display(), number + 1))?;
        table.insert(row);
    }

    debug!(table = R::TABLE, rows = table.len(), "loaded table");
    Ok(table)
}

/// Writes rows (a table's, or a query's results) to a delimited-text file.
pub fn store<R, I>(rows: I, path: impl AsRef<Path>, delimiter: char) -> Result<()>
where
    R: IntoRecord,
    I: IntoIterator<Item = R>,
{
    let path = path.as_ref();
    let mut out = String::new();
    let mut count = 0usize;
    for row in rows {
        row.write_record(&mut out, delimiter);
        out.push('\n');
        count += 1;
    }

    fs::write(path, out).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    debug!(rows = count, "stored rows");
    Ok(())
}

/// Parses one field of a record; used by generated [`FromRecord`] impls.
pub fn field<T>(raw: Option<&str>, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = raw.ok_or_else(|| eyre!("missing field `{name}`"))?;
    raw.parse()
        .map_err(|err| eyre!("invalid value {raw:?} for field `{name}`: {err}"))
}

/// Appends one field of a record; used by generated [`IntoRecord`] impls.
pub fn put<T: Display>(out: &mut String, value: &T) {
    // Writing to a String cannot fail.
    let _ = write!(out, "{value}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ra::fixtures::{book, Book};

    impl FromRecord for Book {
        fn from_record(record: &str, delimiter: char) -> Result<Self> {
            let mut fields = record.splitn(3, delimiter);
            Ok(Self {
                title: field(fields.next(), "title")?,
                genre: field(fields.next(), "genre")?,
                year: field(fields.next(), "year")?,
            })
        }
    }

    impl IntoRecord for Book {
        fn write_record(&self, out: &mut String, delimiter: char) {
            put(out, &self.title);
            out.push(delimiter);
            put(out, &self.genre);
            out.push(delimiter);
            put(out, &self.year);
        }
    }

    #[test]
    fn loads_tab_separated_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.tsv");
        std::fs::write(&path, "dune\tsci\t1965\nlotr\tfan\t1954\n").unwrap();

        let table: Table<Book> = load(&path, '\t').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].title, "dune");
    }

    #[test]
    fn blank_lines_and_trailing_newline_yield_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.tsv");
        std::fs::write(&path, "dune\tsci\t1965\n\n\n").unwrap();

        let table: Table<Book> = load(&path, '\t').unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn malformed_numeric_field_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.tsv");
        std::fs::write(&path, "dune\tsci\tnineteen\n").unwrap();

        let err = load::<Book>(&path, '\t').unwrap_err();
        assert!(format!("{err:#}").contains(":1"), "error should carry the line number");
    }

    #[test]
    fn missing_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.tsv");
        std::fs::write(&path, "dune\tsci\n").unwrap();

        assert!(load::<Book>(&path, '\t').is_err());
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");

        let rows = vec![book("dune", "sci", 1965), book("lotr", "fan", 1954)];
        store(rows.iter(), &path, '\t').unwrap();

        let table: Table<Book> = load(&path, '\t').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].year, 1954);
    }
}
