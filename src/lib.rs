//! Record-oriented delimited-text parser with zero-copy splitting and typed
//! field extraction.
//!
//! Input is a file or an in-memory byte buffer; output is a sequence of
//! typed tuples (or user aggregates implementing [`FromRecord`]), produced
//! record by record. Quoting, escaping, boundary trimming, multiline
//! records, header-driven column selection, per-field validators, and a
//! retry combinator over alternative record types are all configured at
//! parser construction.
//!
//! # Examples
//!
//! Typed tuples:
//!
//! ```rust
//! use rowcut::parse_str;
//!
//! let rows: Vec<(String, i64)> = parse_str("ada,37\ngrace,45\n")?;
//! assert_eq!(rows[0], ("ada".to_string(), 37));
//! assert_eq!(rows[1], ("grace".to_string(), 45));
//! # Ok::<(), rowcut::Error>(())
//! ```
//!
//! Quoting and multiline records:
//!
//! ```rust
//! use rowcut::{ParseOptions, Parser};
//!
//! let options = ParseOptions::new().with_quote(b'"').with_multiline();
//! let input = b"\"line1\nline2\",x\n";
//! let mut parser = Parser::from_slice_with(input, Default::default(), options)?;
//! let (note, tag): (String, String) = parser.get_next().unwrap();
//! assert_eq!(note, "line1\nline2");
//! assert_eq!(tag, "x");
//! # Ok::<(), rowcut::Error>(())
//! ```
//!
//! Header-driven column selection:
//!
//! ```rust
//! use rowcut::Parser;
//!
//! let mut parser = Parser::from_slice(b"x,y,z\n1,2,3\n")?;
//! parser.use_fields(["z", "x"]);
//! assert_eq!(parser.get_next::<(i64, i64)>(), Some((3, 1)));
//! # Ok::<(), rowcut::Error>(())
//! ```
//!
//! Variant fallback over the same record:
//!
//! ```rust
//! use rowcut::{Or, Parser};
//!
//! let mut parser = Parser::from_slice(b"5\n5.5\n")?;
//! assert_eq!(parser.get_next::<(Or<i64, f64>,)>(), Some((Or::First(5),)));
//! assert_eq!(parser.get_next::<(Or<i64, f64>,)>(), Some((Or::Second(5.5),)));
//! # Ok::<(), rowcut::Error>(())
//! ```

mod convert;
mod delimiter;
mod error;
mod extract;
mod matcher;
mod options;
mod parser;
mod reader;
mod record;
mod spec;
mod splitter;
mod typed;

pub use crate::delimiter::Delimiter;
pub use crate::error::{Error, ErrorKind, ErrorMode, Location};
pub use crate::extract::Extract;
pub use crate::options::ParseOptions;
pub use crate::parser::{Composite, Parser, Records};
pub use crate::reader::{FileSource, MemorySource, Source};
pub use crate::record::{FieldRange, FieldValue, Record};
pub use crate::spec::{Check, FieldConst, FieldSpec, RecordSpec, ScalarKind};
pub use crate::typed::{FromField, FromRecord, Or, Skip};

use std::path::Path;

pub type Result<T> = std::result::Result<T, Error>;

/// Parse every line of `input` as one record of type `T`, using the comma
/// delimiter and default options. For header handling or custom dialects,
/// build a [`Parser`] instead.
pub fn parse_str<T: FromRecord>(input: &str) -> Result<Vec<T>> {
    parse_str_with_options(input, &ParseOptions::new())
}

pub fn parse_str_with_options<T: FromRecord>(
    input: &str,
    options: &ParseOptions,
) -> Result<Vec<T>> {
    let mut parser =
        Parser::from_slice_with(input.as_bytes(), Delimiter::default(), options.clone())?;
    parser.records::<T>().collect()
}

/// Parse every record of the file at `path` as a `T`.
pub fn parse_path<T: FromRecord>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    parse_path_with_options(path, &ParseOptions::new())
}

pub fn parse_path_with_options<T: FromRecord>(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<Vec<T>> {
    let mut parser = Parser::from_path_with(path, Delimiter::default(), options.clone())?;
    parser.records::<T>().collect()
}
