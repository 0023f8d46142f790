//! Parser facade: owns the reader and its two converters, drives the
//! advance protocol, and exposes typed retrieval, header-driven column
//! selection, composite retry, and record iteration.

use std::marker::PhantomData;
use std::path::Path;

use indexmap::IndexSet;
use log::debug;
use smol_str::SmolStr;

use crate::delimiter::Delimiter;
use crate::error::{Error, ErrorKind, ErrorState, Location};
use crate::options::ParseOptions;
use crate::reader::{FileSource, MemorySource, Reader, Source};
use crate::record::Record;
use crate::spec::RecordSpec;
use crate::splitter::Splitter;
use crate::typed::FromRecord;

/// Record-by-record parser over a file or an in-memory buffer.
///
/// The reader always stages one record ahead, so end of input is known
/// before the caller asks for another record and iteration terminates
/// without a sentinel row.
///
/// # Examples
/// ```
/// use rowcut::Parser;
///
/// let mut parser = Parser::from_slice(b"1,2.5\n3,4.5\n").unwrap();
/// let first: (i64, f64) = parser.get_next().unwrap();
/// assert_eq!(first, (1, 2.5));
/// let second: (i64, f64) = parser.get_next().unwrap();
/// assert_eq!(second, (3, 4.5));
/// assert!(parser.eof());
/// ```
#[derive(Debug)]
pub struct Parser<S> {
    label: String,
    options: ParseOptions,
    delimiter: Delimiter,
    reader: Reader<S>,
    error: ErrorState,
    header: IndexSet<SmolStr>,
    header_split: bool,
    raw_header: Vec<u8>,
    eof: bool,
}

impl Parser<FileSource> {
    /// Open a file with the default comma delimiter and default options.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_path_with(path, Delimiter::default(), ParseOptions::new())
    }

    pub fn from_path_with(
        path: impl AsRef<Path>,
        delimiter: Delimiter,
        options: ParseOptions,
    ) -> Result<Self, Error> {
        options.validate()?;
        let label = path.as_ref().display().to_string();
        let source = FileSource::open(path.as_ref()).map_err(|_| {
            Error::new(
                ErrorKind::SourceUnavailable,
                format!("{label} could not be opened"),
            )
        })?;
        Ok(Self::build(source, label, delimiter, options))
    }
}

impl<'a> Parser<MemorySource<'a>> {
    /// Parse an in-memory byte buffer with default delimiter and options.
    pub fn from_slice(data: &'a [u8]) -> Result<Self, Error> {
        Self::from_slice_with(data, Delimiter::default(), ParseOptions::new())
    }

    pub fn from_slice_with(
        data: &'a [u8],
        delimiter: Delimiter,
        options: ParseOptions,
    ) -> Result<Self, Error> {
        Self::from_source(MemorySource::new(data), "buffer line", delimiter, options)
    }
}

impl<S: Source> Parser<S> {
    /// Build a parser over any [`Source`] implementation. `label` is used to
    /// prefix error messages the way a file name would be.
    pub fn from_source(
        source: S,
        label: impl Into<String>,
        delimiter: Delimiter,
        options: ParseOptions,
    ) -> Result<Self, Error> {
        options.validate()?;
        Ok(Self::build(source, label.into(), delimiter, options))
    }

    fn build(source: S, label: String, delimiter: Delimiter, options: ParseOptions) -> Self {
        let reader = Reader::new(source, delimiter.clone(), &options);
        let mode = options.error_mode;
        let mut parser = Self {
            label,
            options,
            delimiter,
            reader,
            error: ErrorState::new(mode),
            header: IndexSet::new(),
            header_split: false,
            raw_header: Vec::new(),
            eof: false,
        };

        parser.read_line();
        if parser.options.ignore_header {
            parser.ignore_next();
        } else {
            parser.raw_header = parser.reader.staged_bytes().to_vec();
        }
        parser
    }

    /// No error has been recorded since the last retrieval.
    pub fn valid(&self) -> bool {
        self.error.is_clear()
    }

    /// The recorded message; empty in flag mode or when valid.
    pub fn error_msg(&self) -> &str {
        self.error.message()
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.error.get()
    }

    pub fn eof(&self) -> bool {
        self.eof
    }

    /// 1-based line number of the most recently returned record; 0 before
    /// the first retrieval.
    pub fn line(&self) -> usize {
        self.reader.line_number().saturating_sub(1)
    }

    /// Byte offset of the start of the staged record.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// Discard the staged record and stage the following one.
    pub fn ignore_next(&mut self) -> bool {
        let ok = self.reader.read_next();
        self.eof = !ok;
        ok
    }

    /// Retrieve the next record as `T`. Returns `None` on end of input or
    /// when any field fails; the error is observable via [`Self::valid`],
    /// [`Self::error_msg`], and [`Self::last_error`].
    pub fn get_next<T: FromRecord>(&mut self) -> Option<T> {
        self.get_next_with(&T::record_spec())
    }

    /// Like [`Self::get_next`] but against a caller-built [`RecordSpec`],
    /// e.g. to attach validators to positions of `T`.
    pub fn get_next_with<T: FromRecord>(&mut self, spec: &RecordSpec) -> Option<T> {
        if !self.advance_stage() {
            return None;
        }

        let line_number = self.reader.line_number();
        let offset = self.reader.position();

        enum Outcome<T> {
            Value(T),
            ConverterError,
            TypedError,
        }

        let outcome = match self.reader.convert_current(spec) {
            Some(record) => match T::from_record(&record) {
                Some(value) => Outcome::Value(value),
                None => Outcome::TypedError,
            },
            None => Outcome::ConverterError,
        };

        let value = match outcome {
            Outcome::Value(value) => Some(value),
            Outcome::ConverterError => {
                self.record_conversion_error(line_number, offset);
                None
            }
            Outcome::TypedError => {
                self.record_typed_error(line_number, offset);
                None
            }
        };

        self.read_line();
        value
    }

    /// Zero-copy retrieval: the returned [`Record`] borrows the current
    /// record buffer and stays valid until the next retrieval.
    pub fn next_record(&mut self, spec: &RecordSpec) -> Option<Record<'_>> {
        if !self.advance_stage() {
            return None;
        }

        let line_number = self.reader.line_number();
        let offset = self.reader.position();

        // Stage the following physical line first; it only touches the
        // next-line buffers, so the borrow handed out below stays intact.
        self.read_line();

        if self.reader.convert_current(spec).is_none() {
            self.record_conversion_error(line_number, offset);
            return None;
        }
        self.reader.convert_current(spec)
    }

    /// Single-pass iterator over the remaining records.
    pub fn records<T: FromRecord>(&mut self) -> Records<'_, S, T> {
        Records {
            parser: self,
            _marker: PhantomData,
        }
    }

    ////////////////
    // header
    ////////////////

    /// Materialize the header names. When the parser is still positioned at
    /// the header row it advances past it, so the next retrieval returns
    /// data.
    pub fn header(&mut self) -> Vec<String> {
        if self.options.ignore_header {
            self.record_header_ignored();
            return Vec::new();
        }
        if self.header.is_empty() {
            self.split_header_data();
        }
        if self.line() == 0 {
            self.ignore_next();
        }
        self.header.iter().map(|name| name.to_string()).collect()
    }

    /// Whether the header contains `field`. Does not advance.
    pub fn field_exists(&mut self, field: &str) -> bool {
        if self.header.is_empty() {
            self.split_header_data();
        }
        self.header.contains(field)
    }

    /// Select and reorder input columns by header name; the mapping applies
    /// to every subsequent retrieval. When still positioned at the header
    /// row, advances past it.
    pub fn use_fields<I, F>(&mut self, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        if self.options.ignore_header {
            self.record_header_ignored();
            return;
        }

        if self.header.is_empty() && !self.eof() {
            self.split_header_data();
        }

        if !self.valid() {
            return;
        }

        let names: Vec<String> = fields
            .into_iter()
            .map(|field| field.as_ref().to_string())
            .collect();

        if names.is_empty() {
            self.error
                .record(ErrorKind::EmptyMapping, || "received empty mapping".to_string());
            return;
        }

        let mut mapping = Vec::with_capacity(names.len());
        for name in &names {
            if names.iter().filter(|other| *other == name).count() != 1 {
                let label = &self.label;
                self.error.record(ErrorKind::RepeatedField, || {
                    format!("{label}: given field used multiple times: {name}")
                });
                return;
            }
            match self.header.get_index_of(name.as_str()) {
                Some(index) => mapping.push(index),
                None => {
                    let label = &self.label;
                    self.error.record(ErrorKind::UnknownField, || {
                        format!("{label}: header does not contain given field: {name}")
                    });
                    return;
                }
            }
        }

        debug!("installing column mapping {mapping:?}");
        self.reader.set_column_mapping(mapping, self.header.len());

        if self.line() == 0 {
            self.ignore_next();
        }
    }

    fn split_header_data(&mut self) {
        if self.header_split {
            return;
        }
        self.header_split = true;

        let mut splitter = Splitter::new(self.options.splitter_config(), self.options.error_mode);
        let mut raw = self.raw_header.clone();
        splitter.split(&mut raw, &self.delimiter);

        for &(begin, end) in splitter.ranges() {
            let field = SmolStr::new(String::from_utf8_lossy(&raw[begin..end]));
            if !self.header.insert(field.clone()) {
                self.error.record(ErrorKind::DuplicateHeader, || {
                    format!("header contains duplicates: {field}")
                });
                self.header.clear();
                return;
            }
        }
    }

    ////////////////
    // composite retry
    ////////////////

    /// Retrieve the next record as `T`, returning a [`Composite`] that can
    /// retry the same already-split record with other types on failure.
    pub fn try_next<T: FromRecord>(&mut self) -> Composite<'_, S, (Option<T>,)> {
        let value = self.get_next::<T>();
        Composite {
            values: (value,),
            parser: self,
        }
    }

    /// Like [`Self::try_next`], invoking `action` on success.
    pub fn try_next_with<T: FromRecord>(
        &mut self,
        action: impl FnOnce(&T),
    ) -> Composite<'_, S, (Option<T>,)> {
        let value = self.get_next::<T>();
        if let Some(value) = &value {
            action(value);
        }
        Composite {
            values: (value,),
            parser: self,
        }
    }

    /// Like [`Self::try_next`], but `check` rejecting the value fails the
    /// attempt as if the conversion itself had failed.
    pub fn try_next_check<T: FromRecord>(
        &mut self,
        check: impl FnOnce(&T) -> bool,
    ) -> Composite<'_, S, (Option<T>,)> {
        let mut value = self.get_next::<T>();
        if let Some(inner) = &value {
            if !check(inner) {
                self.record_failed_check();
                value = None;
            }
        }
        Composite {
            values: (value,),
            parser: self,
        }
    }

    /// Re-convert the current record with a different type. Only runs when
    /// the previous attempt failed; end of input is never retried.
    fn retry_same<U: FromRecord>(&mut self) -> Option<U> {
        if self.valid() {
            return None;
        }
        if self.error.kind() == Some(ErrorKind::ReadPastEof) {
            return None;
        }

        self.error.clear();
        let line_number = self.reader.line_number();
        let offset = self.reader.position();
        let spec = U::record_spec();

        enum Outcome<U> {
            Value(U),
            ConverterError,
            TypedError,
        }

        let outcome = match self.reader.convert_current(&spec) {
            Some(record) => match U::from_record(&record) {
                Some(value) => Outcome::Value(value),
                None => Outcome::TypedError,
            },
            None => Outcome::ConverterError,
        };

        match outcome {
            Outcome::Value(value) => Some(value),
            Outcome::ConverterError => {
                self.record_conversion_error(line_number, offset);
                None
            }
            Outcome::TypedError => {
                self.record_typed_error(line_number, offset);
                None
            }
        }
    }

    ////////////////
    // advance protocol
    ////////////////

    /// Common prologue of every retrieval: finish assembling the staged
    /// record, swap it in, and surface structural errors or end of input.
    fn advance_stage(&mut self) -> bool {
        if !self.eof {
            self.reader.parse();
        }
        self.reader.update();

        if !self.reader.converter().valid() {
            let line_number = self.reader.line_number();
            let offset = self.reader.position();
            self.record_conversion_error(line_number, offset);
            self.read_line();
            return false;
        }

        self.error.clear();

        if self.eof {
            let label = &self.label;
            self.error.record(ErrorKind::ReadPastEof, || {
                format!("{label} read on end of file")
            });
            return false;
        }
        true
    }

    fn read_line(&mut self) {
        self.eof = !self.reader.read_next();
    }

    ////////////////
    // error recording
    ////////////////

    fn record_conversion_error(&mut self, line_number: usize, offset: u64) {
        let kind = self
            .reader
            .converter()
            .error()
            .kind()
            .unwrap_or(ErrorKind::InvalidConversion);
        let label = &self.label;
        let detail = self.reader.converter().error().message();
        self.error.record_at(
            kind,
            || format!("{label} {line_number}: {detail}"),
            Location {
                offset,
                line: line_number,
                column: 0,
            },
        );
    }

    fn record_typed_error(&mut self, line_number: usize, offset: u64) {
        let label = &self.label;
        self.error.record_at(
            ErrorKind::InvalidConversion,
            || format!("{label} {line_number}: invalid conversion"),
            Location {
                offset,
                line: line_number,
                column: 0,
            },
        );
    }

    fn record_failed_check(&mut self) {
        let label = &self.label;
        self.error
            .record(ErrorKind::FailedCheck, || format!("{label} failed check"));
    }

    fn record_header_ignored(&mut self) {
        let label = &self.label;
        self.error.record(ErrorKind::HeaderIgnored, || {
            format!("{label}: the header row is ignored within the setup it cannot be used")
        });
    }
}

/// Result of [`Parser::try_next`]: the attempts so far plus the ability to
/// retry the same record with another type.
///
/// Each `or_else` extends the value tuple by one `Option`; at most one slot
/// of the chain is `Some`.
///
/// # Examples
/// ```
/// use rowcut::Parser;
///
/// let mut parser = Parser::from_slice(b"not-a-number,7\n").unwrap();
/// let mut fallback = None;
/// parser
///     .try_next::<(i64, i64)>()
///     .or_else_with(|(name, n): &(String, i64)| fallback = Some((name.clone(), *n)));
/// assert_eq!(fallback, Some(("not-a-number".to_string(), 7)));
/// ```
pub struct Composite<'p, S, V> {
    values: V,
    parser: &'p mut Parser<S>,
}

impl<'p, S: Source, V> Composite<'p, S, V> {
    /// Retry with `U` when no previous attempt succeeded.
    pub fn or_else<U: FromRecord>(self) -> Composite<'p, S, (V, Option<U>)> {
        let Composite { values, parser } = self;
        let value = parser.retry_same::<U>();
        Composite {
            values: (values, value),
            parser,
        }
    }

    /// Retry with `U`, invoking `action` when this attempt produces the
    /// first success of the chain.
    pub fn or_else_with<U: FromRecord>(
        self,
        action: impl FnOnce(&U),
    ) -> Composite<'p, S, (V, Option<U>)> {
        let Composite { values, parser } = self;
        let value = parser.retry_same::<U>();
        if let Some(value) = &value {
            action(value);
        }
        Composite {
            values: (values, value),
            parser,
        }
    }

    /// Retry with `U`; `check` rejecting the value fails this attempt and
    /// leaves the chain open for further alternatives.
    pub fn or_else_check<U: FromRecord>(
        self,
        check: impl FnOnce(&U) -> bool,
    ) -> Composite<'p, S, (V, Option<U>)> {
        let Composite { values, parser } = self;
        let mut value = parser.retry_same::<U>();
        if let Some(inner) = &value {
            if !check(inner) {
                parser.record_failed_check();
                value = None;
            }
        }
        Composite {
            values: (values, value),
            parser,
        }
    }

    /// Invoke `handler` when the whole chain ended without a success.
    pub fn on_error(self, handler: impl FnOnce(&Error)) -> Self {
        if !self.parser.valid() {
            if let Some(error) = self.parser.last_error() {
                handler(error);
            }
        }
        self
    }

    /// All attempt slots, in chain order, as nested pairs.
    pub fn values(self) -> V {
        self.values
    }
}

/// Single-pass record iterator returned by [`Parser::records`].
pub struct Records<'p, S, T> {
    parser: &'p mut Parser<S>,
    _marker: PhantomData<fn() -> T>,
}

impl<S: Source, T: FromRecord> Iterator for Records<'_, S, T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.parser.eof() {
            return None;
        }
        match self.parser.get_next::<T>() {
            Some(value) => Some(Ok(value)),
            None => {
                if self.parser.error.kind() == Some(ErrorKind::ReadPastEof) {
                    return None;
                }
                let error = self
                    .parser
                    .last_error()
                    .cloned()
                    .unwrap_or_else(|| Error::flagged(ErrorKind::InvalidConversion));
                Some(Err(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorMode;

    fn parser(input: &'static str) -> Parser<MemorySource<'static>> {
        Parser::from_slice_with(
            input.as_bytes(),
            Delimiter::default(),
            ParseOptions::new().with_error_mode(ErrorMode::Message),
        )
        .unwrap()
    }

    #[rstest::rstest]
    fn test_get_next_and_eof() {
        let mut p = parser("1,2\n3,4\n");
        assert_eq!(p.get_next::<(i64, i64)>(), Some((1, 2)));
        assert_eq!(p.get_next::<(i64, i64)>(), Some((3, 4)));
        assert!(p.eof());
        assert_eq!(p.get_next::<(i64, i64)>(), None);
        assert_eq!(p.last_error().unwrap().kind(), ErrorKind::ReadPastEof);
    }

    #[rstest::rstest]
    fn test_error_does_not_poison() {
        let mut p = parser("oops,2\n3,4\n");
        assert_eq!(p.get_next::<(i64, i64)>(), None);
        assert!(!p.valid());
        assert_eq!(p.get_next::<(i64, i64)>(), Some((3, 4)));
        assert!(p.valid());
    }

    #[rstest::rstest]
    fn test_line_numbers() {
        let mut p = parser("a\nb\n");
        assert_eq!(p.line(), 0);
        p.get_next::<(String,)>().unwrap();
        assert_eq!(p.line(), 1);
        p.get_next::<(String,)>().unwrap();
        assert_eq!(p.line(), 2);
    }

    #[rstest::rstest]
    fn test_message_decoration() {
        let mut p = parser("x\n");
        assert!(p.get_next::<(i64,)>().is_none());
        assert_eq!(
            p.error_msg(),
            "buffer line 1: invalid conversion for parameter at column 1: 'x'"
        );
    }

    #[rstest::rstest]
    fn test_use_fields_reorders() {
        let mut p = parser("x,y,z\n1,2,3\n");
        p.use_fields(["z", "x"]);
        assert!(p.valid());
        assert_eq!(p.get_next::<(i64, i64)>(), Some((3, 1)));
    }

    #[rstest::rstest]
    fn test_header_consumed_by_accessor() {
        let mut p = parser("a,b,c\n1,2,3\n");
        assert_eq!(p.header(), vec!["a", "b", "c"]);
        assert_eq!(
            p.get_next::<(String, String, String)>(),
            Some(("1".into(), "2".into(), "3".into()))
        );
        assert_eq!(p.get_next::<(String, String, String)>(), None);
        assert!(p.eof());
    }

    #[rstest::rstest]
    fn test_field_exists_does_not_advance() {
        let mut p = parser("a,b\n1,2\n");
        assert!(p.field_exists("a"));
        assert!(!p.field_exists("c"));
        assert_eq!(p.line(), 0);
    }

    #[rstest::rstest]
    fn test_composite_first_attempt_wins() {
        let mut p = parser("5,6\n");
        let ((first,), second) = p
            .try_next::<(i64, i64)>()
            .or_else::<(String, String)>()
            .values();
        assert_eq!(first, Some((5, 6)));
        assert!(second.is_none());
    }

    #[rstest::rstest]
    fn test_composite_fallback_fires() {
        let mut p = parser("five,6\n");
        let mut called = false;
        let ((first,), second) = p
            .try_next::<(i64, i64)>()
            .or_else_with(|(word, n): &(String, i64)| {
                called = true;
                assert_eq!(word, "five");
                assert_eq!(*n, 6);
            })
            .values();
        assert!(first.is_none());
        assert!(second.is_some());
        assert!(called);
    }

    #[rstest::rstest]
    fn test_composite_on_error() {
        let mut p = parser("a,b\n");
        let mut seen = None;
        p.try_next::<(i64, i64)>()
            .or_else::<(i64, f64)>()
            .on_error(|error| seen = Some(error.kind()));
        assert_eq!(seen, Some(ErrorKind::InvalidConversion));
    }

    #[rstest::rstest]
    fn test_composite_failed_check() {
        let mut p = parser("4,4\n");
        let mut fallback_ran = false;
        let composite = p.try_next_check(|&(a, b): &(i64, i64)| a != b);
        assert!(!composite.parser.valid());
        composite.or_else_with(|_: &(String, String)| fallback_ran = true);
        assert!(fallback_ran);
    }
}
