//! Converter: turn one split record into typed field values according to a
//! [`RecordSpec`], enforcing arity, column mapping, and validators.

use crate::delimiter::Delimiter;
use crate::error::{ErrorKind, ErrorMode, ErrorState};
use crate::extract::Extract;
use crate::options::SplitterConfig;
use crate::record::{FieldValue, Record};
use crate::spec::{FieldSpec, RecordSpec, ScalarKind};
use crate::splitter::Splitter;

#[derive(Debug, Clone)]
pub(crate) struct Converter {
    splitter: Splitter,
    error: ErrorState,
    column_mapping: Vec<usize>,
    /// Total input columns recorded when the mapping was installed.
    column_count: usize,
}

impl Converter {
    pub(crate) fn new(config: SplitterConfig, mode: ErrorMode) -> Self {
        Self {
            splitter: Splitter::new(config, mode),
            error: ErrorState::new(mode),
            column_mapping: Vec::new(),
            column_count: 0,
        }
    }

    pub(crate) fn valid(&self) -> bool {
        self.error.is_clear()
    }

    pub(crate) fn error(&self) -> &ErrorState {
        &self.error
    }

    pub(crate) fn clear_error(&mut self) {
        self.error.clear();
    }

    pub(crate) fn unterminated_quote(&self) -> bool {
        self.splitter.unterminated_quote()
    }

    pub(crate) fn size_shifted(&self) -> usize {
        self.splitter.size_shifted()
    }

    pub(crate) fn ranges(&self) -> &[(usize, usize)] {
        self.splitter.ranges()
    }

    /// Split one record buffer. A zero-length record produces zero columns,
    /// so arity checks treat it as an empty row.
    pub(crate) fn split(&mut self, buf: &mut [u8], delim: &Delimiter) {
        if buf.is_empty() {
            self.splitter.reset();
            return;
        }
        self.splitter.split(buf, delim);
    }

    pub(crate) fn resplit(&mut self, buf: &mut [u8], delim: &Delimiter) {
        self.splitter.resplit(buf, delim);
    }

    /// Surface a continuation failure observed by the reader.
    pub(crate) fn record_unterminated_escape(&mut self) {
        self.splitter.record_unterminated_escape();
        self.adopt_splitter_error();
    }

    pub(crate) fn record_unterminated_quote(&mut self) {
        self.splitter.record_unterminated_quote();
        self.adopt_splitter_error();
    }

    pub(crate) fn record_multiline_limit_reached(&mut self) {
        self.error.record(ErrorKind::MultilineLimitReached, || {
            "multiline limit reached".to_string()
        });
    }

    fn adopt_splitter_error(&mut self) {
        let kind = self
            .splitter
            .error()
            .kind()
            .unwrap_or(ErrorKind::UnterminatedQuote);
        let message = self.splitter.error().message().to_string();
        self.error.record(kind, || message);
    }

    ////////////////
    // column mapping
    ////////////////

    pub(crate) fn columns_mapped(&self) -> bool {
        !self.column_mapping.is_empty()
    }

    fn column_position(&self, parse_position: usize) -> usize {
        if !self.columns_mapped() {
            return parse_position;
        }
        self.column_mapping[parse_position]
    }

    pub(crate) fn set_column_mapping(&mut self, positions: Vec<usize>, number_of_columns: usize) {
        if positions.is_empty() {
            self.error
                .record(ErrorKind::EmptyMapping, || "received empty mapping".to_string());
            return;
        }

        let max_index = positions.iter().copied().max().unwrap_or(0);
        if max_index >= number_of_columns {
            self.error.record(ErrorKind::MappingOutOfRange, || {
                format!(
                    "maximum index: {max_index}, greater than number of columns: {number_of_columns}"
                )
            });
            return;
        }

        self.column_mapping = positions;
        self.column_count = number_of_columns;
    }

    ////////////////
    // conversion
    ////////////////

    /// Convert the retained split data against `spec`. `buf` must be the
    /// buffer the ranges were produced from.
    pub(crate) fn convert<'buf>(
        &mut self,
        buf: &'buf [u8],
        spec: &RecordSpec,
    ) -> Option<Record<'buf>> {
        self.error.clear();

        if !self.splitter.valid() {
            self.adopt_splitter_error();
            return None;
        }

        let columns = self.splitter.ranges().len();
        let arity = spec.len();

        if !self.columns_mapped() {
            if arity != columns {
                self.error.record(ErrorKind::ColumnCountMismatch, || {
                    format!("invalid number of columns, expected: {arity}, got: {columns}")
                });
                return None;
            }
        } else {
            if arity != self.column_mapping.len() {
                let mapping = self.column_mapping.len();
                self.error.record(ErrorKind::ColumnCountMismatch, || {
                    format!(
                        "number of arguments does not match mapping, expected: {mapping}, got: {arity}"
                    )
                });
                return None;
            }
            if columns != self.column_count {
                let expected = self.column_count;
                self.error.record(ErrorKind::ColumnCountMismatch, || {
                    format!("invalid number of columns, expected: {expected}, got: {columns}")
                });
                return None;
            }
        }

        let mut record = Record::with_capacity(arity);
        for (position, field) in spec.fields().iter().enumerate() {
            if !self.error.is_clear() {
                // First error wins; remaining positions are not extracted.
                record.push(FieldValue::Absent);
                continue;
            }
            let (begin, end) = self.splitter.ranges()[self.column_position(position)];
            let payload = &buf[begin..end];
            let value = self.extract_position(field, payload, position);
            record.push(value);
        }

        if self.error.is_clear() {
            Some(record)
        } else {
            None
        }
    }

    fn extract_position<'buf>(
        &mut self,
        field: &FieldSpec,
        payload: &'buf [u8],
        position: usize,
    ) -> FieldValue<'buf> {
        match field {
            FieldSpec::Skip => FieldValue::Absent,
            FieldSpec::Scalar(kind) => match extract_scalar(*kind, payload) {
                Some(value) => value,
                None => {
                    self.record_invalid_conversion(payload, position);
                    FieldValue::Absent
                }
            },
            FieldSpec::Optional(inner) => {
                try_extract(inner, payload).unwrap_or(FieldValue::Absent)
            }
            FieldSpec::Variant(alternatives) => {
                for alternative in alternatives {
                    if let Some(value) = try_extract(alternative, payload) {
                        return value;
                    }
                }
                self.record_invalid_conversion(payload, position);
                FieldValue::Absent
            }
            FieldSpec::Checked(inner, check) => match try_extract(inner, payload) {
                Some(value) => {
                    if check.is_valid(&value) {
                        value
                    } else {
                        let message = check.message();
                        self.error.record(ErrorKind::ValidationFailed, || {
                            format!("{message} {}", error_suffix(payload, position))
                        });
                        FieldValue::Absent
                    }
                }
                None => {
                    self.record_invalid_conversion(payload, position);
                    FieldValue::Absent
                }
            },
        }
    }

    fn record_invalid_conversion(&mut self, payload: &[u8], position: usize) {
        self.error.record(ErrorKind::InvalidConversion, || {
            format!(
                "invalid conversion for parameter {}",
                error_suffix(payload, position)
            )
        });
    }
}

/// Attempt extraction without touching any error state; used for optional
/// and variant positions where failure is not an error by itself.
fn try_extract<'buf>(field: &FieldSpec, payload: &'buf [u8]) -> Option<FieldValue<'buf>> {
    match field {
        FieldSpec::Skip => Some(FieldValue::Absent),
        FieldSpec::Scalar(kind) => extract_scalar(*kind, payload),
        FieldSpec::Optional(inner) => {
            Some(try_extract(inner, payload).unwrap_or(FieldValue::Absent))
        }
        FieldSpec::Variant(alternatives) => alternatives
            .iter()
            .find_map(|alternative| try_extract(alternative, payload)),
        FieldSpec::Checked(inner, check) => {
            try_extract(inner, payload).filter(|value| check.is_valid(value))
        }
    }
}

fn extract_scalar(kind: ScalarKind, payload: &[u8]) -> Option<FieldValue<'_>> {
    match kind {
        ScalarKind::Int => i64::extract(payload).map(FieldValue::Int),
        ScalarKind::Uint => u64::extract(payload).map(FieldValue::Uint),
        ScalarKind::Float => f64::extract(payload).map(FieldValue::Float),
        ScalarKind::Bool => bool::extract(payload).map(FieldValue::Bool),
        ScalarKind::Byte => match payload {
            [byte] => Some(FieldValue::Byte(*byte)),
            _ => None,
        },
        ScalarKind::Str => Some(FieldValue::Str(payload)),
    }
}

fn error_suffix(payload: &[u8], position: usize) -> String {
    format!(
        "at column {}: '{}'",
        position + 1,
        String::from_utf8_lossy(payload)
    )
}
