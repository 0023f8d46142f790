//! Record acquisition: physical-line reads, end-of-line normalization,
//! multiline continuation, and the current/next double buffer that gives
//! the facade one record of look-ahead.

mod source;

pub use source::{FileSource, MemorySource, Source};

use log::{debug, trace};

use crate::convert::Converter;
use crate::delimiter::Delimiter;
use crate::matcher::ByteMatcher;
use crate::options::ParseOptions;
use crate::record::Record;
use crate::spec::RecordSpec;

#[derive(Debug)]
pub(crate) struct Reader<S> {
    source: S,
    delimiter: Delimiter,
    /// The record currently visible to the caller.
    buffer: Vec<u8>,
    /// The staged record being assembled ahead of time.
    next_buffer: Vec<u8>,
    /// Scratch for continuation reads.
    helper: Vec<u8>,
    converter: Converter,
    next_converter: Converter,
    escape: ByteMatcher,
    escaped_multiline: bool,
    quoted_multiline: bool,
    ignore_empty: bool,
    /// 0 means unlimited; otherwise the exact number of continuation lines
    /// allowed per record.
    multiline_limit: usize,
    crlf: bool,
    line_number: usize,
    /// Total bytes consumed from the source.
    offset: u64,
    /// Byte offset where the staged record starts.
    chars_read: u64,
}

impl<S: Source> Reader<S> {
    pub(crate) fn new(source: S, delimiter: Delimiter, options: &ParseOptions) -> Self {
        let config = options.splitter_config();
        let mode = options.error_mode;
        Self {
            source,
            delimiter,
            buffer: Vec::new(),
            next_buffer: Vec::new(),
            helper: Vec::new(),
            converter: Converter::new(config.clone(), mode),
            next_converter: Converter::new(config, mode),
            escape: ByteMatcher::from_bytes(&options.escape),
            escaped_multiline: options.multiline && !options.escape.is_empty(),
            quoted_multiline: options.multiline && options.quote.is_some(),
            ignore_empty: options.ignore_empty,
            multiline_limit: options.multiline_limit,
            crlf: false,
            line_number: 0,
            offset: 0,
            chars_read: 0,
        }
    }

    pub(crate) fn line_number(&self) -> usize {
        self.line_number
    }

    pub(crate) fn position(&self) -> u64 {
        self.chars_read
    }

    /// Raw bytes of the staged record; the facade retains the first one as
    /// the raw header.
    pub(crate) fn staged_bytes(&self) -> &[u8] {
        &self.next_buffer
    }

    pub(crate) fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Convert the current record's retained split data against `spec`.
    pub(crate) fn convert_current<'a>(&'a mut self, spec: &RecordSpec) -> Option<Record<'a>> {
        self.converter.convert(&self.buffer, spec)
    }

    pub(crate) fn set_column_mapping(&mut self, positions: Vec<usize>, columns: usize) {
        self.converter
            .set_column_mapping(positions.clone(), columns);
        self.next_converter.set_column_mapping(positions, columns);
    }

    /// Stage the next physical record, looping over empty lines when
    /// configured. Returns false at end of input.
    pub(crate) fn read_next(&mut self) -> bool {
        self.next_converter.clear_error();
        loop {
            self.line_number += 1;
            self.chars_read = self.offset;

            let read = self.source.fill_line(&mut self.next_buffer).unwrap_or(0);
            if read == 0 {
                trace!("end of input at line {}", self.line_number);
                return false;
            }
            self.offset += read as u64;
            strip_eol(&mut self.next_buffer, &mut self.crlf);

            if !self.ignore_empty || !self.next_buffer.is_empty() {
                break;
            }
        }
        true
    }

    /// Apply multiline continuation to the staged record and split it.
    pub(crate) fn parse(&mut self) {
        let mut limit = 0usize;

        if self.escaped_multiline {
            while self.escaped_eol() {
                if self.multiline_limit_reached(&mut limit) {
                    return;
                }
                if !self.append_next_line() {
                    self.next_converter.record_unterminated_escape();
                    return;
                }
            }
        }

        self.next_converter
            .split(&mut self.next_buffer, &self.delimiter);

        if self.quoted_multiline {
            while self.next_converter.unterminated_quote() {
                // The suspended field was compacted in place; drop the
                // shifted-out tail before appending the continuation.
                let shifted = self.next_converter.size_shifted();
                let len = self.next_buffer.len();
                self.next_buffer.truncate(len - shifted);

                if self.multiline_limit_reached(&mut limit) {
                    return;
                }
                if !self.append_next_line() {
                    self.next_converter.record_unterminated_quote();
                    return;
                }

                if self.escaped_multiline {
                    while self.escaped_eol() {
                        if self.multiline_limit_reached(&mut limit) {
                            return;
                        }
                        if !self.append_next_line() {
                            self.next_converter.record_unterminated_escape();
                            return;
                        }
                    }
                }

                self.next_converter
                    .resplit(&mut self.next_buffer, &self.delimiter);
            }
        }
    }

    /// Swap the staged record in as current. The caller's view of the old
    /// record ends here.
    pub(crate) fn update(&mut self) {
        std::mem::swap(&mut self.buffer, &mut self.next_buffer);
        std::mem::swap(&mut self.converter, &mut self.next_converter);
    }

    fn multiline_limit_reached(&mut self, limit: &mut usize) -> bool {
        if self.multiline_limit > 0 {
            let current = *limit;
            *limit += 1;
            if current >= self.multiline_limit {
                debug!(
                    "multiline limit of {} reached at line {}",
                    self.multiline_limit, self.line_number
                );
                self.next_converter.record_multiline_limit_reached();
                return true;
            }
        }
        false
    }

    /// True when the staged record ends in a live escape: an odd run of
    /// trailing escape bytes.
    fn escaped_eol(&self) -> bool {
        let trailing = self
            .next_buffer
            .iter()
            .rev()
            .take_while(|&&b| self.escape.matches(b))
            .count();
        trailing % 2 == 1
    }

    /// Re-insert the stripped terminator, then append the next physical
    /// line. Returns false at end of input.
    fn append_next_line(&mut self) -> bool {
        if self.crlf {
            self.next_buffer.extend_from_slice(b"\r\n");
        } else {
            self.next_buffer.push(b'\n');
        }

        self.chars_read = self.offset;
        let read = self.source.fill_line(&mut self.helper).unwrap_or(0);
        if read == 0 {
            return false;
        }
        self.offset += read as u64;
        self.line_number += 1;

        strip_eol(&mut self.helper, &mut self.crlf);
        self.next_buffer.extend_from_slice(&self.helper);
        true
    }
}

/// Strip one trailing `\n` (and a preceding `\r`), latching which
/// terminator the line had.
fn strip_eol(buf: &mut Vec<u8>, crlf: &mut bool) {
    if buf.last() != Some(&b'\n') {
        *crlf = false;
        return;
    }
    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
        *crlf = true;
    } else {
        *crlf = false;
    }
}
