//! Resumable record splitter: slices one mutable record buffer into field
//! ranges under the configured quote, escape, and trim rules.
//!
//! Decoding is in place: removing an escape byte or collapsing a doubled
//! quote shifts the remaining payload leftward within the same buffer, so
//! every emitted range points at contiguous decoded bytes. A running shift
//! counter tracks how far the decoded end lags the raw cursor.

use crate::delimiter::Delimiter;
use crate::error::{ErrorKind, ErrorMode, ErrorState};
use crate::options::SplitterConfig;
use crate::record::{FieldRange, RangeVec};

#[derive(Debug, Clone)]
pub(crate) struct Splitter {
    config: SplitterConfig,
    error: ErrorState,
    ranges: RangeVec,
    unterminated_quote: bool,
    /// Bytes elided in place for the field currently being built.
    shift: usize,
    done: bool,
    resplitting: bool,
    begin: usize,
    curr: usize,
    end: usize,
}

impl Splitter {
    pub(crate) fn new(config: SplitterConfig, mode: ErrorMode) -> Self {
        Self {
            config,
            error: ErrorState::new(mode),
            ranges: RangeVec::new(),
            unterminated_quote: false,
            shift: 0,
            done: true,
            resplitting: false,
            begin: 0,
            curr: 0,
            end: 0,
        }
    }

    pub(crate) fn valid(&self) -> bool {
        self.error.is_clear()
    }

    pub(crate) fn error(&self) -> &ErrorState {
        &self.error
    }

    pub(crate) fn unterminated_quote(&self) -> bool {
        self.unterminated_quote
    }

    /// How many bytes the decoded end of the suspended field lags the raw
    /// cursor; the reader subtracts this before appending a continuation.
    pub(crate) fn size_shifted(&self) -> usize {
        self.shift
    }

    pub(crate) fn ranges(&self) -> &[FieldRange] {
        &self.ranges
    }

    /// Drop all per-record state. Used by the converter for records it does
    /// not hand to the state machine at all.
    pub(crate) fn reset(&mut self) {
        self.ranges.clear();
        self.clear_error();
    }

    /// Split a whole record from the start of `buf`.
    pub(crate) fn split(&mut self, buf: &mut [u8], delim: &Delimiter) {
        self.ranges.clear();
        self.begin = 0;
        self.resplitting = false;
        self.split_impl(buf, delim);
    }

    /// Continue a suspended split against an extended buffer. The bytes up
    /// to the suspension cursor must be unchanged; already-emitted fields
    /// are not reparsed.
    pub(crate) fn resplit(&mut self, buf: &mut [u8], delim: &Delimiter) {
        if self.config.quote.is_none()
            || !self.config.multiline
            || self.ranges.is_empty()
            || !self.unterminated_quote
        {
            self.record_invalid_resplit();
            return;
        }

        if buf.len() < self.curr {
            self.record_invalid_resplit();
            return;
        }

        // The suspended field's placeholder is rebuilt by the resumed scan.
        self.ranges.pop();
        self.end = self.curr;
        self.resplitting = true;
        self.split_impl(buf, delim);
    }

    fn split_impl(&mut self, buf: &mut [u8], delim: &Delimiter) {
        self.clear_error();

        if !self.resplitting && self.config.trim_left.enabled() {
            while self.begin < buf.len() && self.config.trim_left.matches(buf[self.begin]) {
                self.begin += 1;
            }
        }

        self.done = false;
        while !self.done {
            self.read(buf, delim);
        }
    }

    /// Read one field starting at `begin`, dispatching on an opening quote.
    fn read(&mut self, buf: &mut [u8], delim: &Delimiter) {
        self.shift = 0;

        if self.config.quote.is_some() {
            if self.config.multiline && self.resplitting {
                self.resplitting = false;
                self.read_quoted(buf, delim);
                return;
            }
            if self.begin < buf.len() && self.config.is_quote(buf[self.begin]) {
                // The field content begins after the opening quote.
                self.begin += 1;
                self.curr = self.begin;
                self.end = self.begin;
                self.read_quoted(buf, delim);
                return;
            }
        }

        self.curr = self.begin;
        self.end = self.begin;
        self.read_normal(buf, delim);
    }

    fn read_normal(&mut self, buf: &mut [u8], delim: &Delimiter) {
        loop {
            let (width, is_delim) = self.match_delimiter(buf, self.end, delim);

            if is_delim {
                self.shift_push_and_start_next(buf, width);
                break;
            }
            if width == 0 {
                // End of buffer.
                self.shift_and_push(buf);
                self.done = true;
                break;
            }
            self.end += width;
        }
    }

    fn read_quoted(&mut self, buf: &mut [u8], delim: &Delimiter) {
        loop {
            if self.end == buf.len() {
                // Quote still open at end of buffer: suspend so a multiline
                // continuation can pick up exactly here.
                self.shift_and_set_current(buf);
                self.record_unterminated_quote();
                self.ranges.push((0, self.begin));
                self.done = true;
                break;
            }

            let byte = buf[self.end];
            if !self.config.is_quote(byte) {
                if self.config.escape.enabled() && self.config.escape.matches(byte) {
                    if self.end + 1 == buf.len() {
                        self.record_unterminated_escape();
                        self.done = true;
                        break;
                    }
                    self.shift_and_jump_escape(buf);
                    self.end += 1;
                    continue;
                }
                self.end += 1;
                continue;
            }

            // Closing quote candidate.
            let (width, is_delim) = self.match_delimiter(buf, self.end + 1, delim);

            if is_delim {
                self.shift_push_and_start_next(buf, width + 1);
                break;
            }

            if self.end + 1 < buf.len() && self.config.is_quote(buf[self.end + 1]) {
                // Doubled quote: keep one, elide the other.
                self.shift_and_jump_escape(buf);
                self.end += 1;
                continue;
            }

            if width == 0 {
                self.shift_and_push(buf);
            } else {
                self.record_mismatched_quote(self.end);
                self.ranges.push((0, self.begin));
            }
            self.done = true;
            break;
        }
    }

    /// Look at `begin` for a field boundary. Returns `(width, true)` when a
    /// delimiter (plus surrounding trim bytes) spans `width` bytes,
    /// `(0, false)` at end of buffer, and `(n, false)` when `n` bytes of
    /// content should be consumed instead.
    fn match_delimiter(&mut self, buf: &mut [u8], begin: usize, delim: &Delimiter) -> (usize, bool) {
        let mut end = begin;

        if self.config.trim_right.enabled() {
            while end < buf.len() && self.config.trim_right.matches(buf[end]) {
                end += 1;
            }
        }

        if end == buf.len() {
            // Just spacing up to the end of the buffer.
            return (0, false);
        }

        if !delim.matches_at(buf, end) {
            self.shift_if_escaped(buf, end);
            return (end - begin + 1, false);
        }

        end += delim.len();

        if self.config.trim_left.enabled() {
            while end < buf.len() && self.config.trim_left.matches(buf[end]) {
                end += 1;
            }
        }

        (end - begin, true)
    }

    fn shift_if_escaped(&mut self, buf: &mut [u8], pos: usize) {
        if self.config.escape.enabled() && self.config.escape.matches(buf[pos]) {
            if pos + 1 == buf.len() {
                self.record_unterminated_escape();
                self.done = true;
                return;
            }
            self.shift_and_jump_escape(buf);
        }
    }

    /// Compact the pending tail so decoded bytes are contiguous at `curr`,
    /// then account for one more elided byte and step past it.
    fn shift_and_jump_escape(&mut self, buf: &mut [u8]) {
        self.shift_and_set_current(buf);
        self.shift += 1;
        self.end += 1;
    }

    fn shift_push_and_start_next(&mut self, buf: &mut [u8], width: usize) {
        self.shift_and_push(buf);
        self.begin = self.end + width;
    }

    fn shift_and_push(&mut self, buf: &mut [u8]) {
        self.shift_and_set_current(buf);
        self.ranges.push((self.begin, self.curr));
    }

    fn shift_and_set_current(&mut self, buf: &mut [u8]) {
        if self.shift > 0 {
            buf.copy_within(self.curr + self.shift..self.end, self.curr);
            self.curr = self.end - self.shift;
            return;
        }
        self.curr = self.end;
    }

    fn clear_error(&mut self) {
        self.error.clear();
        self.unterminated_quote = false;
    }

    fn record_mismatched_quote(&mut self, pos: usize) {
        self.error.record(ErrorKind::MismatchedQuote, || {
            format!("mismatched quote at position: {pos}")
        });
    }

    pub(crate) fn record_unterminated_escape(&mut self) {
        self.error.record(ErrorKind::UnterminatedEscape, || {
            "unterminated escape at the end of the line".to_string()
        });
    }

    pub(crate) fn record_unterminated_quote(&mut self) {
        self.unterminated_quote = true;
        self.error
            .record(ErrorKind::UnterminatedQuote, || "unterminated quote".to_string());
    }

    fn record_invalid_resplit(&mut self) {
        self.unterminated_quote = false;
        self.error.record(ErrorKind::InvalidResplit, || {
            "invalid resplit, new line must be longer than the end of the last slice".to_string()
        });
    }
}
