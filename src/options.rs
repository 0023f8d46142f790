use crate::error::{Error, ErrorMode};
use crate::matcher::ByteMatcher;

/// Parser construction options.
///
/// Built with chained setters and validated once when the parser is
/// created; an invalid combination is a configuration error, never a
/// per-record failure.
///
/// # Examples
/// ```
/// use rowcut::{ErrorMode, ParseOptions};
///
/// let opts = ParseOptions::new()
///     .with_quote(b'"')
///     .with_escape(b'\\')
///     .with_multiline()
///     .with_error_mode(ErrorMode::Message);
/// assert!(opts.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub quote: Option<u8>,
    pub escape: Vec<u8>,
    pub trim: Vec<u8>,
    pub trim_left: Vec<u8>,
    pub trim_right: Vec<u8>,
    pub multiline: bool,
    pub multiline_limit: usize,
    pub ignore_header: bool,
    pub ignore_empty: bool,
    pub error_mode: ErrorMode,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable quoting with the given quote byte; a doubled quote inside a
    /// quoted field escapes it.
    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Add an escape byte. May be called repeatedly to accept several.
    pub fn with_escape(mut self, escape: u8) -> Self {
        self.escape.push(escape);
        self
    }

    /// Add a byte trimmed on both field boundaries. Mutually exclusive with
    /// the sided trims.
    pub fn with_trim(mut self, byte: u8) -> Self {
        self.trim.push(byte);
        self
    }

    /// Add a byte trimmed at the start of a field.
    pub fn with_trim_left(mut self, byte: u8) -> Self {
        self.trim_left.push(byte);
        self
    }

    /// Add a byte trimmed at the end of a field.
    pub fn with_trim_right(mut self, byte: u8) -> Self {
        self.trim_right.push(byte);
        self
    }

    /// Allow records to span several physical lines, without a continuation
    /// bound. Requires quoting or escaping to be enabled.
    pub fn with_multiline(mut self) -> Self {
        self.multiline = true;
        self.multiline_limit = 0;
        self
    }

    /// Multiline with a safety bound: a limit of `n` allows exactly `n`
    /// continuation lines per record, and the `n + 1`-th attempt fails the
    /// record. A limit of `0` means unlimited.
    pub fn with_multiline_limit(mut self, limit: usize) -> Self {
        self.multiline = true;
        self.multiline_limit = limit;
        self
    }

    /// Read and discard the first record; `use_fields` becomes an error.
    pub fn with_ignore_header(mut self) -> Self {
        self.ignore_header = true;
        self
    }

    /// Skip zero-length physical lines instead of yielding empty records.
    pub fn with_ignore_empty(mut self) -> Self {
        self.ignore_empty = true;
        self
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Check the mutual-exclusion constraints. Called by the parser
    /// constructors; exposed for tests and eager validation.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.trim.is_empty() && (!self.trim_left.is_empty() || !self.trim_right.is_empty()) {
            return Err(Error::config("ambiguous trim setup"));
        }

        let quote = match self.quote {
            Some(q) => ByteMatcher::from_bytes(&[q]),
            None => ByteMatcher::disabled(),
        };
        let escape = ByteMatcher::from_bytes(&self.escape);
        let (trim_left, trim_right) = self.trim_matchers();

        if quote.intersects(&escape)
            || quote.intersects(&trim_left)
            || quote.intersects(&trim_right)
            || escape.intersects(&trim_left)
            || escape.intersects(&trim_right)
        {
            return Err(Error::config(
                "cannot have the same match character in multiple matchers",
            ));
        }

        if self.multiline && self.quote.is_none() && self.escape.is_empty() {
            return Err(Error::config(
                "to enable multiline either quote or escape needs to be enabled",
            ));
        }

        Ok(())
    }

    fn trim_matchers(&self) -> (ByteMatcher, ByteMatcher) {
        if !self.trim.is_empty() {
            let both = ByteMatcher::from_bytes(&self.trim);
            (both.clone(), both)
        } else {
            (
                ByteMatcher::from_bytes(&self.trim_left),
                ByteMatcher::from_bytes(&self.trim_right),
            )
        }
    }

    pub(crate) fn splitter_config(&self) -> SplitterConfig {
        let (trim_left, trim_right) = self.trim_matchers();
        SplitterConfig {
            quote: self.quote,
            escape: ByteMatcher::from_bytes(&self.escape),
            trim_left,
            trim_right,
            multiline: self.multiline,
        }
    }
}

/// The splitter's view of the options: matchers resolved once per parser so
/// disabled features cost a single branch in the scan loops.
#[derive(Debug, Clone)]
pub(crate) struct SplitterConfig {
    pub(crate) quote: Option<u8>,
    pub(crate) escape: ByteMatcher,
    pub(crate) trim_left: ByteMatcher,
    pub(crate) trim_right: ByteMatcher,
    pub(crate) multiline: bool,
}

impl SplitterConfig {
    #[inline]
    pub(crate) fn is_quote(&self, byte: u8) -> bool {
        self.quote == Some(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[rstest::rstest]
    fn test_default_validates() {
        assert!(ParseOptions::new().validate().is_ok());
    }

    #[rstest::rstest]
    fn test_quote_escape_overlap_rejected() {
        let err = ParseOptions::new()
            .with_quote(b'"')
            .with_escape(b'"')
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("multiple matchers"));
    }

    #[rstest::rstest]
    fn test_trim_overlap_rejected() {
        let err = ParseOptions::new()
            .with_escape(b'\\')
            .with_trim_left(b'\\')
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[rstest::rstest]
    fn test_ambiguous_trim_rejected() {
        let err = ParseOptions::new()
            .with_trim(b' ')
            .with_trim_right(b'\t')
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("ambiguous trim setup"));
    }

    #[rstest::rstest]
    fn test_multiline_needs_quote_or_escape() {
        let err = ParseOptions::new().with_multiline().validate().unwrap_err();
        assert!(err.to_string().contains("multiline"));
        assert!(ParseOptions::new()
            .with_quote(b'"')
            .with_multiline()
            .validate()
            .is_ok());
        assert!(ParseOptions::new()
            .with_escape(b'\\')
            .with_multiline()
            .validate()
            .is_ok());
    }

    #[rstest::rstest]
    fn test_symmetric_trim_fills_both_sides() {
        let config = ParseOptions::new().with_trim(b' ').splitter_config();
        assert!(config.trim_left.matches(b' '));
        assert!(config.trim_right.matches(b' '));
    }
}
