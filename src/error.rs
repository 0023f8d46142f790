use std::fmt;

/// Classification of everything that can go wrong while splitting,
/// converting, or driving a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be opened or the input source is unusable.
    SourceUnavailable,
    /// A record was requested after end of input.
    ReadPastEof,
    /// A zero-length delimiter was supplied.
    EmptyDelimiter,
    /// Content follows a closing quote before the next delimiter.
    MismatchedQuote,
    /// End of input inside a quoted field.
    UnterminatedQuote,
    /// End of input immediately after an escape byte.
    UnterminatedEscape,
    /// The multiline continuation count exceeded the configured limit.
    MultilineLimitReached,
    /// An extractor rejected a field payload.
    InvalidConversion,
    /// A validator predicate rejected an extracted value.
    ValidationFailed,
    /// A caller-supplied predicate in a composite chain returned false.
    FailedCheck,
    /// Input column count does not match the declared or mapped arity.
    ColumnCountMismatch,
    /// `use_fields` was called while the header row is configured away.
    HeaderIgnored,
    /// The header row contains a duplicated field name.
    DuplicateHeader,
    /// A `use_fields` name is not present in the header.
    UnknownField,
    /// The same name was given twice to `use_fields`.
    RepeatedField,
    /// An empty column mapping was supplied.
    EmptyMapping,
    /// A mapped column index is not below the column count.
    MappingOutOfRange,
    /// A multiline resume was attempted on a buffer shorter than the
    /// suspended cursor.
    InvalidResplit,
    /// The option set violates a construction-time constraint.
    Config,
}

/// Where in the input an error was observed. Lines and columns are 1-based,
/// `offset` is the byte offset of the record start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: u64,
    pub line: usize,
    pub column: usize,
}

/// How much detail the parser records when something fails.
///
/// Exactly one mode is active per parser; mixing is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Only the error kind is tracked. Cheapest, the default.
    #[default]
    Flag,
    /// A message decorated with the source label and line number is kept.
    Message,
    /// Kind, message, and input location are all recorded.
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// A bare error carrying the kind only, as recorded in flag mode.
    pub fn flagged(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: String::new(),
            location: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::SourceUnavailable, err.to_string())
    }
}

/// Interior error slot shared by splitter, converter, and parser. The
/// active mode decides how much of the `Error` gets populated.
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorState {
    mode: ErrorMode,
    error: Option<Error>,
}

impl ErrorState {
    pub(crate) fn new(mode: ErrorMode) -> Self {
        Self { mode, error: None }
    }

    pub(crate) fn is_clear(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.error = None;
    }

    pub(crate) fn get(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub(crate) fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub(crate) fn message(&self) -> &str {
        self.error.as_ref().map_or("", |e| e.message.as_str())
    }

    /// Record an error, building the message lazily so flag mode pays
    /// nothing for formatting.
    pub(crate) fn record(&mut self, kind: ErrorKind, message: impl FnOnce() -> String) {
        self.error = Some(match self.mode {
            ErrorMode::Flag => Error::flagged(kind),
            ErrorMode::Message | ErrorMode::Strict => Error::new(kind, message()),
        });
    }

    pub(crate) fn record_at(
        &mut self,
        kind: ErrorKind,
        message: impl FnOnce() -> String,
        location: Location,
    ) {
        self.record(kind, message);
        if self.mode == ErrorMode::Strict {
            if let Some(error) = self.error.as_mut() {
                error.location = Some(location);
            }
        }
    }
}
