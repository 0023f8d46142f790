use std::fmt;

use smol_str::SmolStr;

use crate::error::{Error, ErrorKind};

/// Column separator: a single byte or a multi-byte ASCII run, always matched
/// as a literal sequence.
///
/// # Examples
/// ```
/// use rowcut::Delimiter;
///
/// let comma = Delimiter::default();
/// assert_eq!(comma.as_bytes(), b",");
///
/// let arrow = Delimiter::new("->").unwrap();
/// assert_eq!(arrow.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    run: SmolStr,
}

impl Delimiter {
    /// Build a delimiter from a literal run. Empty runs are rejected.
    pub fn new(run: impl AsRef<str>) -> Result<Self, Error> {
        let run = run.as_ref();
        if run.is_empty() {
            return Err(Error::new(ErrorKind::EmptyDelimiter, "empty delimiter"));
        }
        Ok(Self {
            run: SmolStr::new(run),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.run.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.run.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// True when `buf[pos..]` begins with the delimiter run.
    #[inline]
    pub(crate) fn matches_at(&self, buf: &[u8], pos: usize) -> bool {
        let run = self.run.as_bytes();
        if run.len() == 1 {
            buf.get(pos) == Some(&run[0])
        } else {
            buf[pos..].starts_with(run)
        }
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self {
            run: SmolStr::new_static(","),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_default_is_comma() {
        let delim = Delimiter::default();
        assert_eq!(delim.as_bytes(), b",");
        assert_eq!(delim.len(), 1);
    }

    #[rstest::rstest]
    fn test_empty_rejected() {
        let err = Delimiter::new("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyDelimiter);
    }

    #[rstest::rstest]
    #[case("a,b", 1, true)]
    #[case("a,b", 0, false)]
    #[case("a,b", 3, false)]
    fn test_single_byte_match(#[case] buf: &str, #[case] pos: usize, #[case] expected: bool) {
        let delim = Delimiter::default();
        assert_eq!(delim.matches_at(buf.as_bytes(), pos), expected);
    }

    #[rstest::rstest]
    fn test_multi_byte_match() {
        let delim = Delimiter::new("::").unwrap();
        let buf = b"a::b:c";
        assert!(delim.matches_at(buf, 1));
        assert!(!delim.matches_at(buf, 4));
        assert!(!delim.matches_at(buf, 5));
    }
}
