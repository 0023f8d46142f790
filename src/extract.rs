//! Field extractor registry: turn one raw field payload into a typed value.
//!
//! Extractors never see quotes, escapes, or boundary whitespace; the
//! splitter has already decoded the payload in place. Implementing
//! [`Extract`] for a custom type plugs it into the typed conversion layer.

/// Parse a borrowed field payload into `Self`, or signal failure with
/// `None`. The lifetime allows zero-copy extraction of slices.
pub trait Extract<'a>: Sized {
    fn extract(field: &'a [u8]) -> Option<Self>;
}

macro_rules! extract_signed {
    ($($t:ty),*) => {$(
        impl<'a> Extract<'a> for $t {
            fn extract(field: &'a [u8]) -> Option<Self> {
                let (negative, digits) = match field.split_first() {
                    Some((&b'-', rest)) => (true, rest),
                    _ => (false, field),
                };
                if digits.is_empty() {
                    return None;
                }
                let mut value: $t = 0;
                for &byte in digits {
                    if !byte.is_ascii_digit() {
                        return None;
                    }
                    let digit = (byte - b'0') as $t;
                    value = value.checked_mul(10)?;
                    value = if negative {
                        value.checked_sub(digit)?
                    } else {
                        value.checked_add(digit)?
                    };
                }
                Some(value)
            }
        }
    )*};
}

macro_rules! extract_unsigned {
    ($($t:ty),*) => {$(
        impl<'a> Extract<'a> for $t {
            fn extract(field: &'a [u8]) -> Option<Self> {
                if field.is_empty() {
                    return None;
                }
                let mut value: $t = 0;
                for &byte in field {
                    if !byte.is_ascii_digit() {
                        return None;
                    }
                    value = value.checked_mul(10)?;
                    value = value.checked_add((byte - b'0') as $t)?;
                }
                Some(value)
            }
        }
    )*};
}

extract_signed!(i8, i16, i32, i64, i128, isize);
extract_unsigned!(u8, u16, u32, u64, u128, usize);

macro_rules! extract_float {
    ($($t:ty),*) => {$(
        impl<'a> Extract<'a> for $t {
            fn extract(field: &'a [u8]) -> Option<Self> {
                if field.is_empty() {
                    return None;
                }
                // Full-range parse; trailing garbage makes from_str fail.
                std::str::from_utf8(field).ok()?.parse::<$t>().ok()
            }
        }
    )*};
}

extract_float!(f32, f64);

impl<'a> Extract<'a> for bool {
    fn extract(field: &'a [u8]) -> Option<Self> {
        match field {
            b"1" | b"true" => Some(true),
            b"0" | b"false" => Some(false),
            _ => None,
        }
    }
}

impl<'a> Extract<'a> for char {
    fn extract(field: &'a [u8]) -> Option<Self> {
        match field {
            [byte] if byte.is_ascii() => Some(*byte as char),
            _ => None,
        }
    }
}

impl<'a> Extract<'a> for String {
    fn extract(field: &'a [u8]) -> Option<Self> {
        std::str::from_utf8(field).ok().map(str::to_owned)
    }
}

impl<'a> Extract<'a> for &'a str {
    fn extract(field: &'a [u8]) -> Option<Self> {
        std::str::from_utf8(field).ok()
    }
}

impl<'a> Extract<'a> for &'a [u8] {
    fn extract(field: &'a [u8]) -> Option<Self> {
        Some(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<'a, T: Extract<'a>>(s: &'a str) -> Option<T> {
        T::extract(s.as_bytes())
    }

    #[rstest::rstest]
    #[case("0", Some(0))]
    #[case("42", Some(42))]
    #[case("-42", Some(-42))]
    #[case("2147483647", Some(i32::MAX))]
    #[case("-2147483648", Some(i32::MIN))]
    #[case("2147483648", None)]
    #[case("-2147483649", None)]
    #[case("", None)]
    #[case("-", None)]
    #[case("1x", None)]
    #[case("1 ", None)]
    fn test_extract_i32(#[case] input: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse::<i32>(input), expected);
    }

    #[rstest::rstest]
    #[case("255", Some(255))]
    #[case("256", None)]
    #[case("-1", None)]
    fn test_extract_u8(#[case] input: &str, #[case] expected: Option<u8>) {
        assert_eq!(parse::<u8>(input), expected);
    }

    #[rstest::rstest]
    fn test_extract_i64_limits() {
        assert_eq!(parse::<i64>("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse::<i64>("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse::<i64>("9223372036854775808"), None);
    }

    #[rstest::rstest]
    #[case("2.5", Some(2.5))]
    #[case("-0.125", Some(-0.125))]
    #[case("1e3", Some(1000.0))]
    #[case("5", Some(5.0))]
    #[case("2.5x", None)]
    #[case("", None)]
    fn test_extract_f64(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse::<f64>(input), expected);
    }

    #[rstest::rstest]
    #[case("1", Some(true))]
    #[case("0", Some(false))]
    #[case("true", Some(true))]
    #[case("false", Some(false))]
    #[case("TRUE", None)]
    #[case("2", None)]
    #[case("", None)]
    fn test_extract_bool(#[case] input: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse::<bool>(input), expected);
    }

    #[rstest::rstest]
    fn test_extract_char() {
        assert_eq!(parse::<char>("a"), Some('a'));
        assert_eq!(parse::<char>("ab"), None);
        assert_eq!(parse::<char>(""), None);
    }

    #[rstest::rstest]
    fn test_extract_strings() {
        assert_eq!(parse::<String>("hello"), Some("hello".to_string()));
        assert_eq!(parse::<&str>("hello"), Some("hello"));
        assert_eq!(<&[u8]>::extract(b"\xff\xfe"), Some(&b"\xff\xfe"[..]));
        assert_eq!(parse::<String>(""), Some(String::new()));
        assert!(String::extract(b"\xff").is_none());
    }
}
