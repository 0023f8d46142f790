//! Typed view over converted records: declare a parse list as a Rust type
//! (a tuple or a user aggregate) instead of building a [`RecordSpec`] by
//! hand.

use crate::record::{FieldValue, Record};
use crate::spec::{FieldSpec, RecordSpec};

/// One declared parse position. Implement this for a custom type to plug it
/// into tuple parsing.
pub trait FromField: Sized {
    fn field_spec() -> FieldSpec;
    fn from_value(value: &FieldValue<'_>) -> Option<Self>;
}

/// A whole declared parse list plus the construction of `Self` from the
/// converted values. Tuples of [`FromField`] types implement this; user
/// aggregates implement it directly.
///
/// # Examples
/// ```
/// use rowcut::{FieldSpec, FromRecord, Record, RecordSpec};
///
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// impl FromRecord for Point {
///     fn record_spec() -> RecordSpec {
///         RecordSpec::new([FieldSpec::int(), FieldSpec::int()])
///     }
///
///     fn from_record(record: &Record<'_>) -> Option<Self> {
///         Some(Point {
///             x: record.get(0)?.as_i64()?,
///             y: record.get(1)?.as_i64()?,
///         })
///     }
/// }
/// ```
pub trait FromRecord: Sized {
    fn record_spec() -> RecordSpec;
    fn from_record(record: &Record<'_>) -> Option<Self>;
}

/// Placeholder position: the input column is consumed and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Skip;

impl FromField for Skip {
    fn field_spec() -> FieldSpec {
        FieldSpec::Skip
    }

    fn from_value(_: &FieldValue<'_>) -> Option<Self> {
        Some(Skip)
    }
}

/// Variant position: try `A`, then `B`, in that order. Nest for more than
/// two alternatives; nested alternatives flatten into one declared list, so
/// `Or<i64, Or<f64, String>>` tries all three against the same field.
#[derive(Debug, Clone, PartialEq)]
pub enum Or<A, B> {
    First(A),
    Second(B),
}

impl<A: FromField, B: FromField> FromField for Or<A, B> {
    fn field_spec() -> FieldSpec {
        let mut alternatives = flatten(A::field_spec());
        alternatives.extend(flatten(B::field_spec()));
        FieldSpec::Variant(alternatives)
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        A::from_value(value)
            .map(Or::First)
            .or_else(|| B::from_value(value).map(Or::Second))
    }
}

fn flatten(spec: FieldSpec) -> Vec<FieldSpec> {
    match spec {
        FieldSpec::Variant(alternatives) => alternatives,
        other => vec![other],
    }
}

impl FromField for i64 {
    fn field_spec() -> FieldSpec {
        FieldSpec::int()
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        value.as_i64()
    }
}

macro_rules! from_field_narrow_int {
    ($($t:ty),*) => {$(
        impl FromField for $t {
            fn field_spec() -> FieldSpec {
                FieldSpec::int()
            }

            fn from_value(value: &FieldValue<'_>) -> Option<Self> {
                <$t>::try_from(value.as_i64()?).ok()
            }
        }
    )*};
}

from_field_narrow_int!(i8, i16, i32, isize);

impl FromField for u64 {
    fn field_spec() -> FieldSpec {
        FieldSpec::uint()
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        value.as_u64()
    }
}

macro_rules! from_field_narrow_uint {
    ($($t:ty),*) => {$(
        impl FromField for $t {
            fn field_spec() -> FieldSpec {
                FieldSpec::uint()
            }

            fn from_value(value: &FieldValue<'_>) -> Option<Self> {
                <$t>::try_from(value.as_u64()?).ok()
            }
        }
    )*};
}

from_field_narrow_uint!(u8, u16, u32, usize);

impl FromField for f64 {
    fn field_spec() -> FieldSpec {
        FieldSpec::float()
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        value.as_f64()
    }
}

impl FromField for f32 {
    fn field_spec() -> FieldSpec {
        FieldSpec::float()
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        value.as_f64().map(|v| v as f32)
    }
}

impl FromField for bool {
    fn field_spec() -> FieldSpec {
        FieldSpec::boolean()
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        value.as_bool()
    }
}

impl FromField for char {
    fn field_spec() -> FieldSpec {
        FieldSpec::byte()
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        let byte = value.as_byte()?;
        byte.is_ascii().then_some(byte as char)
    }
}

impl FromField for String {
    fn field_spec() -> FieldSpec {
        FieldSpec::string()
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FromField for Vec<u8> {
    fn field_spec() -> FieldSpec {
        FieldSpec::string()
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl<T: FromField> FromField for Option<T> {
    fn field_spec() -> FieldSpec {
        FieldSpec::optional(T::field_spec())
    }

    fn from_value(value: &FieldValue<'_>) -> Option<Self> {
        if value.is_absent() {
            return Some(None);
        }
        Some(T::from_value(value))
    }
}

macro_rules! impl_from_record_for_tuples {
    ($(($($name:ident $idx:tt),+))+) => {$(
        impl<$($name: FromField),+> FromRecord for ($($name,)+) {
            fn record_spec() -> RecordSpec {
                RecordSpec::new([$($name::field_spec()),+])
            }

            fn from_record(record: &Record<'_>) -> Option<Self> {
                Some(($($name::from_value(record.get($idx)?)?,)+))
            }
        }
    )+};
}

impl_from_record_for_tuples! {
    (A 0)
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
    (A 0, B 1, C 2, D 3, E 4)
    (A 0, B 1, C 2, D 3, E 4, F 5)
    (A 0, B 1, C 2, D 3, E 4, F 5, G 6)
    (A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7)
    (A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8)
    (A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9)
    (A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10)
    (A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ScalarKind;

    #[rstest::rstest]
    fn test_tuple_spec_shape() {
        let spec = <(i64, Skip, String)>::record_spec();
        assert_eq!(
            spec.fields(),
            &[
                FieldSpec::Scalar(ScalarKind::Int),
                FieldSpec::Skip,
                FieldSpec::Scalar(ScalarKind::Str),
            ]
        );
    }

    #[rstest::rstest]
    fn test_or_flattens_nested_alternatives() {
        let spec = Or::<i64, Or<f64, String>>::field_spec();
        assert_eq!(
            spec,
            FieldSpec::Variant(vec![
                FieldSpec::int(),
                FieldSpec::float(),
                FieldSpec::string(),
            ])
        );
    }

    #[rstest::rstest]
    fn test_or_from_value_prefers_first() {
        let value = FieldValue::Int(5);
        assert_eq!(
            Or::<i64, f64>::from_value(&value),
            Some(Or::First(5))
        );
        let value = FieldValue::Float(5.5);
        assert_eq!(
            Or::<i64, f64>::from_value(&value),
            Some(Or::Second(5.5))
        );
    }

    #[rstest::rstest]
    fn test_option_absorbs_absent() {
        assert_eq!(Option::<i64>::from_value(&FieldValue::Absent), Some(None));
        assert_eq!(
            Option::<i64>::from_value(&FieldValue::Int(2)),
            Some(Some(2))
        );
    }

    #[rstest::rstest]
    fn test_narrowing_integer() {
        assert_eq!(i32::from_value(&FieldValue::Int(7)), Some(7));
        assert_eq!(i32::from_value(&FieldValue::Int(i64::MAX)), None);
        assert_eq!(u8::from_value(&FieldValue::Uint(255)), Some(255));
        assert_eq!(u8::from_value(&FieldValue::Uint(256)), None);
    }

    #[rstest::rstest]
    fn test_char_requires_ascii() {
        assert_eq!(char::from_value(&FieldValue::Byte(b'z')), Some('z'));
        assert_eq!(char::from_value(&FieldValue::Byte(0xff)), None);
    }

    #[rstest::rstest]
    fn test_skip_accepts_anything() {
        assert_eq!(Skip::from_value(&FieldValue::Absent), Some(Skip));
        assert_eq!(Skip::from_value(&FieldValue::Int(1)), Some(Skip));
    }
}
