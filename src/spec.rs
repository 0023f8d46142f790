//! Data-driven parse descriptions: what each column position should become
//! and which constraints the extracted value must satisfy.

use std::cmp::Ordering;

use crate::record::FieldValue;

/// Scalar target of a parse position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Signed 64-bit integer, overflow-checked.
    Int,
    /// Unsigned 64-bit integer, overflow-checked.
    Uint,
    /// 64-bit float; trailing garbage rejects the field.
    Float,
    /// `0`/`1`/`true`/`false`, no case folding.
    Bool,
    /// Exactly one raw byte.
    Byte,
    /// The verbatim payload slice; never fails.
    Str,
}

/// Declared shape of one parse position.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// Discard the input column at this position.
    Skip,
    Scalar(ScalarKind),
    /// Attempt the inner spec; failure becomes `Absent` instead of an error.
    Optional(Box<FieldSpec>),
    /// Attempt alternatives in declared order; the first success wins.
    Variant(Vec<FieldSpec>),
    /// Extract the inner spec, then run the validator on the value.
    Checked(Box<FieldSpec>, Check),
}

impl FieldSpec {
    pub fn int() -> Self {
        FieldSpec::Scalar(ScalarKind::Int)
    }

    pub fn uint() -> Self {
        FieldSpec::Scalar(ScalarKind::Uint)
    }

    pub fn float() -> Self {
        FieldSpec::Scalar(ScalarKind::Float)
    }

    pub fn boolean() -> Self {
        FieldSpec::Scalar(ScalarKind::Bool)
    }

    pub fn byte() -> Self {
        FieldSpec::Scalar(ScalarKind::Byte)
    }

    pub fn string() -> Self {
        FieldSpec::Scalar(ScalarKind::Str)
    }

    pub fn optional(inner: FieldSpec) -> Self {
        FieldSpec::Optional(Box::new(inner))
    }

    pub fn variant(alternatives: impl IntoIterator<Item = FieldSpec>) -> Self {
        FieldSpec::Variant(alternatives.into_iter().collect())
    }

    pub fn checked(inner: FieldSpec, check: Check) -> Self {
        FieldSpec::Checked(Box::new(inner), check)
    }
}

/// Ordered parse list for a whole record; one entry per declared position.
///
/// # Examples
/// ```
/// use rowcut::{FieldSpec, RecordSpec};
///
/// let spec = RecordSpec::new([FieldSpec::int(), FieldSpec::Skip, FieldSpec::string()]);
/// assert_eq!(spec.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSpec {
    fields: Vec<FieldSpec>,
}

impl RecordSpec {
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

impl From<Vec<FieldSpec>> for RecordSpec {
    fn from(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }
}

/// Constant operand for the built-in validators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldConst {
    Int(i64),
    Uint(u64),
    Float(f64),
    Byte(u8),
    Str(&'static str),
}

impl From<i64> for FieldConst {
    fn from(v: i64) -> Self {
        FieldConst::Int(v)
    }
}

impl From<u64> for FieldConst {
    fn from(v: u64) -> Self {
        FieldConst::Uint(v)
    }
}

impl From<f64> for FieldConst {
    fn from(v: f64) -> Self {
        FieldConst::Float(v)
    }
}

impl From<&'static str> for FieldConst {
    fn from(v: &'static str) -> Self {
        FieldConst::Str(v)
    }
}

impl FieldConst {
    /// Ordering between an extracted value and the constant; `None` when the
    /// kinds are incomparable, which fails the enclosing check.
    fn compare(&self, value: &FieldValue<'_>) -> Option<Ordering> {
        match (value, self) {
            (FieldValue::Float(_), _)
            | (_, FieldConst::Float(_))
            | (FieldValue::Uint(_), FieldConst::Int(_))
            | (FieldValue::Int(_), FieldConst::Uint(_)) => {
                let lhs = value.as_f64()?;
                let rhs = match self {
                    FieldConst::Int(v) => *v as f64,
                    FieldConst::Uint(v) => *v as f64,
                    FieldConst::Float(v) => *v,
                    _ => return None,
                };
                lhs.partial_cmp(&rhs)
            }
            (FieldValue::Int(lhs), FieldConst::Int(rhs)) => Some(lhs.cmp(rhs)),
            (FieldValue::Uint(lhs), FieldConst::Uint(rhs)) => Some(lhs.cmp(rhs)),
            (FieldValue::Byte(lhs), FieldConst::Byte(rhs)) => Some(lhs.cmp(rhs)),
            (FieldValue::Str(lhs), FieldConst::Str(rhs)) => {
                Some(<[u8] as Ord>::cmp(lhs, rhs.as_bytes()))
            }
            _ => None,
        }
    }

    fn equals(&self, value: &FieldValue<'_>) -> bool {
        self.compare(value) == Some(Ordering::Equal)
    }
}

/// Validation predicate attached to a parse position.
///
/// # Examples
/// ```
/// use rowcut::{Check, FieldConst, FieldSpec};
///
/// let shirt = FieldSpec::checked(
///     FieldSpec::byte(),
///     Check::none_except([FieldConst::Byte(b'S'), FieldConst::Byte(b'M'), FieldConst::Byte(b'L')]),
/// );
/// let _ = shirt;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// Every listed constant is rejected, anything else passes.
    AllExcept(Vec<FieldConst>),
    /// Only the listed constants pass.
    NoneExcept(Vec<FieldConst>),
    GreaterThan(FieldConst),
    GreaterOrEqual(FieldConst),
    LessThan(FieldConst),
    LessOrEqual(FieldConst),
    /// Inclusive `[lo, hi]`.
    InRange(FieldConst, FieldConst),
    /// value < lo or value > hi.
    OutOfRange(FieldConst, FieldConst),
    /// Non-empty payload; only meaningful for string positions.
    NonEmpty,
    /// Caller-supplied predicate with its own failure message.
    Predicate {
        test: fn(&FieldValue<'_>) -> bool,
        message: &'static str,
    },
}

impl Check {
    pub fn all_except(values: impl IntoIterator<Item = FieldConst>) -> Self {
        Check::AllExcept(values.into_iter().collect())
    }

    pub fn none_except(values: impl IntoIterator<Item = FieldConst>) -> Self {
        Check::NoneExcept(values.into_iter().collect())
    }

    pub fn in_range(lo: impl Into<FieldConst>, hi: impl Into<FieldConst>) -> Self {
        Check::InRange(lo.into(), hi.into())
    }

    pub fn out_of_range(lo: impl Into<FieldConst>, hi: impl Into<FieldConst>) -> Self {
        Check::OutOfRange(lo.into(), hi.into())
    }

    pub fn greater_than(v: impl Into<FieldConst>) -> Self {
        Check::GreaterThan(v.into())
    }

    pub fn greater_or_equal(v: impl Into<FieldConst>) -> Self {
        Check::GreaterOrEqual(v.into())
    }

    pub fn less_than(v: impl Into<FieldConst>) -> Self {
        Check::LessThan(v.into())
    }

    pub fn less_or_equal(v: impl Into<FieldConst>) -> Self {
        Check::LessOrEqual(v.into())
    }

    pub fn predicate(test: fn(&FieldValue<'_>) -> bool, message: &'static str) -> Self {
        Check::Predicate { test, message }
    }

    pub(crate) fn is_valid(&self, value: &FieldValue<'_>) -> bool {
        match self {
            Check::AllExcept(excluded) => excluded.iter().all(|c| !c.equals(value)),
            Check::NoneExcept(allowed) => allowed.iter().any(|c| c.equals(value)),
            Check::GreaterThan(c) => c.compare(value) == Some(Ordering::Greater),
            Check::GreaterOrEqual(c) => {
                matches!(c.compare(value), Some(Ordering::Greater | Ordering::Equal))
            }
            Check::LessThan(c) => c.compare(value) == Some(Ordering::Less),
            Check::LessOrEqual(c) => {
                matches!(c.compare(value), Some(Ordering::Less | Ordering::Equal))
            }
            Check::InRange(lo, hi) => {
                matches!(lo.compare(value), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(hi.compare(value), Some(Ordering::Less | Ordering::Equal))
            }
            Check::OutOfRange(lo, hi) => {
                lo.compare(value) == Some(Ordering::Less)
                    || hi.compare(value) == Some(Ordering::Greater)
            }
            Check::NonEmpty => value.as_bytes().is_some_and(|b| !b.is_empty()),
            Check::Predicate { test, .. } => test(value),
        }
    }

    pub(crate) fn message(&self) -> &str {
        match self {
            Check::AllExcept(_) | Check::NoneExcept(_) => "value excluded",
            Check::NonEmpty => "empty field",
            Check::Predicate { message, .. } => message,
            _ => "validation error",
        }
    }
}
