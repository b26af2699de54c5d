//! Bound values and their declared kinds.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Opaque handles
// =============================================================================

/// Any value bound through the generic object path.
///
/// Blanket-implemented for every `Display + Debug + Send + Sync` type.
pub trait SqlObject: fmt::Display + fmt::Debug + Send + Sync {
    /// Rust type name, used for type hints.
    fn type_name(&self) -> &'static str;
}

impl<T: fmt::Display + fmt::Debug + Send + Sync> SqlObject for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A Blob, Clob or NClob whose length can be queried.
pub trait LargeObject {
    type Error: fmt::Display;

    fn length(&self) -> Result<u64, Self::Error>;
}

// =============================================================================
// Decimal
// =============================================================================

/// Arbitrary-precision decimal kept in its canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError(String);

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a decimal number", self.0)
    }
}

impl std::error::Error for ParseDecimalError {}

impl Decimal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Accepts `[+-]digits[.digits][(e|E)[+-]digits]` with at least one mantissa digit.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(text.to_string());
        let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
            None => (unsigned, None),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int_part.len() + frac_part.len() == 0 || !all_digits(int_part) || !all_digits(frac_part)
        {
            return Err(err());
        }
        if let Some(exp) = exponent {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !all_digits(digits) {
                return Err(err());
            }
        }
        Ok(Decimal(text.to_string()))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Values and kinds
// =============================================================================

/// A value bound to a statement parameter.
#[derive(Debug)]
pub enum SqlValue {
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Url(String),
    Other(Box<dyn SqlObject>),
}

impl SqlValue {
    pub fn other(value: impl SqlObject + 'static) -> Self {
        SqlValue::Other(Box::new(value))
    }

    /// Name of the variant, for diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "Null",
            SqlValue::Bool(_) => "Bool",
            SqlValue::TinyInt(_) => "TinyInt",
            SqlValue::SmallInt(_) => "SmallInt",
            SqlValue::Int(_) => "Int",
            SqlValue::BigInt(_) => "BigInt",
            SqlValue::Float(_) => "Float",
            SqlValue::Double(_) => "Double",
            SqlValue::Decimal(_) => "Decimal",
            SqlValue::Text(_) => "Text",
            SqlValue::Bytes(_) => "Bytes",
            SqlValue::Date(_) => "Date",
            SqlValue::Time(_) => "Time",
            SqlValue::Timestamp(_) => "Timestamp",
            SqlValue::Url(_) => "Url",
            SqlValue::Other(_) => "Other",
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::BigInt(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Double(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Time,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Ascii,
    Binary,
    Unicode,
    Character,
    NCharacter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobKind {
    Blob,
    Clob,
    NClob,
}

impl LobKind {
    pub fn name(self) -> &'static str {
        match self {
            LobKind::Blob => "Blob",
            LobKind::Clob => "Clob",
            LobKind::NClob => "NClob",
        }
    }
}

/// The kind a bind operation declares for its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Text,
    NText,
    Temporal(TemporalKind),
    Boolean,
    Numeric(NumericKind),
    Bytes,
    Url,
    Stream(StreamKind),
    Lob(LobKind),
    Array,
    Ref,
    RowId,
    SqlXml,
    /// Generic object path; rendering follows the value itself.
    Object,
}
