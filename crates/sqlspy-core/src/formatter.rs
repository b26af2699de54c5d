//! Rendering of bound values as literal SQL fragments.
//!
//! | kind | rendering |
//! |---|---|
//! | NULL | `NULL` |
//! | text | `'O''Brien'` |
//! | temporal | `'01/31/2024 13:45:00.250'` |
//! | boolean | `true` / `false` |
//! | numeric | `42`, `-1.5`, `NaN` |
//! | streams, LOBs, opaque handles | `<Reader of length 120>`, `<Blob of size 4>`, `<Array>` |
//!
//! Every function here is pure. Callers decide what to do with a
//! [`FormatError`]; the statement proxy falls back to [`generic_text`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::{self, Write};

use crate::value::{LargeObject, LobKind, NumericKind, SqlValue, StreamKind, TemporalKind, ValueKind};

/// `MM/dd/yyyy HH:mm:ss.SSS`
pub const TEMPORAL_PATTERN: &str = "%m/%d/%Y %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The value's `Display` implementation returned an error.
    Display { type_name: &'static str },
    /// The declared kind cannot render this value.
    KindMismatch {
        kind: ValueKind,
        value: &'static str,
    },
    /// A large object could not report its length.
    Length { kind: LobKind, reason: String },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Display { type_name } => {
                write!(f, "Display for {} returned an error", type_name)
            }
            FormatError::KindMismatch { kind, value } => {
                write!(f, "cannot render a {} value as {:?}", value, kind)
            }
            FormatError::Length { kind, reason } => {
                write!(f, "cannot read {} length: {}", kind.name(), reason)
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// Single-quote `text`, doubling embedded quotes.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    quote(&ts.format(TEMPORAL_PATTERN).to_string())
}

pub fn format_date(date: &NaiveDate) -> String {
    format_timestamp(&date.and_time(NaiveTime::MIN))
}

pub fn format_time(time: &NaiveTime) -> String {
    format_timestamp(&epoch().and_time(*time))
}

fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        value.to_string()
    }
}

fn f32_text(value: f32) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        float_text(value as f64)
    }
}

/// Render a value following its own variant, as the generic object path does.
fn render(value: &SqlValue) -> Result<String, FormatError> {
    let text = match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::TinyInt(n) => n.to_string(),
        SqlValue::SmallInt(n) => n.to_string(),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::BigInt(n) => n.to_string(),
        SqlValue::Float(n) => f32_text(*n),
        SqlValue::Double(n) => float_text(*n),
        SqlValue::Decimal(d) => d.to_string(),
        SqlValue::Text(s) => quote(s),
        SqlValue::Bytes(bytes) => bytes_tag(bytes.len()),
        SqlValue::Date(d) => format_date(d),
        SqlValue::Time(t) => format_time(t),
        SqlValue::Timestamp(ts) => format_timestamp(ts),
        SqlValue::Url(url) => url.clone(),
        SqlValue::Other(obj) => {
            let mut out = String::new();
            write!(out, "{}", obj).map_err(|_| FormatError::Display {
                type_name: obj.type_name(),
            })?;
            out
        }
    };
    Ok(text)
}

/// Render `value` bound under the declared `kind`.
pub fn format_value(value: &SqlValue, kind: ValueKind) -> Result<String, FormatError> {
    let accepted = match (kind, value) {
        (_, SqlValue::Null) | (ValueKind::Object, _) => true,
        (ValueKind::Text | ValueKind::NText, SqlValue::Text(_)) => true,
        (ValueKind::Boolean, SqlValue::Bool(_)) => true,
        (ValueKind::Bytes, SqlValue::Bytes(_)) => true,
        (ValueKind::Url, SqlValue::Url(_)) => true,
        (ValueKind::Temporal(TemporalKind::Date), SqlValue::Date(_))
        | (ValueKind::Temporal(TemporalKind::Time), SqlValue::Time(_))
        | (ValueKind::Temporal(TemporalKind::Timestamp), SqlValue::Timestamp(_)) => true,
        (ValueKind::Numeric(NumericKind::TinyInt), SqlValue::TinyInt(_))
        | (ValueKind::Numeric(NumericKind::SmallInt), SqlValue::SmallInt(_))
        | (ValueKind::Numeric(NumericKind::Int), SqlValue::Int(_))
        | (ValueKind::Numeric(NumericKind::BigInt), SqlValue::BigInt(_))
        | (ValueKind::Numeric(NumericKind::Float), SqlValue::Float(_))
        | (ValueKind::Numeric(NumericKind::Double), SqlValue::Double(_))
        | (ValueKind::Numeric(NumericKind::Decimal), SqlValue::Decimal(_)) => true,
        _ => false,
    };
    if !accepted {
        return Err(FormatError::KindMismatch {
            kind,
            value: value.variant_name(),
        });
    }
    render(value)
}

/// Fallback rendering when [`format_value`] fails.
pub fn generic_text(value: &SqlValue) -> String {
    match value {
        SqlValue::Other(obj) => format!("{:?}", obj),
        other => format!("{:?}", other),
    }
}

pub fn bytes_tag(len: usize) -> String {
    format!("<byte[] of length {}>", len)
}

pub fn stream_tag(kind: StreamKind, length: Option<u64>) -> String {
    let name = match kind {
        StreamKind::Ascii => "Ascii InputStream",
        StreamKind::Binary => "Binary InputStream",
        StreamKind::Unicode => "Unicode InputStream",
        StreamKind::Character | StreamKind::NCharacter => "Reader",
    };
    match length {
        Some(len) => format!("<{} of length {}>", name, len),
        None => format!("<{}>", name),
    }
}

pub fn lob_tag<L: LargeObject + ?Sized>(kind: LobKind, lob: &L) -> Result<String, FormatError> {
    let size = lob.length().map_err(|e| FormatError::Length {
        kind,
        reason: e.to_string(),
    })?;
    Ok(format!("<{} of size {}>", kind.name(), size))
}

/// Tag for a handle whose contents are not rendered.
pub fn opaque_tag(kind: ValueKind) -> String {
    match kind {
        ValueKind::Array => "<Array>".to_string(),
        ValueKind::Ref => "<Ref>".to_string(),
        ValueKind::RowId => "<RowId>".to_string(),
        ValueKind::SqlXml => "<SQLXML>".to_string(),
        ValueKind::Lob(lob) => format!("<{}>", lob.name()),
        ValueKind::Stream(stream) => stream_tag(stream, None),
        other => format!("<{:?}>", other),
    }
}

fn value_hint(value: &SqlValue) -> String {
    let name = match value {
        SqlValue::Null => "null",
        SqlValue::Bool(_) => "boolean",
        SqlValue::TinyInt(_) => "byte",
        SqlValue::SmallInt(_) => "short",
        SqlValue::Int(_) => "int",
        SqlValue::BigInt(_) => "long",
        SqlValue::Float(_) => "float",
        SqlValue::Double(_) => "double",
        SqlValue::Decimal(_) => "BigDecimal",
        SqlValue::Text(_) => "String",
        SqlValue::Bytes(_) => "byte[]",
        SqlValue::Date(_) => "Date",
        SqlValue::Time(_) => "Time",
        SqlValue::Timestamp(_) => "Timestamp",
        SqlValue::Url(_) => "URL",
        SqlValue::Other(obj) => obj.type_name(),
    };
    format!("({})", name)
}

/// Type hint prefix for a bind, or `None` when the bind carries no hint.
pub fn type_hint(kind: ValueKind, value: Option<&SqlValue>) -> Option<String> {
    let name = match kind {
        ValueKind::Null => return None,
        ValueKind::Object => return value.map(value_hint),
        ValueKind::Text | ValueKind::NText => "String",
        ValueKind::Temporal(TemporalKind::Date) => "Date",
        ValueKind::Temporal(TemporalKind::Time) => "Time",
        ValueKind::Temporal(TemporalKind::Timestamp) => "Timestamp",
        ValueKind::Boolean => "boolean",
        ValueKind::Numeric(NumericKind::TinyInt) => "byte",
        ValueKind::Numeric(NumericKind::SmallInt) => "short",
        ValueKind::Numeric(NumericKind::Int) => "int",
        ValueKind::Numeric(NumericKind::BigInt) => "long",
        ValueKind::Numeric(NumericKind::Float) => "float",
        ValueKind::Numeric(NumericKind::Double) => "double",
        ValueKind::Numeric(NumericKind::Decimal) => "BigDecimal",
        ValueKind::Bytes => "byte[]",
        ValueKind::Url => "URL",
        ValueKind::Stream(StreamKind::Ascii) => "Ascii InputStream",
        ValueKind::Stream(StreamKind::Binary) => "Binary InputStream",
        ValueKind::Stream(StreamKind::Unicode) => "Unicode InputStream",
        ValueKind::Stream(StreamKind::Character | StreamKind::NCharacter) => "Reader",
        ValueKind::Lob(lob) => lob.name(),
        ValueKind::Array => "Array",
        ValueKind::Ref => "Ref",
        ValueKind::RowId => "RowId",
        ValueKind::SqlXml => "SQLXML",
    };
    Some(format!("({})", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Decimal;

    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    impl fmt::Debug for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Broken")
        }
    }

    struct Lob(Result<u64, String>);

    impl LargeObject for Lob {
        type Error = String;

        fn length(&self) -> Result<u64, String> {
            self.0.clone()
        }
    }

    #[test]
    fn test_text_is_quoted_and_escaped() {
        let value = SqlValue::from("O'Brien");
        assert_eq!(format_value(&value, ValueKind::Text).unwrap(), "'O''Brien'");
        assert_eq!(quote("''"), "''''''");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(format_value(&SqlValue::Null, ValueKind::Text).unwrap(), "NULL");
        assert_eq!(format_value(&SqlValue::Bool(true), ValueKind::Boolean).unwrap(), "true");
        assert_eq!(format_value(&SqlValue::Bool(false), ValueKind::Object).unwrap(), "false");
        assert_eq!(
            format_value(&SqlValue::Int(42), ValueKind::Numeric(NumericKind::Int)).unwrap(),
            "42"
        );
        assert_eq!(
            format_value(&SqlValue::BigInt(-7), ValueKind::Numeric(NumericKind::BigInt)).unwrap(),
            "-7"
        );
        let decimal: Decimal = "12.50".parse().unwrap();
        assert_eq!(
            format_value(&SqlValue::Decimal(decimal), ValueKind::Numeric(NumericKind::Decimal))
                .unwrap(),
            "12.50"
        );
        assert_eq!(
            format_value(&SqlValue::Url("http://h/x".into()), ValueKind::Url).unwrap(),
            "http://h/x",
            "URLs are not quoted"
        );
    }

    #[test]
    fn test_floats() {
        let double = ValueKind::Numeric(NumericKind::Double);
        assert_eq!(format_value(&SqlValue::Double(1.5), double).unwrap(), "1.5");
        assert_eq!(format_value(&SqlValue::Double(f64::NAN), double).unwrap(), "NaN");
        assert_eq!(
            format_value(&SqlValue::Double(f64::NEG_INFINITY), double).unwrap(),
            "-Infinity"
        );
        assert_eq!(
            format_value(&SqlValue::Float(0.1), ValueKind::Numeric(NumericKind::Float)).unwrap(),
            "0.1"
        );
        assert_eq!(
            format_value(&SqlValue::Float(f32::INFINITY), ValueKind::Numeric(NumericKind::Float))
                .unwrap(),
            "Infinity"
        );
    }

    #[test]
    fn test_temporal_pattern() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_milli_opt(13, 45, 0, 250)
            .unwrap();
        assert_eq!(
            format_value(&SqlValue::Timestamp(ts), ValueKind::Temporal(TemporalKind::Timestamp))
                .unwrap(),
            "'01/31/2024 13:45:00.250'"
        );
        let date = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
        assert_eq!(format_date(&date), "'07/04/2023 00:00:00.000'");
        let time = NaiveTime::from_hms_opt(8, 5, 9).unwrap();
        assert_eq!(format_time(&time), "'01/01/1970 08:05:09.000'");
    }

    #[test]
    fn test_tags() {
        assert_eq!(stream_tag(StreamKind::Character, Some(120)), "<Reader of length 120>");
        assert_eq!(stream_tag(StreamKind::Ascii, None), "<Ascii InputStream>");
        assert_eq!(
            stream_tag(StreamKind::Unicode, Some(3)),
            "<Unicode InputStream of length 3>"
        );
        assert_eq!(lob_tag(LobKind::Blob, &Lob(Ok(4))).unwrap(), "<Blob of size 4>");
        assert_eq!(opaque_tag(ValueKind::SqlXml), "<SQLXML>");
        assert_eq!(opaque_tag(ValueKind::Lob(LobKind::Clob)), "<Clob>");
        assert_eq!(
            format_value(&SqlValue::Bytes(vec![1, 2, 3]), ValueKind::Bytes).unwrap(),
            "<byte[] of length 3>"
        );
    }

    #[test]
    fn test_failures() {
        let broken = SqlValue::other(Broken);
        let err = format_value(&broken, ValueKind::Object).unwrap_err();
        assert!(matches!(err, FormatError::Display { .. }));
        assert_eq!(generic_text(&broken), "Broken");

        let err = format_value(&SqlValue::Int(1), ValueKind::Text).unwrap_err();
        assert_eq!(
            err,
            FormatError::KindMismatch {
                kind: ValueKind::Text,
                value: "Int"
            }
        );
        assert_eq!(generic_text(&SqlValue::Int(1)), "Int(1)");

        let err = lob_tag(LobKind::NClob, &Lob(Err("closed".into()))).unwrap_err();
        assert_eq!(err.to_string(), "cannot read NClob length: closed");
    }

    #[test]
    fn test_type_hints() {
        assert_eq!(type_hint(ValueKind::Numeric(NumericKind::Int), None).as_deref(), Some("(int)"));
        assert_eq!(type_hint(ValueKind::Null, None), None);
        assert_eq!(
            type_hint(ValueKind::Object, Some(&SqlValue::Null)).as_deref(),
            Some("(null)")
        );
        assert_eq!(
            type_hint(ValueKind::Object, Some(&SqlValue::from("x"))).as_deref(),
            Some("(String)")
        );
        assert_eq!(
            type_hint(ValueKind::Stream(StreamKind::NCharacter), None).as_deref(),
            Some("(Reader)")
        );
    }
}
