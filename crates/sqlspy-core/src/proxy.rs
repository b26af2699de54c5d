//! Statement proxy that logs executions with their literal SQL.
//!
//! [`StatementProxy`] implements [`PreparedStatement`] over any other
//! implementation. Three groups of operations are intercepted:
//!
//! - **binds** render the value into the [`ArgumentTrace`], then delegate
//! - **executions** reconstruct the literal SQL, emit a [`StatementEvent`],
//!   then delegate
//! - **`clear_parameters`** empties the trace, then delegates
//!
//! Everything else is generated by `forward!` and delegates untouched.
//! Delegated results and errors are returned exactly as the wrapped
//! statement produced them; rendering and logging never fail a call.
//!
//! ```
//! use std::sync::Arc;
//! use sqlspy_core::proxy::StatementProxy;
//! use sqlspy_core::surface::PreparedStatement;
//! use sqlspy_core::testing::RecordingStatement;
//! use sqlspy_types::{MemorySink, ProxySettings};
//!
//! let sink = MemorySink::shared();
//! let proxy = StatementProxy::new(
//!     "SELECT * FROM t WHERE id=? AND name=?",
//!     RecordingStatement::new(),
//!     ProxySettings::default(),
//!     sink.clone(),
//! );
//! proxy.set_int(1, 42).unwrap();
//! proxy.set_string(2, "O'Brien").unwrap();
//! proxy.execute_query().unwrap();
//!
//! assert_eq!(sink.literal_sql(), vec!["SELECT * FROM t WHERE id=42 AND name='O''Brien'"]);
//! ```

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

use sqlspy_types::{Diagnostic, LogSink, ProxySettings, StatementEvent};

use crate::formatter::{
    bytes_tag, format_value, generic_text, lob_tag, opaque_tag, stream_tag, type_hint,
};
use crate::surface::{InputStream, PreparedStatement};
use crate::trace::ArgumentTrace;
use crate::value::{
    Decimal, LargeObject, LobKind, NumericKind, SqlValue, StreamKind, TemporalKind, ValueKind,
};

/// Generates pass-through methods that call the wrapped statement unchanged.
macro_rules! forward {
    ($(fn $name:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(
            fn $name(&self $(, $arg: $ty)*) -> $ret {
                self.real.$name($($arg),*)
            }
        )*
    };
}

pub struct StatementProxy<S> {
    template: String,
    real: S,
    trace: ArgumentTrace,
    settings: ProxySettings,
    sink: Arc<dyn LogSink>,
}

impl<S> StatementProxy<S> {
    pub fn new(
        template: impl Into<String>,
        real: S,
        settings: ProxySettings,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            template: template.into(),
            real,
            trace: ArgumentTrace::new(),
            settings,
            sink,
        }
    }

    /// The wrapped statement.
    pub fn real(&self) -> &S {
        &self.real
    }

    pub fn into_inner(self) -> S {
        self.real
    }

    /// SQL text as prepared, with placeholders.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn trace(&self) -> &ArgumentTrace {
        &self.trace
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    /// The template with every bound placeholder substituted.
    pub fn literal_sql(&self) -> String {
        self.trace.reconstruct(&self.template, self.settings.marker)
    }

    fn store(&self, index: usize, kind: ValueKind, value: Option<&SqlValue>, fragment: String) {
        let fragment = match self.settings.type_hints.then(|| type_hint(kind, value)).flatten() {
            Some(hint) => hint + &fragment,
            None => fragment,
        };
        if !self.trace.set(index, fragment) {
            self.sink.diagnostic(&Diagnostic::debug(format!(
                "parameter index {} is not a 1-based position; not recorded",
                index
            )));
        }
    }

    fn record(&self, index: usize, kind: ValueKind, value: &SqlValue) {
        let fragment = match format_value(value, kind) {
            Ok(text) => text,
            Err(e) => {
                self.sink.diagnostic(&Diagnostic::debug(format!(
                    "failed to format parameter {} ({}); using generic text",
                    index, e
                )));
                generic_text(value)
            }
        };
        self.store(index, kind, Some(value), fragment);
    }

    fn record_tag(&self, index: usize, kind: ValueKind, tag: String) {
        self.store(index, kind, None, tag);
    }

    fn record_lob<L: LargeObject>(&self, index: usize, kind: LobKind, lob: &L) {
        let tag = match lob_tag(kind, lob) {
            Ok(tag) => tag,
            Err(e) => {
                self.sink.diagnostic(&Diagnostic::debug(format!(
                    "failed to format parameter {} ({})",
                    index, e
                )));
                opaque_tag(ValueKind::Lob(kind))
            }
        };
        self.record_tag(index, ValueKind::Lob(kind), tag);
    }

    fn report(&self, operation: &str) {
        let event = StatementEvent::new(operation, self.literal_sql());
        self.sink.statement(&event);
    }
}

impl<S: PreparedStatement> PreparedStatement for StatementProxy<S> {
    type Error = S::Error;
    type ResultSet = S::ResultSet;
    type ResultSetMetaData = S::ResultSetMetaData;
    type ParameterMetaData = S::ParameterMetaData;
    type Warning = S::Warning;
    type Connection = S::Connection;
    type Blob = S::Blob;
    type Clob = S::Clob;
    type NClob = S::NClob;
    type Array = S::Array;
    type Ref = S::Ref;
    type RowId = S::RowId;
    type SqlXml = S::SqlXml;

    // =========================================================================
    // Binds
    // =========================================================================

    fn set_null(&self, index: usize, sql_type: i32) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Null, &SqlValue::Null);
        self.real.set_null(index, sql_type)
    }

    fn set_null_typed(
        &self,
        index: usize,
        sql_type: i32,
        type_name: &str,
    ) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Null, &SqlValue::Null);
        self.real.set_null_typed(index, sql_type, type_name)
    }

    fn set_boolean(&self, index: usize, value: bool) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Boolean, &SqlValue::Bool(value));
        self.real.set_boolean(index, value)
    }

    fn set_byte(&self, index: usize, value: i8) -> Result<(), Self::Error> {
        self.record(
            index,
            ValueKind::Numeric(NumericKind::TinyInt),
            &SqlValue::TinyInt(value),
        );
        self.real.set_byte(index, value)
    }

    fn set_short(&self, index: usize, value: i16) -> Result<(), Self::Error> {
        self.record(
            index,
            ValueKind::Numeric(NumericKind::SmallInt),
            &SqlValue::SmallInt(value),
        );
        self.real.set_short(index, value)
    }

    fn set_int(&self, index: usize, value: i32) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Numeric(NumericKind::Int), &SqlValue::Int(value));
        self.real.set_int(index, value)
    }

    fn set_long(&self, index: usize, value: i64) -> Result<(), Self::Error> {
        self.record(
            index,
            ValueKind::Numeric(NumericKind::BigInt),
            &SqlValue::BigInt(value),
        );
        self.real.set_long(index, value)
    }

    fn set_float(&self, index: usize, value: f32) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Numeric(NumericKind::Float), &SqlValue::Float(value));
        self.real.set_float(index, value)
    }

    fn set_double(&self, index: usize, value: f64) -> Result<(), Self::Error> {
        self.record(
            index,
            ValueKind::Numeric(NumericKind::Double),
            &SqlValue::Double(value),
        );
        self.real.set_double(index, value)
    }

    fn set_big_decimal(&self, index: usize, value: &Decimal) -> Result<(), Self::Error> {
        self.record(
            index,
            ValueKind::Numeric(NumericKind::Decimal),
            &SqlValue::Decimal(value.clone()),
        );
        self.real.set_big_decimal(index, value)
    }

    fn set_string(&self, index: usize, value: &str) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Text, &SqlValue::from(value));
        self.real.set_string(index, value)
    }

    fn set_nstring(&self, index: usize, value: &str) -> Result<(), Self::Error> {
        self.record(index, ValueKind::NText, &SqlValue::from(value));
        self.real.set_nstring(index, value)
    }

    fn set_bytes(&self, index: usize, value: &[u8]) -> Result<(), Self::Error> {
        self.record_tag(index, ValueKind::Bytes, bytes_tag(value.len()));
        self.real.set_bytes(index, value)
    }

    fn set_date(&self, index: usize, value: NaiveDate) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Temporal(TemporalKind::Date), &SqlValue::Date(value));
        self.real.set_date(index, value)
    }

    fn set_date_in_zone(
        &self,
        index: usize,
        value: NaiveDate,
        zone: FixedOffset,
    ) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Temporal(TemporalKind::Date), &SqlValue::Date(value));
        self.real.set_date_in_zone(index, value, zone)
    }

    fn set_time(&self, index: usize, value: NaiveTime) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Temporal(TemporalKind::Time), &SqlValue::Time(value));
        self.real.set_time(index, value)
    }

    fn set_time_in_zone(
        &self,
        index: usize,
        value: NaiveTime,
        zone: FixedOffset,
    ) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Temporal(TemporalKind::Time), &SqlValue::Time(value));
        self.real.set_time_in_zone(index, value, zone)
    }

    fn set_timestamp(&self, index: usize, value: NaiveDateTime) -> Result<(), Self::Error> {
        self.record(
            index,
            ValueKind::Temporal(TemporalKind::Timestamp),
            &SqlValue::Timestamp(value),
        );
        self.real.set_timestamp(index, value)
    }

    fn set_timestamp_in_zone(
        &self,
        index: usize,
        value: NaiveDateTime,
        zone: FixedOffset,
    ) -> Result<(), Self::Error> {
        self.record(
            index,
            ValueKind::Temporal(TemporalKind::Timestamp),
            &SqlValue::Timestamp(value),
        );
        self.real.set_timestamp_in_zone(index, value, zone)
    }

    fn set_url(&self, index: usize, url: &str) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Url, &SqlValue::Url(url.to_string()));
        self.real.set_url(index, url)
    }

    fn set_ascii_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: Option<u64>,
    ) -> Result<(), Self::Error> {
        let kind = StreamKind::Ascii;
        self.record_tag(index, ValueKind::Stream(kind), stream_tag(kind, length));
        self.real.set_ascii_stream(index, stream, length)
    }

    fn set_binary_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: Option<u64>,
    ) -> Result<(), Self::Error> {
        let kind = StreamKind::Binary;
        self.record_tag(index, ValueKind::Stream(kind), stream_tag(kind, length));
        self.real.set_binary_stream(index, stream, length)
    }

    fn set_unicode_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: u64,
    ) -> Result<(), Self::Error> {
        let kind = StreamKind::Unicode;
        self.record_tag(index, ValueKind::Stream(kind), stream_tag(kind, Some(length)));
        self.real.set_unicode_stream(index, stream, length)
    }

    fn set_character_stream(
        &self,
        index: usize,
        reader: InputStream,
        length: Option<u64>,
    ) -> Result<(), Self::Error> {
        let kind = StreamKind::Character;
        self.record_tag(index, ValueKind::Stream(kind), stream_tag(kind, length));
        self.real.set_character_stream(index, reader, length)
    }

    fn set_ncharacter_stream(
        &self,
        index: usize,
        reader: InputStream,
        length: Option<u64>,
    ) -> Result<(), Self::Error> {
        let kind = StreamKind::NCharacter;
        self.record_tag(index, ValueKind::Stream(kind), stream_tag(kind, length));
        self.real.set_ncharacter_stream(index, reader, length)
    }

    fn set_blob(&self, index: usize, value: Self::Blob) -> Result<(), Self::Error> {
        self.record_lob(index, LobKind::Blob, &value);
        self.real.set_blob(index, value)
    }

    fn set_clob(&self, index: usize, value: Self::Clob) -> Result<(), Self::Error> {
        self.record_lob(index, LobKind::Clob, &value);
        self.real.set_clob(index, value)
    }

    fn set_nclob(&self, index: usize, value: Self::NClob) -> Result<(), Self::Error> {
        self.record_lob(index, LobKind::NClob, &value);
        self.real.set_nclob(index, value)
    }

    fn set_array(&self, index: usize, value: Self::Array) -> Result<(), Self::Error> {
        self.record_tag(index, ValueKind::Array, opaque_tag(ValueKind::Array));
        self.real.set_array(index, value)
    }

    fn set_ref(&self, index: usize, value: Self::Ref) -> Result<(), Self::Error> {
        self.record_tag(index, ValueKind::Ref, opaque_tag(ValueKind::Ref));
        self.real.set_ref(index, value)
    }

    fn set_row_id(&self, index: usize, value: Self::RowId) -> Result<(), Self::Error> {
        self.record_tag(index, ValueKind::RowId, opaque_tag(ValueKind::RowId));
        self.real.set_row_id(index, value)
    }

    fn set_sqlxml(&self, index: usize, value: Self::SqlXml) -> Result<(), Self::Error> {
        self.record_tag(index, ValueKind::SqlXml, opaque_tag(ValueKind::SqlXml));
        self.real.set_sqlxml(index, value)
    }

    fn set_object(&self, index: usize, value: SqlValue) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Object, &value);
        self.real.set_object(index, value)
    }

    fn set_object_typed(
        &self,
        index: usize,
        value: SqlValue,
        target_sql_type: i32,
        scale_or_length: Option<i32>,
    ) -> Result<(), Self::Error> {
        self.record(index, ValueKind::Object, &value);
        self.real
            .set_object_typed(index, value, target_sql_type, scale_or_length)
    }

    // =========================================================================
    // Executions and reset
    // =========================================================================

    fn execute_query(&self) -> Result<Self::ResultSet, Self::Error> {
        self.report("execute_query()");
        self.real.execute_query()
    }

    fn execute_update(&self) -> Result<i32, Self::Error> {
        self.report("execute_update()");
        self.real.execute_update()
    }

    fn execute(&self) -> Result<bool, Self::Error> {
        self.report("execute()");
        self.real.execute()
    }

    fn execute_large_update(&self) -> Result<i64, Self::Error> {
        self.report("execute_large_update()");
        self.real.execute_large_update()
    }

    fn clear_parameters(&self) -> Result<(), Self::Error> {
        self.trace.clear();
        self.real.clear_parameters()
    }

    // =========================================================================
    // Pass-through
    // =========================================================================

    forward! {
        fn add_batch(&self) -> Result<(), Self::Error>;
        fn add_batch_sql(&self, sql: &str) -> Result<(), Self::Error>;
        fn clear_batch(&self) -> Result<(), Self::Error>;
        fn execute_batch(&self) -> Result<Vec<i32>, Self::Error>;
        fn execute_large_batch(&self) -> Result<Vec<i64>, Self::Error>;
        fn execute_query_sql(&self, sql: &str) -> Result<Self::ResultSet, Self::Error>;
        fn execute_update_sql(&self, sql: &str) -> Result<i32, Self::Error>;
        fn execute_sql(&self, sql: &str) -> Result<bool, Self::Error>;
        fn metadata(&self) -> Result<Option<Self::ResultSetMetaData>, Self::Error>;
        fn parameter_metadata(&self) -> Result<Self::ParameterMetaData, Self::Error>;
        fn close(&self) -> Result<(), Self::Error>;
        fn is_closed(&self) -> Result<bool, Self::Error>;
        fn cancel(&self) -> Result<(), Self::Error>;
        fn max_field_size(&self) -> Result<i32, Self::Error>;
        fn set_max_field_size(&self, max: i32) -> Result<(), Self::Error>;
        fn max_rows(&self) -> Result<i32, Self::Error>;
        fn set_max_rows(&self, max: i32) -> Result<(), Self::Error>;
        fn large_max_rows(&self) -> Result<i64, Self::Error>;
        fn set_large_max_rows(&self, max: i64) -> Result<(), Self::Error>;
        fn set_escape_processing(&self, enable: bool) -> Result<(), Self::Error>;
        fn query_timeout(&self) -> Result<i32, Self::Error>;
        fn set_query_timeout(&self, seconds: i32) -> Result<(), Self::Error>;
        fn warnings(&self) -> Result<Option<Self::Warning>, Self::Error>;
        fn clear_warnings(&self) -> Result<(), Self::Error>;
        fn set_cursor_name(&self, name: &str) -> Result<(), Self::Error>;
        fn result_set(&self) -> Result<Option<Self::ResultSet>, Self::Error>;
        fn update_count(&self) -> Result<i32, Self::Error>;
        fn large_update_count(&self) -> Result<i64, Self::Error>;
        fn more_results(&self) -> Result<bool, Self::Error>;
        fn fetch_direction(&self) -> Result<i32, Self::Error>;
        fn set_fetch_direction(&self, direction: i32) -> Result<(), Self::Error>;
        fn fetch_size(&self) -> Result<i32, Self::Error>;
        fn set_fetch_size(&self, rows: i32) -> Result<(), Self::Error>;
        fn result_set_concurrency(&self) -> Result<i32, Self::Error>;
        fn result_set_type(&self) -> Result<i32, Self::Error>;
        fn result_set_holdability(&self) -> Result<i32, Self::Error>;
        fn generated_keys(&self) -> Result<Self::ResultSet, Self::Error>;
        fn connection(&self) -> Result<Self::Connection, Self::Error>;
        fn set_poolable(&self, poolable: bool) -> Result<(), Self::Error>;
        fn is_poolable(&self) -> Result<bool, Self::Error>;
        fn close_on_completion(&self) -> Result<(), Self::Error>;
        fn is_close_on_completion(&self) -> Result<bool, Self::Error>;
    }
}
