//! In-memory statement and connection that record every call.
//!
//! Used by the test suites and by embedders who want to see what a proxy
//! forwards without a database behind it.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::Mutex;
use std::fmt;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::connection::{Connection, CONCUR_READ_ONLY, TYPE_FORWARD_ONLY};
use crate::surface::{InputStream, PreparedStatement};
use crate::value::{Decimal, LargeObject, SqlValue};

/// JDBC `ResultSet.FETCH_FORWARD`.
const FETCH_FORWARD: i32 = 1000;
/// JDBC `ResultSet.HOLD_CURSORS_OVER_COMMIT`.
const HOLD_CURSORS_OVER_COMMIT: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingError(pub String);

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RecordingError {}

/// A Blob/Clob/NClob with a fixed length, or one whose length query fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLob {
    length: Result<u64, String>,
}

impl MemoryLob {
    pub fn new(length: u64) -> Self {
        Self { length: Ok(length) }
    }

    pub fn broken(reason: impl Into<String>) -> Self {
        Self {
            length: Err(reason.into()),
        }
    }
}

impl LargeObject for MemoryLob {
    type Error = String;

    fn length(&self) -> Result<u64, String> {
        self.length.clone()
    }
}

/// Records each call as text such as `set_int(1, 42)`.
#[derive(Debug, Default)]
pub struct RecordingStatement {
    calls: Mutex<Vec<String>>,
    failure: Option<String>,
    closed: AtomicBool,
}

impl RecordingStatement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every bind and execution fails with `reason` (after being recorded).
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn checked(&self, call: impl Into<String>) -> Result<(), RecordingError> {
        self.log(call);
        match &self.failure {
            Some(reason) => Err(RecordingError(reason.clone())),
            None => Ok(()),
        }
    }

    fn stream(
        &self,
        op: &str,
        index: usize,
        mut stream: InputStream,
        length: Option<u64>,
    ) -> Result<(), RecordingError> {
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| RecordingError(e.to_string()))?;
        self.checked(format!("{}({}, {} bytes, {:?})", op, index, bytes.len(), length))
    }
}

impl PreparedStatement for RecordingStatement {
    type Error = RecordingError;
    type ResultSet = String;
    type ResultSetMetaData = ();
    type ParameterMetaData = ();
    type Warning = String;
    type Connection = ();
    type Blob = MemoryLob;
    type Clob = MemoryLob;
    type NClob = MemoryLob;
    type Array = Vec<String>;
    type Ref = String;
    type RowId = Vec<u8>;
    type SqlXml = String;

    fn set_null(&self, index: usize, sql_type: i32) -> Result<(), RecordingError> {
        self.checked(format!("set_null({}, {})", index, sql_type))
    }

    fn set_null_typed(
        &self,
        index: usize,
        sql_type: i32,
        type_name: &str,
    ) -> Result<(), RecordingError> {
        self.checked(format!("set_null_typed({}, {}, {})", index, sql_type, type_name))
    }

    fn set_boolean(&self, index: usize, value: bool) -> Result<(), RecordingError> {
        self.checked(format!("set_boolean({}, {})", index, value))
    }

    fn set_byte(&self, index: usize, value: i8) -> Result<(), RecordingError> {
        self.checked(format!("set_byte({}, {})", index, value))
    }

    fn set_short(&self, index: usize, value: i16) -> Result<(), RecordingError> {
        self.checked(format!("set_short({}, {})", index, value))
    }

    fn set_int(&self, index: usize, value: i32) -> Result<(), RecordingError> {
        self.checked(format!("set_int({}, {})", index, value))
    }

    fn set_long(&self, index: usize, value: i64) -> Result<(), RecordingError> {
        self.checked(format!("set_long({}, {})", index, value))
    }

    fn set_float(&self, index: usize, value: f32) -> Result<(), RecordingError> {
        self.checked(format!("set_float({}, {})", index, value))
    }

    fn set_double(&self, index: usize, value: f64) -> Result<(), RecordingError> {
        self.checked(format!("set_double({}, {})", index, value))
    }

    fn set_big_decimal(&self, index: usize, value: &Decimal) -> Result<(), RecordingError> {
        self.checked(format!("set_big_decimal({}, {})", index, value))
    }

    fn set_string(&self, index: usize, value: &str) -> Result<(), RecordingError> {
        self.checked(format!("set_string({}, {:?})", index, value))
    }

    fn set_nstring(&self, index: usize, value: &str) -> Result<(), RecordingError> {
        self.checked(format!("set_nstring({}, {:?})", index, value))
    }

    fn set_bytes(&self, index: usize, value: &[u8]) -> Result<(), RecordingError> {
        self.checked(format!("set_bytes({}, {:?})", index, value))
    }

    fn set_date(&self, index: usize, value: NaiveDate) -> Result<(), RecordingError> {
        self.checked(format!("set_date({}, {})", index, value))
    }

    fn set_date_in_zone(
        &self,
        index: usize,
        value: NaiveDate,
        zone: FixedOffset,
    ) -> Result<(), RecordingError> {
        self.checked(format!("set_date_in_zone({}, {}, {})", index, value, zone))
    }

    fn set_time(&self, index: usize, value: NaiveTime) -> Result<(), RecordingError> {
        self.checked(format!("set_time({}, {})", index, value))
    }

    fn set_time_in_zone(
        &self,
        index: usize,
        value: NaiveTime,
        zone: FixedOffset,
    ) -> Result<(), RecordingError> {
        self.checked(format!("set_time_in_zone({}, {}, {})", index, value, zone))
    }

    fn set_timestamp(&self, index: usize, value: NaiveDateTime) -> Result<(), RecordingError> {
        self.checked(format!("set_timestamp({}, {})", index, value))
    }

    fn set_timestamp_in_zone(
        &self,
        index: usize,
        value: NaiveDateTime,
        zone: FixedOffset,
    ) -> Result<(), RecordingError> {
        self.checked(format!("set_timestamp_in_zone({}, {}, {})", index, value, zone))
    }

    fn set_url(&self, index: usize, url: &str) -> Result<(), RecordingError> {
        self.checked(format!("set_url({}, {})", index, url))
    }

    fn set_ascii_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: Option<u64>,
    ) -> Result<(), RecordingError> {
        self.stream("set_ascii_stream", index, stream, length)
    }

    fn set_binary_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: Option<u64>,
    ) -> Result<(), RecordingError> {
        self.stream("set_binary_stream", index, stream, length)
    }

    fn set_unicode_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: u64,
    ) -> Result<(), RecordingError> {
        self.stream("set_unicode_stream", index, stream, Some(length))
    }

    fn set_character_stream(
        &self,
        index: usize,
        reader: InputStream,
        length: Option<u64>,
    ) -> Result<(), RecordingError> {
        self.stream("set_character_stream", index, reader, length)
    }

    fn set_ncharacter_stream(
        &self,
        index: usize,
        reader: InputStream,
        length: Option<u64>,
    ) -> Result<(), RecordingError> {
        self.stream("set_ncharacter_stream", index, reader, length)
    }

    fn set_blob(&self, index: usize, value: MemoryLob) -> Result<(), RecordingError> {
        self.checked(format!("set_blob({}, {:?})", index, value.length))
    }

    fn set_clob(&self, index: usize, value: MemoryLob) -> Result<(), RecordingError> {
        self.checked(format!("set_clob({}, {:?})", index, value.length))
    }

    fn set_nclob(&self, index: usize, value: MemoryLob) -> Result<(), RecordingError> {
        self.checked(format!("set_nclob({}, {:?})", index, value.length))
    }

    fn set_array(&self, index: usize, value: Vec<String>) -> Result<(), RecordingError> {
        self.checked(format!("set_array({}, {:?})", index, value))
    }

    fn set_ref(&self, index: usize, value: String) -> Result<(), RecordingError> {
        self.checked(format!("set_ref({}, {})", index, value))
    }

    fn set_row_id(&self, index: usize, value: Vec<u8>) -> Result<(), RecordingError> {
        self.checked(format!("set_row_id({}, {:?})", index, value))
    }

    fn set_sqlxml(&self, index: usize, value: String) -> Result<(), RecordingError> {
        self.checked(format!("set_sqlxml({}, {})", index, value))
    }

    fn set_object(&self, index: usize, value: SqlValue) -> Result<(), RecordingError> {
        self.checked(format!("set_object({}, {:?})", index, value))
    }

    fn set_object_typed(
        &self,
        index: usize,
        value: SqlValue,
        target_sql_type: i32,
        scale_or_length: Option<i32>,
    ) -> Result<(), RecordingError> {
        self.checked(format!(
            "set_object_typed({}, {:?}, {}, {:?})",
            index, value, target_sql_type, scale_or_length
        ))
    }

    fn execute_query(&self) -> Result<String, RecordingError> {
        self.checked("execute_query()")?;
        Ok("rows".to_string())
    }

    fn execute_update(&self) -> Result<i32, RecordingError> {
        self.checked("execute_update()")?;
        Ok(1)
    }

    fn execute(&self) -> Result<bool, RecordingError> {
        self.checked("execute()")?;
        Ok(true)
    }

    fn execute_large_update(&self) -> Result<i64, RecordingError> {
        self.checked("execute_large_update()")?;
        Ok(1)
    }

    fn clear_parameters(&self) -> Result<(), RecordingError> {
        self.checked("clear_parameters()")
    }

    fn add_batch(&self) -> Result<(), RecordingError> {
        self.checked("add_batch()")
    }

    fn add_batch_sql(&self, sql: &str) -> Result<(), RecordingError> {
        self.checked(format!("add_batch_sql({})", sql))
    }

    fn clear_batch(&self) -> Result<(), RecordingError> {
        self.checked("clear_batch()")
    }

    fn execute_batch(&self) -> Result<Vec<i32>, RecordingError> {
        self.checked("execute_batch()")?;
        Ok(Vec::new())
    }

    fn execute_large_batch(&self) -> Result<Vec<i64>, RecordingError> {
        self.checked("execute_large_batch()")?;
        Ok(Vec::new())
    }

    fn execute_query_sql(&self, sql: &str) -> Result<String, RecordingError> {
        self.checked(format!("execute_query_sql({})", sql))?;
        Ok("rows".to_string())
    }

    fn execute_update_sql(&self, sql: &str) -> Result<i32, RecordingError> {
        self.checked(format!("execute_update_sql({})", sql))?;
        Ok(0)
    }

    fn execute_sql(&self, sql: &str) -> Result<bool, RecordingError> {
        self.checked(format!("execute_sql({})", sql))?;
        Ok(false)
    }

    fn metadata(&self) -> Result<Option<()>, RecordingError> {
        self.log("metadata()");
        Ok(None)
    }

    fn parameter_metadata(&self) -> Result<(), RecordingError> {
        self.log("parameter_metadata()");
        Ok(())
    }

    fn close(&self) -> Result<(), RecordingError> {
        self.log("close()");
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> Result<bool, RecordingError> {
        self.log("is_closed()");
        Ok(self.closed.load(Ordering::SeqCst))
    }

    fn cancel(&self) -> Result<(), RecordingError> {
        self.checked("cancel()")
    }

    fn max_field_size(&self) -> Result<i32, RecordingError> {
        self.log("max_field_size()");
        Ok(0)
    }

    fn set_max_field_size(&self, max: i32) -> Result<(), RecordingError> {
        self.checked(format!("set_max_field_size({})", max))
    }

    fn max_rows(&self) -> Result<i32, RecordingError> {
        self.log("max_rows()");
        Ok(0)
    }

    fn set_max_rows(&self, max: i32) -> Result<(), RecordingError> {
        self.checked(format!("set_max_rows({})", max))
    }

    fn large_max_rows(&self) -> Result<i64, RecordingError> {
        self.log("large_max_rows()");
        Ok(0)
    }

    fn set_large_max_rows(&self, max: i64) -> Result<(), RecordingError> {
        self.checked(format!("set_large_max_rows({})", max))
    }

    fn set_escape_processing(&self, enable: bool) -> Result<(), RecordingError> {
        self.checked(format!("set_escape_processing({})", enable))
    }

    fn query_timeout(&self) -> Result<i32, RecordingError> {
        self.log("query_timeout()");
        Ok(0)
    }

    fn set_query_timeout(&self, seconds: i32) -> Result<(), RecordingError> {
        self.checked(format!("set_query_timeout({})", seconds))
    }

    fn warnings(&self) -> Result<Option<String>, RecordingError> {
        self.log("warnings()");
        Ok(None)
    }

    fn clear_warnings(&self) -> Result<(), RecordingError> {
        self.checked("clear_warnings()")
    }

    fn set_cursor_name(&self, name: &str) -> Result<(), RecordingError> {
        self.checked(format!("set_cursor_name({})", name))
    }

    fn result_set(&self) -> Result<Option<String>, RecordingError> {
        self.log("result_set()");
        Ok(None)
    }

    fn update_count(&self) -> Result<i32, RecordingError> {
        self.log("update_count()");
        Ok(-1)
    }

    fn large_update_count(&self) -> Result<i64, RecordingError> {
        self.log("large_update_count()");
        Ok(-1)
    }

    fn more_results(&self) -> Result<bool, RecordingError> {
        self.log("more_results()");
        Ok(false)
    }

    fn fetch_direction(&self) -> Result<i32, RecordingError> {
        self.log("fetch_direction()");
        Ok(FETCH_FORWARD)
    }

    fn set_fetch_direction(&self, direction: i32) -> Result<(), RecordingError> {
        self.checked(format!("set_fetch_direction({})", direction))
    }

    fn fetch_size(&self) -> Result<i32, RecordingError> {
        self.log("fetch_size()");
        Ok(0)
    }

    fn set_fetch_size(&self, rows: i32) -> Result<(), RecordingError> {
        self.checked(format!("set_fetch_size({})", rows))
    }

    fn result_set_concurrency(&self) -> Result<i32, RecordingError> {
        self.log("result_set_concurrency()");
        Ok(CONCUR_READ_ONLY)
    }

    fn result_set_type(&self) -> Result<i32, RecordingError> {
        self.log("result_set_type()");
        Ok(TYPE_FORWARD_ONLY)
    }

    fn result_set_holdability(&self) -> Result<i32, RecordingError> {
        self.log("result_set_holdability()");
        Ok(HOLD_CURSORS_OVER_COMMIT)
    }

    fn generated_keys(&self) -> Result<String, RecordingError> {
        self.log("generated_keys()");
        Ok("keys".to_string())
    }

    fn connection(&self) -> Result<(), RecordingError> {
        self.log("connection()");
        Ok(())
    }

    fn set_poolable(&self, poolable: bool) -> Result<(), RecordingError> {
        self.checked(format!("set_poolable({})", poolable))
    }

    fn is_poolable(&self) -> Result<bool, RecordingError> {
        self.log("is_poolable()");
        Ok(true)
    }

    fn close_on_completion(&self) -> Result<(), RecordingError> {
        self.checked("close_on_completion()")
    }

    fn is_close_on_completion(&self) -> Result<bool, RecordingError> {
        self.log("is_close_on_completion()");
        Ok(false)
    }
}

/// Hands out [`RecordingStatement`]s and remembers what was prepared.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    prepared: Mutex<Vec<(String, i32, i32)>>,
    failure: Option<String>,
}

impl RecordingConnection {
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// `(sql, result_set_type, result_set_concurrency)` per call.
    pub fn prepared(&self) -> Vec<(String, i32, i32)> {
        self.prepared.lock().clone()
    }
}

impl Connection for RecordingConnection {
    type Statement = RecordingStatement;
    type Error = RecordingError;

    fn prepare_statement(
        &self,
        sql: &str,
        result_set_type: i32,
        result_set_concurrency: i32,
    ) -> Result<RecordingStatement, RecordingError> {
        if let Some(reason) = &self.failure {
            return Err(RecordingError(reason.clone()));
        }
        self.prepared
            .lock()
            .push((sql.to_string(), result_set_type, result_set_concurrency));
        Ok(RecordingStatement::new())
    }
}
