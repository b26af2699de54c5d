//! The prepared statement capability surface.
//!
//! Shaped after `java.sql.PreparedStatement`: parameter positions are
//! 1-based and every operation takes `&self`, since drivers hand statements
//! out behind shared handles. NULL is bound with [`PreparedStatement::set_null`]
//! or `set_object(i, SqlValue::Null)`.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::io::Read;

use crate::value::{Decimal, LargeObject, SqlValue};

/// A readable stream bound to a parameter.
pub type InputStream = Box<dyn Read + Send>;

pub trait PreparedStatement {
    type Error;
    type ResultSet;
    type ResultSetMetaData;
    type ParameterMetaData;
    type Warning;
    type Connection;
    type Blob: LargeObject;
    type Clob: LargeObject;
    type NClob: LargeObject;
    type Array;
    type Ref;
    type RowId;
    type SqlXml;

    // =========================================================================
    // Binds
    // =========================================================================

    fn set_null(&self, index: usize, sql_type: i32) -> Result<(), Self::Error>;
    fn set_null_typed(&self, index: usize, sql_type: i32, type_name: &str)
        -> Result<(), Self::Error>;
    fn set_boolean(&self, index: usize, value: bool) -> Result<(), Self::Error>;
    fn set_byte(&self, index: usize, value: i8) -> Result<(), Self::Error>;
    fn set_short(&self, index: usize, value: i16) -> Result<(), Self::Error>;
    fn set_int(&self, index: usize, value: i32) -> Result<(), Self::Error>;
    fn set_long(&self, index: usize, value: i64) -> Result<(), Self::Error>;
    fn set_float(&self, index: usize, value: f32) -> Result<(), Self::Error>;
    fn set_double(&self, index: usize, value: f64) -> Result<(), Self::Error>;
    fn set_big_decimal(&self, index: usize, value: &Decimal) -> Result<(), Self::Error>;
    fn set_string(&self, index: usize, value: &str) -> Result<(), Self::Error>;
    fn set_nstring(&self, index: usize, value: &str) -> Result<(), Self::Error>;
    fn set_bytes(&self, index: usize, value: &[u8]) -> Result<(), Self::Error>;
    fn set_date(&self, index: usize, value: NaiveDate) -> Result<(), Self::Error>;
    fn set_date_in_zone(
        &self,
        index: usize,
        value: NaiveDate,
        zone: FixedOffset,
    ) -> Result<(), Self::Error>;
    fn set_time(&self, index: usize, value: NaiveTime) -> Result<(), Self::Error>;
    fn set_time_in_zone(
        &self,
        index: usize,
        value: NaiveTime,
        zone: FixedOffset,
    ) -> Result<(), Self::Error>;
    fn set_timestamp(&self, index: usize, value: NaiveDateTime) -> Result<(), Self::Error>;
    fn set_timestamp_in_zone(
        &self,
        index: usize,
        value: NaiveDateTime,
        zone: FixedOffset,
    ) -> Result<(), Self::Error>;
    fn set_url(&self, index: usize, url: &str) -> Result<(), Self::Error>;
    fn set_ascii_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: Option<u64>,
    ) -> Result<(), Self::Error>;
    fn set_binary_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: Option<u64>,
    ) -> Result<(), Self::Error>;
    fn set_unicode_stream(
        &self,
        index: usize,
        stream: InputStream,
        length: u64,
    ) -> Result<(), Self::Error>;
    fn set_character_stream(
        &self,
        index: usize,
        reader: InputStream,
        length: Option<u64>,
    ) -> Result<(), Self::Error>;
    fn set_ncharacter_stream(
        &self,
        index: usize,
        reader: InputStream,
        length: Option<u64>,
    ) -> Result<(), Self::Error>;
    fn set_blob(&self, index: usize, value: Self::Blob) -> Result<(), Self::Error>;
    fn set_clob(&self, index: usize, value: Self::Clob) -> Result<(), Self::Error>;
    fn set_nclob(&self, index: usize, value: Self::NClob) -> Result<(), Self::Error>;
    fn set_array(&self, index: usize, value: Self::Array) -> Result<(), Self::Error>;
    fn set_ref(&self, index: usize, value: Self::Ref) -> Result<(), Self::Error>;
    fn set_row_id(&self, index: usize, value: Self::RowId) -> Result<(), Self::Error>;
    fn set_sqlxml(&self, index: usize, value: Self::SqlXml) -> Result<(), Self::Error>;
    fn set_object(&self, index: usize, value: SqlValue) -> Result<(), Self::Error>;
    fn set_object_typed(
        &self,
        index: usize,
        value: SqlValue,
        target_sql_type: i32,
        scale_or_length: Option<i32>,
    ) -> Result<(), Self::Error>;

    // =========================================================================
    // Executions and reset
    // =========================================================================

    fn execute_query(&self) -> Result<Self::ResultSet, Self::Error>;
    fn execute_update(&self) -> Result<i32, Self::Error>;
    fn execute(&self) -> Result<bool, Self::Error>;
    fn execute_large_update(&self) -> Result<i64, Self::Error>;
    fn clear_parameters(&self) -> Result<(), Self::Error>;

    // =========================================================================
    // Everything else
    // =========================================================================

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
    /// Seconds; zero means no limit.
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
