//! Connections whose prepared statements come back wrapped in a proxy.

use std::sync::Arc;

use sqlspy_types::{LogSink, ProxySettings};

use crate::proxy::StatementProxy;
use crate::surface::PreparedStatement;

/// JDBC `ResultSet.TYPE_FORWARD_ONLY`.
pub const TYPE_FORWARD_ONLY: i32 = 1003;
/// JDBC `ResultSet.CONCUR_READ_ONLY`.
pub const CONCUR_READ_ONLY: i32 = 1007;

pub trait Connection {
    type Statement: PreparedStatement;
    type Error;

    fn prepare_statement(
        &self,
        sql: &str,
        result_set_type: i32,
        result_set_concurrency: i32,
    ) -> Result<Self::Statement, Self::Error>;
}

/// Wraps a connection so that `prepare_statement` returns a [`StatementProxy`].
///
/// This is the in-process counterpart of a rewritten `prepareStatement`: call
/// the original, then wrap its result together with the SQL template.
pub struct SpyConnection<C> {
    inner: C,
    settings: ProxySettings,
    sink: Arc<dyn LogSink>,
}

impl<C> SpyConnection<C> {
    pub fn new(inner: C, settings: ProxySettings, sink: Arc<dyn LogSink>) -> Self {
        Self {
            inner,
            settings,
            sink,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Connection> Connection for SpyConnection<C> {
    type Statement = StatementProxy<C::Statement>;
    type Error = C::Error;

    fn prepare_statement(
        &self,
        sql: &str,
        result_set_type: i32,
        result_set_concurrency: i32,
    ) -> Result<Self::Statement, Self::Error> {
        let real = self
            .inner
            .prepare_statement(sql, result_set_type, result_set_concurrency)?;
        Ok(StatementProxy::new(
            sql,
            real,
            self.settings.clone(),
            Arc::clone(&self.sink),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingConnection, RecordingError};
    use sqlspy_types::MemorySink;

    #[test]
    fn test_prepared_statements_are_proxied() {
        let sink = MemorySink::shared();
        let conn = SpyConnection::new(
            RecordingConnection::default(),
            ProxySettings::default(),
            sink.clone(),
        );
        let stmt = conn
            .prepare_statement("DELETE FROM t WHERE id=?", TYPE_FORWARD_ONLY, CONCUR_READ_ONLY)
            .unwrap();
        assert_eq!(stmt.template(), "DELETE FROM t WHERE id=?");
        stmt.set_long(1, 9).unwrap();
        assert_eq!(stmt.execute_update().unwrap(), 1);
        assert_eq!(sink.literal_sql(), vec!["DELETE FROM t WHERE id=9"]);
        assert_eq!(
            conn.inner().prepared(),
            vec![("DELETE FROM t WHERE id=?".to_string(), 1003, 1007)]
        );
    }

    #[test]
    fn test_prepare_errors_propagate() {
        let conn = SpyConnection::new(
            RecordingConnection::failing("refused"),
            ProxySettings::default(),
            MemorySink::shared(),
        );
        let err = conn
            .prepare_statement("SELECT 1", TYPE_FORWARD_ONLY, CONCUR_READ_ONLY)
            .err()
            .unwrap();
        assert_eq!(err, RecordingError("refused".to_string()));
    }
}
