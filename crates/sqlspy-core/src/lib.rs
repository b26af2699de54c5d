//! sqlspy core
//!
//! Logs every prepared-statement execution with its literal SQL, by
//! redirecting the driver's `prepareStatement` through a proxy.
//!
//! # Core Modules
//!
//! - [`rewriter`]: ModuleRewriter, which redirects the target method in a class file
//! - [`transformer`]: the fail-open hook a host calls for every loaded module
//! - [`proxy`]: StatementProxy, which records binds and logs executions
//! - [`trace`]: per-statement record of rendered arguments
//! - [`formatter`]: renders bound values as SQL literals
//! - [`surface`]: the PreparedStatement operation surface
//! - [`connection`]: SpyConnection, the in-process form of the redirect
//! - [`testing`]: recording statement and connection for tests
//!
//! # Example
//!
//! ```
//! use sqlspy_core::connection::{Connection, SpyConnection, CONCUR_READ_ONLY, TYPE_FORWARD_ONLY};
//! use sqlspy_core::surface::PreparedStatement;
//! use sqlspy_core::testing::RecordingConnection;
//! use sqlspy_types::{MemorySink, ProxySettings};
//!
//! let sink = MemorySink::shared();
//! let conn = SpyConnection::new(RecordingConnection::default(), ProxySettings::default(), sink.clone());
//! let stmt = conn
//!     .prepare_statement("UPDATE t SET v=? WHERE id=?", TYPE_FORWARD_ONLY, CONCUR_READ_ONLY)
//!     .unwrap();
//! stmt.set_string(1, "x").unwrap();
//! stmt.set_int(2, 3).unwrap();
//! stmt.execute_update().unwrap();
//! assert_eq!(sink.literal_sql(), vec!["UPDATE t SET v='x' WHERE id=3"]);
//! ```

#![allow(clippy::too_many_arguments)]

pub mod connection;
pub mod formatter;
pub mod proxy;
pub mod rewriter;
pub mod surface;
pub mod testing;
pub mod trace;
pub mod transformer;
pub mod value;

pub use connection::{Connection, SpyConnection};
pub use formatter::{format_value, FormatError};
pub use proxy::StatementProxy;
pub use rewriter::{ModuleRewriter, RewriteOutcome, RewriteReport};
pub use surface::{InputStream, PreparedStatement};
pub use trace::ArgumentTrace;
pub use transformer::{ModuleTransformer, StatementTransformer, TransformStats};
pub use value::{Decimal, LargeObject, SqlObject, SqlValue, ValueKind};
