//! sqlbridge - row insertion with identity retrieval for any relational database.
//!
//! sqlbridge sits between an application and a database driver and provides:
//!
//! - Parameterized `INSERT` generation from column-name/value rows
//! - Retrieval of the inserted row, including server-generated identity values
//! - Batch inserts with eager validation and per-row error handling
//! - Per-provider capabilities and pluggable insert strategies
//! - Execution on an ambient connection, an ambient transaction, or a
//!   connection opened for the call
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlbridge::prelude::*;
//!
//! async fn add_user(cx: &Cx, conn: &impl Connection) -> Outcome<Option<Row>, Error> {
//!     let schema = InMemorySchema::new().with_table(
//!         Table::builder("users")
//!             .dialect(conn.dialect())
//!             .identity("id")
//!             .column("name")
//!             .column("email")
//!             .build(),
//!     );
//!     let registry = ProviderRegistry::with_defaults();
//!     let inserter = RowInserter::new(&schema, &registry, ExecutionContext::with_connection(conn));
//!
//!     let row = Row::from_pairs([
//!         ("name", Value::from("Alice")),
//!         ("email", Value::from("alice@example.com")),
//!     ]);
//!     // Returns the stored row with its generated `id`.
//!     inserter.insert(cx, "users", &row, true).await
//! }
//! ```
//!
//! # Providers
//!
//! Capabilities are keyed by provider id (`"sqlite"`, `"postgres"`, `"mysql"`,
//! `"mssql"` built in) and can be loaded from JSON with
//! [`ProviderRegistry::from_json`]. A registered [`SingleRowInserter`] or
//! [`BatchInserter`] replaces the generic path for its provider.

pub use sqlbridge_core::{
    BoxFuture, ConfigError, Connection, ConnectionError, ConnectionErrorKind, ConnectionFactory,
    ConnectionSource, Cx, Dialect, Error, ExecutionError, Executor, FailedCommand, FromValue,
    NoInsertableColumnsError, Outcome, OwnedConnection, ProviderId, QueryError, QueryErrorKind,
    Result, Row, SchemaError, SchemaErrorKind, TransactionHandle, TransactionOps, TypeError, Value,
    quote_ident, quote_ident_mysql,
};
pub use sqlbridge_insert::{
    BatchInserter, BatchScope, Command, ExecutionContext, GenericBatchInserter, InsertOptions,
    InsertRequest, PlaceholderStyle, ProviderCapabilities, ProviderEntry, ProviderRegistry,
    RowErrorAction, RowErrorHandler, RowInserter, SingleRowInserter,
};
pub use sqlbridge_schema::{Column, InMemorySchema, SchemaProvider, Table, TableBuilder};

/// The commonly used types, for glob import.
pub mod prelude {
    pub use crate::{
        // Core traits and types
        Connection,
        ConnectionFactory,
        Cx,
        Dialect,
        Error,
        // Insertion
        ExecutionContext,
        // Schema
        InMemorySchema,
        InsertOptions,
        InsertRequest,
        Outcome,
        ProviderCapabilities,
        ProviderRegistry,
        Result,
        Row,
        RowErrorAction,
        RowInserter,
        SchemaProvider,
        Table,
        TransactionOps,
        Value,
    };
}
