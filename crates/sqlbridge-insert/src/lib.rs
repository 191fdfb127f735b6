//! Row insertion for sqlbridge.
//!
//! `sqlbridge-insert` turns a [`Row`](sqlbridge_core::Row) of
//! column-name/value pairs into parameterized `INSERT` statements against a
//! table resolved through a [`SchemaProvider`](sqlbridge_schema::SchemaProvider),
//! and can return the inserted row including its server-generated identity.
//!
//! # Retrieval
//!
//! When a result is required and the table has an identity column, the
//! inserted row is re-read with `SELECT * FROM t WHERE id = <identity fn>`.
//! Providers that accept compound statements get the insert and the select in
//! one round trip; others run the select as a second statement on the same
//! connection.
//!
//! # Routing
//!
//! [`ProviderRegistry`] holds per-provider [`ProviderCapabilities`] and may
//! carry custom [`SingleRowInserter`] / [`BatchInserter`] strategies, which
//! take precedence over the generic path whenever registered.
//!
//! # Connections
//!
//! [`ExecutionContext`] selects between an ambient connection, an ambient
//! transaction, or a connection opened (and closed) for the call.

pub mod batch;
pub mod capabilities;
pub mod command;
pub mod context;
pub mod inserter;
pub mod registry;
pub mod statement;

pub use batch::{BatchScope, GenericBatchInserter, RowErrorAction, RowErrorHandler, validate_rows};
pub use capabilities::{PlaceholderStyle, ProviderCapabilities};
pub use command::{Command, ScopedConnection, StatementExecutor};
pub use context::ExecutionContext;
pub use inserter::{InsertOptions, InsertRequest, RowInserter};
pub use registry::{BatchInserter, ProviderEntry, ProviderRegistry, SingleRowInserter};
pub use statement::{InsertPlan, Retrieval, identity_select, insert_command, plan_insert, validate_row};
