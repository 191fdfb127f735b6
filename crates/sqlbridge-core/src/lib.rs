//! Core types and traits for sqlbridge.
//!
//! This crate provides the foundational abstractions the insertion pipeline
//! is written against:
//!
//! - `Value` and `Row` for dynamically-typed column data
//! - `Error` for the uniform adapter error surface
//! - `Connection` / `TransactionOps` implemented by drivers
//! - `Executor` / `ConnectionSource`, the object-safe handles the pipeline holds
//! - `Dialect` and `ProviderId` for provider identity and identifier quoting
//! - `Outcome` re-export from asupersync for cancel-correct operations

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod connection;
pub mod dialect;
pub mod error;
pub mod row;
pub mod value;

pub use connection::{
    BoxFuture, Connection, ConnectionFactory, ConnectionSource, Executor, OwnedConnection,
    TransactionHandle, TransactionOps,
};
pub use dialect::{Dialect, ProviderId, quote_ident, quote_ident_mysql};
pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, ExecutionError, FailedCommand,
    NoInsertableColumnsError, QueryError, QueryErrorKind, Result, SchemaError, SchemaErrorKind,
    TypeError,
};
pub use row::{FromValue, Row};
pub use value::Value;
