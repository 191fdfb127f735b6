//! Schema metadata for sqlbridge.
//!
//! The insertion pipeline never introspects a database itself; it asks a
//! [`SchemaProvider`] for a [`Table`] on every call. [`InMemorySchema`] is a
//! provider backed by tables declared up front with [`TableBuilder`].

pub mod provider;
pub mod table;

pub use provider::{InMemorySchema, SchemaProvider};
pub use table::{Column, Table, TableBuilder};
