//! Schema providers.

use crate::table::Table;
use sqlbridge_core::{Result, SchemaError};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves table names to metadata.
///
/// Called once per insert call; implementations decide whether to cache.
pub trait SchemaProvider: Send + Sync {
    /// Find a table by name, failing with `SchemaErrorKind::TableNotFound` if absent.
    #[allow(clippy::result_large_err)]
    fn find_table(&self, name: &str) -> Result<Arc<Table>>;
}

impl<S: SchemaProvider + ?Sized> SchemaProvider for Arc<S> {
    fn find_table(&self, name: &str) -> Result<Arc<Table>> {
        (**self).find_table(name)
    }
}

/// A schema provider over tables declared up front.
///
/// Lookup is case-insensitive on the logical table name.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchema {
    tables: HashMap<String, Arc<Table>>,
}

impl InMemorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any table declared under the same name.
    pub fn add_table(&mut self, table: Table) {
        self.tables
            .insert(table.name().to_lowercase(), Arc::new(table));
    }

    /// Builder-style [`add_table`](Self::add_table).
    pub fn with_table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl SchemaProvider for InMemorySchema {
    fn find_table(&self, name: &str) -> Result<Arc<Table>> {
        self.tables
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| SchemaError::table_not_found(name).into())
    }
}
