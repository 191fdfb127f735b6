//! Table and column metadata.

use sqlbridge_core::{Dialect, Result, SchemaError};
use std::collections::HashMap;

/// A column of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    quoted_name: String,
    identity: bool,
}

impl Column {
    /// Create a column with an already-quoted SQL identifier.
    pub fn new(name: impl Into<String>, quoted_name: impl Into<String>, identity: bool) -> Self {
        Self {
            name: name.into(),
            quoted_name: quoted_name.into(),
            identity,
        }
    }

    /// Logical column name, as callers spell it in a row.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quoted identifier to splice into SQL.
    pub fn quoted_name(&self) -> &str {
        &self.quoted_name
    }

    /// Whether the server generates this column's value on insert.
    pub fn is_identity(&self) -> bool {
        self.identity
    }
}

/// Metadata for one table: its qualified name and ordered columns.
///
/// Column lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    qualified_name: String,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
}

impl Table {
    /// Start declaring a table with the given logical name.
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(name)
    }

    /// Create a table from parts. Later duplicates of a column name are ignored.
    pub fn new(
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        columns: Vec<Column>,
    ) -> Self {
        let mut by_name = HashMap::with_capacity(columns.len());
        let mut unique = Vec::with_capacity(columns.len());
        for column in columns {
            let key = column.name.to_lowercase();
            if by_name.contains_key(&key) {
                tracing::warn!(column = %column.name, "Duplicate column declaration ignored");
                continue;
            }
            by_name.insert(key, unique.len());
            unique.push(column);
        }
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            columns: unique,
            by_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-addressed, quoted table identifier.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.columns[index])
    }

    /// Does `name` map to a column of this table?
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Look up a column by name, failing with a schema error if it is absent.
    #[allow(clippy::result_large_err)]
    pub fn find_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| SchemaError::column_not_found(&self.name, name).into())
    }

    /// The identity column, if the table has one.
    pub fn identity_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.identity)
    }

    /// Can a caller-supplied value for `name` be inserted?
    ///
    /// True when the column exists and is not an identity column.
    pub fn is_insertable(&self, name: &str) -> bool {
        self.column(name).is_some_and(|c| !c.identity)
    }
}

/// Builder for [`Table`] using a dialect's quoting rules.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    schema: Option<String>,
    dialect: Dialect,
    columns: Vec<(String, Option<String>, bool)>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            dialect: Dialect::default(),
            columns: Vec::new(),
        }
    }

    /// Qualify the table with a schema (or catalog) name.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Quote identifiers for this dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Add a regular column.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push((name.into(), None, false));
        self
    }

    /// Add a server-generated identity column.
    pub fn identity(mut self, name: impl Into<String>) -> Self {
        self.columns.push((name.into(), None, true));
        self
    }

    /// Add a column with an explicit quoted identifier.
    pub fn quoted_column(
        mut self,
        name: impl Into<String>,
        quoted: impl Into<String>,
        identity: bool,
    ) -> Self {
        self.columns.push((name.into(), Some(quoted.into()), identity));
        self
    }

    pub fn build(self) -> Table {
        let dialect = self.dialect;
        let qualified = match &self.schema {
            Some(schema) => format!(
                "{}.{}",
                dialect.quote_identifier(schema),
                dialect.quote_identifier(&self.name)
            ),
            None => dialect.quote_identifier(&self.name),
        };
        let columns = self
            .columns
            .into_iter()
            .map(|(name, quoted, identity)| {
                let quoted = quoted.unwrap_or_else(|| dialect.quote_identifier(&name));
                Column::new(name, quoted, identity)
            })
            .collect();
        Table::new(self.name, qualified, columns)
    }
}
