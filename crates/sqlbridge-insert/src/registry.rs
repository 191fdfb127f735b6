//! Provider registry: capabilities and custom insert strategies per provider.

use crate::batch::{BatchScope, RowErrorHandler};
use crate::capabilities::ProviderCapabilities;
use crate::context::ExecutionContext;
use asupersync::{Cx, Outcome};
use sqlbridge_core::{BoxFuture, ConfigError, Dialect, Error, ProviderId, Result, Row};
use sqlbridge_schema::Table;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A provider-specific replacement for the generic single-row insert.
///
/// When registered it receives every single-row insert for its provider,
/// including the per-row inserts of the generic batch path. The row has
/// already been validated against the table.
pub trait SingleRowInserter: Send + Sync {
    fn insert<'a>(
        &'a self,
        cx: &'a Cx,
        table: &'a Table,
        row: &'a Row,
        context: &'a ExecutionContext<'a>,
        result_required: bool,
    ) -> BoxFuture<'a, Outcome<Option<Row>, Error>>;
}

/// A provider-specific replacement for the generic batch insert.
///
/// Every row has already been validated. When `result_required` is false
/// the returned vector may be empty.
pub trait BatchInserter: Send + Sync {
    fn insert_many<'a>(
        &'a self,
        cx: &'a Cx,
        scope: BatchScope<'a>,
        rows: Vec<Row>,
        on_row_error: Option<&'a RowErrorHandler<'a>>,
        result_required: bool,
    ) -> BoxFuture<'a, Outcome<Vec<Row>, Error>>;
}

/// Everything the pipeline knows about one provider.
#[derive(Clone, Default)]
pub struct ProviderEntry {
    capabilities: ProviderCapabilities,
    single: Option<Arc<dyn SingleRowInserter>>,
    batch: Option<Arc<dyn BatchInserter>>,
}

impl ProviderEntry {
    pub fn new(capabilities: ProviderCapabilities) -> Self {
        Self {
            capabilities,
            single: None,
            batch: None,
        }
    }

    pub fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    pub fn single_inserter(&self) -> Option<&dyn SingleRowInserter> {
        self.single.as_deref()
    }

    pub fn batch_inserter(&self) -> Option<&dyn BatchInserter> {
        self.batch.as_deref()
    }
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("capabilities", &self.capabilities)
            .field("custom_single", &self.single.is_some())
            .field("custom_batch", &self.batch.is_some())
            .finish()
    }
}

/// Maps provider ids to their [`ProviderEntry`].
///
/// Providers without an entry get the fallback: no identity function, no
/// compound statements and `?` placeholders.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: HashMap<ProviderId, ProviderEntry>,
    fallback: ProviderEntry,
}

impl ProviderRegistry {
    /// An empty registry. Every provider resolves to the fallback entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in sqlite, postgres, mysql and mssql entries.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for dialect in [
            Dialect::Sqlite,
            Dialect::Postgres,
            Dialect::Mysql,
            Dialect::Mssql,
        ] {
            registry.set_capabilities(
                dialect.provider_id(),
                ProviderCapabilities::for_dialect(dialect),
            );
        }
        registry
    }

    /// Build a registry from a JSON object keyed by provider id.
    ///
    /// Entries replace the built-in capabilities of the same provider; other
    /// built-ins are kept.
    ///
    /// ```rust,ignore
    /// let registry = ProviderRegistry::from_json(r#"{
    ///     "mysql": { "identity_function": "LAST_INSERT_ID()", "supports_compound_statements": true },
    ///     "firebird": { "placeholder": "question" }
    /// }"#)?;
    /// ```
    #[allow(clippy::result_large_err)]
    pub fn from_json(json: &str) -> Result<Self> {
        let providers: HashMap<ProviderId, ProviderCapabilities> =
            serde_json::from_str(json).map_err(|e| {
                Error::Config(ConfigError {
                    message: format!("invalid provider configuration: {e}"),
                    source: Some(Box::new(e)),
                })
            })?;

        let mut registry = Self::with_defaults();
        for (id, capabilities) in providers {
            tracing::debug!(provider = %id, ?capabilities, "Configured provider");
            registry.set_capabilities(id, capabilities);
        }
        Ok(registry)
    }

    /// Set the capabilities of a provider, keeping any registered strategies.
    pub fn set_capabilities(
        &mut self,
        id: impl Into<ProviderId>,
        capabilities: ProviderCapabilities,
    ) -> &mut Self {
        self.entries.entry(id.into()).or_default().capabilities = capabilities;
        self
    }

    /// Route every single-row insert for `id` through `inserter`.
    pub fn register_single_inserter(
        &mut self,
        id: impl Into<ProviderId>,
        inserter: Arc<dyn SingleRowInserter>,
    ) -> &mut Self {
        let id = id.into();
        tracing::debug!(provider = %id, "Registered custom single-row inserter");
        self.entry_mut(id).single = Some(inserter);
        self
    }

    /// Route every batch insert for `id` through `inserter`.
    pub fn register_batch_inserter(
        &mut self,
        id: impl Into<ProviderId>,
        inserter: Arc<dyn BatchInserter>,
    ) -> &mut Self {
        let id = id.into();
        tracing::debug!(provider = %id, "Registered custom batch inserter");
        self.entry_mut(id).batch = Some(inserter);
        self
    }

    /// Entry for `id`, or the fallback if the provider is unknown.
    pub fn entry(&self, id: &ProviderId) -> &ProviderEntry {
        self.entries.get(id).unwrap_or(&self.fallback)
    }

    pub fn capabilities(&self, id: &ProviderId) -> &ProviderCapabilities {
        self.entry(id).capabilities()
    }

    pub fn custom_single_inserter(&self, id: &ProviderId) -> Option<&dyn SingleRowInserter> {
        self.entry(id).single_inserter()
    }

    pub fn custom_batch_inserter(&self, id: &ProviderId) -> Option<&dyn BatchInserter> {
        self.entry(id).batch_inserter()
    }

    pub fn contains(&self, id: &ProviderId) -> bool {
        self.entries.contains_key(id)
    }

    /// A new entry starts from the fallback capabilities.
    fn entry_mut(&mut self, id: ProviderId) -> &mut ProviderEntry {
        let fallback = &self.fallback.capabilities;
        self.entries
            .entry(id)
            .or_insert_with(|| ProviderEntry::new(fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::PlaceholderStyle;

    struct NoopInserter;

    impl SingleRowInserter for NoopInserter {
        fn insert<'a>(
            &'a self,
            _cx: &'a Cx,
            _table: &'a Table,
            _row: &'a Row,
            _context: &'a ExecutionContext<'a>,
            _result_required: bool,
        ) -> BoxFuture<'a, Outcome<Option<Row>, Error>> {
            Box::pin(async { Outcome::Ok(None) })
        }
    }

    #[test]
    fn test_defaults_cover_builtin_providers() {
        let registry = ProviderRegistry::with_defaults();
        for id in ["sqlite", "postgres", "mysql", "mssql"] {
            assert!(registry.contains(&ProviderId::from_static(id)), "{id}");
        }
        let sqlite = registry.capabilities(&ProviderId::from_static("sqlite"));
        assert_eq!(sqlite.identity_function(), Some("last_insert_rowid()"));
    }

    #[test]
    fn test_unknown_provider_uses_fallback() {
        let registry = ProviderRegistry::with_defaults();
        let caps = registry.capabilities(&ProviderId::from_static("firebird"));
        assert_eq!(caps, &ProviderCapabilities::default());
        assert!(registry.custom_single_inserter(&ProviderId::from_static("firebird")).is_none());
        assert!(registry.custom_batch_inserter(&ProviderId::from_static("firebird")).is_none());
    }

    #[test]
    fn test_from_json_layers_over_defaults() {
        let registry = ProviderRegistry::from_json(
            r#"{
                "MySQL": { "identity_function": "LAST_INSERT_ID()", "supports_compound_statements": true },
                "firebird": { "placeholder": "numbered_question" }
            }"#,
        )
        .unwrap();

        let mysql = registry.capabilities(&ProviderId::from_static("mysql"));
        assert!(mysql.supports_compound_statements());
        assert_eq!(mysql.placeholder(), PlaceholderStyle::Question);

        let firebird = registry.capabilities(&ProviderId::from_static("firebird"));
        assert_eq!(firebird.placeholder(), PlaceholderStyle::NumberedQuestion);
        assert_eq!(firebird.identity_function(), None);

        assert!(registry.contains(&ProviderId::from_static("postgres")));
    }

    #[test]
    fn test_from_json_rejects_malformed_config() {
        match ProviderRegistry::from_json("{ \"mysql\": 3 }") {
            Err(Error::Config(e)) => assert!(e.message.contains("invalid provider configuration")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_register_strategy_keeps_capabilities() {
        let mut registry = ProviderRegistry::with_defaults();
        registry.register_single_inserter(Dialect::Postgres, Arc::new(NoopInserter));
        let entry = registry.entry(&ProviderId::from_static("postgres"));
        assert!(entry.single_inserter().is_some());
        assert!(entry.batch_inserter().is_none());
        assert_eq!(entry.capabilities().identity_function(), Some("lastval()"));

        registry.set_capabilities(Dialect::Postgres, ProviderCapabilities::new());
        let entry = registry.entry(&ProviderId::from_static("postgres"));
        assert!(entry.single_inserter().is_some());
        assert_eq!(entry.capabilities().identity_function(), None);
    }
}
