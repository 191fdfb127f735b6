//! Per-provider facts the generic insert path depends on.

use serde::{Deserialize, Serialize};
use sqlbridge_core::Dialect;

/// How positional parameters are spelled in SQL text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `?` for every parameter (MySQL, ODBC)
    #[default]
    Question,
    /// `?1`, `?2`, ... (SQLite)
    NumberedQuestion,
    /// `$1`, `$2`, ... (PostgreSQL)
    Dollar,
    /// `@p1`, `@p2`, ... (SQL Server)
    AtP,
}

impl PlaceholderStyle {
    /// Placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::NumberedQuestion => format!("?{index}"),
            PlaceholderStyle::Dollar => format!("${index}"),
            PlaceholderStyle::AtP => format!("@p{index}"),
        }
    }
}

/// What a provider can do for identity retrieval.
///
/// Deserializable so deployments can describe providers in configuration:
///
/// ```json
/// { "identity_function": "lastval()", "supports_compound_statements": true, "placeholder": "dollar" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCapabilities {
    identity_function: Option<String>,
    supports_compound_statements: bool,
    placeholder: PlaceholderStyle,
}

impl ProviderCapabilities {
    /// Capabilities with no identity retrieval and no compound statements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SQL expression yielding the last identity generated on this session.
    pub fn with_identity_function(mut self, expr: impl Into<String>) -> Self {
        self.identity_function = Some(expr.into());
        self
    }

    /// Declare whether insert and select may share one statement.
    pub fn with_compound_statements(mut self, enabled: bool) -> Self {
        self.supports_compound_statements = enabled;
        self
    }

    pub fn with_placeholder(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder = style;
        self
    }

    /// The identity-retrieval expression; empty strings count as absent.
    pub fn identity_function(&self) -> Option<&str> {
        self.identity_function
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty())
    }

    pub fn supports_compound_statements(&self) -> bool {
        self.supports_compound_statements
    }

    pub fn placeholder(&self) -> PlaceholderStyle {
        self.placeholder
    }

    /// Built-in capabilities for a dialect.
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            // Prepared statements run one command: sqlite3_prepare stops at the
            // first `;` and the Postgres extended protocol rejects a second one.
            Dialect::Sqlite => Self::new()
                .with_identity_function("last_insert_rowid()")
                .with_compound_statements(false)
                .with_placeholder(PlaceholderStyle::NumberedQuestion),
            Dialect::Postgres => Self::new()
                .with_identity_function("lastval()")
                .with_compound_statements(false)
                .with_placeholder(PlaceholderStyle::Dollar),
            // Multi-statement text is off by default in MySQL client protocols.
            Dialect::Mysql => Self::new()
                .with_identity_function("LAST_INSERT_ID()")
                .with_compound_statements(false)
                .with_placeholder(PlaceholderStyle::Question),
            Dialect::Mssql => Self::new()
                .with_identity_function("SCOPE_IDENTITY()")
                .with_compound_statements(true)
                .with_placeholder(PlaceholderStyle::AtP),
        }
    }
}
