//! Provider identity and identifier quoting.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// SQL dialect spoken by a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL
    #[default]
    Postgres,
    /// SQLite
    Sqlite,
    /// MySQL / MariaDB
    Mysql,
    /// Microsoft SQL Server
    Mssql,
}

impl Dialect {
    /// The registry key for this dialect's provider.
    pub fn provider_id(self) -> ProviderId {
        ProviderId::from_static(self.as_str())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
            Dialect::Mssql => "mssql",
        }
    }

    /// Quote an identifier for this dialect.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => quote_ident(name),
            Dialect::Mysql => quote_ident_mysql(name),
            Dialect::Mssql => format!("[{}]", name.replace(']', "]]")),
        }
    }
}

/// Opaque key identifying a database provider in the capability registry.
///
/// Comparison is case-insensitive; ids are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProviderId(Cow<'static, str>);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into().to_ascii_lowercase()))
    }

    /// Build from a static id; the id should already be lowercase.
    pub fn from_static(id: &'static str) -> Self {
        if id.bytes().any(|b| b.is_ascii_uppercase()) {
            Self::new(id)
        } else {
            Self(Cow::Borrowed(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProviderId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<Dialect> for ProviderId {
    fn from(dialect: Dialect) -> Self {
        dialect.provider_id()
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.0.into_owned()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quote a SQL identifier using ANSI double-quoting.
///
/// Embedded double-quotes are escaped by doubling them (`"` → `""`).
///
/// # Examples
///
/// ```
/// use sqlbridge_core::quote_ident;
///
/// assert_eq!(quote_ident("users"), "\"users\"");
/// assert_eq!(quote_ident("user\"name"), "\"user\"\"name\"");
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL identifier using MySQL backtick quoting.
///
/// # Examples
///
/// ```
/// use sqlbridge_core::quote_ident_mysql;
///
/// assert_eq!(quote_ident_mysql("user`name"), "`user``name`");
/// ```
#[inline]
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_per_dialect() {
        assert_eq!(Dialect::Postgres.quote_identifier("users"), "\"users\"");
        assert_eq!(Dialect::Sqlite.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::Mysql.quote_identifier("select"), "`select`");
        assert_eq!(Dialect::Mssql.quote_identifier("odd]name"), "[odd]]name]");
    }

    #[test]
    fn test_quote_ident_sql_injection_attempt() {
        let quoted = quote_ident("users\"; DROP TABLE secrets; --");
        assert_eq!(quoted, "\"users\"\"; DROP TABLE secrets; --\"");
    }

    #[test]
    fn test_provider_id_is_case_insensitive() {
        assert_eq!(ProviderId::new("SQLite"), Dialect::Sqlite.provider_id());
        assert_eq!(ProviderId::from("Postgres").as_str(), "postgres");
        assert_eq!(ProviderId::from_static("MsSql").as_str(), "mssql");
    }

    #[test]
    fn test_provider_id_serde_roundtrip_as_string() {
        let id: ProviderId = serde_json::from_str("\"MySQL\"").unwrap();
        assert_eq!(id, Dialect::Mysql.provider_id());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"mysql\"");
    }
}
