//! Error types for sqlbridge operations.

use crate::value::Value;
use std::fmt;

/// The primary error type for all sqlbridge operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (connect, disconnect, close)
    Connection(ConnectionError),
    /// Driver-level query errors, as reported by a driver before translation
    Query(QueryError),
    /// Schema resolution errors (unknown table or column)
    Schema(SchemaError),
    /// The supplied row has no column that can be inserted
    NoInsertableColumns(NoInsertableColumnsError),
    /// A statement failed while executing; wraps the driver error
    Execution(ExecutionError),
    /// Configuration errors
    Config(ConfigError),
    /// Type conversion errors
    Type(TypeError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Connection lost during operation
    Disconnected,
    /// Closing the connection failed
    Close,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub sqlstate: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found by the server
    NotFound,
    /// Permission denied
    Permission,
    /// Statement timeout
    Timeout,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Table not found
    TableNotFound,
    /// Column not found
    ColumnNotFound,
    /// Invalid schema definition
    Invalid,
}

/// Raised before any SQL is built when a row maps to no existing,
/// non-identity column of the target table.
#[derive(Debug, Clone)]
pub struct NoInsertableColumnsError {
    /// Qualified name of the target table
    pub table: String,
    /// Position of the offending row inside a batch
    pub row_index: Option<usize>,
    /// Column names the caller supplied
    pub supplied: Vec<String>,
}

/// A statement as it was submitted when execution failed.
#[derive(Debug, Clone)]
pub struct FailedCommand {
    pub sql: String,
    pub columns: Vec<String>,
    pub params: Vec<Value>,
}

/// The single error kind for anything that fails while a statement runs.
#[derive(Debug)]
pub struct ExecutionError {
    /// Message of the originating driver error
    pub message: String,
    /// The command that failed
    pub command: FailedCommand,
    /// The originating driver error
    pub source: Option<Box<Error>>,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Is this a validation error the caller can fix by correcting input?
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::NoInsertableColumns(_))
    }

    /// Did this error come out of statement execution?
    pub fn is_execution(&self) -> bool {
        matches!(self, Error::Execution(_))
    }

    /// Get SQLSTATE if available, looking through execution wrappers.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sqlstate.as_deref(),
            Error::Execution(e) => e.source.as_deref().and_then(Error::sqlstate),
            _ => None,
        }
    }

    /// Get the SQL that caused this error, if available.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            Error::Execution(e) => Some(&e.command.sql),
            _ => None,
        }
    }
}

impl ExecutionError {
    /// Wrap a driver error raised while running `command`.
    ///
    /// The message is the driver error's own text, without the wrapper prefix.
    pub fn from_driver(source: Error, command: FailedCommand) -> Self {
        let message = match &source {
            Error::Query(q) => q.message.clone(),
            Error::Connection(c) => c.message.clone(),
            other => other.to_string(),
        };
        Self {
            message,
            command,
            source: Some(Box::new(source)),
        }
    }
}

impl NoInsertableColumnsError {
    pub fn new(table: impl Into<String>, supplied: Vec<String>) -> Self {
        Self {
            table: table.into(),
            row_index: None,
            supplied,
        }
    }

    /// Attach the batch position of the offending row.
    pub fn at_row(mut self, index: usize) -> Self {
        self.row_index = Some(index);
        self
    }
}

impl SchemaError {
    pub fn table_not_found(name: &str) -> Self {
        Self {
            kind: SchemaErrorKind::TableNotFound,
            message: format!("table '{}' not found", name),
        }
    }

    pub fn column_not_found(table: &str, column: &str) -> Self {
        Self {
            kind: SchemaErrorKind::ColumnNotFound,
            message: format!("column '{}' not found in table '{}'", column, table),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => {
                if let Some(sqlstate) = &e.sqlstate {
                    write!(f, "Query error (SQLSTATE {}): {}", sqlstate, e.message)
                } else {
                    write!(f, "Query error: {}", e.message)
                }
            }
            Error::Schema(e) => write!(f, "Schema error: {}", e.message),
            Error::NoInsertableColumns(e) => write!(f, "Validation error: {}", e),
            Error::Execution(e) => write!(f, "Execution error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Execution(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for NoInsertableColumnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no insertable columns for table '{}'", self.table)?;
        if let Some(index) = self.row_index {
            write!(f, " in row {}", index)?;
        }
        if self.supplied.is_empty() {
            write!(f, " (row is empty)")
        } else {
            write!(f, " (supplied: {})", self.supplied.join(", "))
        }
    }
}

impl fmt::Display for FailedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [command: {}]", self.message, self.command)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<NoInsertableColumnsError> for Error {
    fn from(err: NoInsertableColumnsError) -> Self {
        Error::NoInsertableColumns(err)
    }
}

impl From<ExecutionError> for Error {
    fn from(err: ExecutionError) -> Self {
        Error::Execution(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

/// Result type alias for sqlbridge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_error(sqlstate: Option<&str>) -> Error {
        Error::Query(QueryError {
            kind: QueryErrorKind::Constraint,
            sql: Some("INSERT INTO t (a) VALUES ($1)".to_string()),
            sqlstate: sqlstate.map(str::to_string),
            message: "duplicate key value".to_string(),
            source: None,
        })
    }

    fn command() -> FailedCommand {
        FailedCommand {
            sql: "INSERT INTO t (a) VALUES ($1)".to_string(),
            columns: vec!["a".to_string()],
            params: vec![Value::Int(1)],
        }
    }

    #[test]
    fn execution_error_keeps_driver_message() {
        let err = Error::Execution(ExecutionError::from_driver(driver_error(None), command()));
        assert!(err.is_execution());
        assert!(err.to_string().contains("duplicate key value"));
        assert!(err.to_string().contains("INSERT INTO t"));
        assert_eq!(err.sql(), Some("INSERT INTO t (a) VALUES ($1)"));
    }

    #[test]
    fn sqlstate_looks_through_execution() {
        let err = Error::Execution(ExecutionError::from_driver(
            driver_error(Some("23505")),
            command(),
        ));
        assert_eq!(err.sqlstate(), Some("23505"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn no_insertable_columns_message() {
        let err: Error =
            NoInsertableColumnsError::new("\"users\"", vec!["bogus".to_string()]).into();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Validation error: no insertable columns for table '\"users\"' (supplied: bogus)"
        );

        let batch = NoInsertableColumnsError::new("users", Vec::new()).at_row(2);
        assert_eq!(
            batch.to_string(),
            "no insertable columns for table 'users' in row 2 (row is empty)"
        );
    }

    #[test]
    fn schema_error_constructors() {
        let err = SchemaError::table_not_found("ghosts");
        assert_eq!(err.kind, SchemaErrorKind::TableNotFound);
        assert_eq!(err.message, "table 'ghosts' not found");

        let err = SchemaError::column_not_found("users", "age");
        assert_eq!(err.kind, SchemaErrorKind::ColumnNotFound);
    }
}
