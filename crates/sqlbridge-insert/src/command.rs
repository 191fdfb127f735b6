//! Statement execution with error translation and connection scoping.
//!
//! Every statement the insert path runs goes through [`StatementExecutor`],
//! which turns driver failures into [`Error::Execution`] carrying the driver
//! message and a snapshot of the failed [`Command`]. Cancellation and panics
//! pass through untouched.

use asupersync::{Cx, Outcome};
use sqlbridge_core::{
    ConnectionSource, Error, ExecutionError, Executor, FailedCommand, OwnedConnection, ProviderId,
    Row, Value,
};

/// SQL text plus its parameter bindings.
///
/// `columns[i]` names the column bound to `params[i]`; both come from a
/// single pass so they cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    sql: String,
    columns: Vec<String>,
    params: Vec<Value>,
}

impl Command {
    /// A command with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            columns: Vec::new(),
            params: Vec::new(),
        }
    }

    /// A command with `(column, value)` bindings in placeholder order.
    pub fn with_bindings(
        sql: impl Into<String>,
        bindings: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        let (columns, params) = bindings.into_iter().unzip();
        Self {
            sql: sql.into(),
            columns,
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Append a second statement to the text, keeping the bindings.
    pub fn append_statement(&mut self, separator: &str, sql: &str) {
        self.sql.push_str(separator);
        self.sql.push_str(sql);
    }

    /// Re-point the command at new, parameterless SQL.
    pub fn reset(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
        self.columns.clear();
        self.params.clear();
    }

    fn snapshot(&self) -> FailedCommand {
        FailedCommand {
            sql: self.sql.clone(),
            columns: self.columns.clone(),
            params: self.params.clone(),
        }
    }
}

/// Runs [`Command`]s against an executor.
#[derive(Clone, Copy)]
pub struct StatementExecutor<'e> {
    target: &'e dyn Executor,
}

impl<'e> StatementExecutor<'e> {
    pub fn new(target: &'e dyn Executor) -> Self {
        Self { target }
    }

    /// Execute a statement that returns no rows.
    pub async fn execute_non_query(&self, cx: &Cx, command: &Command) -> Outcome<u64, Error> {
        tracing::trace!(sql = %command.sql, params = command.params.len(), "Executing statement");
        let outcome = self
            .target
            .execute_statement(cx, &command.sql, &command.params)
            .await;
        translate(outcome, command)
    }

    /// Execute a row-returning statement and return its first row.
    pub async fn query_first(&self, cx: &Cx, command: &Command) -> Outcome<Option<Row>, Error> {
        tracing::trace!(sql = %command.sql, params = command.params.len(), "Executing query");
        let outcome = self
            .target
            .query_first(cx, &command.sql, &command.params)
            .await;
        translate(outcome, command)
    }
}

fn translate<T>(outcome: Outcome<T, Error>, command: &Command) -> Outcome<T, Error> {
    match outcome {
        Outcome::Ok(value) => Outcome::Ok(value),
        // Already translated by a nested executor.
        Outcome::Err(e @ Error::Execution(_)) => Outcome::Err(e),
        Outcome::Err(e) => {
            tracing::debug!(error = %e, sql = %command.sql, "Statement failed");
            Outcome::Err(Error::Execution(ExecutionError::from_driver(
                e,
                command.snapshot(),
            )))
        }
        Outcome::Cancelled(r) => Outcome::Cancelled(r),
        Outcome::Panicked(p) => Outcome::Panicked(p),
    }
}

/// A connection opened for one call.
///
/// Must be handed back with [`release`](Self::release), which closes it.
/// Dropping it unreleased drops the connection without a graceful close and
/// logs a warning.
pub struct ScopedConnection {
    conn: Box<dyn OwnedConnection>,
    guard: ReleaseGuard,
}

/// Warns on drop unless disarmed by [`ScopedConnection::release`].
struct ReleaseGuard {
    provider: ProviderId,
    armed: bool,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(provider = %self.provider, "Owned connection dropped without release");
        }
    }
}

impl ScopedConnection {
    /// Open a connection from `source`. Open failures are execution errors.
    pub async fn open(cx: &Cx, source: &dyn ConnectionSource) -> Outcome<Self, Error> {
        let provider = source.provider_id();
        tracing::trace!(provider = %provider, "Opening owned connection");
        match source.open(cx).await {
            Outcome::Ok(conn) => Outcome::Ok(Self {
                conn,
                guard: ReleaseGuard {
                    provider,
                    armed: true,
                },
            }),
            Outcome::Err(e @ Error::Execution(_)) => Outcome::Err(e),
            Outcome::Err(e) => {
                tracing::debug!(error = %e, provider = %provider, "Failed to open connection");
                Outcome::Err(Error::Execution(ExecutionError::from_driver(
                    e,
                    FailedCommand {
                        sql: String::new(),
                        columns: Vec::new(),
                        params: Vec::new(),
                    },
                )))
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    pub fn executor(&self) -> &dyn Executor {
        self.conn.as_executor()
    }

    /// Close the connection.
    ///
    /// A failed close is logged and otherwise ignored: the statements already
    /// ran and their outcome is what the caller reports.
    pub async fn release(self, cx: &Cx) {
        let Self { conn, mut guard } = self;
        guard.armed = false;
        match conn.close_boxed(cx).await {
            Ok(()) => tracing::trace!(provider = %guard.provider, "Closed owned connection"),
            Err(e) => {
                tracing::warn!(error = %e, provider = %guard.provider, "Failed to close owned connection");
            }
        }
    }
}

impl std::fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("provider", &self.guard.provider)
            .finish()
    }
}
