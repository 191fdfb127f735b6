//! Database connection traits.
//!
//! Drivers implement the async, generic traits:
//!
//! - [`Connection`] - executes statements and starts transactions
//! - [`TransactionOps`] - executes statements inside a transaction
//! - [`ConnectionFactory`] - opens new connections on demand
//!
//! The insertion pipeline holds its handles through the object-safe views
//! [`Executor`], [`OwnedConnection`] and [`ConnectionSource`], which use boxed
//! futures so strategies can be stored as trait objects. Every `Connection` is
//! an `Executor`; transactions become one through [`TransactionHandle`].
//!
//! All operations take a `Cx` context for cancellation and timeout handling.

use crate::dialect::{Dialect, ProviderId};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::Value;
use asupersync::{Cx, Outcome};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future borrowing from `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A database connection capable of executing statements.
///
/// # Example
///
/// ```rust,ignore
/// let row = conn.query_one(&cx, "SELECT * FROM users WHERE id = $1", &[Value::Int(1)]).await;
/// let tx = conn.begin(&cx).await?;
/// tx.execute(&cx, "INSERT INTO logs (msg) VALUES ($1)", &[Value::Text("action".into())]).await;
/// tx.commit(&cx).await;
/// ```
pub trait Connection: Send + Sync {
    /// The transaction type returned by this connection.
    type Tx<'conn>: TransactionOps
    where
        Self: 'conn;

    /// The SQL dialect this connection speaks.
    fn dialect(&self) -> Dialect;

    /// Registry key of the provider behind this connection.
    fn provider_id(&self) -> ProviderId {
        self.dialect().provider_id()
    }

    /// Execute a query and return the first row, if any.
    fn query_one(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send;

    /// Execute a statement (INSERT, UPDATE, DELETE) and return rows affected.
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Begin a transaction.
    fn begin(&self, cx: &Cx) -> impl Future<Output = Outcome<Self::Tx<'_>, Error>> + Send;

    /// Close the connection gracefully.
    fn close(self, cx: &Cx) -> impl Future<Output = Result<()>> + Send;
}

/// Trait for transaction operations.
///
/// Transactions must be explicitly committed or rolled back by their owner.
pub trait TransactionOps: Send + Sync {
    /// The SQL dialect of the underlying connection.
    fn dialect(&self) -> Dialect;

    /// Registry key of the provider behind this transaction.
    fn provider_id(&self) -> ProviderId {
        self.dialect().provider_id()
    }

    /// Execute a query and return the first row, if any.
    fn query_one(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send;

    /// Execute a statement within this transaction.
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Commit the transaction, making all changes permanent.
    fn commit(self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Rollback the transaction, discarding all changes.
    fn rollback(self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;
}

/// Object-safe statement execution on a connection or transaction.
pub trait Executor: Send + Sync {
    /// Registry key of the provider this executor talks to.
    fn provider_id(&self) -> ProviderId;

    /// Run a row-returning statement and hand back its first row.
    fn query_first<'a>(
        &'a self,
        cx: &'a Cx,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Outcome<Option<Row>, Error>>;

    /// Run a statement and return the number of rows affected.
    fn execute_statement<'a>(
        &'a self,
        cx: &'a Cx,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Outcome<u64, Error>>;
}

impl<C: Connection> Executor for C {
    fn provider_id(&self) -> ProviderId {
        Connection::provider_id(self)
    }

    fn query_first<'a>(
        &'a self,
        cx: &'a Cx,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Outcome<Option<Row>, Error>> {
        Box::pin(self.query_one(cx, sql, params))
    }

    fn execute_statement<'a>(
        &'a self,
        cx: &'a Cx,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Outcome<u64, Error>> {
        Box::pin(self.execute(cx, sql, params))
    }
}

/// Borrowed transaction viewed as an [`Executor`].
#[derive(Debug)]
pub struct TransactionHandle<'t, T> {
    tx: &'t T,
}

impl<'t, T: TransactionOps> TransactionHandle<'t, T> {
    pub fn new(tx: &'t T) -> Self {
        Self { tx }
    }
}

impl<T: TransactionOps> Executor for TransactionHandle<'_, T> {
    fn provider_id(&self) -> ProviderId {
        self.tx.provider_id()
    }

    fn query_first<'a>(
        &'a self,
        cx: &'a Cx,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Outcome<Option<Row>, Error>> {
        Box::pin(self.tx.query_one(cx, sql, params))
    }

    fn execute_statement<'a>(
        &'a self,
        cx: &'a Cx,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Outcome<u64, Error>> {
        Box::pin(self.tx.execute(cx, sql, params))
    }
}

/// A connection opened on behalf of a single call, to be closed by its opener.
pub trait OwnedConnection: Executor {
    /// View this connection as a plain executor.
    fn as_executor(&self) -> &dyn Executor;

    /// Close the connection, consuming it.
    fn close_boxed<'a>(self: Box<Self>, cx: &'a Cx) -> BoxFuture<'a, Result<()>>;
}

impl<C: Connection + 'static> OwnedConnection for C {
    fn as_executor(&self) -> &dyn Executor {
        self
    }

    fn close_boxed<'a>(self: Box<Self>, cx: &'a Cx) -> BoxFuture<'a, Result<()>> {
        Box::pin((*self).close(cx))
    }
}

/// Opens new connections for calls that run without an ambient handle.
pub trait ConnectionFactory: Send + Sync {
    /// The connection type produced.
    type Conn: Connection + 'static;

    /// The dialect of the connections this factory opens.
    fn dialect(&self) -> Dialect;

    /// Open a new connection.
    fn connect(&self, cx: &Cx) -> impl Future<Output = Outcome<Self::Conn, Error>> + Send;
}

/// Object-safe view of a [`ConnectionFactory`].
pub trait ConnectionSource: Send + Sync {
    /// Registry key of the provider behind the connections opened here.
    fn provider_id(&self) -> ProviderId;

    /// Open a new connection owned by the caller.
    fn open<'a>(&'a self, cx: &'a Cx) -> BoxFuture<'a, Outcome<Box<dyn OwnedConnection>, Error>>;
}

impl<F: ConnectionFactory> ConnectionSource for F {
    fn provider_id(&self) -> ProviderId {
        self.dialect().provider_id()
    }

    fn open<'a>(&'a self, cx: &'a Cx) -> BoxFuture<'a, Outcome<Box<dyn OwnedConnection>, Error>> {
        Box::pin(async move {
            match self.connect(cx).await {
                Outcome::Ok(conn) => Outcome::Ok(Box::new(conn) as Box<dyn OwnedConnection>),
                Outcome::Err(e) => Outcome::Err(e),
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        })
    }
}
