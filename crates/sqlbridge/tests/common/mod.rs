//! In-memory driver used by the integration tests.
//!
//! Understands exactly the statements the insert pipeline generates:
//! `INSERT INTO <t> (<cols>) VALUES (...)`, `SELECT * FROM <t> WHERE <id> = <fn>`,
//! and both joined by `"; "`. Each insert is assigned the next identity value,
//! which the select then reads back.

#![allow(dead_code)]

use asupersync::{Cx, Outcome};
use sqlbridge::{
    Connection, ConnectionError, ConnectionErrorKind, ConnectionFactory, Dialect, Error, QueryError,
    QueryErrorKind, Result, Row, TransactionOps, Value,
};
use std::future::Future;
use std::sync::{Arc, Mutex};

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

pub fn expect_err<T: std::fmt::Debug>(outcome: Outcome<T, Error>) -> Error {
    match outcome {
        Outcome::Err(e) => e,
        other => panic!("expected error, got {other:?}"),
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    /// Every statement received, in order, with its parameters.
    pub statements: Vec<(String, Vec<Value>)>,
    /// Stored rows: (table, row).
    pub rows: Vec<(String, Row)>,
    pub last_identity: Option<i64>,
    pub next_identity: i64,
    /// Statements with this parameter fail with a constraint violation.
    pub reject_param: Option<Value>,
    pub fail_connect: bool,
    pub fail_close: bool,
    pub opened: usize,
    pub closed: usize,
    pub committed: usize,
    pub rolled_back: usize,
    /// Statements received through a [`MockTransaction`].
    pub in_transaction: usize,
}

pub type Shared = Arc<Mutex<MockState>>;

pub fn new_state() -> Shared {
    Arc::new(Mutex::new(MockState {
        next_identity: 1,
        ..MockState::default()
    }))
}

fn unquote(ident: &str) -> String {
    ident
        .trim()
        .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
        .to_string()
}

/// Last dot-separated segment of a qualified, quoted name.
fn table_key(qualified: &str) -> String {
    qualified
        .rsplit('.')
        .next()
        .map(unquote)
        .unwrap_or_default()
}

impl MockState {
    fn run(&mut self, sql: &str, params: &[Value]) -> std::result::Result<(u64, Option<Row>), Error> {
        self.statements.push((sql.to_string(), params.to_vec()));
        if let Some(reject) = &self.reject_param {
            if params.contains(reject) {
                return Err(Error::Query(QueryError {
                    kind: QueryErrorKind::Constraint,
                    sql: Some(sql.to_string()),
                    sqlstate: Some("23505".to_string()),
                    message: "duplicate key value violates unique constraint".to_string(),
                    source: None,
                }));
            }
        }

        let mut affected = 0;
        let mut last_row = None;
        for part in sql.split("; ") {
            if let Some(rest) = part.strip_prefix("INSERT INTO ") {
                let open = rest.find(" (").unwrap_or(rest.len());
                let table = table_key(&rest[..open]);
                let close = rest.find(')').unwrap_or(rest.len());
                let columns: Vec<String> = rest[open + 2..close].split(", ").map(unquote).collect();

                let id = self.next_identity;
                self.next_identity += 1;
                self.last_identity = Some(id);

                let mut names = vec!["id".to_string()];
                names.extend(columns);
                let mut values = vec![Value::BigInt(id)];
                values.extend(params.iter().cloned());
                self.rows.push((table, Row::new(names, values)));
                affected += 1;
            } else if let Some(rest) = part.strip_prefix("SELECT * FROM ") {
                let table = table_key(rest.split(" WHERE ").next().unwrap_or_default());
                last_row = self.last_identity.and_then(|id| {
                    self.rows
                        .iter()
                        .find(|(t, row)| {
                            *t == table && row.get_by_name("id") == Some(&Value::BigInt(id))
                        })
                        .map(|(_, row)| row.clone())
                });
            } else {
                return Err(Error::Query(QueryError {
                    kind: QueryErrorKind::Syntax,
                    sql: Some(sql.to_string()),
                    sqlstate: Some("42601".to_string()),
                    message: format!("unsupported statement: {part}"),
                    source: None,
                }));
            }
        }
        Ok((affected, last_row))
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements.iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub fn rows_in(&self, table: &str) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }
}

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, MockState> {
    state.lock().expect("lock poisoned")
}

#[derive(Debug, Clone)]
pub struct MockConnection {
    pub state: Shared,
    pub dialect: Dialect,
}

impl MockConnection {
    pub fn new(state: Shared, dialect: Dialect) -> Self {
        Self { state, dialect }
    }
}

impl Connection for MockConnection {
    type Tx<'conn>
        = MockTransaction
    where
        Self: 'conn;

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query_one(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let result = lock(&self.state).run(sql, params);
        async move {
            match result {
                Ok((_, row)) => Outcome::Ok(row),
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn execute(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let result = lock(&self.state).run(sql, params);
        async move {
            match result {
                Ok((affected, _)) => Outcome::Ok(affected),
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn begin(&self, _cx: &Cx) -> impl Future<Output = Outcome<Self::Tx<'_>, Error>> + Send {
        let tx = MockTransaction {
            state: Arc::clone(&self.state),
            dialect: self.dialect,
        };
        async move { Outcome::Ok(tx) }
    }

    fn close(self, _cx: &Cx) -> impl Future<Output = Result<()>> + Send {
        let result = {
            let mut guard = lock(&self.state);
            guard.closed += 1;
            if guard.fail_close {
                Err(Error::Connection(ConnectionError {
                    kind: ConnectionErrorKind::Close,
                    message: "connection reset during close".to_string(),
                    source: None,
                }))
            } else {
                Ok(())
            }
        };
        async move { result }
    }
}

#[derive(Debug)]
pub struct MockTransaction {
    pub state: Shared,
    pub dialect: Dialect,
}

impl TransactionOps for MockTransaction {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query_one(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let result = {
            let mut guard = lock(&self.state);
            guard.in_transaction += 1;
            guard.run(sql, params)
        };
        async move {
            match result {
                Ok((_, row)) => Outcome::Ok(row),
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn execute(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let result = {
            let mut guard = lock(&self.state);
            guard.in_transaction += 1;
            guard.run(sql, params)
        };
        async move {
            match result {
                Ok((affected, _)) => Outcome::Ok(affected),
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn commit(self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        lock(&self.state).committed += 1;
        async { Outcome::Ok(()) }
    }

    fn rollback(self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        lock(&self.state).rolled_back += 1;
        async { Outcome::Ok(()) }
    }
}

/// Opens [`MockConnection`]s over shared state, counting opens.
#[derive(Debug, Clone)]
pub struct MockFactory {
    pub state: Shared,
    pub dialect: Dialect,
}

impl MockFactory {
    pub fn new(state: Shared, dialect: Dialect) -> Self {
        Self { state, dialect }
    }
}

impl ConnectionFactory for MockFactory {
    type Conn = MockConnection;

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn connect(&self, _cx: &Cx) -> impl Future<Output = Outcome<MockConnection, Error>> + Send {
        let result = {
            let mut guard = lock(&self.state);
            if guard.fail_connect {
                Err(Error::Connection(ConnectionError {
                    kind: ConnectionErrorKind::Connect,
                    message: "connection refused".to_string(),
                    source: None,
                }))
            } else {
                guard.opened += 1;
                Ok(MockConnection::new(Arc::clone(&self.state), self.dialect))
            }
        };
        async move {
            match result {
                Ok(conn) => Outcome::Ok(conn),
                Err(e) => Outcome::Err(e),
            }
        }
    }
}

/// `users(id identity, name, email)` quoted for `dialect`.
pub fn users_table(dialect: Dialect) -> sqlbridge::Table {
    sqlbridge::Table::builder("users")
        .dialect(dialect)
        .identity("id")
        .column("name")
        .column("email")
        .build()
}

/// `logs(msg)` with no identity column.
pub fn logs_table(dialect: Dialect) -> sqlbridge::Table {
    sqlbridge::Table::builder("logs")
        .dialect(dialect)
        .column("msg")
        .build()
}

pub fn schema(dialect: Dialect) -> sqlbridge::InMemorySchema {
    sqlbridge::InMemorySchema::new()
        .with_table(users_table(dialect))
        .with_table(logs_table(dialect))
}

pub fn user(name: &str) -> Row {
    Row::from_pairs([
        ("name", Value::from(name)),
        ("email", Value::from(format!("{}@example.com", name.to_lowercase()))),
    ])
}
