//! Single-row insertion.

use crate::capabilities::ProviderCapabilities;
use crate::command::{ScopedConnection, StatementExecutor};
use crate::context::ExecutionContext;
use crate::registry::{ProviderEntry, ProviderRegistry};
use crate::statement::{InsertPlan, Retrieval, plan_insert, validate_row};
use asupersync::{Cx, Outcome};
use sqlbridge_core::{Error, Executor, Row};
use sqlbridge_schema::{SchemaProvider, Table};

/// Tunables for statement generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOptions {
    /// Joins the insert and the identity select in a compound statement.
    pub statement_separator: String,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            statement_separator: "; ".to_string(),
        }
    }
}

/// A single-row insert described as data.
#[derive(Debug, Clone)]
pub struct InsertRequest {
    pub table: String,
    pub row: Row,
    pub result_required: bool,
}

impl InsertRequest {
    pub fn new(table: impl Into<String>, row: Row) -> Self {
        Self {
            table: table.into(),
            row,
            result_required: false,
        }
    }

    /// Ask for the inserted row, including server-generated values.
    pub fn returning(mut self) -> Self {
        self.result_required = true;
        self
    }
}

/// Inserts rows into tables resolved through a [`SchemaProvider`].
///
/// The execution context decides which connection statements run on; the
/// registry decides how the provider behind it is driven.
///
/// # Example
///
/// ```rust,ignore
/// let registry = ProviderRegistry::with_defaults();
/// let inserter = RowInserter::new(&schema, &registry, ExecutionContext::with_connection(&conn));
///
/// let row = Row::from_pairs([("name", Value::from("Alice"))]);
/// let inserted = inserter.insert(&cx, "users", &row, true).await;
/// ```
pub struct RowInserter<'a> {
    schema: &'a dyn SchemaProvider,
    registry: &'a ProviderRegistry,
    context: ExecutionContext<'a>,
    options: InsertOptions,
}

impl<'a> RowInserter<'a> {
    pub fn new(
        schema: &'a dyn SchemaProvider,
        registry: &'a ProviderRegistry,
        context: ExecutionContext<'a>,
    ) -> Self {
        Self {
            schema,
            registry,
            context,
            options: InsertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InsertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn context(&self) -> &ExecutionContext<'a> {
        &self.context
    }

    pub fn options(&self) -> &InsertOptions {
        &self.options
    }

    pub(crate) fn schema(&self) -> &'a dyn SchemaProvider {
        self.schema
    }

    pub(crate) fn provider(&self) -> &'a ProviderEntry {
        self.registry.entry(&self.context.provider_id())
    }

    /// Insert one row into `table`.
    ///
    /// With `result_required`, returns the inserted row re-read by identity,
    /// or `None` when the table has no identity column or the provider has no
    /// identity function. Without it, always returns `None`.
    ///
    /// Schema and validation errors are raised before any connection is used.
    #[tracing::instrument(level = "debug", skip(self, cx, row), fields(provider = %self.context.provider_id()))]
    pub async fn insert(
        &self,
        cx: &Cx,
        table: &str,
        row: &Row,
        result_required: bool,
    ) -> Outcome<Option<Row>, Error> {
        let table = match self.schema.find_table(table) {
            Ok(table) => table,
            Err(e) => return Outcome::Err(e),
        };
        if let Err(e) = validate_row(&table, row) {
            return Outcome::Err(e);
        }
        insert_validated(
            cx,
            &table,
            row,
            &self.context,
            self.provider(),
            &self.options,
            result_required,
        )
        .await
    }

    /// Run an [`InsertRequest`].
    pub async fn insert_request(
        &self,
        cx: &Cx,
        request: &InsertRequest,
    ) -> Outcome<Option<Row>, Error> {
        self.insert(cx, &request.table, &request.row, request.result_required)
            .await
    }
}

/// Insert a row already validated against `table`.
///
/// A registered single-row inserter takes the call unconditionally.
pub(crate) async fn insert_validated(
    cx: &Cx,
    table: &Table,
    row: &Row,
    context: &ExecutionContext<'_>,
    provider: &ProviderEntry,
    options: &InsertOptions,
    result_required: bool,
) -> Outcome<Option<Row>, Error> {
    if let Some(custom) = provider.single_inserter() {
        tracing::debug!(table = table.name(), "Delegating to custom single-row inserter");
        return custom
            .insert(cx, table, row, context, result_required)
            .await;
    }

    let plan = plan(table, row, provider.capabilities(), options, result_required);
    match context {
        ExecutionContext::Owned(source) => {
            let scoped = match ScopedConnection::open(cx, *source).await {
                Outcome::Ok(scoped) => scoped,
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };
            let outcome = run_plan(cx, scoped.executor(), plan).await;
            scoped.release(cx).await;
            outcome
        }
        ExecutionContext::Connection(exec) => run_plan(cx, *exec, plan).await,
        ExecutionContext::Transaction(exec) => run_plan(cx, exec.as_ref(), plan).await,
    }
}

fn plan(
    table: &Table,
    row: &Row,
    capabilities: &ProviderCapabilities,
    options: &InsertOptions,
    result_required: bool,
) -> InsertPlan {
    let plan = plan_insert(
        table,
        row,
        capabilities,
        &options.statement_separator,
        result_required,
    );
    tracing::trace!(sql = %plan.command.sql(), retrieval = ?plan.retrieval, "Planned insert");
    plan
}

async fn run_plan(cx: &Cx, exec: &dyn Executor, plan: InsertPlan) -> Outcome<Option<Row>, Error> {
    let executor = StatementExecutor::new(exec);
    let InsertPlan {
        mut command,
        retrieval,
    } = plan;

    match retrieval {
        Retrieval::InsertOnly => match executor.execute_non_query(cx, &command).await {
            Outcome::Ok(affected) => {
                tracing::debug!(affected, "Inserted row");
                Outcome::Ok(None)
            }
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        },
        Retrieval::Compound => executor.query_first(cx, &command).await,
        Retrieval::FollowUp(select) => {
            match executor.execute_non_query(cx, &command).await {
                Outcome::Ok(_) => {}
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
            command.reset(select);
            executor.query_first(cx, &command).await
        }
    }
}
