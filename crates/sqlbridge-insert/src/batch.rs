//! Batch insertion.
//!
//! Every row is validated before the first statement runs, so a bad row
//! anywhere in the batch leaves the database untouched. Rows are then handed
//! to the provider's batch inserter, or inserted one at a time on a single
//! connection by [`GenericBatchInserter`].

use crate::command::ScopedConnection;
use crate::context::ExecutionContext;
use crate::inserter::{InsertOptions, RowInserter, insert_validated};
use crate::registry::{BatchInserter, ProviderEntry};
use crate::statement::validate_row;
use asupersync::{Cx, Outcome};
use sqlbridge_core::{BoxFuture, Error, Result, Row};
use sqlbridge_schema::Table;

/// What to do after a row of a batch fails to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowErrorAction {
    /// Skip the row and insert the rest.
    Continue,
    /// Stop and fail the batch with the row's error.
    Abort,
}

/// Called with the failed row and its error.
pub type RowErrorHandler<'h> = dyn Fn(&Row, &Error) -> RowErrorAction + Send + Sync + 'h;

/// The target of a batch and how to reach it.
#[derive(Debug, Clone, Copy)]
pub struct BatchScope<'a> {
    pub table: &'a Table,
    pub context: &'a ExecutionContext<'a>,
    pub provider: &'a ProviderEntry,
    pub options: &'a InsertOptions,
}

/// Validate every row, reporting the index of the first bad one.
#[allow(clippy::result_large_err)]
pub fn validate_rows(table: &Table, rows: &[Row]) -> Result<()> {
    for (index, row) in rows.iter().enumerate() {
        if let Err(e) = validate_row(table, row) {
            return Err(match e {
                Error::NoInsertableColumns(e) => Error::NoInsertableColumns(e.at_row(index)),
                other => other,
            });
        }
    }
    Ok(())
}

impl RowInserter<'_> {
    /// Insert many rows into `table`.
    ///
    /// With `result_required`, returns one row per successful insert that
    /// produced one, in input order. Without it, returns an empty vector.
    ///
    /// A row failure is passed to `on_row_error`; without a handler the batch
    /// stops on the first failure. Rows inserted before a stop are not undone
    /// here: run inside a transaction to get all-or-nothing behaviour.
    #[tracing::instrument(level = "debug", skip(self, cx, rows, on_row_error), fields(provider = %self.context().provider_id()))]
    pub async fn insert_many(
        &self,
        cx: &Cx,
        table: &str,
        rows: impl IntoIterator<Item = Row>,
        on_row_error: Option<&RowErrorHandler<'_>>,
        result_required: bool,
    ) -> Outcome<Vec<Row>, Error> {
        let rows: Vec<Row> = rows.into_iter().collect();
        let table = match self.schema().find_table(table) {
            Ok(table) => table,
            Err(e) => return Outcome::Err(e),
        };
        if let Err(e) = validate_rows(&table, &rows) {
            return Outcome::Err(e);
        }

        let provider = self.provider();
        let scope = BatchScope {
            table: &table,
            context: self.context(),
            provider,
            options: self.options(),
        };
        match provider.batch_inserter() {
            Some(custom) => {
                tracing::debug!(rows = rows.len(), "Delegating to custom batch inserter");
                custom
                    .insert_many(cx, scope, rows, on_row_error, result_required)
                    .await
            }
            None => {
                GenericBatchInserter
                    .insert_many(cx, scope, rows, on_row_error, result_required)
                    .await
            }
        }
    }
}

/// Inserts rows one at a time through the single-row path.
///
/// Without an ambient connection, one connection is opened for the whole
/// batch and closed at the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericBatchInserter;

impl BatchInserter for GenericBatchInserter {
    fn insert_many<'a>(
        &'a self,
        cx: &'a Cx,
        scope: BatchScope<'a>,
        rows: Vec<Row>,
        on_row_error: Option<&'a RowErrorHandler<'a>>,
        result_required: bool,
    ) -> BoxFuture<'a, Outcome<Vec<Row>, Error>> {
        Box::pin(async move {
            let ExecutionContext::Owned(source) = scope.context else {
                return insert_rows(cx, scope, rows, on_row_error, result_required).await;
            };

            let scoped = match ScopedConnection::open(cx, *source).await {
                Outcome::Ok(scoped) => scoped,
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };
            let shared = ExecutionContext::Connection(scoped.executor());
            let outcome = insert_rows(
                cx,
                BatchScope {
                    context: &shared,
                    ..scope
                },
                rows,
                on_row_error,
                result_required,
            )
            .await;
            drop(shared);
            scoped.release(cx).await;
            outcome
        })
    }
}

async fn insert_rows(
    cx: &Cx,
    scope: BatchScope<'_>,
    rows: Vec<Row>,
    on_row_error: Option<&RowErrorHandler<'_>>,
    result_required: bool,
) -> Outcome<Vec<Row>, Error> {
    let total = rows.len();
    let mut inserted = Vec::new();
    let mut skipped = 0usize;

    for (index, row) in rows.iter().enumerate() {
        let outcome = insert_validated(
            cx,
            scope.table,
            row,
            scope.context,
            scope.provider,
            scope.options,
            result_required,
        )
        .await;
        match outcome {
            Outcome::Ok(Some(result)) => {
                if result_required {
                    inserted.push(result);
                }
            }
            Outcome::Ok(None) => {}
            Outcome::Err(e) => {
                let action = on_row_error.map_or(RowErrorAction::Abort, |handler| handler(row, &e));
                match action {
                    RowErrorAction::Continue => {
                        tracing::warn!(row = index, error = %e, "Row insert failed; continuing batch");
                        skipped += 1;
                    }
                    RowErrorAction::Abort => {
                        tracing::debug!(row = index, error = %e, "Row insert failed; aborting batch");
                        return Outcome::Err(e);
                    }
                }
            }
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }
    }

    tracing::info!(
        table = scope.table.name(),
        total,
        skipped,
        returned = inserted.len(),
        "Batch insert complete"
    );
    Outcome::Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlbridge_core::Value;

    #[test]
    fn test_validate_rows_reports_first_bad_index() {
        let table = Table::builder("users").identity("id").column("name").build();
        let rows = vec![
            Row::from_pairs([("name", Value::from("a"))]),
            Row::from_pairs([("name", Value::from("b"))]),
            Row::from_pairs([("id", Value::Int(3))]),
            Row::empty(),
        ];
        match validate_rows(&table, &rows) {
            Err(Error::NoInsertableColumns(e)) => {
                assert_eq!(e.row_index, Some(2));
                assert_eq!(e.supplied, vec!["id".to_string()]);
                assert!(e.to_string().contains("row 2"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(validate_rows(&table, &rows[..2]).is_ok());
        assert!(validate_rows(&table, &[]).is_ok());
    }
}
