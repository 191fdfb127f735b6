//! INSERT and identity-select generation.

use crate::capabilities::{PlaceholderStyle, ProviderCapabilities};
use crate::command::Command;
use sqlbridge_core::{NoInsertableColumnsError, Result, Row, Value};
use sqlbridge_schema::{Column, Table};
use std::collections::HashSet;

/// A row value matched to the column and placeholder it binds to.
#[derive(Debug, Clone)]
pub struct InsertBinding<'a> {
    pub column: &'a Column,
    pub placeholder: String,
    pub value: &'a Value,
}

/// Match row values to insertable columns, in row order.
///
/// Names unknown to the table and identity columns are skipped. When two row
/// keys resolve to the same column, the first one wins. Placeholders are
/// numbered over the retained bindings only.
pub fn insert_bindings<'a>(
    table: &'a Table,
    row: &'a Row,
    style: PlaceholderStyle,
) -> Vec<InsertBinding<'a>> {
    let mut bound = HashSet::new();
    row.iter()
        .filter_map(|(name, value)| {
            let column = table.column(name)?;
            if column.is_identity() || !bound.insert(column.name()) {
                return None;
            }
            Some((column, value))
        })
        .enumerate()
        .map(|(i, (column, value))| InsertBinding {
            column,
            placeholder: style.placeholder(i + 1),
            value,
        })
        .collect()
}

/// Fail if `row` has no insertable column for `table`.
#[allow(clippy::result_large_err)]
pub fn validate_row(table: &Table, row: &Row) -> Result<()> {
    if row.iter().any(|(name, _)| table.is_insertable(name)) {
        return Ok(());
    }
    Err(NoInsertableColumnsError::new(
        table.qualified_name(),
        row.column_names().map(str::to_string).collect(),
    )
    .into())
}

/// Build `INSERT INTO <table> (<cols>) VALUES (<placeholders>)` for `row`.
pub fn insert_command(table: &Table, row: &Row, style: PlaceholderStyle) -> Command {
    let bindings = insert_bindings(table, row, style);
    let columns: Vec<&str> = bindings.iter().map(|b| b.column.quoted_name()).collect();
    let placeholders: Vec<&str> = bindings.iter().map(|b| b.placeholder.as_str()).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.qualified_name(),
        columns.join(", "),
        placeholders.join(", ")
    );
    Command::with_bindings(
        sql,
        bindings
            .into_iter()
            .map(|b| (b.column.name().to_string(), b.value.clone())),
    )
}

/// Build `SELECT * FROM <table> WHERE <identity> = <expr>`.
pub fn identity_select(table: &Table, identity: &Column, identity_expr: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = {}",
        table.qualified_name(),
        identity.quoted_name(),
        identity_expr
    )
}

/// How the inserted row is fetched, if at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Execute the insert only.
    InsertOnly,
    /// The insert command also carries the identity select.
    Compound,
    /// Run this parameterless select after the insert, on the same connection.
    FollowUp(String),
}

/// The statements for one row, fixed before any connection is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub command: Command,
    pub retrieval: Retrieval,
}

/// Plan the insert of one row.
///
/// Retrieval is only planned when a result is required, the table has an
/// identity column and the provider names an identity function.
pub fn plan_insert(
    table: &Table,
    row: &Row,
    capabilities: &ProviderCapabilities,
    separator: &str,
    result_required: bool,
) -> InsertPlan {
    let mut command = insert_command(table, row, capabilities.placeholder());
    if !result_required {
        return InsertPlan {
            command,
            retrieval: Retrieval::InsertOnly,
        };
    }

    let (Some(identity), Some(expr)) = (table.identity_column(), capabilities.identity_function())
    else {
        tracing::debug!(
            table = table.name(),
            has_identity = table.identity_column().is_some(),
            "Inserted row cannot be retrieved"
        );
        return InsertPlan {
            command,
            retrieval: Retrieval::InsertOnly,
        };
    };

    let select = identity_select(table, identity, expr);
    if capabilities.supports_compound_statements() {
        command.append_statement(separator, &select);
        InsertPlan {
            command,
            retrieval: Retrieval::Compound,
        }
    } else {
        InsertPlan {
            command,
            retrieval: Retrieval::FollowUp(select),
        }
    }
}
