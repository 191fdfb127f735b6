//! Where statements run: an opened-per-call connection, or an ambient handle.

use sqlbridge_core::{
    Connection, ConnectionSource, Executor, ProviderId, TransactionHandle, TransactionOps,
};
use std::fmt;

/// The connection a call executes on.
///
/// - `Owned`: no ambient handle. A connection is opened from the source for
///   the duration of the call and closed before the call returns.
/// - `Connection`: an ambient connection, reused and never closed here.
/// - `Transaction`: an ambient transaction; its connection is used and it is
///   never committed, rolled back or closed here.
pub enum ExecutionContext<'a> {
    Owned(&'a dyn ConnectionSource),
    Connection(&'a dyn Executor),
    Transaction(Box<dyn Executor + 'a>),
}

impl<'a> ExecutionContext<'a> {
    /// Open a fresh connection from `source` for every call.
    pub fn owned(source: &'a dyn ConnectionSource) -> Self {
        Self::Owned(source)
    }

    /// Run on a connection owned by the caller.
    pub fn with_connection<C: Connection>(conn: &'a C) -> Self {
        Self::Connection(conn)
    }

    /// Run inside a transaction owned by the caller.
    pub fn with_transaction<T: TransactionOps>(tx: &'a T) -> Self {
        Self::Transaction(Box::new(TransactionHandle::new(tx)))
    }

    /// Registry key of the provider statements will run against.
    pub fn provider_id(&self) -> ProviderId {
        match self {
            Self::Owned(source) => source.provider_id(),
            Self::Connection(exec) => exec.provider_id(),
            Self::Transaction(exec) => exec.provider_id(),
        }
    }

    /// The ambient transaction, if the call runs inside one.
    pub fn active_transaction(&self) -> Option<&dyn Executor> {
        match self {
            Self::Transaction(exec) => Some(exec.as_ref()),
            Self::Owned(_) | Self::Connection(_) => None,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Self::Owned(_) => "Owned",
            Self::Connection(_) => "Connection",
            Self::Transaction(_) => "Transaction",
        };
        f.debug_struct("ExecutionContext")
            .field("mode", &mode)
            .field("provider", &self.provider_id())
            .finish()
    }
}
