use thiserror::Error;

/// Errors surfaced by the repository layer.
///
/// Callers can tell "row does not exist" apart from "the request carried
/// nothing to do" and "the store itself failed" instead of collapsing all
/// three into a boolean.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("no recognized fields to update")]
    EmptyUpdate,
    #[error("storage unavailable: {0}")]
    Unavailable(sqlx::Error),
}

impl StoreError {
    /// Log a storage fault at the store boundary and wrap it.
    pub(crate) fn fault(op: &str, e: sqlx::Error) -> Self {
        tracing::error!("Storage fault during {}: {}", op, e);
        StoreError::Unavailable(e)
    }
}
