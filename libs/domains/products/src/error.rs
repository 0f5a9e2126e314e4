use thiserror::Error;
use uuid::Uuid;

use crate::models::StockShortfall;

/// Error taxonomy for product operations
///
/// `NotFound`, `Unavailable`, and `OutOfStock` are expected business
/// outcomes of a checkout: the caller renders them as client errors.
/// `Database` wraps storage failures and is always paired with a rollback.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product(s) not found: {}", join_ids(.0))]
    NotFound(Vec<Uuid>),

    #[error("product(s) not available: {}", join_ids(.0))]
    Unavailable(Vec<Uuid>),

    #[error("insufficient stock: {}", join_shortfalls(.0))]
    OutOfStock(Vec<StockShortfall>),

    #[error("product with SKU '{0}' already exists")]
    DuplicateSku(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl From<sea_orm::DbErr> for ProductError {
    fn from(err: sea_orm::DbErr) -> Self {
        ProductError::Database(err.to_string())
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_shortfalls(shortfalls: &[StockShortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| {
            format!(
                "{} (requested {}, available {})",
                s.product_id, s.requested, s.available
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
