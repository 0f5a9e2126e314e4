//! Shared database utilities: error type and retry helpers

mod error;
mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{retry, retry_with_backoff, RetryConfig};
