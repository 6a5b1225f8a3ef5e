//! Error types for query building and execution

use thiserror::Error;

/// Errors produced while building or running an entity query.
#[derive(Debug, Error)]
pub enum Error {
    /// Failure reported by the database driver, passed through unchanged.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A combinator string other than `AND` / `OR`.
    #[error("invalid boolean combinator `{0}` (expected AND or OR)")]
    InvalidBoolean(String),

    /// An unknown comparison operator.
    #[error("invalid operator `{0}`")]
    InvalidOperator(String),

    #[error("invalid placeholder style `{0}` (expected numbered, dollar or anonymous)")]
    InvalidPlaceholderStyle(String),

    /// `fetch_one` matched no rows.
    #[error("no {0} row matched the query")]
    NotFound(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
