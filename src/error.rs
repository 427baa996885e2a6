use smol_str::SmolStr;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no from tables specified")]
    NoFromTables,

    #[error("no select fields specified")]
    NoSelectFields,

    #[error("order by fields required for pagination")]
    OrderByRequired,

    #[error("page size must be at least 1, got {0}")]
    InvalidPageSize(usize),

    #[error("page {page_index} of size {page_size} is out of range")]
    PageOutOfRange { page_index: usize, page_size: usize },

    #[error("unknown join type: {0}")]
    UnknownJoinKind(String),

    #[error("invalid join predicate: {0}")]
    InvalidJoinPredicate(String),

    #[error("bad in condition format: {0}")]
    BadInFormat(String),

    #[error("invalid top value: {0}")]
    InvalidTop(String),

    #[error("column `{0}` is not part of the result")]
    MissingColumn(SmolStr),

    #[error("column `{column}` cannot be read as {expected}")]
    TypeMismatch {
        column: SmolStr,
        expected: &'static str,
    },

    #[error("data access failure: {0}")]
    DataAccess(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to write sql")]
    Format,
}

impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self {
        Self::Format
    }
}
