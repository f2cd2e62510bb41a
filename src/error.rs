use sea_orm::DbErr;

use crate::models::ColumnKind;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no table containing \"Title\" found on the page")]
    NoMatchingTable,

    #[error("matching table has no {0} column")]
    MissingColumn(ColumnKind),

    #[error("cannot open movie store: {0}")]
    StoreConnection(#[source] DbErr),

    #[error("movie store write failed: {0}")]
    StoreWrite(#[source] DbErr),

    #[error("movie store read failed: {0}")]
    StoreRead(#[source] DbErr),
}

pub type AppResult<T> = Result<T, AppError>;
