use rdb_core::ArrayCodecError;
use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Failure of the storage layer underneath a store operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store is not open")]
    Closed,
    #[error(transparent)]
    Pool(#[from] r2d2::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Codec(#[from] ArrayCodecError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{context}: {source}")]
    Connectivity {
        context: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("failed to insert record: {0}")]
    Insert(#[source] StorageError),
    #[error("line {line}: failed to parse JSON: {source}")]
    Deserialization {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to query records: {0}")]
    Query(#[source] StorageError),
    #[error("error reading input: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn connectivity(context: &'static str, source: impl Into<StorageError>) -> Self {
        StoreError::Connectivity { context, source: source.into() }
    }

    pub(crate) fn insert(source: impl Into<StorageError>) -> Self {
        StoreError::Insert(source.into())
    }

    pub(crate) fn query(source: impl Into<StorageError>) -> Self {
        StoreError::Query(source.into())
    }
}
