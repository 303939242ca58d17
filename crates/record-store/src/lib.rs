mod error;
mod ingest;
mod insert;
mod list;
mod open;
pub mod query;
mod schema;

pub use error::{Result, StorageError, StoreError};
pub use ingest::IngestReport;
pub use open::{Store, StoreConfig, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
pub use query::{build_query, BuiltQuery, ListFilter, QueryArg, QueryBuilder, SortColumn, SortOrder};
pub use schema::TABLE;
