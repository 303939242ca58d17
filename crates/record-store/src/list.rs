use crate::error::{Result, StoreError};
use crate::query::{build_query, ListFilter};
use crate::Store;
use rdb_core::{Record, StringList};
use rusqlite::types::Type;
use rusqlite::{params_from_iter, Row};
use tracing::debug;

impl Store {
    /// Runs one filtered query and materializes every matching row.
    ///
    /// Either all rows decode or the call fails; no partial result is returned.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Record>> {
        let built = build_query(filter);
        debug!(sql = %built.sql, args = built.args.len(), "list query");
        let conn = self.conn().map_err(StoreError::Query)?;
        let mut stmt = conn.prepare(&built.sql).map_err(StoreError::query)?;
        let rows = stmt
            .query_map(params_from_iter(built.args.iter()), record_from_row)
            .map_err(StoreError::query)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StoreError::query)?;
        debug!(rows = records.len(), "list done");
        Ok(records)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: Some(row.get("id")?),
        port: row.get("port")?,
        url: row.get("url")?,
        input: row.get("input")?,
        location: row.get("location")?,
        title: row.get("title")?,
        scheme: row.get("scheme")?,
        webserver: row.get("webserver")?,
        content_type: row.get("content_type")?,
        method: row.get("method")?,
        host: row.get("host")?,
        path: row.get("path")?,
        time: row.get("time")?,
        a: list_column(row, "a")?,
        tech: list_column(row, "tech")?,
        words: row.get("words")?,
        lines: row.get("lines")?,
        status_code: row.get("status_code")?,
        content_length: row.get("content_length")?,
        program: row.get("program")?,
        platform: row.get("platform")?,
        created_at: row.get("created_at")?,
    })
}

fn list_column(row: &Row<'_>, name: &str) -> rusqlite::Result<Option<StringList>> {
    let idx = row.as_ref().column_index(name)?;
    let Some(text) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    StringList::decode(&text)
        .map(Some)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
