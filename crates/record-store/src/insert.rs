use crate::error::{Result, StoreError};
use crate::Store;
use rdb_core::{Record, StringList, DEFAULT_LABEL};
use rusqlite::params;

const INSERT_SQL: &str = "INSERT INTO httpx_data (
    port, url, input, location, title, scheme, webserver,
    content_type, method, host, path, time, a, tech,
    words, lines, status_code, content_length, program, platform
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)";

fn encode(list: &Option<StringList>) -> Result<Option<String>> {
    list.as_ref().map(StringList::encode).transpose().map_err(StoreError::insert)
}

fn label(s: &str) -> &str {
    if s.is_empty() { DEFAULT_LABEL } else { s }
}

impl Store {
    /// Appends one row and returns the id the database assigned to it.
    ///
    /// `record.id` and `record.created_at` are ignored.
    pub fn insert(&self, record: &Record) -> Result<i64> {
        let a = encode(&record.a)?;
        let tech = encode(&record.tech)?;
        let conn = self.conn().map_err(StoreError::Insert)?;
        conn.execute(
            INSERT_SQL,
            params![
                record.port,
                record.url,
                record.input,
                record.location,
                record.title,
                record.scheme,
                record.webserver,
                record.content_type,
                record.method,
                record.host,
                record.path,
                record.time,
                a,
                tech,
                record.words,
                record.lines,
                record.status_code,
                record.content_length,
                label(&record.program),
                label(&record.platform),
            ],
        )
        .map_err(StoreError::insert)?;
        Ok(conn.last_insert_rowid())
    }
}
