use crate::Store;
use crate::error::{Result, StoreError};

pub const TABLE: &str = "httpx_data";

/// Column list shared by every `SELECT` so row mapping can rely on names.
pub const SELECT_COLUMNS: &str = "id, port, url, input, location, title, scheme, webserver, \
     content_type, method, host, path, time, a, tech, words, lines, status_code, \
     content_length, program, platform, created_at";

/// Idempotent bootstrap: safe to run against an existing database.
pub const SCHEMA: &str = r#"
BEGIN;

CREATE TABLE IF NOT EXISTS httpx_data (
  id              INTEGER PRIMARY KEY AUTOINCREMENT,
  port            TEXT NOT NULL DEFAULT '',
  url             TEXT NOT NULL DEFAULT '',
  input           TEXT NOT NULL DEFAULT '',
  location        TEXT NOT NULL DEFAULT '',
  title           TEXT NOT NULL DEFAULT '',
  scheme          TEXT NOT NULL DEFAULT '',
  webserver       TEXT NOT NULL DEFAULT '',
  content_type    TEXT NOT NULL DEFAULT '',
  method          TEXT NOT NULL DEFAULT '',
  host            TEXT NOT NULL DEFAULT '',
  path            TEXT NOT NULL DEFAULT '',
  time            TEXT NOT NULL DEFAULT '',
  a               TEXT,
  tech            TEXT,
  words           INTEGER NOT NULL DEFAULT 0,
  lines           INTEGER NOT NULL DEFAULT 0,
  status_code     INTEGER NOT NULL DEFAULT 0,
  content_length  INTEGER NOT NULL DEFAULT 0,
  program         TEXT NOT NULL DEFAULT 'default',
  platform        TEXT NOT NULL DEFAULT 'default',
  created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_url ON httpx_data(url);
CREATE INDEX IF NOT EXISTS idx_input ON httpx_data(input);
CREATE INDEX IF NOT EXISTS idx_webserver ON httpx_data(webserver);
CREATE INDEX IF NOT EXISTS idx_program ON httpx_data(program);
CREATE INDEX IF NOT EXISTS idx_platform ON httpx_data(platform);

COMMIT;
"#;

impl Store {
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let conn = self.conn().map_err(StoreError::Query)?;
        let cnt: i64 = conn
            .query_row(
                "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |r| r.get(0),
            )
            .map_err(StoreError::query)?;
        Ok(cnt > 0)
    }

    /// Names of the indexes defined on `table`, sorted.
    pub fn index_names(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.conn().map_err(StoreError::Query)?;
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name=?1 AND sql IS NOT NULL ORDER BY name")
            .map_err(StoreError::query)?;
        let names = stmt
            .query_map([table], |r| r.get::<_, String>(0))
            .map_err(StoreError::query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::query)?;
        Ok(names)
    }
}
