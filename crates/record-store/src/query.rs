//! Translation of a [`ListFilter`] into one parameterized `SELECT`.
//!
//! Every operand supplied by the caller is bound as a positional parameter.
//! The only literals rendered into the SQL text are the sort column and
//! direction (both taken from closed enums) and the numeric limit.

use crate::schema::{SELECT_COLUMNS, TABLE};
use rusqlite::types::ToSqlOutput;
use rusqlite::ToSql;

/// SQL function registered on every pooled connection; lowercases text with
/// Unicode rules so substring matches ignore case beyond ASCII.
pub(crate) const CASEFOLD_FN: &str = "casefold";

/// Columns searched by the free-text `query` filter. Array columns match
/// against their stored JSON text.
pub const SEARCH_COLUMNS: &[&str] = &[
    "url",
    "input",
    "title",
    "host",
    "webserver",
    "content_type",
    "tech",
    "a",
    "program",
    "platform",
];

/// Optional filters, sort and limit for one `list` call.
///
/// `None` and empty strings mean "no filter"; so does a `status_code` of `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub query: Option<String>,
    pub url: Option<String>,
    pub input: Option<String>,
    pub title: Option<String>,
    pub a: Option<String>,
    pub webserver: Option<String>,
    pub tech: Option<String>,
    pub host: Option<String>,
    pub scheme: Option<String>,
    pub port: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub status_code: Option<i64>,
    pub program: Option<String>,
    pub platform: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Port,
    Url,
    Input,
    Title,
    Scheme,
    Webserver,
    ContentType,
    Method,
    Host,
    Path,
    Location,
    A,
    Tech,
    Words,
    Lines,
    StatusCode,
    ContentLength,
    Program,
    Platform,
    #[default]
    CreatedAt,
}

impl SortColumn {
    pub const ALL: [SortColumn; 20] = [
        SortColumn::Port,
        SortColumn::Url,
        SortColumn::Input,
        SortColumn::Title,
        SortColumn::Scheme,
        SortColumn::Webserver,
        SortColumn::ContentType,
        SortColumn::Method,
        SortColumn::Host,
        SortColumn::Path,
        SortColumn::Location,
        SortColumn::A,
        SortColumn::Tech,
        SortColumn::Words,
        SortColumn::Lines,
        SortColumn::StatusCode,
        SortColumn::ContentLength,
        SortColumn::Program,
        SortColumn::Platform,
        SortColumn::CreatedAt,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SortColumn::Port => "port",
            SortColumn::Url => "url",
            SortColumn::Input => "input",
            SortColumn::Title => "title",
            SortColumn::Scheme => "scheme",
            SortColumn::Webserver => "webserver",
            SortColumn::ContentType => "content_type",
            SortColumn::Method => "method",
            SortColumn::Host => "host",
            SortColumn::Path => "path",
            SortColumn::Location => "location",
            SortColumn::A => "a",
            SortColumn::Tech => "tech",
            SortColumn::Words => "words",
            SortColumn::Lines => "lines",
            SortColumn::StatusCode => "status_code",
            SortColumn::ContentLength => "content_length",
            SortColumn::Program => "program",
            SortColumn::Platform => "platform",
            SortColumn::CreatedAt => "created_at",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Unknown or missing names fall back to `created_at`.
    pub fn resolve(requested: Option<&str>) -> Self {
        requested.and_then(Self::parse).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Only the literal `asc` sorts ascending.
    pub fn resolve(requested: Option<&str>) -> Self {
        match requested {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub const fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A bound query operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArg {
    Text(String),
    Int(i64),
}

impl ToSql for QueryArg {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            QueryArg::Text(s) => s.to_sql(),
            QueryArg::Int(i) => i.to_sql(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<QueryArg>,
}

#[derive(Debug, Clone, Copy)]
enum Clause {
    Contains(&'static str),
    Equals(&'static str),
    AnyContains(&'static [&'static str]),
}

impl Clause {
    fn render(self, out: &mut String, n: usize) {
        match self {
            Clause::Contains(col) => out.push_str(&format!(" AND {CASEFOLD_FN}({col}) LIKE ?{n} ESCAPE '\\'")),
            Clause::Equals(col) => out.push_str(&format!(" AND {col} = ?{n}")),
            Clause::AnyContains(cols) => {
                let ors = cols
                    .iter()
                    .map(|col| format!("{CASEFOLD_FN}({col}) LIKE ?{n} ESCAPE '\\'"))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                out.push_str(&format!(" AND ({ors})"));
            }
        }
    }
}

/// Collects predicates and renders the final statement once positions are known.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    clauses: Vec<(Clause, QueryArg)>,
    sort: SortColumn,
    order: SortOrder,
    limit: Option<i64>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_filter(f: &ListFilter) -> Self {
        let mut b = Self::new();
        b.search(present(&f.query));
        b.contains("url", present(&f.url));
        b.contains("input", present(&f.input));
        b.contains("title", present(&f.title));
        b.contains("a", present(&f.a));
        b.contains("webserver", present(&f.webserver));
        b.contains("tech", present(&f.tech));
        b.contains("host", present(&f.host));
        b.equals("scheme", present(&f.scheme));
        b.equals("port", present(&f.port));
        b.equals("method", present(&f.method));
        b.contains("path", present(&f.path));
        b.contains("location", present(&f.location));
        b.contains("content_type", present(&f.content_type));
        if let Some(code) = f.status_code.filter(|c| *c != 0) {
            b.clauses.push((Clause::Equals("status_code"), QueryArg::Int(code)));
        }
        b.equals("program", present(&f.program));
        b.equals("platform", present(&f.platform));
        b.sort = SortColumn::resolve(f.sort_by.as_deref());
        b.order = SortOrder::resolve(f.sort_order.as_deref());
        b.limit = f.limit.filter(|n| *n > 0);
        b
    }

    fn search(&mut self, term: Option<&str>) {
        if let Some(t) = term {
            self.clauses.push((Clause::AnyContains(SEARCH_COLUMNS), like_pattern(t)));
        }
    }

    fn contains(&mut self, col: &'static str, value: Option<&str>) {
        if let Some(v) = value {
            self.clauses.push((Clause::Contains(col), like_pattern(v)));
        }
    }

    fn equals(&mut self, col: &'static str, value: Option<&str>) {
        if let Some(v) = value {
            self.clauses.push((Clause::Equals(col), QueryArg::Text(v.to_string())));
        }
    }

    pub fn build(&self) -> BuiltQuery {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM {TABLE} WHERE 1=1");
        let mut args = Vec::with_capacity(self.clauses.len());
        for (clause, arg) in &self.clauses {
            args.push(arg.clone());
            clause.render(&mut sql, args.len());
        }
        let dir = self.order.as_sql();
        sql.push_str(&format!(" ORDER BY {} {dir}, id {dir}", self.sort.as_str()));
        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        BuiltQuery { sql, args }
    }
}

pub fn build_query(filter: &ListFilter) -> BuiltQuery {
    QueryBuilder::from_filter(filter).build()
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// `%term%`, lowercased to meet the folded column, with LIKE wildcards in
/// `term` matched literally.
fn like_pattern(term: &str) -> QueryArg {
    let mut p = String::with_capacity(term.len() + 2);
    p.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            p.push('\\');
        }
        p.push(ch);
    }
    p.push('%');
    QueryArg::Text(p)
}
