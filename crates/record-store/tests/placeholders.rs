use record_store::{build_query, ListFilter, QueryArg};
use regex::Regex;
use std::collections::BTreeSet;

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

/// Every filter field set, each to a distinct value.
fn full_filter() -> ListFilter {
    ListFilter {
        query: some("q"),
        url: some("url"),
        input: some("input"),
        title: some("title"),
        a: some("a"),
        webserver: some("webserver"),
        tech: some("tech"),
        host: some("host"),
        scheme: some("scheme"),
        port: some("port"),
        method: some("method"),
        path: some("path"),
        location: some("location"),
        content_type: some("content_type"),
        status_code: Some(418),
        program: some("program"),
        platform: some("platform"),
        sort_by: some("host"),
        sort_order: some("asc"),
        limit: Some(10),
    }
}

/// Each subset of fields obtained by clearing one field at a time, plus all and none.
fn filters() -> Vec<ListFilter> {
    let full = full_filter();
    let clears: [fn(&mut ListFilter); 17] = [
        |f| f.query = None,
        |f| f.url = None,
        |f| f.input = None,
        |f| f.title = None,
        |f| f.a = None,
        |f| f.webserver = None,
        |f| f.tech = None,
        |f| f.host = None,
        |f| f.scheme = None,
        |f| f.port = None,
        |f| f.method = None,
        |f| f.path = None,
        |f| f.location = None,
        |f| f.content_type = None,
        |f| f.status_code = Some(0),
        |f| f.program = None,
        |f| f.platform = None,
    ];
    let mut out = vec![full.clone(), ListFilter::default()];
    for clear in clears {
        let mut f = full.clone();
        clear(&mut f);
        out.push(f);
    }
    out
}

/// The value a clause should see for a `col <op> ?N` occurrence.
fn expected_operand(col: &str, f: &ListFilter) -> QueryArg {
    match col {
        "status_code" => QueryArg::Int(f.status_code.unwrap_or_default()),
        "scheme" | "port" | "method" | "program" | "platform" => QueryArg::Text(col.to_string()),
        _ => QueryArg::Text(format!("%{}%", col.replace('_', "\\_"))),
    }
}

#[test]
fn placeholders_match_argument_positions() {
    let ph = Regex::new(r"\?(\d+)").unwrap();
    for f in filters() {
        let q = build_query(&f);
        let used: BTreeSet<usize> = ph
            .captures_iter(&q.sql)
            .map(|c| c[1].parse().unwrap())
            .collect();
        let expected: BTreeSet<usize> = (1..=q.args.len()).collect();
        assert_eq!(used, expected, "{}", q.sql);
    }
}

#[test]
fn each_placeholder_binds_its_own_column_value() {
    let clause = Regex::new(r"AND (?:casefold\()?(\w+)\)? (?:LIKE|=) \?(\d+)").unwrap();
    for f in filters() {
        let q = build_query(&f);
        for c in clause.captures_iter(&q.sql) {
            let col = &c[1];
            let n: usize = c[2].parse().unwrap();
            assert_eq!(q.args[n - 1], expected_operand(col, &f), "{col} in {}", q.sql);
        }
        if f.query.is_some() {
            assert!(q.sql.contains("AND (casefold(url) LIKE ?1 "));
            assert_eq!(q.args[0], QueryArg::Text("%q%".into()));
        }
    }
}

#[test]
fn full_filter_binds_seventeen_values() {
    let q = build_query(&full_filter());
    assert_eq!(q.args.len(), 17);
    assert!(q.sql.ends_with("ORDER BY host ASC, id ASC LIMIT 10"));
}
