use anyhow::Result;
use rdb_core::Record;
use std::io::Write;

const TRUNCATE_AT: usize = 30;

/// Fields emitted by the separator and CSV forms, in order.
const FIELDS: [&str; 7] = ["url", "status_code", "webserver", "tech", "title", "program", "platform"];

fn fields(r: &Record) -> [String; 7] {
    [
        r.url.clone(),
        r.status_code.to_string(),
        r.webserver.clone(),
        r.tech_joined(),
        r.title.clone(),
        r.program.clone(),
        r.platform.clone(),
    ]
}

/// How `rdb list` renders its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format<'a> {
    Urls,
    Jsonl,
    Csv,
    Separated(&'a str),
    Table,
}

/// Machine formats (URLs, JSON lines, CSV) stay silent on an empty result;
/// the human-facing ones say so.
pub fn write<W: Write>(w: &mut W, records: &[Record], format: Format<'_>) -> Result<()> {
    match format {
        Format::Urls => write_urls(w, records),
        Format::Jsonl => write_jsonl(w, records),
        Format::Csv => write_csv(w, records),
        _ if records.is_empty() => {
            writeln!(w, "no records found")?;
            Ok(())
        }
        Format::Separated(sep) => write_separated(w, records, sep),
        Format::Table => write_table(w, records),
    }
}

pub fn write_jsonl<W: Write>(w: &mut W, records: &[Record]) -> Result<()> {
    for r in records {
        serde_json::to_writer(&mut *w, r)?;
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_urls<W: Write>(w: &mut W, records: &[Record]) -> Result<()> {
    for r in records {
        writeln!(w, "{}", r.url)?;
    }
    Ok(())
}

pub fn write_separated<W: Write>(w: &mut W, records: &[Record], sep: &str) -> Result<()> {
    for r in records {
        writeln!(w, "{}", fields(r).join(sep))?;
    }
    Ok(())
}

pub fn write_csv<W: Write>(w: W, records: &[Record]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(FIELDS)?;
    for r in records {
        wtr.write_record(fields(r))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Display-only shortening; stored and JSON values are untouched.
fn truncate(s: &str) -> String {
    if s.chars().count() > TRUNCATE_AT {
        let head: String = s.chars().take(TRUNCATE_AT - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

pub fn write_table<W: Write>(w: &mut W, records: &[Record]) -> Result<()> {
    let rows: Vec<[String; 7]> = records
        .iter()
        .map(|r| {
            let mut f = fields(r);
            f[3] = truncate(&f[3]);
            f[4] = truncate(&f[4]);
            f
        })
        .collect();
    let mut widths = [0usize; 7];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    for row in &rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i + 1 == row.len() {
                line.push_str(cell);
            } else {
                let pad = widths[i] - cell.chars().count() + 2;
                line.push_str(cell);
                line.extend(std::iter::repeat(' ').take(pad));
            }
        }
        writeln!(w, "{}", line.trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdb_core::StringList;

    fn sample() -> Record {
        Record {
            id: Some(7),
            url: "https://example.com".into(),
            status_code: 200,
            webserver: "nginx".into(),
            tech: Some(StringList::new(["Nginx", "PHP"])),
            title: "A very long landing page title that goes on".into(),
            program: "acme".into(),
            platform: "h1".into(),
            ..Default::default()
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn separated_line() {
        let out = render(|w| write_separated(w, &[sample()], "|"));
        assert_eq!(
            out,
            "https://example.com|200|nginx|Nginx,PHP|A very long landing page title that goes on|acme|h1\n"
        );
    }

    #[test]
    fn table_truncates_for_display_only() {
        let r = sample();
        let out = render(|w| write_table(w, std::slice::from_ref(&r)));
        assert!(out.contains("A very long landing page ti..."));
        assert!(!out.contains("goes on"));
        let json = render(|w| write_jsonl(w, std::slice::from_ref(&r)));
        assert!(json.contains("A very long landing page title that goes on"));
    }

    #[test]
    fn human_formats_report_empty_result() {
        assert_eq!(render(|w| write(w, &[], Format::Table)), "no records found\n");
        assert_eq!(render(|w| write(w, &[], Format::Separated("|"))), "no records found\n");
        assert_eq!(render(|w| write(w, &[], Format::Urls)), "");
        assert_eq!(render(|w| write(w, &[], Format::Jsonl)), "");
        assert_eq!(
            render(|w| write(w, &[], Format::Csv)),
            "url,status_code,webserver,tech,title,program,platform\n"
        );
    }

    #[test]
    fn jsonl_is_ingestible() {
        let out = render(|w| write_jsonl(w, &[sample(), sample()]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let back = Record::from_json(lines[0].as_bytes()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn csv_has_header_and_quotes() {
        let mut r = sample();
        r.title = "a, b".into();
        let out = render(|w| write_csv(w, &[r]));
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("url,status_code,webserver,tech,title,program,platform"));
        assert_eq!(lines.next(), Some("https://example.com,200,nginx,\"Nginx,PHP\",\"a, b\",acme,h1"));
    }

    #[test]
    fn urls_only() {
        assert_eq!(render(|w| write_urls(w, &[sample()])), "https://example.com\n");
    }
}
