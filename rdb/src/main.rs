use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rdb_core::Provenance;
use record_store::{ListFilter, Store};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod output;

#[derive(Debug, Parser)]
#[command(
    name = "rdb",
    version,
    about = "Recon Database - store and query httpx data",
    long_about = "rdb (Recon Database) stores httpx JSON output in SQLite and lists it back with filters and sorting.

Quick start:
  1. Configure the database:
     rdb config --connection-string sqlite:///home/me/recon/rdb.sqlite

  2. Store httpx output:
     httpx -l targets.txt -json | rdb store -p myprogram -P hackerone

  3. List stored data:
     rdb list --webserver nginx --sort url"
)]
struct Cli {
    /// Config file (YAML). Defaults to $RDB_CONFIG or ~/.config/rdb/config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More logging on stderr (-v info, -vv debug). RDB_LOG overrides the default.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Store httpx JSON lines piped on stdin
    Store {
        /// Program name (e.g., bugcrowd-program)
        #[arg(short, long)]
        program: Option<String>,
        /// Platform name (e.g., hackerone, bugcrowd)
        #[arg(short = 'P', long)]
        platform: Option<String>,
    },
    /// List stored httpx data
    List(ListArgs),
    /// Show or update settings
    Config {
        /// SQLite database (sqlite://path, plain path, or :memory:)
        #[arg(long)]
        connection_string: Option<String>,
        /// Maximum pooled database connections
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_connections: Option<u32>,
        /// Program label used when `store` gets none
        #[arg(long)]
        default_program: Option<String>,
        /// Platform label used when `store` gets none
        #[arg(long)]
        default_platform: Option<String>,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Search across url, input, title, host, webserver, content-type, tech, a, program, platform
    #[arg(short, long)]
    query: Option<String>,
    /// Filter by URL (partial match)
    #[arg(long)]
    url: Option<String>,
    /// Filter by input (partial match)
    #[arg(long)]
    input: Option<String>,
    /// Filter by title (partial match)
    #[arg(long)]
    title: Option<String>,
    /// Filter by DNS A record (partial match)
    #[arg(long)]
    a: Option<String>,
    /// Filter by webserver (partial match)
    #[arg(long)]
    webserver: Option<String>,
    /// Filter by technology (partial match)
    #[arg(long)]
    tech: Option<String>,
    /// Filter by host (partial match)
    #[arg(long)]
    host: Option<String>,
    /// Filter by scheme (exact)
    #[arg(long)]
    scheme: Option<String>,
    /// Filter by port (exact)
    #[arg(long)]
    port: Option<String>,
    /// Filter by method (exact)
    #[arg(long)]
    method: Option<String>,
    /// Filter by path (partial match)
    #[arg(long)]
    path: Option<String>,
    /// Filter by redirect location (partial match)
    #[arg(long)]
    location: Option<String>,
    /// Filter by content-type (partial match)
    #[arg(long)]
    content_type: Option<String>,
    /// Filter by HTTP status code (exact, 0 = any)
    #[arg(long = "status", default_value_t = 0)]
    status_code: i64,
    /// Filter by program name (exact)
    #[arg(long)]
    program: Option<String>,
    /// Filter by platform name (exact)
    #[arg(long)]
    platform: Option<String>,
    /// Sort column (url, input, title, host, scheme, port, method, path, location, content_type,
    /// status_code, content_length, words, lines, webserver, tech, a, program, platform, created_at)
    #[arg(long = "sort", default_value = "created_at")]
    sort_by: String,
    /// Sort order (asc, desc)
    #[arg(long = "order", default_value = "desc")]
    sort_order: String,
    /// Limit number of results (0 = all)
    #[arg(short = 'n', long, default_value_t = 0)]
    limit: i64,
    /// Output JSON lines
    #[arg(short, long)]
    json: bool,
    /// Output CSV with a header row
    #[arg(long, conflicts_with = "json")]
    csv: bool,
    /// Field separator for piping (e.g., ',' or '|')
    #[arg(short, long)]
    sep: Option<String>,
    /// Only output URLs
    #[arg(long)]
    urls: bool,
}

impl ListArgs {
    fn filter(&self) -> ListFilter {
        ListFilter {
            query: self.query.clone(),
            url: self.url.clone(),
            input: self.input.clone(),
            title: self.title.clone(),
            a: self.a.clone(),
            webserver: self.webserver.clone(),
            tech: self.tech.clone(),
            host: self.host.clone(),
            scheme: self.scheme.clone(),
            port: self.port.clone(),
            method: self.method.clone(),
            path: self.path.clone(),
            location: self.location.clone(),
            content_type: self.content_type.clone(),
            status_code: Some(self.status_code),
            program: self.program.clone(),
            platform: self.platform.clone(),
            sort_by: Some(self.sort_by.clone()),
            sort_order: Some(self.sort_order.clone()),
            limit: Some(self.limit),
        }
    }

    fn format(&self) -> output::Format<'_> {
        if self.urls {
            output::Format::Urls
        } else if self.json {
            output::Format::Jsonl
        } else if self.csv {
            output::Format::Csv
        } else if let Some(sep) = self.sep.as_deref().filter(|s| !s.is_empty()) {
            output::Format::Separated(sep)
        } else {
            output::Format::Table
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("RDB_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config_path = match cli.config {
        Some(p) => p,
        None => config::default_path()?,
    };
    match cli.command {
        Commands::Version => {
            println!("rdb {} (core {})", env!("CARGO_PKG_VERSION"), rdb_core::version());
        }
        Commands::Config { connection_string, max_connections, default_program, default_platform } => {
            let mut cfg = config::load(&config_path)?;
            let mut changed = false;
            if let Some(s) = connection_string {
                cfg.connection_string = s;
                changed = true;
            }
            if let Some(n) = max_connections {
                cfg.max_connections = n;
                changed = true;
            }
            if let Some(p) = default_program.filter(|p| !p.is_empty()) {
                cfg.default_program = p;
                changed = true;
            }
            if let Some(p) = default_platform.filter(|p| !p.is_empty()) {
                cfg.default_platform = p;
                changed = true;
            }
            if changed {
                config::save(&config_path, &cfg)?;
                println!("configuration saved");
            }
            println!();
            println!("config file: {}", config_path.display());
            println!("connection_string: {}", config::mask_connection_string(&cfg.connection_string));
            println!("max_connections: {}", cfg.max_connections);
            println!("default_program: {}", cfg.default_program);
            println!("default_platform: {}", cfg.default_platform);
        }
        Commands::Store { program, platform } => {
            let cfg = config::load(&config_path)?;
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                bail!("no input provided. Pipe httpx JSON output to this command");
            }
            let mut store = Store::open(&cfg.store_config())?;
            let prov = Provenance::new(program, platform)
                .with_defaults(Some(cfg.default_program), Some(cfg.default_platform));
            let report = store.ingest(stdin.lock(), &prov).context("ingestion aborted")?;
            store.close();
            if report.skipped_malformed + report.failed_inserts > 0 {
                tracing::warn!(
                    malformed = report.skipped_malformed,
                    failed = report.failed_inserts,
                    "some lines were not stored"
                );
            }
            println!("stored {} records", report.stored);
        }
        Commands::List(args) => {
            let cfg = config::load(&config_path)?;
            let mut store = Store::open(&cfg.store_config())?;
            let results = store.list(&args.filter()).context("failed to query data")?;
            store.close();

            let stdout = std::io::stdout();
            let mut out = std::io::BufWriter::new(stdout.lock());
            output::write(&mut out, &results, args.format())?;
            out.flush()?;
        }
    }
    Ok(())
}
