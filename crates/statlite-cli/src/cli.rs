//! CLI argument definitions for statlite.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `products` | Product rankings (top, bottom, revenue, unsold) |
//! | `clients` | Customer KPIs (repeat rate, weekly return, activity) |
//! | `cohort` | Weekly cohort retention matrix |
//! | `dashboard` | All three reports at once |
//! | `sql` | Query the local DuckDB warehouse |
//! | `import` | Load a CSV file into a sales table |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--db-path` | `$STATLITE_HOME/warehouse.duckdb` | Warehouse file |
//! | `--week-start` | `monday` | First day of a week bucket |
//! | `--log-level` | `RUST_LOG` or `warn` | Diagnostics on stderr |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use statlite_core::{ImportTable, WeekStart, DEFAULT_TOP_N};

/// Sales dashboard KPIs over a local DuckDB warehouse.
#[derive(Debug, Parser)]
#[command(name = "statlite", author, version, about)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - json: Single JSON object (default)
    /// - ndjson: One JSON object per line
    /// - table: Human-readable text
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Warehouse database file. Overrides STATLITE_DB_PATH.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Weekday that opens a week bucket for cohorts and weekly return.
    #[arg(long, global = true, value_enum, default_value_t = WeekStartArg::Monday)]
    pub week_start: WeekStartArg,

    /// Log level for diagnostics written to stderr. Falls back to RUST_LOG.
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Ndjson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WeekStartArg {
    /// ISO weeks.
    Monday,
    Sunday,
}

impl From<WeekStartArg> for WeekStart {
    fn from(value: WeekStartArg) -> Self {
        match value {
            WeekStartArg::Monday => Self::Monday,
            WeekStartArg::Sunday => Self::Sunday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank products by quantity and revenue.
    ///
    /// # Examples
    ///
    ///   statlite products
    ///   statlite products --limit 5 --format table
    Products(LimitArgs),

    /// Customer KPIs: repeat-purchase rate, new customers, weekly return and
    /// activity by weekday and hour.
    Clients,

    /// Weekly acquisition cohorts and their retention matrix.
    ///
    /// # Examples
    ///
    ///   statlite cohort --week-start sunday --format table
    Cohort,

    /// Products, clients and cohort reports in one envelope.
    Dashboard(LimitArgs),

    /// Run SQL queries against the DuckDB warehouse.
    ///
    /// Default mode is read-only; use --write for data modifications.
    ///
    /// # Examples
    ///
    ///   statlite sql "SELECT COUNT(*) FROM sale"
    ///   statlite sql "DELETE FROM sale WHERE card_id = 'test'" --write
    Sql(SqlArgs),

    /// Append the rows of a header CSV file to a sales table.
    ///
    /// # Examples
    ///
    ///   statlite import products ./products.csv
    ///   statlite import detailed-sale ./lines.csv
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct LimitArgs {
    /// Number of products in each ranking.
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// SQL query to execute.
    pub query: String,

    /// Allow write operations (INSERT, UPDATE, DELETE, CREATE, etc.).
    #[arg(long, default_value_t = false)]
    pub write: bool,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,

    /// Query timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Target table.
    #[arg(value_enum)]
    pub table: ImportTableArg,

    /// CSV file with a header row naming the table columns.
    pub csv: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportTableArg {
    Products,
    Sale,
    DetailedSale,
}

impl From<ImportTableArg> for ImportTable {
    fn from(value: ImportTableArg) -> Self {
        match value {
            ImportTableArg::Products => Self::Products,
            ImportTableArg::Sale => Self::Sale,
            ImportTableArg::DetailedSale => Self::DetailedSale,
        }
    }
}
