mod clients;
mod cohort;
mod dashboard;
mod import;
mod products;
mod sql;

use std::time::Instant;

use serde_json::Value;
use statlite_core::{
    AnalysisOptions, Dashboard, Envelope, EnvelopeError, EnvelopeMeta, Warehouse, WarehouseConfig,
    DEFAULT_TOP_N, SCHEMA_VERSION,
};
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    /// Text rendering used by `--format table`.
    pub table: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            table: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_table(mut self, lines: Vec<String>) -> Self {
        self.table = lines;
        self
    }
}

/// Envelope plus the text view of the same data.
pub struct CommandOutput {
    pub envelope: Envelope<Value>,
    pub table: Vec<String>,
}

pub fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Products(args) => products::run(&open_dashboard(cli, args.limit)?)?,
        Command::Clients => clients::run(&open_dashboard(cli, DEFAULT_TOP_N)?)?,
        Command::Cohort => cohort::run(&open_dashboard(cli, DEFAULT_TOP_N)?)?,
        Command::Dashboard(args) => dashboard::run(&open_dashboard(cli, args.limit)?)?,
        Command::Sql(args) => sql::run(args, &open_warehouse(cli)?)?,
        Command::Import(args) => import::run(args, &open_warehouse(cli)?)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        table,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(Uuid::new_v4().to_string(), SCHEMA_VERSION, latency_ms)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    tracing::debug!(
        request_id = %meta.request_id,
        latency_ms,
        warnings = meta.warnings.len(),
        errors = errors.len(),
        "command complete"
    );

    Ok(CommandOutput {
        envelope: Envelope::with_errors(meta, data, errors)?,
        table,
    })
}

fn open_warehouse(cli: &Cli) -> Result<Warehouse, CliError> {
    let mut config = WarehouseConfig::from_env();
    if let Some(db_path) = &cli.db_path {
        config = config.with_db_path(db_path);
    }
    let warehouse = Warehouse::open(config)?;
    tracing::debug!(db_path = %warehouse.db_path().display(), "warehouse ready");
    Ok(warehouse)
}

fn open_dashboard(cli: &Cli, top_n: usize) -> Result<Dashboard<Warehouse>, CliError> {
    let options = AnalysisOptions {
        week_start: cli.week_start.into(),
        top_n,
    };
    Ok(Dashboard::new(open_warehouse(cli)?, options)?)
}
