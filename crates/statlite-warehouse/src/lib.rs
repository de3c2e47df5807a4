pub mod duckdb;
pub mod migrations;
pub mod views;

use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ::duckdb::types::Value as DuckValue;
use ::duckdb::{Connection, Statement};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use duckdb::{DuckDbConnectionManager, PooledConnection};

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("query rejected: {0}")]
    QueryRejected(String),

    #[error("query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },
}

/// Explicit warehouse configuration, handed to [`Warehouse::open`].
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub statlite_home: PathBuf,
    pub db_path: PathBuf,
    pub max_pool_size: usize,
    /// Guardrails applied to the fixed dashboard fetches.
    pub fetch_guardrails: QueryGuardrails,
}

impl WarehouseConfig {
    /// Layout rooted at `statlite_home`: the database lives in
    /// `<home>/warehouse.duckdb`.
    pub fn for_home(statlite_home: impl Into<PathBuf>) -> Self {
        let statlite_home = statlite_home.into();
        let db_path = statlite_home.join("warehouse.duckdb");
        Self {
            statlite_home,
            db_path,
            max_pool_size: 4,
            fetch_guardrails: QueryGuardrails::bulk(),
        }
    }

    /// Resolve the configuration from `STATLITE_HOME` / `STATLITE_DB_PATH`,
    /// falling back to `~/.statlite`.
    pub fn from_env() -> Self {
        let mut config = Self::for_home(resolve_statlite_home());
        if let Some(path) = env::var_os("STATLITE_DB_PATH") {
            if !path.is_empty() {
                config.db_path = PathBuf::from(path);
            }
        }
        config
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueryGuardrails {
    pub max_rows: usize,
    pub query_timeout_ms: u64,
}

impl Default for QueryGuardrails {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            query_timeout_ms: 5_000,
        }
    }
}

impl QueryGuardrails {
    /// Limits for whole-table dashboard fetches.
    pub const fn bulk() -> Self {
        Self {
            max_rows: 5_000_000,
            query_timeout_ms: 60_000,
        }
    }

    fn timeout(self) -> Duration {
        Duration::from_millis(self.query_timeout_ms.max(1))
    }

    fn validate(self) -> Result<(), WarehouseError> {
        if self.max_rows == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--max-rows must be greater than zero",
            )));
        }
        if self.query_timeout_ms == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--query-timeout-ms must be greater than zero",
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<SqlColumn>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    pub truncated: bool,
}

impl QueryResult {
    /// Position of the column called `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }
}

/// Tables that accept CSV imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportTable {
    Products,
    Sale,
    DetailedSale,
}

impl ImportTable {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Sale => "sale",
            Self::DetailedSale => "detailed_sale",
        }
    }
}

impl Display for ImportTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub table: ImportTable,
    pub source_path: PathBuf,
    pub rows_before: i64,
    pub rows_after: i64,
    pub inserted_rows: i64,
}

#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::debug!(db_path = %config.db_path.display(), "opening warehouse");
        let manager = DuckDbConnectionManager::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { config, manager };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    pub fn execute_query(
        &self,
        sql: &str,
        guardrails: QueryGuardrails,
        allow_write: bool,
    ) -> Result<QueryResult, WarehouseError> {
        guardrails.validate()?;
        let sql = trim_statement(sql)?;

        if !allow_write {
            check_read_only(sql)?;
        }

        let connection = self.manager.acquire()?;
        run_statement(&connection, sql, guardrails, allow_write)
    }

    /// Read-only query under the configured fetch guardrails.
    pub fn fetch(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        self.execute_query(sql, self.config.fetch_guardrails, false)
    }

    /// Append the rows of a header CSV to `table`, matching columns by name.
    pub fn import_csv(
        &self,
        table: ImportTable,
        csv_path: &Path,
    ) -> Result<ImportReport, WarehouseError> {
        if !csv_path.is_file() {
            return Err(WarehouseError::QueryRejected(format!(
                "csv file '{}' does not exist",
                csv_path.display()
            )));
        }

        let connection = self.manager.acquire()?;
        let rows_before = table_row_count(&connection, table)?;

        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            let sql = format!(
                "INSERT INTO {table} BY NAME SELECT * FROM read_csv('{path}', header = true, auto_detect = true)",
                table = table.as_str(),
                path = escape_sql_string(path_to_sql(csv_path).as_str()),
            );
            connection.execute_batch(sql.as_str())?;
            Ok(())
        })();
        finalize_transaction(&connection, result)?;

        let rows_after = table_row_count(&connection, table)?;
        tracing::info!(
            table = table.as_str(),
            inserted = rows_after - rows_before,
            "csv import complete"
        );

        Ok(ImportReport {
            table,
            source_path: csv_path.to_path_buf(),
            rows_before,
            rows_after,
            inserted_rows: rows_after - rows_before,
        })
    }
}

fn table_row_count(connection: &Connection, table: ImportTable) -> Result<i64, WarehouseError> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
    Ok(connection.query_row(sql.as_str(), [], |row| row.get(0))?)
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Whether a statement only reads, judged by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Read,
    Write,
}

impl StatementKind {
    fn of(sql: &str) -> Self {
        let keyword = sql.split_whitespace().next().unwrap_or_default();
        let reads = ["SELECT", "WITH", "EXPLAIN", "SHOW", "DESCRIBE"]
            .iter()
            .any(|candidate| keyword.eq_ignore_ascii_case(candidate));
        if reads {
            Self::Read
        } else {
            Self::Write
        }
    }
}

/// Wall-clock budget for a single query.
struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    fn check(&self) -> Result<(), WarehouseError> {
        if self.started.elapsed() <= self.budget {
            return Ok(());
        }
        Err(WarehouseError::QueryTimeout {
            timeout_ms: u64::try_from(self.budget.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

fn run_statement(
    connection: &Connection,
    sql: &str,
    guardrails: QueryGuardrails,
    allow_write: bool,
) -> Result<QueryResult, WarehouseError> {
    let deadline = Deadline::start(guardrails.timeout());
    match (StatementKind::of(sql), allow_write) {
        (StatementKind::Read, _) => read_rows(connection, sql, guardrails.max_rows, &deadline),
        (StatementKind::Write, true) => {
            connection.execute_batch(sql)?;
            deadline.check()?;
            Ok(QueryResult {
                columns: Vec::new(),
                rows: Vec::new(),
                row_count: 0,
                truncated: false,
            })
        }
        (StatementKind::Write, false) => Err(WarehouseError::QueryRejected(String::from(
            "only SELECT/CTE queries are allowed unless --write is provided",
        ))),
    }
}

/// Runs `sql` once and collects at most `max_rows` rows.
fn read_rows(
    connection: &Connection,
    sql: &str,
    max_rows: usize,
    deadline: &Deadline,
) -> Result<QueryResult, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    let mut cursor = statement.query([])?;
    // Result columns are known only after execution.
    let columns = match cursor.as_ref() {
        Some(executed) => describe_columns(executed)?,
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = cursor.next()? {
        deadline.check()?;
        if rows.len() == max_rows {
            truncated = true;
            break;
        }
        let cells = (0..columns.len())
            .map(|index| row.get::<_, DuckValue>(index).map(cell_to_json))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(cells);
    }
    deadline.check()?;

    tracing::debug!(
        rows = rows.len(),
        truncated,
        elapsed_ms = u64::try_from(deadline.started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "select executed"
    );

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

fn describe_columns(statement: &Statement<'_>) -> Result<Vec<SqlColumn>, ::duckdb::Error> {
    (0..statement.column_count())
        .map(|index| {
            Ok(SqlColumn {
                name: statement.column_name(index)?.to_string(),
                r#type: statement.column_type(index).to_string(),
            })
        })
        .collect()
}

fn cell_to_json(cell: DuckValue) -> Value {
    match cell {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(flag) => Value::Bool(flag),
        DuckValue::TinyInt(n) => n.into(),
        DuckValue::SmallInt(n) => n.into(),
        DuckValue::Int(n) => n.into(),
        DuckValue::BigInt(n) => n.into(),
        DuckValue::UTinyInt(n) => n.into(),
        DuckValue::USmallInt(n) => n.into(),
        DuckValue::UInt(n) => n.into(),
        DuckValue::UBigInt(n) => n.into(),
        // Out-of-range 128-bit integers keep their digits as text.
        DuckValue::HugeInt(n) => {
            i64::try_from(n).map_or_else(|_| Value::String(n.to_string()), Value::from)
        }
        // Non-finite floats become null.
        DuckValue::Float(n) => f64::from(n).into(),
        DuckValue::Double(n) => n.into(),
        DuckValue::Text(text) => Value::String(text),
        DuckValue::Blob(bytes) => Value::String(hex::encode(bytes)),
        other => Value::String(format!("{other:?}")),
    }
}

/// Trims whitespace and trailing semicolons; empty input is rejected.
fn trim_statement(sql: &str) -> Result<&str, WarehouseError> {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    Ok(trimmed)
}

fn check_read_only(sql: &str) -> Result<(), WarehouseError> {
    if StatementKind::of(sql) == StatementKind::Write {
        return Err(WarehouseError::QueryRejected(String::from(
            "read-only mode accepts only SELECT/CTE queries; use --write for write statements",
        )));
    }
    let statements = sql.split(';').filter(|part| !part.trim().is_empty()).count();
    if statements > 1 {
        return Err(WarehouseError::QueryRejected(String::from(
            "multiple SQL statements are not allowed in read-only mode",
        )));
    }
    Ok(())
}

fn resolve_statlite_home() -> PathBuf {
    if let Some(path) = env::var_os("STATLITE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".statlite");
    }

    PathBuf::from(".statlite")
}

fn path_to_sql(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
