use statlite_core::{Dashboard, Warehouse};

use crate::error::CliError;
use crate::output;

use super::CommandResult;

pub fn run(dashboard: &Dashboard<Warehouse>) -> Result<CommandResult, CliError> {
    let report = dashboard.cohort()?;

    Ok(CommandResult::ok(serde_json::to_value(&report)?)
        .with_warnings(report.warnings())
        .with_table(output::retention_heatmap(&report.matrix)))
}
