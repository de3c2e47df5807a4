use statlite_core::Warehouse;

use crate::cli::ImportArgs;
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &ImportArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let report = warehouse.import_csv(args.table.into(), &args.csv)?;
    let mut result = CommandResult::ok(serde_json::to_value(&report)?).with_table(vec![format!(
        "imported {} rows into {} ({} -> {})",
        report.inserted_rows, report.table, report.rows_before, report.rows_after
    )]);

    if report.inserted_rows == 0 {
        result = result.with_warning(format!(
            "no rows were imported from {}",
            args.csv.display()
        ));
    }

    Ok(result)
}
