use statlite_core::{QueryGuardrails, Warehouse};

use crate::cli::SqlArgs;
use crate::error::CliError;
use crate::output;

use super::CommandResult;

pub fn run(args: &SqlArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(CliError::Usage(String::from("query must not be empty")));
    }

    let guardrails = QueryGuardrails {
        max_rows: args.max_rows,
        query_timeout_ms: args.query_timeout_ms,
    };

    let result = warehouse.execute_query(query, guardrails, args.write)?;
    let table = output::query_table(&result);
    let mut command_result = CommandResult::ok(serde_json::to_value(&result)?).with_table(table);

    if result.truncated {
        command_result = command_result.with_warning(format!(
            "result truncated at {} rows (use --max-rows to increase limit)",
            result.row_count
        ));
    }

    Ok(command_result)
}
