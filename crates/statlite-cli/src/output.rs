use serde_json::Value;
use statlite_core::{ClientsReport, ProductSales, ProductsReport, QueryResult, RetentionMatrix};

use crate::cli::OutputFormat;
use crate::commands::CommandOutput;
use crate::error::CliError;

pub fn render(output: &CommandOutput, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let envelope = &output.envelope;
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Ndjson => {
            let payload = serde_json::to_string(envelope)?;
            println!("{payload}");
        }
        OutputFormat::Table => render_table(output)?,
    }

    Ok(())
}

fn render_table(output: &CommandOutput) -> Result<(), CliError> {
    let envelope = &output.envelope;
    println!("request_id  : {}", envelope.meta.request_id);
    println!("schema      : {}", envelope.meta.schema_version);
    println!("generated_at: {}", envelope.meta.generated_at);
    println!("latency_ms  : {}", envelope.meta.latency_ms);

    if !envelope.meta.warnings.is_empty() {
        println!("warnings:");
        for warning in &envelope.meta.warnings {
            println!("  - {warning}");
        }
    }

    println!("data:");
    if output.table.is_empty() {
        let pretty_data = serde_json::to_string_pretty(&envelope.data)?;
        for line in pretty_data.lines() {
            println!("  {line}");
        }
    } else {
        for line in &output.table {
            println!("  {line}");
        }
    }

    if !envelope.errors.is_empty() {
        println!("errors:");
        for error in &envelope.errors {
            println!("  - {}: {}", error.code, error.message);
        }
    }

    Ok(())
}

/// Colour band of a 0..=1 gauge value.
pub fn gauge_band(value: f64) -> &'static str {
    if value < 0.3 {
        "red"
    } else if value < 0.7 {
        "yellow"
    } else {
        "green"
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| String::from("-"), |value| format!("{:.1}%", value * 100.0))
}

pub fn products_table(report: &ProductsReport) -> Vec<String> {
    let mut lines = vec![format!("products: {}", report.product_count)];
    push_ranking(&mut lines, "top sellers", &report.top_sellers);
    push_ranking(&mut lines, "revenue leaders", &report.revenue_leaders);
    push_ranking(&mut lines, "bottom sellers", &report.bottom_sellers);
    push_ranking(&mut lines, "unsold products", &report.unsold_products);
    lines
}

fn push_ranking(lines: &mut Vec<String>, title: &str, products: &[ProductSales]) {
    lines.push(format!("{title}:"));
    if products.is_empty() {
        lines.push(String::from("  (none)"));
    }
    for product in products {
        lines.push(format!(
            "  {:<8} {:<28} {:>8} {:>12.2}",
            product.product_id, product.product_name, product.total_quantity, product.total_sales
        ));
    }
}

pub fn clients_table(report: &ClientsReport) -> Vec<String> {
    let repeat = &report.repeat_purchase;
    let mut lines = vec![
        format!("customers   : {}", report.customer_count),
        format!("transactions: {}", report.transaction_count),
        format!(
            "repeat rate : {} [{}] ({} of {})",
            percent(Some(repeat.rate)),
            gauge_band(repeat.rate),
            repeat.repeat_customers,
            repeat.customers
        ),
    ];

    if let Some(card) = &report.new_customers {
        let delta = card
            .delta
            .map_or_else(|| String::from("n/a"), |delta| format!("{delta:+}"));
        lines.push(format!(
            "new customers: {} in week {} (delta {delta})",
            card.new_customers, card.week_start
        ));
    }

    lines.push(String::from("weekly return:"));
    for entry in &report.weekly_return {
        lines.push(format!(
            "  #{:<3} {}  {:>7}  ({} of {})",
            entry.week_index,
            entry.week_start,
            percent(entry.return_fraction),
            entry.returning_customers,
            entry.previous_week_customers
        ));
    }

    lines.push(String::from("activity (transactions by day and hour):"));
    for cell in &report.activity {
        lines.push(format!(
            "  {:<9} {:02}:00  {}",
            cell.day_name, cell.hour, cell.transactions
        ));
    }
    lines
}

/// Cohort rows by period offset, cells as percentages, `-` for no data.
pub fn retention_heatmap(matrix: &RetentionMatrix) -> Vec<String> {
    let mut header = format!("{:<10} {:>6}", "cohort", "size");
    for period in 0..matrix.periods {
        header.push_str(&format!(" {:>7}", format!("W{period}")));
    }

    let mut lines = vec![format!("week start: {}", matrix.week_start), header];
    for row in &matrix.cohorts {
        let mut line = format!("{:<10} {:>6}", row.cohort_week.to_string(), row.size);
        for period in 0..matrix.periods {
            line.push_str(&format!(" {:>7}", percent(row.retention_at(period))));
        }
        lines.push(line);
    }
    lines
}

pub fn query_table(result: &QueryResult) -> Vec<String> {
    let mut lines = vec![result
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect::<Vec<_>>()
        .join(" | ")];

    for row in &result.rows {
        lines.push(row.iter().map(format_sql_value).collect::<Vec<_>>().join(" | "));
    }
    lines.push(format!("({} rows)", result.row_count));
    lines
}

fn format_sql_value(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::String(text) => text.clone(),
        _ => value.to_string(),
    }
}
