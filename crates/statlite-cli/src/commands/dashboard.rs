use serde_json::{Map, Value};
use statlite_core::{
    AnalyticsError, Dashboard, DashboardPages, DataSource, EnvelopeError, SalesPages,
};

use crate::error::CliError;
use crate::output;

use super::CommandResult;

/// Renders every page that loaded; failed pages become `null` plus an
/// envelope error. Fails outright only when no page loaded.
pub fn run<S: DataSource>(dashboard: &Dashboard<S>) -> Result<CommandResult, CliError> {
    let DashboardPages { products, sales } = dashboard.load_pages();
    let (products, sales) = match (products, sales) {
        (Err(error), Err(_)) => return Err(error.into()),
        pages => pages,
    };

    let mut view = PageSet::default();
    match products {
        Ok(report) => view.render(
            "products",
            serde_json::to_value(&report)?,
            report.warnings(),
            output::products_table(&report),
        ),
        Err(error) => view.fail("products", &error)?,
    }

    match sales {
        Ok(SalesPages { clients, cohort }) => {
            match clients {
                Ok(report) => view.render(
                    "clients",
                    serde_json::to_value(&report)?,
                    report.warnings(),
                    output::clients_table(&report),
                ),
                Err(error) => view.fail("clients", &error)?,
            }
            view.render(
                "cohort",
                serde_json::to_value(&cohort)?,
                cohort.warnings(),
                output::retention_heatmap(&cohort.matrix),
            );
        }
        Err(error) => {
            view.fail("clients", &error)?;
            view.fail("cohort", &error)?;
        }
    }

    Ok(CommandResult::ok(Value::Object(view.data))
        .with_warnings(view.warnings)
        .with_errors(view.errors)
        .with_table(view.table))
}

#[derive(Default)]
struct PageSet {
    data: Map<String, Value>,
    warnings: Vec<String>,
    errors: Vec<EnvelopeError>,
    table: Vec<String>,
}

impl PageSet {
    fn render(&mut self, name: &str, data: Value, warnings: Vec<String>, lines: Vec<String>) {
        self.data.insert(name.to_owned(), data);
        self.warnings.extend(warnings);
        self.push_section(lines);
    }

    fn fail(&mut self, name: &str, error: &AnalyticsError) -> Result<(), CliError> {
        self.data.insert(name.to_owned(), Value::Null);
        self.errors
            .push(EnvelopeError::new(error.code(), format!("{name} page: {error}"))?);
        self.push_section(vec![format!("{name}: unavailable ({})", error.code())]);
        Ok(())
    }

    fn push_section(&mut self, lines: Vec<String>) {
        if !self.table.is_empty() {
            self.table.push(String::new());
        }
        self.table.extend(lines);
    }
}
