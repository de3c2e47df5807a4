//! Report assembly for the three dashboard pages.
//!
//! Every call fetches fresh rows from the data source and recomputes from
//! scratch; nothing is cached between calls.

use std::collections::BTreeSet;

use serde::Serialize;
use statlite_warehouse::QueryResult;

use crate::cohort::{build_retention_matrix, RetentionMatrix};
use crate::data_source::{DataSource, PRODUCTS_QUERY, SALES_QUERY};
use crate::domain::{DerivedTransaction, ProductSales, WeekStart};
use crate::error::{AnalyticsError, ValidationError};
use crate::features::derive_time_features;
use crate::kpi::{
    activity_profile, new_customer_card, repeat_purchase_summary, week_over_week_return,
    ActivityCell, NewCustomerCard, RepeatPurchaseSummary, WeeklyReturn,
};
use crate::products::{ProductRankings, DEFAULT_TOP_N};
use crate::table::{decode_products, decode_transactions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub week_start: WeekStart,
    /// Length of each product ranking.
    pub top_n: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.top_n == 0 {
            return Err(ValidationError::InvalidLimit);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductsReport {
    pub product_count: usize,
    pub top_sellers: Vec<ProductSales>,
    pub revenue_leaders: Vec<ProductSales>,
    pub bottom_sellers: Vec<ProductSales>,
    pub unsold_products: Vec<ProductSales>,
}

impl ProductsReport {
    pub fn warnings(&self) -> Vec<String> {
        if self.product_count == 0 {
            return vec![String::from("product catalog is empty")];
        }
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientsReport {
    pub customer_count: usize,
    pub transaction_count: usize,
    pub repeat_purchase: RepeatPurchaseSummary,
    pub new_customers: Option<NewCustomerCard>,
    pub weekly_return: Vec<WeeklyReturn>,
    pub activity: Vec<ActivityCell>,
}

impl ClientsReport {
    /// One line per week whose return fraction could not be computed.
    pub fn warnings(&self) -> Vec<String> {
        self.weekly_return
            .iter()
            .filter(|entry| entry.return_fraction.is_none())
            .map(|entry| {
                format!(
                    "week {} has no return rate: no customers in week {}",
                    entry.week_start, entry.previous_week
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortReport {
    pub matrix: RetentionMatrix,
}

impl CohortReport {
    pub fn warnings(&self) -> Vec<String> {
        if self.matrix.is_empty() {
            return vec![String::from("no sales recorded; retention matrix is empty")];
        }
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub products: ProductsReport,
    pub clients: ClientsReport,
    pub cohort: CohortReport,
}

impl DashboardReport {
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = self.products.warnings();
        warnings.extend(self.clients.warnings());
        warnings.extend(self.cohort.warnings());
        warnings
    }
}

/// Page results kept apart, so one failing page leaves the others usable.
#[derive(Debug)]
pub struct DashboardPages {
    pub products: Result<ProductsReport, AnalyticsError>,
    /// Clients and cohort share one sales fetch; a failed fetch fails both.
    pub sales: Result<SalesPages, AnalyticsError>,
}

#[derive(Debug)]
pub struct SalesPages {
    pub clients: Result<ClientsReport, AnalyticsError>,
    pub cohort: CohortReport,
}

/// Computes dashboard reports from a [`DataSource`].
pub struct Dashboard<S> {
    source: S,
    options: AnalysisOptions,
}

impl<S: DataSource> Dashboard<S> {
    pub fn new(source: S, options: AnalysisOptions) -> Result<Self, ValidationError> {
        options.validate()?;
        Ok(Self { source, options })
    }

    pub fn options(&self) -> AnalysisOptions {
        self.options
    }

    pub fn products(&self) -> Result<ProductsReport, AnalyticsError> {
        let products = decode_products(&self.fetch(PRODUCTS_QUERY)?)?;
        let rankings = ProductRankings::new(products);
        let top_n = self.options.top_n;

        Ok(ProductsReport {
            product_count: rankings.len(),
            top_sellers: rankings.top_sellers(top_n),
            revenue_leaders: rankings.revenue_leaders(top_n),
            bottom_sellers: rankings.bottom_sellers(top_n),
            unsold_products: rankings.unsold_products(),
        })
    }

    pub fn clients(&self) -> Result<ClientsReport, AnalyticsError> {
        let rows = self.sale_lines()?;
        let matrix = build_retention_matrix(&rows, self.options.week_start)?;
        clients_report(&rows, &matrix)
    }

    pub fn cohort(&self) -> Result<CohortReport, AnalyticsError> {
        let rows = self.sale_lines()?;
        Ok(CohortReport {
            matrix: build_retention_matrix(&rows, self.options.week_start)?,
        })
    }

    /// All three pages from one products fetch and one sales fetch.
    pub fn load(&self) -> Result<DashboardReport, AnalyticsError> {
        let DashboardPages { products, sales } = self.load_pages();
        let products = products?;
        let SalesPages { clients, cohort } = sales?;

        Ok(DashboardReport {
            products,
            clients: clients?,
            cohort,
        })
    }

    /// Like [`Dashboard::load`], but each page keeps its own outcome.
    pub fn load_pages(&self) -> DashboardPages {
        let products = self.products();
        let sales = self.sale_lines().and_then(|rows| {
            let matrix = build_retention_matrix(&rows, self.options.week_start)?;
            let clients = clients_report(&rows, &matrix);
            Ok(SalesPages {
                clients,
                cohort: CohortReport { matrix },
            })
        });

        if let Err(error) = &products {
            tracing::warn!(%error, "products page failed");
        }
        match &sales {
            Err(error) => tracing::warn!(%error, "sales pages failed"),
            Ok(SalesPages { clients: Err(error), .. }) => {
                tracing::warn!(%error, "clients page failed");
            }
            Ok(_) => {}
        }

        DashboardPages { products, sales }
    }

    fn sale_lines(&self) -> Result<Vec<DerivedTransaction>, AnalyticsError> {
        let records = decode_transactions(&self.fetch(SALES_QUERY)?)?;
        derive_time_features(records, self.options.week_start)
    }

    fn fetch(&self, sql: &str) -> Result<QueryResult, AnalyticsError> {
        let result = self.source.run_query(sql)?;
        if result.truncated {
            return Err(AnalyticsError::DatasetTruncated {
                max_rows: result.row_count,
            });
        }
        tracing::debug!(rows = result.row_count, "fetched dataset");
        Ok(result)
    }
}

fn clients_report(
    rows: &[DerivedTransaction],
    matrix: &RetentionMatrix,
) -> Result<ClientsReport, AnalyticsError> {
    let repeat_purchase = repeat_purchase_summary(rows)?;
    let transaction_count = rows
        .iter()
        .map(DerivedTransaction::transaction_id)
        .collect::<BTreeSet<_>>()
        .len();

    Ok(ClientsReport {
        customer_count: repeat_purchase.customers,
        transaction_count,
        repeat_purchase,
        new_customers: new_customer_card(matrix),
        weekly_return: week_over_week_return(rows)?,
        activity: activity_profile(rows),
    })
}
