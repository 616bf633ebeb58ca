//! Free-text classification into a fixed set of chart intents.

use super::chart::{ChartConfig, ChartType};
use crate::store::{SalesStore, StoreResult};

/// Maximum number of raw rows returned by the table fallback.
pub const SAMPLE_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartIntent {
    SalesByRegion,
    SalesOverTime,
    RawSample,
}

/// Checked in order against the lower-cased query; the first contained phrase
/// wins. Anything unmatched falls back to [`ChartIntent::RawSample`].
const DISPATCH: &[(&str, ChartIntent)] = &[
    ("sales by region", ChartIntent::SalesByRegion),
    ("sales over time", ChartIntent::SalesOverTime),
];

pub fn classify(query: &str) -> ChartIntent {
    let lower = query.to_lowercase();
    DISPATCH
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, intent)| *intent)
        .unwrap_or(ChartIntent::RawSample)
}

impl ChartIntent {
    pub fn chart_type(self) -> ChartType {
        match self {
            ChartIntent::SalesByRegion => ChartType::Bar,
            ChartIntent::SalesOverTime => ChartType::Line,
            ChartIntent::RawSample => ChartType::Table,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartIntent::SalesByRegion => "Sales by Region",
            ChartIntent::SalesOverTime => "Sales Over Time",
            ChartIntent::RawSample => "Sales Data",
        }
    }

    /// Runs the aggregation behind this intent and shapes the rows.
    pub async fn build(self, store: &dyn SalesStore) -> StoreResult<ChartConfig> {
        let title = self.title();
        Ok(match self {
            ChartIntent::SalesByRegion => ChartConfig::bar(store.totals_by_region().await?, title),
            ChartIntent::SalesOverTime => ChartConfig::line(store.totals_by_date().await?, title),
            ChartIntent::RawSample => {
                ChartConfig::table(store.sample_sales(SAMPLE_LIMIT).await?, title)
            }
        })
    }
}
