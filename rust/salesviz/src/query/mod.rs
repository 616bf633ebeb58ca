mod chart;
mod intent;

pub use chart::{ChartConfig, ChartData, ChartType, RenderConfig};
pub use intent::{classify, ChartIntent, SAMPLE_LIMIT};

use crate::{
    error::{Result, ServiceError},
    models::{QueryHistoryEntry, SalesRecord},
    store::{SalesStore, StoreError},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of rows returned by the sales listing.
pub const RECENT_SALES_LIMIT: i64 = 100;

const SALES_TABLE_MISSING: &str =
    "sales_data table not found. Please run database initialization scripts.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToVizRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesListing {
    pub data: Vec<SalesRecord>,
    pub count: usize,
}

/// Classifies free-text queries, runs the matching aggregation and records
/// each answered query in the history table.
#[derive(Clone)]
pub struct VizEngine {
    store: Arc<dyn SalesStore>,
}

impl VizEngine {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        Self { store }
    }

    pub async fn text_to_viz(&self, request: &TextToVizRequest) -> Result<ChartConfig> {
        let intent = classify(&request.query);
        debug!(?intent, chart_type = ?intent.chart_type(), "classified query");

        let chart = intent.build(self.store.as_ref()).await?;
        debug!(chart_type = ?chart.chart_type(), rows = chart.row_count(), "built chart");
        self.record_history(&request.query, &chart).await;
        Ok(chart)
    }

    /// Best effort: failures are logged and never reach the caller.
    async fn record_history(&self, query_text: &str, chart: &ChartConfig) {
        let chart_config = match serde_json::to_value(chart) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to serialize chart config for history");
                return;
            }
        };

        let entry = QueryHistoryEntry {
            query_text: query_text.to_string(),
            chart_config,
            created_at: None,
        };
        if let Err(err) = self.store.record_query(&entry).await {
            warn!(error = %err, "failed to store query");
        }
    }

    pub async fn recent_sales(&self) -> Result<SalesListing> {
        let data = self
            .store
            .recent_sales(RECENT_SALES_LIMIT)
            .await
            .map_err(|err| match err {
                StoreError::TableMissing(_) => ServiceError::NotFound(SALES_TABLE_MISSING.into()),
                other => ServiceError::Store(other),
            })?;

        Ok(SalesListing {
            count: data.len(),
            data,
        })
    }

    pub async fn health(&self) -> Result<()> {
        self.store.ping().await.map_err(ServiceError::Unavailable)
    }
}
