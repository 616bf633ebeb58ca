//! Row types read from and written to the sales store.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::deserialize::QueryableByName;
use diesel::sql_types::{Date, Float8, Nullable, Text};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row of `sales_data`.
///
/// Columns beyond the four the service understands are carried through
/// untouched in `extra`. NULLs in any column are passed on as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub region: Option<String>,
    pub product: Option<String>,
    pub sales_amount: Option<f64>,
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SalesRecord {
    pub fn new(
        region: impl Into<String>,
        product: impl Into<String>,
        sales_amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            region: Some(region.into()),
            product: Some(product.into()),
            sales_amount: Some(sales_amount),
            date: Some(date),
            extra: Map::new(),
        }
    }

    /// Decodes a row rendered by `to_jsonb` in the store.
    pub fn from_json(row: Value) -> serde_json::Result<Self> {
        serde_json::from_value(row)
    }
}

/// Bar-chart row. Rows without a region are grouped under `None`.
#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct RegionTotal {
    #[diesel(sql_type = Nullable<Text>)]
    pub region: Option<String>,
    #[diesel(sql_type = Float8)]
    pub total_sales: f64,
}

/// Line-chart row.
#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct DateTotal {
    #[diesel(sql_type = Date)]
    pub date: NaiveDate,
    #[diesel(sql_type = Float8)]
    pub total_sales: f64,
}

/// Table row.
#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct SalesSample {
    #[diesel(sql_type = Nullable<Text>)]
    pub region: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub product: Option<String>,
    #[diesel(sql_type = Float8)]
    pub sales_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHistoryEntry {
    pub query_text: String,
    pub chart_config: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
