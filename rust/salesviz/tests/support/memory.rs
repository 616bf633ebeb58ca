//! In-memory `SalesStore` used to drive the service without PostgreSQL.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use salesviz::{
    models::{DateTotal, QueryHistoryEntry, RegionTotal, SalesRecord, SalesSample},
    store::{SalesStore, StoreError, StoreResult},
};
use std::{cmp::Reverse, collections::BTreeMap};

#[derive(Default)]
pub struct MemoryStore {
    sales: Vec<SalesRecord>,
    table_missing: bool,
    offline: bool,
    history_broken: bool,
    history: Mutex<Vec<QueryHistoryEntry>>,
}

impl MemoryStore {
    pub fn with_sales(sales: Vec<SalesRecord>) -> Self {
        Self {
            sales,
            ..Self::default()
        }
    }

    /// Behaves as if `sales_data` was never created.
    pub fn without_sales_table() -> Self {
        Self {
            table_missing: true,
            ..Self::default()
        }
    }

    /// Every call fails as if the database were unreachable.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Reads work, history inserts fail.
    pub fn with_broken_history(mut self) -> Self {
        self.history_broken = true;
        self
    }

    pub fn history(&self) -> Vec<QueryHistoryEntry> {
        self.history.lock().clone()
    }

    fn check_reachable(&self) -> StoreResult<()> {
        if self.offline {
            return Err(StoreError::Connection(
                "connection to server at \"db.test\" failed: Connection refused".into(),
            ));
        }
        Ok(())
    }

    fn rows(&self) -> StoreResult<&[SalesRecord]> {
        self.check_reachable()?;
        if self.table_missing {
            return Err(StoreError::Query(
                "relation \"sales_data\" does not exist".into(),
            ));
        }
        Ok(&self.sales)
    }
}

#[async_trait]
impl SalesStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_reachable()
    }

    async fn recent_sales(&self, limit: i64) -> StoreResult<Vec<SalesRecord>> {
        self.check_reachable()?;
        if self.table_missing {
            return Err(StoreError::TableMissing("sales_data".into()));
        }
        let mut rows = self.sales.clone();
        // ORDER BY date DESC puts NULL dates first.
        rows.sort_by_key(|row| (row.date.is_some(), Reverse(row.date)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn totals_by_region(&self) -> StoreResult<Vec<RegionTotal>> {
        let mut totals: BTreeMap<Option<&str>, f64> = BTreeMap::new();
        for row in self.rows()? {
            *totals.entry(row.region.as_deref()).or_default() += row.sales_amount.unwrap_or(0.0);
        }
        let mut rows: Vec<_> = totals
            .into_iter()
            .map(|(region, total_sales)| RegionTotal {
                region: region.map(str::to_string),
                total_sales,
            })
            .collect();
        rows.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
        Ok(rows)
    }

    async fn totals_by_date(&self) -> StoreResult<Vec<DateTotal>> {
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for row in self.rows()? {
            let date = row.date.ok_or_else(null_column)?;
            *totals.entry(date).or_default() += row.sales_amount.unwrap_or(0.0);
        }
        Ok(totals
            .into_iter()
            .map(|(date, total_sales)| DateTotal { date, total_sales })
            .collect())
    }

    async fn sample_sales(&self, limit: i64) -> StoreResult<Vec<SalesSample>> {
        self.rows()?
            .iter()
            .take(limit.max(0) as usize)
            .map(|row| {
                Ok(SalesSample {
                    region: row.region.clone(),
                    product: row.product.clone(),
                    sales_amount: row.sales_amount.ok_or_else(null_column)?,
                })
            })
            .collect()
    }

    async fn record_query(&self, entry: &QueryHistoryEntry) -> StoreResult<()> {
        self.check_reachable()?;
        if self.history_broken {
            return Err(StoreError::Query(
                "relation \"user_queries\" does not exist".into(),
            ));
        }
        self.history.lock().push(QueryHistoryEntry {
            created_at: Some(Utc::now()),
            ..entry.clone()
        });
        Ok(())
    }
}

fn null_column() -> StoreError {
    StoreError::Query("Unexpected null for non-null column".into())
}

/// Thirty rows over three regions and ten days, inserted out of date order.
pub fn fixture_sales() -> Vec<SalesRecord> {
    let regions = [("North", 100.0), ("South", 250.0), ("West", 40.0)];
    let products = ["Widget", "Gadget"];
    let mut rows = Vec::new();
    for day in (1..=10u32).rev() {
        for (idx, (region, base)) in regions.iter().enumerate() {
            let date = NaiveDate::from_ymd_opt(2024, 1, day).expect("valid fixture date");
            rows.push(SalesRecord::new(
                *region,
                products[(day as usize + idx) % products.len()],
                base + f64::from(day),
                date,
            ));
        }
    }
    rows
}
