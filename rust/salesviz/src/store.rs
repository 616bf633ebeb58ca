//! Store-access capability used by the chart engine.
//!
//! The engine only talks to the store through [`SalesStore`], which keeps the
//! classification and chart-building logic testable against an in-memory
//! implementation. [`crate::db::PgStore`] is the production implementation.

use crate::models::{DateTotal, QueryHistoryEntry, RegionTotal, SalesRecord, SalesSample};
use async_trait::async_trait;
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the credentials.
    #[error("{0}")]
    Connection(String),

    /// A statement failed or returned rows of an unexpected shape.
    #[error("{0}")]
    Query(String),

    #[error("table '{0}' does not exist")]
    TableMissing(String),
}

#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Trivial round-trip used by the liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    /// Most recent `limit` sales rows, newest date first.
    ///
    /// Fails with [`StoreError::TableMissing`] when the sales table has not
    /// been provisioned.
    async fn recent_sales(&self, limit: i64) -> StoreResult<Vec<SalesRecord>>;

    /// Total sales per region, largest total first.
    async fn totals_by_region(&self) -> StoreResult<Vec<RegionTotal>>;

    /// Total sales per calendar date, oldest date first.
    async fn totals_by_date(&self) -> StoreResult<Vec<DateTotal>>;

    /// Up to `limit` raw rows in store-native order.
    async fn sample_sales(&self, limit: i64) -> StoreResult<Vec<SalesSample>>;

    /// Appends a query-history entry. `created_at` is assigned by the store;
    /// any value on `entry` is ignored.
    async fn record_query(&self, entry: &QueryHistoryEntry) -> StoreResult<()>;
}
