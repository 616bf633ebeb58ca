//! The chart description returned to the front-end renderer.

use crate::models::{DateTotal, RegionTotal, SalesSample};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Table,
}

/// Chart rows. Each variant carries exactly one row shape, so a chart can
/// never mix aggregate and raw rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Regions(Vec<RegionTotal>),
    Dates(Vec<DateTotal>),
    Samples(Vec<SalesSample>),
}

/// Rendering hints: axis keys for bar/line charts and a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<&'static str>,
    pub title: &'static str,
}

/// Immutable once built; the constructors pair each chart type with its
/// matching row shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    chart_type: ChartType,
    data: ChartData,
    config: RenderConfig,
}

impl ChartConfig {
    pub fn bar(rows: Vec<RegionTotal>, title: &'static str) -> Self {
        Self {
            chart_type: ChartType::Bar,
            data: ChartData::Regions(rows),
            config: RenderConfig {
                x: Some("region"),
                y: Some("total_sales"),
                title,
            },
        }
    }

    pub fn line(rows: Vec<DateTotal>, title: &'static str) -> Self {
        Self {
            chart_type: ChartType::Line,
            data: ChartData::Dates(rows),
            config: RenderConfig {
                x: Some("date"),
                y: Some("total_sales"),
                title,
            },
        }
    }

    pub fn table(rows: Vec<SalesSample>, title: &'static str) -> Self {
        Self {
            chart_type: ChartType::Table,
            data: ChartData::Samples(rows),
            config: RenderConfig {
                x: None,
                y: None,
                title,
            },
        }
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn row_count(&self) -> usize {
        match &self.data {
            ChartData::Regions(rows) => rows.len(),
            ChartData::Dates(rows) => rows.len(),
            ChartData::Samples(rows) => rows.len(),
        }
    }
}
