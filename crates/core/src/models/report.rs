//! Sales report summary for the back-office.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Reporting window accepted by `GET /reports/summary/?period=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReportPeriod {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "365d")]
    Year,
}

impl ReportPeriod {
    pub const ALL: [Self; 4] = [Self::Week, Self::Month, Self::Quarter, Self::Year];

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "365d",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Week => "Last 7 days",
            Self::Month => "Last 30 days",
            Self::Quarter => "Last 90 days",
            Self::Year => "Last 12 months",
        }
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("invalid report period: {s}"))
    }
}

/// Best-selling product within the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProduct {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub quantity_sold: u64,
    #[serde(default)]
    pub revenue: Decimal,
}

/// One day of the revenue series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    #[serde(default)]
    pub orders: u64,
    #[serde(default)]
    pub revenue: Decimal,
}

/// Response of `GET /reports/summary/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSummary {
    pub total_revenue: Decimal,
    pub total_orders: u64,
    pub average_order_value: Decimal,
    pub new_customers: u64,
    pub pending_orders: u64,
    pub top_products: Vec<TopProduct>,
    pub daily: Vec<DailyPoint>,
    pub orders_by_status: BTreeMap<String, u64>,
}

impl ReportSummary {
    /// Bar height for a day as a whole percentage of the best day.
    #[must_use]
    pub fn bar_percent(&self, point: &DailyPoint) -> u32 {
        let peak = self
            .daily
            .iter()
            .map(|p| p.revenue)
            .max()
            .unwrap_or(Decimal::ZERO);
        if peak <= Decimal::ZERO {
            return 0;
        }
        let pct = (point.revenue * Decimal::ONE_HUNDRED / peak).round();
        pct.to_u32().unwrap_or(0).min(100)
    }
}
