//! Portfolio data and report types
//!
//! [`PortfolioData`] mirrors the portfolio-data API response (every field
//! optional, unknown fields ignored). [`PortfolioReport`] is the shaped,
//! display-ready record that gets rendered and saved as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One fund in the model portfolio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub category_name: Option<String>,
    /// Allocation in percent
    pub position: Option<f64>,
    /// Expense ratio in percent
    pub expense_ratio: Option<f64>,
}

/// Geographic exposure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: Option<String>,
    pub size: Option<f64>,
}

/// Look-through stock exposure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingStock {
    pub symbol: Option<String>,
    pub weight: Option<f64>,
}

/// Benchmark metrics reported by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub five_yr_annualized: Option<f64>,
    pub volatility: Option<f64>,
}

/// Portfolio-data API payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioData {
    pub holdings: Vec<Holding>,
    pub regions: Vec<Region>,
    pub underlying_stocks: Vec<UnderlyingStock>,
    /// ISO date -> daily return
    #[serde(rename = "portfolioReturns")]
    pub portfolio_returns: BTreeMap<String, f64>,
    /// ISO date -> daily return
    #[serde(rename = "benchmarkReturns")]
    pub benchmark_returns: BTreeMap<String, f64>,
    pub risk_level: Option<String>,
    pub five_yr_annualized: Option<f64>,
    pub three_yr_annualized: Option<f64>,
    pub one_yr_annualized: Option<f64>,
    pub volatility: Option<f64>,
    pub benchmark: BenchmarkMetrics,
}

impl PortfolioData {
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
            && self.regions.is_empty()
            && self.underlying_stocks.is_empty()
            && self.portfolio_returns.is_empty()
    }
}

/// Risk profile shown on the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskProfile {
    Low,
    Moderate,
    High,
    Custom,
}

impl RiskProfile {
    pub fn label(&self) -> &'static str {
        match self {
            RiskProfile::Low => "Low",
            RiskProfile::Moderate => "Moderate",
            RiskProfile::High => "High",
            RiskProfile::Custom => "Custom",
        }
    }

    /// Parse an API `risk_level`
    pub fn from_api(level: &str) -> Option<Self> {
        match level.trim().to_lowercase().as_str() {
            "high" => Some(RiskProfile::High),
            "low" => Some(RiskProfile::Low),
            "medium" | "moderate" => Some(RiskProfile::Moderate),
            "custom" => Some(RiskProfile::Custom),
            _ => None,
        }
    }

    /// CSS class of the risk badge
    pub fn badge_class(&self) -> &'static str {
        match self {
            RiskProfile::Low => "low",
            RiskProfile::Moderate | RiskProfile::Custom => "medium",
            RiskProfile::High => "high",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Methodology copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Methodology {
    pub title: String,
    pub description: String,
    pub bullets: Vec<String>,
}

/// Where the methodology copy came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopySource {
    Static,
    Generated,
}

/// Holdings table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingRow {
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub expense_ratio: String,
    pub allocation: String,
}

/// Name/weight table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRow {
    pub name: String,
    pub weight: String,
}

/// Asset-class slice of the allocation donut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub category: String,
    pub value: f64,
    pub color: String,
}

/// Growth of 10,000 over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSeries {
    pub labels: Vec<String>,
    pub portfolio: Vec<f64>,
    pub benchmark: Vec<f64>,
}

/// Formatted headline metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub five_year_return: String,
    pub five_year_return_benchmark: String,
    pub three_year_return: String,
    pub three_year_benchmark: String,
    pub one_year_return: String,
    pub five_year_volatility: String,
    pub five_year_vol_benchmark: String,
}

/// Expected one-year return in percent, by market scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenarios {
    pub best: i32,
    pub average: i32,
    pub worst: i32,
}

/// Display-ready report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub report_date: String,
    pub investor_name: String,
    pub email: String,
    pub customer_id: String,
    pub age: String,
    pub investment_amount: String,
    pub goal: String,
    pub risk_behavior: String,
    pub time_horizon: String,
    pub portfolio_id: u32,
    pub portfolio_type: String,
    pub risk_profile: RiskProfile,
    pub holdings: Vec<HoldingRow>,
    pub geographic: Vec<WeightRow>,
    pub top_holdings: Vec<WeightRow>,
    pub allocation: Vec<AllocationSlice>,
    pub performance: Option<PerformanceSeries>,
    pub metrics: Metrics,
    /// `None` when the portfolio has no positions
    pub scenarios: Option<Scenarios>,
    pub themes: Vec<String>,
    pub methodology: Methodology,
    pub methodology_source: CopySource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_payload() {
        let json = r#"{
            "holdings": [{"ticker": "VT", "name": "Vanguard Total World", "category_name": "Global markets ETFs", "position": 50}],
            "portfolioReturns": {"2024-01-02": 0.01},
            "risk_level": "Medium",
            "benchmark": {"five_yr_annualized": 14.2},
            "something_new": true
        }"#;

        let data: PortfolioData = serde_json::from_str(json).unwrap();
        assert_eq!(data.holdings[0].position, Some(50.0));
        assert_eq!(data.portfolio_returns.len(), 1);
        assert!(data.benchmark_returns.is_empty());
        assert_eq!(data.benchmark.five_yr_annualized, Some(14.2));
        assert_eq!(data.benchmark.volatility, None);
        assert!(!data.is_empty());
    }

    #[test]
    fn test_risk_profile_from_api() {
        assert_eq!(RiskProfile::from_api("MEDIUM"), Some(RiskProfile::Moderate));
        assert_eq!(RiskProfile::from_api("custom"), Some(RiskProfile::Custom));
        assert_eq!(RiskProfile::from_api("extreme"), None);
        assert_eq!(RiskProfile::High.badge_class(), "high");
    }
}
