//! Market-data client
//!
//! Fills what the portfolio payload leaves out: S&P 500 daily returns
//! when `benchmarkReturns` is missing, and fund expense ratios.
//!
//! Endpoints (relative to the configured base):
//! `GET /v8/finance/chart/%5EGSPC?period1=..&period2=..&interval=1d` and
//! `GET /v10/finance/quoteSummary/{ticker}?modules=..`.

use crate::cli::config::MarketConfig;
use crate::errors::{FolioError, Result};
use crate::portfolio::types::Holding;
use crate::retry::RetryManager;
use chrono::{DateTime, NaiveDate};
use futures_util::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "Mozilla/5.0 (compatible; quizfolio)";

const SP500_SYMBOL: &str = "%5EGSPC";
const SUMMARY_MODULES: &str = "defaultKeyStatistics,fundProfile";

/// Gold ETC missing from the fund-profile data, with its published fee
const GOLD_ETC: (&str, f64) = ("IGLN.L", 0.12);

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Quote {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

/// Market-data client
#[derive(Debug, Clone)]
pub struct MarketData {
    client: Client,
    base_url: String,
    retry: RetryManager,
}

impl MarketData {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, REQUEST_TIMEOUT, RetryManager::with_config(2, 500))
    }

    pub fn from_config(config: &MarketConfig) -> Result<Self> {
        Self::build(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            RetryManager::with_config(config.max_attempts, 500),
        )
    }

    fn build(base_url: &str, timeout: Duration, retry: RetryManager) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(FolioError::ConfigError("market.base_url must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FolioError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn with_retry(mut self, retry: RetryManager) -> Self {
        self.retry = retry;
        self
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        self.retry
            .execute_with_retry(|| async {
                let response = self.client.get(url).query(query).send().await?;

                let status = response.status();
                if !status.is_success() {
                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(FolioError::MarketDataError {
                        status: status.as_u16(),
                        message: message.chars().take(200).collect(),
                    });
                }

                Ok(response.json::<Value>().await?)
            })
            .await
    }

    /// S&P 500 daily returns keyed by ISO date, both ends inclusive
    pub async fn fetch_sp500_data(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<String, f64>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, SP500_SYMBOL);
        let query = [
            ("period1", day_start(start).to_string()),
            ("period2", (day_start(end) + 86_400).to_string()),
            ("interval", "1d".to_string()),
        ];

        debug!(%start, %end, "fetching S&P 500 history");
        let body = self.get_json(&url, &query).await?;
        let envelope: ChartEnvelope = serde_json::from_value(body)?;

        let result = envelope
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| FolioError::MarketDataError {
                status: 200,
                message: "chart response has no result".to_string(),
            })?;

        // Adjusted closes when present, raw closes otherwise
        let closes = match result.indicators.adjclose.into_iter().next() {
            Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
            _ => result
                .indicators
                .quote
                .into_iter()
                .next()
                .map(|q| q.close)
                .unwrap_or_default(),
        };

        let returns = daily_returns(&result.timestamp, &closes);
        info!(days = returns.len(), "S&P 500 benchmark received");
        Ok(returns)
    }

    /// Expense ratio in percent, `None` when unknown
    pub async fn fetch_expense_ratio(&self, ticker: &str) -> Option<f64> {
        if ticker == GOLD_ETC.0 {
            return Some(GOLD_ETC.1);
        }

        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);
        match self.get_json(&url, &[("modules", SUMMARY_MODULES.to_string())]).await {
            Ok(body) => expense_ratio_from_summary(&body),
            Err(e) => {
                debug!(ticker, error = %e, "expense ratio unavailable");
                None
            }
        }
    }

    /// Look up every missing expense ratio concurrently; returns how many were filled
    pub async fn fill_expense_ratios(&self, holdings: &mut [Holding]) -> usize {
        let missing: Vec<(usize, String)> = holdings
            .iter()
            .enumerate()
            .filter(|(_, h)| h.expense_ratio.is_none())
            .filter_map(|(i, h)| h.ticker.clone().map(|t| (i, t)))
            .collect();

        let ratios = join_all(missing.iter().map(|(_, t)| self.fetch_expense_ratio(t))).await;

        let mut filled = 0;
        for ((index, _), ratio) in missing.iter().zip(ratios) {
            if let Some(ratio) = ratio {
                holdings[*index].expense_ratio = Some(ratio);
                filled += 1;
            }
        }
        filled
    }
}

fn day_start(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// First and last date of a returns series
pub fn benchmark_window(returns: &BTreeMap<String, f64>) -> Option<(NaiveDate, NaiveDate)> {
    let parse = |d: &String| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok();
    let start = returns.keys().find_map(parse)?;
    let end = returns.keys().rev().find_map(parse)?;
    Some((start, end))
}

/// Percentage change between consecutive closes; gaps are skipped
pub fn daily_returns(timestamps: &[i64], closes: &[Option<f64>]) -> BTreeMap<String, f64> {
    let mut returns = BTreeMap::new();
    let mut previous: Option<f64> = None;

    for (ts, close) in timestamps.iter().zip(closes) {
        let Some(close) = *close else {
            continue;
        };
        if let (Some(prev), Some(date)) = (previous, DateTime::from_timestamp(*ts, 0)) {
            if prev != 0.0 {
                returns.insert(date.format("%Y-%m-%d").to_string(), close / prev - 1.0);
            }
        }
        previous = Some(close);
    }

    returns
}

/// `netExpenseRatio` is already a percentage; the annual-report figure is a fraction
pub fn expense_ratio_from_summary(body: &Value) -> Option<f64> {
    let result = body.pointer("/quoteSummary/result/0")?;
    let raw = |path: &str| result.pointer(path).and_then(Value::as_f64);

    raw("/defaultKeyStatistics/netExpenseRatio/raw")
        .or_else(|| raw("/defaultKeyStatistics/annualReportExpenseRatio/raw").map(|r| r * 100.0))
        .or_else(|| {
            raw("/fundProfile/feesExpensesInvestment/annualReportExpenseRatio/raw").map(|r| r * 100.0)
        })
}
