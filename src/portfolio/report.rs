//! Report shaping
//!
//! Turns the quiz profile and the raw portfolio payload into a
//! [`PortfolioReport`]: table rows, allocation slices, the growth-of-10,000
//! series, formatted metrics, themes and the static methodology copy.

use crate::portfolio::methodology::methodology_content;
use crate::portfolio::types::{
    AllocationSlice, CopySource, HoldingRow, Metrics, PerformanceSeries, PortfolioData,
    PortfolioReport, RiskProfile, Scenarios, WeightRow,
};
use crate::quiz::{PortfolioType, QuizProfile};
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;

pub(crate) const MAX_HOLDINGS: usize = 8;
const MAX_REGIONS: usize = 5;
const MAX_TOP_HOLDINGS: usize = 10;
const MAX_THEMES: usize = 10;
const MAX_TOPIC_THEMES: usize = 5;

/// Trading days per year
const TRADING_DAYS: usize = 252;
const MIN_CHART_POINTS: usize = 60;
const START_VALUE: f64 = 10_000.0;

const CATEGORY_COLORS: &[(&str, &str)] = &[
    ("Bond ETFs", "#1e3a8a"),
    ("U.S. stocks ETFs", "#3b82f6"),
    ("Global markets ETFs", "#14b8a6"),
    ("Technology ETFs", "#8b5cf6"),
    ("Emerging markets ETFs", "#f97316"),
    ("Commodities ETFs", "#eab308"),
];
pub const DEFAULT_CATEGORY_COLOR: &str = "#6b7280";

const FILLER_THEMES: &[&str] = &[
    "Diversification",
    "Global Markets",
    "Cost-Effective ETFs",
    "Strategic Allocation",
    "Risk Management",
    "Capital Growth",
    "Market Exposure",
    "Asset Balance",
];

const MISSING: &str = "-";
const NOT_AVAILABLE: &str = "N/A";

/// Build the report dated today
pub fn build_report(
    profile: &QuizProfile,
    portfolio: PortfolioType,
    data: &PortfolioData,
) -> PortfolioReport {
    build_report_on(profile, portfolio, data, Local::now().date_naive())
}

/// Build the report for a fixed date
pub fn build_report_on(
    profile: &QuizProfile,
    portfolio: PortfolioType,
    data: &PortfolioData,
    date: NaiveDate,
) -> PortfolioReport {
    let risk_profile = resolve_risk_profile(data.risk_level.as_deref(), portfolio);
    let time_horizon = profile.horizon_label().to_string();
    let methodology = methodology_content(risk_profile, &time_horizon);

    PortfolioReport {
        report_date: date.format("%d %B %Y").to_string(),
        investor_name: or_dash(profile.user_name.as_deref()),
        email: or_dash(profile.user_email.as_deref()),
        customer_id: or_dash(profile.customer_id.as_deref()),
        age: or_dash(profile.age.as_deref()),
        investment_amount: profile.amount.map(group_thousands).unwrap_or_else(|| MISSING.to_string()),
        goal: profile.goal_label().to_string(),
        risk_behavior: profile.behavior_label().to_string(),
        time_horizon,
        portfolio_id: portfolio.id(),
        portfolio_type: portfolio.label().to_string(),
        risk_profile,
        holdings: holding_rows(data),
        geographic: data
            .regions
            .iter()
            .take(MAX_REGIONS)
            .map(|r| WeightRow {
                name: r.name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                weight: format!("{:.1}%", r.size.unwrap_or(0.0)),
            })
            .collect(),
        top_holdings: data
            .underlying_stocks
            .iter()
            .take(MAX_TOP_HOLDINGS)
            .map(|s| WeightRow {
                name: s.symbol.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                weight: format!("{:.2}%", s.weight.unwrap_or(0.0)),
            })
            .collect(),
        allocation: allocation(data),
        performance: performance_series(&data.portfolio_returns, &data.benchmark_returns),
        metrics: metrics(data),
        scenarios: asset_split(data).map(|(equity, bond)| calculate_scenarios(equity, bond)),
        themes: themes(profile, data),
        methodology,
        methodology_source: CopySource::Static,
    }
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or(MISSING).to_string()
}

/// API risk level first, then the tier
pub fn resolve_risk_profile(risk_level: Option<&str>, portfolio: PortfolioType) -> RiskProfile {
    risk_level
        .and_then(RiskProfile::from_api)
        .unwrap_or(match portfolio {
            PortfolioType::Preservation => RiskProfile::Low,
            PortfolioType::Balanced => RiskProfile::Moderate,
            PortfolioType::Growth => RiskProfile::High,
        })
}

/// Colour of an asset-class category
pub fn category_color(category: &str) -> &'static str {
    CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_CATEGORY_COLOR)
}

fn holding_rows(data: &PortfolioData) -> Vec<HoldingRow> {
    data.holdings
        .iter()
        .take(MAX_HOLDINGS)
        .map(|h| HoldingRow {
            symbol: h.ticker.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            name: h.name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            category: h.category_name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            expense_ratio: h
                .expense_ratio
                .map(|er| format!("{:.2}%", er))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            allocation: h
                .position
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| MISSING.to_string()),
        })
        .collect()
}

/// Position totals per category, in first-appearance order
fn allocation(data: &PortfolioData) -> Vec<AllocationSlice> {
    let mut slices: Vec<AllocationSlice> = Vec::new();

    for holding in &data.holdings {
        let category = holding.category_name.as_deref().unwrap_or(NOT_AVAILABLE);
        let weight = holding.position.unwrap_or(0.0);

        match slices.iter_mut().find(|s| s.category == category) {
            Some(slice) => slice.value += weight,
            None => slices.push(AllocationSlice {
                category: category.to_string(),
                value: weight,
                color: category_color(category).to_string(),
            }),
        }
    }

    slices
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Growth of 10,000 over the most recent trading year
///
/// Dates come from the portfolio series; a date where both returns are zero
/// (or missing) is skipped.
pub fn performance_series(
    portfolio: &BTreeMap<String, f64>,
    benchmark: &BTreeMap<String, f64>,
) -> Option<PerformanceSeries> {
    if portfolio.is_empty() {
        return None;
    }

    let points = TRADING_DAYS.min(MIN_CHART_POINTS.max(portfolio.len()));
    let skip = portfolio.len().saturating_sub(points);

    let mut portfolio_value = START_VALUE;
    let mut benchmark_value = START_VALUE;
    let mut series = PerformanceSeries {
        labels: Vec::new(),
        portfolio: Vec::new(),
        benchmark: Vec::new(),
    };

    for (date, p_return) in portfolio.iter().skip(skip) {
        let b_return = benchmark.get(date).copied().unwrap_or(0.0);
        if *p_return == 0.0 && b_return == 0.0 {
            continue;
        }

        portfolio_value *= 1.0 + p_return;
        benchmark_value *= 1.0 + b_return;

        series.portfolio.push(round2(portfolio_value));
        series.benchmark.push(round2(benchmark_value));
        series.labels.push(month_label(date));
    }

    Some(series)
}

/// `"2024-03-15"` -> `"Mar 2024"`; unparseable dates pass through
fn month_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// Annualised return over the last three trading years, in percent
pub fn three_year_annualized(returns: &BTreeMap<String, f64>) -> Option<f64> {
    let window = TRADING_DAYS * 3;
    if returns.len() < window {
        return None;
    }

    let growth: f64 = returns
        .values()
        .skip(returns.len() - window)
        .map(|r| 1.0 + r)
        .product();

    Some((growth.powf(1.0 / 3.0) - 1.0) * 100.0)
}

fn signed_percent(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{:+.1}%", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn metrics(data: &PortfolioData) -> Metrics {
    Metrics {
        five_year_return: signed_percent(data.five_yr_annualized),
        five_year_return_benchmark: signed_percent(data.benchmark.five_yr_annualized),
        three_year_return: signed_percent(data.three_yr_annualized),
        three_year_benchmark: signed_percent(three_year_annualized(&data.benchmark_returns)),
        one_year_return: signed_percent(data.one_yr_annualized),
        five_year_volatility: signed_percent(data.volatility),
        five_year_vol_benchmark: signed_percent(data.benchmark.volatility),
    }
}

/// Equity and bond percentages of the whole portfolio.
///
/// Categories mentioning bonds count as bonds, commodities count as
/// neither, everything else is equity.
pub fn asset_split(data: &PortfolioData) -> Option<(f64, f64)> {
    let mut equity = 0.0;
    let mut bond = 0.0;
    let mut any = false;

    for holding in &data.holdings {
        let Some(position) = holding.position else {
            continue;
        };
        any = true;
        let category = holding.category_name.as_deref().unwrap_or_default().to_lowercase();
        if category.contains("bond") {
            bond += position;
        } else if !category.contains("commodit") {
            equity += position;
        }
    }

    any.then_some((equity, bond))
}

/// Best, average and worst one-year outcomes for an equity/bond mix
pub fn calculate_scenarios(equity_pct: f64, bond_pct: f64) -> Scenarios {
    let (eq, bd) = (equity_pct / 100.0, bond_pct / 100.0);
    let whole = |value: f64| value.round_ties_even() as i32;
    Scenarios {
        best: whole(eq * 28.0 + bd * 10.0),
        average: whole(eq * 9.0 + bd * 4.0),
        worst: whole(eq * -22.0 + bd * -2.0),
    }
}

fn push_unique(themes: &mut Vec<String>, theme: &str) {
    if !theme.is_empty() && !themes.iter().any(|t| t == theme) {
        themes.push(theme.to_string());
    }
}

fn themes(profile: &QuizProfile, data: &PortfolioData) -> Vec<String> {
    let mut themes = Vec::new();

    for holding in data.holdings.iter().take(3) {
        if let Some(category) = &holding.category_name {
            let simplified = category.replace(" ETFs", "").replace("markets", "Markets");
            push_unique(&mut themes, &simplified);
        }
    }

    for region in data.regions.iter().take(2) {
        if let Some(name) = &region.name {
            push_unique(&mut themes, name);
        }
    }

    for topic in profile.topics.all().iter().take(MAX_TOPIC_THEMES) {
        push_unique(&mut themes, topic);
    }

    for filler in FILLER_THEMES {
        if themes.len() >= MAX_THEMES {
            break;
        }
        push_unique(&mut themes, filler);
    }

    themes.truncate(MAX_THEMES);
    themes
}

/// `25000.0` -> `"25,000"`
pub fn group_thousands(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::types::{Holding, Region, UnderlyingStock};
    use crate::quiz::{TimeHorizon, TopicPreferences};

    fn holding(ticker: &str, category: &str, position: f64) -> Holding {
        Holding {
            ticker: Some(ticker.to_string()),
            name: Some(format!("{} fund", ticker)),
            category_name: Some(category.to_string()),
            position: Some(position),
            expense_ratio: None,
        }
    }

    fn sample_data() -> PortfolioData {
        PortfolioData {
            holdings: vec![
                holding("VTI", "U.S. stocks ETFs", 50.0),
                holding("QQQ", "Technology ETFs", 20.0),
                holding("BND", "Bond ETFs", 20.0),
                holding("VWO", "Emerging markets ETFs", 5.0),
                holding("XLK", "Technology ETFs", 5.0),
            ],
            regions: vec![
                Region { name: Some("North America".into()), size: Some(71.234) },
                Region { name: Some("Europe".into()), size: Some(15.0) },
            ],
            underlying_stocks: vec![UnderlyingStock {
                symbol: Some("AAPL".into()),
                weight: Some(4.5),
            }],
            risk_level: None,
            five_yr_annualized: Some(12.34),
            volatility: Some(15.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_report_shapes_rows() {
        let profile = QuizProfile {
            user_name: Some("Jane Doe".into()),
            amount: Some(25_000.0),
            time_horizon: Some(TimeHorizon::TenPlus),
            ..Default::default()
        };
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

        let report = build_report_on(&profile, PortfolioType::Growth, &sample_data(), date);

        assert_eq!(report.report_date, "07 March 2025");
        assert_eq!(report.investor_name, "Jane Doe");
        assert_eq!(report.email, "-");
        assert_eq!(report.investment_amount, "25,000");
        assert_eq!(report.risk_profile, RiskProfile::High);
        assert_eq!(report.holdings.len(), 5);
        assert_eq!(report.holdings[0].allocation, "50%");
        assert_eq!(report.holdings[0].expense_ratio, "N/A");
        assert_eq!(report.geographic[0].weight, "71.2%");
        assert_eq!(report.top_holdings[0].weight, "4.50%");
        assert_eq!(report.metrics.five_year_return, "+12.3%");
        assert_eq!(report.metrics.three_year_return, "N/A");
        assert!(report.performance.is_none());
        assert_eq!(report.methodology_source, CopySource::Static);
        assert!(report.methodology.title.contains("Long-Term"));
    }

    #[test]
    fn test_allocation_groups_categories_in_order() {
        let slices = allocation(&sample_data());
        let names: Vec<&str> = slices.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(
            names,
            vec!["U.S. stocks ETFs", "Technology ETFs", "Bond ETFs", "Emerging markets ETFs"]
        );
        assert_eq!(slices[1].value, 25.0);
        assert_eq!(slices[1].color, "#8b5cf6");
        assert_eq!(category_color("Crypto ETFs"), DEFAULT_CATEGORY_COLOR);
    }

    #[test]
    fn test_holdings_capped_at_eight() {
        let data = PortfolioData {
            holdings: (0..12).map(|i| holding(&format!("T{}", i), "Bond ETFs", 1.0)).collect(),
            ..Default::default()
        };
        assert_eq!(holding_rows(&data).len(), 8);
        assert_eq!(allocation(&data)[0].value, 12.0);
    }

    #[test]
    fn test_risk_profile_resolution() {
        assert_eq!(resolve_risk_profile(Some("Custom"), PortfolioType::Growth), RiskProfile::Custom);
        assert_eq!(resolve_risk_profile(Some("weird"), PortfolioType::Preservation), RiskProfile::Low);
        assert_eq!(resolve_risk_profile(None, PortfolioType::Balanced), RiskProfile::Moderate);
    }

    #[test]
    fn test_performance_series_compounds() {
        let mut portfolio = BTreeMap::new();
        portfolio.insert("2024-01-03".to_string(), 0.10);
        portfolio.insert("2024-01-02".to_string(), 0.0);
        portfolio.insert("2024-02-01".to_string(), -0.10);
        let mut benchmark = BTreeMap::new();
        benchmark.insert("2024-02-01".to_string(), 0.05);

        let series = performance_series(&portfolio, &benchmark).unwrap();

        // 2024-01-02 has no movement on either side
        assert_eq!(series.labels, vec!["Jan 2024", "Feb 2024"]);
        assert_eq!(series.portfolio, vec![11_000.0, 9_900.0]);
        assert_eq!(series.benchmark, vec![10_000.0, 10_500.0]);
        assert!(performance_series(&BTreeMap::new(), &benchmark).is_none());
    }

    #[test]
    fn test_performance_series_keeps_last_trading_year() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let portfolio: BTreeMap<String, f64> = (0..400)
            .map(|i| {
                let day = start + chrono::Duration::days(i);
                (day.format("%Y-%m-%d").to_string(), 0.001)
            })
            .collect();

        let series = performance_series(&portfolio, &BTreeMap::new()).unwrap();
        assert_eq!(series.portfolio.len(), 252);
    }

    #[test]
    fn test_three_year_benchmark_needs_full_window() {
        let short: BTreeMap<String, f64> = (0..100).map(|i| (format!("d{:04}", i), 0.001)).collect();
        assert!(three_year_annualized(&short).is_none());

        let flat: BTreeMap<String, f64> = (0..800).map(|i| (format!("d{:04}", i), 0.0)).collect();
        let value = three_year_annualized(&flat).unwrap();
        assert!(value.abs() < 1e-9);
    }

    #[test]
    fn test_themes_mix_holdings_regions_topics_and_fillers() {
        let profile = QuizProfile {
            topics: TopicPreferences {
                sectors: vec!["Technology".into()],
                commodities: vec!["Gold".into()],
                ..Default::default()
            },
            ..Default::default()
        };

        let themes = themes(&profile, &sample_data());

        assert_eq!(themes.len(), 10);
        assert_eq!(&themes[..3], &["U.S. stocks", "Technology", "Bond"]);
        assert_eq!(&themes[3..5], &["North America", "Europe"]);
        // "Technology" already present from the holdings
        assert_eq!(themes[5], "Gold");
        assert_eq!(themes[6], "Diversification");
    }

    #[test]
    fn test_calculate_scenarios() {
        assert_eq!(
            calculate_scenarios(100.0, 0.0),
            Scenarios { best: 28, average: 9, worst: -22 }
        );
        assert_eq!(
            calculate_scenarios(60.0, 40.0),
            Scenarios { best: 21, average: 7, worst: -14 }
        );
        // 0.5 rounds to even
        assert_eq!(calculate_scenarios(0.0, 12.5).average, 0);
    }

    #[test]
    fn test_scenarios_from_holdings() {
        let data = PortfolioData {
            holdings: vec![
                holding("BND", "Bond ETFs", 40.0),
                holding("VTI", "U.S. stocks ETFs", 50.0),
                holding("IGLN.L", "Commodities ETFs", 10.0),
            ],
            ..Default::default()
        };
        assert_eq!(asset_split(&data), Some((50.0, 40.0)));

        let report = build_report_on(
            &QuizProfile::default(),
            PortfolioType::Balanced,
            &data,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        assert_eq!(
            report.scenarios,
            Some(Scenarios { best: 18, average: 6, worst: -12 })
        );

        assert_eq!(asset_split(&PortfolioData::default()), None);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.6), "1,000");
        assert_eq!(group_thousands(1_234_567.0), "1,234,567");
        assert_eq!(group_thousands(-12_000.0), "-12,000");
    }

    #[test]
    fn test_signed_percent() {
        assert_eq!(signed_percent(Some(-3.21)), "-3.2%");
        assert_eq!(signed_percent(Some(0.0)), "+0.0%");
        assert_eq!(signed_percent(None), "N/A");
    }
}
