//! Report fragments
//!
//! Builds the placeholder values for a [`PortfolioReport`]. Free text is
//! escaped here; the row fragments are trusted markup.

use crate::portfolio::charts::{donut_chart, performance_chart};
use crate::portfolio::types::{PortfolioReport, WeightRow};
use crate::render::template::escape_html;

const CHART_MISSING: &str = r#"<p class="chart-missing">Chart not available</p>"#;

fn holdings_rows(report: &PortfolioReport) -> String {
    report
        .holdings
        .iter()
        .map(|h| {
            format!(
                "<tr>\n    <td><a href=\"#\" class=\"symbol-link\">{}</a></td>\n    <td>{}</td>\n    <td>{}</td>\n    <td>{}</td>\n    <td>{}</td>\n</tr>",
                escape_html(&h.symbol),
                escape_html(&h.name),
                escape_html(&h.category),
                escape_html(&h.expense_ratio),
                escape_html(&h.allocation),
            )
        })
        .collect()
}

fn weight_rows(rows: &[WeightRow]) -> String {
    rows.iter()
        .map(|r| {
            format!(
                "<tr>\n    <td>{}</td>\n    <td>{}</td>\n</tr>",
                escape_html(&r.name),
                escape_html(&r.weight)
            )
        })
        .collect()
}

fn allocation_legend(report: &PortfolioReport) -> String {
    report
        .allocation
        .iter()
        .map(|slice| {
            format!(
                "<div class=\"allocation-legend-item\">\n    <span class=\"legend-dot\" style=\"background-color: {};\"></span>\n    <span>{}</span>\n</div>",
                escape_html(&slice.color),
                escape_html(&slice.category)
            )
        })
        .collect()
}

fn themes_items(report: &PortfolioReport) -> String {
    report
        .themes
        .iter()
        .map(|t| format!("<div class=\"theme-item\">{}</div>", escape_html(t)))
        .collect()
}

fn methodology_bullets(report: &PortfolioReport) -> String {
    report
        .methodology
        .bullets
        .iter()
        .map(|b| format!("<li>{}</li>", escape_html(b)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn scenario_values(report: &PortfolioReport) -> [(&'static str, String); 3] {
    let percent = |value: Option<i32>| {
        value
            .map(|v| format!("{:+}%", v))
            .unwrap_or_else(|| "N/A".to_string())
    };
    let scenarios = report.scenarios;
    [
        ("SCENARIO_BEST", percent(scenarios.map(|s| s.best))),
        ("SCENARIO_AVERAGE", percent(scenarios.map(|s| s.average))),
        ("SCENARIO_WORST", percent(scenarios.map(|s| s.worst))),
    ]
}

fn chart_image(uri: Option<String>, alt: &str) -> String {
    match uri {
        Some(src) => format!(r#"<img src="{}" alt="{}">"#, src, alt),
        None => CHART_MISSING.to_string(),
    }
}

/// Placeholder values for the report template
pub fn report_values(report: &PortfolioReport) -> Vec<(&'static str, String)> {
    let metrics = &report.metrics;
    let performance = report.performance.as_ref().and_then(performance_chart);

    let mut values = vec![
        ("REPORT_DATE", escape_html(&report.report_date)),
        ("INVESTOR_NAME", escape_html(&report.investor_name)),
        ("EMAIL", escape_html(&report.email)),
        ("CUSTOMER_ID", escape_html(&report.customer_id)),
        ("AGE", escape_html(&report.age)),
        ("INVESTMENT_AMOUNT", escape_html(&report.investment_amount)),
        ("TIME_HORIZON", escape_html(&report.time_horizon)),
        ("GOAL", escape_html(&report.goal)),
        ("RISK_BEHAVIOR", escape_html(&report.risk_behavior)),
        ("RISK_PROFILE", escape_html(report.risk_profile.label())),
        ("PORTFOLIO_TYPE", escape_html(&report.portfolio_type)),
        ("HOLDINGS_ROWS", holdings_rows(report)),
        ("PERFORMANCE_CHART", chart_image(performance, "Portfolio performance")),
        (
            "ALLOCATION_CHART",
            chart_image(donut_chart(&report.allocation), "Asset allocation"),
        ),
        ("ALLOCATION_LEGEND", allocation_legend(report)),
        ("FIVE_YEAR_RETURN", metrics.five_year_return.clone()),
        ("FIVE_YEAR_RETURN_BENCHMARK", metrics.five_year_return_benchmark.clone()),
        ("THREE_YEAR_RETURN", metrics.three_year_return.clone()),
        ("THREE_YEAR_BENCHMARK", metrics.three_year_benchmark.clone()),
        ("ONE_YEAR_RETURN", metrics.one_year_return.clone()),
        ("FIVE_YEAR_VOLATILITY", metrics.five_year_volatility.clone()),
        ("FIVE_YEAR_VOL_BENCHMARK", metrics.five_year_vol_benchmark.clone()),
        ("GEOGRAPHIC_ROWS", weight_rows(&report.geographic)),
        ("TOP_HOLDINGS_ROWS", weight_rows(&report.top_holdings)),
        ("THEMES_ITEMS", themes_items(report)),
        ("METHODOLOGY_TITLE", escape_html(&report.methodology.title)),
        (
            "METHODOLOGY_DESCRIPTION",
            escape_html(&report.methodology.description),
        ),
        ("METHODOLOGY_BULLETS", methodology_bullets(report)),
    ];
    values.extend(scenario_values(report));
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::report::build_report_on;
    use crate::portfolio::types::{Holding, PortfolioData};
    use crate::quiz::{PortfolioType, QuizProfile};
    use chrono::NaiveDate;

    fn report() -> PortfolioReport {
        let profile = QuizProfile {
            user_name: Some("Ann <script>".into()),
            ..Default::default()
        };
        let data = PortfolioData {
            holdings: vec![Holding {
                ticker: Some("VT".into()),
                name: Some("Total World & Co".into()),
                category_name: Some("Global markets ETFs".into()),
                position: Some(100.0),
                expense_ratio: Some(0.07),
            }],
            ..Default::default()
        };
        build_report_on(
            &profile,
            PortfolioType::Preservation,
            &data,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    fn value<'a>(values: &'a [(&str, String)], key: &str) -> &'a str {
        values.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str()).unwrap()
    }

    #[test]
    fn test_free_text_is_escaped() {
        let values = report_values(&report());
        assert_eq!(value(&values, "INVESTOR_NAME"), "Ann &lt;script&gt;");
        assert!(value(&values, "HOLDINGS_ROWS").contains("Total World &amp; Co"));
        assert!(value(&values, "HOLDINGS_ROWS").contains("<td>0.07%</td>"));
    }

    #[test]
    fn test_charts_and_legend() {
        let values = report_values(&report());
        assert!(value(&values, "ALLOCATION_CHART").starts_with("<img src=\"data:image/svg+xml;base64,"));
        assert_eq!(value(&values, "PERFORMANCE_CHART"), CHART_MISSING);
        assert!(value(&values, "ALLOCATION_LEGEND").contains("background-color: #14b8a6;"));
    }

    #[test]
    fn test_scenario_values() {
        let values = report_values(&report());
        assert_eq!(value(&values, "SCENARIO_BEST"), "+28%");
        assert_eq!(value(&values, "SCENARIO_AVERAGE"), "+9%");
        assert_eq!(value(&values, "SCENARIO_WORST"), "-22%");

        let mut empty = report();
        empty.scenarios = None;
        assert_eq!(value(&report_values(&empty), "SCENARIO_BEST"), "N/A");
    }

    #[test]
    fn test_methodology_bullets_are_list_items() {
        let values = report_values(&report());
        let bullets = value(&values, "METHODOLOGY_BULLETS");
        assert_eq!(bullets.matches("<li>").count(), 4);
    }
}
