//! Report output
//!
//! Each run writes into a fresh `portfolio_{N}` folder under the output root:
//! `portfolio_report.html` plus the report record as `portfolio_data.json`.

use crate::errors::Result;
use crate::portfolio::types::PortfolioReport;
use crate::render::html::report_values;
use crate::render::template::{leftover_placeholders, Template};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const HTML_FILE: &str = "portfolio_report.html";
pub const JSON_FILE: &str = "portfolio_data.json";
pub const PDF_FILE: &str = "portfolio_report.pdf";

const DIR_PREFIX: &str = "portfolio_";

/// Files written for one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub dir: PathBuf,
    pub html: PathBuf,
    pub json: PathBuf,
}

/// Next free folder number under `root`
///
/// 1 when the root is missing or holds no `portfolio_N` folders, otherwise
/// the highest N plus one. Entries whose suffix is not a number are ignored.
pub fn next_portfolio_number(root: &Path) -> Result<u32> {
    if !root.exists() {
        return Ok(1);
    }

    let mut highest = 0;
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let number = name
            .to_str()
            .and_then(|n| n.strip_prefix(DIR_PREFIX))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(n) = number {
            highest = highest.max(n);
        }
    }

    Ok(highest + 1)
}

/// `root/portfolio_{number}`
pub fn portfolio_dir(root: &Path, number: u32) -> PathBuf {
    root.join(format!("{}{}", DIR_PREFIX, number))
}

/// Render the report and write HTML and JSON into `output_dir`
pub fn render_portfolio(
    report: &PortfolioReport,
    output_dir: &Path,
    template: &Template,
) -> Result<RenderOutput> {
    std::fs::create_dir_all(output_dir)?;

    let rendered = template.render(&report_values(report));
    let html = rendered.replace(
        r#"class="risk-badge""#,
        &format!(r#"class="risk-badge {}""#, report.risk_profile.badge_class()),
    );

    let leftovers = leftover_placeholders(&html);
    if !leftovers.is_empty() {
        warn!(placeholders = ?leftovers, "template placeholders left unfilled");
    }

    let html_path = output_dir.join(HTML_FILE);
    std::fs::write(&html_path, html)?;

    let json_path = output_dir.join(JSON_FILE);
    std::fs::write(&json_path, serde_json::to_string_pretty(report)?)?;

    info!(html = %html_path.display(), json = %json_path.display(), "report written");

    Ok(RenderOutput {
        dir: output_dir.to_path_buf(),
        html: html_path,
        json: json_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::report::build_report_on;
    use crate::portfolio::types::PortfolioData;
    use crate::quiz::{PortfolioType, QuizProfile};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn report(portfolio: PortfolioType) -> PortfolioReport {
        build_report_on(
            &QuizProfile::default(),
            portfolio,
            &PortfolioData::default(),
            NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
        )
    }

    #[test]
    fn test_next_portfolio_number() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("output");
        assert_eq!(next_portfolio_number(&root).unwrap(), 1);

        std::fs::create_dir_all(root.join("portfolio_2")).unwrap();
        std::fs::create_dir_all(root.join("portfolio_10")).unwrap();
        std::fs::create_dir_all(root.join("portfolio_old")).unwrap();
        std::fs::write(root.join("portfolio_99"), "not a dir").unwrap();

        assert_eq!(next_portfolio_number(&root).unwrap(), 11);
        assert_eq!(portfolio_dir(&root, 11), root.join("portfolio_11"));
    }

    #[test]
    fn test_render_writes_html_and_json() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("portfolio_1");

        let output = render_portfolio(
            &report(PortfolioType::Growth),
            &dir,
            &Template::builtin(),
        )
        .unwrap();

        let html = std::fs::read_to_string(&output.html).unwrap();
        assert!(html.contains("<style>"));
        assert!(!html.contains(r#"href="styles.css""#));
        assert!(html.contains(r#"class="risk-badge high""#));
        assert!(html.contains("14 February 2025"));
        assert!(leftover_placeholders(&html).is_empty());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output.json).unwrap()).unwrap();
        assert_eq!(json["portfolio_id"], 3);
        assert_eq!(json["risk_profile"], "High");
    }

    #[test]
    fn test_moderate_badge_is_medium() {
        let temp = TempDir::new().unwrap();
        let output = render_portfolio(
            &report(PortfolioType::Balanced),
            temp.path(),
            &Template::builtin(),
        )
        .unwrap();

        let html = std::fs::read_to_string(output.html).unwrap();
        assert!(html.contains(r#"class="risk-badge medium""#));
    }
}
