//! Portfolio data, report shaping and enhancement

pub mod api;
pub mod charts;
pub mod enhance;
pub mod market;
pub mod methodology;
pub mod report;
pub mod types;

pub use api::PortfolioApi;
pub use charts::{donut_chart, performance_chart};
pub use enhance::{apply_methodology, enhance_with_gemini, extract_json_object};
pub use market::MarketData;
pub use methodology::{methodology_content, time_category, TimeCategory};
pub use report::{build_report, build_report_on, calculate_scenarios};
pub use types::{
    CopySource, Methodology, PortfolioData, PortfolioReport, RiskProfile, Scenarios,
};
