//! Quiz-to-portfolio run
//!
//! parse -> classify -> fetch -> market data -> shape -> enhance -> render -> PDF.
//! Fetch, benchmark, enhance and PDF failures degrade the report instead of
//! aborting the run; each degradation is logged, shown and recorded in
//! telemetry.

use crate::cli::config::{Config, Secrets};
use crate::display::DisplayManager;
use crate::errors::{FolioError, Result};
use crate::gemini::GeminiClient;
use crate::model::TextModel;
use crate::portfolio::market::benchmark_window;
use crate::portfolio::report::MAX_HOLDINGS;
use crate::portfolio::{
    apply_methodology, build_report, enhance_with_gemini, MarketData, PortfolioApi, PortfolioData,
    PortfolioReport,
};
use crate::quiz::{get_portfolio_id, parse_user_input, PortfolioType, QuizProfile};
use crate::render::{
    convert_to_pdf, next_portfolio_number, portfolio_dir, render_portfolio, RenderOutput, Template,
    PDF_FILE,
};
use crate::telemetry::{Stage, TelemetryCollector};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings of a report run
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_root: PathBuf,
    pub enhance: bool,
    pub pdf_converter: Option<String>,
    pub pdf_timeout_secs: u64,
}

impl ReportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_root: config.output_dir(),
            enhance: config.report.enhance,
            pdf_converter: config.report.pdf_converter.clone(),
            pdf_timeout_secs: config.report.pdf_timeout_secs,
        }
    }
}

/// Result of a report run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub number: u32,
    pub profile: QuizProfile,
    pub portfolio: PortfolioType,
    pub report: PortfolioReport,
    pub output: RenderOutput,
    pub pdf: Option<PathBuf>,
    /// Human-readable notes about degraded stages
    pub warnings: Vec<String>,
}

/// Wired-up report pipeline
pub struct PortfolioPipeline {
    api: PortfolioApi,
    market: Option<MarketData>,
    model: Option<Arc<dyn TextModel>>,
    template: Template,
    options: ReportOptions,
    telemetry: TelemetryCollector,
}

impl PortfolioPipeline {
    pub fn new(api: PortfolioApi, template: Template, options: ReportOptions) -> Self {
        Self {
            api,
            market: None,
            model: None,
            template,
            options,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Model used for the methodology copy
    pub fn with_model(mut self, model: Arc<dyn TextModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Fill a missing benchmark and expense ratios from market data
    pub fn with_market(mut self, market: MarketData) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    fn degrade(&self, display: &mut DisplayManager, warnings: &mut Vec<String>, stage: Stage, note: String) {
        warn!(stage = %stage, "{}", note);
        self.telemetry.degraded(stage, note.clone());
        display.finish_with_warning(&note);
        warnings.push(note);
    }

    /// Run the whole pipeline for pasted quiz text
    pub async fn run(&self, input: &str, display: &mut DisplayManager) -> Result<PipelineOutcome> {
        if input.trim().is_empty() {
            return Err(FolioError::InvalidInput("no quiz input received".to_string()));
        }

        let mut warnings = Vec::new();
        let number = next_portfolio_number(&self.options.output_root)?;
        display.show_banner(&format!("GENERATING PORTFOLIO #{}", number));

        let started = self.telemetry.start(Stage::Parse);
        let profile = parse_user_input(input);
        self.telemetry.finish(Stage::Parse, started, true);

        let started = self.telemetry.start(Stage::Classify);
        let portfolio = get_portfolio_id(&profile);
        self.telemetry.finish(Stage::Classify, started, true);
        info!(portfolio = %portfolio, "portfolio selected");
        display.show_profile(&profile, portfolio);

        display.start_stage("Fetching portfolio data...");
        let started = self.telemetry.start(Stage::Fetch);
        let data = match self.api.fetch_from_api(portfolio).await {
            Ok(mut data) => {
                let elapsed = self.telemetry.finish(Stage::Fetch, started, true);
                display.finish_with_success("Portfolio data", elapsed);
                self.fill_market_data(&mut data, display, &mut warnings).await;
                data
            }
            Err(e) => {
                self.telemetry.finish(Stage::Fetch, started, false);
                self.degrade(
                    display,
                    &mut warnings,
                    Stage::Fetch,
                    format!("portfolio data unavailable, continuing without it: {}", e),
                );
                PortfolioData::default()
            }
        };

        let started = self.telemetry.start(Stage::Shape);
        let mut report = build_report(&profile, portfolio, &data);
        self.telemetry.finish(Stage::Shape, started, true);

        if self.options.enhance {
            self.enhance(&profile, &mut report, display, &mut warnings).await;
        }

        display.start_stage("Rendering report...");
        let started = self.telemetry.start(Stage::Render);
        let dir = portfolio_dir(&self.options.output_root, number);
        let output = match render_portfolio(&report, &dir, &self.template) {
            Ok(output) => output,
            Err(e) => {
                self.telemetry.finish(Stage::Render, started, false);
                display.finish_current();
                return Err(e);
            }
        };
        let elapsed = self.telemetry.finish(Stage::Render, started, true);
        display.finish_with_success("Report rendered", elapsed);

        let pdf = self.convert(&output, display, &mut warnings).await;

        display.show_report_summary(&report);

        Ok(PipelineOutcome {
            number,
            profile,
            portfolio,
            report,
            output,
            pdf,
            warnings,
        })
    }

    async fn fill_market_data(
        &self,
        data: &mut PortfolioData,
        display: &mut DisplayManager,
        warnings: &mut Vec<String>,
    ) {
        let Some(market) = &self.market else {
            return;
        };

        let window = if data.benchmark_returns.is_empty() {
            benchmark_window(&data.portfolio_returns)
        } else {
            None
        };
        let shown = data.holdings.len().min(MAX_HOLDINGS);
        let missing_ratios = data.holdings[..shown].iter().any(|h| h.expense_ratio.is_none());
        if window.is_none() && !missing_ratios {
            return;
        }

        display.start_stage("Fetching market data...");
        let started = self.telemetry.start(Stage::Market);

        let filled = market.fill_expense_ratios(&mut data.holdings[..shown]).await;
        debug!(filled, "expense ratios looked up");

        if let Some((start, end)) = window {
            match market.fetch_sp500_data(start, end).await {
                Ok(returns) => data.benchmark_returns = returns,
                Err(e) => {
                    self.telemetry.finish(Stage::Market, started, false);
                    self.degrade(
                        display,
                        warnings,
                        Stage::Market,
                        format!("S&P 500 benchmark unavailable: {}", e),
                    );
                    return;
                }
            }
        }

        let elapsed = self.telemetry.finish(Stage::Market, started, true);
        display.finish_with_success("Market data", elapsed);
    }

    async fn enhance(
        &self,
        profile: &QuizProfile,
        report: &mut PortfolioReport,
        display: &mut DisplayManager,
        warnings: &mut Vec<String>,
    ) {
        let Some(model) = &self.model else {
            self.telemetry.degraded(Stage::Enhance, "no model configured");
            let note = "GEMINI_API_KEY not set, using standard methodology copy".to_string();
            warn!("{}", note);
            display.show_warning(&note);
            warnings.push(note);
            return;
        };

        display.start_stage("Writing methodology...");
        let started = self.telemetry.start(Stage::Enhance);
        match enhance_with_gemini(model.as_ref(), profile, report).await {
            Ok(methodology) => {
                apply_methodology(report, methodology);
                let elapsed = self.telemetry.finish(Stage::Enhance, started, true);
                display.finish_with_success("Methodology", elapsed);
            }
            Err(e) => {
                self.telemetry.finish(Stage::Enhance, started, false);
                self.degrade(
                    display,
                    warnings,
                    Stage::Enhance,
                    format!("methodology enhancement failed, using standard copy: {}", e),
                );
            }
        }
    }

    async fn convert(
        &self,
        output: &RenderOutput,
        display: &mut DisplayManager,
        warnings: &mut Vec<String>,
    ) -> Option<PathBuf> {
        let converter = self.options.pdf_converter.as_deref()?;

        display.start_stage("Converting to PDF...");
        let started = self.telemetry.start(Stage::Pdf);
        let target = output.dir.join(PDF_FILE);
        match convert_to_pdf(converter, &output.html, &target, self.options.pdf_timeout_secs).await {
            Ok(pdf) => {
                let elapsed = self.telemetry.finish(Stage::Pdf, started, true);
                display.finish_with_success("PDF", elapsed);
                Some(pdf)
            }
            Err(e) => {
                self.telemetry.finish(Stage::Pdf, started, false);
                self.degrade(
                    display,
                    warnings,
                    Stage::Pdf,
                    format!("{}; the HTML report is still available", e),
                );
                None
            }
        }
    }
}

/// Build the pipeline from configuration and secrets, then run it
pub async fn run_portfolio(
    input: &str,
    config: &Config,
    secrets: &Secrets,
    telemetry: TelemetryCollector,
    display: &mut DisplayManager,
) -> Result<PipelineOutcome> {
    let token = secrets
        .paasa_bearer_token
        .as_deref()
        .ok_or(FolioError::MissingSecret("PAASA_BEARER_TOKEN"))?;
    let base_url = config
        .paasa_base_url(secrets)
        .ok_or(FolioError::MissingSecret("PAASA_API_BASE"))?;

    let api = PortfolioApi::from_config(&config.paasa, &base_url, token)?;
    let template_dir = config.report.template_dir.as_deref().map(Config::expand_path);
    let template = Template::load(template_dir.as_deref())?;

    let mut pipeline = PortfolioPipeline::new(api, template, ReportOptions::from_config(config))
        .with_telemetry(telemetry);
    if config.market.enabled {
        pipeline = pipeline.with_market(MarketData::from_config(&config.market)?);
    }
    if let Some(key) = &secrets.gemini_api_key {
        let client = GeminiClient::from_config(&config.gemini, key)?;
        pipeline = pipeline.with_model(Arc::new(client));
    }

    pipeline.run(input, display).await
}
