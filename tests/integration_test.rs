//! End-to-end tests for quizfolio
//!
//! All network dependencies are served by mockito; nothing here needs a
//! real API key or a running qdrant.

use async_trait::async_trait;
use mockito::{Matcher, Server};
use quizfolio::{
    agent::Agent,
    chat::{ChatHistory, ChatMessage, ChatSession, HistoryStore},
    cli::{config::ToolsConfig, Config, Secrets},
    display::DisplayManager,
    model::TextModel,
    pipeline::run_portfolio,
    portfolio::CopySource,
    quiz::{get_portfolio_id, parse_user_input, PortfolioType},
    telemetry::{Stage, TelemetryCollector},
    tools::ToolRegistry,
    Result,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tempfile::TempDir;

const QUIZ: &str = "Name: Ana Silva Email: ana@example.com Age: 34. \
I want to grow aggressively over 10+ years and I'd buy more if markets drop. \
I can invest $25,000. I'm interested in technology and clean energy.";

const ANALYZE_BODY: &str = r#"{
  "success": true,
  "data": {
    "holdings": [
      {"ticker": "QQQ", "name": "Invesco QQQ", "category_name": "Technology ETFs", "position": 60},
      {"ticker": "ICLN", "name": "iShares Global Clean Energy", "category_name": "Thematic ETFs", "position": 40}
    ]
  }
}"#;

/// Replays canned replies and records how many messages each call saw
struct Scripted {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<usize>>,
}

impl Scripted {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextModel for Scripted {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.len());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "ANSWER: out of script".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn report_config(server: &Server, output: &TempDir) -> Config {
    let mut config = Config::default();
    config.gemini.base_url = server.url();
    config.gemini.max_attempts = 1;
    config.paasa.max_attempts = 1;
    config.market.base_url = server.url();
    config.market.max_attempts = 1;
    config.report.output_dir = output.path().display().to_string();
    config.report.pdf_converter = None;
    config
}

fn secrets(server: &Server, with_gemini: bool) -> Secrets {
    let base = server.url();
    Secrets::from_lookup(|key| match key {
        "PAASA_BEARER_TOKEN" => Some("paasa-token".to_string()),
        "PAASA_API_BASE" => Some(base.clone()),
        "GEMINI_API_KEY" if with_gemini => Some("gemini-key".to_string()),
        _ => None,
    })
}

#[tokio::test]
async fn test_report_end_to_end() {
    let output = TempDir::new().unwrap();
    let mut server = Server::new_async().await;

    let analyze = server
        .mock("GET", "/analyze")
        .match_query(Matcher::UrlEncoded("portfolioId".into(), "3".into()))
        .match_header("authorization", "Bearer paasa-token")
        .with_status(200)
        .with_body(ANALYZE_BODY)
        .create_async()
        .await;

    let methodology = serde_json::json!({
        "title": "Aggressive Growth",
        "description": "Built for a long runway.",
        "bullets": ["Tilted to technology", "Clean energy satellite"]
    })
    .to_string();
    let gemini = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", "gemini-key")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": methodology}]}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let expense = server
        .mock("GET", "/v10/finance/quoteSummary/QQQ")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            serde_json::json!({"quoteSummary": {"result": [{"defaultKeyStatistics": {
                "annualReportExpenseRatio": {"raw": 0.002}
            }}]}})
            .to_string(),
        )
        .create_async()
        .await;

    let config = report_config(&server, &output);
    let telemetry = TelemetryCollector::new();
    let outcome = run_portfolio(
        QUIZ,
        &config,
        &secrets(&server, true),
        telemetry.clone(),
        &mut DisplayManager::new(false),
    )
    .await
    .unwrap();

    analyze.assert_async().await;
    gemini.assert_async().await;
    expense.assert_async().await;

    assert_eq!(outcome.portfolio, PortfolioType::Growth);
    assert_eq!(outcome.number, 1);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.report.methodology_source, CopySource::Generated);
    assert!(outcome.pdf.is_none());

    let html = std::fs::read_to_string(&outcome.output.html).unwrap();
    assert!(html.contains("Ana Silva"));
    assert!(html.contains("Aggressive Growth"));
    assert!(html.contains("Invesco QQQ"));
    assert!(html.contains("<td>0.20%</td>"));
    assert!(html.contains("+28%"));
    assert!(!html.contains("{{"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.output.json).unwrap()).unwrap();
    assert_eq!(json["scenarios"]["worst"], -22);
    assert_eq!(json["holdings"][1]["expense_ratio"], "N/A");

    let stages: Vec<Stage> = telemetry.stage_timings().into_iter().map(|(s, _, _)| s).collect();
    assert!(stages.contains(&Stage::Fetch));
    assert!(stages.contains(&Stage::Market));
    assert!(stages.contains(&Stage::Render));
}

#[tokio::test]
async fn test_report_without_gemini_uses_static_copy() {
    let output = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/analyze")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ANALYZE_BODY)
        .create_async()
        .await;

    let config = report_config(&server, &output);
    let first = run_portfolio(
        QUIZ,
        &config,
        &secrets(&server, false),
        TelemetryCollector::new(),
        &mut DisplayManager::new(false),
    )
    .await
    .unwrap();
    let second = run_portfolio(
        QUIZ,
        &config,
        &secrets(&server, false),
        TelemetryCollector::new(),
        &mut DisplayManager::new(false),
    )
    .await
    .unwrap();

    assert_eq!(first.report.methodology_source, CopySource::Static);
    assert_eq!(first.warnings.len(), 1);
    assert_eq!((first.number, second.number), (1, 2));
    assert!(output.path().join("portfolio_2").join("portfolio_report.html").exists());
}

#[tokio::test]
async fn test_agent_uses_weather_tool() {
    let mut server = Server::new_async().await;
    let weather = server
        .mock("GET", "/Lisbon")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("Sunny +24°C\n")
        .create_async()
        .await;

    let tools_config = ToolsConfig {
        weather_url: server.url(),
        ..ToolsConfig::default()
    };
    let model = Scripted::new(&[
        "I should check the weather first.",
        "TOOL: get_weather\nINPUT: Lisbon\nREASON: current conditions",
        "ANSWER: It is sunny and 24°C in Lisbon.",
    ]);
    let agent = Agent::new(model, ToolRegistry::with_defaults(&tools_config, None));

    let outcome = agent.run("What's the weather in Lisbon?").await.unwrap();

    weather.assert_async().await;
    assert!(outcome.completed);
    assert_eq!(outcome.answer, "It is sunny and 24°C in Lisbon.");
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.tool_calls, 1);
}

#[tokio::test]
async fn test_agent_reports_unknown_tool_and_limit() {
    let model = Scripted::new(&[
        "TOOL: stock_price\nINPUT: AAPL\nREASON: need a quote",
        "TOOL: stock_price\nINPUT: AAPL\nREASON: try again",
    ]);
    let agent = Agent::new(model, ToolRegistry::new()).with_max_iterations(2);

    let outcome = agent.run("Price of AAPL?").await.unwrap();

    assert!(!outcome.completed);
    assert_eq!(
        outcome.answer,
        "I couldn't complete the task within the iteration limit."
    );
    assert_eq!(outcome.tool_calls, 2);
}

#[tokio::test]
async fn test_chat_history_survives_sessions() {
    let dir = TempDir::new().unwrap();

    let first = Scripted::new(&["Hello Ana!"]);
    let store = HistoryStore::new(dir.path(), "chat_history", "ana").unwrap();
    let mut session = ChatSession::new(first, ChatHistory::new().with_system("Be brief."))
        .with_store(store)
        .unwrap();
    assert_eq!(session.send("Hi, I'm Ana").await.unwrap(), "Hello Ana!");

    let second = Scripted::new(&["You are Ana."]);
    let store = HistoryStore::new(dir.path(), "chat_history", "ana").unwrap();
    let mut session = ChatSession::new(second, ChatHistory::new().with_system("Be brief."))
        .with_store(store)
        .unwrap();
    assert_eq!(session.send("Who am I?").await.unwrap(), "You are Ana.");

    let stored = HistoryStore::new(dir.path(), "chat_history", "ana")
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[2].content, "Who am I?");
}

#[test]
fn test_quiz_to_tier() {
    let cases: HashMap<&str, PortfolioType> = HashMap::from([
        (QUIZ, PortfolioType::Growth),
        (
            "I want to preserve my capital, I need the money in 1-3 years and I would sell everything if it dropped.",
            PortfolioType::Preservation,
        ),
    ]);

    for (quiz, expected) in cases {
        assert_eq!(get_portfolio_id(&parse_user_input(quiz)), expected, "{}", quiz);
    }
}

#[quickcheck_macros::quickcheck]
fn prop_any_text_maps_to_a_tier(text: String) -> bool {
    let tier = get_portfolio_id(&parse_user_input(&text));
    PortfolioType::from_id(tier.id()) == Some(tier)
}
