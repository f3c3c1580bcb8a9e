//! Web search via the Serper API

use crate::tools::types::{Tool, ToolResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default Serper endpoint
pub const SERPER_URL: &str = "https://google.serper.dev/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
    #[serde(rename = "answerBox")]
    answer_box: Option<AnswerBox>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

#[derive(Debug, Deserialize)]
struct AnswerBox {
    snippet: Option<String>,
}

/// Web search tool
#[derive(Debug, Clone)]
pub struct WebSearch {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl WebSearch {
    pub fn new(url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.to_string(),
            api_key,
        }
    }

    /// Search and summarise the best hit as one line
    pub async fn search(&self, query: &str) -> Result<String, String> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(
                    "SERPER_API_KEY not found. Please set it in your .env file.".to_string()
                )
            }
        };

        debug!(query, "searching the web");

        let response = self
            .client
            .post(&self.url)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("Error searching the web: {}", e))?;

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| format!("Error searching the web: {}", e))?;

        Ok(summarize(data))
    }
}

fn summarize(data: SearchResponse) -> String {
    if let Some(top) = data.organic.into_iter().next() {
        return format!("{}: {} ({})", top.title, top.snippet, top.link);
    }
    if let Some(answer_box) = data.answer_box {
        return answer_box
            .snippet
            .unwrap_or_else(|| "No snippet found.".to_string());
    }
    "No information found online.".to_string()
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "search_web"
    }

    fn signature(&self) -> String {
        "search_web(query: string)".to_string()
    }

    fn description(&self) -> &str {
        "Searches the web and returns a relevant summary."
    }

    fn example(&self) -> &str {
        "search_web(\"Who invented the telephone\")"
    }

    async fn run(&self, input: &str) -> ToolResult {
        let start = Instant::now();
        match self.search(input.trim()).await {
            Ok(text) => ToolResult::success(self.name(), text, start.elapsed()),
            Err(error) => ToolResult::failure(self.name(), error, start.elapsed()),
        }
    }
}
