//! Gemini REST client
//!
//! Endpoints (v1beta):
//! - `POST models/{model}:generateContent`
//! - `POST models/{model}:streamGenerateContent?alt=sse`
//! - `POST models/{model}:embedContent`
//!
//! The API key travels in the `x-goog-api-key` header.

use crate::chat::{ChatMessage, Role};
use crate::cli::config::GeminiConfig;
use crate::errors::{FolioError, Result};
use crate::gemini::types::{
    Content, EmbedRequest, EmbedResponse, ErrorEnvelope, GenerateRequest, GenerateResponse,
    GenerationConfig, Part,
};
use crate::model::TextModel;
use crate::retry::RetryManager;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default generation model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    temperature: Option<f32>,
    retry: RetryManager,
}

impl GeminiClient {
    /// Create client with default endpoint and models
    pub fn new(api_key: &str) -> Result<Self> {
        Self::build(api_key, DEFAULT_BASE_URL, DEFAULT_MODEL, REQUEST_TIMEOUT)
    }

    /// Create client from configuration
    pub fn from_config(config: &GeminiConfig, api_key: &str) -> Result<Self> {
        let mut client = Self::build(
            api_key,
            &config.base_url,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )?;
        client.embedding_model = config.embedding_model.clone();
        client.temperature = config.temperature;
        client.retry = RetryManager::with_config(config.max_attempts, 500);
        Ok(client)
    }

    fn build(api_key: &str, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(FolioError::MissingSecret("GEMINI_API_KEY"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FolioError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: None,
            retry: RetryManager::new(),
        })
    }

    /// Point the client at another endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryManager) -> Self {
        self.retry = retry;
        self
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    /// Generate a reply for a conversation
    pub async fn generate_content(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = self.build_request(messages)?;
        let url = self.endpoint(&self.model, "generateContent");
        let start = Instant::now();

        debug!(model = %self.model, messages = messages.len(), "sending generateContent");

        let response: GenerateResponse = self
            .retry
            .execute_with_retry(|| async {
                let response = self
                    .client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
                    .send()
                    .await?;
                let response = check_status(response).await?;
                Ok(response.json::<GenerateResponse>().await?)
            })
            .await?;

        let text = extract_text(&response)?;
        info!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "generation complete"
        );
        Ok(text)
    }

    /// Stream a reply, calling `on_chunk` for every text fragment.
    ///
    /// Returns the full concatenated text. Streams are not retried once
    /// the first byte arrived.
    pub async fn stream_content<F>(&self, messages: &[ChatMessage], mut on_chunk: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let request = self.build_request(messages)?;
        let url = format!("{}?alt=sse", self.endpoint(&self.model, "streamGenerateContent"));

        let response = self
            .retry
            .execute_with_retry(|| async {
                let response = self
                    .client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
                    .send()
                    .await?;
                check_status(response).await
            })
            .await?;

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut full = String::new();

        while let Some(chunk) = stream.next().await {
            for line in lines.add_bytes(&chunk?) {
                if let Some(text) = parse_sse_line(&line)? {
                    on_chunk(&text);
                    full.push_str(&text);
                }
            }
        }

        if let Some(text) = parse_sse_line(&lines.finish())? {
            on_chunk(&text);
            full.push_str(&text);
        }

        if full.is_empty() {
            return Err(FolioError::EmptyResponse("stream produced no text".to_string()));
        }

        Ok(full)
    }

    /// Embed a text with the embedding model
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint(&self.embedding_model, "embedContent");
        let request = EmbedRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                role: None,
                parts: vec![Part {
                    text: Some(text.to_string()),
                }],
            },
        };

        let response: EmbedResponse = self
            .retry
            .execute_with_retry(|| async {
                let response = self
                    .client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
                    .send()
                    .await?;
                let response = check_status(response).await?;
                Ok(response.json::<EmbedResponse>().await?)
            })
            .await?;

        if response.embedding.values.is_empty() {
            return Err(FolioError::EmptyResponse("embedding has no values".to_string()));
        }

        Ok(response.embedding.values)
    }

    /// Map chat messages onto the Gemini request shape.
    ///
    /// System messages are merged into `systemInstruction`; a conversation
    /// made only of system text is sent as a user turn.
    fn build_request(&self, messages: &[ChatMessage]) -> Result<GenerateRequest> {
        if messages.is_empty() {
            return Err(FolioError::InvalidInput("no messages to send".to_string()));
        }

        let system_text = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut contents: Vec<Content> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(if m.role == Role::Ai { "model" } else { "user" }.to_string()),
                parts: vec![Part {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        let system_instruction = if contents.is_empty() {
            contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(system_text),
                }],
            });
            None
        } else if system_text.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: vec![Part {
                    text: Some(system_text),
                }],
            })
        };

        Ok(GenerateRequest {
            contents,
            system_instruction,
            generation_config: self.temperature.map(|temperature| GenerationConfig {
                temperature: Some(temperature),
            }),
        })
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.generate_content(messages).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        self.stream_content(messages, |chunk| on_chunk(chunk)).await
    }
}

/// Turn a non-success response into `GeminiApiError`
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(500).collect());

    Err(FolioError::GeminiApiError {
        status: status.as_u16(),
        message,
    })
}

fn extract_text(response: &GenerateResponse) -> Result<String> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(FolioError::EmptyResponse(format!("prompt blocked: {}", reason)));
    }

    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            Err(FolioError::EmptyResponse(reason))
        }
    }
}

/// Parse one SSE line; `Ok(None)` for keep-alives and non-data lines
/// Splits a byte stream into lines
///
/// Bytes stay raw until a newline arrives, so a character split across
/// network chunks is decoded whole.
#[derive(Debug, Default)]
struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    /// Append bytes and return every line they complete
    fn add_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Whatever is left after the stream ends
    fn finish(self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

fn parse_sse_line(line: &str) -> Result<Option<String>> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let chunk: GenerateResponse = serde_json::from_str(data)?;
    Ok(chunk.text().filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const REPLY: &str = r#"{
        "candidates": [{
            "content": {"parts": [{"text": "LangChain is "}, {"text": "a framework."}], "role": "model"},
            "finishReason": "STOP"
        }]
    }"#;

    fn client_for(server: &Server) -> GeminiClient {
        GeminiClient::new("test-key")
            .unwrap()
            .with_base_url(&server.url())
            .with_retry(RetryManager::with_config(2, 1))
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            GeminiClient::new("  "),
            Err(FolioError::MissingSecret("GEMINI_API_KEY"))
        ));
    }

    #[test]
    fn test_build_request_moves_system_to_instruction() {
        let client = GeminiClient::new("k").unwrap();
        let request = client
            .build_request(&[
                ChatMessage::system("You solve math problems."),
                ChatMessage::human("What is 81 divided by 9?"),
                ChatMessage::ai("9"),
            ])
            .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "You solve math problems."
        );
        assert_eq!(json["contents"].as_array().unwrap().len(), 2);
        assert_eq!(json["contents"][1]["role"], "model");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_build_request_system_only() {
        let client = GeminiClient::new("k").unwrap();
        let request = client.build_request(&[ChatMessage::system("hello")]).unwrap();
        assert!(request.system_instruction.is_none());
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
    }

    #[test]
    fn test_build_request_rejects_empty() {
        let client = GeminiClient::new("k").unwrap();
        assert!(client.build_request(&[]).is_err());
    }

    #[test]
    fn test_parse_sse_line() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#;
        assert_eq!(parse_sse_line(line).unwrap().as_deref(), Some("Hel"));
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), None);
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), None);
        assert!(parse_sse_line("data: {broken").is_err());
    }

    #[test]
    fn test_line_buffer_keeps_split_characters() {
        let line = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"caf\u{e9}\"}]}}]}\n";
        let bytes = line.as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut lines = LineBuffer::default();
        assert!(lines.add_bytes(&bytes[..split]).is_empty());
        let complete = lines.add_bytes(&bytes[split..]);

        assert_eq!(complete.len(), 1);
        assert_eq!(parse_sse_line(&complete[0]).unwrap().as_deref(), Some("caf\u{e9}"));
        assert_eq!(lines.finish(), "");
    }

    #[test]
    fn test_line_buffer_returns_trailing_partial_line() {
        let mut lines = LineBuffer::default();
        let complete = lines.add_bytes(b"data: one\r\ndata: tw");
        assert_eq!(complete, vec!["data: one\r\n".to_string()]);
        assert_eq!(lines.finish(), "data: tw");
    }

    #[tokio::test]
    async fn test_generate_content_mock() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "What is LangChain?"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REPLY)
            .create_async()
            .await;

        let client = client_for(&server);
        let text = client.invoke("What is LangChain?").await.unwrap();

        assert_eq!(text, "LangChain is a framework.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_content_error_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .with_status(400)
            .with_body(r#"{"error": {"code": 400, "message": "API key not valid"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).invoke("hi").await.unwrap_err();
        match err {
            FolioError::GeminiApiError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_content_retries_server_errors() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let err = client_for(&server).invoke("hi").await.unwrap_err();
        assert!(matches!(err, FolioError::GeminiApiError { status: 503, .. }));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).invoke("hi").await.unwrap_err();
        assert!(matches!(err, FolioError::EmptyResponse(reason) if reason.contains("SAFETY")));
    }

    #[tokio::test]
    async fn test_stream_content_mock() {
        let mut server = Server::new_async().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\", world\"}]}}]}\n\n",
        );
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:streamGenerateContent")
            .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let mut chunks = Vec::new();
        let text = client_for(&server)
            .stream_content(&[ChatMessage::human("hi")], |c| chunks.push(c.to_string()))
            .await
            .unwrap();

        assert_eq!(text, "Hello, world");
        assert_eq!(chunks, vec!["Hello".to_string(), ", world".to_string()]);
    }

    #[tokio::test]
    async fn test_embed_mock() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/text-embedding-004:embedContent")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "models/text-embedding-004"
            })))
            .with_status(200)
            .with_body(r#"{"embedding": {"values": [0.1, 0.2, 0.3]}}"#)
            .create_async()
            .await;

        let values = client_for(&server).embed("some text").await.unwrap();
        assert_eq!(values, vec![0.1, 0.2, 0.3]);
    }
}
