//! Portfolio-data API client
//!
//! Endpoint: `GET {base}/analyze?portfolioId={id}&fromTemplates=true`
//! with bearer authentication.

use crate::cli::config::PaasaConfig;
use crate::errors::{FolioError, Result};
use crate::portfolio::types::PortfolioData;
use crate::quiz::PortfolioType;
use crate::retry::RetryManager;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Portfolio-data API client
#[derive(Debug, Clone)]
pub struct PortfolioApi {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryManager,
}

impl PortfolioApi {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Self::build(base_url, token, REQUEST_TIMEOUT, RetryManager::new())
    }

    pub fn from_config(config: &PaasaConfig, base_url: &str, token: &str) -> Result<Self> {
        Self::build(
            base_url,
            token,
            Duration::from_secs(config.timeout_secs),
            RetryManager::with_config(config.max_attempts, 500),
        )
    }

    fn build(base_url: &str, token: &str, timeout: Duration, retry: RetryManager) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(FolioError::MissingSecret("PAASA_API_BASE"));
        }
        if token.trim().is_empty() {
            return Err(FolioError::MissingSecret("PAASA_BEARER_TOKEN"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FolioError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            retry,
        })
    }

    pub fn with_retry(mut self, retry: RetryManager) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the template portfolio for a tier
    pub async fn fetch_from_api(&self, portfolio: PortfolioType) -> Result<PortfolioData> {
        let url = format!("{}/analyze", self.base_url);
        let id = portfolio.id().to_string();

        debug!(%url, portfolio_id = %id, "fetching portfolio data");

        let body: Value = self
            .retry
            .execute_with_retry(|| async {
                let response = self
                    .client
                    .get(&url)
                    .query(&[("portfolioId", id.as_str()), ("fromTemplates", "true")])
                    .bearer_auth(&self.token)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(FolioError::PortfolioApiError {
                        status: status.as_u16(),
                        message: message.chars().take(500).collect(),
                    });
                }

                Ok(response.json::<Value>().await?)
            })
            .await?;

        let data: PortfolioData = serde_json::from_value(unwrap_envelope(body))?;
        info!(
            portfolio_id = %id,
            holdings = data.holdings.len(),
            return_days = data.portfolio_returns.len(),
            "portfolio data received"
        );
        Ok(data)
    }
}

/// `{ "success": true, "data": {...} }` -> the `data` object; anything else as-is
fn unwrap_envelope(body: Value) -> Value {
    let is_envelope = body.get("success").and_then(Value::as_bool) == Some(true)
        && body.get("data").is_some();

    if is_envelope {
        if let Value::Object(mut map) = body {
            return map.remove("data").unwrap_or(Value::Null);
        }
        Value::Null
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn api(server: &Server) -> PortfolioApi {
        PortfolioApi::new(&server.url(), "secret-token")
            .unwrap()
            .with_retry(RetryManager::with_config(2, 1))
    }

    #[test]
    fn test_unwrap_envelope() {
        let inner = json!({"holdings": []});
        assert_eq!(
            unwrap_envelope(json!({"success": true, "data": inner.clone()})),
            inner
        );
        let bare = json!({"success": false, "holdings": []});
        assert_eq!(unwrap_envelope(bare.clone()), bare);
    }

    #[test]
    fn test_requires_token_and_base() {
        assert!(matches!(
            PortfolioApi::new("https://api.example.com", " "),
            Err(FolioError::MissingSecret("PAASA_BEARER_TOKEN"))
        ));
        assert!(matches!(
            PortfolioApi::new("", "t"),
            Err(FolioError::MissingSecret("PAASA_API_BASE"))
        ));
    }

    #[tokio::test]
    async fn test_fetch_envelope() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/analyze")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("portfolioId".into(), "3".into()),
                Matcher::UrlEncoded("fromTemplates".into(), "true".into()),
            ]))
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true, "data": {"holdings": [{"ticker": "QQQ", "position": 30}], "risk_level": "high"}}"#,
            )
            .create_async()
            .await;

        let data = api(&server).fetch_from_api(PortfolioType::Growth).await.unwrap();

        assert_eq!(data.holdings[0].ticker.as_deref(), Some("QQQ"));
        assert_eq!(data.risk_level.as_deref(), Some("high"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/analyze")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("invalid token")
            .expect(1)
            .create_async()
            .await;

        let err = api(&server)
            .fetch_from_api(PortfolioType::Balanced)
            .await
            .unwrap_err();

        assert!(matches!(err, FolioError::PortfolioApiError { status: 401, .. }));
        // 401 is not transient, no retry
        mock.assert_async().await;
    }
}
