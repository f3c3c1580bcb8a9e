//! Current weather via wttr.in

use crate::tools::types::{Tool, ToolResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Default weather endpoint
pub const WTTR_URL: &str = "https://wttr.in";

/// Weather tool
#[derive(Debug, Clone)]
pub struct Weather {
    client: Client,
    base_url: String,
}

impl Weather {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// One-line condition and temperature, e.g. `Sunny +21°C`
    pub async fn current(&self, city: &str) -> Result<String, String> {
        let city = city.trim().trim_matches('"');
        if city.is_empty() {
            return Err("Error getting weather: city is empty".to_string());
        }

        let url = format!("{}/{}", self.base_url, city);
        let response = self
            .client
            .get(&url)
            .query(&[("format", "%C %t")])
            .send()
            .await
            .map_err(|e| format!("Error getting weather: {}", e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(format!("Weather API error: {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("Error getting weather: {}", e))?;
        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl Tool for Weather {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn signature(&self) -> String {
        "get_weather(city: string)".to_string()
    }

    fn description(&self) -> &str {
        "Returns current weather for a city."
    }

    fn example(&self) -> &str {
        "get_weather(\"Berlin\")"
    }

    async fn run(&self, input: &str) -> ToolResult {
        let start = Instant::now();
        match self.current(input).await {
            Ok(text) => ToolResult::success(self.name(), text, start.elapsed()),
            Err(error) => ToolResult::failure(self.name(), error, start.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_weather_ok() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/Berlin")
            .match_query(Matcher::UrlEncoded("format".into(), "%C %t".into()))
            .with_status(200)
            .with_body("Partly cloudy +12°C\n")
            .create_async()
            .await;

        let weather = Weather::new(&server.url(), Duration::from_secs(5));
        let result = weather.run("Berlin").await;

        assert!(result.success);
        assert_eq!(result.observation(), "Partly cloudy +12°C");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_weather_status_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/Atlantis")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let weather = Weather::new(&server.url(), Duration::from_secs(5));
        let result = weather.run("Atlantis").await;

        assert!(!result.success);
        assert_eq!(result.observation(), "Weather API error: 404");
    }
}
