//! Link shortening for force-token renew links
//!
//! `HttpLinkShortener` talks to the common "shortener API" shape:
//! `GET <endpoint>?api=<key>&url=<url>` answering `{ "status", "shortenedUrl" }`.
//! Any failure falls back to the long URL so the user still gets a working button.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::config::ShortenerConfig;
use crate::domain::error::GateError;
use crate::domain::traits::LinkShortener;

/// HTTP client reused across requests
fn http_client() -> &'static Client {
    use std::sync::OnceLock;
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default()
    })
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "shortenedUrl")]
    shortened_url: Option<String>,
}

impl ShortenResponse {
    fn into_url(self) -> Option<String> {
        if self.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("error")) {
            return None;
        }
        self.shortened_url.filter(|url| !url.trim().is_empty())
    }
}

pub struct HttpLinkShortener {
    endpoint: String,
    api_key: String,
}

impl HttpLinkShortener {
    pub fn new(config: &ShortenerConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn request(&self, url: &str) -> Result<String, String> {
        let response = http_client()
            .get(&self.endpoint)
            .query(&[("api", self.api_key.as_str()), ("url", url)])
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let body: ShortenResponse = response.json().await.map_err(|e| e.to_string())?;
        body.into_url()
            .ok_or_else(|| "response carried no shortened URL".to_string())
    }
}

#[async_trait]
impl LinkShortener for HttpLinkShortener {
    async fn shorten(&self, url: &str) -> Result<String, GateError> {
        match self.request(url).await {
            Ok(short) => Ok(short),
            Err(e) => {
                tracing::warn!(error = %e, "Link shortener failed, using long URL");
                Ok(url.to_string())
            }
        }
    }
}

/// Used when no shortener is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughShortener;

#[async_trait]
impl LinkShortener for PassthroughShortener {
    async fn shorten(&self, url: &str) -> Result<String, GateError> {
        Ok(url.to_string())
    }
}
