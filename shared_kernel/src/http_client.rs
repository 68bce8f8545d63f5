use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error as ThisError;
use url::Url;

/// Thin JSON client. Requests are traced but never retried; callers own retry policy.
#[derive(Clone)]
pub struct HttpClient {
    client: ClientWithMiddleware,
}

#[derive(ThisError, Debug)]
pub enum HttpClientError {
    #[error(transparent)]
    ResponseError(#[from] anyhow::Error),
    #[error("httpBuilderError {0}")]
    HTTPBuilderError(String),
}

/// Status code plus the decoded body. `body` is `None` when the payload was not JSON.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

struct HeadersMapGenerator(HeaderMap);

impl HeadersMapGenerator {
    fn into_inner(self) -> HeaderMap {
        self.0
    }
}

impl TryFrom<HashMap<&'static str, String>> for HeadersMapGenerator {
    type Error = HttpClientError;

    fn try_from(value: HashMap<&'static str, String>) -> Result<Self, Self::Error> {
        let mut header_map = HeaderMap::new();

        for (key, value) in value.into_iter() {
            let value = HeaderValue::from_str(&value)
                .map_err(|err| HttpClientError::HTTPBuilderError(format!("{err} on {key}")))?;
            header_map.insert(key, value);
        }
        Ok(Self(header_map))
    }
}

impl HttpClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build http client")?;
        let client = ClientBuilder::new(inner)
            .with(TracingMiddleware::default())
            .build();
        Ok(Self { client })
    }

    /// Posts `body` as JSON. Non-2xx responses are returned, not turned into errors.
    pub async fn post_json(
        &self,
        url: Url,
        headers: HashMap<&'static str, String>,
        body: &Value,
    ) -> Result<JsonResponse, HttpClientError> {
        let header_map = HeadersMapGenerator::try_from(headers)?.into_inner();
        let response = self
            .client
            .post(url.clone())
            .headers(header_map)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        let body = serde_json::from_slice::<Value>(&bytes).ok();

        Ok(JsonResponse { status, body })
    }
}
