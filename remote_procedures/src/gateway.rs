use crate::config::{GatewaySettings, Settings};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Value};
use shared_kernel::http_client::{HttpClient, HttpClientError, JsonResponse};
use shared_kernel::non_empty_string;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

non_empty_string!(OperationName);

/// Why the backend did not produce a result. `Display` is the message shown to the user.
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("You are not allowed to do this: {0}")]
    Unauthorized(String),
    #[error("The request was not accepted: {0}")]
    InvalidArgument(String),
    #[error("The service is temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("{operation} was rejected ({status}): {message}")]
    Rejected {
        operation: String,
        status: String,
        message: String,
    },
    #[error("Could not reach the server to run {operation}")]
    Transport {
        operation: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Something went wrong")]
    Internal(#[from] anyhow::Error),
}

impl OperationError {
    /// Whether trying again later may succeed. The gateway itself never retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OperationError::Unavailable(_) | OperationError::Transport { .. }
        )
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteProcedureGateway: Send + Sync {
    /// Runs `operation` with `payload` and returns its result.
    async fn invoke(
        &self,
        operation: &OperationName,
        payload: Value,
    ) -> Result<Value, OperationError>;
}

/// Calls backend functions over HTTP: `POST {host}/{operation}` with `{"data": payload}`,
/// answered by `{"result": ..}` or `{"error": {"status": .., "message": ..}}`.
pub struct HttpGateway {
    client: HttpClient,
    base_url: Url,
    api_token: Option<Secret<String>>,
}

impl HttpGateway {
    pub fn new(settings: &GatewaySettings) -> anyhow::Result<Self> {
        let host = if settings.host.ends_with('/') {
            settings.host.clone()
        } else {
            format!("{}/", settings.host)
        };
        let base_url = Url::parse(&host)
            .with_context(|| format!("Invalid remote procedure host {}", settings.host))?;
        let client = HttpClient::new(Duration::from_secs(settings.timeout_seconds))?;
        Ok(Self {
            client,
            base_url,
            api_token: settings.api_token.clone(),
        })
    }

    pub fn from_configuration() -> anyhow::Result<Self> {
        let settings = Settings::parse()?;
        Self::new(&settings.remote_procedures)
    }

    /// Operation names are single path segments under the configured host.
    fn operation_url(&self, operation: &OperationName) -> Result<Url, OperationError> {
        let name: &str = operation.as_ref();
        let is_segment = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !is_segment {
            return Err(OperationError::InvalidArgument(format!(
                "{operation} is not a valid operation name"
            )));
        }
        self.base_url
            .join(name)
            .with_context(|| format!("Failed to build url for {operation}"))
            .map_err(OperationError::Internal)
    }

    fn headers(&self) -> HashMap<&'static str, String> {
        let mut headers = HashMap::new();
        if let Some(token) = &self.api_token {
            headers.insert("authorization", format!("Bearer {}", token.expose_secret()));
        }
        headers
    }
}

#[async_trait]
impl RemoteProcedureGateway for HttpGateway {
    #[tracing::instrument(err, skip(self, payload), fields(operation = %operation), level = "info")]
    async fn invoke(
        &self,
        operation: &OperationName,
        payload: Value,
    ) -> Result<Value, OperationError> {
        let url = self.operation_url(operation)?;
        let response = self
            .client
            .post_json(url, self.headers(), &json!({ "data": payload }))
            .await
            .map_err(|err| match err {
                HttpClientError::ResponseError(source) => OperationError::Transport {
                    operation: operation.inner(),
                    source,
                },
                HttpClientError::HTTPBuilderError(message) => {
                    OperationError::Internal(anyhow!(message))
                }
            })?;
        interpret(operation, response)
    }
}

#[derive(Deserialize, Debug)]
struct CallableError {
    status: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CallableResponse {
    result: Option<Value>,
    /// Older deployments answer with `data` instead of `result`.
    data: Option<Value>,
    error: Option<CallableError>,
}

fn interpret(operation: &OperationName, response: JsonResponse) -> Result<Value, OperationError> {
    let parsed = response
        .body
        .clone()
        .and_then(|body| serde_json::from_value::<CallableResponse>(body).ok());

    if let Some(error) = parsed.as_ref().and_then(|parsed| parsed.error.as_ref()) {
        let status = error
            .status
            .as_deref()
            .unwrap_or_else(|| http_status_name(response.status));
        let message = error
            .message
            .clone()
            .unwrap_or_else(|| format!("{operation} failed"));
        return Err(classify(operation, status, message));
    }

    if !response.is_success() {
        let status = http_status_name(response.status);
        return Err(classify(operation, status, format!("{operation} failed")));
    }

    match parsed {
        Some(CallableResponse { result: Some(result), .. })
        | Some(CallableResponse { data: Some(result), .. }) => Ok(result),
        Some(_) => Ok(Value::Null),
        None => Err(OperationError::Internal(anyhow!(
            "{operation} returned a body that is not a callable response: {:?}",
            response.body
        ))),
    }
}

fn classify(operation: &OperationName, status: &str, message: String) -> OperationError {
    match status {
        "UNAUTHENTICATED" | "PERMISSION_DENIED" => OperationError::Unauthorized(message),
        "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "NOT_FOUND" | "ALREADY_EXISTS"
        | "OUT_OF_RANGE" => OperationError::InvalidArgument(message),
        "UNAVAILABLE" | "DEADLINE_EXCEEDED" | "RESOURCE_EXHAUSTED" | "ABORTED" => {
            OperationError::Unavailable(message)
        }
        other => OperationError::Rejected {
            operation: operation.inner(),
            status: other.to_string(),
            message,
        },
    }
}

fn http_status_name(status: u16) -> &'static str {
    match status {
        400 => "INVALID_ARGUMENT",
        401 => "UNAUTHENTICATED",
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        409 => "ALREADY_EXISTS",
        429 => "RESOURCE_EXHAUSTED",
        502..=504 => "UNAVAILABLE",
        _ => "INTERNAL",
    }
}
