use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::trace;

use crate::error::RemoteError;

const TARGET_HEADER: &str = "x-amz-target";

/// Minimal JSON-protocol client: one POST per operation, operation named in a header.
#[derive(Clone, Debug)]
pub struct JsonClient {
    http: reqwest::Client,
    endpoint: String,
    content_type: &'static str,
    target_prefix: &'static str,
}

impl JsonClient {
    pub fn new(
        endpoint: impl Into<String>,
        content_type: &'static str,
        target_prefix: &'static str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            content_type,
            target_prefix,
        })
    }

    pub async fn call<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let target = format!("{}.{}", self.target_prefix, operation);
        trace!(%target, endpoint = %self.endpoint, "sending request");

        let response = self
            .http
            .post(format!("{}/", self.endpoint))
            .header(reqwest::header::CONTENT_TYPE, self.content_type)
            .header(TARGET_HEADER, &target)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &bytes));
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            RemoteError::InvalidResponse(format!(
                "{operation}: {e}, body: {}",
                String::from_utf8_lossy(&bytes)
            ))
        })
    }
}

/// Decode the service's `{"__type": ..., "message": ...}` error body.
fn api_error(status: u16, body: &[u8]) -> RemoteError {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let field = |names: &[&str]| {
        parsed.as_ref().and_then(|v| {
            names
                .iter()
                .find_map(|n| v.get(*n).and_then(Value::as_str).map(str::to_string))
        })
    };

    RemoteError::Api {
        status,
        kind: field(&["__type", "code"]).unwrap_or_else(|| "Unknown".to_string()),
        message: field(&["message", "Message"])
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned()),
    }
}
