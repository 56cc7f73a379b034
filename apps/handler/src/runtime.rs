//! Invocation loop for a function runtime that hands out events over HTTP.

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use taskledger_core::{CoreError, Decision, EventHandler};

pub const ENV_RUNTIME_API: &str = "AWS_LAMBDA_RUNTIME_API";

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";

const REJECTED: &str = "InvalidNotification";
const FAILED: &str = "InvocationError";

/// Error body the runtime API expects on `/error`.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationError {
    pub error_message: String,
    pub error_type: &'static str,
}

/// What gets posted back for one invocation.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Decision(Decision),
    Error(InvocationError),
}

impl Reply {
    fn error(error_type: &'static str, message: impl Into<String>) -> Self {
        Reply::Error(InvocationError {
            error_message: message.into(),
            error_type,
        })
    }

    fn endpoint(&self) -> &'static str {
        match self {
            Reply::Decision(_) => "response",
            Reply::Error(_) => "error",
        }
    }
}

impl From<&CoreError> for Reply {
    fn from(err: &CoreError) -> Self {
        let error_type = if err.is_rejection() { REJECTED } else { FAILED };
        Reply::error(error_type, err.to_string())
    }
}

/// Handle one raw invocation payload.
pub async fn answer(handler: &EventHandler, payload: &[u8]) -> Reply {
    let event: Value = match serde_json::from_slice(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("undecodable invocation payload: {e}");
            return Reply::error(REJECTED, format!("undecodable payload: {e}"));
        }
    };

    match handler.handle_value(event).await {
        Ok(decision) => Reply::Decision(decision),
        Err(e) => {
            if e.is_rejection() {
                warn!("notification rejected: {e}");
            } else {
                error!("invocation failed: {e}");
            }
            Reply::from(&e)
        }
    }
}

/// Poll for invocations until the runtime API goes away.
///
/// Every invocation gets a response or an error report; the loop keeps serving.
pub async fn serve(api: &str, handler: &EventHandler) -> anyhow::Result<()> {
    let base = format!("http://{api}/{API_VERSION}/runtime/invocation");
    let client = reqwest::Client::new();

    loop {
        let next = client
            .get(format!("{base}/next"))
            .send()
            .await
            .context("fetching next invocation")?
            .error_for_status()?;

        let request_id = next
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .context("invocation without request id")?;
        debug!(%request_id, "invocation received");

        let reply = match next.bytes().await {
            Ok(payload) => answer(handler, &payload).await,
            Err(e) => Reply::error(FAILED, format!("reading invocation payload: {e}")),
        };

        let request = client.post(format!("{base}/{request_id}/{}", reply.endpoint()));
        let sent = match &reply {
            Reply::Decision(decision) => request.json(decision).send().await,
            Reply::Error(body) => request.json(body).send().await,
        };
        if let Err(e) = sent.and_then(|r| r.error_for_status()) {
            warn!(%request_id, "reporting invocation result failed: {e}");
        }
    }
}
