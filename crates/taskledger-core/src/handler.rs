use std::sync::Arc;

use tracing::{info, instrument, warn};

use taskledger_model::TaskStateChangeEvent;

use crate::{
    error::CoreError,
    upsert::{Decision, UpsertEngine},
};

/// Entry point for task state-change notifications.
///
/// Notifications are validated before the record store is touched.
#[derive(Clone)]
pub struct EventHandler {
    engine: Arc<UpsertEngine>,
}

impl EventHandler {
    pub fn new(engine: Arc<UpsertEngine>) -> Self {
        Self { engine }
    }

    pub async fn handle_json(&self, raw: &str) -> Result<Decision, CoreError> {
        let event = TaskStateChangeEvent::from_json(raw).inspect_err(|e| warn!("{e}"))?;
        self.handle(event).await
    }

    pub async fn handle_value(&self, value: serde_json::Value) -> Result<Decision, CoreError> {
        let event = TaskStateChangeEvent::from_value(value).inspect_err(|e| warn!("{e}"))?;
        self.handle(event).await
    }

    #[instrument(level = "info", skip_all, fields(task_id = %event.detail.task_arn, status = %event.detail.last_status))]
    pub async fn handle(&self, event: TaskStateChangeEvent) -> Result<Decision, CoreError> {
        let obs = event.into_observation().inspect_err(|e| warn!("{e}"))?;
        let decision = self.engine.upsert(obs).await?;
        info!(%decision, "notification handled");
        Ok(decision)
    }
}
