use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::MAX_PAGE_SIZE,
    error::CoreError,
    platform::{PlatformApi, PlatformError},
    upsert::{Decision, UpsertEngine},
};

/// Tally of one backfill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub clusters: usize,
    /// Clusters whose task listing failed part-way.
    pub failed_clusters: usize,
    pub discovered: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BackfillReport {
    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Created => self.created += 1,
            Decision::UpdatedStop => self.updated += 1,
            Decision::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.failed_clusters == 0
    }
}

/// Seeds records for tasks that are running but were never observed by the event handler.
pub struct BackfillDriver {
    platform: Arc<dyn PlatformApi>,
    engine: Arc<UpsertEngine>,
    region: String,
    page_size: u32,
}

impl BackfillDriver {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        engine: Arc<UpsertEngine>,
        region: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            platform,
            engine,
            region: region.into(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Walk every cluster and task once, feeding each task into the upsert engine.
    ///
    /// Only a failure to list clusters aborts the pass; task and cluster level
    /// failures are counted in the report.
    #[instrument(level = "info", skip(self), fields(region = %self.region))]
    pub async fn backfill(&self) -> Result<BackfillReport, CoreError> {
        let clusters = self.platform.list_clusters().await?;
        let mut report = BackfillReport {
            clusters: clusters.len(),
            ..Default::default()
        };
        info!(clusters = clusters.len(), "backfill started");

        for cluster in &clusters {
            let task_ids = match self.list_all_tasks(cluster).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(%cluster, "listing tasks failed: {e}");
                    report.failed_clusters += 1;
                    continue;
                }
            };
            debug!(%cluster, tasks = task_ids.len(), "tasks listed");
            report.discovered += task_ids.len();

            for task_id in &task_ids {
                match self.process_task(cluster, task_id).await {
                    Ok(decision) => report.record(decision),
                    Err(e) => {
                        warn!(%cluster, %task_id, "backfill of task failed: {e}");
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            discovered = report.discovered,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            failed_clusters = report.failed_clusters,
            "backfill finished"
        );
        Ok(report)
    }

    async fn list_all_tasks(&self, cluster: &str) -> Result<Vec<String>, PlatformError> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .platform
                .list_tasks(cluster, self.page_size, cursor.as_deref())
                .await?;
            ids.extend(page.task_ids);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(ids)
    }

    async fn process_task(&self, cluster: &str, task_id: &str) -> Result<Decision, CoreError> {
        let detail = self
            .platform
            .describe_tasks(cluster, &[task_id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::NotFound(task_id.to_string()))?;

        let decision = self
            .engine
            .upsert(detail.into_observation(&self.region))
            .await?;
        Ok(decision)
    }
}
