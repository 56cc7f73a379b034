use std::{fmt, sync::Arc};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use taskledger_model::{
    ModelError, StopState, TaskObservation, TaskRecord, Timestamp, run_time_seconds, split_group,
};

use crate::{
    error::CoreError,
    resolver::InstanceResolver,
    store::{PutOutcome, RecordStore, StopUpdate},
};

/// Why an observation produced no write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The task is already stored and the observation carries no stop.
    AlreadyRecorded,
    /// The stored record already has its stop time.
    AlreadyStopped,
    /// Another writer created the record between our read and our create.
    LostCreateRace,
}

/// Outcome of [`UpsertEngine::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "camelCase")]
pub enum Decision {
    Created,
    UpdatedStop,
    Skipped(SkipReason),
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Created => f.write_str("created"),
            Decision::UpdatedStop => f.write_str("updated-stop"),
            Decision::Skipped(reason) => write!(f, "skipped ({reason:?})"),
        }
    }
}

/// Decides create / update / skip for each observation and writes the result.
pub struct UpsertEngine {
    store: Arc<dyn RecordStore>,
    resolver: InstanceResolver,
}

impl UpsertEngine {
    pub fn new(store: Arc<dyn RecordStore>, resolver: InstanceResolver) -> Self {
        Self { store, resolver }
    }

    #[instrument(level = "debug", skip_all, fields(task_id = %obs.task_id, stopped = obs.is_stopped()))]
    pub async fn upsert(&self, obs: TaskObservation) -> Result<Decision, CoreError> {
        let Some(existing) = self.store.get(&obs.task_id).await? else {
            return self.create(obs).await;
        };

        let Some(stopped_at) = obs.stopped_at else {
            debug!("task already recorded");
            return Ok(Decision::Skipped(SkipReason::AlreadyRecorded));
        };
        if existing.stop.is_stopped() {
            debug!("task already recorded as stopped");
            return Ok(Decision::Skipped(SkipReason::AlreadyStopped));
        }

        let update = StopUpdate {
            stopped_at,
            run_time_seconds: run_time(&existing.started_at, &stopped_at),
        };
        self.store.update_stop(&obs.task_id, update).await?;
        info!(
            stopped_at = %update.stopped_at,
            run_time = update.run_time_seconds,
            "task stop recorded"
        );
        Ok(Decision::UpdatedStop)
    }

    async fn create(&self, obs: TaskObservation) -> Result<Decision, CoreError> {
        let record = self.build_record(obs).await?;
        match self.store.create(&record).await? {
            PutOutcome::Created => {
                info!(
                    cluster = %record.cluster_id,
                    launch_type = %record.launch_mode,
                    stopped = record.stop.is_stopped(),
                    "task record created"
                );
                Ok(Decision::Created)
            }
            PutOutcome::AlreadyExists => {
                debug!("record appeared concurrently, leaving it to the next observation");
                Ok(Decision::Skipped(SkipReason::LostCreateRace))
            }
        }
    }

    async fn build_record(&self, obs: TaskObservation) -> Result<TaskRecord, CoreError> {
        let started_at = obs
            .started_at
            .ok_or(ModelError::MissingField("startedAt"))?;

        let stop = match obs.stopped_at {
            Some(at) => StopState::Stopped {
                at,
                run_time_seconds: run_time(&started_at, &at),
            },
            None => StopState::Running,
        };

        let host = self
            .resolver
            .resolve(
                &obs.cluster_id,
                obs.container_instance_ref.as_deref(),
                obs.launch_mode,
            )
            .await;
        let (group, group_name) = split_group(&obs.group);
        let container_instance_ref = if obs.launch_mode.is_serverless() {
            None
        } else {
            obs.container_instance_ref
        };

        Ok(TaskRecord {
            task_id: obs.task_id,
            region: obs.region,
            cluster_id: obs.cluster_id,
            launch_mode: obs.launch_mode,
            cpu: obs.cpu,
            memory: obs.memory,
            container_instance_ref,
            host,
            group,
            group_name,
            started_at,
            stop,
        })
    }
}

fn run_time(started_at: &Timestamp, stopped_at: &Timestamp) -> u64 {
    if stopped_at < started_at {
        warn!(%started_at, %stopped_at, "stop precedes start, run time clamped to 0");
    }
    run_time_seconds(started_at, stopped_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{InstanceAttribute, InstanceDetail};
    use crate::store::MemoryStore;
    use crate::testing::{CountingStore, FakePlatform, observation, ts};
    use taskledger_model::{HostMetadata, LaunchMode, RecordItem};

    struct Fixture {
        platform: Arc<FakePlatform>,
        store: Arc<CountingStore>,
        engine: UpsertEngine,
    }

    fn fixture() -> Fixture {
        let platform = Arc::new(FakePlatform::default());
        let store = Arc::new(CountingStore::new(MemoryStore::new()));
        let engine = UpsertEngine::new(
            store.clone(),
            InstanceResolver::with_memory_cache(platform.clone()),
        );
        Fixture {
            platform,
            store,
            engine,
        }
    }

    fn stop(obs: &TaskObservation, at: &str) -> TaskObservation {
        TaskObservation {
            stopped_at: Some(ts(at)),
            ..obs.clone()
        }
    }

    #[tokio::test]
    async fn repeated_running_observation_is_idempotent() {
        let f = fixture();
        let obs = observation("task-1");

        assert_eq!(f.engine.upsert(obs.clone()).await.unwrap(), Decision::Created);
        let stored = f.store.inner().list_all();

        assert_eq!(
            f.engine.upsert(obs).await.unwrap(),
            Decision::Skipped(SkipReason::AlreadyRecorded)
        );
        assert_eq!(f.store.inner().list_all(), stored);
        assert_eq!(f.store.creates(), 1);
        assert_eq!(f.store.updates(), 0);
    }

    #[tokio::test]
    async fn new_running_record_has_placeholders() {
        let f = fixture();
        f.engine.upsert(observation("task-1")).await.unwrap();

        let record = f.store.inner().list_all().pop().unwrap();
        let item = RecordItem::from(&record);
        assert_eq!(item.stopped_at, "STILL-RUNNING");
        assert_eq!(item.run_time, 0);
        assert_eq!(item.group, "service");
        assert_eq!(item.group_name, "web");
        assert_eq!(item.started_at, "2024-01-01T00:00:00.000000Z");
    }

    #[tokio::test]
    async fn first_sighting_already_stopped_is_created_stopped() {
        let f = fixture();
        let obs = stop(&observation("task-1"), "2024-01-01T00:01:30.400000Z");

        assert_eq!(f.engine.upsert(obs).await.unwrap(), Decision::Created);

        let record = f.store.inner().list_all().pop().unwrap();
        assert_eq!(
            record.stop,
            StopState::Stopped {
                at: ts("2024-01-01T00:01:30.400000Z"),
                run_time_seconds: 90,
            }
        );
        assert_eq!(f.store.updates(), 0);
    }

    #[tokio::test]
    async fn stop_updates_only_stop_fields() {
        let f = fixture();
        let obs = observation("task-1");
        f.engine.upsert(obs.clone()).await.unwrap();
        let before = f.store.inner().list_all().pop().unwrap();

        // a later notification may carry a different group or start; they are ignored
        let mut stopped = stop(&obs, "2024-01-01T00:10:00.600000Z");
        stopped.group = "family:other".into();
        stopped.started_at = Some(ts("2024-01-01T00:05:00Z"));

        assert_eq!(f.engine.upsert(stopped).await.unwrap(), Decision::UpdatedStop);

        let after = f.store.inner().list_all().pop().unwrap();
        assert_eq!(
            after.stop,
            StopState::Stopped {
                at: ts("2024-01-01T00:10:00.600000Z"),
                run_time_seconds: 601,
            }
        );
        assert_eq!(
            TaskRecord {
                stop: StopState::Running,
                ..after
            },
            before
        );
    }

    #[tokio::test]
    async fn stop_time_is_set_exactly_once() {
        let f = fixture();
        let obs = observation("task-1");
        f.engine.upsert(obs.clone()).await.unwrap();
        f.engine
            .upsert(stop(&obs, "2024-01-01T00:01:00Z"))
            .await
            .unwrap();

        let decision = f
            .engine
            .upsert(stop(&obs, "2024-01-01T00:09:00Z"))
            .await
            .unwrap();

        assert_eq!(decision, Decision::Skipped(SkipReason::AlreadyStopped));
        let record = f.store.inner().list_all().pop().unwrap();
        assert_eq!(record.stop.run_time_seconds(), 60);
        assert_eq!(f.store.updates(), 1);
    }

    #[tokio::test]
    async fn negative_run_time_is_clamped() {
        let f = fixture();
        let obs = stop(&observation("task-1"), "2023-12-31T23:59:58Z");
        f.engine.upsert(obs).await.unwrap();

        let record = f.store.inner().list_all().pop().unwrap();
        assert_eq!(record.stop.run_time_seconds(), 0);
        assert!(record.stop.is_stopped());
    }

    #[tokio::test]
    async fn lost_create_race_is_benign() {
        let f = fixture();
        f.store.hide_next_get();
        f.store
            .inner()
            .create(&crate::testing::running_record("task-1"))
            .await
            .unwrap();

        let decision = f.engine.upsert(observation("task-1")).await.unwrap();
        assert_eq!(decision, Decision::Skipped(SkipReason::LostCreateRace));
        assert_eq!(f.store.inner().len(), 1);
    }

    #[tokio::test]
    async fn missing_start_is_rejected_before_any_lookup() {
        let f = fixture();
        let mut obs = observation("task-1");
        obs.launch_mode = LaunchMode::Hosted;
        obs.container_instance_ref = Some("arn:ci/abc".into());
        obs.started_at = None;

        let err = f.engine.upsert(obs).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Model(ModelError::MissingField("startedAt"))
        ));
        assert_eq!(f.platform.instance_calls(), 0);
        assert_eq!(f.store.creates(), 0);
    }

    #[tokio::test]
    async fn hosted_record_is_enriched_once() {
        let f = fixture();
        f.platform.add_instance(InstanceDetail {
            container_instance_arn: "arn:ci/abc".into(),
            ec2_instance_id: Some("i-123".into()),
            attributes: vec![InstanceAttribute::new("ecs.instance-type", "m5.large")],
        });
        let mut obs = observation("task-1");
        obs.launch_mode = LaunchMode::Hosted;
        obs.container_instance_ref = Some("arn:ci/abc".into());

        f.engine.upsert(obs.clone()).await.unwrap();
        f.engine
            .upsert(stop(&obs, "2024-01-01T01:00:00Z"))
            .await
            .unwrap();

        let record = f.store.inner().list_all().pop().unwrap();
        assert_eq!(record.host.triple(), ("m5.large", "linux", "i-123"));
        assert_eq!(record.container_instance_ref.as_deref(), Some("arn:ci/abc"));
        assert_eq!(f.platform.instance_calls(), 1);
    }

    #[tokio::test]
    async fn serverless_record_drops_placement() {
        let f = fixture();
        let mut obs = observation("task-1");
        obs.container_instance_ref = Some("arn:ci/ignored".into());

        f.engine.upsert(obs).await.unwrap();

        let record = f.store.inner().list_all().pop().unwrap();
        assert_eq!(record.container_instance_ref, None);
        assert_eq!(record.host, HostMetadata::Unresolved);
        assert_eq!(f.platform.instance_calls(), 0);
    }

    #[test]
    fn decision_serializes_with_reason() {
        let json = serde_json::to_string(&Decision::Skipped(SkipReason::AlreadyStopped)).unwrap();
        assert_eq!(json, r#"{"decision":"skipped","reason":"alreadyStopped"}"#);
        let json = serde_json::to_string(&Decision::Created).unwrap();
        assert_eq!(json, r#"{"decision":"created"}"#);
    }
}
