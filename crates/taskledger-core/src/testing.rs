//! Scripted collaborators for unit tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use taskledger_model::{
    HostMetadata, LaunchMode, StopState, TaskObservation, TaskRecord, Timestamp,
};

use crate::{
    platform::{InstanceDetail, PlatformApi, PlatformError, TaskDetail, TaskPage},
    store::{MemoryStore, PutOutcome, RecordStore, StopUpdate, StoreError},
};

pub fn ts(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

/// Serverless running observation started at 2024-01-01T00:00:00Z.
pub fn observation(task_id: &str) -> TaskObservation {
    TaskObservation {
        task_id: task_id.into(),
        region: "us-east-1".into(),
        cluster_id: "arn:cluster/main".into(),
        launch_mode: LaunchMode::Serverless,
        cpu: Some("256".into()),
        memory: Some("512".into()),
        group: "service:web".into(),
        container_instance_ref: None,
        started_at: Some(ts("2024-01-01T00:00:00Z")),
        stopped_at: None,
    }
}

pub fn running_record(task_id: &str) -> TaskRecord {
    TaskRecord {
        task_id: task_id.into(),
        region: "us-east-1".into(),
        cluster_id: "arn:cluster/main".into(),
        launch_mode: LaunchMode::Serverless,
        cpu: Some("256".into()),
        memory: Some("512".into()),
        container_instance_ref: None,
        host: HostMetadata::Unresolved,
        group: "service".into(),
        group_name: "web".into(),
        started_at: ts("2024-01-01T00:00:00Z"),
        stop: StopState::Running,
    }
}

pub fn task_detail(cluster: &str, task_id: &str) -> TaskDetail {
    TaskDetail {
        task_arn: task_id.into(),
        cluster_arn: cluster.into(),
        launch_type: LaunchMode::Serverless,
        cpu: Some("256".into()),
        memory: Some("512".into()),
        group: "family:job".into(),
        container_instance_arn: None,
        last_status: "RUNNING".into(),
        started_at: Some(ts("2024-01-01T00:00:00Z")),
        stopped_at: None,
    }
}

#[derive(Default)]
struct PlatformState {
    clusters: Vec<String>,
    list_clusters_error: Option<PlatformError>,
    pages: HashMap<String, Vec<Vec<String>>>,
    cluster_errors: HashMap<String, PlatformError>,
    tasks: HashMap<String, TaskDetail>,
    described: Vec<String>,
    page_sizes: Vec<u32>,
    instances: HashMap<String, InstanceDetail>,
    instance_errors: HashMap<String, PlatformError>,
}

#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<PlatformState>,
    list_task_calls: AtomicUsize,
    describe_task_calls: AtomicUsize,
    instance_calls: AtomicUsize,
}

impl FakePlatform {
    fn with_state<R>(&self, f: impl FnOnce(&mut PlatformState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn add_cluster(&self, cluster: &str) {
        self.with_state(|s| s.clusters.push(cluster.into()));
    }

    pub fn fail_list_clusters(&self, err: PlatformError) {
        self.with_state(|s| s.list_clusters_error = Some(err));
    }

    pub fn fail_cluster(&self, cluster: &str, err: PlatformError) {
        self.with_state(|s| s.cluster_errors.insert(cluster.into(), err));
    }

    pub fn add_task_page(&self, cluster: &str, ids: Vec<String>) {
        self.with_state(|s| s.pages.entry(cluster.into()).or_default().push(ids));
    }

    pub fn add_task(&self, detail: TaskDetail) {
        self.with_state(|s| s.tasks.insert(detail.task_arn.clone(), detail));
    }

    pub fn remove_task(&self, task_id: &str) {
        self.with_state(|s| s.tasks.remove(task_id));
    }

    pub fn add_instance(&self, detail: InstanceDetail) {
        self.with_state(|s| {
            s.instances
                .insert(detail.container_instance_arn.clone(), detail)
        });
    }

    pub fn fail_instance(&self, instance_ref: &str, err: PlatformError) {
        self.with_state(|s| s.instance_errors.insert(instance_ref.into(), err));
    }

    pub fn list_task_calls(&self) -> usize {
        self.list_task_calls.load(Ordering::SeqCst)
    }

    pub fn describe_task_calls(&self) -> usize {
        self.describe_task_calls.load(Ordering::SeqCst)
    }

    pub fn instance_calls(&self) -> usize {
        self.instance_calls.load(Ordering::SeqCst)
    }

    pub fn described_tasks(&self) -> Vec<String> {
        self.with_state(|s| s.described.clone())
    }

    /// `page_size` of every `list_tasks` call, in order.
    pub fn requested_page_sizes(&self) -> Vec<u32> {
        self.with_state(|s| s.page_sizes.clone())
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn list_clusters(&self) -> Result<Vec<String>, PlatformError> {
        self.with_state(|s| match &s.list_clusters_error {
            Some(err) => Err(err.clone()),
            None => Ok(s.clusters.clone()),
        })
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<TaskPage, PlatformError> {
        self.list_task_calls.fetch_add(1, Ordering::SeqCst);
        self.with_state(|s| {
            s.page_sizes.push(page_size);
            if let Some(err) = s.cluster_errors.get(cluster) {
                return Err(err.clone());
            }
            let pages = s.pages.get(cluster).cloned().unwrap_or_default();
            let index = match cursor {
                Some(c) => c
                    .parse::<usize>()
                    .map_err(|_| PlatformError::Malformed(format!("bad cursor {c}")))?,
                None => 0,
            };
            let task_ids = pages.get(index).cloned().unwrap_or_default();
            let next_cursor = (index + 1 < pages.len()).then(|| (index + 1).to_string());
            Ok(TaskPage {
                task_ids,
                next_cursor,
            })
        })
    }

    async fn describe_tasks(
        &self,
        _cluster: &str,
        task_ids: &[String],
    ) -> Result<Vec<TaskDetail>, PlatformError> {
        self.describe_task_calls.fetch_add(1, Ordering::SeqCst);
        self.with_state(|s| {
            s.described.extend(task_ids.iter().cloned());
            Ok(task_ids
                .iter()
                .filter_map(|id| s.tasks.get(id).cloned())
                .collect())
        })
    }

    async fn describe_container_instances(
        &self,
        _cluster: &str,
        instance_refs: &[String],
    ) -> Result<Vec<InstanceDetail>, PlatformError> {
        self.instance_calls.fetch_add(1, Ordering::SeqCst);
        self.with_state(|s| {
            if let Some(err) = instance_refs.iter().find_map(|r| s.instance_errors.get(r)) {
                return Err(err.clone());
            }
            Ok(instance_refs
                .iter()
                .filter_map(|r| s.instances.get(r).cloned())
                .collect())
        })
    }
}

/// [`MemoryStore`] wrapper that counts calls.
pub struct CountingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    hide_next_get: AtomicBool,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            hide_next_get: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Make the next `get` report no record, simulating a concurrent creator.
    pub fn hide_next_get(&self) {
        self.hide_next_get.store(true, Ordering::SeqCst);
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.gets() + self.creates() + self.updates()
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.hide_next_get.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get(task_id).await
    }

    async fn create(&self, record: &TaskRecord) -> Result<PutOutcome, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(record).await
    }

    async fn update_stop(
        &self,
        task_id: &str,
        update: StopUpdate,
    ) -> Result<TaskRecord, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_stop(task_id, update).await
    }
}
