use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use taskledger_core::{
    InstanceAttribute, InstanceDetail, PlatformApi, PlatformError, TaskDetail, TaskPage,
    TrackerConfig,
};
use taskledger_model::{LaunchMode, Timestamp};

use crate::{client::JsonClient, error::RemoteError};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AmazonEC2ContainerServiceV20141113";

/// [`PlatformApi`] over the orchestration platform's JSON query API.
#[derive(Clone, Debug)]
pub struct RemotePlatform {
    client: JsonClient,
}

impl RemotePlatform {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = JsonClient::new(endpoint, CONTENT_TYPE, TARGET_PREFIX, timeout)?;
        Ok(Self { client })
    }

    pub fn from_config(cfg: &TrackerConfig) -> Result<Self, RemoteError> {
        Self::new(
            cfg.platform_endpoint.clone(),
            Duration::from_millis(cfg.request_timeout_ms),
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListClustersRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListClustersResponse {
    #[serde(default)]
    cluster_arns: Vec<String>,
    next_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksRequest<'a> {
    cluster: &'a str,
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksResponse {
    #[serde(default)]
    task_arns: Vec<String>,
    next_token: Option<String>,
}

#[derive(Serialize)]
struct DescribeTasksRequest<'a> {
    cluster: &'a str,
    tasks: &'a [String],
}

#[derive(Deserialize)]
struct DescribeTasksResponse {
    #[serde(default)]
    tasks: Vec<WireTask>,
    #[serde(default)]
    failures: Vec<WireFailure>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTask {
    task_arn: String,
    cluster_arn: String,
    launch_type: Option<String>,
    cpu: Option<String>,
    memory: Option<String>,
    group: Option<String>,
    container_instance_arn: Option<String>,
    #[serde(default)]
    last_status: String,
    /// Seconds since the epoch.
    started_at: Option<f64>,
    stopped_at: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeContainerInstancesRequest<'a> {
    cluster: &'a str,
    container_instances: &'a [String],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeContainerInstancesResponse {
    #[serde(default)]
    container_instances: Vec<WireContainerInstance>,
    #[serde(default)]
    failures: Vec<WireFailure>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireContainerInstance {
    container_instance_arn: String,
    ec2_instance_id: Option<String>,
    #[serde(default)]
    attributes: Vec<WireAttribute>,
}

#[derive(Deserialize)]
struct WireAttribute {
    name: String,
    value: Option<String>,
}

#[derive(Deserialize, Debug)]
struct WireFailure {
    arn: Option<String>,
    reason: Option<String>,
}

impl TryFrom<WireTask> for TaskDetail {
    type Error = PlatformError;

    fn try_from(t: WireTask) -> Result<Self, Self::Error> {
        let malformed = |what: String| PlatformError::Malformed(format!("{}: {what}", t.task_arn));

        let launch_type: LaunchMode = t
            .launch_type
            .as_deref()
            .ok_or_else(|| malformed("missing launchType".into()))?
            .parse()
            .map_err(|e| malformed(format!("{e}")))?;
        let epoch = |secs: Option<f64>| {
            secs.map(Timestamp::from_unix_seconds)
                .transpose()
                .map_err(|e| malformed(format!("{e}")))
        };
        let started_at = epoch(t.started_at)?;
        let stopped_at = epoch(t.stopped_at)?;

        Ok(TaskDetail {
            task_arn: t.task_arn,
            cluster_arn: t.cluster_arn,
            launch_type,
            cpu: t.cpu,
            memory: t.memory,
            group: t.group.unwrap_or_default(),
            container_instance_arn: t.container_instance_arn,
            last_status: t.last_status,
            started_at,
            stopped_at,
        })
    }
}

impl From<WireContainerInstance> for InstanceDetail {
    fn from(ci: WireContainerInstance) -> Self {
        InstanceDetail {
            container_instance_arn: ci.container_instance_arn,
            ec2_instance_id: ci.ec2_instance_id,
            attributes: ci
                .attributes
                .into_iter()
                .map(|a| InstanceAttribute {
                    name: a.name,
                    value: a.value,
                })
                .collect(),
        }
    }
}

fn log_failures(operation: &str, failures: &[WireFailure]) {
    for f in failures {
        debug!(
            operation,
            arn = f.arn.as_deref().unwrap_or("unknown"),
            reason = f.reason.as_deref().unwrap_or("unknown"),
            "platform reported failure"
        );
    }
}

#[async_trait]
impl PlatformApi for RemotePlatform {
    #[instrument(level = "debug", skip(self))]
    async fn list_clusters(&self) -> Result<Vec<String>, PlatformError> {
        let mut clusters = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let request = ListClustersRequest {
                next_token: token.as_deref(),
            };
            let page: ListClustersResponse = self.client.call("ListClusters", &request).await?;
            clusters.extend(page.cluster_arns);
            match page.next_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }
        Ok(clusters)
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_tasks(
        &self,
        cluster: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<TaskPage, PlatformError> {
        let request = ListTasksRequest {
            cluster,
            max_results: page_size,
            next_token: cursor,
        };
        let page: ListTasksResponse = self.client.call("ListTasks", &request).await?;
        Ok(TaskPage {
            task_ids: page.task_arns,
            next_cursor: page.next_token.filter(|t| !t.is_empty()),
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn describe_tasks(
        &self,
        cluster: &str,
        task_ids: &[String],
    ) -> Result<Vec<TaskDetail>, PlatformError> {
        let request = DescribeTasksRequest {
            cluster,
            tasks: task_ids,
        };
        let response: DescribeTasksResponse = self.client.call("DescribeTasks", &request).await?;
        log_failures("DescribeTasks", &response.failures);
        response.tasks.into_iter().map(TaskDetail::try_from).collect()
    }

    #[instrument(level = "debug", skip(self))]
    async fn describe_container_instances(
        &self,
        cluster: &str,
        instance_refs: &[String],
    ) -> Result<Vec<InstanceDetail>, PlatformError> {
        let request = DescribeContainerInstancesRequest {
            cluster,
            container_instances: instance_refs,
        };
        let response: DescribeContainerInstancesResponse = self
            .client
            .call("DescribeContainerInstances", &request)
            .await?;
        log_failures("DescribeContainerInstances", &response.failures);
        Ok(response
            .container_instances
            .into_iter()
            .map(InstanceDetail::from)
            .collect())
    }
}
