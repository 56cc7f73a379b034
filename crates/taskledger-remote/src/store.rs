use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use taskledger_core::{PutOutcome, RecordStore, StopUpdate, StoreError, TrackerConfig};
use taskledger_model::{KEY_ATTRIBUTE, RecordItem, TaskRecord};

use crate::{
    attr::{from_attribute_map, to_attribute_map},
    client::JsonClient,
    error::RemoteError,
};

const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const TARGET_PREFIX: &str = "DynamoDB_20120810";

/// [`RecordStore`] over a key-value item store's JSON API, one item per task.
#[derive(Clone, Debug)]
pub struct RemoteStore {
    client: JsonClient,
    table: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetItemResponse {
    item: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateItemResponse {
    attributes: Option<Map<String, Value>>,
}

impl RemoteStore {
    pub fn new(
        endpoint: impl Into<String>,
        table: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = JsonClient::new(endpoint, CONTENT_TYPE, TARGET_PREFIX, timeout)?;
        Ok(Self {
            client,
            table: table.into(),
        })
    }

    pub fn from_config(cfg: &TrackerConfig) -> Result<Self, RemoteError> {
        Self::new(
            cfg.store_endpoint.clone(),
            cfg.table_name.clone(),
            Duration::from_millis(cfg.request_timeout_ms),
        )
    }

    fn key(task_id: &str) -> Value {
        json!({ KEY_ATTRIBUTE: { "S": task_id } })
    }
}

fn decode_item(map: &Map<String, Value>) -> Result<TaskRecord, StoreError> {
    let flat = from_attribute_map(map)?;
    let item: RecordItem = serde_json::from_value(flat)?;
    Ok(TaskRecord::try_from(item)?)
}

fn put_request(table: &str, record: &TaskRecord) -> Result<Value, StoreError> {
    let flat = serde_json::to_value(RecordItem::from(record))?;
    Ok(json!({
        "TableName": table,
        "Item": to_attribute_map(&flat)?,
        "ConditionExpression": format!("attribute_not_exists({KEY_ATTRIBUTE})"),
    }))
}

fn update_request(table: &str, task_id: &str, update: &StopUpdate) -> Value {
    json!({
        "TableName": table,
        "Key": RemoteStore::key(task_id),
        "UpdateExpression": "SET stoppedAt = :d, runTime = :t",
        "ConditionExpression": format!("attribute_exists({KEY_ATTRIBUTE})"),
        "ExpressionAttributeValues": {
            ":d": { "S": update.stopped_at.to_string() },
            ":t": { "N": update.run_time_seconds.to_string() },
        },
        "ReturnValues": "ALL_NEW",
    })
}

#[async_trait]
impl RecordStore for RemoteStore {
    #[instrument(level = "debug", skip(self), fields(table = %self.table))]
    async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        let request = json!({
            "TableName": self.table,
            "Key": Self::key(task_id),
            "ConsistentRead": true,
        });
        let response: GetItemResponse = self.client.call("GetItem", &request).await?;
        response.item.as_ref().map(decode_item).transpose()
    }

    #[instrument(level = "debug", skip_all, fields(table = %self.table, task_id = %record.task_id))]
    async fn create(&self, record: &TaskRecord) -> Result<PutOutcome, StoreError> {
        let request = put_request(&self.table, record)?;
        match self.client.call::<_, Value>("PutItem", &request).await {
            Ok(_) => Ok(PutOutcome::Created),
            Err(e) if e.is_conditional_check_failed() => {
                debug!("item already exists");
                Ok(PutOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(level = "debug", skip(self, update), fields(table = %self.table))]
    async fn update_stop(
        &self,
        task_id: &str,
        update: StopUpdate,
    ) -> Result<TaskRecord, StoreError> {
        let request = update_request(&self.table, task_id, &update);
        let response: UpdateItemResponse = match self.client.call("UpdateItem", &request).await {
            Ok(r) => r,
            Err(e) if e.is_conditional_check_failed() => {
                return Err(StoreError::NotFound(task_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let attributes = response
            .attributes
            .ok_or_else(|| StoreError::Backend("UpdateItem returned no attributes".into()))?;
        decode_item(&attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskledger_model::{HostMetadata, LaunchMode, StopState, Timestamp};

    fn record() -> TaskRecord {
        TaskRecord {
            task_id: "arn:task/1".into(),
            region: "us-east-1".into(),
            cluster_id: "arn:cluster/main".into(),
            launch_mode: LaunchMode::Serverless,
            cpu: Some("256".into()),
            memory: None,
            container_instance_ref: None,
            host: HostMetadata::Unresolved,
            group: "service".into(),
            group_name: "web".into(),
            started_at: Timestamp::parse("2024-01-01T00:00:00Z").unwrap(),
            stop: StopState::Running,
        }
    }

    #[test]
    fn put_is_conditional_on_absence() {
        let request = put_request("ECSTaskStatus", &record()).unwrap();

        assert_eq!(request["TableName"], "ECSTaskStatus");
        assert_eq!(request["ConditionExpression"], "attribute_not_exists(taskArn)");
        assert_eq!(request["Item"]["taskArn"], json!({ "S": "arn:task/1" }));
        assert_eq!(request["Item"]["stoppedAt"], json!({ "S": "STILL-RUNNING" }));
        assert_eq!(request["Item"]["runTime"], json!({ "N": "0" }));
        assert!(request["Item"].get("memory").is_none());
    }

    #[test]
    fn update_sets_only_stop_fields() {
        let update = StopUpdate {
            stopped_at: Timestamp::parse("2024-01-01T00:01:30.4Z").unwrap(),
            run_time_seconds: 90,
        };
        let request = update_request("ECSTaskStatus", "arn:task/1", &update);

        assert_eq!(request["Key"], json!({ "taskArn": { "S": "arn:task/1" } }));
        assert_eq!(request["UpdateExpression"], "SET stoppedAt = :d, runTime = :t");
        assert_eq!(
            request["ExpressionAttributeValues"][":d"],
            json!({ "S": "2024-01-01T00:01:30.400000Z" })
        );
        assert_eq!(request["ExpressionAttributeValues"][":t"], json!({ "N": "90" }));
        assert_eq!(request["ReturnValues"], "ALL_NEW");
    }

    #[test]
    fn stored_item_decodes_to_record() {
        let flat = serde_json::to_value(RecordItem::from(&record())).unwrap();
        let attributes = to_attribute_map(&flat).unwrap();
        assert_eq!(decode_item(&attributes).unwrap(), record());
    }
}
