//! Task record service: CRUD against the `task_c` record kind.

use crate::errors::ServiceError;
use crate::files::FileDescriptor;
use crate::services::files::{FileService, NewFileRecord};
use crate::services::records::{QueryParams, RecordClient, SortOrder};
use crate::services::{Notifier, successful_results};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::error;

const TABLE: &str = "task_c";

const FIELDS: &[&str] = &[
    "Name",
    "title_c",
    "description_c",
    "priority_c",
    "status_c",
    "Tags",
    "CreatedOn",
    "ModifiedOn",
];

/// Input for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub tags: Option<String>,
    /// Attachments; when present, a file record is created first and linked
    /// to the task through `file_id_c`.
    pub files: Vec<FileDescriptor>,
}

/// Partial update for a task. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdates {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub tags: Option<String>,
}

/// Request/response mapper for task records.
pub struct TaskService {
    client: Arc<dyn RecordClient>,
    notifier: Arc<dyn Notifier>,
    files: Arc<FileService>,
}

impl TaskService {
    pub fn new(
        client: Arc<dyn RecordClient>,
        notifier: Arc<dyn Notifier>,
        files: Arc<FileService>,
    ) -> Self {
        Self {
            client,
            notifier,
            files,
        }
    }

    /// Fetch up to one page of tasks, newest first.
    pub async fn get_all(&self) -> Vec<Value> {
        match self.try_get_all().await {
            Ok(records) => records,
            Err(err) => {
                error!(error = %err, "error fetching tasks");
                Vec::new()
            }
        }
    }

    async fn try_get_all(&self) -> Result<Vec<Value>, ServiceError> {
        let params = QueryParams::fields(FIELDS)
            .order_by("CreatedOn", SortOrder::Desc)
            .page(100, 0);
        let response = self.client.fetch_records(TABLE, &params).await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "fetch failed".to_string());
            self.notifier.error(&message);
            return Err(ServiceError::RequestRejected { message });
        }
        Ok(response.data.unwrap_or_default())
    }

    /// Fetch one task by id.
    pub async fn get_by_id(&self, task_id: i64) -> Option<Value> {
        let params = QueryParams::fields(FIELDS);
        match self.client.get_record_by_id(TABLE, task_id, &params).await {
            Ok(response) => response.data,
            Err(err) => {
                error!(error = %err, task_id, "error fetching task");
                None
            }
        }
    }

    /// Create a task, creating and linking a file record first when
    /// attachments are present. Returns the created record or `None`.
    pub async fn create(&self, new: NewTask) -> Option<Value> {
        match self.try_create(new).await {
            Ok(record) => record,
            Err(err) => {
                error!(error = %err, "error creating task");
                None
            }
        }
    }

    async fn try_create(&self, new: NewTask) -> Result<Option<Value>, ServiceError> {
        let mut file_id = None;
        if let Some(first) = new.files.first() {
            let created = self
                .files
                .create(NewFileRecord {
                    file_name: first.name().to_string(),
                    file_type: first.file_type().to_string(),
                    file_size: first.size(),
                    files: new.files.clone(),
                    tags: None,
                })
                .await;
            file_id = created.and_then(|record| record.get("Id").cloned());
        }

        let mut record = json!({
            "Name": new.title,
            "title_c": new.title,
            "description_c": new.description,
            "priority_c": new.priority,
            "status_c": new.status,
            "Tags": new.tags.unwrap_or_default(),
        });
        if let Some(id) = file_id {
            record["file_id_c"] = id;
        }

        let response = self.client.create_record(TABLE, vec![record]).await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "create failed".to_string());
            self.notifier.error(&message);
            return Err(ServiceError::RequestRejected { message });
        }
        let successful = successful_results(
            response.results.unwrap_or_default(),
            self.notifier.as_ref(),
            "create task",
        );
        Ok(successful.into_iter().next().and_then(|r| r.data))
    }

    /// Apply a partial update. Returns the updated record or `None`.
    pub async fn update(&self, task_id: i64, updates: TaskUpdates) -> Option<Value> {
        match self.try_update(task_id, updates).await {
            Ok(record) => record,
            Err(err) => {
                error!(error = %err, task_id, "error updating task");
                None
            }
        }
    }

    async fn try_update(
        &self,
        task_id: i64,
        updates: TaskUpdates,
    ) -> Result<Option<Value>, ServiceError> {
        let mut record = Map::new();
        record.insert("Id".to_string(), json!(task_id));
        if let Some(title) = updates.title {
            // The display name tracks the title.
            record.insert("Name".to_string(), json!(title));
            record.insert("title_c".to_string(), json!(title));
        }
        if let Some(description) = updates.description {
            record.insert("description_c".to_string(), json!(description));
        }
        if let Some(priority) = updates.priority {
            record.insert("priority_c".to_string(), json!(priority));
        }
        if let Some(status) = updates.status {
            record.insert("status_c".to_string(), json!(status));
        }
        if let Some(tags) = updates.tags {
            record.insert("Tags".to_string(), json!(tags));
        }

        let response = self
            .client
            .update_record(TABLE, vec![Value::Object(record)])
            .await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "update failed".to_string());
            self.notifier.error(&message);
            return Err(ServiceError::RequestRejected { message });
        }
        let successful = successful_results(
            response.results.unwrap_or_default(),
            self.notifier.as_ref(),
            "update task",
        );
        Ok(successful.into_iter().next().and_then(|r| r.data))
    }

    /// Delete a task. Returns whether the delete took effect.
    pub async fn delete(&self, task_id: i64) -> bool {
        match self.try_delete(task_id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                error!(error = %err, task_id, "error deleting task");
                false
            }
        }
    }

    async fn try_delete(&self, task_id: i64) -> Result<bool, ServiceError> {
        let response = self.client.delete_record(TABLE, &[task_id]).await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "delete failed".to_string());
            self.notifier.error(&message);
            return Err(ServiceError::RequestRejected { message });
        }
        let successful = successful_results(
            response.results.unwrap_or_default(),
            self.notifier.as_ref(),
            "delete task",
        );
        Ok(!successful.is_empty())
    }
}
