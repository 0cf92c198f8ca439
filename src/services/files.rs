//! File record service: CRUD against the `files_c` record kind.

use crate::errors::ServiceError;
use crate::files::FileDescriptor;
use crate::host::HostProvider;
use crate::services::records::{QueryParams, RecordClient, SortOrder};
use crate::services::{Notifier, successful_results};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::error;

const TABLE: &str = "files_c";

const FIELDS: &[&str] = &[
    "Name",
    "file_name_c",
    "file_type_c",
    "file_size_c",
    "upload_date_c",
    "files_c",
    "Tags",
];

/// Input for creating a file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    /// Attachments in either shape; converted to the backend create shape
    /// through the host converter.
    pub files: Vec<FileDescriptor>,
    pub tags: Option<String>,
}

/// Request/response mapper for file records.
///
/// All operations degrade to a null/empty sentinel on failure; errors the
/// user should see go through the [`Notifier`], everything else is logged.
pub struct FileService {
    client: Arc<dyn RecordClient>,
    provider: Arc<dyn HostProvider>,
    notifier: Arc<dyn Notifier>,
}

impl FileService {
    pub fn new(
        client: Arc<dyn RecordClient>,
        provider: Arc<dyn HostProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            provider,
            notifier,
        }
    }

    /// Fetch all file records, newest first.
    pub async fn get_all(&self) -> Vec<Value> {
        match self.try_get_all().await {
            Ok(records) => records,
            Err(err) => {
                error!(error = %err, "error fetching files");
                Vec::new()
            }
        }
    }

    async fn try_get_all(&self) -> Result<Vec<Value>, ServiceError> {
        let params = QueryParams::fields(FIELDS).order_by("CreatedOn", SortOrder::Desc);
        let response = self.client.fetch_records(TABLE, &params).await?;
        Ok(response.data.unwrap_or_default())
    }

    /// Fetch one file record by id.
    pub async fn get_by_id(&self, file_id: i64) -> Option<Value> {
        let params = QueryParams::fields(FIELDS);
        match self.client.get_record_by_id(TABLE, file_id, &params).await {
            Ok(response) => response.data,
            Err(err) => {
                error!(error = %err, file_id, "error fetching file");
                None
            }
        }
    }

    /// Create a file record, returning the created record or `None`.
    pub async fn create(&self, new: NewFileRecord) -> Option<Value> {
        match self.try_create(new).await {
            Ok(record) => record,
            Err(err) => {
                error!(error = %err, "error creating file");
                None
            }
        }
    }

    async fn try_create(&self, new: NewFileRecord) -> Result<Option<Value>, ServiceError> {
        // The attachment payload must be in the backend create shape.
        let host = self.provider.get().ok_or(ServiceError::HostNotLoaded)?;
        let converted = host.to_create_format(&new.files);

        let record = json!({
            "Name": new.file_name,
            "file_name_c": new.file_name,
            "file_type_c": new.file_type,
            "file_size_c": new.file_size,
            "upload_date_c": Utc::now().to_rfc3339(),
            "files_c": converted,
            "Tags": new.tags.unwrap_or_default(),
        });

        let response = self.client.create_record(TABLE, vec![record]).await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "create failed".to_string());
            self.notifier.error(&message);
            return Err(ServiceError::RequestRejected { message });
        }

        let successful = successful_results(
            response.results.unwrap_or_default(),
            self.notifier.as_ref(),
            "create file",
        );
        Ok(successful.into_iter().next().and_then(|r| r.data))
    }

    /// Delete a file record. Returns whether the delete took effect.
    pub async fn delete(&self, file_id: i64) -> bool {
        match self.try_delete(file_id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                error!(error = %err, file_id, "error deleting file");
                false
            }
        }
    }

    async fn try_delete(&self, file_id: i64) -> Result<bool, ServiceError> {
        let response = self.client.delete_record(TABLE, &[file_id]).await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "delete failed".to_string());
            self.notifier.error(&message);
            return Err(ServiceError::RequestRejected { message });
        }
        let successful = successful_results(
            response.results.unwrap_or_default(),
            self.notifier.as_ref(),
            "delete file",
        );
        Ok(!successful.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{WidgetConfig, WidgetHost};
    use crate::services::records::{FetchResponse, MutationResponse, SingleResponse};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct InertHost;

    #[async_trait]
    impl WidgetHost for InertHost {
        async fn mount(&self, _: &str, _: &WidgetConfig) -> Result<()> {
            Ok(())
        }
        async fn unmount(&self, _: &str) -> Result<()> {
            Ok(())
        }
        async fn update_files(&self, _: &str, _: &[FileDescriptor]) -> Result<()> {
            Ok(())
        }
        async fn clear_field(&self, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CollectingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for CollectingNotifier {
        fn error(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    /// Record client scripted with canned responses.
    struct ScriptedClient {
        create_response: serde_json::Value,
        requests: Mutex<Vec<(String, serde_json::Value)>>,
    }

    #[async_trait]
    impl RecordClient for ScriptedClient {
        async fn fetch_records(&self, table: &str, params: &QueryParams) -> Result<FetchResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((table.to_string(), serde_json::to_value(params)?));
            Ok(serde_json::from_value(
                serde_json::json!({"success": true, "data": [{"Id": 1}]}),
            )?)
        }

        async fn get_record_by_id(
            &self,
            _table: &str,
            _id: i64,
            _params: &QueryParams,
        ) -> Result<SingleResponse> {
            Ok(serde_json::from_value(serde_json::json!({"data": {"Id": 1}}))?)
        }

        async fn create_record(
            &self,
            table: &str,
            records: Vec<serde_json::Value>,
        ) -> Result<MutationResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((table.to_string(), serde_json::Value::Array(records)));
            Ok(serde_json::from_value(self.create_response.clone())?)
        }

        async fn update_record(
            &self,
            _table: &str,
            _records: Vec<serde_json::Value>,
        ) -> Result<MutationResponse> {
            unimplemented!("file records are never updated")
        }

        async fn delete_record(&self, _table: &str, _ids: &[i64]) -> Result<MutationResponse> {
            Ok(serde_json::from_value(serde_json::json!({
                "success": true,
                "results": [{"success": true}]
            }))?)
        }
    }

    fn service(client: Arc<ScriptedClient>, notifier: Arc<CollectingNotifier>) -> FileService {
        let host: Arc<dyn WidgetHost> = Arc::new(InertHost);
        FileService::new(client, Arc::new(crate::host::ready(host)), notifier)
    }

    #[tokio::test]
    async fn get_all_queries_the_file_fields_newest_first() {
        let client = Arc::new(ScriptedClient {
            create_response: serde_json::json!({"success": true}),
            requests: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(CollectingNotifier::default());
        let records = service(client.clone(), notifier).get_all().await;
        assert_eq!(records.len(), 1);

        let requests = client.requests.lock().unwrap();
        let (table, params) = &requests[0];
        assert_eq!(table, "files_c");
        assert_eq!(params["orderBy"][0]["fieldName"], "CreatedOn");
        assert_eq!(params["orderBy"][0]["sorttype"], "DESC");
    }

    #[tokio::test]
    async fn create_converts_attachments_and_returns_the_record() {
        let client = Arc::new(ScriptedClient {
            create_response: serde_json::json!({
                "success": true,
                "results": [{"success": true, "data": {"Id": 42}}]
            }),
            requests: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(CollectingNotifier::default());
        let created = service(client.clone(), notifier)
            .create(NewFileRecord {
                file_name: "report.pdf".into(),
                file_type: "application/pdf".into(),
                file_size: 2048,
                files: vec![FileDescriptor::ui(1, "report.pdf", "application/pdf", 2048)],
                tags: None,
            })
            .await;
        assert_eq!(created.unwrap()["Id"], 42);

        let requests = client.requests.lock().unwrap();
        let (_, records) = &requests[0];
        let record = &records[0];
        assert_eq!(record["file_name_c"], "report.pdf");
        // Attachment was converted to the backend create shape.
        assert_eq!(record["files_c"][0]["Id"], 1);
        assert!(record["upload_date_c"].is_string());
    }

    #[tokio::test]
    async fn partial_batch_failure_notifies_and_returns_none() {
        let client = Arc::new(ScriptedClient {
            create_response: serde_json::json!({
                "success": true,
                "results": [{
                    "success": false,
                    "message": "record invalid",
                    "errors": [{"fieldLabel": "Name", "message": "required"}]
                }]
            }),
            requests: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(CollectingNotifier::default());
        let created = service(client, notifier.clone())
            .create(NewFileRecord {
                file_name: "x".into(),
                file_type: "text/plain".into(),
                file_size: 1,
                files: Vec::new(),
                tags: None,
            })
            .await;
        assert!(created.is_none());

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.as_slice(), ["Name: required", "record invalid"]);
    }

    #[tokio::test]
    async fn create_without_host_degrades_to_none() {
        let client = Arc::new(ScriptedClient {
            create_response: serde_json::json!({"success": true}),
            requests: Mutex::new(Vec::new()),
        });
        let absent = Arc::new(|| None::<Arc<dyn WidgetHost>>);
        let service = FileService::new(
            client.clone(),
            absent,
            Arc::new(CollectingNotifier::default()),
        );
        let created = service
            .create(NewFileRecord {
                file_name: "x".into(),
                file_type: "text/plain".into(),
                file_size: 1,
                files: Vec::new(),
                tags: None,
            })
            .await;
        assert!(created.is_none());
        // The backend was never reached.
        assert!(client.requests.lock().unwrap().is_empty());
    }
}
