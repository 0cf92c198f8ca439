//! Record CRUD wire contract for the hosted backend.
//!
//! Request and response envelopes mirror the backend's JSON shapes exactly
//! (`fields`/`orderBy`/`pagingInfo` on queries, per-record `results` on
//! mutations); the client itself is an injected collaborator.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One selected field: `{"field": {"Name": "title_c"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelector {
    pub field: FieldName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

impl FieldSelector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldName { name: name.into() },
        }
    }
}

/// Sort direction for `orderBy` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub sorttype: SortOrder,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// Query envelope for fetch/get requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryParams {
    pub fields: Vec<FieldSelector>,
    #[serde(rename = "orderBy", skip_serializing_if = "Vec::is_empty", default)]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo", skip_serializing_if = "Option::is_none", default)]
    pub paging_info: Option<PagingInfo>,
}

impl QueryParams {
    /// Select the given fields.
    pub fn fields(names: &[&str]) -> Self {
        Self {
            fields: names.iter().map(|n| FieldSelector::new(*n)).collect(),
            order_by: Vec::new(),
            paging_info: None,
        }
    }

    /// Order results by a field.
    pub fn order_by(mut self, field_name: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push(OrderBy {
            field_name: field_name.into(),
            sorttype: order,
        });
        self
    }

    /// Limit the result page.
    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }
}

fn default_true() -> bool {
    true
}

/// Response to a multi-record fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<serde_json::Value>>,
}

/// Response to a single-record lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct SingleResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// A per-record field validation issue.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldIssue {
    #[serde(rename = "fieldLabel", default)]
    pub field_label: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FieldIssue {
    /// User-facing rendering, `label: message`.
    pub fn display(&self) -> String {
        match (&self.field_label, &self.message) {
            (Some(label), Some(message)) => format!("{label}: {message}"),
            (Some(label), None) => label.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "field validation failed".to_string(),
        }
    }
}

/// Outcome for one record in a mutation batch.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<FieldIssue>,
}

/// Response to a create/update/delete request.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<RecordResult>>,
}

/// The backend record CRUD API, supplied externally.
#[async_trait]
pub trait RecordClient: Send + Sync {
    async fn fetch_records(&self, table: &str, params: &QueryParams) -> Result<FetchResponse>;

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        params: &QueryParams,
    ) -> Result<SingleResponse>;

    async fn create_record(
        &self,
        table: &str,
        records: Vec<serde_json::Value>,
    ) -> Result<MutationResponse>;

    async fn update_record(
        &self,
        table: &str,
        records: Vec<serde_json::Value>,
    ) -> Result<MutationResponse>;

    async fn delete_record(&self, table: &str, ids: &[i64]) -> Result<MutationResponse>;
}
