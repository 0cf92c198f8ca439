//! Hosted-backend record services.
//!
//! Thin request/response mappers over the backend's record CRUD API. These
//! are deliberately dumb: no caching, no retry. Failures come back as
//! null/empty sentinels, with user-facing notifications raised through a
//! [`Notifier`] for anything the user should see.

pub mod files;
pub mod records;
pub mod tasks;

pub use files::{FileService, NewFileRecord};
pub use records::{
    FieldIssue, FetchResponse, MutationResponse, QueryParams, RecordClient, RecordResult,
    SingleResponse, SortOrder,
};
pub use tasks::{NewTask, TaskService, TaskUpdates};

/// Sink for user-facing toast-style notifications.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Default notifier that routes messages to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::error!(target: "flowtrack::notify", "{message}");
    }
}

/// Split a mutation batch into its successful results, notifying the user
/// about every failed record's validation issues and message.
pub(crate) fn successful_results(
    results: Vec<records::RecordResult>,
    notifier: &dyn Notifier,
    action: &str,
) -> Vec<records::RecordResult> {
    let (successful, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.success);
    if !failed.is_empty() {
        tracing::error!(count = failed.len(), "failed to {action} records");
        for record in &failed {
            for issue in &record.errors {
                notifier.error(&issue.display());
            }
            if let Some(message) = &record.message {
                notifier.error(message);
            }
        }
    }
    successful
}
