//! Widget-host collaborator contract.
//!
//! The hosted uploader SDK is modeled as an explicit injected dependency
//! rather than ambient global state: the controller receives a
//! [`HostProvider`] it can probe for presence, and once the script has
//! loaded, an [`Arc<dyn WidgetHost>`] handle it drives for the rest of the
//! session.

use crate::files::FileDescriptor;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration bag passed to the host at mount time.
///
/// Opaque to the controller apart from `field_key` and `existing_files`;
/// everything else rides along in `options` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Logical identifier grouping this field's files, independent of the
    /// anchor the widget binds to.
    pub field_key: String,
    /// Files already attached to the field when the widget mounts.
    #[serde(default)]
    pub existing_files: Vec<FileDescriptor>,
    /// Pass-through host options (labels, accept filters, limits, ...).
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl WidgetConfig {
    /// Create a config for a field with no pre-attached files.
    pub fn new(field_key: impl Into<String>) -> Self {
        Self {
            field_key: field_key.into(),
            existing_files: Vec::new(),
            options: serde_json::Map::new(),
        }
    }

    /// Set the initial file list.
    pub fn with_existing_files(mut self, files: Vec<FileDescriptor>) -> Self {
        self.existing_files = files;
        self
    }

    /// Set an opaque host option.
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// The file-field API the hosted SDK exposes once loaded.
///
/// All lifecycle calls are fallible and asynchronous; the converters are
/// pure. Implementations must tolerate `unmount` on an anchor that is not
/// mounted (treat it as a no-op or fail — the controller logs and continues
/// either way).
#[async_trait]
pub trait WidgetHost: Send + Sync {
    /// Bind a widget instance to `anchor`. Fails if the anchor is already
    /// mounted or the config is invalid.
    async fn mount(&self, anchor: &str, config: &WidgetConfig) -> Result<()>;

    /// Release the widget instance bound to `anchor`.
    async fn unmount(&self, anchor: &str) -> Result<()>;

    /// Replace the file list shown for `field_key`.
    async fn update_files(&self, field_key: &str, files: &[FileDescriptor]) -> Result<()>;

    /// Remove all files shown for `field_key`.
    async fn clear_field(&self, field_key: &str) -> Result<()>;

    /// Convert records to the widget's display shape.
    fn to_ui_format(&self, files: &[FileDescriptor]) -> Vec<FileDescriptor> {
        files.iter().cloned().map(FileDescriptor::into_ui).collect()
    }

    /// Convert records to the shape the backend accepts on create.
    fn to_create_format(&self, files: &[FileDescriptor]) -> Vec<FileDescriptor> {
        files.iter().cloned().map(FileDescriptor::into_api).collect()
    }
}

impl std::fmt::Debug for dyn WidgetHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn WidgetHost")
    }
}

/// Probe for widget-host presence.
///
/// Models "has the SDK script finished loading yet": returns `None` until
/// the host object exists, then a usable handle. The poller calls this once
/// per attempt; implementations should be cheap and non-blocking.
pub trait HostProvider: Send + Sync {
    fn get(&self) -> Option<Arc<dyn WidgetHost>>;
}

impl<F> HostProvider for F
where
    F: Fn() -> Option<Arc<dyn WidgetHost>> + Send + Sync,
{
    fn get(&self) -> Option<Arc<dyn WidgetHost>> {
        self()
    }
}

/// A provider for a host that is already loaded.
pub fn ready(host: Arc<dyn WidgetHost>) -> impl HostProvider {
    move || Some(host.clone())
}
