//! Typed error hierarchy for the file-field lifecycle core.
//!
//! Two top-level enums cover the two subsystems:
//! - `FieldError` — widget-host lifecycle failures (poll, mount, update, unmount)
//! - `ServiceError` — record-service boundary failures

use thiserror::Error;

/// Errors from the widget-host lifecycle subsystem.
///
/// `HostUnavailable` and `MountFailed` are terminal: the controller parks in
/// its `Error` state and never retries. `UpdateFailed` is non-terminal (the
/// session stays ready and the unapplied delta is retried on the next
/// reconcile). `UnmountFailed` is logged and swallowed at the call site; it
/// exists so the log line carries a typed cause.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(
        "ApperSDK not loaded after {attempts} attempts. Please ensure the SDK script is included before this component."
    )]
    HostUnavailable { attempts: u32 },

    #[error("Failed to mount file field at {anchor}: {source}")]
    MountFailed {
        anchor: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to update files for field {field_key}: {source}")]
    UpdateFailed {
        field_key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to unmount file field at {anchor}: {source}")]
    UnmountFailed {
        anchor: String,
        #[source]
        source: anyhow::Error,
    },
}

impl FieldError {
    /// Whether this failure parks the controller in its terminal `Error` state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::HostUnavailable { .. } | Self::MountFailed { .. }
        )
    }
}

/// Errors from the hosted-backend record services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("ApperClient not initialized")]
    ClientNotInitialized,

    #[error("ApperSDK not loaded")]
    HostNotLoaded,

    #[error("Record request rejected: {message}")]
    RequestRejected { message: String },

    #[error("Record {id} not found in {table}")]
    RecordNotFound { table: String, id: i64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
