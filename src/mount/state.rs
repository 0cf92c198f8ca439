//! Named lifecycle states for a field controller.
//!
//! The original lifecycle was implicit in a handful of mutable flags; here
//! it is an explicit state machine observable through a watch channel.

use serde::{Deserialize, Serialize};

/// Lifecycle state of one widget mount session.
///
/// Normal flow is `Idle → Polling → Mounting → Ready → (Updating → Ready)*
/// → Unmounting → Unmounted`. `Error` is reachable from `Polling` (host
/// never appeared) and `Mounting` (host rejected the mount) and is terminal:
/// the controller parks there until it is rebound to a new identity or torn
/// down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MountState {
    /// Controller created, no cycle started.
    #[default]
    Idle,
    /// Waiting for the widget host to become available.
    Polling,
    /// Host present, mount call in flight.
    Mounting,
    /// Widget mounted and in sync with the baseline.
    Ready,
    /// An update or clear call is in flight.
    Updating,
    /// Unmount call in flight during teardown or rebind.
    Unmounting,
    /// Torn down; no further host calls will be issued.
    Unmounted,
    /// Terminal failure (host unavailable or mount rejected).
    Error { message: String },
}

impl MountState {
    /// Terminal states accept no further lifecycle progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unmounted | Self::Error { .. })
    }

    /// Whether the widget is mounted and accepting updates.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Build the error state for a lifecycle failure.
    pub fn from_error(err: &crate::errors::FieldError) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }
}
