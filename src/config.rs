//! Configuration for the field controller.

use crate::host::WidgetConfig;
use std::time::Duration;

/// Namespace prefix for widget anchor ids, matching the DOM container id
/// the presentation layer renders.
pub const ANCHOR_PREFIX: &str = "file-uploader-";

/// Bounded polling policy for widget-host readiness.
///
/// The defaults give a 5 second total wait: 50 attempts at 100ms apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of presence checks before giving up.
    pub max_attempts: u32,
    /// Fixed delay between presence checks.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            interval: Duration::from_millis(100),
        }
    }
}

impl PollPolicy {
    /// Total wall-clock time the poller can spend before failing.
    pub fn total_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Configuration for one [`FieldController`](crate::mount::FieldController)
/// instance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Caller-supplied element identity the widget binds to.
    pub element_id: String,
    /// Widget configuration passed to the host at mount time.
    pub widget: WidgetConfig,
    /// Readiness polling policy.
    pub poll: PollPolicy,
}

impl ControllerConfig {
    /// Create a controller config with the default poll policy.
    pub fn new(element_id: impl Into<String>, widget: WidgetConfig) -> Self {
        Self {
            element_id: element_id.into(),
            widget,
            poll: PollPolicy::default(),
        }
    }

    /// Override the poll policy.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Derive the session anchor id from the element identity.
    ///
    /// Deterministic: the same element id always yields the same anchor.
    pub fn anchor(&self) -> String {
        format!("{}{}", ANCHOR_PREFIX, self.element_id)
    }
}
