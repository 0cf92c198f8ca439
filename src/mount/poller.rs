//! Bounded readiness polling for the widget host.

use crate::config::PollPolicy;
use crate::errors::FieldError;
use crate::host::{HostProvider, WidgetHost};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::debug;

/// Polls a [`HostProvider`] until the host appears or the attempt budget is
/// exhausted.
///
/// Cancellation is structural: the controller races [`HostPoller::wait`]
/// against its command channel and drops the future on teardown or rebind,
/// so no check runs after the owning cycle is superseded.
#[derive(Debug, Clone, Copy)]
pub struct HostPoller {
    policy: PollPolicy,
}

impl HostPoller {
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// Wait for the host to become available.
    ///
    /// Checks presence immediately, then once per interval up to the attempt
    /// ceiling. Exhaustion is terminal for the caller: no automatic retry.
    pub async fn wait(
        &self,
        provider: &dyn HostProvider,
    ) -> Result<Arc<dyn WidgetHost>, FieldError> {
        if let Some(host) = provider.get() {
            return Ok(host);
        }
        for attempt in 1..=self.policy.max_attempts {
            sleep(self.policy.interval).await;
            if let Some(host) = provider.get() {
                debug!(attempt, "widget host became available");
                return Ok(host);
            }
        }
        Err(FieldError::HostUnavailable {
            attempts: self.policy.max_attempts,
        })
    }
}
