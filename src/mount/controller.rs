//! Field controller: owns the lifecycle of one widget instance.
//!
//! The controller runs as a spawned driver task. Callers hold a
//! [`FieldHandle`]: commands (file-list sync, rebind, shutdown) go in over
//! an mpsc channel, lifecycle state comes back over a watch channel, and
//! notable occurrences are optionally reported on an event channel.
//!
//! Ordering guarantees (all enforced by the driver being a single
//! sequential task):
//! - no update is issued before the mount for the same session completes;
//! - unmount is issued at most once per session, and only if the mount
//!   succeeded;
//! - a rebind unmounts the prior anchor before the new polling cycle
//!   starts;
//! - teardown during polling drops the poll future before any mount call
//!   can be issued.

use crate::config::ControllerConfig;
use crate::errors::FieldError;
use crate::files::{FileDescriptor, ReconcileAction, reconcile};
use crate::host::{HostProvider, WidgetHost};
use crate::mount::poller::HostPoller;
use crate::mount::session::MountSession;
use crate::mount::state::MountState;
use serde::{Deserialize, Serialize};
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Events emitted during the widget lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldEvent {
    /// The host accepted the mount call.
    Mounted { anchor: String },
    /// A reconciled file list was pushed to the widget.
    FilesUpdated { field_key: String, count: usize },
    /// The field was cleared.
    FieldCleared { field_key: String },
    /// An update or clear call was rejected. Non-terminal: the baseline is
    /// not advanced, so the next sync retries the same delta.
    UpdateFailed { field_key: String, message: String },
    /// The host rejected the unmount. Logged only; teardown continues.
    UnmountFailed { anchor: String, message: String },
    /// The anchor was released.
    Unmounted { anchor: String },
}

/// Commands accepted by the driver task.
enum Command {
    SyncFiles(Vec<FileDescriptor>),
    Rebind(ControllerConfig),
    Shutdown,
}

/// How a cycle ended, from the driver loop's point of view.
enum CycleEnd {
    Rebind(ControllerConfig),
    Shutdown,
}

/// Builder for a spawned field controller.
///
/// At most one live session exists per anchor: the controller only ever
/// drives the anchor derived from its current config, and mounting two
/// controllers onto the same anchor is rejected by the host's own
/// already-mounted check.
pub struct FieldController {
    provider: Arc<dyn HostProvider>,
    config: ControllerConfig,
    event_tx: Option<mpsc::Sender<FieldEvent>>,
}

impl FieldController {
    /// Create a controller for one anchor, with the host injected via
    /// `provider`.
    pub fn new(provider: Arc<dyn HostProvider>, config: ControllerConfig) -> Self {
        Self {
            provider,
            config,
            event_tx: None,
        }
    }

    /// Set the event channel for lifecycle notifications.
    pub fn with_event_channel(mut self, tx: mpsc::Sender<FieldEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Spawn the driver task and return the caller-side handle.
    pub fn spawn(self) -> FieldHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(MountState::Idle);
        let driver = Driver {
            provider: self.provider,
            config: self.config,
            cmd_rx,
            state_tx,
            event_tx: self.event_tx,
            pending: None,
        };
        let task = tokio::spawn(driver.run());
        FieldHandle {
            cmd_tx,
            state_rx,
            task,
        }
    }
}

/// Caller-side handle to a running field controller.
pub struct FieldHandle {
    cmd_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<MountState>,
    task: JoinHandle<()>,
}

impl FieldHandle {
    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<MountState> {
        self.state_rx.clone()
    }

    /// Snapshot of the current lifecycle state.
    pub fn current_state(&self) -> MountState {
        self.state_rx.borrow().clone()
    }

    /// Report a change to the externally supplied file list.
    ///
    /// Applied immediately when the session is ready; otherwise queued
    /// last-writer-wins and reconciled against the baseline once it is.
    /// Ignored if the controller has already shut down.
    pub async fn sync_files(&self, files: Vec<FileDescriptor>) {
        let _ = self.cmd_tx.send(Command::SyncFiles(files)).await;
    }

    /// Re-point the controller at a new element id / field key.
    ///
    /// The prior anchor (if mounted) is unmounted before the new polling
    /// cycle begins.
    pub async fn rebind(&self, config: ControllerConfig) {
        let _ = self.cmd_tx.send(Command::Rebind(config)).await;
    }

    /// Tear the controller down, issuing the best-effort unmount if a
    /// session is live, and wait for the driver to finish.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown).await;
        let _ = self.task.await;
    }
}

struct Driver {
    provider: Arc<dyn HostProvider>,
    config: ControllerConfig,
    cmd_rx: mpsc::Receiver<Command>,
    state_tx: watch::Sender<MountState>,
    event_tx: Option<mpsc::Sender<FieldEvent>>,
    /// File list received while no session was ready. Last writer wins.
    pending: Option<Vec<FileDescriptor>>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            match self.run_cycle().await {
                CycleEnd::Rebind(config) => {
                    debug!(element_id = %config.element_id, "rebinding to new identity");
                    self.config = config;
                }
                CycleEnd::Shutdown => {
                    self.set_state(MountState::Unmounted);
                    return;
                }
            }
        }
    }

    /// One full lifecycle for the current identity: poll, mount, serve
    /// updates, unmount. Returns when superseded or torn down.
    async fn run_cycle(&mut self) -> CycleEnd {
        self.set_state(MountState::Polling);
        let poller = HostPoller::new(self.config.poll);
        let provider = Arc::clone(&self.provider);

        let host = {
            let mut wait = pin!(poller.wait(provider.as_ref()));
            loop {
                tokio::select! {
                    res = &mut wait => match res {
                        Ok(host) => break host,
                        Err(err) => {
                            error!(error = %err, "widget host never became available");
                            return self.park(err).await;
                        }
                    },
                    cmd = self.cmd_rx.recv() => match cmd {
                        Some(Command::SyncFiles(files)) => self.pending = Some(files),
                        // Dropping `wait` here is the cancellation point: no
                        // further probe or mount can run for this cycle.
                        Some(Command::Rebind(config)) => return CycleEnd::Rebind(config),
                        Some(Command::Shutdown) | None => return CycleEnd::Shutdown,
                    },
                }
            }
        };

        self.set_state(MountState::Mounting);
        if let Some(files) = self.pending.take() {
            self.config.widget.existing_files = files;
        }
        let anchor = self.config.anchor();
        if let Err(source) = host.mount(&anchor, &self.config.widget).await {
            let err = FieldError::MountFailed { anchor, source };
            error!(error = %err, "mount failed");
            return self.park(err).await;
        }
        debug!(anchor = %anchor, field_key = %self.config.widget.field_key, "widget mounted");
        self.emit(FieldEvent::Mounted {
            anchor: anchor.clone(),
        })
        .await;

        let mut session = MountSession::new(
            anchor,
            self.config.widget.field_key.clone(),
            self.config.widget.existing_files.clone(),
        );
        self.set_state(MountState::Ready);

        // A list that raced in while the mount was in flight is applied now,
        // reconciled against the fresh baseline.
        if let Some(files) = self.pending.take() {
            self.apply(host.as_ref(), &mut session, files).await;
        }

        loop {
            match self.cmd_rx.recv().await {
                Some(Command::SyncFiles(files)) => {
                    self.apply(host.as_ref(), &mut session, files).await;
                }
                Some(Command::Rebind(config)) => {
                    self.unmount(host.as_ref(), session).await;
                    return CycleEnd::Rebind(config);
                }
                Some(Command::Shutdown) | None => {
                    self.unmount(host.as_ref(), session).await;
                    return CycleEnd::Shutdown;
                }
            }
        }
    }

    /// Park in the terminal error state until rebound or torn down.
    async fn park(&mut self, err: FieldError) -> CycleEnd {
        self.set_state(MountState::from_error(&err));
        loop {
            match self.cmd_rx.recv().await {
                Some(Command::SyncFiles(files)) => self.pending = Some(files),
                Some(Command::Rebind(config)) => return CycleEnd::Rebind(config),
                Some(Command::Shutdown) | None => return CycleEnd::Shutdown,
            }
        }
    }

    /// Reconcile `files` against the session baseline and push the delta.
    async fn apply(
        &mut self,
        host: &dyn WidgetHost,
        session: &mut MountSession,
        files: Vec<FileDescriptor>,
    ) {
        let field_key = session.field_key().to_string();
        match reconcile(&files, session.baseline(), host) {
            ReconcileAction::NoOp => {}
            ReconcileAction::Replace(converted) => {
                self.set_state(MountState::Updating);
                match host.update_files(&field_key, &converted).await {
                    Ok(()) => {
                        let count = converted.len();
                        session.advance_baseline(files);
                        self.emit(FieldEvent::FilesUpdated { field_key, count }).await;
                    }
                    Err(source) => {
                        let err = FieldError::UpdateFailed {
                            field_key: field_key.clone(),
                            source,
                        };
                        warn!(error = %err, "update failed; baseline not advanced");
                        self.emit(FieldEvent::UpdateFailed {
                            field_key,
                            message: err.to_string(),
                        })
                        .await;
                    }
                }
                self.set_state(MountState::Ready);
            }
            ReconcileAction::Clear => {
                self.set_state(MountState::Updating);
                match host.clear_field(&field_key).await {
                    Ok(()) => {
                        session.advance_baseline(Vec::new());
                        self.emit(FieldEvent::FieldCleared { field_key }).await;
                    }
                    Err(source) => {
                        let err = FieldError::UpdateFailed {
                            field_key: field_key.clone(),
                            source,
                        };
                        warn!(error = %err, "clear failed; baseline not advanced");
                        self.emit(FieldEvent::UpdateFailed {
                            field_key,
                            message: err.to_string(),
                        })
                        .await;
                    }
                }
                self.set_state(MountState::Ready);
            }
        }
    }

    /// Release the session's anchor. Failures are logged and swallowed so
    /// they never block teardown.
    async fn unmount(&mut self, host: &dyn WidgetHost, session: MountSession) {
        self.set_state(MountState::Unmounting);
        let anchor = session.anchor().to_string();
        if let Err(source) = host.unmount(&anchor).await {
            let err = FieldError::UnmountFailed {
                anchor: anchor.clone(),
                source,
            };
            warn!(error = %err, "unmount failed; continuing teardown");
            self.emit(FieldEvent::UnmountFailed {
                anchor: anchor.clone(),
                message: err.to_string(),
            })
            .await;
        }
        self.emit(FieldEvent::Unmounted { anchor }).await;
    }

    fn set_state(&self, state: MountState) {
        self.state_tx.send_replace(state);
    }

    async fn emit(&self, event: FieldEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WidgetConfig;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Host fake that records every lifecycle call.
    #[derive(Default)]
    struct RecordingHost {
        calls: Mutex<Vec<String>>,
        fail_mount: AtomicBool,
        fail_updates: AtomicU32,
        fail_unmount: AtomicBool,
    }

    impl RecordingHost {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl WidgetHost for RecordingHost {
        async fn mount(&self, anchor: &str, config: &WidgetConfig) -> Result<()> {
            self.record(format!(
                "mount:{anchor}:{}:{}",
                config.field_key,
                config.existing_files.len()
            ));
            if self.fail_mount.load(Ordering::SeqCst) {
                return Err(anyhow!("anchor rejected"));
            }
            Ok(())
        }

        async fn unmount(&self, anchor: &str) -> Result<()> {
            self.record(format!("unmount:{anchor}"));
            if self.fail_unmount.load(Ordering::SeqCst) {
                return Err(anyhow!("host gone"));
            }
            Ok(())
        }

        async fn update_files(&self, field_key: &str, files: &[FileDescriptor]) -> Result<()> {
            self.record(format!("update:{field_key}:{}", files.len()));
            if self.fail_updates.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    n.checked_sub(1)
                })
                .is_ok()
            {
                return Err(anyhow!("update rejected"));
            }
            Ok(())
        }

        async fn clear_field(&self, field_key: &str) -> Result<()> {
            self.record(format!("clear:{field_key}"));
            Ok(())
        }
    }

    fn controller_for(host: Arc<RecordingHost>, element_id: &str) -> FieldHandle {
        let provider = crate::host::ready(host);
        let config = ControllerConfig::new(element_id, WidgetConfig::new("files_c"));
        FieldController::new(Arc::new(provider), config).spawn()
    }

    async fn wait_ready(handle: &FieldHandle) {
        let mut state = handle.state();
        state
            .wait_for(|s| s.is_ready() || s.is_terminal())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mounts_with_derived_anchor_and_reaches_ready() {
        let host = Arc::new(RecordingHost::default());
        let handle = controller_for(host.clone(), "task-form");
        wait_ready(&handle).await;

        assert_eq!(handle.current_state(), MountState::Ready);
        assert_eq!(host.calls(), vec!["mount:file-uploader-task-form:files_c:0"]);

        handle.shutdown().await;
        assert_eq!(
            host.calls(),
            vec![
                "mount:file-uploader-task-form:files_c:0",
                "unmount:file-uploader-task-form",
            ]
        );
    }

    #[tokio::test]
    async fn teardown_during_polling_issues_no_host_calls() {
        let host = Arc::new(RecordingHost::default());
        let probed = Arc::new(AtomicU32::new(0));
        let probed_by_provider = probed.clone();
        // Host never appears; every probe is counted.
        let provider = move || {
            probed_by_provider.fetch_add(1, Ordering::SeqCst);
            None::<Arc<dyn WidgetHost>>
        };
        let config = ControllerConfig::new("task-form", WidgetConfig::new("files_c"));
        let handle = FieldController::new(Arc::new(provider), config).spawn();

        let mut state = handle.state();
        state.wait_for(|s| *s == MountState::Polling).await.unwrap();
        handle.shutdown().await;

        // The poller probed at least once, but no mount was ever issued.
        assert!(probed.load(Ordering::SeqCst) >= 1);
        assert!(host.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn list_synced_during_polling_rides_into_the_mount_config() {
        let host = Arc::new(RecordingHost::default());
        let host_for_provider = host.clone();
        let probes = Arc::new(AtomicU32::new(0));
        let probes_seen = probes.clone();
        // Absent for the first few probes so the sync lands mid-poll. The
        // queued command is always consumed before the paused clock advances
        // to the next probe.
        let provider = move || {
            if probes_seen.fetch_add(1, Ordering::SeqCst) >= 5 {
                Some(host_for_provider.clone() as Arc<dyn WidgetHost>)
            } else {
                None
            }
        };
        let config = ControllerConfig::new("task-form", WidgetConfig::new("files_c"));
        let handle = FieldController::new(Arc::new(provider), config).spawn();

        handle
            .sync_files(vec![FileDescriptor::ui(1, "a.txt", "text/plain", 4)])
            .await;
        wait_ready(&handle).await;

        // The queued list became the mount-time existing files; no separate
        // update call was needed.
        assert_eq!(host.calls(), vec!["mount:file-uploader-task-form:files_c:1"]);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn update_failure_keeps_session_ready_and_retries_the_delta() {
        let host = Arc::new(RecordingHost::default());
        host.fail_updates.store(1, Ordering::SeqCst);
        let handle = controller_for(host.clone(), "task-form");
        wait_ready(&handle).await;

        let files = vec![FileDescriptor::ui(1, "a.txt", "text/plain", 4)];
        handle.sync_files(files.clone()).await;
        // Same list again: the first attempt failed, so the baseline did not
        // advance and the delta is retried rather than reconciled away.
        handle.sync_files(files).await;
        handle.shutdown().await;

        assert_eq!(
            host.calls(),
            vec![
                "mount:file-uploader-task-form:files_c:0",
                "update:files_c:1",
                "update:files_c:1",
                "unmount:file-uploader-task-form",
            ]
        );
    }

    #[tokio::test]
    async fn unmount_failure_never_blocks_teardown() {
        let host = Arc::new(RecordingHost::default());
        host.fail_unmount.store(true, Ordering::SeqCst);
        let handle = controller_for(host.clone(), "task-form");
        wait_ready(&handle).await;

        let mut state = handle.state();
        handle.shutdown().await;
        state.wait_for(|s| *s == MountState::Unmounted).await.unwrap();
    }

    #[tokio::test]
    async fn mount_rejection_parks_in_error_without_unmount() {
        let host = Arc::new(RecordingHost::default());
        host.fail_mount.store(true, Ordering::SeqCst);
        let handle = controller_for(host.clone(), "task-form");

        let mut state = handle.state();
        let parked = state.wait_for(|s| s.is_terminal()).await.unwrap().clone();
        match parked {
            MountState::Error { message } => assert!(message.contains("anchor rejected")),
            other => panic!("expected Error, got {other:?}"),
        }

        handle.shutdown().await;
        // The failed mount is the only host call; no unmount is owed.
        assert_eq!(host.calls(), vec!["mount:file-uploader-task-form:files_c:0"]);
    }
}
