//! Live binding between an anchor and a mounted widget instance.

use crate::files::FileDescriptor;

/// One successful mount.
///
/// Created only after the host accepts a `mount` call and dropped when the
/// anchor is unmounted, so holding a session is the controller's proof that
/// exactly one unmount is owed for this anchor. The baseline is the file
/// list most recently applied to the widget (in its externally supplied,
/// unconverted shape) and is what future reconciles compare against.
#[derive(Debug)]
pub struct MountSession {
    anchor: String,
    field_key: String,
    baseline: Vec<FileDescriptor>,
}

impl MountSession {
    pub fn new(
        anchor: impl Into<String>,
        field_key: impl Into<String>,
        baseline: Vec<FileDescriptor>,
    ) -> Self {
        Self {
            anchor: anchor.into(),
            field_key: field_key.into(),
            baseline,
        }
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn field_key(&self) -> &str {
        &self.field_key
    }

    pub fn baseline(&self) -> &[FileDescriptor] {
        &self.baseline
    }

    /// Record a successfully applied file list as the new baseline.
    pub fn advance_baseline(&mut self, applied: Vec<FileDescriptor>) {
        self.baseline = applied;
    }
}
