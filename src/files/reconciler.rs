//! File-list reconciliation against a session baseline.
//!
//! On every change to the externally supplied file list the controller asks
//! the reconciler whether a host update is needed, comparing the new list
//! against the last list successfully applied to the mounted widget.

use crate::files::descriptor::{FileDescriptor, FileShape, ListShape, list_shape};
use crate::host::WidgetHost;
use tracing::warn;

/// What the controller must do to bring the widget in line with a new list.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileAction {
    /// New list structurally equals the baseline; nothing to apply.
    NoOp,
    /// Push this list (already in widget display shape where applicable).
    Replace(Vec<FileDescriptor>),
    /// New list is empty; clear the field.
    Clear,
}

/// Decide the host action for `new` given the session `baseline`.
///
/// Equality is structural and order-sensitive. Non-empty lists that are
/// uniformly API-shaped are converted to the widget display shape through
/// the host's converter before being emitted; UI-shaped lists pass through
/// unchanged. Mixed-shape lists are unsupported input — they pass through
/// unconverted with a warning rather than being half-converted.
pub fn reconcile(
    new: &[FileDescriptor],
    baseline: &[FileDescriptor],
    host: &dyn WidgetHost,
) -> ReconcileAction {
    if new == baseline {
        return ReconcileAction::NoOp;
    }

    match list_shape(new) {
        ListShape::Empty => ReconcileAction::Clear,
        ListShape::Uniform(FileShape::Api) => ReconcileAction::Replace(host.to_ui_format(new)),
        ListShape::Uniform(FileShape::Ui) => ReconcileAction::Replace(new.to_vec()),
        ListShape::Mixed => {
            warn!(
                files = new.len(),
                "mixed-shape file list is unsupported; passing through unconverted"
            );
            ReconcileAction::Replace(new.to_vec())
        }
    }
}
