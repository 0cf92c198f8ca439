//! File attachment data model and list reconciliation.

pub mod descriptor;
pub mod reconciler;

pub use descriptor::{FileDescriptor, FileShape, ListShape, list_shape};
pub use reconciler::{ReconcileAction, reconcile};
