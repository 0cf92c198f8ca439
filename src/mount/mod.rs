//! Widget mount lifecycle: readiness polling, the controller state machine,
//! and the live session it maintains.

pub mod controller;
pub mod poller;
pub mod session;
pub mod state;

pub use controller::{FieldController, FieldEvent, FieldHandle};
pub use poller::HostPoller;
pub use session::MountSession;
pub use state::MountState;
