//! Deployment operation tracking

pub mod events;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod source;
pub mod tracker;

pub use events::TrackerEvent;
pub use session::{PollSession, SessionState};
pub use source::DeploymentSource;
pub use tracker::{DeployTracker, Options, TrackerHandle};
