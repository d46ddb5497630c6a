//! Tracker events

use arm_models::{Deployment, Operation};

use crate::errors::TrackerError;

/// Event emitted by a poll session.
///
/// A session emits one `Start`, any number of `Operation`s and then exactly
/// one of `Done` or `Error`. `Error` may also be the only event when the
/// initial fetch fails.
#[derive(Debug)]
pub enum TrackerEvent {
    /// The deployment was found and polling begins
    Start(Deployment),

    /// An operation appeared or changed state
    Operation(Operation),

    /// The deployment reached a terminal provisioning state
    Done(Deployment),

    /// The session failed
    Error(TrackerError),
}

impl TrackerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerEvent::Start(_) => "start",
            TrackerEvent::Operation(_) => "operation",
            TrackerEvent::Done(_) => "done",
            TrackerEvent::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackerEvent::Done(_) | TrackerEvent::Error(_))
    }
}
