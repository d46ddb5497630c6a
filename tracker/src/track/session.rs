//! Poll session state machine

use arm_models::{Deployment, Operation};
use serde::{Deserialize, Serialize};

use crate::errors::TrackerError;
use crate::track::events::TrackerEvent;
use crate::track::snapshot::OperationSnapshot;

/// Poll session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Waiting for the first deployment fetch
    Starting,

    /// Deployment found, operations are being polled
    Polling,

    /// Deployment reached a terminal provisioning state
    Done,

    /// A fetch failed
    Failed,

    /// Stopped by the caller
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Done | SessionState::Failed | SessionState::Cancelled
        )
    }
}

/// State owned by a single poll session: the latest deployment and the
/// snapshot of every operation reported so far.
#[derive(Debug, Clone)]
pub struct PollSession {
    resource_group: String,
    deployment_name: String,
    state: SessionState,
    deployment: Option<Deployment>,
    snapshot: OperationSnapshot,
    cycles: u32,
}

impl PollSession {
    /// Create a new session in starting state
    pub fn new(resource_group: impl Into<String>, deployment_name: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            deployment_name: deployment_name.into(),
            state: SessionState::Starting,
            deployment: None,
            snapshot: OperationSnapshot::new(),
            cycles: 0,
        }
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    /// Name of the deployment being tracked, as reported by the service once
    /// it has been fetched
    pub fn deployment_name(&self) -> &str {
        self.deployment
            .as_ref()
            .map(|d| d.name.as_str())
            .unwrap_or(&self.deployment_name)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn deployment(&self) -> Option<&Deployment> {
        self.deployment.as_ref()
    }

    pub fn snapshot(&self) -> &OperationSnapshot {
        &self.snapshot
    }

    /// Number of completed poll cycles
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Starting -> Polling with the first fetched deployment
    pub fn begin(&mut self, deployment: Deployment) -> Result<TrackerEvent, TrackerError> {
        self.expect_state(SessionState::Starting, "begin")?;

        self.deployment = Some(deployment.clone());
        self.state = SessionState::Polling;
        Ok(TrackerEvent::Start(deployment))
    }

    /// Replace the deployment with a freshly fetched one
    pub fn refresh(&mut self, deployment: Deployment) -> Result<(), TrackerError> {
        self.expect_state(SessionState::Polling, "refresh")?;

        self.deployment = Some(deployment);
        Ok(())
    }

    /// Record the resolved operation list of one cycle.
    ///
    /// Returns the events of the cycle in emission order: one `Operation` per
    /// new or changed operation, followed by `Done` if the current deployment
    /// is finished.
    pub fn record_cycle(
        &mut self,
        operations: Vec<Operation>,
    ) -> Result<Vec<TrackerEvent>, TrackerError> {
        self.expect_state(SessionState::Polling, "record_cycle")?;

        let deployment = self.deployment.as_ref().ok_or_else(|| {
            TrackerError::Internal("polling session without a deployment".to_string())
        })?;
        let done = deployment.is_done().then(|| deployment.clone());

        self.cycles += 1;
        let mut events: Vec<TrackerEvent> = self
            .snapshot
            .diff(operations)
            .into_iter()
            .map(TrackerEvent::Operation)
            .collect();

        if let Some(deployment) = done {
            self.state = SessionState::Done;
            events.push(TrackerEvent::Done(deployment));
        }

        Ok(events)
    }

    /// Move to `Failed`, yielding the error event.
    ///
    /// Returns `None` once the session is already terminal so that at most
    /// one terminal event is ever produced.
    pub fn fail(&mut self, err: TrackerError) -> Option<TrackerEvent> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = SessionState::Failed;
        Some(TrackerEvent::Error(err))
    }

    /// Move to `Cancelled`. Returns false if the session already ended.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = SessionState::Cancelled;
        true
    }

    fn expect_state(&self, expected: SessionState, action: &str) -> Result<(), TrackerError> {
        if self.state != expected {
            return Err(TrackerError::InvalidTransition(format!(
                "{} from {:?}",
                action, self.state
            )));
        }
        Ok(())
    }
}
