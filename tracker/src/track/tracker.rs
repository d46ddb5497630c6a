//! Deployment poller

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use arm_models::Deployment;
use futures::Stream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::errors::TrackerError;
use crate::track::events::TrackerEvent;
use crate::track::resolver::{resolve_operations, DEFAULT_MAX_NESTING_DEPTH};
use crate::track::session::{PollSession, SessionState};
use crate::track::source::DeploymentSource;

const EVENT_BUFFER: usize = 64;

/// Tracker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delay between poll cycles
    pub interval: Duration,

    /// Maximum number of nested deployment levels to follow
    pub max_nesting_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Poll a deployment until it finishes, fails or `shutdown_signal` resolves.
///
/// Events are sent on `events` in order. The shutdown signal is observed
/// while fetching, while sending a cycle's events and while waiting between
/// cycles; once it fires no further event is sent. A closed event channel is
/// treated the same way.
pub async fn run<S, Sl, F>(
    options: &Options,
    source: &S,
    resource_group: &str,
    deployment_name: &str,
    events: &mpsc::Sender<TrackerEvent>,
    sleep_fn: Sl,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> PollSession
where
    S: DeploymentSource + ?Sized,
    Sl: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Tracking deployment {}/{}", resource_group, deployment_name);
    let mut session = PollSession::new(resource_group, deployment_name);

    let fetched = tokio::select! {
        biased;
        _ = &mut shutdown_signal => return cancelled(session),
        result = source.get_deployment(resource_group, deployment_name) => result,
    };
    let deployment = match fetched {
        Ok(deployment) => deployment,
        Err(e) => return failed(session, e, events).await,
    };
    let start = match session.begin(deployment) {
        Ok(event) => event,
        Err(e) => return failed(session, e, events).await,
    };
    if events.send(start).await.is_err() {
        return cancelled(session);
    }

    loop {
        let name = session.deployment_name().to_string();
        debug!("Polling operations of {} (cycle {})", name, session.cycles() + 1);

        let resolved = tokio::select! {
            biased;
            _ = &mut shutdown_signal => return cancelled(session),
            result = resolve_operations(source, resource_group, &name, options.max_nesting_depth) => result,
        };
        let operations = match resolved {
            Ok(operations) => operations,
            Err(e) => return failed(session, e, events).await,
        };

        let cycle_events = match session.record_cycle(operations) {
            Ok(cycle_events) => cycle_events,
            Err(e) => return failed(session, e, events).await,
        };
        for event in cycle_events {
            let sent = tokio::select! {
                biased;
                _ = &mut shutdown_signal => return cancelled(session),
                sent = events.send(event) => sent,
            };
            if sent.is_err() {
                return cancelled(session);
            }
        }

        if session.state() == SessionState::Done {
            info!(
                "Deployment {} finished: {}",
                name,
                session
                    .deployment()
                    .map(|d| d.provisioning_state().to_string())
                    .unwrap_or_default()
            );
            return session;
        }

        tokio::select! {
            biased;
            _ = &mut shutdown_signal => return cancelled(session),
            _ = sleep_fn(options.interval) => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = &mut shutdown_signal => return cancelled(session),
            result = source.get_deployment(resource_group, deployment_name) => result,
        };
        let refreshed = match fetched {
            Ok(deployment) => session.refresh(deployment),
            Err(e) => Err(e),
        };
        if let Err(e) = refreshed {
            return failed(session, e, events).await;
        }
    }
}

async fn failed(
    mut session: PollSession,
    err: TrackerError,
    events: &mpsc::Sender<TrackerEvent>,
) -> PollSession {
    error!("Tracking {} failed: {}", session.deployment_name(), err);
    if let Some(event) = session.fail(err) {
        let _ = events.send(event).await;
    }
    session
}

fn cancelled(mut session: PollSession) -> PollSession {
    if session.cancel() {
        info!("Stopped tracking {}", session.deployment_name());
    }
    session
}

/// Starts poll sessions against a deployment source
pub struct DeployTracker<S: ?Sized> {
    source: Arc<S>,
    options: Options,
}

impl<S> DeployTracker<S>
where
    S: DeploymentSource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, options: Options) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Spawn a poll session for a deployment and return its handle
    pub fn start_polling(&self, resource_group: &str, deployment_name: &str) -> TrackerHandle {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (cancel_tx, mut cancel_rx) = broadcast::channel(1);

        let source = self.source.clone();
        let options = self.options.clone();
        let resource_group = resource_group.to_string();
        let deployment_name = deployment_name.to_string();

        let task = tokio::spawn(async move {
            run(
                &options,
                source.as_ref(),
                &resource_group,
                &deployment_name,
                &events_tx,
                tokio::time::sleep,
                Box::pin(async move {
                    let _ = cancel_rx.recv().await;
                }),
            )
            .await
        });

        TrackerHandle {
            events: events_rx,
            cancel: cancel_tx,
            task,
        }
    }
}

/// Handle to a running poll session.
///
/// Yields the session's events in order. Dropping the handle cancels the
/// session.
pub struct TrackerHandle {
    events: mpsc::Receiver<TrackerEvent>,
    cancel: broadcast::Sender<()>,
    task: JoinHandle<PollSession>,
}

impl TrackerHandle {
    /// Next event, or `None` once the session has ended
    pub async fn recv(&mut self) -> Option<TrackerEvent> {
        self.events.recv().await
    }

    /// Ask the session to stop; no event is sent after it takes effect
    pub fn cancel(&self) {
        let _ = self.cancel.send(());
    }

    /// Wait for the session to end, discarding unread events, and return
    /// its final state
    pub async fn join(self) -> Result<PollSession, TrackerError> {
        let TrackerHandle {
            mut events,
            cancel,
            task,
        } = self;

        while events.recv().await.is_some() {}
        let session = task
            .await
            .map_err(|e| TrackerError::Internal(e.to_string()))?;
        drop(cancel);
        Ok(session)
    }

    /// Wait for the terminal event, ignoring operation events
    pub async fn wait(mut self) -> Result<Deployment, TrackerError> {
        while let Some(event) = self.recv().await {
            match event {
                TrackerEvent::Done(deployment) => return Ok(deployment),
                TrackerEvent::Error(e) => return Err(e),
                TrackerEvent::Start(_) | TrackerEvent::Operation(_) => {}
            }
        }
        Err(TrackerError::Cancelled)
    }
}

impl Stream for TrackerHandle {
    type Item = TrackerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}
