//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use arm_models::Deployment;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::app::options::AppOptions;
use crate::app::render::render_event;
use crate::errors::TrackerError;
use crate::http::client::HttpClient;
use crate::http::poll::{poll_until, PollDecision};
use crate::track::{DeployTracker, TrackerEvent};

/// Track a deployment, printing every event, until it finishes, fails or
/// `shutdown_signal` resolves.
///
/// Returns the final deployment when a `done` event was received.
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<Deployment, TrackerError> {
    if !options.color {
        colored::control::set_override(false);
    }

    let client = Arc::new(HttpClient::new(&options.client)?);

    // Forward the external signal so that every stage can subscribe to it
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    let forwarder = {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            shutdown_signal.await;
            info!("Shutdown signal received, cancelling...");
            let _ = shutdown_tx.send(());
        })
    };

    let result = async {
        if options.await_creation {
            await_creation(client.as_ref(), &options, shutdown_tx.subscribe()).await?;
        }
        track(client, &options, &mut shutdown_rx).await
    }
    .await;

    forwarder.abort();
    result
}

async fn track(
    client: Arc<HttpClient>,
    options: &AppOptions,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Result<Deployment, TrackerError> {
    let tracker = DeployTracker::new(client, options.tracker.clone());
    let mut handle = tracker.start_polling(&options.resource_group, &options.deployment_name);

    let mut outcome = Err(TrackerError::Cancelled);
    let mut cancelled = false;
    loop {
        tokio::select! {
            event = handle.recv() => {
                let Some(event) = event else { break };
                println!("{}", render_event(&event));
                match event {
                    TrackerEvent::Done(deployment) => outcome = Ok(deployment),
                    TrackerEvent::Error(e) => outcome = Err(e),
                    TrackerEvent::Start(_) | TrackerEvent::Operation(_) => {}
                }
            }
            _ = shutdown_rx.recv(), if !cancelled => {
                handle.cancel();
                cancelled = true;
            }
        }
    }

    let session = handle.join().await?;
    debug!(
        "Session for {} ended {:?} after {} cycle(s), {} operation(s) seen",
        session.deployment_name(),
        session.state(),
        session.cycles(),
        session.snapshot().len()
    );
    outcome
}

async fn await_creation(
    client: &HttpClient,
    options: &AppOptions,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), TrackerError> {
    let resource_group = options.resource_group.as_str();
    let deployment_name = options.deployment_name.as_str();

    poll_until(
        options.tracker.interval,
        move || async move { client.get_deployment(resource_group, deployment_name).await },
        |result| match result {
            Ok(_) => PollDecision::Finish(()),
            Err(TrackerError::ApiError { status: 404, .. }) => {
                info!("Deployment {} does not exist yet, waiting...", deployment_name);
                PollDecision::Retry
            }
            Err(e) => PollDecision::Fail(e),
        },
        tokio::time::sleep,
        Box::pin(async move {
            let _ = shutdown_rx.recv().await;
        }),
    )
    .await
}
