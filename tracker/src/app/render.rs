//! Human-readable event output

use arm_models::{Deployment, Operation, ProvisioningState, Timestamp};
use colored::{ColoredString, Colorize};

use crate::track::TrackerEvent;

/// Format one tracker event as a single output line
pub fn render_event(event: &TrackerEvent) -> String {
    match event {
        TrackerEvent::Start(deployment) => format!(
            "Deployment {} {}",
            deployment.name.bold(),
            paint_state(deployment.provisioning_state())
        ),
        TrackerEvent::Operation(op) => render_operation(op),
        TrackerEvent::Done(deployment) => render_done(deployment),
        TrackerEvent::Error(e) => format!("{} {}", "error:".red().bold(), e),
    }
}

fn render_operation(op: &Operation) -> String {
    let props = &op.properties;
    let time = props
        .timestamp
        .as_ref()
        .and_then(Timestamp::to_utc)
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let (resource_type, resource_name) = props
        .target_resource
        .as_ref()
        .map(|target| {
            (
                target.resource_type.as_deref().unwrap_or("-"),
                target.resource_name.as_deref().unwrap_or("-"),
            )
        })
        .unwrap_or(("-", "-"));

    let mut line = format!(
        "{} {:<10} {} {}",
        time,
        paint_state(&props.provisioning_state),
        resource_type,
        resource_name
    );
    if let Some(status) = &props.status_code {
        line.push_str(&format!(" ({})", status));
    }
    line
}

fn render_done(deployment: &Deployment) -> String {
    let mut line = format!(
        "Deployment {} {}",
        deployment.name.bold(),
        paint_state(deployment.provisioning_state())
    );
    if let Some(duration) = &deployment.properties.duration {
        line.push_str(&format!(" in {}", duration));
    }
    line
}

fn paint_state(state: &ProvisioningState) -> ColoredString {
    let text = state.as_str();
    match state {
        ProvisioningState::Succeeded => text.green(),
        ProvisioningState::Failed => text.red(),
        ProvisioningState::Canceled => text.yellow(),
        ProvisioningState::Accepted | ProvisioningState::Running => text.cyan(),
        ProvisioningState::Other(_) => text.normal(),
    }
}
