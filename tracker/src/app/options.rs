//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::http::client::ClientOptions;
use crate::storage::settings::Settings;
use crate::track::tracker;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Resource group holding the deployment
    pub resource_group: String,

    /// Deployment to track
    pub deployment_name: String,

    /// Resource manager client configuration
    pub client: ClientOptions,

    /// Tracker options
    pub tracker: tracker::Options,

    /// Wait for the deployment to appear instead of failing on 404
    pub await_creation: bool,

    /// Colourize event output
    pub color: bool,
}

impl AppOptions {
    /// Build options from the settings file; CLI overrides are applied by
    /// the caller on the returned value
    pub fn from_settings(
        settings: &Settings,
        resource_group: impl Into<String>,
        deployment_name: impl Into<String>,
        token: SecretString,
    ) -> Self {
        Self {
            resource_group: resource_group.into(),
            deployment_name: deployment_name.into(),
            client: ClientOptions {
                base_url: settings.arm.base_url.clone(),
                subscription_id: settings.arm.subscription_id.clone(),
                api_version: settings.arm.api_version.clone(),
                token,
                timeout: Duration::from_secs(settings.arm.timeout_secs),
            },
            tracker: tracker::Options {
                interval: Duration::from_millis(settings.poll_interval_ms),
                max_nesting_depth: settings.max_nesting_depth,
            },
            await_creation: false,
            color: true,
        }
    }
}
