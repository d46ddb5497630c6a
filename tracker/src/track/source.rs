//! Deployment status source

use std::sync::Arc;

use arm_models::{Deployment, Operation};
use async_trait::async_trait;

use crate::errors::TrackerError;

/// Read access to deployments and their operations.
///
/// Implementations own transport, authentication and any retrying; the
/// tracker treats every error returned here as fatal to the session.
#[async_trait]
pub trait DeploymentSource: Send + Sync {
    /// Fetch the current state of a deployment
    async fn get_deployment(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Deployment, TrackerError>;

    /// List all operations of a deployment, in the order the service returns them
    async fn list_operations(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Vec<Operation>, TrackerError>;
}

#[async_trait]
impl<S: DeploymentSource + ?Sized> DeploymentSource for Arc<S> {
    async fn get_deployment(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Deployment, TrackerError> {
        (**self).get_deployment(resource_group, deployment_name).await
    }

    async fn list_operations(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Vec<Operation>, TrackerError> {
        (**self).list_operations(resource_group, deployment_name).await
    }
}
