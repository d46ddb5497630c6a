//! Deployment API client

use std::collections::HashSet;

use arm_models::{Deployment, Operation, OperationListPage};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::errors::TrackerError;
use crate::http::client::HttpClient;
use crate::track::source::DeploymentSource;

const DEPLOYMENTS_PATH: [&str; 3] = ["providers", "Microsoft.Resources", "deployments"];

impl HttpClient {
    fn deployment_url(
        &self,
        resource_group: &str,
        deployment_name: &str,
        tail: Option<&str>,
    ) -> Result<Url, TrackerError> {
        let mut segments: Vec<&str> = DEPLOYMENTS_PATH.to_vec();
        segments.push(deployment_name);
        segments.extend(tail);
        self.resource_group_url(resource_group, &segments)
    }

    /// Get a deployment
    pub async fn get_deployment(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Deployment, TrackerError> {
        let url = self.deployment_url(resource_group, deployment_name, None)?;
        self.get(url).await
    }

    /// List the operations of a deployment, following `nextLink` until the
    /// last page.
    ///
    /// A `nextLink` that leads back to a page already listed is an
    /// `InvalidResponse`.
    pub async fn list_operations(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Vec<Operation>, TrackerError> {
        let mut url = self.deployment_url(resource_group, deployment_name, Some("operations"))?;
        let mut visited = HashSet::new();
        let mut operations = Vec::new();

        loop {
            visited.insert(url.to_string());
            let page: OperationListPage = self.get(url).await?;
            operations.extend(page.value);

            let Some(link) = page.next_link.filter(|link| !link.is_empty()) else {
                break;
            };
            url = Url::parse(&link)?;
            if visited.contains(url.as_str()) {
                return Err(TrackerError::InvalidResponse(format!(
                    "operations of {} page back to an already listed page: {}",
                    deployment_name, url
                )));
            }
        }

        debug!(
            "Listed {} operations of {} in {} page(s)",
            operations.len(),
            deployment_name,
            visited.len()
        );
        Ok(operations)
    }
}

#[async_trait]
impl DeploymentSource for HttpClient {
    async fn get_deployment(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Deployment, TrackerError> {
        HttpClient::get_deployment(self, resource_group, deployment_name).await
    }

    async fn list_operations(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Vec<Operation>, TrackerError> {
        HttpClient::list_operations(self, resource_group, deployment_name).await
    }
}
