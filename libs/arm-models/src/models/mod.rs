//! API models

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource type carried by operations that launch a nested deployment
pub const NESTED_DEPLOYMENT_RESOURCE_TYPE: &str = "Microsoft.Resources/deployments";

/// Provisioning state of a deployment or an operation.
///
/// The set of values is open: the service may report states this enum has
/// no dedicated variant for, which are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProvisioningState {
    Accepted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl ProvisioningState {
    pub fn as_str(&self) -> &str {
        match self {
            ProvisioningState::Accepted => "Accepted",
            ProvisioningState::Running => "Running",
            ProvisioningState::Succeeded => "Succeeded",
            ProvisioningState::Failed => "Failed",
            ProvisioningState::Canceled => "Canceled",
            ProvisioningState::Other(s) => s,
        }
    }

    /// Anything other than `Accepted` or `Running` is final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProvisioningState::Accepted | ProvisioningState::Running)
    }
}

impl From<String> for ProvisioningState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Accepted" => ProvisioningState::Accepted,
            "Running" => ProvisioningState::Running,
            "Succeeded" => ProvisioningState::Succeeded,
            "Failed" => ProvisioningState::Failed,
            "Canceled" => ProvisioningState::Canceled,
            _ => ProvisioningState::Other(s),
        }
    }
}

impl From<&str> for ProvisioningState {
    fn from(s: &str) -> Self {
        ProvisioningState::from(s.to_string())
    }
}

impl From<ProvisioningState> for String {
    fn from(state: ProvisioningState) -> Self {
        match state {
            ProvisioningState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats accepted for timestamps that carry no UTC offset
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Timestamp reported by the service.
///
/// The raw value is kept as sent. Values without an offset are read as UTC;
/// values that cannot be read at all still deserialize and order after one
/// another by their raw text, before any readable timestamp.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Timestamp {
    parsed: Option<DateTime<Utc>>,
    raw: String,
}

impl Timestamp {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        self.parsed
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

impl From<String> for Timestamp {
    fn from(raw: String) -> Self {
        Timestamp {
            parsed: parse_timestamp(&raw),
            raw,
        }
    }
}

impl From<&str> for Timestamp {
    fn from(raw: &str) -> Self {
        Timestamp::from(raw.to_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(ts: DateTime<Utc>) -> Self {
        Timestamp {
            parsed: Some(ts),
            raw: ts.to_rfc3339(),
        }
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.raw
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A template deployment in a resource group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub properties: DeploymentProperties,
}

impl Deployment {
    pub fn provisioning_state(&self) -> &ProvisioningState {
        &self.properties.provisioning_state
    }

    pub fn is_done(&self) -> bool {
        self.properties.provisioning_state.is_terminal()
    }
}

/// Deployment properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProperties {
    pub provisioning_state: ProvisioningState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// `Incremental` or `Complete`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// ISO 8601 duration, e.g. `PT1M12.5S`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// One step of a deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    pub properties: OperationProperties,
}

impl Operation {
    /// Name of the nested deployment this operation launched, if it is a
    /// nested deployment marker.
    ///
    /// Returns `Some(None)` for a marker that does not name its deployment.
    pub fn nested_deployment(&self) -> Option<Option<&str>> {
        self.properties
            .target_resource
            .as_ref()
            .filter(|target| target.is_nested_deployment())
            .map(|target| target.resource_name.as_deref())
    }

    pub fn is_nested_deployment(&self) -> bool {
        self.nested_deployment().is_some()
    }
}

/// Operation properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationProperties {
    pub provisioning_state: ProvisioningState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,

    /// HTTP status name reported by the resource provider, e.g. `Created`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_resource: Option<TargetResource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// Resource an operation acted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

impl TargetResource {
    pub fn is_nested_deployment(&self) -> bool {
        self.resource_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(NESTED_DEPLOYMENT_RESOURCE_TYPE))
    }
}

/// One page of a deployment operations listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationListPage {
    #[serde(default)]
    pub value: Vec<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}
