//! Nested deployment resolution
//!
//! A template may deploy other templates. The operations of such a nested
//! deployment are listed under their own deployment name, so the root list
//! only shows a single marker operation for each of them. Resolution walks
//! the tree depth first and splices every nested list in right after its
//! marker, ahead of the marker's later siblings.

use arm_models::Operation;
use tracing::{debug, trace};

use crate::errors::TrackerError;
use crate::track::source::DeploymentSource;

/// Default limit on how many levels of nested deployments are followed
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;

struct Frame {
    deployment_name: String,
    operations: std::vec::IntoIter<Operation>,
}

/// List the operations of a deployment and, transitively, of every nested
/// deployment it launched.
///
/// Markers are kept in the output. Any fetch error aborts the whole
/// resolution. A nested deployment deeper than `max_depth` levels, or one
/// that names a deployment already on its ancestor chain, is an error.
pub async fn resolve_operations<S>(
    source: &S,
    resource_group: &str,
    deployment_name: &str,
    max_depth: usize,
) -> Result<Vec<Operation>, TrackerError>
where
    S: DeploymentSource + ?Sized,
{
    let root = source.list_operations(resource_group, deployment_name).await?;

    let mut resolved = Vec::with_capacity(root.len());
    let mut stack = vec![Frame {
        deployment_name: deployment_name.to_string(),
        operations: root.into_iter(),
    }];

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };
        let Some(op) = frame.operations.next() else {
            stack.pop();
            continue;
        };

        let nested = match op.nested_deployment() {
            None => None,
            Some(Some(name)) => Some(name.to_string()),
            Some(None) => {
                return Err(TrackerError::InvalidResponse(format!(
                    "operation {} targets a nested deployment without a resource name",
                    op.id
                )));
            }
        };
        resolved.push(op);

        let Some(nested) = nested else {
            continue;
        };

        if stack.iter().any(|frame| frame.deployment_name == nested) {
            return Err(TrackerError::NestedCycle(nested));
        }
        if stack.len() > max_depth {
            return Err(TrackerError::NestingTooDeep {
                deployment: nested,
                max_depth,
            });
        }

        debug!("Expanding nested deployment {} (depth {})", nested, stack.len());
        let operations = source.list_operations(resource_group, &nested).await?;
        trace!("Nested deployment {} has {} operations", nested, operations.len());

        stack.push(Frame {
            deployment_name: nested,
            operations: operations.into_iter(),
        });
    }

    Ok(resolved)
}
