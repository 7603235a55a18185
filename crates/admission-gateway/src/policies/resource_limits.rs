use admission_review::{
    admission_request::{AdmissionRequest, GroupVersionResource},
    codec::ReviewCodec,
};
use k8s_openapi::api::core::v1::{Container, Pod};
use tracing::{Span, warn};

use super::quantity;
use crate::policy::{AdmissionPolicy, PolicyRejection, PolicyResult};

const CPU: &str = "cpu";
const MEMORY: &str = "memory";

/// Rejects Pods having containers without CPU or memory limits.
///
/// Containers are checked in declaration order, the CPU limit before the
/// memory one. The first violation found is reported.
pub struct ResourceLimitsPolicy {
    codec: ReviewCodec,
}

impl ResourceLimitsPolicy {
    pub fn new(codec: ReviewCodec) -> Self {
        ResourceLimitsPolicy { codec }
    }
}

impl AdmissionPolicy for ResourceLimitsPolicy {
    fn admit(&self, span: &Span, request: &AdmissionRequest) -> PolicyResult {
        // This policy should only get called on Pod objects. If it's called for
        // anything else, log a warning and admit the object, otherwise a broken
        // webhook configuration would block unrelated resources.
        if request.resource != pod_resource() {
            warn!(
                parent: span,
                resource_type = ?request.resource,
                "Received an unexpected resource in handler"
            );
            return Ok(vec![]);
        }

        let pod: Pod = self
            .codec
            .decode_target(request.object.as_ref(), "Pod")
            .map_err(|e| PolicyRejection::new(format!("could not deserialize pod: {e}")))?;

        validate_pod_resource_limits(&pod)?;

        Ok(vec![])
    }
}

fn pod_resource() -> GroupVersionResource {
    GroupVersionResource::new("", "v1", "pods")
}

pub fn validate_pod_resource_limits(pod: &Pod) -> Result<(), PolicyRejection> {
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or_default();

    for container in containers {
        ensure_limit(container, CPU, "CPU")?;
        ensure_limit(container, MEMORY, "Memory")?;
    }

    Ok(())
}

fn ensure_limit(container: &Container, resource: &str, label: &str) -> Result<(), PolicyRejection> {
    let limit = container
        .resources
        .as_ref()
        .and_then(|resources| resources.limits.as_ref())
        .and_then(|limits| limits.get(resource));

    let missing = match limit {
        None => true,
        Some(limit) => quantity::is_zero(limit).map_err(|e| {
            PolicyRejection::new(format!(
                "container ({}) has an invalid {label} limit: {e}",
                container.name
            ))
        })?,
    };

    if missing {
        return Err(PolicyRejection::new(format!(
            "container ({}) is missing required {label} Limits",
            container.name
        )));
    }

    Ok(())
}
