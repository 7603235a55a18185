pub mod errors;

use std::sync::Arc;

use admission_review::{
    admission_request::AdmissionRequest, admission_response::AdmissionResponse,
    codec::ReviewCodec,
};
use axum::http::Method;
use tracing::{Span, debug, info};

use crate::{namespace_gate::NamespaceGate, policy::AdmissionPolicy};
use errors::{AdmissionError, Result};

/// The serialized admission review response, together with a summary of the
/// decision it holds.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub body: Vec<u8>,
    pub allowed: bool,
    pub mutated: bool,
}

/// Turns raw admission review requests into admission review responses.
///
/// The engine owns every step between the HTTP layer and the admission
/// policy: transport validation, decoding, namespace filtering, policy
/// invocation and encoding. It holds no per-request state and can be shared
/// between any number of concurrent requests.
pub struct AdmissionEngine {
    codec: ReviewCodec,
    namespace_gate: NamespaceGate,
    policy: Arc<dyn AdmissionPolicy>,
}

impl AdmissionEngine {
    pub fn new(
        codec: ReviewCodec,
        namespace_gate: NamespaceGate,
        policy: Arc<dyn AdmissionPolicy>,
    ) -> Self {
        AdmissionEngine {
            codec,
            namespace_gate,
            policy,
        }
    }

    pub fn codec(&self) -> &ReviewCodec {
        &self.codec
    }

    pub fn namespace_gate(&self) -> &NamespaceGate {
        &self.namespace_gate
    }

    /// Valid requests are POST with `Content-Type: application/json`.
    /// This must be checked before the body is read.
    pub fn validate_transport(&self, method: &Method, content_type: Option<&str>) -> Result<()> {
        if method != Method::POST {
            return Err(AdmissionError::MethodNotAllowed(method.clone()));
        }

        let content_type = content_type.unwrap_or_default();
        if content_type != mime::APPLICATION_JSON.as_ref() {
            return Err(AdmissionError::UnsupportedMediaType(content_type.to_owned()));
        }

        Ok(())
    }

    /// Evaluate the admission review held by `body`.
    ///
    /// A rejection coming from the policy produces a successful outcome with
    /// `allowed` set to false. Errors are returned only when no meaningful
    /// admission review response can be produced.
    pub fn review(&self, span: &Span, body: &[u8]) -> Result<ReviewOutcome> {
        let review = self
            .codec
            .decode_review(body)
            .map_err(AdmissionError::MalformedEnvelope)?;
        let request = &review.request;

        populate_span_with_admission_request_data(span, request);

        let response = if self.namespace_gate.is_in_scope(request.namespace()) {
            self.evaluate(span, request)?
        } else {
            debug!(
                parent: span,
                namespace = request.namespace(),
                "Ignoring request due to disallowed namespace"
            );
            AdmissionResponse::allow(request.uid.clone(), None)
        };

        populate_span_with_admission_response(span, &response);

        let allowed = response.allowed;
        let mutated = response.patch.is_some();
        let body = self
            .codec
            .encode_response(&review.type_meta, response)
            .map_err(AdmissionError::EncodingFault)?;

        Ok(ReviewOutcome {
            body,
            allowed,
            mutated,
        })
    }

    /// Validate the transport properties of the request and evaluate it.
    ///
    /// Entry point for callers that already hold the whole body in memory.
    /// The HTTP adapter calls `validate_transport` and `review` separately
    /// instead, because the body must not be read when the transport checks
    /// fail.
    pub fn handle(
        &self,
        span: &Span,
        method: &Method,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<ReviewOutcome> {
        self.validate_transport(method, content_type)?;
        self.review(span, body)
    }

    fn evaluate(&self, span: &Span, request: &AdmissionRequest) -> Result<AdmissionResponse> {
        match self.policy.admit(span, request) {
            Ok(operations) => {
                let patch = self
                    .codec
                    .encode_patch(&operations)
                    .map_err(AdmissionError::EncodingFault)?;
                debug!(
                    parent: span,
                    patch_operations = operations.len(),
                    "request accepted by policy"
                );
                Ok(AdmissionResponse::allow(request.uid.clone(), patch))
            }
            Err(rejection) => {
                info!(
                    parent: span,
                    reason = rejection.message(),
                    "request rejected by policy"
                );
                Ok(AdmissionResponse::reject(
                    request.uid.clone(),
                    rejection.to_string(),
                ))
            }
        }
    }
}

fn populate_span_with_admission_request_data(span: &Span, adm_req: &AdmissionRequest) {
    span.record("request_uid", adm_req.uid.as_str());
    span.record("kind", adm_req.kind.kind.as_str());
    span.record("kind_group", adm_req.kind.group.as_str());
    span.record("kind_version", adm_req.kind.version.as_str());
    span.record("name", adm_req.name());
    span.record("namespace", adm_req.namespace());
    span.record("operation", adm_req.operation.as_str());
    span.record("resource", adm_req.resource.resource.as_str());
    span.record("resource_group", adm_req.resource.group.as_str());
    span.record("resource_version", adm_req.resource.version.as_str());
}

fn populate_span_with_admission_response(span: &Span, response: &AdmissionResponse) {
    span.record("allowed", response.allowed);
    span.record("mutated", response.patch.is_some());
    if let Some(message) = response.message() {
        span.record("response_message", message);
    }
}
