use admission_review::{admission_request::AdmissionRequest, patch::PatchOperation};
use thiserror::Error;
use tracing::Span;

/// The outcome of a policy that refuses the request. This is a regular,
/// negative admission decision: it is sent back with HTTP 200 and
/// `allowed: false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PolicyRejection {
    message: String,
}

impl PolicyRejection {
    pub fn new(message: impl Into<String>) -> Self {
        PolicyRejection {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type PolicyResult = std::result::Result<Vec<PatchOperation>, PolicyRejection>;

/// The admission decision logic plugged into the engine.
///
/// Given an admission request, return the sequence of patch operations to be
/// applied before the object is admitted, or the rejection to show when the
/// operation is refused. `span` is the request span, it already carries the
/// request UID.
pub trait AdmissionPolicy: Send + Sync {
    fn admit(&self, span: &Span, request: &AdmissionRequest) -> PolicyResult;
}

impl<F> AdmissionPolicy for F
where
    F: Fn(&Span, &AdmissionRequest) -> PolicyResult + Send + Sync,
{
    fn admit(&self, span: &Span, request: &AdmissionRequest) -> PolicyResult {
        self(span, request)
    }
}
