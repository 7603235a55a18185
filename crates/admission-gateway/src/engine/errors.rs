use admission_review::errors::CodecError;
use axum::http::{Method, StatusCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Failures that prevent an admission review from being answered.
///
/// A policy rejecting a request is not one of them: that is a successful
/// review carrying `allowed: false`.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("invalid method {0}")]
    MethodNotAllowed(Method),

    #[error("invalid content type {0}")]
    UnsupportedMediaType(String),

    #[error("could not read request body: {0}")]
    UnreadableBody(String),

    #[error("{0}")]
    MalformedEnvelope(#[source] CodecError),

    #[error("could not marshal response: {0}")]
    EncodingFault(#[source] CodecError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AdmissionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AdmissionError::UnsupportedMediaType(_)
            | AdmissionError::UnreadableBody(_)
            | AdmissionError::MalformedEnvelope(_) => StatusCode::BAD_REQUEST,
            AdmissionError::EncodingFault(_) | AdmissionError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case::method(AdmissionError::MethodNotAllowed(Method::GET), 405, "invalid method GET")]
    #[case::media_type(
        AdmissionError::UnsupportedMediaType("text/plain".to_owned()),
        400,
        "invalid content type text/plain"
    )]
    #[case::body(
        AdmissionError::UnreadableBody("length limit exceeded".to_owned()),
        400,
        "could not read request body: length limit exceeded"
    )]
    #[case::envelope(
        AdmissionError::MalformedEnvelope(CodecError::MissingRequest),
        400,
        "malformed admission review: request is nil"
    )]
    #[case::internal(
        AdmissionError::Internal("policy panicked".to_owned()),
        500,
        "internal error: policy panicked"
    )]
    fn status_and_message(
        #[case] error: AdmissionError,
        #[case] status: u16,
        #[case] message: &str,
    ) {
        assert_eq!(error.status_code().as_u16(), status);
        assert_eq!(error.to_string(), message);
    }
}
