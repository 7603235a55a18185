use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("could not deserialize request: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    #[error("malformed admission review: request is nil")]
    MissingRequest,

    #[error("admission request does not carry an object")]
    MissingObject,

    #[error("unexpected object kind: expected {expected}, found {found}")]
    UnexpectedKind { expected: String, found: String },

    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    #[error("could not decode patch: {0}")]
    PatchDecode(String),

    #[error("could not marshal JSON: {0}")]
    Encode(#[source] serde_json::Error),
}
