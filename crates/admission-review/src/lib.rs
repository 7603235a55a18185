pub mod admission_request;
pub mod admission_response;
pub mod codec;
pub mod errors;
pub mod patch;

pub use k8s_openapi;
