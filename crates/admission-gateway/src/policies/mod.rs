//! Admission policies shipped with the gateway.

pub mod quantity;
pub mod resource_limits;

pub use resource_limits::ResourceLimitsPolicy;
