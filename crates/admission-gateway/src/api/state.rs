use std::sync::Arc;

use crate::engine::AdmissionEngine;

pub(crate) struct ApiServerState {
    pub(crate) engine: Arc<AdmissionEngine>,
    /// Maximum size, in bytes, of an admission review request body
    pub(crate) max_body_size: usize,
}
