mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod engine;
pub mod namespace_gate;
pub mod policies;
pub mod policy;
pub mod tracing;

use std::{net::SocketAddr, sync::Arc};

use ::tracing::info;
use admission_review::codec::ReviewCodec;
use anyhow::Result;
use axum::{
    Router,
    routing::{any, get},
};
use axum_server::tls_rustls::RustlsConfig;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::{
    api::{
        handlers::{admission_handler, readiness_handler},
        state::ApiServerState,
    },
    config::Config,
    engine::AdmissionEngine,
    policies::ResourceLimitsPolicy,
    policy::AdmissionPolicy,
};

pub struct AdmissionGateway {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl AdmissionGateway {
    /// Build a gateway enforcing resource limits on Pods.
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let codec = ReviewCodec::default();
        let policy = Arc::new(ResourceLimitsPolicy::new(codec.clone()));

        Self::new(config, codec, policy).await
    }

    /// Build a gateway delegating every admission decision to `policy`.
    pub async fn new(
        config: Config,
        codec: ReviewCodec,
        policy: Arc<dyn AdmissionPolicy>,
    ) -> Result<Self> {
        let engine = AdmissionEngine::new(codec, config.namespace_gate(), policy);
        let state = Arc::new(ApiServerState {
            engine: Arc::new(engine),
            max_body_size: config.max_body_size,
        });

        let tls_config = match &config.tls_config {
            Some(tls_config) => Some(certs::create_tls_config(tls_config).await?),
            None => None,
        };

        let router = build_router(&config.webhook_path, state);

        Ok(Self {
            router,
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        match self.tls_config {
            Some(tls_config) => {
                info!(address = %self.addr, tls = true, "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, tls = false, "started HTTP server");
                axum_server::bind(self.addr)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }
}

// Every method is routed to the admission handler: rejecting the non-POST
// ones is part of the admission review protocol.
fn build_router(webhook_path: &str, state: Arc<ApiServerState>) -> Router {
    Router::new()
        .route(webhook_path, any(admission_handler))
        .route("/readiness", get(readiness_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
