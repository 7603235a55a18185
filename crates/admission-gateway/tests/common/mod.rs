use std::{net::SocketAddr, sync::Arc};

use admission_gateway::{AdmissionGateway, config::Config, policy::AdmissionPolicy};
use admission_review::codec::ReviewCodec;
use axum::Router;

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        webhook_path: "/validate".to_owned(),
        ignored_namespaces: None,
        max_body_size: 2 * 1024 * 1024,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) async fn app(config: Config) -> Router {
    let gateway = AdmissionGateway::new_from_config(config).await.unwrap();

    gateway.router()
}

pub(crate) async fn app_with_policy(config: Config, policy: Arc<dyn AdmissionPolicy>) -> Router {
    let gateway = AdmissionGateway::new(config, ReviewCodec::default(), policy)
        .await
        .unwrap();

    gateway.router()
}
