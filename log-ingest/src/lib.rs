pub mod api;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod key;
pub mod metrics_defs;
pub mod model;
pub mod normalize;
pub mod producer;
pub mod service;
pub mod transformer;
pub mod validation;
pub mod versions;

#[cfg(test)]
mod testutils;

use crate::api::LogResource;
use crate::config::ValidationError;
use crate::producer::{Producer, ProducerError, build_producer};
use crate::service::LogService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::time::Duration;

const READINESS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(thiserror::Error, Debug)]
pub enum LogIngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("producer error: {0}")]
    Producer(#[from] ProducerError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
}

/// Serves the log and admin listeners until one of them fails or ctrl-c is received.
pub async fn run(config: config::Config) -> Result<(), LogIngestError> {
    config.validate()?;

    let producer = build_producer(&config.producer.backend)?;
    let service = Arc::new(LogService::new(
        &config.service,
        &config.producer.topic,
        producer.clone(),
    ));
    let resource = LogResource::new(service, config.service.delegate_roles.clone());

    let log_task = run_http_service(&config.listener.host, config.listener.port, resource);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service(producer.clone()),
    );

    let result = tokio::select! {
        result = async { tokio::try_join!(log_task, admin_task).map(|_| ()) } => result,
        _ = check_readiness(producer.as_ref()) => Ok(()),
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            signal.map_err(LogIngestError::from)
        }
    };

    if let Err(e) = producer.flush() {
        tracing::error!(error = %e, "Failed to flush pending logs");
    }

    result
}

/// `/ready` reports 503 while the producer cannot reach its broker.
fn admin_service(
    producer: Arc<dyn Producer>,
) -> AdminService<impl Fn() -> bool + Send + Sync + 'static, LogIngestError> {
    AdminService::new(move || producer.is_ready())
}

async fn check_readiness(producer: &dyn Producer) {
    let mut interval = tokio::time::interval(READINESS_INTERVAL);
    loop {
        interval.tick().await;
        producer.check_readiness().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::RecordingProducer;
    use hyper::{Method, StatusCode};

    #[test]
    fn test_ready_follows_producer() {
        let admin = admin_service(Arc::new(RecordingProducer::default()));
        assert_eq!(admin.respond(&Method::GET, "/ready").status(), StatusCode::OK);

        let admin = admin_service(Arc::new(RecordingProducer::failing()));
        assert_eq!(
            admin.respond(&Method::GET, "/ready").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(admin.respond(&Method::GET, "/health").status(), StatusCode::OK);
    }
}
