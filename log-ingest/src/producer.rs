use crate::config::ProducerBackend;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("failed to create producer: {0}")]
    CreateFailed(String),
    #[error("failed to send message: {0}")]
    SendFailed(String),
    #[error("failed to flush producer: {0}")]
    FlushFailed(String),
    #[error("producer backend {0} is not available in this build")]
    Unavailable(&'static str),
}

/// Hands serialized envelopes to the message broker.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Resolves once the broker acknowledged the message or delivery failed.
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), ProducerError>;

    fn is_ready(&self) -> bool {
        true
    }

    /// Refreshes the state reported by [`Producer::is_ready`]. Called periodically.
    async fn check_readiness(&self) {}

    /// Blocks until queued messages are delivered or the backend gives up.
    fn flush(&self) -> Result<(), ProducerError> {
        Ok(())
    }
}

pub fn build_producer(backend: &ProducerBackend) -> Result<Arc<dyn Producer>, ProducerError> {
    match backend {
        #[cfg(feature = "kafka")]
        ProducerBackend::Kafka(config) => Ok(Arc::new(kafka::KafkaProducer::new(config)?)),
        #[cfg(not(feature = "kafka"))]
        ProducerBackend::Kafka(_) => Err(ProducerError::Unavailable("kafka")),
        ProducerBackend::Noop => Ok(Arc::new(NoopProducer)),
    }
}

/// Drops every message. For running without a broker.
pub struct NoopProducer;

#[async_trait]
impl Producer for NoopProducer {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), ProducerError> {
        tracing::debug!(topic, key, size = payload.len(), "Discarding log");
        Ok(())
    }
}

#[cfg(feature = "kafka")]
pub mod kafka {
    use super::{Producer, ProducerError};
    use crate::config::KafkaConfig;
    use async_trait::async_trait;
    use rdkafka::ClientConfig;
    use rdkafka::client::ClientContext;
    use rdkafka::error::{KafkaError, RDKafkaErrorCode};
    use rdkafka::producer::{FutureProducer, FutureRecord, Producer as _};
    use rdkafka::util::Timeout;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);
    /// How long a send may wait for room in the local queue.
    const QUEUE_TIMEOUT: Duration = Duration::from_secs(5);
    const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

    /// Whether the client can currently reach the cluster.
    #[derive(Clone, Debug)]
    pub struct BrokerState {
        up: Arc<AtomicBool>,
    }

    impl BrokerState {
        fn new() -> Self {
            BrokerState {
                up: Arc::new(AtomicBool::new(true)),
            }
        }

        pub fn is_up(&self) -> bool {
            self.up.load(Ordering::Relaxed)
        }

        fn mark_up(&self) {
            if !self.up.swap(true, Ordering::Relaxed) {
                tracing::info!("Kafka brokers reachable again");
            }
        }

        fn mark_down(&self) {
            if self.up.swap(false, Ordering::Relaxed) {
                tracing::warn!("Kafka brokers unreachable");
            }
        }
    }

    /// Client context that turns librdkafka errors into broker state.
    pub struct KafkaContext {
        brokers: BrokerState,
    }

    impl ClientContext for KafkaContext {
        fn error(&self, error: KafkaError, reason: &str) {
            tracing::error!(error = %error, reason, "Kafka client error");
            if is_broker_outage(&error) {
                self.brokers.mark_down();
            }
        }
    }

    fn is_broker_outage(error: &KafkaError) -> bool {
        matches!(
            error.rdkafka_error_code(),
            Some(RDKafkaErrorCode::AllBrokersDown | RDKafkaErrorCode::MessageTimedOut)
        )
    }

    pub struct KafkaProducer {
        producer: FutureProducer<KafkaContext>,
        brokers: BrokerState,
    }

    impl KafkaProducer {
        pub fn new(config: &KafkaConfig) -> Result<Self, ProducerError> {
            let mut client_config = ClientConfig::new();
            client_config.set("bootstrap.servers", &config.brokers);
            for (name, value) in &config.options {
                client_config.set(name, value);
            }

            let brokers = BrokerState::new();
            let context = KafkaContext {
                brokers: brokers.clone(),
            };
            let producer = client_config
                .create_with_context(context)
                .map_err(|e| ProducerError::CreateFailed(e.to_string()))?;

            tracing::info!(brokers = %config.brokers, "Kafka producer created");
            Ok(Self { producer, brokers })
        }
    }

    #[async_trait]
    impl Producer for KafkaProducer {
        async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), ProducerError> {
            let record = FutureRecord::to(topic).key(key).payload(payload);

            match self
                .producer
                .send(record, Timeout::After(QUEUE_TIMEOUT))
                .await
            {
                Ok(_) => {
                    self.brokers.mark_up();
                    Ok(())
                }
                Err((error, _message)) => {
                    if is_broker_outage(&error) {
                        self.brokers.mark_down();
                    }
                    Err(ProducerError::SendFailed(error.to_string()))
                }
            }
        }

        fn is_ready(&self) -> bool {
            self.brokers.is_up()
        }

        async fn check_readiness(&self) {
            let producer = self.producer.clone();
            let metadata = tokio::task::spawn_blocking(move || {
                producer
                    .client()
                    .fetch_metadata(None, Timeout::After(METADATA_TIMEOUT))
                    .map(|metadata| metadata.brokers().len())
            })
            .await;

            match metadata {
                Ok(Ok(brokers)) if brokers > 0 => self.brokers.mark_up(),
                Ok(Ok(_)) => self.brokers.mark_down(),
                Ok(Err(error)) => {
                    tracing::debug!(error = %error, "Kafka metadata request failed");
                    self.brokers.mark_down();
                }
                Err(error) => {
                    tracing::error!(error = %error, "Kafka readiness check did not complete")
                }
            }
        }

        fn flush(&self) -> Result<(), ProducerError> {
            self.producer
                .flush(Timeout::After(FLUSH_TIMEOUT))
                .map_err(|e| ProducerError::FlushFailed(e.to_string()))
        }
    }

}
