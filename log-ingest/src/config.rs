use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_MAX_LOG_SIZE: u64 = 1024 * 1024;
pub const DEFAULT_TOPIC: &str = "log";
pub const DEFAULT_DELEGATE_ROLE: &str = "monitoring-delegate";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Region cannot be empty")]
    EmptyRegion,

    #[error("Max log size must be greater than 0")]
    InvalidMaxLogSize,

    #[error("Topic cannot be empty")]
    EmptyTopic,

    #[error("Kafka broker list cannot be empty")]
    EmptyBrokers,

    #[error("Delegate role names cannot be empty")]
    EmptyDelegateRole,
}

/// Log ingestion configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for log submissions
    #[serde(default)]
    pub listener: Listener,
    /// Listener for health and readiness checks
    #[serde(default = "Listener::default_admin")]
    pub admin_listener: Listener,
    pub service: ServiceConfig,
    pub producer: ProducerConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.service.validate()?;
        self.producer.validate()?;
        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 5607,
        }
    }
}

impl Listener {
    fn default_admin() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 5608,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Region stamped into every envelope
    pub region: String,
    /// Upper bound, in bytes, for both the request payload and the serialized envelope.
    /// Also used as the message length limit in characters.
    #[serde(default = "default_max_log_size")]
    pub max_log_size: u64,
    /// Roles allowed to submit logs on behalf of another tenant
    #[serde(default = "default_delegate_roles")]
    pub delegate_roles: Vec<String>,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.region.trim().is_empty() {
            return Err(ValidationError::EmptyRegion);
        }
        if self.max_log_size == 0 {
            return Err(ValidationError::InvalidMaxLogSize);
        }
        if self.delegate_roles.iter().any(|r| r.trim().is_empty()) {
            return Err(ValidationError::EmptyDelegateRole);
        }
        Ok(())
    }
}

fn default_max_log_size() -> u64 {
    DEFAULT_MAX_LOG_SIZE
}

fn default_delegate_roles() -> Vec<String> {
    vec![DEFAULT_DELEGATE_ROLE.to_string()]
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ProducerConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
    pub backend: ProducerBackend,
}

impl ProducerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        if let ProducerBackend::Kafka(kafka) = &self.backend
            && kafka.brokers.trim().is_empty()
        {
            return Err(ValidationError::EmptyBrokers);
        }
        Ok(())
    }
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProducerBackend {
    Kafka(KafkaConfig),
    /// Accepts and discards every message
    Noop,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct KafkaConfig {
    /// Comma separated `host:port` list
    pub brokers: String,
    /// Additional librdkafka settings, e.g. `message.timeout.ms`
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}
