use crate::config::ServiceConfig;
use crate::envelope::LogEnvelope;
use crate::errors::{LogApiError, Result};
use crate::key::build_key;
use crate::metrics_defs::ENVELOPE_SIZE;
use crate::model::{Dimensions, Log};
use crate::normalize::{normalize_application_type, normalize_dimensions};
use crate::producer::Producer;
use crate::transformer::Transformers;
use crate::validation::{validate_application_type, validate_dimensions, validate_message_length};
use shared::histogram;
use std::sync::Arc;

/// Everything the HTTP layer extracted from a single log request.
#[derive(Debug, Default)]
pub struct LogRequest<'a> {
    pub application_type: Option<&'a str>,
    pub dimensions: Option<Dimensions>,
    /// Media type essence, e.g. `application/json`
    pub content_type: &'a str,
    pub payload: &'a [u8],
}

/// Turns accepted requests into envelopes and publishes them.
///
/// Holds only read-only configuration and the producer handle, so one
/// instance serves all requests concurrently.
pub struct LogService {
    region: String,
    topic: String,
    max_log_size: u64,
    transformers: Transformers,
    producer: Arc<dyn Producer>,
}

impl LogService {
    pub fn new(config: &ServiceConfig, topic: &str, producer: Arc<dyn Producer>) -> Self {
        LogService {
            region: config.region.clone(),
            topic: topic.to_string(),
            max_log_size: config.max_log_size,
            transformers: Transformers::default(),
            producer,
        }
    }

    pub fn with_transformers(mut self, transformers: Transformers) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn producer(&self) -> &Arc<dyn Producer> {
        &self.producer
    }

    pub fn max_log_size(&self) -> u64 {
        self.max_log_size
    }

    /// Rejects requests without a declared length or declaring `max_log_size` bytes or more.
    pub fn validate_content_length(&self, content_length: Option<u64>) -> Result<()> {
        tracing::debug!(content_length, "Validating content length");

        let Some(content_length) = content_length else {
            return Err(LogApiError::LengthRequired);
        };

        if content_length >= self.max_log_size {
            return Err(LogApiError::PayloadTooLarge {
                max: self.max_log_size,
            });
        }

        Ok(())
    }

    /// Resolves the `Content-Type` header to a media type with a registered transformer.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> Result<String> {
        tracing::debug!(content_type, "Validating content type");

        let media_type = content_type
            .and_then(parse_media_type)
            .ok_or(LogApiError::MissingHeader("Content-Type"))?;

        if !self.transformers.supports(&media_type) {
            return Err(LogApiError::UnsupportedMediaType {
                content_type: media_type,
                supported: self.transformers.supported(),
            });
        }

        Ok(media_type)
    }

    /// Builds a log from the request body, then applies the header supplied
    /// application type and dimensions over whatever the body contained.
    pub fn new_log(&self, request: LogRequest<'_>, validate: bool) -> Result<Log> {
        let transformer = self.transformers.get(request.content_type).ok_or_else(|| {
            LogApiError::UnsupportedMediaType {
                content_type: request.content_type.to_string(),
                supported: self.transformers.supported(),
            }
        })?;

        let mut log = transformer.transform(request.payload).map_err(|e| {
            tracing::debug!(error = %e, "Payload transformation failed");
            LogApiError::unprocessable(format!(
                "{} couldn't be processed",
                String::from_utf8_lossy(request.payload)
            ))
        })?;

        log.application_type = normalize_application_type(request.application_type);
        log.dimensions = normalize_dimensions(request.dimensions);

        if validate {
            self.validate(&log)?;
        }

        tracing::debug!(
            application_type = log.application_type(),
            dimensions = ?log.dimensions,
            "Log created"
        );
        Ok(log)
    }

    pub fn validate(&self, log: &Log) -> Result<()> {
        if let Some(application_type) = log.application_type() {
            validate_application_type(application_type)?;
        }

        if let Some(dimensions) = &log.dimensions {
            validate_dimensions(dimensions)?;
        }

        validate_message_length(&log.message, self.max_log_size as usize)
    }

    pub fn new_envelope(&self, log: Log, tenant_id: &str) -> LogEnvelope {
        LogEnvelope::new(log, tenant_id, &self.region)
    }

    /// The serialized envelope must stay below `max_log_size` bytes.
    pub fn validate_envelope_size(&self, envelope: &[u8]) -> Result<()> {
        let size = envelope.len() as u64;
        tracing::debug!(size, "Envelope size");

        if size >= self.max_log_size {
            return Err(LogApiError::EnvelopeTooLarge {
                max: self.max_log_size,
            });
        }
        Ok(())
    }

    /// Wraps, sizes, keys and publishes a validated log. Producer failures are returned as is.
    pub async fn send_to_kafka(&self, log: Log, tenant_id: &str) -> Result<()> {
        let key = build_key(tenant_id, &log);
        let envelope = self.new_envelope(log, tenant_id);

        let payload = serde_json::to_vec(&envelope)
            .map_err(|e| LogApiError::Internal(format!("Failed to serialize envelope: {e}")))?;

        self.validate_envelope_size(&payload)?;
        histogram!(ENVELOPE_SIZE).record(payload.len() as f64);

        tracing::debug!(topic = %self.topic, %key, "Sending log");
        self.producer.send(&self.topic, &key, &payload).await?;

        Ok(())
    }
}

/// Extracts the lowercase `type/subtype` part of a `Content-Type` value.
pub fn parse_media_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (kind, subtype) = essence.split_once('/')?;

    if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return None;
    }

    Some(essence.to_ascii_lowercase())
}
