//! Turns a raw request body into a [`Log`], one transformer per content type.

use crate::model::Log;
use indexmap::IndexMap;
use thiserror::Error;

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub trait PayloadTransformer: Send + Sync {
    /// Media type this transformer accepts, e.g. `application/json`.
    fn media_type(&self) -> &'static str;

    fn transform(&self, payload: &[u8]) -> Result<Log, TransformError>;
}

/// Parses a JSON object. Unknown top level keys are kept as extra fields.
pub struct JsonPayloadTransformer;

impl PayloadTransformer for JsonPayloadTransformer {
    fn media_type(&self) -> &'static str {
        APPLICATION_JSON
    }

    fn transform(&self, payload: &[u8]) -> Result<Log, TransformError> {
        if payload.is_empty() {
            return Ok(Log::new(""));
        }
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Uses the whole body as the message.
pub struct TextPayloadTransformer;

impl PayloadTransformer for TextPayloadTransformer {
    fn media_type(&self) -> &'static str {
        TEXT_PLAIN
    }

    fn transform(&self, payload: &[u8]) -> Result<Log, TransformError> {
        Ok(Log::new(std::str::from_utf8(payload)?))
    }
}

/// Transformers keyed by the media type they accept, in registration order.
pub struct Transformers {
    by_media_type: IndexMap<&'static str, Box<dyn PayloadTransformer>>,
}

impl Transformers {
    pub fn empty() -> Self {
        Transformers {
            by_media_type: IndexMap::new(),
        }
    }

    pub fn register(mut self, transformer: Box<dyn PayloadTransformer>) -> Self {
        self.by_media_type
            .insert(transformer.media_type(), transformer);
        self
    }

    pub fn get(&self, media_type: &str) -> Option<&dyn PayloadTransformer> {
        self.by_media_type.get(media_type).map(|t| t.as_ref())
    }

    pub fn supports(&self, media_type: &str) -> bool {
        self.by_media_type.contains_key(media_type)
    }

    /// Comma separated list of accepted media types, for error messages.
    pub fn supported(&self) -> String {
        self.by_media_type
            .keys()
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Transformers {
    fn default() -> Self {
        Transformers::empty()
            .register(Box::new(JsonPayloadTransformer))
            .register(Box::new(TextPayloadTransformer))
    }
}
