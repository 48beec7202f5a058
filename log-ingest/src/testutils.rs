use crate::producer::{Producer, ProducerError};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq)]
pub struct SentMessage {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

/// Producer that keeps every message in memory, or fails every send.
#[derive(Default)]
pub struct RecordingProducer {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl RecordingProducer {
    pub fn failing() -> Self {
        RecordingProducer {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Producer for RecordingProducer {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), ProducerError> {
        if self.fail {
            return Err(ProducerError::SendFailed("broker unavailable".into()));
        }

        self.sent.lock().unwrap().push(SentMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn is_ready(&self) -> bool {
        !self.fail
    }
}
