use crate::model::Log;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub const META_TENANT_ID: &str = "tenantId";
pub const META_REGION: &str = "region";

/// Transport wrapper for a validated log.
///
/// Fields are declared in sorted order so the serialized form is stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEnvelope {
    /// Unix time in whole seconds, UTC.
    pub creation_time: i64,
    pub log: Log,
    pub meta: BTreeMap<String, Value>,
}

impl LogEnvelope {
    /// Wraps `log` with the tenant and region it was accepted for, stamped with the current time.
    pub fn new(log: Log, tenant_id: &str, region: &str) -> Self {
        Self::with_creation_time(log, tenant_id, region, unix_now())
    }

    pub fn with_creation_time(log: Log, tenant_id: &str, region: &str, creation_time: i64) -> Self {
        let meta = BTreeMap::from([
            (META_TENANT_ID.to_string(), Value::from(tenant_id)),
            (META_REGION.to_string(), Value::from(region)),
        ]);

        LogEnvelope {
            creation_time,
            log,
            meta,
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.meta.get(META_TENANT_ID).and_then(Value::as_str)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_envelope_meta_and_time() {
        let before = unix_now();
        let envelope = LogEnvelope::new(Log::new("hello"), "tenant", "useast");
        let after = unix_now();

        assert!(envelope.creation_time >= before && envelope.creation_time <= after);
        assert_eq!(envelope.meta.len(), 2);
        assert_eq!(envelope.tenant_id(), Some("tenant"));
        assert_eq!(envelope.meta[META_REGION], "useast");
        assert_eq!(envelope.log, Log::new("hello"));
    }

    #[test]
    fn test_serialized_layout() {
        let log = Log::new("Hello, world!").with_extra("from", "hoover");
        let envelope = LogEnvelope::with_creation_time(log, "abc", "pl", 1447834886);

        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"creation_time":1447834886,"log":{"from":"hoover","message":"Hello, world!"},"meta":{"region":"pl","tenantId":"abc"}}"#
        );
    }

    #[test]
    fn test_serialized_envelope_reads_back() {
        let log = Log::new("")
            .with_application_type("apache")
            .with_extra("nested", serde_json::json!({"a": [1, 2]}));
        let envelope = LogEnvelope::with_creation_time(log, "abc", "pl", 1);

        let json = serde_json::to_vec(&envelope).unwrap();
        let decoded: LogEnvelope = serde_json::from_slice(&json).unwrap();
        assert_eq!(decoded, envelope);
    }
}
