//! Structured representation of a single log entry.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Dimensions = BTreeMap<String, String>;

const APPLICATION_TYPE: &str = "application_type";
const DIMENSIONS: &str = "dimensions";
const MESSAGE: &str = "message";

/// A log record: three well known fields plus any other top level fields
/// the client sent, which are carried through untouched.
///
/// Serialization emits every key in sorted order. `application_type` and
/// `dimensions` are left out when absent or empty, `message` is always written.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Log {
    #[serde(default)]
    pub application_type: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Log {
    pub fn new(message: impl Into<String>) -> Self {
        Log {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_application_type(mut self, application_type: impl Into<String>) -> Self {
        self.application_type = Some(application_type.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Application type, treating an empty string as absent.
    pub fn application_type(&self) -> Option<&str> {
        self.application_type.as_deref().filter(|t| !t.is_empty())
    }
}

// Absent and empty application types are the same thing.
impl PartialEq for Log {
    fn eq(&self, other: &Self) -> bool {
        self.application_type() == other.application_type()
            && self.dimensions == other.dimensions
            && self.message == other.message
            && self.extra == other.extra
    }
}

impl Eq for Log {}

#[derive(Serialize)]
#[serde(untagged)]
enum Field<'a> {
    Text(&'a str),
    Dimensions(&'a Dimensions),
    Extra(&'a Value),
}

impl Serialize for Log {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut fields: BTreeMap<&str, Field<'_>> = self
            .extra
            .iter()
            .filter(|(key, _)| ![APPLICATION_TYPE, DIMENSIONS, MESSAGE].contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), Field::Extra(value)))
            .collect();

        if let Some(application_type) = self.application_type() {
            fields.insert(APPLICATION_TYPE, Field::Text(application_type));
        }
        if let Some(dimensions) = self.dimensions.as_ref().filter(|d| !d.is_empty()) {
            fields.insert(DIMENSIONS, Field::Dimensions(dimensions));
        }
        fields.insert(MESSAGE, Field::Text(&self.message));

        fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equality_ignores_empty_application_type() {
        assert_eq!(Log::new("a"), Log::new("a").with_application_type(""));
        assert_ne!(Log::new("a"), Log::new("a").with_application_type("web"));
        assert_ne!(Log::new("a"), Log::new("a").with_extra("from", "hoover"));
        assert_ne!(
            Log::new("a"),
            Log::new("a").with_dimensions(Dimensions::new())
        );
    }

    #[test]
    fn test_deserialize_keeps_unknown_fields() {
        let log: Log =
            serde_json::from_str(r#"{"message":"Hello, world!","from":"hoover"}"#).unwrap();
        assert_eq!(log, Log::new("Hello, world!").with_extra("from", "hoover"));
    }

    #[test]
    fn test_deserialize_missing_or_null_message() {
        let log: Log = serde_json::from_str(r#"{"from":"hoover"}"#).unwrap();
        assert_eq!(log.message, "");

        let log: Log = serde_json::from_str(r#"{"message":null}"#).unwrap();
        assert_eq!(log.message, "");
    }

    #[test]
    fn test_deserialize_rejects_wrong_types() {
        assert!(serde_json::from_str::<Log>(r#"{"message":42}"#).is_err());
        assert!(serde_json::from_str::<Log>(r#"["message"]"#).is_err());
        assert!(serde_json::from_str::<Log>(r#"{"dimensions":"a:b"}"#).is_err());
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let log = Log::new("").with_application_type("");
        assert_eq!(serde_json::to_string(&log).unwrap(), r#"{"message":""}"#);

        let log = Log::new("m").with_dimensions(Dimensions::new());
        assert_eq!(serde_json::to_string(&log).unwrap(), r#"{"message":"m"}"#);
    }

    #[test]
    fn test_serialize_sorted_with_extras() {
        let log = Log::new("Hello")
            .with_application_type("apache")
            .with_dimensions(Dimensions::from([
                ("hostname".to_string(), "devstack".to_string()),
                ("env".to_string(), "prod".to_string()),
            ]))
            .with_extra("zone", 3)
            .with_extra("from", "hoover");

        assert_eq!(
            serde_json::to_string(&log).unwrap(),
            r#"{"application_type":"apache","dimensions":{"env":"prod","hostname":"devstack"},"from":"hoover","message":"Hello","zone":3}"#
        );
    }

    #[test]
    fn test_known_fields_win_over_extras() {
        let log = Log::new("real").with_extra("message", "shadow");
        assert_eq!(
            serde_json::to_value(&log).unwrap(),
            json!({"message": "real"})
        );
    }
}
