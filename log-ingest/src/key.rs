use crate::model::Log;

/// Builds the partition key for a log: tenant id, then application type,
/// then every dimension name and value, with no separators.
///
/// [`Dimensions`](crate::model::Dimensions) iterate in name order, so logs with
/// the same tenant, application type and dimension set always share a key.
pub fn build_key(tenant_id: &str, log: &Log) -> String {
    let mut key = String::from(tenant_id);

    if let Some(application_type) = log.application_type() {
        key.push_str(application_type);
    }

    for (name, value) in log.dimensions.iter().flatten() {
        key.push_str(name);
        key.push_str(value);
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimensions;

    fn dims(pairs: &[(&str, &str)]) -> Dimensions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tenant_only() {
        assert_eq!(build_key("Fujitsu", &Log::new("m")), "Fujitsu");
        assert_eq!(
            build_key("Fujitsu", &Log::new("m").with_application_type("")),
            "Fujitsu"
        );
    }

    #[test]
    fn test_full_key() {
        let log = Log::new("message")
            .with_application_type("Application/Json")
            .with_dimensions(dims(&[("a", "b")]));
        assert_eq!(build_key("Fujitsu", &log), "FujitsuApplication/Jsonab");
    }

    #[test]
    fn test_dimensions_sorted_by_name() {
        let log = Log::new("")
            .with_application_type("apache")
            .with_dimensions(dims(&[("service", "monitoring"), ("hostname", "devstack")]));
        assert_eq!(
            build_key("tenant", &log),
            "tenantapachehostnamedevstackservicemonitoring"
        );
    }

    #[test]
    fn test_extras_and_message_do_not_affect_key() {
        let a = Log::new("one").with_extra("from", "hoover");
        let b = Log::new("two");
        assert_eq!(build_key("t", &a), build_key("t", &b));
    }
}
