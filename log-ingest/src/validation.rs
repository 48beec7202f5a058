//! Character set and length constraints on the client supplied parts of a log.

use crate::errors::{LogApiError, Result};
use crate::model::Dimensions;

pub const MAX_NAME_LENGTH: usize = 255;

const INVALID_DIMENSION_NAME_CHARS: [char; 12] =
    ['>', '<', '=', '{', '}', '(', ')', '\'', '"', ',', ';', '&'];

fn is_application_type_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Accepts non-empty strings of `[A-Za-z0-9_.-]` up to [`MAX_NAME_LENGTH`] characters.
pub fn validate_application_type(application_type: &str) -> Result<()> {
    if application_type.chars().count() > MAX_NAME_LENGTH {
        return Err(LogApiError::unprocessable(format!(
            "Application type {application_type} must be {MAX_NAME_LENGTH} characters or less"
        )));
    }

    if application_type.is_empty() || !application_type.chars().all(is_application_type_char) {
        return Err(LogApiError::unprocessable(format!(
            "Application type {application_type} may only contain: a-z A-Z 0-9 _ - ."
        )));
    }

    Ok(())
}

pub fn validate_dimensions(dimensions: &Dimensions) -> Result<()> {
    for (key, value) in dimensions {
        if key.is_empty() {
            return Err(LogApiError::unprocessable("Dimension name cannot be empty"));
        }
        if key.chars().count() > MAX_NAME_LENGTH {
            return Err(LogApiError::unprocessable(format!(
                "Dimension name {key} must be {MAX_NAME_LENGTH} characters or less"
            )));
        }
        if key.contains(INVALID_DIMENSION_NAME_CHARS) {
            return Err(LogApiError::unprocessable(format!(
                "Dimension name {key} may not contain: > < = {{ }} ( ) ' \" , ; &"
            )));
        }
        if value.is_empty() {
            return Err(LogApiError::unprocessable(format!(
                "Dimension {key} cannot have an empty value"
            )));
        }
        if value.chars().count() > MAX_NAME_LENGTH {
            return Err(LogApiError::unprocessable(format!(
                "Dimension value {value} must be {MAX_NAME_LENGTH} characters or less"
            )));
        }
    }

    Ok(())
}

/// Parses the `X-Dimensions` header format, `name:value[,name:value]*`.
///
/// Only the first colon of a segment separates name from value. Names and
/// values are not validated here: an empty name such as `:WebService01`
/// parses, and is rejected afterwards by [`validate_dimensions`].
pub fn parse_dimensions(raw: &str) -> Result<Dimensions> {
    let mut dimensions = Dimensions::new();

    for segment in raw.split(',').map(str::trim) {
        if segment.is_empty() {
            return Err(LogApiError::unprocessable("Dimension cannot be empty"));
        }

        let (key, value) = segment.split_once(':').ok_or_else(|| {
            LogApiError::unprocessable(format!("{segment} is not a valid dimension"))
        })?;

        dimensions.insert(key.to_string(), value.to_string());
    }

    Ok(dimensions)
}

/// Rejects messages longer than `max_length` characters.
pub fn validate_message_length(message: &str, max_length: usize) -> Result<()> {
    // Byte length bounds the character count from above.
    if message.len() > max_length && message.chars().count() > max_length {
        return Err(LogApiError::unprocessable(format!(
            "Log must be {max_length} characters or less"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::normalize::normalize_dimensions;

    fn message_of(result: Result<impl std::fmt::Debug>) -> String {
        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnprocessableEntity);
        error.to_string()
    }

    fn dims(pairs: &[(&str, &str)]) -> Dimensions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_application_type_accepts_allowed_charset() {
        for valid in ["apache", "azAZ19.-_", "a", "Application.Json-1_x"] {
            assert!(validate_application_type(valid).is_ok(), "{valid}");
        }
        assert!(validate_application_type(&"a".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_application_type_rejects_other_chars() {
        for invalid in ["@apache", "ap ache", "app/json", "zażółć", "tab\t"] {
            assert_eq!(
                message_of(validate_application_type(invalid)),
                format!("Application type {invalid} may only contain: a-z A-Z 0-9 _ - .")
            );
        }
    }

    #[test]
    fn test_application_type_rejects_too_long() {
        let too_long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(
            message_of(validate_application_type(&too_long)),
            format!("Application type {too_long} must be 255 characters or less")
        );
    }

    #[test]
    fn test_dimensions_valid() {
        assert!(validate_dimensions(&Dimensions::new()).is_ok());
        assert!(
            validate_dimensions(&dims(&[("hostname", "devstack"), ("url", "http://x:80")])).is_ok()
        );
    }

    #[test]
    fn test_dimensions_empty_name() {
        assert_eq!(
            message_of(validate_dimensions(&dims(&[("", "WebService01")]))),
            "Dimension name cannot be empty"
        );
    }

    #[test]
    fn test_dimensions_name_too_long() {
        let key = "k".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(
            message_of(validate_dimensions(&dims(&[(&key, "v")]))),
            format!("Dimension name {key} must be 255 characters or less")
        );
    }

    #[test]
    fn test_dimensions_name_invalid_chars() {
        for c in INVALID_DIMENSION_NAME_CHARS {
            let key = format!("app{c}name");
            assert_eq!(
                message_of(validate_dimensions(&dims(&[(&key, "v")]))),
                format!("Dimension name {key} may not contain: > < = {{ }} ( ) ' \" , ; &")
            );
        }
    }

    #[test]
    fn test_dimensions_empty_value() {
        assert_eq!(
            message_of(validate_dimensions(&dims(&[("app_name", "")]))),
            "Dimension app_name cannot have an empty value"
        );
    }

    #[test]
    fn test_dimensions_value_too_long() {
        let value = "v".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(
            message_of(validate_dimensions(&dims(&[("k", &value)]))),
            format!("Dimension value {value} must be 255 characters or less")
        );
    }

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(
            parse_dimensions("app_name:WebService01,environment:production").unwrap(),
            dims(&[("app_name", "WebService01"), ("environment", "production")])
        );
        assert_eq!(
            parse_dimensions(" url:http://host:8080 , a:b").unwrap(),
            dims(&[("url", "http://host:8080"), ("a", "b")])
        );
    }

    #[test]
    fn test_parse_dimensions_empty_name_fails_validation() {
        let parsed = parse_dimensions(":WebService01,environment:production").unwrap();
        assert_eq!(
            message_of(validate_dimensions(&parsed)),
            "Dimension name cannot be empty"
        );
    }

    #[test]
    fn test_parse_dimensions_empty_segment() {
        for raw in [",a:b", "a:b,", "a:b,,c:d", ""] {
            assert_eq!(
                message_of(parse_dimensions(raw)),
                "Dimension cannot be empty"
            );
        }
    }

    #[test]
    fn test_parse_dimensions_missing_colon() {
        assert_eq!(
            message_of(parse_dimensions("app_name")),
            "app_name is not a valid dimension"
        );
    }

    #[test]
    fn test_parse_matches_normalized_map() {
        let original = dims(&[(" hostname", "devstack "), ("env", "prod")]);
        let raw = original
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join(",");

        assert_eq!(
            normalize_dimensions(Some(parse_dimensions(&raw).unwrap())),
            normalize_dimensions(Some(original))
        );
    }

    #[test]
    fn test_message_length() {
        assert!(validate_message_length("", 4).is_ok());
        assert!(validate_message_length("abcd", 4).is_ok());
        // Four characters, eight bytes.
        assert!(validate_message_length("ąęść", 4).is_ok());
        assert_eq!(
            message_of(validate_message_length("abcde", 4)),
            "Log must be 4 characters or less"
        );
    }
}
