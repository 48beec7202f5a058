use crate::model::Dimensions;

/// Strips surrounding whitespace from an application type.
pub fn normalize_application_type(application_type: Option<&str>) -> Option<String> {
    application_type.map(|t| t.trim().to_string())
}

/// Strips surrounding whitespace from every dimension name and value.
///
/// An empty map stays empty, it is not collapsed to `None`.
pub fn normalize_dimensions(dimensions: Option<Dimensions>) -> Option<Dimensions> {
    dimensions.map(|dimensions| {
        dimensions
            .into_iter()
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect()
    })
}
