//! Helpers for validating multipart form fields before persistence.

use std::collections::HashMap;

use crate::error::AppError;

/// A trimmed, non-empty text field.
pub fn required(fields: &HashMap<String, String>, key: &str) -> Result<String, AppError> {
    fields
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required field '{}'", key)))
}

/// An optional numeric field; present-but-unparseable is an error rather than
/// a silently dropped value.
pub fn optional_number(
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<Option<f64>, AppError> {
    match fields.get(key).map(|value| value.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("Field '{}' must be a number", key))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        let f = fields(&[("name", "  Rex  "), ("blank", "   ")]);
        assert_eq!(required(&f, "name").unwrap(), "Rex");
        assert!(required(&f, "blank").is_err());
        assert!(required(&f, "absent").is_err());
    }

    #[test]
    fn optional_number_parses_or_fails_loudly() {
        let f = fields(&[("latitude", "18.52"), ("longitude", "abc"), ("empty", "")]);
        assert_eq!(optional_number(&f, "latitude").unwrap(), Some(18.52));
        assert!(optional_number(&f, "longitude").is_err());
        assert_eq!(optional_number(&f, "empty").unwrap(), None);
        assert_eq!(optional_number(&f, "absent").unwrap(), None);
    }
}
