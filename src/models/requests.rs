//! Request DTOs for the cache server API
//!
//! Defines the shape of incoming add requests.

use uuid::Uuid;

use crate::cache::MAX_KEY_LENGTH;

/// Request for the ADD operation (POST /cache[/:key])
///
/// The value arrives as the plain-text request body; the key comes from the
/// path or is generated.
#[derive(Debug, Clone)]
pub struct AddRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
}

impl AddRequest {
    /// Builds a request, generating a random UUID key when none is given.
    pub fn new(key: Option<String>, value: String) -> Self {
        Self {
            key: key.unwrap_or_else(|| Uuid::new_v4().to_string()),
            value,
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Checks a caller-supplied key.
pub fn validate_key(key: &str) -> Option<String> {
    if key.trim().is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_is_uuid() {
        let req = AddRequest::new(None, "hello".to_string());
        assert!(Uuid::parse_str(&req.key).is_ok());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = AddRequest::new(None, String::new());
        let b = AddRequest::new(None, String::new());
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_validate_empty_key() {
        let req = AddRequest::new(Some("  ".to_string()), "test".to_string());
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        let req = AddRequest::new(Some("x".repeat(MAX_KEY_LENGTH + 1)), "test".to_string());
        assert!(req.validate().unwrap().contains("maximum length"));
    }

    #[test]
    fn test_validate_valid_request() {
        let req = AddRequest::new(Some("valid_key".to_string()), "test".to_string());
        assert!(req.validate().is_none());
    }
}
