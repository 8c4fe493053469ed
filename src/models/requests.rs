//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for the clear operation (POST /cache/clear)
///
/// # Fields
/// - `pattern`: Glob of keys to delete
/// - `tag`: Tag whose keys should be invalidated
///
/// With neither field the whole cache is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

/// What a clear request asks to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    Pattern(String),
    Tag(String),
    All,
}

impl ClearRequest {
    /// Resolves the request to a single target.
    ///
    /// Returns an error message when both fields are given or one is blank.
    pub fn target(&self) -> Result<ClearTarget, String> {
        match (&self.pattern, &self.tag) {
            (Some(_), Some(_)) => Err("Specify either pattern or tag, not both".to_string()),
            (Some(pattern), None) if pattern.trim().is_empty() => {
                Err("Pattern cannot be empty".to_string())
            }
            (None, Some(tag)) if tag.trim().is_empty() => Err("Tag cannot be empty".to_string()),
            (Some(pattern), None) => Ok(ClearTarget::Pattern(pattern.clone())),
            (None, Some(tag)) => Ok(ClearTarget::Tag(tag.clone())),
            (None, None) => Ok(ClearTarget::All),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_request_deserialize_empty() {
        let req: ClearRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.target(), Ok(ClearTarget::All));
    }

    #[test]
    fn test_clear_request_pattern() {
        let req: ClearRequest = serde_json::from_str(r#"{"pattern": "user:*"}"#).unwrap();
        assert_eq!(req.target(), Ok(ClearTarget::Pattern("user:*".to_string())));
    }

    #[test]
    fn test_clear_request_tag() {
        let req: ClearRequest = serde_json::from_str(r#"{"tag": "products"}"#).unwrap();
        assert_eq!(req.target(), Ok(ClearTarget::Tag("products".to_string())));
    }

    #[test]
    fn test_clear_request_rejects_both() {
        let req = ClearRequest {
            pattern: Some("user:*".to_string()),
            tag: Some("products".to_string()),
        };
        assert!(req.target().is_err());
    }

    #[test]
    fn test_clear_request_rejects_blank() {
        let req = ClearRequest {
            pattern: Some("  ".to_string()),
            tag: None,
        };
        assert!(req.target().is_err());
    }
}
