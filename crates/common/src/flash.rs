//! One-shot status messages attached to responses.

use serde::Serialize;

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    /// The action completed.
    Success,
    /// Neutral information.
    Info,
    /// Something needs the user's attention.
    Warning,
    /// The action failed.
    Danger,
}

/// A human-readable status message and its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    /// Message category.
    pub category: FlashCategory,
    /// Message text.
    pub message: String,
}

impl Flash {
    /// Create a message with the given category.
    pub fn new(category: FlashCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// `success` message.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Success, message)
    }

    /// `info` message.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Info, message)
    }

    /// `warning` message.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Warning, message)
    }

    /// `danger` message.
    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Danger, message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_value(Flash::warning("careful")).unwrap();
        assert_eq!(json["category"], "warning");
        assert_eq!(json["message"], "careful");
    }
}
