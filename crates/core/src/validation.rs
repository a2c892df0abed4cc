//! Shared field validators.

use std::borrow::Cow;

use validator::ValidationError;

/// Reject empty and whitespace-only input.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("This field is required.")));
    }
    Ok(())
}
