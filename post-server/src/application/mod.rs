pub mod auth_service;
pub mod comment_service;
pub mod post_service;

use crate::domain::error::DomainError;

/// Required-field check shared by the services: whitespace-only counts as
/// empty.
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
