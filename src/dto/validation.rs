//! Validation helpers for DTOs.

use validator::{ValidationError, ValidationErrors};

/// Validates that a free-form text field carries at least one visible character.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank("Alien") // Ok
/// validate_not_blank("   ")   // Err
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Collect a blank-check failure for `field` into `errors`.
pub(crate) fn check_not_blank(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if let Err(err) = validate_not_blank(value) {
        errors.add(field, err);
    }
}

/// Turn an accumulated error set into a validation result.
pub(crate) fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
