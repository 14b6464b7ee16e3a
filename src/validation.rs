//! Input validation for sprint and task data.

use crate::error::{Result, SprintError};
use chrono::NaiveDate;

/// Maximum allowed length for a sprint name or task title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum allowed length for a sprint goal or task description.
pub const MAX_BODY_LENGTH: usize = 50_000;

/// Maximum allowed length for an ID.
pub const MAX_ID_LENGTH: usize = 50;

/// Characters forbidden in IDs to prevent path traversal.
const FORBIDDEN_ID_CHARS: &[char] = &['/', '\\', '\0'];

/// Validates a sprint name.
pub fn validate_sprint_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SprintError::Validation(
            "Sprint name cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_TITLE_LENGTH {
        return Err(SprintError::Validation(format!(
            "Sprint name exceeds maximum length of {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

/// Validates a task title.
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(SprintError::Validation("Title cannot be empty".to_string()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(SprintError::Validation(format!(
            "Title exceeds maximum length of {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

/// Validates a goal or description body.
pub fn validate_body(body: &str) -> Result<()> {
    if body.len() > MAX_BODY_LENGTH {
        return Err(SprintError::Validation(format!(
            "Body exceeds maximum length of {} characters",
            MAX_BODY_LENGTH
        )));
    }
    Ok(())
}

/// Validates the project reference every sprint must carry.
pub fn validate_project(project: &str) -> Result<()> {
    if project.trim().is_empty() {
        return Err(SprintError::Validation(
            "Project reference is required".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(SprintError::Validation(format!(
            "End date {} is before start date {}",
            end, start
        )));
    }
    Ok(())
}

/// Capacity is in hours and must be a non-negative finite number.
pub fn validate_capacity(capacity: f64) -> Result<()> {
    if !capacity.is_finite() || capacity < 0.0 {
        return Err(SprintError::Validation(format!(
            "Capacity must be zero or more hours, got {}",
            capacity
        )));
    }
    Ok(())
}

/// Validates an ID to prevent path traversal attacks.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(SprintError::Validation("ID cannot be empty".to_string()));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(SprintError::Validation(format!(
            "ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }
    if id.contains("..") {
        return Err(SprintError::Validation(
            "ID cannot contain '..' (path traversal)".to_string(),
        ));
    }
    for c in FORBIDDEN_ID_CHARS {
        if id.contains(*c) {
            return Err(SprintError::Validation(format!("ID cannot contain '{}'", c)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_validate_sprint_name_blank() {
        assert!(validate_sprint_name("").is_err());
        assert!(validate_sprint_name("   ").is_err());
        assert!(validate_sprint_name("Sprint 3").is_ok());
    }

    #[test]
    fn test_validate_title_too_long() {
        let long_title = "a".repeat(MAX_TITLE_LENGTH + 1);
        assert!(validate_title(&long_title).is_err());
    }

    #[test]
    fn test_validate_date_range() {
        assert!(validate_date_range(date("2026-03-01"), date("2026-03-01")).is_ok());
        assert!(validate_date_range(date("2026-03-01"), date("2026-03-14")).is_ok());
        assert!(validate_date_range(date("2026-03-14"), date("2026-03-01")).is_err());
    }

    #[test]
    fn test_validate_capacity() {
        assert!(validate_capacity(0.0).is_ok());
        assert!(validate_capacity(40.0).is_ok());
        assert!(validate_capacity(-1.0).is_err());
        assert!(validate_capacity(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_id_path_traversal() {
        assert!(validate_id("../../../etc/passwd").is_err());
        assert!(validate_id("sp/1234").is_err());
        assert!(validate_id("sp-1234").is_ok());
    }
}
