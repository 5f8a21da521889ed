use chrono::NaiveDate;

use super::WorkflowError;

pub const MAX_REASON_CHARS: usize = 500;

pub fn check_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), WorkflowError> {
    if start_date > end_date {
        return Err(WorkflowError::Validation(
            "Start date must be on or before end date".to_string(),
        ));
    }
    Ok(())
}

pub fn check_reason(reason: &str) -> Result<(), WorkflowError> {
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(WorkflowError::Validation(format!(
            "Reason must be at most {MAX_REASON_CHARS} characters"
        )));
    }
    Ok(())
}

/// Trimmed search term, or `None` when there is nothing to match on.
pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
