pub mod audit;
pub mod leave_requests;
pub mod leave_types;
pub mod notifications;
pub mod users;

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` taken literally.
pub fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
