//! CSV rendering for the export endpoints. Pure functions of their input.

use std::fmt::Write;

use crate::models::{AuditLogEntry, LeaveRequestWithOwner};

pub fn leave_requests_csv(rows: &[LeaveRequestWithOwner]) -> String {
    let mut csv = String::new();
    let _ = writeln!(
        csv,
        "id,employee,start_date,end_date,status,leave_type_id,reason,requested_at"
    );

    for row in rows {
        let request = &row.request;
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{},{}",
            request.id,
            csv_escape(&row.owner_name()),
            request.start_date,
            request.end_date,
            request.status,
            request
                .leave_type_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            csv_escape(&request.reason),
            request.requested_at.to_rfc3339(),
        );
    }

    csv
}

pub fn audit_csv(entries: &[AuditLogEntry]) -> String {
    let mut csv = String::new();
    let _ = writeln!(
        csv,
        "id,created_at,action,actor,leave_request_id,subject_id,details"
    );

    for entry in entries {
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{}",
            entry.id,
            entry.created_at.to_rfc3339(),
            entry.action.as_str(),
            csv_escape(&entry.actor_name),
            entry
                .leave_request_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            entry.subject_id.map(|id| id.to_string()).unwrap_or_default(),
            csv_escape(&entry.details),
        );
    }

    csv
}

fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
