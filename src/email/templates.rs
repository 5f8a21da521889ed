use chrono::NaiveDate;

/// Date as written in messages, e.g. `10 Jan 2025`.
pub fn day(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

fn layout(heading: &str, body: &str, base_url: &str, button: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>{heading}</h2>
    {body}
    <p><a href="{base_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">{button}</a></p>
    <p style="color: #666; font-size: 14px;">-- HR Team</p>
</body>
</html>"#
    )
}

pub fn render_pending_review(
    approver_first_name: &str,
    requester_name: &str,
    start: NaiveDate,
    end: NaiveDate,
    base_url: &str,
) -> String {
    let body = format!(
        "<p>Hello {approver_first_name},</p>\n    \
         <p>{requester_name} has applied for leave from {} to {}.</p>\n    \
         <p>Status: <strong>Pending</strong></p>\n    \
         <p>Please log in to review the request.</p>",
        day(start),
        day(end),
    );
    layout("New Leave Request", &body, base_url, "Review Request")
}

pub fn render_submitted(first_name: &str, start: NaiveDate, end: NaiveDate, base_url: &str) -> String {
    let body = format!(
        "<p>Hello {first_name},</p>\n    \
         <p>Your leave request from {} to {} has been submitted successfully.</p>\n    \
         <p>Status: <strong>Pending Approval</strong></p>\n    \
         <p>You will be notified once it is reviewed.</p>",
        day(start),
        day(end),
    );
    layout("Leave Request Submitted", &body, base_url, "View Request")
}

pub fn render_approved(first_name: &str, start: NaiveDate, end: NaiveDate, base_url: &str) -> String {
    let body = format!(
        "<p>Hello {first_name},</p>\n    \
         <p>Your leave request from {} to {} has been approved.</p>\n    \
         <p>Status: <strong>Approved</strong></p>\n    \
         <p>Enjoy your time off!</p>",
        day(start),
        day(end),
    );
    layout("Leave Request Approved", &body, base_url, "View Request")
}

pub fn render_rejected(first_name: &str, start: NaiveDate, end: NaiveDate, base_url: &str) -> String {
    let body = format!(
        "<p>Hello {first_name},</p>\n    \
         <p>Your leave request from {} to {} has been rejected.</p>\n    \
         <p>Status: <strong>Rejected</strong></p>\n    \
         <p>Please contact HR for more information.</p>",
        day(start),
        day(end),
    );
    layout("Leave Request Rejected", &body, base_url, "View Request")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_mail_names_the_dates() {
        let html = render_approved(
            "Ada",
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            "http://localhost",
        );
        assert!(html.contains("Hello Ada"));
        assert!(html.contains("10 Jan 2025 to 12 Jan 2025"));
        assert!(html.contains("<strong>Approved</strong>"));
    }
}
