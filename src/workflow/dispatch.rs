//! Post-commit fan-out: in-app notifications, live events and e-mail.
//!
//! Nothing here returns an error. The transition has already been committed,
//! so a failing side channel is logged and the next recipient is tried.

use uuid::Uuid;

use super::{Decision, LeaveWorkflow};
use crate::email::templates::{self, day};
use crate::models::notification::clamp_message;
use crate::models::{LeaveRequest, Role, User};
use crate::realtime::{LiveEvent, Topic};

impl LeaveWorkflow {
    /// Tell approvers a request is waiting and confirm receipt to its owner.
    pub(super) async fn announce_submission(&self, request: &LeaveRequest) {
        let owner = self.lookup_user(request.owner_id).await;
        let owner_name = owner
            .as_ref()
            .map(User::display_name)
            .unwrap_or_else(|| "An employee".to_string());
        let period = format!("{} to {}", day(request.start_date), day(request.end_date));

        let approvers = match self.directory.users_in_roles(&Role::APPROVERS).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(leave_request_id = request.id, "Failed to resolve approvers: {e}");
                Vec::new()
            }
        };

        let review_message =
            format!("{owner_name} submitted leave request #{} for {period}.", request.id);
        for approver in approvers.iter().filter(|u| u.id != request.owner_id) {
            self.notify(approver.id, &review_message).await;
        }
        self.notify(
            request.owner_id,
            &format!(
                "Your leave request #{} for {period} was submitted and is pending approval.",
                request.id
            ),
        )
        .await;

        for role in Role::APPROVERS {
            self.broadcaster.publish(
                LiveEvent::new(Topic::Role(role), "leave.submitted", "New leave request submitted.")
                    .about(request.id),
            );
        }
        self.broadcaster.publish(
            LiveEvent::new(
                Topic::User(request.owner_id),
                "leave.submitted",
                format!("Leave #{} submitted.", request.id),
            )
            .about(request.id),
        );

        for approver in approvers.iter().filter(|u| u.id != request.owner_id) {
            let html = templates::render_pending_review(
                &approver.first_name,
                &owner_name,
                request.start_date,
                request.end_date,
                &self.settings.base_url,
            );
            self.send_email(&approver.email, "New Leave Request Pending Approval", &html)
                .await;
        }
        if let Some(owner) = &owner {
            let html = templates::render_submitted(
                &owner.first_name,
                request.start_date,
                request.end_date,
                &self.settings.base_url,
            );
            self.send_email(&owner.email, "Your Leave Request Has Been Submitted", &html)
                .await;
        }
    }

    /// Tell the owner their request was approved or rejected.
    pub(super) async fn announce_decision(&self, request: &LeaveRequest, decision: Decision) {
        let (verb, event, subject) = match decision {
            Decision::Approve => (
                "approved",
                "leave.approved",
                "Your Leave Request Has Been Approved",
            ),
            Decision::Reject => (
                "rejected",
                "leave.rejected",
                "Your Leave Request Has Been Rejected",
            ),
        };
        let period = format!("{} to {}", day(request.start_date), day(request.end_date));

        self.notify(
            request.owner_id,
            &format!("Your leave request #{} for {period} has been {verb}.", request.id),
        )
        .await;

        self.broadcaster.publish(
            LiveEvent::new(
                Topic::User(request.owner_id),
                event,
                format!("Leave #{} {verb}.", request.id),
            )
            .about(request.id),
        );

        let Some(owner) = self.lookup_user(request.owner_id).await else {
            return;
        };
        let html = match decision {
            Decision::Approve => templates::render_approved(
                &owner.first_name,
                request.start_date,
                request.end_date,
                &self.settings.base_url,
            ),
            Decision::Reject => templates::render_rejected(
                &owner.first_name,
                request.start_date,
                request.end_date,
                &self.settings.base_url,
            ),
        };
        self.send_email(&owner.email, subject, &html).await;
    }

    async fn notify(&self, user_id: Uuid, message: &str) {
        if let Err(e) = self.notifications.create(user_id, &clamp_message(message)).await {
            tracing::error!(user_id = %user_id, "Failed to store notification: {e}");
        }
    }

    async fn lookup_user(&self, id: Uuid) -> Option<User> {
        match self.directory.find_user(id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user_id = %id, "Failed to load user: {e}");
                None
            }
        }
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) {
        let Some(mailer) = &self.mailer else {
            tracing::debug!(to, subject, "SMTP not configured, skipping email");
            return;
        };

        match tokio::time::timeout(self.settings.email_timeout, mailer.send(to, subject, html)).await
        {
            Ok(Ok(())) => tracing::debug!(to, subject, "Email sent"),
            Ok(Err(e)) => tracing::warn!(to, subject, "Failed to send email: {e}"),
            Err(_) => tracing::warn!(
                to,
                subject,
                "Email timed out after {:?}",
                self.settings.email_timeout
            ),
        }
    }
}
