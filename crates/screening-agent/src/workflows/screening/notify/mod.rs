//! Follow-up notifications for recruiter-ready candidates.

pub mod dry_run;
pub mod email;
pub mod meetings;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::config::NotificationConfig;
use crate::workflows::screening::batch::{BatchReport, BatchSummary};
use crate::workflows::screening::domain::RecruiterReadyRecord;

pub use dry_run::{DryRunMailer, DryRunScheduler};
pub use email::{send_email_batch, EmailReceipt, EmailTemplate, Mailer, OutgoingEmail};
pub use meetings::{
    select_top_candidates, send_meeting_invites, MeetingInvite, MeetingRequest, MeetingScheduler,
    MeetingWindow, ScheduledMeeting,
};

/// Failure of a single email or calendar delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery failed: {0}")]
    Transport(String),
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Combined outcome of emailing every candidate and inviting the top scorers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationSummary {
    pub emails_sent: usize,
    pub email_results: BatchSummary<EmailReceipt>,
    pub meeting_invites_sent: usize,
    pub meeting_invites: BatchSummary<MeetingInvite>,
}

/// Email and calendar channels plus the policy for using them.
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    scheduler: Arc<dyn MeetingScheduler>,
    top_n: usize,
    window: MeetingWindow,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        scheduler: Arc<dyn MeetingScheduler>,
        config: &NotificationConfig,
    ) -> Self {
        Self {
            mailer,
            scheduler,
            top_n: config.top_n,
            window: meeting_window(config),
        }
    }

    /// Logging-only channels; nothing leaves the process.
    pub fn dry_run(config: &NotificationConfig) -> Self {
        Self::new(
            Arc::new(DryRunMailer),
            Arc::new(DryRunScheduler::new(config.meeting_base_url.clone())),
            config,
        )
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn send_emails(
        &self,
        recipients: &[RecruiterReadyRecord],
        template: &EmailTemplate,
    ) -> BatchReport<EmailReceipt> {
        send_email_batch(self.mailer.as_ref(), recipients, template)
    }

    /// Invites the top scorers; `top_n` overrides the configured default.
    pub fn send_meeting_invites(
        &self,
        candidates: &[RecruiterReadyRecord],
        top_n: Option<usize>,
        now: DateTime<Utc>,
    ) -> BatchReport<MeetingInvite> {
        send_meeting_invites(
            self.scheduler.as_ref(),
            candidates,
            top_n.unwrap_or(self.top_n),
            self.window,
            now,
        )
    }

    /// Emails everyone, then invites the top `top_n` to interviews.
    pub fn notify(
        &self,
        candidates: &[RecruiterReadyRecord],
        template: &EmailTemplate,
        now: DateTime<Utc>,
    ) -> NotificationSummary {
        let emails = self.send_emails(candidates, template);
        let meetings = self.send_meeting_invites(candidates, None, now);
        NotificationSummary {
            emails_sent: emails.succeeded(),
            email_results: emails.summary(),
            meeting_invites_sent: meetings.succeeded(),
            meeting_invites: meetings.summary(),
        }
    }
}

fn meeting_window(config: &NotificationConfig) -> MeetingWindow {
    MeetingWindow::new(config.meeting_lead_days, config.meeting_duration_minutes).unwrap_or_else(
        || {
            warn!(
                lead_days = config.meeting_lead_days,
                duration_minutes = config.meeting_duration_minutes,
                "meeting window out of range, using default"
            );
            MeetingWindow::default()
        },
    )
}
