use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use super::email::{Mailer, OutgoingEmail};
use super::meetings::{MeetingRequest, MeetingScheduler, ScheduledMeeting};
use super::DeliveryError;

/// Mailer that logs each message instead of sending it. Nothing is retained.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunMailer;

impl Mailer for DryRunMailer {
    fn deliver(&self, email: &OutgoingEmail) -> Result<(), DeliveryError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            body_len = email.body.len(),
            "dry-run email"
        );
        Ok(())
    }
}

/// Scheduler that fabricates event ids and links under a fixed base URL.
#[derive(Debug)]
pub struct DryRunScheduler {
    base_url: String,
    sequence: AtomicU64,
}

impl DryRunScheduler {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sequence: AtomicU64::new(1),
        }
    }

    fn next_event_id(&self) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("evt-{id:06}")
    }
}

impl MeetingScheduler for DryRunScheduler {
    fn schedule(&self, request: &MeetingRequest) -> Result<ScheduledMeeting, DeliveryError> {
        let event_id = self.next_event_id();
        let meet_link = format!("{}/{event_id}", self.base_url);
        info!(
            attendee = %request.attendee_email,
            start = %request.start,
            %event_id,
            "dry-run meeting invite"
        );
        Ok(ScheduledMeeting {
            event_id,
            meet_link,
        })
    }
}
