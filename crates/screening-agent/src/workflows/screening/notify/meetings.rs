use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::DeliveryError;
use crate::workflows::screening::batch::{BatchFailure, BatchReport};
use crate::workflows::screening::domain::{format_score, RecruiterReadyRecord};
use crate::workflows::screening::source::InviteError;

/// Everything a calendar backend needs to book one interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    pub title: String,
    pub description: String,
    pub attendee_email: String,
    pub attendee_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledMeeting {
    pub event_id: String,
    pub meet_link: String,
}

/// Calendar backend issuing meeting invites.
pub trait MeetingScheduler: Send + Sync {
    fn schedule(&self, request: &MeetingRequest) -> Result<ScheduledMeeting, DeliveryError>;
}

/// When interviews are placed relative to the moment the batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingWindow {
    pub lead: Duration,
    pub duration: Duration,
}

impl Default for MeetingWindow {
    fn default() -> Self {
        Self {
            lead: Duration::days(7),
            duration: Duration::minutes(30),
        }
    }
}

impl MeetingWindow {
    /// `None` when either span is negative or too large to represent.
    pub fn new(lead_days: i64, duration_minutes: i64) -> Option<Self> {
        if lead_days < 0 || duration_minutes <= 0 {
            return None;
        }
        Some(Self {
            lead: Duration::try_days(lead_days)?,
            duration: Duration::try_minutes(duration_minutes)?,
        })
    }

    /// Start and end of the interview slot, or `None` past the calendar range.
    pub fn slot(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = now.checked_add_signed(self.lead)?;
        Some((start, start.checked_add_signed(self.duration)?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingInvite {
    pub email: String,
    pub name: String,
    pub score: f64,
    pub meeting_title: String,
    pub meeting_start: DateTime<Utc>,
    pub meeting_end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub meet_link: String,
    pub event_id: String,
}

/// Highest scores first; equal scores keep their input order.
pub fn select_top_candidates(
    candidates: &[RecruiterReadyRecord],
    top_n: usize,
) -> Vec<&RecruiterReadyRecord> {
    let mut ranked: Vec<&RecruiterReadyRecord> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_n);
    ranked
}

/// Books interviews for the top `top_n` candidates. Everyone else is skipped silently.
pub fn send_meeting_invites<S>(
    scheduler: &S,
    candidates: &[RecruiterReadyRecord],
    top_n: usize,
    window: MeetingWindow,
    now: DateTime<Utc>,
) -> BatchReport<MeetingInvite>
where
    S: MeetingScheduler + ?Sized,
{
    let slot = window.slot(now);
    let report: BatchReport<MeetingInvite> = select_top_candidates(candidates, top_n)
        .into_iter()
        .map(|candidate| match slot {
            Some((start, end)) => invite_one(scheduler, candidate, start, end),
            None => Err(BatchFailure::new(
                candidate.email(),
                candidate.name.as_deref(),
                DeliveryError::Rejected("meeting slot is out of range".to_string()),
            )),
        })
        .collect();

    info!(
        top_n,
        considered = candidates.len(),
        sent = report.succeeded(),
        failed = report.failed(),
        "meeting invite batch finished"
    );
    report
}

fn invite_one<S>(
    scheduler: &S,
    candidate: &RecruiterReadyRecord,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<MeetingInvite, BatchFailure>
where
    S: MeetingScheduler + ?Sized,
{
    let Some(email) = candidate.email() else {
        return Err(BatchFailure::new(
            None,
            candidate.name.as_deref(),
            InviteError::MissingEmail,
        ));
    };

    let name = candidate.display_name();
    let request = MeetingRequest {
        title: format!("Interview: {name}"),
        description: format!(
            "Follow-up interview for {name}, who passed the technical assessments with a score of {}%.",
            format_score(candidate.score)
        ),
        attendee_email: email.to_string(),
        attendee_name: name.to_string(),
        start,
        end,
    };

    let scheduled = scheduler.schedule(&request).map_err(|err| {
        warn!(email, error = %err, "meeting invite failed");
        BatchFailure::new(Some(email), Some(name), err)
    })?;

    Ok(MeetingInvite {
        email: email.to_string(),
        name: name.to_string(),
        score: candidate.score,
        meeting_title: request.title,
        meeting_start: start,
        meeting_end: end,
        duration_minutes: (end - start).num_minutes(),
        meet_link: scheduled.meet_link,
        event_id: scheduled.event_id,
    })
}
