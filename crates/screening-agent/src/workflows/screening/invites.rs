use serde::Serialize;
use tracing::{info, warn};

use super::batch::{BatchFailure, BatchReport};
use super::domain::{CandidateRecord, TestId};
use super::source::{InviteError, Inviter};

/// Someone to invite: a fetched candidate or a bare email address.
#[derive(Debug, Clone, PartialEq)]
pub enum InviteTarget {
    Candidate(CandidateRecord),
    Email(String),
}

impl InviteTarget {
    fn email(&self) -> Option<&str> {
        match self {
            InviteTarget::Candidate(candidate) => candidate.email(),
            InviteTarget::Email(raw) => Some(raw.trim()).filter(|email| !email.is_empty()),
        }
    }

    fn invite_name(&self) -> &str {
        match self {
            InviteTarget::Candidate(candidate) => candidate.invite_name(),
            InviteTarget::Email(raw) => raw.trim().split('@').next().unwrap_or_default(),
        }
    }

    fn display_name(&self) -> Option<&str> {
        match self {
            InviteTarget::Candidate(candidate) => candidate.display_name(),
            InviteTarget::Email(_) => None,
        }
    }
}

impl From<CandidateRecord> for InviteTarget {
    fn from(value: CandidateRecord) -> Self {
        Self::Candidate(value)
    }
}

impl From<String> for InviteTarget {
    fn from(value: String) -> Self {
        Self::Email(value)
    }
}

/// Confirmation that an invitation was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteReceipt {
    pub email: String,
    pub name: String,
}

/// Issues one invite per target; individual failures never stop the batch.
pub fn dispatch_invitations<I, T>(
    inviter: &I,
    test_id: TestId,
    targets: impl IntoIterator<Item = T>,
) -> BatchReport<InviteReceipt>
where
    I: Inviter + ?Sized,
    T: Into<InviteTarget>,
{
    let report: BatchReport<InviteReceipt> = targets
        .into_iter()
        .map(|target| invite_one(inviter, test_id, &target.into()))
        .collect();

    info!(
        %test_id,
        attempted = report.attempted(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "invitation batch finished"
    );
    report
}

fn invite_one<I>(
    inviter: &I,
    test_id: TestId,
    target: &InviteTarget,
) -> Result<InviteReceipt, BatchFailure>
where
    I: Inviter + ?Sized,
{
    let Some(email) = target.email() else {
        warn!(%test_id, "skipping invite for candidate without email");
        return Err(BatchFailure::new(
            None,
            target.display_name(),
            InviteError::MissingEmail,
        ));
    };

    let name = target.invite_name();
    match inviter.send_invite(test_id, email, name) {
        Ok(()) => Ok(InviteReceipt {
            email: email.to_string(),
            name: name.to_string(),
        }),
        Err(err) => {
            warn!(%test_id, email, error = %err, "invite failed");
            Err(BatchFailure::new(Some(email), target.display_name(), err))
        }
    }
}
