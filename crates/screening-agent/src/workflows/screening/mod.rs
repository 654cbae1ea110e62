//! Two-stage candidate screening: fetch, filter, invite, join, notify.

pub mod batch;
pub mod domain;
pub mod export;
pub mod fixtures;
pub mod hackerrank;
pub mod invites;
pub mod notify;
pub mod pipeline;
pub mod prompts;
pub mod router;
pub mod scoring;
pub mod service;
pub mod source;

pub use batch::{BatchFailure, BatchReport, BatchSummary};
pub use domain::{CandidateRecord, CandidateStatus, RecruiterReadyRecord, ScoreValue, TestId};
pub use invites::{dispatch_invitations, InviteReceipt, InviteTarget};
pub use pipeline::{PipelineError, PipelinePlan, PipelineReport, ScreeningPipeline, StageSummary};
pub use router::screening_router;
pub use scoring::{extract_score, filter_passed};
pub use service::{backend_from_config, into_payload, ScreeningService, ScreeningServiceError};
pub use source::{
    get_all_candidates, BackendError, CandidateSource, InviteError, Inviter, PageFetcher,
    ScreeningBackend, ScreeningSession, TransportError,
};

#[cfg(test)]
mod tests;
