use tracing::debug;

use super::domain::{CandidateRecord, TestId};

/// Candidates requested per page from the assessment platform.
pub const PAGE_SIZE: usize = 50;

/// One page of candidate records plus the continuation signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePage {
    pub records: Vec<CandidateRecord>,
    pub has_more: bool,
}

/// Transport capability: fetch a single page of results for a test.
pub trait PageFetcher {
    fn fetch_page(
        &self,
        test_id: TestId,
        offset: usize,
        limit: usize,
    ) -> Result<CandidatePage, TransportError>;
}

/// Capability consumed by the pipeline: every candidate for a test.
pub trait CandidateSource {
    fn candidates(&self, test_id: TestId) -> Result<Vec<CandidateRecord>, TransportError>;
}

/// Transport capability: invite one person to a test.
pub trait Inviter {
    fn send_invite(&self, test_id: TestId, email: &str, name: &str) -> Result<(), InviteError>;
}

/// A per-operation session able to both read results and send invites.
pub trait ScreeningSession: CandidateSource + Inviter {}

impl<T> ScreeningSession for T where T: CandidateSource + Inviter {}

/// Chooses where candidate data comes from. Selected once at startup.
pub trait ScreeningBackend: Send + Sync {
    /// Opens a fresh session; failing here aborts the whole operation.
    fn open_session(&self) -> Result<Box<dyn ScreeningSession>, BackendError>;

    /// Whether responses are served from the bundled fixture dataset.
    fn uses_fixtures(&self) -> bool;
}

/// Follows the offset cursor until the platform reports no further pages.
///
/// Pages are concatenated in arrival order. The first failing page aborts the
/// retrieval and nothing gathered so far is returned.
pub fn get_all_candidates<F>(
    fetcher: &F,
    test_id: TestId,
) -> Result<Vec<CandidateRecord>, TransportError>
where
    F: PageFetcher + ?Sized,
{
    let mut candidates = Vec::new();
    let mut offset = 0;

    loop {
        let page = fetcher.fetch_page(test_id, offset, PAGE_SIZE)?;
        debug!(%test_id, offset, batch = page.records.len(), has_more = page.has_more, "fetched candidate page");
        candidates.extend(page.records);

        if !page.has_more {
            break;
        }

        offset += PAGE_SIZE;
    }

    Ok(candidates)
}

/// Failure while talking to the assessment platform.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request for test {test_id} failed with status {status}: {body}")]
    Status {
        test_id: TestId,
        status: u16,
        body: String,
    },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response payload: {0}")]
    Decode(String),
}

/// Failure to invite a single candidate.
#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("no email address provided")]
    MissingEmail,
    #[error("invite rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure to establish a session with the data backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HackerRank credentials are not configured (set ACCESS_TOKEN or API_TOKEN)")]
    MissingCredentials,
    #[error("unable to build HTTP session: {0}")]
    Session(String),
}
