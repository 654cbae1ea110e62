use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::domain::RecruiterReadyRecord;

#[derive(Debug)]
pub enum ShortlistExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ShortlistExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShortlistExportError::Io(err) => write!(f, "failed to write shortlist: {}", err),
            ShortlistExportError::Csv(err) => write!(f, "failed to encode shortlist CSV: {}", err),
        }
    }
}

impl std::error::Error for ShortlistExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShortlistExportError::Io(err) => Some(err),
            ShortlistExportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ShortlistExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ShortlistExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Serialize)]
struct ShortlistRow<'a> {
    email: &'a str,
    name: &'a str,
    score: f64,
    test_a_score: Option<f64>,
}

/// Writes the recruiter-ready list as `email,name,score,test_a_score` rows.
pub fn write_shortlist<W: Write>(
    writer: W,
    candidates: &[RecruiterReadyRecord],
) -> Result<(), ShortlistExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for candidate in candidates {
        csv_writer.serialize(ShortlistRow {
            email: candidate.email().unwrap_or_default(),
            name: candidate.name.as_deref().unwrap_or_default(),
            score: candidate.score,
            test_a_score: candidate.test_a_score,
        })?;
    }
    if candidates.is_empty() {
        csv_writer.write_record(["email", "name", "score", "test_a_score"])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_shortlist<P: AsRef<Path>>(
    path: P,
    candidates: &[RecruiterReadyRecord],
) -> Result<(), ShortlistExportError> {
    let file = File::create(path)?;
    write_shortlist(file, candidates)
}
