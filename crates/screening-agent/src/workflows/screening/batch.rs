use serde::Serialize;

/// Why a single recipient in a batch could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub error: String,
}

impl BatchFailure {
    pub fn new(email: Option<&str>, name: Option<&str>, error: impl ToString) -> Self {
        Self {
            email: email.map(str::to_string),
            name: name.map(str::to_string),
            error: error.to_string(),
        }
    }
}

/// Ordered per-item outcomes of a fault-isolated batch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    outcomes: Vec<Result<T, BatchFailure>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn record(&mut self, outcome: Result<T, BatchFailure>) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[Result<T, BatchFailure>] {
        &self.outcomes
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.outcomes.iter().filter_map(|outcome| outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchFailure> {
        self.outcomes.iter().filter_map(|outcome| outcome.as_ref().err())
    }

    pub fn summary(&self) -> BatchSummary<T>
    where
        T: Clone,
    {
        BatchSummary {
            attempted: self.attempted(),
            succeeded: self.succeeded(),
            successful: self.successes().cloned().collect(),
            failed: self.failures().cloned().collect(),
        }
    }
}

impl<T> FromIterator<Result<T, BatchFailure>> for BatchReport<T> {
    fn from_iter<I: IntoIterator<Item = Result<T, BatchFailure>>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Serializable roll-up of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary<T> {
    pub attempted: usize,
    pub succeeded: usize,
    pub successful: Vec<T>,
    pub failed: Vec<BatchFailure>,
}
