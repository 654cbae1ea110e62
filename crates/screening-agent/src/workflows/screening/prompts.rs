//! Canned analysis prompts for an assistant driving the screening operations.

use super::domain::{format_score, TestId};

pub const DEFAULT_ANALYSIS_PASSING_SCORE: f64 = 70.0;

pub fn analyze_test_results(test_id: TestId, passing_score: Option<f64>) -> String {
    let passing_score = format_score(passing_score.unwrap_or(DEFAULT_ANALYSIS_PASSING_SCORE));
    format!(
        "Review the results of HackerRank test {test_id} using a passing score of {passing_score}.

Steps:
1. Load every candidate who attempted the test
2. Count how many passed and how many fell short
3. Work out the pass rate
4. Point out notable patterns in the score distribution
5. Suggest what the hiring team should do next"
    )
}

pub fn generate_recruiter_summary(test_a_id: TestId, test_b_id: TestId) -> String {
    format!(
        "Prepare a recruiter briefing on candidates who cleared both assessments.

Initial test (A): {test_a_id}
Advanced test (B): {test_b_id}

Steps:
1. Load the candidates who passed test A
2. Load the candidates who passed test B
3. Keep only the candidates who passed both
4. List each one with name, email and both scores
5. Present the list so a recruiter can act on it directly"
    )
}
