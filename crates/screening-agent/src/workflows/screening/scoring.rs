use super::domain::CandidateRecord;

/// Normalized score: `percentage_score` when numeric, then `score`, else zero.
pub fn extract_score(candidate: &CandidateRecord) -> f64 {
    candidate
        .percentage_score
        .as_ref()
        .and_then(|value| value.as_number())
        .or_else(|| candidate.score.as_ref().and_then(|value| value.as_number()))
        .unwrap_or(0.0)
}

/// Candidates whose extracted score meets the inclusive threshold, in input order.
pub fn filter_passed(candidates: &[CandidateRecord], threshold: f64) -> Vec<CandidateRecord> {
    candidates
        .iter()
        .filter(|candidate| extract_score(candidate) >= threshold)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::screening::domain::ScoreValue;
    use serde_json::json;

    fn scored(email: &str, score: f64) -> CandidateRecord {
        CandidateRecord::new(email).with_percentage_score(score)
    }

    #[test]
    fn prefers_percentage_score() {
        let record = CandidateRecord::new("a@example.com")
            .with_percentage_score(85.5)
            .with_score(85.0);
        assert_eq!(extract_score(&record), 85.5);
    }

    #[test]
    fn falls_back_to_score_when_percentage_missing_or_not_numeric() {
        let record = CandidateRecord::new("a@example.com").with_score(75.0);
        assert_eq!(extract_score(&record), 75.0);

        let mut record = record;
        record.percentage_score = Some(ScoreValue::Other(json!("75%")));
        assert_eq!(extract_score(&record), 75.0);
    }

    #[test]
    fn missing_or_invalid_scores_are_zero() {
        assert_eq!(extract_score(&CandidateRecord::default()), 0.0);

        let record = CandidateRecord {
            percentage_score: Some(ScoreValue::Other(json!(true))),
            score: Some(ScoreValue::Other(json!(null))),
            ..CandidateRecord::default()
        };
        assert_eq!(extract_score(&record), 0.0);
    }

    #[test]
    fn extraction_is_repeatable() {
        let record = scored("a@example.com", 64.0);
        assert_eq!(extract_score(&record), extract_score(&record));
    }

    #[test]
    fn filter_keeps_threshold_matches_in_order() {
        let candidates = vec![
            scored("alice@example.com", 85.0),
            scored("bob@example.com", 65.0),
            scored("charlie@example.com", 75.0),
            scored("diana@example.com", 90.0),
        ];

        let passed = filter_passed(&candidates, 70.0);
        let emails: Vec<_> = passed.iter().filter_map(CandidateRecord::email).collect();
        assert_eq!(
            emails,
            vec!["alice@example.com", "charlie@example.com", "diana@example.com"]
        );
        assert_eq!(candidates.len(), 4, "input is untouched");
        assert_eq!(filter_passed(&candidates, 70.0), passed);
    }

    #[test]
    fn threshold_is_inclusive() {
        let candidates = vec![scored("edge@example.com", 70.0), scored("below@example.com", 69.99)];
        let passed = filter_passed(&candidates, 70.0);
        assert_eq!(passed.len(), 1);
        assert_eq!(passed[0].email(), Some("edge@example.com"));
    }

    #[test]
    fn empty_and_unbounded_thresholds() {
        assert!(filter_passed(&[], 50.0).is_empty());

        let candidates = vec![scored("a@example.com", 10.0), CandidateRecord::default()];
        assert_eq!(filter_passed(&candidates, f64::NEG_INFINITY), candidates);
        assert!(filter_passed(&candidates, 101.0).is_empty());
    }

    #[test]
    fn unscored_candidates_only_pass_non_positive_thresholds() {
        let candidates = vec![CandidateRecord::new("pending@example.com")];
        assert_eq!(filter_passed(&candidates, 0.0).len(), 1);
        assert!(filter_passed(&candidates, 0.1).is_empty());
    }
}
