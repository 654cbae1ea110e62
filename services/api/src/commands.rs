use crate::infra::{bootstrap, parse_score, parse_test_id};
use clap::Args;
use screening_agent::config::AppConfig;
use screening_agent::error::AppError;
use screening_agent::workflows::screening::batch::BatchFailure;
use screening_agent::workflows::screening::domain::{format_score, TestId};
use screening_agent::workflows::screening::export::export_shortlist;
use screening_agent::workflows::screening::service::{
    CandidateSummary, PipelineRequest, PipelineResponse, TestSummary,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Default)]
pub(crate) struct PipelineArgs {
    /// Initial test id (defaults to TEST_A_ID)
    #[arg(long, value_parser = parse_test_id)]
    pub(crate) test_a: Option<u64>,
    /// Advanced test id (defaults to TEST_B_ID)
    #[arg(long, value_parser = parse_test_id)]
    pub(crate) test_b: Option<u64>,
    /// Passing score for the initial test
    #[arg(long, value_parser = parse_score)]
    pub(crate) a_score: Option<f64>,
    /// Passing score for the advanced test
    #[arg(long, value_parser = parse_score)]
    pub(crate) b_score: Option<f64>,
    /// Email the shortlist and book interviews for the top scorers
    #[arg(long)]
    pub(crate) notify: bool,
    /// Write the recruiter shortlist to a CSV file
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
    /// Print the raw JSON response
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PassedArgs {
    /// Test id (defaults to TEST_A_ID)
    #[arg(long, value_parser = parse_test_id)]
    pub(crate) test: Option<u64>,
    /// Minimum score to pass (defaults to 60)
    #[arg(long, value_parser = parse_score)]
    pub(crate) score: Option<f64>,
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ScoresArgs {
    /// Test id (defaults to TEST_A_ID)
    #[arg(long, value_parser = parse_test_id)]
    pub(crate) test: Option<u64>,
    /// Only show the candidate with this email
    #[arg(long)]
    pub(crate) email: Option<String>,
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CandidatesArgs {
    /// Test id (defaults to TEST_A_ID)
    #[arg(long, value_parser = parse_test_id)]
    pub(crate) test: Option<u64>,
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct InviteArgs {
    /// Test id (defaults to TEST_B_ID)
    #[arg(long, value_parser = parse_test_id)]
    pub(crate) test: Option<u64>,
    /// Email addresses to invite
    #[arg(required = true)]
    pub(crate) emails: Vec<String>,
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_pipeline(args: PipelineArgs) -> Result<(), AppError> {
    let (_, service) = bootstrap()?;
    let request = PipelineRequest {
        test_a_id: args.test_a.map(TestId),
        test_b_id: args.test_b.map(TestId),
        test_a_pass_score: args.a_score,
        test_b_pass_score: args.b_score,
        notify: args.notify.then_some(true),
    };

    let response = service.run_pipeline(request)?;
    finish_pipeline(
        &mut io::stdout().lock(),
        &response,
        args.export.as_deref(),
        args.json,
    )
}

/// Exports the shortlist, then always prints the run report before surfacing an export failure.
fn finish_pipeline<W: Write>(
    out: &mut W,
    response: &PipelineResponse,
    export: Option<&Path>,
    json: bool,
) -> Result<(), AppError> {
    let exported = export.map(|path| {
        export_shortlist(path, &response.report.recruiter_ready_candidates).map(|()| path)
    });

    if json {
        writeln!(out, "{}", to_pretty_json(response))?;
    } else {
        write_pipeline_report(out, response)?;
    }

    match exported {
        Some(Ok(path)) if !json => {
            writeln!(out, "\nShortlist written to {}", path.display())?;
            Ok(())
        }
        Some(Err(err)) => Err(err.into()),
        _ => Ok(()),
    }
}

fn write_pipeline_report<W: Write>(out: &mut W, response: &PipelineResponse) -> io::Result<()> {
    let report = &response.report;
    writeln!(out, "Screening pipeline{}", data_source_suffix(response.fixture_data))?;
    for (label, stage) in [("Test A", &report.test_a), ("Test B", &report.test_b)] {
        writeln!(
            out,
            "- {} ({}): {} of {} passed at {}",
            label,
            stage.id,
            stage.passed_count,
            stage.total_candidates,
            format_score(stage.passing_score)
        )?;
    }
    writeln!(out, "- Invited to Test B: {}", report.invited_to_test_b)?;
    write_failures(out, "  Invite failures", &report.invite_failures)?;

    writeln!(out, "\nRecruiter-ready candidates ({})", report.recruiter_ready_count)?;
    for candidate in &report.recruiter_ready_candidates {
        let test_a = candidate
            .test_a_score
            .map(format_score)
            .unwrap_or_else(|| "n/a".to_string());
        writeln!(
            out,
            "  - {} <{}>: Test B {} | Test A {}",
            candidate.display_name(),
            candidate.email().unwrap_or("no email"),
            format_score(candidate.score),
            test_a
        )?;
    }

    if let Some(notifications) = &report.notifications {
        writeln!(
            out,
            "\nNotifications: {} emails sent, {} interviews booked",
            notifications.emails_sent, notifications.meeting_invites_sent
        )?;
        for invite in &notifications.meeting_invites.successful {
            writeln!(
                out,
                "  - {} on {} ({} min): {}",
                invite.name,
                invite.meeting_start.format("%Y-%m-%d %H:%M UTC"),
                invite.duration_minutes,
                invite.meet_link
            )?;
        }
        write_failures(out, "  Email failures", &notifications.email_results.failed)?;
        write_failures(out, "  Meeting failures", &notifications.meeting_invites.failed)?;
    }
    Ok(())
}

pub(crate) fn run_passed(args: PassedArgs) -> Result<(), AppError> {
    let (config, service) = bootstrap()?;
    let test_id = args.test.map(TestId).unwrap_or(config.screening.test_a_id);
    let response = service.get_passed_candidates(test_id, args.score)?;
    if args.json {
        print_json(&response);
        return Ok(());
    }

    println!(
        "Test {}{}: {} of {} passed at {}",
        response.test_id,
        data_source_suffix(response.fixture_data),
        response.passed_count,
        response.total,
        format_score(response.passing_score)
    );
    print_candidates(&response.passed_candidates);
    Ok(())
}

pub(crate) fn run_scores(args: ScoresArgs) -> Result<(), AppError> {
    let (config, service) = bootstrap()?;
    let test_id = args.test.map(TestId).unwrap_or(config.screening.test_a_id);
    let response = service.get_scores(test_id, args.email.as_deref())?;
    if args.json {
        print_json(&response);
        return Ok(());
    }

    println!(
        "Test {}{}: showing {} of {} candidates",
        response.test_id,
        data_source_suffix(response.fixture_data),
        response.filtered_count,
        response.total
    );
    for entry in &response.candidates {
        let raw = entry
            .raw_percentage
            .map(format_score)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  - {} <{}>: {} (raw {}) [{}]",
            entry.name.as_deref().unwrap_or("Unknown"),
            entry.email.as_deref().unwrap_or("no email"),
            format_score(entry.score),
            raw,
            entry.status.as_deref().unwrap_or("unknown status")
        );
    }
    Ok(())
}

pub(crate) fn run_candidates(args: CandidatesArgs) -> Result<(), AppError> {
    let (config, service) = bootstrap()?;
    let test_id = args.test.map(TestId).unwrap_or(config.screening.test_a_id);
    let response = service.test_candidates(test_id)?;
    if args.json {
        print_json(&response);
        return Ok(());
    }

    println!(
        "Test {}{}: {} candidates",
        response.test_id,
        data_source_suffix(response.fixture_data),
        response.total
    );
    print_candidates(&response.candidates);
    Ok(())
}

pub(crate) fn run_invite(args: InviteArgs) -> Result<(), AppError> {
    let (config, service) = bootstrap()?;
    let test_id = args.test.map(TestId).unwrap_or(config.screening.test_b_id);
    let response = service.invite_candidates(test_id, args.emails)?;
    if args.json {
        print_json(&response);
        return Ok(());
    }

    println!(
        "Invited {} candidates to test {}{}",
        response.total_invited,
        response.test_id,
        data_source_suffix(response.fixture_data)
    );
    for email in &response.successful {
        println!("  - {email}");
    }
    print_failures("Failed invites", &response.failed);
    Ok(())
}

pub(crate) fn run_tests() -> Result<(), AppError> {
    let (_, service) = bootstrap()?;
    let response = service.list_tests()?;

    println!("Configured tests{}", data_source_suffix(response.fixture_data));
    for test in &response.tests {
        print_test(test);
    }
    Ok(())
}

pub(crate) fn run_config() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    print_json(&config.view());
    Ok(())
}

fn print_test(test: &TestSummary) {
    println!("- {} [{}] ({})", test.name, test.kind, test.id);
    if let Some(description) = &test.description {
        println!("  {description}");
    }
    match (test.average_score, test.min_score, test.max_score) {
        (Some(average), Some(min), Some(max)) => println!(
            "  {} candidates | avg {:.2} | min {} | max {}",
            test.candidate_count,
            average,
            format_score(min),
            format_score(max)
        ),
        _ => println!("  {} candidates | no scores yet", test.candidate_count),
    }
    if let Some(note) = &test.note {
        println!("  Note: {note}");
    }
}

fn print_candidates(candidates: &[CandidateSummary]) {
    for candidate in candidates {
        println!(
            "  - {} <{}>: {}",
            candidate.name.as_deref().unwrap_or("Unknown"),
            candidate.email.as_deref().unwrap_or("no email"),
            format_score(candidate.score)
        );
    }
}

fn print_failures(heading: &str, failures: &[BatchFailure]) {
    if let Err(err) = write_failures(&mut io::stdout().lock(), heading, failures) {
        eprintln!("failed to print {heading}: {err}");
    }
}

fn write_failures<W: Write>(
    out: &mut W,
    heading: &str,
    failures: &[BatchFailure],
) -> io::Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(out, "{heading}:")?;
    for failure in failures {
        writeln!(
            out,
            "  - {}: {}",
            failure.email.as_deref().unwrap_or("(no email)"),
            failure.error
        )?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", to_pretty_json(value));
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|err| format!("JSON output unavailable: {}", err))
}

fn data_source_suffix(fixture_data: bool) -> &'static str {
    if fixture_data {
        " (fixture data)"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screening_agent::config::{NotificationConfig, ScreeningConfig};
    use screening_agent::workflows::screening::fixtures::{
        FixtureBackend, ADVANCED_TEST_ID, INITIAL_TEST_ID,
    };
    use screening_agent::workflows::screening::notify::Notifier;
    use screening_agent::workflows::screening::ScreeningService;
    use std::sync::Arc;

    fn fixture_response() -> PipelineResponse {
        let notifications = NotificationConfig::default();
        let service = ScreeningService::new(
            Arc::new(FixtureBackend),
            Notifier::dry_run(&notifications),
            ScreeningConfig {
                test_a_id: INITIAL_TEST_ID,
                test_b_id: ADVANCED_TEST_ID,
                use_fixture_data: true,
                ..ScreeningConfig::default()
            },
            &notifications,
        );
        service
            .run_pipeline(PipelineRequest::default())
            .expect("fixture pipeline runs")
    }

    #[test]
    fn report_is_printed_even_when_export_fails() {
        let response = fixture_response();
        let missing_dir = std::env::temp_dir()
            .join("screening-agent-missing-dir")
            .join("nested")
            .join("shortlist.csv");
        let mut out = Vec::new();

        let result = finish_pipeline(&mut out, &response, Some(&missing_dir), false);

        assert!(matches!(result, Err(AppError::Export(_))));
        let printed = String::from_utf8(out).expect("utf8 output");
        assert!(printed.contains("Screening pipeline (fixture data)"));
        assert!(printed.contains("Recruiter-ready candidates (7)"));
        assert!(!printed.contains("Shortlist written"));
    }

    #[test]
    fn json_report_is_printed_before_export_error() {
        let response = fixture_response();
        let missing_dir = std::env::temp_dir()
            .join("screening-agent-missing-dir")
            .join("nested")
            .join("shortlist.csv");
        let mut out = Vec::new();

        let result = finish_pipeline(&mut out, &response, Some(&missing_dir), true);

        assert!(result.is_err());
        let printed: serde_json::Value =
            serde_json::from_slice(&out).expect("report printed as json");
        assert_eq!(printed["recruiter_ready_count"], 7);
    }

    #[test]
    fn successful_export_is_reported_after_the_summary() {
        let response = fixture_response();
        let path = std::env::temp_dir().join(format!(
            "screening-agent-shortlist-{}.csv",
            std::process::id()
        ));
        let mut out = Vec::new();

        finish_pipeline(&mut out, &response, Some(&path), false).expect("export succeeds");

        let printed = String::from_utf8(out).expect("utf8 output");
        assert!(printed.trim_end().ends_with(&format!("Shortlist written to {}", path.display())));
        let _ = std::fs::remove_file(&path);
    }
}
