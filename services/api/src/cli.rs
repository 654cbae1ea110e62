use crate::commands::{
    run_candidates, run_config, run_invite, run_passed, run_pipeline, run_scores, run_tests,
    CandidatesArgs, InviteArgs, PassedArgs, PipelineArgs, ScoresArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use screening_agent::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Screening Agent",
    about = "Run the two-stage HackerRank screening pipeline from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run both screening stages and print the recruiter shortlist
    Pipeline(PipelineArgs),
    /// List candidates meeting a passing score
    Passed(PassedArgs),
    /// Show raw scores and attempt status for a test
    Scores(ScoresArgs),
    /// List every candidate who attempted a test
    Candidates(CandidatesArgs),
    /// Invite email addresses to a test
    Invite(InviteArgs),
    /// Summarize the configured tests
    Tests,
    /// Print the active screening configuration without credentials
    Config,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Pipeline(args) => blocking(move || run_pipeline(args)).await,
        Command::Passed(args) => blocking(move || run_passed(args)).await,
        Command::Scores(args) => blocking(move || run_scores(args)).await,
        Command::Candidates(args) => blocking(move || run_candidates(args)).await,
        Command::Invite(args) => blocking(move || run_invite(args)).await,
        Command::Tests => blocking(run_tests).await,
        Command::Config => run_config(),
    }
}

// The HackerRank client is blocking and must stay off the async executor.
async fn blocking<F>(command: F) -> Result<(), AppError>
where
    F: FnOnce() -> Result<(), AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(command)
        .await
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pipeline_flags_parse() {
        let cli = Cli::try_parse_from([
            "screening-agent",
            "pipeline",
            "--test-a",
            "356098",
            "--a-score",
            "75",
            "--notify",
            "--export",
            "shortlist.csv",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Pipeline(args)) => {
                assert_eq!(args.test_a, Some(356098));
                assert_eq!(args.test_b, None);
                assert_eq!(args.a_score, Some(75.0));
                assert!(args.notify);
                assert!(args.export.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn missing_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["screening-agent"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn zero_test_id_is_rejected() {
        assert!(Cli::try_parse_from(["screening-agent", "passed", "--test", "0"]).is_err());
    }
}
