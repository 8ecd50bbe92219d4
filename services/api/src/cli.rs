use crate::demo::{
    run_demo, run_hierarchy_report, run_learner_report, DemoArgs, HierarchyReportArgs,
    LearnerReportArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use campus_progress::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Campus Progress",
    about = "Reconcile learner assessment state and roll up progress across the campus hierarchy",
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
    /// Resolve one learner's assessments
    Learner {
        #[command(subcommand)]
        command: LearnerCommand,
    },
    /// Aggregate progress through institution, department, year and section
    Hierarchy {
        #[command(subcommand)]
        command: HierarchyCommand,
    },
    /// Walk through a learner view and the supervisor dashboard on the sample campus
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum LearnerCommand {
    /// Print the resolved item list and status summary
    Report(LearnerReportArgs),
}

#[derive(Subcommand, Debug)]
enum HierarchyCommand {
    /// Print the aggregated tree and department rankings
    Report(HierarchyReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Campus fixture to serve instead of PROGRESS_FIXTURE or the built-in sample
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Learner {
            command: LearnerCommand::Report(args),
        } => run_learner_report(args).await,
        Command::Hierarchy {
            command: HierarchyCommand::Report(args),
        } => run_hierarchy_report(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
