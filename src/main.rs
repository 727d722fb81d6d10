use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use release_libs::cli::{run_release_workflow, ReleaseWorkflowArgs};
use release_libs::ui;

#[derive(clap::Parser)]
#[command(
    name = "release-libs",
    version,
    about = "Release changed libraries and pin them in the primary project"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Task number used in merge and commit messages")]
    task: Option<String>,

    #[arg(short, long, help = "Primary project directory (defaults to current directory)")]
    project: Option<PathBuf>,

    #[arg(short, long, help = "Accept the default answer of every confirmation")]
    yes: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

impl From<Args> for ReleaseWorkflowArgs {
    fn from(args: Args) -> Self {
        ReleaseWorkflowArgs {
            config_path: args.config,
            task: args.task,
            project: args.project,
            accept_defaults: args.yes,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stderr keeps log lines apart from operator output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run_release_workflow(args.into()) {
        Ok(report) => ui::display_run_summary(&report),
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
