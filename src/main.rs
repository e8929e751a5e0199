use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use project_release::cli::{run_release_workflow, ReleaseWorkflowArgs};
use project_release::config::{self, CONFIG_FILE, SAMPLE_CONFIG};
use project_release::git::Git2Repository;
use project_release::ui::{self, TerminalSelector};
use project_release::ReleaseError;

#[derive(clap::Parser)]
#[command(
    name = "project-release",
    version,
    about = "A tool to help releasing projects",
    after_help = "The configuration is read from project-release.toml in the current directory or at the repository root"
)]
struct Args {
    #[arg(short, long, help = "Show debug logs")]
    verbose: bool,

    #[arg(short, long, help = "Alternate configuration file (default: project-release.toml)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Print a sample configuration file and exit")]
    sample_config: bool,

    #[arg(long, help = "Do not colorize the output")]
    no_color: bool,

    #[arg(short, long, help = "Remote to fetch from and reconcile with")]
    remote: Option<String>,

    #[arg(short, long, help = "Development branch to release from")]
    development: Option<String>,

    #[arg(short = 'b', long, help = "Release branch to create or update")]
    release: Option<String>,

    #[arg(short, long, help = "Version to release instead of asking for it")]
    new_version: Option<String>,

    #[arg(long, help = "Do not fetch the remote")]
    no_fetch: bool,

    #[arg(long, help = "Do not update the branches from the remote (implies --no-fetch)")]
    no_update: bool,

    #[arg(long, help = "Override tracking branches and reset diverged branches")]
    force_update: bool,

    #[arg(short, long, help = "Skip confirmation prompts")]
    yes: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    if let Err(e) = run(args) {
        if e
            .downcast_ref::<ReleaseError>()
            .is_some_and(ReleaseError::is_cancelled)
        {
            tracing::info!("Cancelled by user");
            return;
        }
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let color = !args.no_color;
    console::set_colors_enabled(color);
    console::set_colors_enabled_stderr(color);

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(color)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // an interrupted prompt ends the run like a declined one
    ctrlc::set_handler(|| {
        eprintln!();
        tracing::info!("Cancelled by user");
        std::process::exit(0);
    })
    .context("Failed to set the interrupt handler")?;
    Ok(())
}

fn run(args: Args) -> Result<()> {
    if args.sample_config {
        print!("{}", SAMPLE_CONFIG);
        return Ok(());
    }

    let repo = Git2Repository::open(".")?;
    let config = config::load_config(args.config.as_deref(), repo.workdir())
        .with_context(|| format!("Failed to load {}", CONFIG_FILE))?;

    let workflow_args = ReleaseWorkflowArgs {
        remote: args.remote,
        development: args.development,
        release: args.release,
        new_version: args.new_version,
        fetch: !args.no_fetch && !args.no_update,
        update: !args.no_update,
        force_update: args.force_update,
        yes: args.yes,
    };

    let result = run_release_workflow(&workflow_args, &config, &repo, &TerminalSelector::new())?;

    ui::display_release_summary(&result);
    ui::display_success(&format!("Version {} is ready to be published", result.version));
    Ok(())
}
