use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::ffi::OsString;
use std::path::PathBuf;

use app_launcher::update::{self, AutoConfirm, FeedClient, Orchestrator, Outcome, Settings};
use app_launcher::{interrupt, logging, Config};

#[derive(Parser, Debug)]
#[command(name = "launcher", version)]
#[command(about = "Update the application from its latest GitHub release, then start it", long_about = None)]
struct Cli {
    /// Path to a launcher.toml (defaults to the one beside the launcher)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Install updates without asking
    #[arg(short, long)]
    yes: bool,

    /// Only report what would happen; install and start nothing
    #[arg(long)]
    check: bool,

    /// Do not contact the release feed
    #[arg(long)]
    offline: bool,

    /// Hide the download progress bar
    #[arg(short, long)]
    quiet: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Arguments passed through to the application
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<OsString>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            Outcome::LaunchFailed.code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;
    let feed = FeedClient::new(config.feed_config())?;

    let settings = Settings {
        install_dir: config.install_dir()?,
        executable: config.executable.clone(),
        offline: cli.offline,
        fallback_on_update_failure: config.fallback_on_update_failure,
        show_progress: !cli.quiet && !cli.check,
        args: cli.args,
    };

    let mut orchestrator = Orchestrator::new(feed, settings);
    if cli.yes || config.auto_confirm {
        orchestrator = orchestrator.with_confirm(AutoConfirm(true));
    }

    if cli.check {
        update::print_report(&orchestrator.check());
        return Ok(0);
    }

    if let Err(e) = interrupt::cancel_on_interrupt(orchestrator.cancel_handle()) {
        tracing::warn!("cannot install Ctrl-C handler: {}", e);
    }

    let outcome = orchestrator.run();
    if outcome == Outcome::ApplicationStartedAndUpdated {
        println!("{} Updated and started", "✓".green());
    } else if !outcome.is_started() {
        eprintln!(
            "{} Application not started ({:?}, exit {})",
            "✗".red(),
            outcome,
            outcome.code()
        );
    }
    Ok(outcome.code())
}
