pub mod confirm;
pub mod decision;
pub mod github;
pub mod installer;
pub mod launcher;
pub mod orchestrator;
pub mod probe;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;

use colored::Colorize;

pub use confirm::{AutoConfirm, Confirm, TerminalPrompt};
pub use decision::{decide, UpdateAction};
pub use github::{Asset, FeedClient, FeedConfig, RemoteRelease};
pub use installer::Installer;
pub use launcher::{Launch, ProcessLauncher};
pub use orchestrator::{LaunchReason, Orchestrator, Outcome, Report, Settings};
pub use probe::LocalInstallation;

/// Print what a run would do, without installing or launching anything
pub fn print_report(report: &Report) {
    let local = report.local.version.as_ref();
    let remote = report.remote_version();

    match local {
        Some(v) => println!(
            "{} Installed: {} ({})",
            "•".cyan(),
            v.to_string().green(),
            report.local.executable.display().to_string().dimmed()
        ),
        None => println!(
            "{} Not installed at {}",
            "•".cyan(),
            report.local.install_dir.display().to_string().dimmed()
        ),
    }

    if let Some(err) = &report.feed_error {
        println!("{} Release feed unavailable: {}", "!".red(), err.dimmed());
    } else if let Some(release) = &report.remote {
        println!(
            "{} Latest release: {} ({})",
            "•".cyan(),
            release.tag.green(),
            version::display(remote)
        );
        if release.asset.is_none() {
            println!("  {}", "No installable asset in this release".yellow());
        }
    } else {
        println!("{} No published release", "•".cyan());
    }

    match (report.action, report.reason) {
        (UpdateAction::InstallAndLaunch, _) => println!(
            "{} New version available: {} → {}",
            "↑".yellow(),
            version::display(local).dimmed(),
            version::display(remote).green()
        ),
        (UpdateAction::Fail, _) => println!(
            "{} Nothing to run and nothing to install",
            "✗".red()
        ),
        (_, Some(LaunchReason::CannotBeUpdated)) => println!(
            "{} Cannot update, the installed version will be started",
            "!".yellow()
        ),
        _ => println!(
            "{} You're running the latest version ({})",
            "✓".green(),
            version::display(local)
        ),
    }
}
