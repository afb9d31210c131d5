use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use super::confirm::{Confirm, TerminalPrompt};
use super::decision::{self, UpdateAction};
use super::github::{FeedClient, RemoteRelease};
use super::installer::Installer;
use super::launcher::{Launch, ProcessLauncher};
use super::probe::{self, LocalInstallation};
use super::version;

/// Result of one launcher invocation; `code()` is the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The decision asked for an install without anything to install
    UnexpectedCompareResult,
    NoLocalNorOnlineVersionAvailable,
    ApplicationStartedAndUpToDate,
    ApplicationStartedAndUpdated,
    ApplicationStartedAndCannotBeUpdated,
    UpdateFailed,
    LaunchFailed,
}

impl Outcome {
    pub fn code(self) -> i32 {
        match self {
            Self::UnexpectedCompareResult => -2,
            Self::NoLocalNorOnlineVersionAvailable => -1,
            Self::ApplicationStartedAndUpToDate => 0,
            Self::ApplicationStartedAndUpdated => 1,
            Self::ApplicationStartedAndCannotBeUpdated => 2,
            Self::UpdateFailed => 3,
            Self::LaunchFailed => 4,
        }
    }

    pub fn is_started(self) -> bool {
        matches!(
            self,
            Self::ApplicationStartedAndUpToDate
                | Self::ApplicationStartedAndUpdated
                | Self::ApplicationStartedAndCannotBeUpdated
        )
    }
}

/// Why the local copy is launched without installing anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchReason {
    UpToDate,
    /// Feed unreachable, no release, unparsable tag or no matching asset
    CannotBeUpdated,
    Declined,
}

impl LaunchReason {
    fn outcome(self) -> Outcome {
        match self {
            Self::UpToDate | Self::Declined => Outcome::ApplicationStartedAndUpToDate,
            Self::CannotBeUpdated => Outcome::ApplicationStartedAndCannotBeUpdated,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Probing,
    Deciding,
    Confirming,
    Installing,
    Launching,
    Done,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Probing => "probing",
            Self::Deciding => "deciding",
            Self::Confirming => "confirming",
            Self::Installing => "installing",
            Self::Launching => "launching",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything known before acting on the decision
#[derive(Debug, Clone)]
pub struct Report {
    pub local: LocalInstallation,
    pub remote: Option<RemoteRelease>,
    /// Set when the feed could not be queried
    pub feed_error: Option<String>,
    pub action: UpdateAction,
    /// Set when `action` is `LaunchOnly`
    pub reason: Option<LaunchReason>,
}

impl Report {
    pub fn remote_version(&self) -> Option<&semver::Version> {
        self.remote.as_ref().and_then(|r| r.version.as_ref())
    }
}

/// Where the managed application lives and how to treat it
#[derive(Debug, Clone)]
pub struct Settings {
    pub install_dir: PathBuf,
    pub executable: String,
    /// Skip the release feed entirely
    pub offline: bool,
    /// Launch the existing copy when an install fails instead of aborting
    pub fallback_on_update_failure: bool,
    pub show_progress: bool,
    /// Forwarded to the managed application
    pub args: Vec<OsString>,
}

/// Runs probe, feed query, decision, install and launch in order
pub struct Orchestrator {
    feed: FeedClient,
    settings: Settings,
    confirm: Box<dyn Confirm>,
    launcher: Box<dyn Launch>,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(feed: FeedClient, settings: Settings) -> Self {
        Self {
            feed,
            settings,
            confirm: Box::new(TerminalPrompt),
            launcher: Box::new(ProcessLauncher),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    pub fn with_launcher(mut self, launcher: impl Launch + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Raising this flag aborts an in-flight download
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn enter(&self, state: State) {
        tracing::debug!("state: {}", state);
    }

    /// Probe and query the feed concurrently, then decide
    pub fn check(&self) -> Report {
        self.enter(State::Probing);

        let install_dir = &self.settings.install_dir;
        let executable = &self.settings.executable;
        let (local, remote) = thread::scope(|s| {
            let local = s.spawn(move || probe::probe(install_dir, executable));
            let remote = self.query_feed();
            let local = local.join().unwrap_or_else(|_| LocalInstallation {
                install_dir: install_dir.clone(),
                executable: install_dir.join(executable),
                version: None,
            });
            (local, remote)
        });
        let (remote, feed_error) = remote;

        self.enter(State::Deciding);
        let remote_version = remote.as_ref().and_then(|r| r.version.as_ref());
        let asset_resolved = remote.as_ref().is_some_and(|r| r.asset.is_some());
        let action = decision::decide(local.version.as_ref(), remote_version, asset_resolved);

        let reason = (action == UpdateAction::LaunchOnly).then(|| {
            match (local.version.as_ref(), remote_version) {
                (Some(l), Some(r)) if r <= l => LaunchReason::UpToDate,
                _ => LaunchReason::CannotBeUpdated,
            }
        });

        tracing::info!(
            "local {}, remote {}: {:?}",
            version::display(local.version.as_ref()),
            version::display(remote_version),
            action
        );

        Report {
            local,
            remote,
            feed_error,
            action,
            reason,
        }
    }

    fn query_feed(&self) -> (Option<RemoteRelease>, Option<String>) {
        if self.settings.offline {
            tracing::info!("offline, skipping release feed");
            return (None, None);
        }

        match self.feed.fetch_latest() {
            Ok(release) => (release, None),
            Err(e) => {
                tracing::warn!("{}", e);
                (None, Some(e.to_string()))
            }
        }
    }

    /// Bring the application up to date if possible and start it
    pub fn run(&self) -> Outcome {
        let report = self.check();

        let outcome = match report.action {
            UpdateAction::Fail => {
                tracing::error!("no local installation and no installable release");
                Outcome::NoLocalNorOnlineVersionAvailable
            }
            UpdateAction::NoOp => self.launch_local(&report.local, LaunchReason::UpToDate),
            UpdateAction::LaunchOnly => {
                let reason = report.reason.unwrap_or(LaunchReason::CannotBeUpdated);
                self.launch_local(&report.local, reason)
            }
            UpdateAction::InstallAndLaunch => self.install_and_launch(&report),
        };

        self.enter(State::Done);
        tracing::debug!("outcome {:?} ({})", outcome, outcome.code());
        outcome
    }

    fn install_and_launch(&self, report: &Report) -> Outcome {
        let Some(release) = report.remote.as_ref() else {
            tracing::error!("install requested without a release");
            return Outcome::UnexpectedCompareResult;
        };
        let asset = match release.require_asset(&self.feed.config().asset_name) {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!("{}", e);
                return Outcome::UnexpectedCompareResult;
            }
        };
        let Some(remote_version) = release.version.as_ref() else {
            tracing::error!("install requested for unversioned release {}", release.tag);
            return Outcome::UnexpectedCompareResult;
        };

        self.enter(State::Confirming);
        if !self.confirm.confirm(report.local.version.as_ref(), remote_version) {
            tracing::info!("update to {} declined", release.tag);
            return self.launch_local(&report.local, LaunchReason::Declined);
        }

        self.enter(State::Installing);
        let installer = Installer::new(&self.feed)
            .with_cancel(Arc::clone(&self.cancel))
            .show_progress(self.settings.show_progress);

        match installer.install(asset, &self.settings.install_dir, &self.settings.executable) {
            Ok(installed) => match self.launch(&installed) {
                Ok(()) => Outcome::ApplicationStartedAndUpdated,
                Err(outcome) => outcome,
            },
            Err(e) => {
                tracing::error!("update to {} failed: {}", release.tag, e);
                if self.settings.fallback_on_update_failure && report.local.is_installed() {
                    tracing::warn!("starting the existing installation instead");
                    self.launch_local(&report.local, LaunchReason::CannotBeUpdated)
                } else {
                    Outcome::UpdateFailed
                }
            }
        }
    }

    fn launch_local(&self, local: &LocalInstallation, reason: LaunchReason) -> Outcome {
        match self.launch(local) {
            Ok(()) => reason.outcome(),
            Err(outcome) => outcome,
        }
    }

    fn launch(&self, installation: &LocalInstallation) -> Result<(), Outcome> {
        self.enter(State::Launching);
        self.launcher
            .launch(&installation.executable, &self.settings.args)
            .map_err(|e| {
                tracing::error!("{}", e);
                Outcome::LaunchFailed
            })
    }
}
