use semver::Version;

/// What to do after comparing the local and remote versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    /// Already current; the installed copy is started as-is
    NoOp,
    InstallAndLaunch,
    LaunchOnly,
    /// Nothing to run and nothing to install
    Fail,
}

/// Decide between installing, launching and giving up.
///
/// Rules apply in order: a missing remote version or a missing asset never
/// blocks launching an existing local copy, and equal versions are never
/// re-installed.
pub fn decide(
    local: Option<&Version>,
    remote: Option<&Version>,
    asset_resolved: bool,
) -> UpdateAction {
    match (local, remote) {
        (None, None) => UpdateAction::Fail,
        (None, Some(_)) if asset_resolved => UpdateAction::InstallAndLaunch,
        (None, Some(_)) => UpdateAction::Fail,
        (Some(_), None) => UpdateAction::LaunchOnly,
        (Some(local), Some(remote)) if remote > local && asset_resolved => {
            UpdateAction::InstallAndLaunch
        }
        (Some(_), Some(_)) => UpdateAction::LaunchOnly,
    }
}
