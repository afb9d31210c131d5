use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Result, UpdateError};

/// Starts the managed application
pub trait Launch {
    fn launch(&self, executable: &Path, args: &[OsString]) -> Result<()>;
}

/// Spawns the executable as an independent process and does not wait for it
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launch for ProcessLauncher {
    fn launch(&self, executable: &Path, args: &[OsString]) -> Result<()> {
        let failed = |reason: String| UpdateError::LaunchFailed {
            path: executable.to_path_buf(),
            reason,
        };

        if !executable.is_file() {
            return Err(failed("file does not exist".to_string()));
        }

        let mut command = Command::new(executable);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = executable.parent().filter(|d| !d.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|e| failed(e.to_string()))?;
        tracing::info!("started {} (pid {})", executable.display(), child.id());
        Ok(())
    }
}
