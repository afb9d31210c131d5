use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::NamedTempFile;

use super::github::{Asset, FeedClient};
use super::probe::{self, LocalInstallation};
use crate::error::{Result, UpdateError};

/// Payload formats the installer can unpack, chosen from the asset name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Downloads a release asset and swaps it into the install directory.
///
/// The existing install directory is only touched once the archive has been
/// fully downloaded, read back and unpacked next to it.
pub struct Installer<'a> {
    feed: &'a FeedClient,
    cancel: Arc<AtomicBool>,
    temp_dir: Option<PathBuf>,
    show_progress: bool,
}

impl<'a> Installer<'a> {
    pub fn new(feed: &'a FeedClient) -> Self {
        Self {
            feed,
            cancel: Arc::new(AtomicBool::new(false)),
            temp_dir: None,
            show_progress: false,
        }
    }

    /// Abort the download when this flag is raised
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stage downloads in `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download `asset` and replace the contents of `install_dir` with it
    pub fn install(
        &self,
        asset: &Asset,
        install_dir: &Path,
        executable_name: &str,
    ) -> Result<LocalInstallation> {
        let format = ArchiveFormat::from_name(&asset.name).ok_or_else(|| {
            UpdateError::DownloadFailed(format!("unsupported archive format: {}", asset.name))
        })?;

        // Removed on drop, whichever way this function exits
        let mut archive = self.temp_archive().map_err(|e| {
            UpdateError::DownloadFailed(format!("cannot create temporary file: {e}"))
        })?;

        tracing::info!("downloading {} to {}", asset.name, archive.path().display());
        self.feed
            .download(asset, archive.as_file_mut(), &self.cancel, self.show_progress)?;

        verify_archive(format, archive.path())
            .map_err(|e| UpdateError::DownloadFailed(format!("{} is corrupt: {e}", asset.name)))?;

        let parent = parent_dir(install_dir);
        fs::create_dir_all(&parent).map_err(|e| UpdateError::install(&parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&parent)
            .map_err(|e| UpdateError::install(&parent, e))?;

        tracing::debug!("extracting into {}", staging.path().display());
        extract_archive(format, archive.path(), staging.path())
            .map_err(|e| UpdateError::install(install_dir, e))?;

        swap_into_place(staging.keep(), install_dir)?;

        let installed = probe::probe(install_dir, executable_name);
        match &installed.version {
            Some(v) => tracing::info!("installed {} into {}", v, install_dir.display()),
            None => tracing::warn!(
                "installed archive has no versioned {} in {}",
                executable_name,
                install_dir.display()
            ),
        }
        Ok(installed)
    }

    fn temp_archive(&self) -> io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("launcher-download-");
        match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Move the old install directory aside, move `staged` into its place, then
/// drop the old copy. The old copy is restored if the second move fails.
fn swap_into_place(staged: PathBuf, install_dir: &Path) -> Result<()> {
    let name = install_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());
    let backup = parent_dir(install_dir).join(format!(".{name}.previous"));

    let cleanup_staged = |e: io::Error| {
        let _ = fs::remove_dir_all(&staged);
        UpdateError::install(install_dir, e)
    };

    if backup.exists() {
        fs::remove_dir_all(&backup).map_err(cleanup_staged)?;
    }

    let had_previous = install_dir.exists();
    if had_previous {
        fs::rename(install_dir, &backup).map_err(cleanup_staged)?;
    }

    if let Err(e) = fs::rename(&staged, install_dir) {
        if had_previous {
            if let Err(restore) = fs::rename(&backup, install_dir) {
                tracing::error!(
                    "cannot restore previous install from {}: {}",
                    backup.display(),
                    restore
                );
            }
        }
        return Err(cleanup_staged(e));
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(&backup) {
            tracing::warn!("cannot remove {}: {}", backup.display(), e);
        }
    }
    Ok(())
}

/// Read every entry of the archive to the end so truncation and checksum
/// errors surface before anything on disk changes.
pub fn verify_archive(format: ArchiveFormat, archive_path: &Path) -> io::Result<()> {
    let file = File::open(archive_path)?;
    let mut entries = 0usize;

    match format {
        ArchiveFormat::Zip => {
            let mut archive = zip::ZipArchive::new(file).map_err(io::Error::other)?;
            for i in 0..archive.len() {
                let mut entry = archive.by_index(i).map_err(io::Error::other)?;
                io::copy(&mut entry, &mut io::sink())?;
                entries += 1;
            }
        }
        ArchiveFormat::TarGz => {
            let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
            let mut archive = tar::Archive::new(decoder);
            for entry in archive.entries()? {
                io::copy(&mut entry?, &mut io::sink())?;
                entries += 1;
            }
        }
    }

    if entries == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "archive is empty"));
    }
    Ok(())
}

/// Extract archive into `dest_dir`
pub fn extract_archive(format: ArchiveFormat, archive_path: &Path, dest_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dest_dir)?;
    let file = File::open(archive_path)?;

    match format {
        ArchiveFormat::Zip => {
            let mut archive = zip::ZipArchive::new(file).map_err(io::Error::other)?;
            archive.extract(dest_dir).map_err(io::Error::other)
        }
        ArchiveFormat::TarGz => {
            let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
            tar::Archive::new(decoder).unpack(dest_dir)
        }
    }
}
