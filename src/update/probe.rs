use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};

use super::version;

/// UTF-16LE `VS_VERSION_INFO`, the key of a Windows version resource
const VERSION_INFO_KEY: &[u8] = &[
    b'V', 0, b'S', 0, b'_', 0, b'V', 0, b'E', 0, b'R', 0, b'S', 0, b'I', 0, b'O', 0, b'N', 0,
    b'_', 0, b'I', 0, b'N', 0, b'F', 0, b'O', 0,
];

/// `VS_FIXEDFILEINFO::dwSignature`, little endian
const FIXED_INFO_SIGNATURE: [u8; 4] = 0xFEEF_04BDu32.to_le_bytes();

/// How far past the key the fixed info block may start (null terminator + padding)
const SIGNATURE_WINDOW: usize = 64;

/// Snapshot of the locally installed application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInstallation {
    pub install_dir: PathBuf,
    pub executable: PathBuf,
    pub version: Option<Version>,
}

impl LocalInstallation {
    pub fn is_installed(&self) -> bool {
        self.version.is_some()
    }
}

/// Read the installed version of `executable_name` inside `install_dir`.
///
/// A missing file or missing/unreadable version metadata is the "not installed"
/// state and yields `version: None`.
pub fn probe(install_dir: &Path, executable_name: &str) -> LocalInstallation {
    let executable = install_dir.join(executable_name);
    let version = read_embedded_version(&executable);

    match &version {
        Some(v) => tracing::debug!("local version {} at {}", v, executable.display()),
        None => tracing::debug!("no local version at {}", executable.display()),
    }

    LocalInstallation {
        install_dir: install_dir.to_path_buf(),
        executable,
        version,
    }
}

/// Read the file version from an executable's version resource
pub fn read_embedded_version(path: &Path) -> Option<Version> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("cannot read {}: {}", path.display(), e);
            }
            return None;
        }
    };
    parse_fixed_file_version(&bytes)
}

/// Locate `VS_FIXEDFILEINFO` after the `VS_VERSION_INFO` key and decode
/// `dwFileVersionMS` / `dwFileVersionLS`.
fn parse_fixed_file_version(bytes: &[u8]) -> Option<Version> {
    let key_end = find(bytes, VERSION_INFO_KEY)? + VERSION_INFO_KEY.len();
    let window_end = (key_end + SIGNATURE_WINDOW).min(bytes.len());
    let signature = key_end + find(&bytes[key_end..window_end], &FIXED_INFO_SIGNATURE)?;

    // dwSignature, dwStrucVersion, dwFileVersionMS, dwFileVersionLS
    let ms = read_u32(bytes, signature + 8)?;
    let ls = read_u32(bytes, signature + 12)?;
    Some(version::from_file_version(ms, ls))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Bytes of a minimal version resource, for fixtures in tests
#[cfg(test)]
pub(crate) fn version_resource(v: &Version) -> Vec<u8> {
    let ms = ((v.major as u32) << 16) | (v.minor as u32 & 0xFFFF);
    let ls = (v.patch as u32) << 16;

    let mut out = b"MZ\x90\x00fake executable".to_vec();
    out.extend_from_slice(VERSION_INFO_KEY);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(&FIXED_INFO_SIGNATURE);
    out.extend_from_slice(&0x0001_0000u32.to_le_bytes());
    out.extend_from_slice(&ms.to_le_bytes());
    out.extend_from_slice(&ls.to_le_bytes());
    out.extend_from_slice(&ms.to_le_bytes());
    out.extend_from_slice(&ls.to_le_bytes());
    out.extend_from_slice(&[0u8; 28]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_probe_missing_executable() {
        let dir = tempdir().unwrap();
        let local = probe(&dir.path().join("App"), "App.exe");
        assert_eq!(local.version, None);
        assert!(!local.is_installed());
        assert_eq!(local.executable, dir.path().join("App").join("App.exe"));
    }

    #[test]
    fn test_probe_reads_embedded_version() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("App.exe"),
            version_resource(&Version::new(1, 2, 0)),
        )
        .unwrap();

        let local = probe(dir.path(), "App.exe");
        assert_eq!(local.version, Some(Version::new(1, 2, 0)));
    }

    #[test]
    fn test_probe_without_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("App.exe"), b"MZ no resources here").unwrap();
        assert_eq!(probe(dir.path(), "App.exe").version, None);
    }

    #[test]
    fn test_truncated_fixed_info() {
        let mut bytes = version_resource(&Version::new(4, 5, 6));
        let key = find(&bytes, VERSION_INFO_KEY).unwrap();
        bytes.truncate(key + VERSION_INFO_KEY.len() + 12);
        assert_eq!(parse_fixed_file_version(&bytes), None);
    }

    #[test]
    fn test_signature_must_follow_key() {
        let mut bytes = FIXED_INFO_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(VERSION_INFO_KEY);
        assert_eq!(parse_fixed_file_version(&bytes), None);
    }
}
