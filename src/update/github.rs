use indicatif::{ProgressBar, ProgressStyle};
use semver::Version;
use serde::Deserialize;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::version;
use crate::error::{Result, UpdateError};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Where releases come from and what to look for in them
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Sent as the User-Agent
    pub product_name: String,
    pub asset_name: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// Latest published release, with the expected asset resolved
#[derive(Debug, Clone)]
pub struct RemoteRelease {
    pub tag: String,
    pub assets: Vec<Asset>,
    /// `None` when the tag does not parse
    pub version: Option<Version>,
    /// `None` when no asset carries the expected name
    pub asset: Option<Asset>,
}

impl RemoteRelease {
    fn from_response(response: ReleaseResponse, expected_asset: &str) -> Self {
        let version = version::parse_tag(&response.tag_name);
        if version.is_none() {
            tracing::warn!("cannot parse release tag '{}'", response.tag_name);
        }

        let asset = response
            .assets
            .iter()
            .find(|a| a.name == expected_asset)
            .cloned();
        if asset.is_none() {
            tracing::warn!(
                "release {} has no asset named '{}'",
                response.tag_name,
                expected_asset
            );
        }

        Self {
            tag: response.tag_name,
            assets: response.assets,
            version,
            asset,
        }
    }

    /// The resolved asset, or `AssetNotFound`
    pub fn require_asset(&self, expected: &str) -> Result<&Asset> {
        self.asset.as_ref().ok_or_else(|| UpdateError::AssetNotFound {
            tag: self.tag.clone(),
            expected: expected.to_string(),
        })
    }
}

/// Client for the GitHub releases API
pub struct FeedClient {
    config: FeedConfig,
    client: reqwest::blocking::Client,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.product_name.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpdateError::FeedUnavailable(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo
        )
    }

    /// Fetch the latest release, `None` if the repository has none
    pub fn fetch_latest(&self) -> Result<Option<RemoteRelease>> {
        let url = self.latest_release_url();
        tracing::debug!("querying {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| UpdateError::FeedUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::info!(
                "no releases published for {}/{}",
                self.config.owner,
                self.config.repo
            );
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(UpdateError::FeedUnavailable(format!(
                "GitHub API error: {} {}",
                response.status(),
                response.text().unwrap_or_default()
            )));
        }

        let release = response
            .json::<ReleaseResponse>()
            .map_err(|e| UpdateError::FeedUnavailable(format!("bad release JSON: {e}")))?;

        Ok(Some(RemoteRelease::from_response(
            release,
            &self.config.asset_name,
        )))
    }

    /// Stream an asset into `dest`, returning the number of bytes written.
    ///
    /// Fails with `DownloadFailed` on transport errors, on a body shorter than
    /// the announced length, or when `cancel` is raised.
    pub fn download(
        &self,
        asset: &Asset,
        dest: &mut impl Write,
        cancel: &AtomicBool,
        show_progress: bool,
    ) -> Result<u64> {
        let failed = UpdateError::DownloadFailed;

        let mut response = self
            .client
            .get(&asset.browser_download_url)
            .send()
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("{} returned {}", asset.name, response.status())));
        }

        let expected = response.content_length().or((asset.size > 0).then_some(asset.size));
        let pb = progress_bar(expected, show_progress);

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; 8192];

        loop {
            if cancel.load(Ordering::Relaxed) {
                pb.abandon();
                return Err(failed("cancelled".to_string()));
            }

            let bytes_read = response.read(&mut buffer).map_err(|e| failed(e.to_string()))?;
            if bytes_read == 0 {
                break;
            }
            dest.write_all(&buffer[..bytes_read])
                .map_err(|e| failed(e.to_string()))?;
            downloaded += bytes_read as u64;
            pb.set_position(downloaded);
        }

        if let Some(total) = expected {
            if downloaded != total {
                pb.abandon();
                return Err(failed(format!(
                    "{} truncated: {} of {} bytes",
                    asset.name, downloaded, total
                )));
            }
        }

        dest.flush().map_err(|e| failed(e.to_string()))?;
        pb.finish_and_clear();
        tracing::info!("downloaded {} ({} bytes)", asset.name, downloaded);
        Ok(downloaded)
    }
}

fn progress_bar(total: Option<u64>, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total.unwrap_or(0));
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
