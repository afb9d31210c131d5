//! Fixtures shared by the update tests: fake executables, archives and a
//! mocked release feed.

use semver::Version;
use serde_json::json;
use std::io::{Cursor, Write};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::github::FeedConfig;
use super::probe::version_resource;

pub const EXE: &str = "Widget.exe";
pub const ASSET: &str = "Widget.zip";

pub fn feed_config(api_base: &str) -> FeedConfig {
    FeedConfig {
        api_base: api_base.to_string(),
        owner: "acme".to_string(),
        repo: "widget".to_string(),
        product_name: "Widget.Launcher".to_string(),
        asset_name: ASSET.to_string(),
        timeout: Duration::from_secs(5),
    }
}

/// Zip holding `Widget.exe` stamped with `version` and a data file
pub fn zip_with_executable(version: &Version) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default;

    writer.start_file(EXE, options()).unwrap();
    writer.write_all(&version_resource(version)).unwrap();
    writer.add_directory("data/", options()).unwrap();
    writer.start_file("data/readme.txt", options()).unwrap();
    writer.write_all(b"new payload").unwrap();

    writer.finish().unwrap().into_inner()
}

/// Same layout as [`zip_with_executable`], as a gzipped tarball
pub fn tar_gz_with_executable(version: &Version) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, data) in [
        (EXE, version_resource(version)),
        ("data/readme.txt", b"new payload".to_vec()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_slice()).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// A GitHub-shaped release feed served by wiremock on its own runtime, so the
/// blocking client can be driven from the test thread.
pub struct MockFeed {
    pub server: MockServer,
    pub rt: tokio::runtime::Runtime,
}

impl MockFeed {
    pub fn start() -> Self {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self) -> FeedConfig {
        feed_config(&self.uri())
    }

    /// Publish `tag` with one asset named `asset_name` serving `payload`
    pub fn publish(&self, tag: &str, asset_name: &str, payload: Vec<u8>) {
        let download = format!("/download/{asset_name}");
        let body = json!({
            "tag_name": tag,
            "assets": [{
                "name": asset_name,
                "browser_download_url": format!("{}{}", self.uri(), download),
                "size": payload.len()
            }]
        });

        self.rt.block_on(async {
            Mock::given(method("GET"))
                .and(path("/repos/acme/widget/releases/latest"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&self.server)
                .await;
            Mock::given(method("GET"))
                .and(path(download.as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(payload))
                .mount(&self.server)
                .await;
        });
    }

    /// Make every request fail with `status`
    pub fn fail_with(&self, status: u16) {
        self.rt.block_on(
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&self.server),
        );
    }

    pub fn received_requests(&self) -> usize {
        self.rt
            .block_on(self.server.received_requests())
            .map_or(0, |r| r.len())
    }
}
