use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

/// Downloads manifest published by the vendor
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadsManifest {
    pub computer: Computer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Computer {
    #[serde(rename = "Linux")]
    pub linux: PlatformDownloads,
}

/// Releases for one platform
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformDownloads {
    #[serde(default)]
    pub version: Option<String>,
    pub releases: Vec<Release>,
}

/// One downloadable package
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Release {
    /// Missing tags are only an error when the entry is reached during selection
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default)]
    pub distro: Option<String>,
    pub url: String,
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Result of version discovery
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRelease {
    pub url: String,
    pub version: Option<String>,
}

impl DownloadsManifest {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).context("Failed to parse downloads manifest")
    }

    /// Resolve the download for a build/distro pair
    pub fn resolve(&self, build: &str, distro: &str) -> Result<ResolvedRelease> {
        let release = select_release(self, build, distro)?;
        Ok(ResolvedRelease {
            url: release.url.clone(),
            version: self.computer.linux.version.clone(),
        })
    }
}

/// First release in list order matching both tags.
///
/// An entry without a `build` or `distro` tag ahead of the match is an error;
/// entries after the match are not inspected.
pub fn select_release<'a>(
    manifest: &'a DownloadsManifest,
    build: &str,
    distro: &str,
) -> Result<&'a Release> {
    for (index, release) in manifest.computer.linux.releases.iter().enumerate() {
        let (Some(release_build), Some(release_distro)) = (&release.build, &release.distro) else {
            anyhow::bail!("Release entry {} ({}) has no build or distro tag", index, release.url);
        };
        if release_build == build && release_distro == distro {
            return Ok(release);
        }
    }
    anyhow::bail!("No release found for build '{}' and distro '{}'", build, distro)
}

/// Fetch the downloads manifest
pub fn fetch_manifest(client: &Client, url: &str, timeout: Duration) -> Result<DownloadsManifest> {
    debug!("GET {}", url);
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .context("Failed to fetch downloads manifest")?;

    debug!("downloads manifest responded with {}", response.status());
    if !response.status().is_success() {
        anyhow::bail!("Downloads API returned status: {}", response.status());
    }

    let body = response
        .text()
        .context("Failed to read downloads manifest")?;
    DownloadsManifest::parse(&body)
}
