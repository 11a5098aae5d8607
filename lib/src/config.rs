use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://plex.tv/api/downloads/5.json";
pub const DEFAULT_WORKSPACE_DIR: &str = "/tmp/plex_upgrade";
pub const DEFAULT_PACKAGE_FILE_NAME: &str = "plexmediaserver.deb";
pub const DEFAULT_LOG_FILE: &str = "/var/log/plex_upgrade.log";
pub const DEFAULT_SERVICE_NAME: &str = "plexmediaserver";
pub const DEFAULT_PACKAGE_NAME: &str = "plexmediaserver";
pub const DEFAULT_BUILD: &str = "linux-x86_64";
pub const DEFAULT_DISTRO: &str = "debian";

/// Configuration for an upgrade run
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UpgradeConfig {
    /// Vendor endpoint publishing the downloads manifest
    pub api_url: String,
    /// Ephemeral directory holding the downloaded package
    pub workspace_dir: PathBuf,
    /// File name of the package inside the workspace
    pub package_file_name: String,
    /// Append-only run log
    pub log_file: PathBuf,
    /// Unit restarted through the service manager
    pub service_name: String,
    /// Package name known to the package manager
    pub package_name: String,
    /// Release `build` tag to select
    pub build: String,
    /// Release `distro` tag to select
    pub distro: String,
    pub connect_timeout: Duration,
    /// Total time allowed for the manifest request
    pub api_timeout: Duration,
    /// Total time allowed for the package download
    pub download_timeout: Duration,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            workspace_dir: PathBuf::from(DEFAULT_WORKSPACE_DIR),
            package_file_name: DEFAULT_PACKAGE_FILE_NAME.to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            build: DEFAULT_BUILD.to_string(),
            distro: DEFAULT_DISTRO.to_string(),
            connect_timeout: Duration::from_secs(10),
            api_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl UpgradeConfig {
    /// Create a configuration with the stock Plex values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the downloads manifest endpoint
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the workspace directory
    pub fn workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = dir.into();
        self
    }

    /// Set the package file name used inside the workspace
    pub fn package_file_name(mut self, name: impl Into<String>) -> Self {
        self.package_file_name = name.into();
        self
    }

    /// Set the run log path
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    /// Set the service to restart
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the package name queried for the installed version
    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    /// Set the release filter
    pub fn release_filter(mut self, build: impl Into<String>, distro: impl Into<String>) -> Self {
        self.build = build.into();
        self.distro = distro.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Path of the downloaded package inside the workspace
    pub fn package_path(&self) -> PathBuf {
        self.workspace_dir.join(&self.package_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = UpgradeConfig::new();

        assert_eq!(config.api_url, "https://plex.tv/api/downloads/5.json");
        assert_eq!(config.build, "linux-x86_64");
        assert_eq!(config.distro, "debian");
        assert_eq!(config.service_name, "plexmediaserver");
        assert_eq!(config.log_file, PathBuf::from("/var/log/plex_upgrade.log"));
        assert_eq!(
            config.package_path(),
            PathBuf::from("/tmp/plex_upgrade/plexmediaserver.deb")
        );
    }

    #[test]
    fn test_config_builder() {
        let config = UpgradeConfig::new()
            .api_url("http://127.0.0.1:9/downloads.json")
            .workspace_dir("/srv/scratch")
            .package_file_name("pms.deb")
            .release_filter("linux-aarch64", "debian")
            .api_timeout(Duration::from_secs(5));

        assert_eq!(config.api_url, "http://127.0.0.1:9/downloads.json");
        assert_eq!(config.package_path(), PathBuf::from("/srv/scratch/pms.deb"));
        assert_eq!(config.build, "linux-aarch64");
        assert_eq!(config.api_timeout, Duration::from_secs(5));
        assert_eq!(config.download_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn test_config_serde() {
        let config = UpgradeConfig::new().service_name("plex");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: UpgradeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
