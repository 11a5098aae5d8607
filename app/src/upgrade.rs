use crate::Options;
use anyhow::Result;
use log::info;
use pmsu::{PlexUpgrader, UpgradeConfig};
use std::time::Duration;

/// Apply command line overrides on top of the stock configuration
pub fn build_config(options: &Options) -> UpgradeConfig {
    let mut config = UpgradeConfig::new();

    if let Some(url) = &options.api_url {
        config = config.api_url(url.as_str());
    }
    if let Some(dir) = &options.workspace {
        config = config.workspace_dir(dir);
    }
    if let Some(path) = &options.log_file {
        config = config.log_file(path);
    }
    if let Some(service) = &options.service {
        config = config.service_name(service.as_str());
    }
    if let Some(package) = &options.package {
        config = config.package_name(package.as_str());
    }
    if options.build.is_some() || options.distro.is_some() {
        let build = options.build.clone().unwrap_or_else(|| config.build.clone());
        let distro = options.distro.clone().unwrap_or_else(|| config.distro.clone());
        config = config.release_filter(build, distro);
    }
    if let Some(secs) = options.timeout {
        config = config.api_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = options.download_timeout {
        config = config.download_timeout(Duration::from_secs(secs));
    }

    config
}

/// Full upgrade: root check, download, install, cleanup, restart
pub fn perform_upgrade(config: UpgradeConfig) -> Result<()> {
    info!("Starting upgrade of {}", config.service_name);
    PlexUpgrader::new(config).run()
}

/// Print the published release next to the installed version
pub fn perform_check(config: UpgradeConfig) -> Result<()> {
    let status = PlexUpgrader::new(config).check()?;

    println!(
        "Latest version:    {}",
        status.latest.version.as_deref().unwrap_or("unknown")
    );
    println!("Download URL:      {}", status.latest.url);
    println!(
        "Installed version: {}",
        status.installed.as_deref().unwrap_or("not installed")
    );
    if status.is_current() {
        println!("Already up to date!");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        assert_eq!(build_config(&Options::default()), UpgradeConfig::new());
    }

    #[test]
    fn test_build_config_overrides() {
        let options = Options {
            api_url: Some("http://127.0.0.1:8080/downloads.json".to_string()),
            workspace: Some(PathBuf::from("/var/tmp/pms")),
            log_file: Some(PathBuf::from("/tmp/pms.log")),
            distro: Some("redhat".to_string()),
            timeout: Some(5),
            ..Options::default()
        };

        let config = build_config(&options);
        assert_eq!(config.api_url, "http://127.0.0.1:8080/downloads.json");
        assert_eq!(config.package_path(), PathBuf::from("/var/tmp/pms/plexmediaserver.deb"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/pms.log"));
        assert_eq!(config.build, "linux-x86_64");
        assert_eq!(config.distro, "redhat");
        assert_eq!(config.api_timeout, Duration::from_secs(5));
        assert_eq!(config.download_timeout, Duration::from_secs(1800));
    }
}
