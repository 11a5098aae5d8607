use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::blocking::Client;
use std::path::PathBuf;
use std::process::Command;

pub mod config;
pub mod download;
pub mod nix;
pub mod release;
pub mod run_log;
pub mod workspace;

#[cfg(test)]
mod test_server;

pub use config::UpgradeConfig;
pub use release::{DownloadsManifest, Release, ResolvedRelease};
pub use run_log::RunLog;
pub use workspace::Workspace;

const USER_AGENT: &str = concat!("plex-upgrader/", env!("CARGO_PKG_VERSION"));

/// Runs a prepared command; the second argument describes the failure
pub type CommandExecutor = Box<dyn FnMut(&mut Command, &str) -> Result<()>>;

/// Last stage an upgrade run completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    RootChecked,
    WorkspaceReady,
    VersionResolved,
    Downloaded,
    Installed,
    Cleaned,
    Restarted,
}

/// Published release compared against the local package
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatus {
    pub latest: ResolvedRelease,
    pub installed: Option<String>,
}

impl UpdateStatus {
    /// Whether the installed version equals the published one
    pub fn is_current(&self) -> bool {
        matches!((&self.installed, &self.latest.version), (Some(a), Some(b)) if a == b)
    }
}

/// Drives one upgrade run from privilege check to service restart
pub struct PlexUpgrader {
    config: UpgradeConfig,
    log: RunLog,
    workspace: Workspace,
    stage: Stage,
    latest: Option<ResolvedRelease>,
    privilege_check: fn() -> bool,
    run_command: CommandExecutor,
}

impl PlexUpgrader {
    /// Create an upgrader using the real privilege check and command runner
    pub fn new(config: UpgradeConfig) -> Self {
        Self {
            log: RunLog::new(&config.log_file),
            workspace: Workspace::new(&config.workspace_dir),
            config,
            stage: Stage::Start,
            latest: None,
            privilege_check: nix::is_root,
            run_command: Box::new(nix::run_command),
        }
    }

    /// Replace the run log sink
    pub fn with_run_log(mut self, log: RunLog) -> Self {
        self.log = log;
        self
    }

    /// Replace the executor used for dpkg, apt-get and systemctl
    pub fn with_command_executor<RunCommand>(mut self, executor: RunCommand) -> Self
    where
        RunCommand: FnMut(&mut Command, &str) -> Result<()> + 'static,
    {
        self.run_command = Box::new(executor);
        self
    }

    /// Replace the root check
    pub fn with_privilege_check(mut self, check: fn() -> bool) -> Self {
        self.privilege_check = check;
        self
    }

    pub fn config(&self) -> &UpgradeConfig {
        &self.config
    }

    pub fn run_log(&self) -> &RunLog {
        &self.log
    }

    /// Last completed stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Release resolved during this run, if discovery has happened
    pub fn latest_release(&self) -> Option<&ResolvedRelease> {
        self.latest.as_ref()
    }

    fn http_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(self.config.connect_timeout)
            .build()
            .context("Failed to build HTTP client")
    }

    /// Run every stage in order. Each failure is written to the run log before it is returned.
    pub fn run(&mut self) -> Result<()> {
        self.check_privileges()?;
        self.prepare_workspace()?;
        let release = self.resolve_latest()?;
        let package_path = self.download(&release.url)?;
        self.install(&package_path)?;
        self.cleanup()?;
        self.restart()
    }

    pub fn check_privileges(&mut self) -> Result<()> {
        if !(self.privilege_check)() {
            self.log.line("Run this program as root (use sudo).")?;
            anyhow::bail!("Not running as root");
        }
        self.stage = Stage::RootChecked;
        Ok(())
    }

    pub fn prepare_workspace(&mut self) -> Result<()> {
        let dir = self.workspace.path().display().to_string();
        if let Err(e) = self.workspace.create() {
            self.log
                .line(&format!("Failed to create temporary directory: {}. Error: {:#}", dir, e))
                .with_context(|| format!("{:#}", e))?;
            return Err(e);
        }
        self.log.line(&format!("Created temporary directory: {}", dir))?;
        self.stage = Stage::WorkspaceReady;
        Ok(())
    }

    /// Fetch the manifest and pick the configured build/distro, without logging
    pub fn fetch_latest(&self) -> Result<ResolvedRelease> {
        let client = self.http_client()?;
        let manifest =
            release::fetch_manifest(&client, &self.config.api_url, self.config.api_timeout)?;
        manifest.resolve(&self.config.build, &self.config.distro)
    }

    pub fn resolve_latest(&mut self) -> Result<ResolvedRelease> {
        self.log
            .line("Checking for the latest Plex Media Server version...")?;
        let release = match self.fetch_latest() {
            Ok(release) => release,
            Err(e) => {
                self.log
                    .line(&format!("Failed to fetch Plex version info. Error: {:#}", e))
                    .with_context(|| format!("{:#}", e))?;
                return Err(e);
            }
        };

        if let Some(version) = &release.version {
            self.log.line(&format!("Latest version: {}", version))?;
        }
        self.log
            .line(&format!("Latest version URL: {}", release.url))?;
        self.latest = Some(release.clone());
        self.stage = Stage::VersionResolved;
        Ok(release)
    }

    pub fn download(&mut self, url: &str) -> Result<PathBuf> {
        self.log
            .line("Downloading the latest Plex Media Server version...")?;
        let package_path = self.config.package_path();
        let result = self.http_client().and_then(|client| {
            download::download_to(&client, url, &package_path, self.config.download_timeout)
        });
        if let Err(e) = result {
            self.log
                .line(&format!("Download failed. Error: {:#}", e))
                .with_context(|| format!("{:#}", e))?;
            return Err(e);
        }
        self.log.line("Download completed.")?;
        self.stage = Stage::Downloaded;
        Ok(package_path)
    }

    pub fn install(&mut self, package_path: &std::path::Path) -> Result<()> {
        self.log.line("Installing Plex Media Server...")?;
        nix::install_package(package_path, &self.log, &mut self.run_command)?;
        self.stage = Stage::Installed;
        Ok(())
    }

    /// Remove the workspace. Only a run log failure is returned; removal errors become a warning line.
    pub fn cleanup(&mut self) -> Result<()> {
        self.log.line("Removing temporary files...")?;
        if let Err(e) = self.workspace.remove() {
            warn!("workspace cleanup failed: {}", e);
            self.log.line(&format!(
                "Warning: failed to remove temporary files at {}: {}",
                self.workspace.path().display(),
                e
            ))?;
        }
        self.stage = Stage::Cleaned;
        Ok(())
    }

    pub fn restart(&mut self) -> Result<()> {
        self.log.line("Restarting Plex Media Server...")?;
        if let Err(e) = nix::restart_service(&self.config.service_name, &mut self.run_command) {
            self.log
                .line(&format!("Failed to restart Plex Media Server. Error: {:#}", e))
                .with_context(|| format!("{:#}", e))?;
            return Err(e);
        }
        self.log
            .line("Plex Media Server upgrade completed successfully.")?;
        self.stage = Stage::Restarted;
        Ok(())
    }

    /// Compare the published release with the installed package
    pub fn check(&self) -> Result<UpdateStatus> {
        let latest = self.fetch_latest()?;
        let installed = match nix::installed_version(&self.config.package_name) {
            Ok(version) => version,
            Err(e) => {
                debug!("installed version unavailable: {:#}", e);
                None
            }
        };
        Ok(UpdateStatus { latest, installed })
    }
}
