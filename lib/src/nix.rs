//! Debian/systemd collaborators: privilege check, dpkg/apt-get and systemctl.

use crate::run_log::RunLog;
use anyhow::{Context, Result, anyhow};
use log::debug;
use std::path::Path;
use std::process::Command;

/// Whether the effective user is root
#[cfg(unix)]
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Run a command to completion, capturing its output into the error on failure
pub fn run_command(command: &mut Command, context_message: &str) -> Result<()> {
    debug!("running {:?}", command);
    let output = command
        .output()
        .with_context(|| format!("{context_message}: command failed to start"))?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    Err(anyhow!(
        "{context_message}: status={} stdout='{}' stderr='{}'",
        output.status,
        stdout.trim(),
        stderr.trim()
    ))
}

/// Install a package file with dpkg, falling back once to `apt-get -f install`.
///
/// dpkg is not run again after the repair. A failed repair is
/// logged and returned.
pub fn install_package<RunCommand>(
    package_path: &Path,
    log: &RunLog,
    run_command_executor: &mut RunCommand,
) -> Result<()>
where
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
{
    let mut install = Command::new("dpkg");
    install.arg("-i").arg(package_path);
    let Err(err) = run_command_executor(&mut install, "dpkg install failed") else {
        return Ok(());
    };
    debug!("{:#}", err);

    log.line("Install failed, attempting dependency fix.")?;
    let mut repair = Command::new("apt-get");
    repair.args(["-f", "install", "-y"]);
    if let Err(err) = run_command_executor(&mut repair, "dependency fix failed") {
        log.line(&format!("Dependency fix failed. Error: {:#}", err))
            .with_context(|| format!("{:#}", err))?;
        return Err(err);
    }
    Ok(())
}

/// Restart a systemd unit
pub fn restart_service<RunCommand>(service_name: &str, run_command_executor: &mut RunCommand) -> Result<()>
where
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
{
    let mut restart = Command::new("systemctl");
    restart.args(["restart", service_name]);
    run_command_executor(&mut restart, &format!("systemctl restart {} failed", service_name))
}

/// Version of an installed package, `None` when dpkg does not know it
pub fn installed_version(package_name: &str) -> Result<Option<String>> {
    let output = Command::new("dpkg-query")
        .args(["-W", "-f=${Version}", package_name])
        .output()
        .context("Failed to run dpkg-query")?;

    if !output.status.success() {
        debug!("dpkg-query reports {} as not installed", package_name);
        return Ok(None);
    }
    Ok(parse_dpkg_version(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_dpkg_version(stdout: &str) -> Option<String> {
    let version = stdout.trim();
    (!version.is_empty()).then(|| version.to_string())
}
