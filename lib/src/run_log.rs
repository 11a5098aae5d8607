use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamped log of an upgrade run, echoed to stdout and appended to a file
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    echo: bool,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: true,
        }
    }

    /// Stop echoing lines to stdout
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one line. The file is opened and closed on every call.
    pub fn line(&self, message: &str) -> Result<()> {
        let line = format_line(&Local::now(), message);
        if self.echo {
            println!("{}", line);
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file {}", self.path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write log file {}", self.path.display()))?;
        Ok(())
    }
}

/// Format a log line as `YYYY-MM-DD HH:MM:SS - message`
pub fn format_line(at: &DateTime<Local>, message: &str) -> String {
    format!("{} - {}", at.format(TIMESTAMP_FORMAT), message)
}
