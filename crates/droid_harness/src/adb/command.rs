//! Process execution behind the device bridge

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{HarnessError, Result};

/// Host operating system family, which decides the shell and text-search tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Unix,
    Windows,
}

impl HostPlatform {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else {
            HostPlatform::Unix
        }
    }

    /// Line filter used on the host side of a pipeline
    pub fn search_command(self) -> &'static str {
        match self {
            HostPlatform::Unix => "grep",
            HostPlatform::Windows => "findstr",
        }
    }

    /// Shell program and its "run this string" flag
    pub fn shell(self) -> (&'static str, &'static str) {
        match self {
            HostPlatform::Unix => ("sh", "-c"),
            HostPlatform::Windows => ("cmd", "/C"),
        }
    }

    pub fn adb_executable(self) -> &'static str {
        match self {
            HostPlatform::Unix => "adb",
            HostPlatform::Windows => "adb.exe",
        }
    }
}

/// Runs an external program and returns its stdout split into lines
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<Vec<String>>;
}

/// Spawns real processes, one per call
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<Vec<String>> {
        debug!("Running {} {}", program, args.join(" "));

        let child = Command::new(program).args(args).kill_on_drop(true).output();
        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                HarnessError::Timeout(format!(
                    "{} {} did not finish within {}s",
                    program,
                    args.join(" "),
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(HarnessError::Io)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{} exited with {}: {}", program, output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.to_string())
            .collect())
    }
}
