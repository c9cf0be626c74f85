//! Device-bridge client: host and in-device shell commands with typed queries

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::command::{CommandRunner, HostPlatform, ProcessRunner};
use super::keycode::KeyCode;
use super::parse;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};

/// Activity-name fragment that identifies the launcher activity of apps under test
pub const SPLASH_ACTIVITY_MARKER: &str = "SplashActivity";

/// Issues adb commands against one device (or the only attached one)
#[derive(Clone)]
pub struct AdbClient {
    adb_path: String,
    device_id: Option<String>,
    host: HostPlatform,
    runner: Arc<dyn CommandRunner>,
    key_event_delay: Duration,
}

impl fmt::Debug for AdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdbClient")
            .field("adb_path", &self.adb_path)
            .field("device_id", &self.device_id)
            .field("host", &self.host)
            .finish()
    }
}

impl AdbClient {
    /// Create a client using `adb` on `PATH` and the host's platform tools
    pub fn new(device_id: Option<String>) -> Self {
        Self {
            adb_path: "adb".to_string(),
            device_id,
            host: HostPlatform::current(),
            runner: Arc::new(ProcessRunner::default()),
            key_event_delay: Duration::from_millis(100),
        }
    }

    /// Create a client from harness settings
    pub fn from_config(config: &HarnessConfig, device_id: Option<String>) -> Self {
        Self {
            adb_path: config.adb_path.clone(),
            device_id,
            host: config.host,
            runner: Arc::new(ProcessRunner::new(config.timing.command_timeout())),
            key_event_delay: config.timing.key_event_delay(),
        }
    }

    pub fn with_path(mut self, adb_path: impl Into<String>) -> Self {
        self.adb_path = adb_path.into();
        self
    }

    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    /// Replace the process runner, e.g. with recorded fixtures
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_key_event_delay(mut self, delay: Duration) -> Self {
        self.key_event_delay = delay;
        self
    }

    /// Same bridge settings, targeting `device_id`
    pub fn for_device(&self, device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ..self.clone()
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    fn device_args(&self) -> Vec<String> {
        match &self.device_id {
            Some(id) => vec!["-s".to_string(), id.clone()],
            None => Vec::new(),
        }
    }

    /// `adb [-s <device>] <args...>`
    pub async fn run_host(&self, args: &[&str]) -> Result<Vec<String>> {
        let mut full = self.device_args();
        full.extend(args.iter().map(|a| a.to_string()));
        self.runner.run(&self.adb_path, &full).await
    }

    /// `adb [-s <device>] shell <args...>`
    pub async fn run_shell(&self, args: &[&str]) -> Result<Vec<String>> {
        let mut full = self.device_args();
        full.push("shell".to_string());
        full.extend(args.iter().map(|a| a.to_string()));
        self.runner.run(&self.adb_path, &full).await
    }

    /// `adb [-s <device>] shell <command> | <grep|findstr> "<pattern>"`, filtered on the host
    pub async fn run_shell_search(&self, command: &str, pattern: &str) -> Result<Vec<String>> {
        let (shell, flag) = self.host.shell();
        let adb = if self.adb_path.contains(' ') {
            format!("\"{}\"", self.adb_path)
        } else {
            self.adb_path.clone()
        };
        let mut pipeline = vec![adb];
        pipeline.extend(self.device_args());
        pipeline.push("shell".to_string());
        pipeline.push(command.to_string());
        pipeline.push("|".to_string());
        pipeline.push(self.host.search_command().to_string());
        pipeline.push(format!("\"{}\"", pattern));

        self.runner
            .run(shell, &[flag.to_string(), pipeline.join(" ")])
            .await
    }

    /// Device serial as reported by the device itself
    pub async fn device_name(&self) -> Result<String> {
        let lines = self.run_shell(&["getprop", "ro.serialno"]).await?;
        parse::first_line(&lines, "device_name")
    }

    /// Android release, e.g. `12`
    pub async fn device_version(&self) -> Result<String> {
        let lines = self.run_shell(&["getprop", "ro.build.version.release"]).await?;
        parse::first_line(&lines, "device_version")
    }

    /// Serial as seen by the adb server
    pub async fn serial_number(&self) -> Result<String> {
        let lines = self.run_host(&["get-serialno"]).await?;
        parse::first_line(&lines, "serial_number")
    }

    pub async fn android_id(&self) -> Result<String> {
        let lines = self
            .run_shell(&["settings", "get", "secure", "android_id"])
            .await?;
        parse::first_line(&lines, "android_id")
    }

    /// `device`, `offline` or `unknown`
    pub async fn device_status(&self) -> Result<String> {
        let lines = self.run_host(&["get-state"]).await?;
        parse::first_line(&lines, "device_status")
    }

    /// Installed package whose name contains `keyword`
    pub async fn resolved_package(&self, keyword: &str) -> Result<String> {
        let lines = self.run_shell(&["pm", "list", "packages"]).await?;
        parse::package_from_list(&lines, keyword)
    }

    pub async fn is_installed(&self, keyword: &str) -> Result<bool> {
        match self.resolved_package(keyword).await {
            Ok(_) => Ok(true),
            Err(HarnessError::DeviceQuery { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn install_apk(&self, apk_path: &Path) -> Result<Vec<String>> {
        info!("Installing {}", apk_path.display());
        self.run_host(&["install", &apk_path.to_string_lossy()]).await
    }

    pub async fn uninstall(&self, package: &str) -> Result<Vec<String>> {
        info!("Uninstalling {}", package);
        self.run_host(&["uninstall", package]).await
    }

    /// Launch activity of `package`, located by [`SPLASH_ACTIVITY_MARKER`]
    pub async fn launch_activity(&self, package: &str) -> Result<String> {
        let lines = self.run_shell(&["dumpsys", "package", package]).await?;
        parse::activity_from_dumpsys(&lines, SPLASH_ACTIVITY_MARKER)
    }

    /// Whether at least one device is attached
    pub async fn check_devices(&self) -> Result<bool> {
        let lines = self.run_host(&["devices"]).await?;
        Ok(parse::has_attached_device(&lines))
    }

    /// IPv4 address of the wireless interface
    pub async fn device_ip(&self) -> Result<String> {
        let lines = self.run_shell(&["netcfg"]).await?;
        match parse::ipv4_on_wlan(&lines) {
            Ok(ip) => Ok(ip),
            Err(err) => {
                // Newer images dropped netcfg
                debug!("netcfg lookup failed ({}), trying ip addr", err);
                let lines = self.run_shell(&["ip", "addr", "show", "wlan0"]).await?;
                parse::inet_from_ip_addr(&lines)
            }
        }
    }

    pub async fn current_network(&self) -> Result<String> {
        let lines = self.run_shell(&["netcfg"]).await?;
        parse::network_from_netcfg(&lines)
    }

    /// Clear application data and cache
    pub async fn clear_data(&self, package: &str) -> Result<bool> {
        let lines = self.run_shell(&["pm", "clear", package]).await?;
        Ok(parse::clear_succeeded(&lines))
    }

    pub async fn reboot(&self) -> Result<()> {
        self.run_host(&["reboot"]).await?;
        Ok(())
    }

    /// Screen `(width, height)` in pixels
    pub async fn screen_size(&self) -> Result<(u32, u32)> {
        let lines = self.run_shell(&["wm", "size"]).await?;
        parse::screen_size(&lines)
    }

    pub async fn pid(&self, package: &str) -> Result<String> {
        let lines = self.run_shell_search("ps", package).await?;
        parse::pid_from_ps(&lines, package)
    }

    pub async fn uid(&self, package: &str) -> Result<String> {
        let pid = self.pid(package).await?;
        let status = format!("/proc/{}/status", pid);
        let lines = self.run_shell(&["cat", &status]).await?;
        parse::uid_from_status(&lines)
    }

    /// Whether the installed version of `package` matches the newest staged APK
    pub async fn apk_version_matches(&self, package: &str, apk_dir: &Path) -> Result<bool> {
        let command = format!("dumpsys package {}", package);
        let lines = self.run_shell_search(&command, "versionName").await?;
        let installed = parse::version_name(&lines)?;
        let staged = parse::apk_version_from_filename(&Self::latest_apk(apk_dir)?)?;
        debug!("Installed {} version {}, staged {}", package, installed, staged);
        Ok(installed == staged)
    }

    /// Lexicographically last file name in the APK staging directory
    pub fn latest_apk(apk_dir: &Path) -> Result<String> {
        let entries = std::fs::read_dir(apk_dir)
            .map_err(|_| HarnessError::ArtifactNotFound(apk_dir.to_path_buf()))?;

        let mut names = Vec::new();
        for entry in entries {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        names
            .pop()
            .ok_or_else(|| HarnessError::ArtifactNotFound(apk_dir.to_path_buf()))
    }

    /// Size of the newest staged APK in MiB, rounded to two decimals
    pub fn apk_size_mb(apk_dir: &Path) -> Result<f64> {
        let path: PathBuf = apk_dir.join(Self::latest_apk(apk_dir)?);
        let bytes = std::fs::metadata(&path)?.len() as f64;
        let size = bytes / (1024.0 * 1024.0);
        Ok((size * 100.0).round() / 100.0)
    }

    /// Send a raw key code
    pub async fn input_key_code(&self, code: u32) -> Result<()> {
        self.run_shell(&["input", "keyevent", &code.to_string()])
            .await?;
        tokio::time::sleep(self.key_event_delay).await;
        Ok(())
    }

    pub async fn key_event(&self, key: KeyCode) -> Result<()> {
        self.input_key_code(key.code()).await
    }
}

impl Default for AdbClient {
    fn default() -> Self {
        Self::new(None)
    }
}
