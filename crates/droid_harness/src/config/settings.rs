//! Harness-wide settings

use std::env;
use std::path::{Path, PathBuf};

use crate::adb::HostPlatform;
use crate::config::TimingConfig;

/// File name of the persisted device records inside the data directory
pub const DEVICE_RECORDS_FILE: &str = "device.json";

/// File name of the shared capability template inside the data directory
pub const CAPABILITY_TEMPLATE_FILE: &str = "appium_parameters.json";

/// Resolve the adb executable.
///
/// Prefers `$ANDROID_HOME/platform-tools/adb` and falls back to `adb` on `PATH`.
pub fn resolve_adb_path(android_home: Option<&str>, host: HostPlatform) -> String {
    match android_home {
        Some(home) if !home.is_empty() => Path::new(home)
            .join("platform-tools")
            .join(host.adb_executable())
            .to_string_lossy()
            .into_owned(),
        _ => "adb".to_string(),
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| {
        let v = v.trim().to_ascii_lowercase();
        v == "1" || v == "true" || v == "yes"
    })
}

/// Configuration threaded through the harness at startup
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Root of the `log/`, `report/` and `img/` artifact tree
    pub result_root: PathBuf,
    /// Directory holding device records and the capability template
    pub data_dir: PathBuf,
    /// Staging directory for APK builds under test
    pub apk_dir: PathBuf,
    pub adb_path: String,
    pub appium_url: String,
    pub device_id: Option<String>,
    /// Forces every log entry to DEBUG
    pub debug: bool,
    pub host: HostPlatform,
    pub timing: TimingConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let host = HostPlatform::current();
        Self {
            result_root: env::var("HARNESS_RESULT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("result")),
            data_dir: env::var("HARNESS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            apk_dir: env::var("HARNESS_APK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("apk")),
            adb_path: resolve_adb_path(env::var("ANDROID_HOME").ok().as_deref(), host),
            appium_url: env::var("HARNESS_APPIUM_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:4723".to_string()),
            device_id: env::var("HARNESS_DEVICE_ID").ok(),
            debug: env_flag("HARNESS_DEBUG").unwrap_or(false),
            host,
            timing: TimingConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.result_root = dir.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_apk_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.apk_dir = dir.into();
        self
    }

    pub fn with_adb_path(mut self, path: impl Into<String>) -> Self {
        self.adb_path = path.into();
        self
    }

    pub fn with_appium_url(mut self, url: impl Into<String>) -> Self {
        self.appium_url = url.into();
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn device_records_path(&self) -> PathBuf {
        self.data_dir.join(DEVICE_RECORDS_FILE)
    }

    pub fn capability_template_path(&self) -> PathBuf {
        self.data_dir.join(CAPABILITY_TEMPLATE_FILE)
    }
}
