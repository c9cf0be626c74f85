//! Timing configuration for waits and device-bridge calls

use std::env;
use std::time::Duration;

fn env_secs(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v: &f64| v.is_finite() && *v >= 0.0)
        .unwrap_or(default)
}

/// Negative, NaN and overflowing values collapse to zero or the maximum
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 { Duration::MAX } else { Duration::ZERO })
}

/// Timing for element lookup and context switching
#[derive(Debug, Clone)]
pub struct WaitTimingConfig {
    /// Interval between element lookups while polling
    pub poll_interval: f64,
    /// Default upper bound for `find_element`
    pub find_timeout: f64,
    /// Implicit wait applied after clicking into a web view
    pub context_wait: f64,
}

impl Default for WaitTimingConfig {
    fn default() -> Self {
        Self {
            poll_interval: env_secs("HARNESS_POLL_INTERVAL", 0.5),
            find_timeout: env_secs("HARNESS_FIND_TIMEOUT", 10.0),
            context_wait: env_secs("HARNESS_CONTEXT_WAIT", 3.0),
        }
    }
}

/// Timing for device-bridge commands
#[derive(Debug, Clone)]
pub struct DeviceTimingConfig {
    /// Pause after `input keyevent` so the device settles
    pub key_event_delay: f64,
    /// Upper bound for a single adb invocation
    pub command_timeout: f64,
}

impl Default for DeviceTimingConfig {
    fn default() -> Self {
        Self {
            key_event_delay: env_secs("HARNESS_KEY_EVENT_DELAY", 0.1),
            command_timeout: env_secs("HARNESS_COMMAND_TIMEOUT", 30.0),
        }
    }
}

/// Master timing configuration
#[derive(Debug, Clone, Default)]
pub struct TimingConfig {
    pub wait: WaitTimingConfig,
    pub device: DeviceTimingConfig,
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        secs(self.wait.poll_interval)
    }

    pub fn find_timeout(&self) -> Duration {
        secs(self.wait.find_timeout)
    }

    pub fn context_wait(&self) -> Duration {
        secs(self.wait.context_wait)
    }

    pub fn key_event_delay(&self) -> Duration {
        secs(self.device.key_event_delay)
    }

    pub fn command_timeout(&self) -> Duration {
        secs(self.device.command_timeout)
    }
}
