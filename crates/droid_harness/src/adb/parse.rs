//! Parsers for line-oriented device-bridge output
//!
//! Each parser takes the raw lines of one command and either returns the typed
//! value or a [`HarnessError::DeviceQuery`] naming what was missing.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{HarnessError, Result};

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+\.\d+").expect("valid IPv4 pattern"))
}

fn first_containing<'a>(lines: &'a [String], needle: &str) -> Option<&'a str> {
    lines
        .iter()
        .map(|l| l.as_str())
        .find(|line| line.contains(needle))
}

/// First non-empty line, trimmed
pub fn first_line(lines: &[String], query: &str) -> Result<String> {
    lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(|l| l.to_string())
        .ok_or_else(|| HarnessError::device_query(query, "command produced no output"))
}

/// Package name from `pm list packages` whose line contains `keyword`
pub fn package_from_list(lines: &[String], keyword: &str) -> Result<String> {
    let line = first_containing(lines, keyword).ok_or_else(|| {
        HarnessError::device_query("resolved_package", format!("no package matches '{}'", keyword))
    })?;

    line.split_once(':')
        .map(|(_, package)| package.trim().to_string())
        .ok_or_else(|| {
            HarnessError::device_query("resolved_package", format!("malformed line '{}'", line))
        })
}

/// Launch activity from `dumpsys package`, e.g. `com.app/.SplashActivity` -> `com.app.SplashActivity`
pub fn activity_from_dumpsys(lines: &[String], marker: &str) -> Result<String> {
    let line = first_containing(lines, marker).ok_or_else(|| {
        HarnessError::device_query("launch_activity", format!("no line mentions '{}'", marker))
    })?;

    line.split_whitespace()
        .nth(1)
        .map(|component| component.replace('/', ""))
        .ok_or_else(|| {
            HarnessError::device_query("launch_activity", format!("malformed line '{}'", line.trim()))
        })
}

/// Whether `adb devices` lists anything beyond its header
pub fn has_attached_device(lines: &[String]) -> bool {
    lines
        .iter()
        .skip(1)
        .any(|line| !line.trim().is_empty())
}

/// IPv4 address on the first `netcfg` line for a wireless interface
pub fn ipv4_on_wlan(lines: &[String]) -> Result<String> {
    let line = first_containing(lines, "wlan")
        .ok_or_else(|| HarnessError::device_query("device_ip", "no wlan interface in netcfg"))?;

    ipv4_pattern()
        .find(line)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            HarnessError::device_query("device_ip", format!("no IPv4 address in '{}'", line.trim()))
        })
}

/// IPv4 address from `ip addr show wlan0`
pub fn inet_from_ip_addr(lines: &[String]) -> Result<String> {
    for line in lines {
        if line.contains("inet ") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 {
                let ip = parts[1].split('/').next().unwrap_or("");
                if !ip.is_empty() {
                    return Ok(ip.to_string());
                }
            }
        }
    }

    Err(HarnessError::device_query("device_ip", "no inet line for wlan0"))
}

/// Address of `wlan0` from `netcfg`, without the prefix length
pub fn network_from_netcfg(lines: &[String]) -> Result<String> {
    let line = first_containing(lines, "wlan0")
        .ok_or_else(|| HarnessError::device_query("current_network", "no wlan0 in netcfg"))?;

    line.split_whitespace()
        .nth(2)
        .and_then(|addr| addr.split('/').next())
        .map(|addr| addr.to_string())
        .ok_or_else(|| {
            HarnessError::device_query("current_network", format!("malformed line '{}'", line.trim()))
        })
}

/// Whether `pm clear` reported success
pub fn clear_succeeded(lines: &[String]) -> bool {
    lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.contains("Success"))
}

/// `(width, height)` from `wm size`, e.g. `Physical size: 1080x1920`
pub fn screen_size(lines: &[String]) -> Result<(u32, u32)> {
    let line = first_line(lines, "screen_size")?;
    let size = line
        .split_once(':')
        .map(|(_, size)| size.trim())
        .ok_or_else(|| HarnessError::device_query("screen_size", format!("malformed line '{}'", line)))?;

    let parsed = size
        .split_once('x')
        .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)));

    parsed.ok_or_else(|| HarnessError::device_query("screen_size", format!("cannot parse '{}'", size)))
}

/// PID (second column) from a `ps` line
pub fn pid_from_ps(lines: &[String], package: &str) -> Result<String> {
    let line = lines
        .iter()
        .map(|l| l.as_str())
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| HarnessError::device_query("pid", format!("no process for '{}'", package)))?;

    line.split_whitespace()
        .nth(1)
        .map(|pid| pid.to_string())
        .ok_or_else(|| HarnessError::device_query("pid", format!("malformed ps line '{}'", line.trim())))
}

/// Real UID from `/proc/<pid>/status`
pub fn uid_from_status(lines: &[String]) -> Result<String> {
    let line = first_containing(lines, "Uid")
        .ok_or_else(|| HarnessError::device_query("uid", "no Uid line in status"))?;

    line.split_whitespace()
        .nth(1)
        .map(|uid| uid.to_string())
        .ok_or_else(|| HarnessError::device_query("uid", format!("malformed line '{}'", line.trim())))
}

/// Installed `versionName` from a filtered `dumpsys package` line
pub fn version_name(lines: &[String]) -> Result<String> {
    let line = first_containing(lines, "versionName")
        .ok_or_else(|| HarnessError::device_query("apk_version", "no versionName line"))?;

    line.split_once('=')
        .map(|(_, version)| version.trim().to_string())
        .ok_or_else(|| {
            HarnessError::device_query("apk_version", format!("malformed line '{}'", line.trim()))
        })
}

/// Version embedded in a staged APK name, e.g. `app_release_2.3.1.apk` -> `2.3.1`
pub fn apk_version_from_filename(name: &str) -> Result<String> {
    name.split('_')
        .nth(2)
        .map(|field| field.replace(".apk", ""))
        .ok_or_else(|| {
            HarnessError::device_query("apk_version", format!("APK name '{}' has no version field", name))
        })
}
