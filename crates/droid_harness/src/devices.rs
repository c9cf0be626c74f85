//! Attached-device discovery and per-device capability sets

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adb::AdbClient;
use crate::error::{HarnessError, Result};
use crate::logger::Logger;

/// One attached device as described to the automation server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub device_name: String,
    pub platform_name: String,
    pub platform_version: String,
}

impl DeviceRecord {
    pub fn android(device_name: impl Into<String>, platform_version: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            platform_name: "Android".to_string(),
            platform_version: platform_version.into(),
        }
    }
}

/// Serials from `adb devices` output whose state column reads `device`
pub fn parse_device_list(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| !line.starts_with("List of devices"))
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            match (columns.next(), columns.next()) {
                (Some(serial), Some("device")) => Some(serial.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Serials of every attached device
pub async fn android_devices(adb: &AdbClient) -> Result<Vec<String>> {
    let lines = adb.run_host(&["devices"]).await?;
    Ok(parse_device_list(&lines))
}

/// Describe every attached device, querying each for its Android version
pub async fn collect_device_records(adb: &AdbClient, logger: &Logger) -> Result<Vec<DeviceRecord>> {
    let mut records = Vec::new();
    for serial in android_devices(adb).await? {
        let version = adb.for_device(serial.as_str()).device_version().await?;
        logger.info(&format!(
            "Get the android device is {}, android version is {}",
            serial, version
        ));
        records.push(DeviceRecord::android(serial, version));
    }
    Ok(records)
}

/// Overwrite `path` with `records` as a JSON array
pub fn save_device_records(path: &Path, records: &[DeviceRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_device_records(path: &Path) -> Result<Vec<DeviceRecord>> {
    let content =
        fs::read_to_string(path).map_err(|_| HarnessError::ArtifactNotFound(path.to_path_buf()))?;
    Ok(serde_json::from_str(&content)?)
}

/// Merge each record over the shared template; record keys win
pub fn build_capabilities(template: &Map<String, Value>, records: &[DeviceRecord]) -> Result<Vec<Map<String, Value>>> {
    let mut capabilities = Vec::with_capacity(records.len());
    for record in records {
        let mut merged = template.clone();
        if let Value::Object(fields) = serde_json::to_value(record)? {
            merged.extend(fields);
        }
        capabilities.push(merged);
    }
    Ok(capabilities)
}

/// The capability template is a JSON object, or an array whose first element is used
fn parse_template(content: &str, path: &Path) -> Result<Map<String, Value>> {
    let template = match serde_json::from_str::<Value>(content)? {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.into_iter().next().and_then(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        }),
        _ => None,
    };
    template.ok_or_else(|| {
        HarnessError::device_query(
            "load_capabilities",
            format!("{} holds no capability object", path.display()),
        )
    })
}

/// Read the template and device records and merge them
pub fn load_capabilities(template_path: &Path, records_path: &Path) -> Result<Vec<Map<String, Value>>> {
    let content = fs::read_to_string(template_path)
        .map_err(|_| HarnessError::ArtifactNotFound(template_path.to_path_buf()))?;
    let template = parse_template(&content, template_path)?;
    let records = load_device_records(records_path)?;
    build_capabilities(&template, &records)
}
