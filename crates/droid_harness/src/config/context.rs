//! Per-run harness state shared by every page object

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::adb::AdbClient;
use crate::artifacts::{ArtifactCategory, ArtifactNamer, DirectoryTree};
use crate::config::HarnessConfig;
use crate::devices;
use crate::error::Result;
use crate::logger::Logger;
use crate::page::BasePage;
use crate::session::{AppiumSession, Session};

/// Settings, evidence log and artifact tree for one test run
#[derive(Debug, Clone)]
pub struct HarnessContext {
    config: HarnessConfig,
    logger: Arc<Logger>,
    artifacts: ArtifactNamer,
    tree: DirectoryTree,
}

impl HarnessContext {
    /// Create today's result tree and open a fresh log file in it.
    ///
    /// Either failure aborts setup.
    pub fn init(config: HarnessConfig) -> Result<Self> {
        let artifacts = ArtifactNamer::new(&config.result_root);
        let tree = artifacts.ensure_directory_tree(true)?;
        let log_path = artifacts.name_artifact(ArtifactCategory::Log, None)?;
        let logger = Arc::new(Logger::open(&log_path, config.debug)?);

        info!("Harness log: {}", log_path.display());
        Ok(Self {
            config,
            logger,
            artifacts,
            tree,
        })
    }

    /// Assemble a context around an existing logger
    pub fn with_logger(config: HarnessConfig, logger: Arc<Logger>) -> Result<Self> {
        let artifacts = ArtifactNamer::new(&config.result_root);
        let tree = artifacts.ensure_directory_tree(true)?;
        Ok(Self {
            config,
            logger,
            artifacts,
            tree,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn logger(&self) -> Arc<Logger> {
        self.logger.clone()
    }

    pub fn artifacts(&self) -> &ArtifactNamer {
        &self.artifacts
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    /// Bridge client for the configured device
    pub fn adb(&self) -> AdbClient {
        AdbClient::from_config(&self.config, self.config.device_id.clone())
    }

    /// Wrap `session` in a page object bound to the configured device
    pub fn page(&self, session: Box<dyn Session>) -> BasePage {
        BasePage::new(
            session,
            self.adb(),
            self.logger.clone(),
            self.artifacts.clone(),
            self.config.timing.clone(),
        )
    }

    /// Capability sets for every recorded device
    pub fn load_capabilities(&self) -> Result<Vec<Map<String, Value>>> {
        devices::load_capabilities(
            &self.config.capability_template_path(),
            &self.config.device_records_path(),
        )
    }

    /// Discover attached devices and persist their records to the data directory
    pub async fn refresh_device_records(&self) -> Result<Vec<devices::DeviceRecord>> {
        let adb = AdbClient::from_config(&self.config, None);
        let records = devices::collect_device_records(&adb, &self.logger).await?;
        devices::save_device_records(&self.config.device_records_path(), &records)?;
        Ok(records)
    }

    /// Open an Appium session with `capabilities` and wrap it in a page object
    pub async fn start_page(&self, capabilities: &Map<String, Value>) -> Result<BasePage> {
        let session = AppiumSession::start(&self.config.appium_url, capabilities).await?;
        self.logger.info(&format!(
            "Started session {} on {}",
            session.session_id(),
            self.config.appium_url
        ));

        let device = capabilities
            .get("deviceName")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.config.device_id.clone());
        Ok(BasePage::new(
            Box::new(session),
            AdbClient::from_config(&self.config, device),
            self.logger.clone(),
            self.artifacts.clone(),
            self.config.timing.clone(),
        ))
    }
}
