//! droid_harness: UI test automation for Android applications
//!
//! This library provides:
//! - A page-action layer over an Appium / W3C WebDriver session with element
//!   waiting, screenshot annotation, gestures and context switching
//! - An adb client for device queries, app install and key events
//! - Dated artifact paths for logs, screenshots and reports
//! - A coloured test-evidence logger
//! - Attached-device discovery and capability merging
//!
//! # Example
//!
//! ```no_run
//! use droid_harness::{HarnessConfig, HarnessContext, Locator};
//!
//! #[tokio::main]
//! async fn main() -> droid_harness::Result<()> {
//!     let context = HarnessContext::init(HarnessConfig::new())?;
//!     context.refresh_device_records().await?;
//!
//!     for capabilities in context.load_capabilities()? {
//!         let page = context.start_page(&capabilities).await?;
//!         page.click(&Locator::id("com.tdh.rpms:id/login")).await?;
//!         page.quit().await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;

pub mod config;
pub mod time_util;

pub mod adb;
pub mod artifacts;
pub mod devices;
pub mod logger;

pub mod page;
pub mod session;

pub use error::{HarnessError, Result};

pub use config::{HarnessConfig, HarnessContext, TimingConfig};

pub use adb::{AdbClient, CommandRunner, HostPlatform, KeyCode};
pub use artifacts::{ArtifactCategory, ArtifactNamer, DirectoryTree};
pub use devices::DeviceRecord;
pub use logger::{LogLevel, Logger};

pub use page::{BasePage, BoundingBox, NavigationKey, Selection};
pub use session::{AppiumSession, By, ElementHandle, ElementRect, Locator, Point, Session, WindowSize};
