//! Configuration for the harness
//!
//! - `settings`: paths, endpoints and flags, read from `HARNESS_*` variables
//! - `timing`: polling, timeouts and settle delays
//! - `context`: the logger and artifact namer built once per run

mod context;
mod settings;
mod timing;

pub use context::HarnessContext;
pub use settings::{
    resolve_adb_path, HarnessConfig, CAPABILITY_TEMPLATE_FILE, DEVICE_RECORDS_FILE,
};
pub use timing::{DeviceTimingConfig, TimingConfig, WaitTimingConfig};
