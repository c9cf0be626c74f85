//! Android Debug Bridge client
//!
//! Shell commands go through a [`CommandRunner`], so queries can be replayed
//! from recorded output without a device attached.

mod client;
mod command;
mod keycode;
pub mod parse;

pub use client::{AdbClient, SPLASH_ACTIVITY_MARKER};
pub use command::{CommandRunner, HostPlatform, ProcessRunner};
pub use keycode::KeyCode;
