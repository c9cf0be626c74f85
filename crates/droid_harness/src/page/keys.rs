//! Named navigation keys for page-level key events

use crate::adb::KeyCode;
use crate::error::{HarnessError, Result};

/// Named keys accepted by [`BasePage::key_event`](super::BasePage::key_event)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKey {
    Home,
    Back,
    Camera,
}

impl NavigationKey {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "HOME" => Ok(NavigationKey::Home),
            "BACK" => Ok(NavigationKey::Back),
            "CAMERA" => Ok(NavigationKey::Camera),
            other => Err(HarnessError::UnknownKey(other.to_string())),
        }
    }

    pub fn key_code(self) -> KeyCode {
        match self {
            NavigationKey::Home => KeyCode::Home,
            NavigationKey::Back => KeyCode::Back,
            NavigationKey::Camera => KeyCode::Camera,
        }
    }
}
