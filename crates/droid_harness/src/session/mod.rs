//! Automation-backend seam
//!
//! [`Session`] abstracts a remote automation session (element lookup,
//! gestures, contexts, app lifecycle) so the page layer works the same against
//! an Appium server or a scripted fake.

mod appium;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use appium::AppiumSession;

/// Element location strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum By {
    Id,
    Name,
    ClassName,
    XPath,
    AccessibilityId,
    LinkText,
    CssSelector,
    AndroidUiAutomator,
}

impl By {
    /// Strategy string on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            By::Id => "id",
            By::Name => "name",
            By::ClassName => "class name",
            By::XPath => "xpath",
            By::AccessibilityId => "accessibility id",
            By::LinkText => "link text",
            By::CssSelector => "css selector",
            By::AndroidUiAutomator => "-android uiautomator",
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy plus selector, e.g. `(By::Id, "com.app:id/login")`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub by: By,
    pub selector: String,
}

impl Locator {
    pub fn new(by: By, selector: impl Into<String>) -> Self {
        Self {
            by,
            selector: selector.into(),
        }
    }

    pub fn id(selector: impl Into<String>) -> Self {
        Self::new(By::Id, selector)
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(By::XPath, selector)
    }

    pub fn accessibility_id(selector: impl Into<String>) -> Self {
        Self::new(By::AccessibilityId, selector)
    }

    /// Name usable as a file stem for screenshots of this element.
    ///
    /// `name` and `link text` selectors are used verbatim; all others have
    /// `\ / : * ? " < > |` replaced with `-`.
    pub fn file_stem(&self) -> String {
        match self.by {
            By::Name | By::LinkText => self.selector.clone(),
            _ => self
                .selector
                .chars()
                .map(|c| match c {
                    '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                    c => c,
                })
                .collect(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} -> {}>", self.by, self.selector)
    }
}

/// Opaque reference to an element owned by the remote session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Element position and size in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// Screen coordinate for gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One remote automation session.
///
/// Every call is a single backend round trip; waiting and retrying belong
/// to the caller.
#[async_trait]
pub trait Session: Send + Sync {
    async fn implicit_wait(&self, timeout: Duration) -> Result<()>;

    /// All elements matching `locator`, possibly none
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementHandle>>;

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool>;
    async fn is_selected(&self, element: &ElementHandle) -> Result<bool>;
    async fn text(&self, element: &ElementHandle) -> Result<String>;
    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>>;
    async fn rect(&self, element: &ElementHandle) -> Result<ElementRect>;

    async fn click(&self, element: &ElementHandle) -> Result<()>;
    async fn clear(&self, element: &ElementHandle) -> Result<()>;
    async fn send_keys(&self, element: &ElementHandle, value: &str) -> Result<()>;

    /// PNG-encoded capture of the screen
    async fn screenshot(&self) -> Result<Vec<u8>>;
    async fn window_size(&self) -> Result<WindowSize>;

    async fn swipe(&self, from: Point, to: Point, duration: Duration) -> Result<()>;
    async fn tap(&self, points: &[Point], duration: Duration) -> Result<()>;
    async fn drag_and_drop(&self, source: &ElementHandle, target: &ElementHandle) -> Result<()>;
    async fn scroll(&self, source: &ElementHandle, target: &ElementHandle) -> Result<()>;

    async fn current_context(&self) -> Result<String>;
    async fn contexts(&self) -> Result<Vec<String>>;
    async fn switch_context(&self, name: &str) -> Result<()>;

    async fn press_keycode(&self, code: u32) -> Result<()>;
    async fn long_press_keycode(&self, code: u32) -> Result<()>;

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value>;

    async fn reset(&self) -> Result<()>;
    async fn quit(&self) -> Result<()>;
    async fn background_app(&self, duration: Duration) -> Result<()>;
    async fn close_app(&self) -> Result<()>;
    async fn is_app_installed(&self, package: &str) -> Result<bool>;
    async fn shake(&self) -> Result<()>;
    async fn toggle_location_services(&self) -> Result<()>;
    async fn page_source(&self) -> Result<String>;
}
