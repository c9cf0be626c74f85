//! Shared helpers for page-layer integration tests.
//!
//! [`FakeSession`] scripts element lookups, contexts and screenshots in memory
//! and records every backend call, so page operations can be checked without a
//! device or an Appium server.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageBuffer, Rgb};
use serde_json::Value;

use droid_harness::config::{DeviceTimingConfig, TimingConfig, WaitTimingConfig};
use droid_harness::{
    AdbClient, ArtifactNamer, BasePage, ElementHandle, ElementRect, HarnessError, Locator, Logger,
    Point, Result, Session, WindowSize,
};

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub id: String,
    pub displayed: bool,
    pub selected: bool,
    pub text: String,
    pub rect: ElementRect,
    pub attributes: HashMap<String, String>,
}

impl FakeElement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            displayed: true,
            selected: false,
            text: String::new(),
            rect: ElementRect {
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 10.0,
            },
            attributes: HashMap::new(),
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = ElementRect { x, y, width, height };
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    elements: HashMap<String, Vec<FakeElement>>,
    /// Lookups that return nothing before the elements show up
    reveal_after: HashMap<String, usize>,
    lookups: HashMap<String, usize>,
    contexts: Vec<String>,
    current_context: String,
    screen: WindowSize,
    failing: HashSet<String>,
    calls: Vec<String>,
}

/// In-memory [`Session`] with scripted elements and a call log
#[derive(Clone)]
pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSession {
    pub fn new() -> Self {
        let state = FakeState {
            contexts: vec!["NATIVE_APP".to_string()],
            current_context: "NATIVE_APP".to_string(),
            screen: WindowSize {
                width: 100,
                height: 200,
            },
            ..FakeState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_elements(self, locator: &Locator, elements: Vec<FakeElement>) -> Self {
        self.state
            .lock()
            .unwrap()
            .elements
            .insert(locator.to_string(), elements);
        self
    }

    /// Elements for `locator` only appear on lookup number `lookups + 1`
    pub fn with_elements_after(self, locator: &Locator, elements: Vec<FakeElement>, lookups: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .reveal_after
            .insert(locator.to_string(), lookups);
        self.with_elements(locator, elements)
    }

    pub fn with_contexts(self, contexts: &[&str], current: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.contexts = contexts.iter().map(|c| c.to_string()).collect();
            state.current_context = current.to_string();
        }
        self
    }

    pub fn with_screen(self, width: u32, height: u32) -> Self {
        self.state.lock().unwrap().screen = WindowSize { width, height };
        self
    }

    /// Make the named backend call fail
    pub fn failing(self, operation: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(operation.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn lookups(&self, locator: &Locator) -> usize {
        self.state
            .lock()
            .unwrap()
            .lookups
            .get(&locator.to_string())
            .copied()
            .unwrap_or(0)
    }

    pub fn current_context_name(&self) -> String {
        self.state.lock().unwrap().current_context.clone()
    }

    fn record(&self, call: String) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let operation = call.split(' ').next().unwrap_or_default().to_string();
        state.calls.push(call);
        if state.failing.contains(&operation) {
            return Err(HarnessError::BackendOperation {
                operation,
                message: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    fn element(&self, handle: &ElementHandle) -> Result<FakeElement> {
        let state = self.state.lock().unwrap();
        state
            .elements
            .values()
            .flatten()
            .find(|e| e.id == handle.id())
            .cloned()
            .ok_or_else(|| HarnessError::BackendOperation {
                operation: "element".to_string(),
                message: format!("no such element {}", handle.id()),
            })
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn implicit_wait(&self, timeout: Duration) -> Result<()> {
        self.record(format!("implicit_wait {}", timeout.as_secs_f64()))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        self.record(format!("find_elements {}", locator))?;
        let mut state = self.state.lock().unwrap();
        let key = locator.to_string();
        let seen = {
            let counter = state.lookups.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        if seen <= state.reveal_after.get(&key).copied().unwrap_or(0) {
            return Ok(Vec::new());
        }
        Ok(state
            .elements
            .get(&key)
            .map(|elements| elements.iter().map(|e| ElementHandle::new(e.id.as_str())).collect())
            .unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool> {
        Ok(self.element(element)?.displayed)
    }

    async fn is_selected(&self, element: &ElementHandle) -> Result<bool> {
        Ok(self.element(element)?.selected)
    }

    async fn text(&self, element: &ElementHandle) -> Result<String> {
        Ok(self.element(element)?.text)
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        Ok(self.element(element)?.attributes.get(name).cloned())
    }

    async fn rect(&self, element: &ElementHandle) -> Result<ElementRect> {
        Ok(self.element(element)?.rect)
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        self.record(format!("click {}", element.id()))
    }

    async fn clear(&self, element: &ElementHandle) -> Result<()> {
        self.record(format!("clear {}", element.id()))
    }

    async fn send_keys(&self, element: &ElementHandle, value: &str) -> Result<()> {
        self.record(format!("send_keys {} {}", element.id(), value))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.record("screenshot".to_string())?;
        let size = self.state.lock().unwrap().screen;
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(size.width, size.height, Rgb([255, 255, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
        Ok(buffer)
    }

    async fn window_size(&self) -> Result<WindowSize> {
        Ok(self.state.lock().unwrap().screen)
    }

    async fn swipe(&self, from: Point, to: Point, duration: Duration) -> Result<()> {
        self.record(format!(
            "swipe {},{} {},{} {}",
            from.x,
            from.y,
            to.x,
            to.y,
            duration.as_millis()
        ))
    }

    async fn tap(&self, points: &[Point], duration: Duration) -> Result<()> {
        let points: Vec<String> = points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
        self.record(format!("tap {} {}", points.join(";"), duration.as_millis()))
    }

    async fn drag_and_drop(&self, source: &ElementHandle, target: &ElementHandle) -> Result<()> {
        self.record(format!("drag_and_drop {} {}", source.id(), target.id()))
    }

    async fn scroll(&self, source: &ElementHandle, target: &ElementHandle) -> Result<()> {
        self.record(format!("scroll {} {}", source.id(), target.id()))
    }

    async fn current_context(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().current_context.clone())
    }

    async fn contexts(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().contexts.clone())
    }

    async fn switch_context(&self, name: &str) -> Result<()> {
        self.record(format!("switch_context {}", name))?;
        self.state.lock().unwrap().current_context = name.to_string();
        Ok(())
    }

    async fn press_keycode(&self, code: u32) -> Result<()> {
        self.record(format!("press_keycode {}", code))
    }

    async fn long_press_keycode(&self, code: u32) -> Result<()> {
        self.record(format!("long_press_keycode {}", code))
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        self.record(format!("execute_script {}", script))?;
        Ok(Value::Null)
    }

    async fn reset(&self) -> Result<()> {
        self.record("reset".to_string())
    }

    async fn quit(&self) -> Result<()> {
        self.record("quit".to_string())
    }

    async fn background_app(&self, duration: Duration) -> Result<()> {
        self.record(format!("background_app {}", duration.as_secs()))
    }

    async fn close_app(&self) -> Result<()> {
        self.record("close_app".to_string())
    }

    async fn is_app_installed(&self, package: &str) -> Result<bool> {
        self.record(format!("is_app_installed {}", package))?;
        Ok(package == "com.tdh.rpms")
    }

    async fn shake(&self) -> Result<()> {
        self.record("shake".to_string())
    }

    async fn toggle_location_services(&self) -> Result<()> {
        self.record("toggle_location_services".to_string())
    }

    async fn page_source(&self) -> Result<String> {
        self.record("page_source".to_string())?;
        Ok("<hierarchy/>".to_string())
    }
}

/// Short, environment-independent timings
pub fn test_timing() -> TimingConfig {
    TimingConfig {
        wait: WaitTimingConfig {
            poll_interval: 0.5,
            find_timeout: 2.0,
            context_wait: 3.0,
        },
        device: DeviceTimingConfig {
            key_event_delay: 0.0,
            command_timeout: 5.0,
        },
    }
}

pub fn quiet_logger(path: &Path) -> Arc<Logger> {
    Arc::new(Logger::with_console(path, false, Box::new(std::io::sink()), false).unwrap())
}

/// Page over `session` writing artifacts and the log under `root`
pub fn page_in(root: &Path, session: FakeSession) -> (BasePage, PathBuf) {
    let log_path = root.join("run.log");
    let page = BasePage::new(
        Box::new(session),
        AdbClient::new(None),
        quiet_logger(&log_path),
        ArtifactNamer::new(root.join("result")),
        test_timing(),
    );
    (page, log_path)
}

pub fn read_log(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}
