//! Page-action layer
//!
//! [`BasePage`] wraps a [`Session`] with element waiting, multi-element
//! selection, screenshot annotation, gestures, context switching and key
//! events. Every operation records a SUCCESS or FAIL entry with its elapsed
//! time in the harness log and hands errors back to the caller unchanged.
//!
//! ```ignore
//! let page = context.page(Box::new(session));
//! page.click(&Locator::id("com.app:id/login")).await?;
//! let title = page.get_text(&Locator::id("com.app:id/title")).await?;
//! ```

mod annotate;
mod gesture;
mod keys;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tokio::time::Instant;

use crate::adb::AdbClient;
use crate::artifacts::{ArtifactCategory, ArtifactNamer};
use crate::config::TimingConfig;
use crate::error::{HarnessError, Result};
use crate::logger::{LogLevel, Logger};
use crate::session::{ElementHandle, Locator, Point, Session, WindowSize};

pub use annotate::{crop_to, draw_outline, BoundingBox, OUTLINE_COLOR};
pub use gesture::{pick_context, swipe_down_path, swipe_left_path};
pub use keys::NavigationKey;

/// How to choose one element out of a located set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Uniformly at random
    Random,
    /// By zero-based position
    Index(usize),
}

/// Element-interaction API over one automation session
pub struct BasePage {
    session: Box<dyn Session>,
    adb: AdbClient,
    logger: Arc<Logger>,
    artifacts: ArtifactNamer,
    timing: TimingConfig,
}

impl BasePage {
    pub fn new(
        session: Box<dyn Session>,
        adb: AdbClient,
        logger: Arc<Logger>,
        artifacts: ArtifactNamer,
        timing: TimingConfig,
    ) -> Self {
        Self {
            session,
            adb,
            logger,
            artifacts,
            timing,
        }
    }

    /// Point this page at a new session, bridge client and logger
    pub fn rebind(&mut self, session: Box<dyn Session>, adb: AdbClient, logger: Arc<Logger>) -> &mut Self {
        self.session = session;
        self.adb = adb;
        self.logger = logger;
        self
    }

    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    pub fn adb(&self) -> &AdbClient {
        &self.adb
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn artifacts(&self) -> &ArtifactNamer {
        &self.artifacts
    }

    /// Log the outcome of an operation with its elapsed time and pass the result through
    fn report<T>(
        &self,
        started: Instant,
        result: Result<T>,
        success: impl FnOnce(&T) -> String,
        failure: impl FnOnce(&HarnessError) -> String,
    ) -> Result<T> {
        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(value) => self.logger.log(
                &format!("{}, spend {:.4} seconds", success(value), elapsed),
                LogLevel::Success,
            ),
            Err(e) => self.logger.log(
                &format!("{}, spend {:.4} seconds", failure(e), elapsed),
                LogLevel::Fail,
            ),
        }
        result
    }

    /// Set the session's implicit wait
    pub async fn wait(&self, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        let result = self.session.implicit_wait(timeout).await;
        if result.is_ok() {
            self.logger.info(&format!(
                "Implicit waiting {} seconds, spend {:.4} seconds",
                timeout.as_secs_f64(),
                started.elapsed().as_secs_f64()
            ));
            return result;
        }
        self.report(started, result, |_| String::new(), |e| format!("Implicit wait failed: {}", e))
    }

    /// Pause unconditionally
    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
        self.logger
            .info(&format!("Mandatory waiting {} seconds", duration.as_secs_f64()));
    }

    /// Poll until the first match of `locator` is displayed, or `timeout` passes
    async fn poll_displayed(&self, locator: &Locator, timeout: Duration) -> Result<Option<ElementHandle>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.session.find_elements(locator).await?.into_iter().next() {
                if self.session.is_displayed(&element).await? {
                    return Ok(Some(element));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.timing.poll_interval()).await;
        }
    }

    /// Wait up to the configured find timeout for a displayed element
    pub async fn find_element(&self, locator: &Locator) -> Result<ElementHandle> {
        self.find_element_within(locator, self.timing.find_timeout()).await
    }

    pub async fn find_element_within(&self, locator: &Locator, timeout: Duration) -> Result<ElementHandle> {
        let started = Instant::now();
        match self.poll_displayed(locator, timeout).await {
            Ok(Some(element)) => Ok(element),
            Ok(None) => self.report(
                started,
                Err(HarnessError::ElementNotFound {
                    locator: locator.clone(),
                    timeout,
                }),
                |_: &ElementHandle| String::new(),
                |_| format!("Please enter the correct targeting elements! {}", locator),
            ),
            Err(e) => self.report(started, Err(e), |_| String::new(), |e| {
                format!("Locating {} failed: {}", locator, e)
            }),
        }
    }

    /// Pick one element out of everything `locator` matches
    pub async fn find_elements(&self, locator: &Locator, selection: Selection) -> Result<ElementHandle> {
        let started = Instant::now();
        let result = self.select(locator, selection).await;
        if result.is_ok() {
            return result;
        }
        self.report(started, result, |_| String::new(), |e| {
            format!("No related elements are found in the interface: {}", e)
        })
    }

    async fn select(&self, locator: &Locator, selection: Selection) -> Result<ElementHandle> {
        let mut elements = self.session.find_elements(locator).await?;
        if elements.is_empty() {
            return Err(HarnessError::NoMatch {
                locator: locator.clone(),
                detail: "no elements located".to_string(),
            });
        }

        let index = match selection {
            Selection::Random => rand::thread_rng().gen_range(0..elements.len()),
            Selection::Index(i) if i < elements.len() => i,
            Selection::Index(i) => {
                return Err(HarnessError::NoMatch {
                    locator: locator.clone(),
                    detail: format!("index {} out of range for {} elements", i, elements.len()),
                })
            }
        };
        Ok(elements.swap_remove(index))
    }

    /// Click the element at `index` among all matches
    pub async fn elements_click(&self, locator: &Locator, index: usize) -> Result<()> {
        let started = Instant::now();
        let result = async {
            let element = self.select(locator, Selection::Index(index)).await?;
            self.session.click(&element).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("Click the element {} at index {}", locator, index),
            |e| format!("Click the element {} at index {} failed: {}", locator, index, e),
        )
    }

    /// Click a random element among all matches
    pub async fn random_click(&self, locator: &Locator) -> Result<()> {
        let started = Instant::now();
        let result = async {
            let element = self.select(locator, Selection::Random).await?;
            self.session.click(&element).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("Random click the element {}", locator),
            |e| format!("No element found, click failure: {}", e),
        )
    }

    /// Locate the element, capture the screen and outline it on the capture
    async fn annotate_element(&self, locator: &Locator) -> Result<(ElementHandle, PathBuf)> {
        let element = self.find_element(locator).await?;
        let capture = self.save_screenshot_as_picture(&locator.file_stem()).await?;
        let rect = self.session.rect(&element).await?;
        draw_outline(&capture, BoundingBox::from_rect(&rect))?;
        Ok((element, capture))
    }

    /// Outline the element on a fresh capture and return the capture's path
    pub async fn annotate(&self, locator: &Locator) -> Result<PathBuf> {
        let started = Instant::now();
        let result = self.annotate_element(locator).await.map(|(_, capture)| capture);
        self.report(
            started,
            result,
            |capture| format!("Outline the element {} on {}", locator, capture.display()),
            |e| format!("Outline the element {} failed: {}", locator, e),
        )
    }

    pub async fn click(&self, locator: &Locator) -> Result<()> {
        let started = Instant::now();
        let result = async {
            let (element, _) = self.annotate_element(locator).await?;
            self.session.click(&element).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("Click the element {}", locator),
            |e| format!("Element click failure {}: {}", locator, e),
        )
    }

    /// Type `value` into the element, clearing it first when `clear_first` is set
    pub async fn send_keys(&self, value: &str, locator: &Locator, clear_first: bool) -> Result<()> {
        let started = Instant::now();
        let result = async {
            if clear_first {
                let element = self.find_element(locator).await?;
                self.session.clear(&element).await?;
            }
            let (element, _) = self.annotate_element(locator).await?;
            self.session.send_keys(&element, value).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("Input text to the element {} content: {}", locator, value),
            |e| format!("Text input to {} failed: {}", locator, e),
        )
    }

    pub async fn get_text(&self, locator: &Locator) -> Result<String> {
        let started = Instant::now();
        let result = async {
            let (element, _) = self.annotate_element(locator).await?;
            self.session.text(&element).await
        }
        .await;
        self.report(
            started,
            result,
            |text| format!("Get the text {}: {}", locator, text),
            |e| format!("Gets the element text failed {}: {}", locator, e),
        )
    }

    pub async fn get_attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        let started = Instant::now();
        let result = async {
            let element = self.find_element(locator).await?;
            self.session.attribute(&element, name).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("Gets the attribute {} of the element {}", name, locator),
            |e| format!("Gets the attribute {} of the element {} failed: {}", name, locator, e),
        )
    }

    /// Selection state; an element that never shows up counts as not selected
    pub async fn is_selected(&self, locator: &Locator) -> Result<bool> {
        let started = Instant::now();
        let result: Result<bool> = async {
            match self.find_element(locator).await {
                Ok(element) => self.session.is_selected(&element).await,
                Err(HarnessError::ElementNotFound { .. }) | Err(HarnessError::Timeout(_)) => Ok(false),
                Err(e) => Err(e),
            }
        }
        .await;
        self.report(
            started,
            result,
            |state| {
                let verdict = if *state { "has been" } else { "has not been" };
                format!("The element {} {} selected", locator, verdict)
            },
            |e| format!("Gets the selected state of {} failed: {}", locator, e),
        )
    }

    /// Poll until the element's text contains `text`; `false` once `timeout` passes
    pub async fn text_in_element(&self, locator: &Locator, text: &str, timeout: Duration) -> Result<bool> {
        let started = Instant::now();
        let deadline = started + timeout;
        let result: Result<bool> = async {
            loop {
                if let Some(element) = self.session.find_elements(locator).await?.into_iter().next() {
                    if self.session.text(&element).await?.contains(text) {
                        return Ok(true);
                    }
                }
                if Instant::now() >= deadline {
                    return Ok(false);
                }
                tokio::time::sleep(self.timing.poll_interval()).await;
            }
        }
        .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(true) => self.logger.success(&format!(
                "The text {} in element {}, spend {:.4} seconds",
                text, locator, elapsed
            )),
            Ok(false) => self.logger.fail(&format!(
                "The text {} not in element {}, spend {:.4} seconds",
                text, locator, elapsed
            )),
            Err(e) => self.logger.fail(&format!(
                "Check the text {} in element {} failed: {}, spend {:.4} seconds",
                text, locator, e, elapsed
            )),
        }
        result
    }

    /// Write the current screen to `img/<day>/<name>.png`
    pub async fn save_screenshot_as_picture(&self, name: &str) -> Result<PathBuf> {
        let started = Instant::now();
        let result: Result<PathBuf> = async {
            let png = self.session.screenshot().await?;
            let path = self.artifacts.name_artifact(ArtifactCategory::Img, Some(name))?;
            tokio::fs::write(&path, png).await?;
            Ok(path)
        }
        .await;
        self.report(
            started,
            result,
            |path| format!("The screenshot is successful, saved to {}", path.display()),
            |e| format!("Screenshot failed: {}", e),
        )
    }

    /// File name of the newest capture of the day
    pub async fn get_latest_picture(&self) -> Result<String> {
        let started = Instant::now();
        let result = self.artifacts.latest_artifact(ArtifactCategory::Img);
        self.report(
            started,
            result,
            |name| format!("Get the latest screenshot is {}", name),
            |e| format!("No screenshot available: {}", e),
        )
    }

    /// Crop the element out of a fresh capture into `cut_img/<day>/`
    pub async fn get_element_image(&self, locator: &Locator) -> Result<PathBuf> {
        let started = Instant::now();
        let result: Result<PathBuf> = async {
            let element = self.find_element(locator).await?;
            let capture = self.save_screenshot_as_picture(&locator.file_stem()).await?;
            let rect = self.session.rect(&element).await?;
            let target = self
                .artifacts
                .name_artifact(ArtifactCategory::CutImg, Some(&locator.file_stem()))?;
            if !crop_to(&capture, BoundingBox::from_rect(&rect), &target)? {
                return Err(HarnessError::NoMatch {
                    locator: locator.clone(),
                    detail: "element lies outside the captured screen".to_string(),
                });
            }
            Ok(target)
        }
        .await;
        self.report(
            started,
            result,
            |path| format!("Cut the element {} to {}", locator, path.display()),
            |e| format!("Cutting the element {} failed: {}", locator, e),
        )
    }

    pub async fn window_size(&self) -> Result<WindowSize> {
        self.session.window_size().await
    }

    async fn repeat_swipe(&self, path: (Point, Point), count: u32, duration: Duration) -> Result<()> {
        for _ in 0..count {
            self.session.swipe(path.0, path.1, duration).await?;
        }
        Ok(())
    }

    pub async fn swipe_down(&self, count: u32, duration: Duration) -> Result<()> {
        let started = Instant::now();
        let result = async {
            let size = self.session.window_size().await?;
            self.repeat_swipe(swipe_down_path(size), count, duration).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("The phone screen slides down {} count", count),
            |e| format!("The phone screen slides down failed: {}", e),
        )
    }

    pub async fn swipe_left(&self, count: u32, duration: Duration) -> Result<()> {
        let started = Instant::now();
        let result = async {
            let size = self.session.window_size().await?;
            self.repeat_swipe(swipe_left_path(size), count, duration).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("The phone screen slides left {} count", count),
            |e| format!("The phone screen slides left failed: {}", e),
        )
    }

    /// Touch each point with its own finger for `duration`
    pub async fn tap(&self, points: &[Point], duration: Duration) -> Result<()> {
        let started = Instant::now();
        let result = self.session.tap(points, duration).await;
        self.report(
            started,
            result,
            |_| format!("Simulate finger click at {:?}", points),
            |e| format!("Simulate finger click failure: {}", e),
        )
    }

    pub async fn drag_and_drop(&self, source: &Locator, target: &Locator) -> Result<()> {
        let started = Instant::now();
        let result = async {
            let from = self.find_element(source).await?;
            let to = self.find_element(target).await?;
            self.session.drag_and_drop(&from, &to).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("Element {} move to element {}", source, target),
            |e| format!("Drag and drop fail: {}", e),
        )
    }

    pub async fn element_scroll(&self, source: &Locator, target: &Locator) -> Result<()> {
        let started = Instant::now();
        let result = async {
            let from = self.find_element(source).await?;
            let to = self.find_element(target).await?;
            self.session.scroll(&from, &to).await
        }
        .await;
        self.report(
            started,
            result,
            |_| format!("Element {} scroll to element {}", source, target),
            |e| format!("Element scroll fail: {}", e),
        )
    }

    /// Switch away from `current` when another context exists
    async fn switch_away(&self, current: &str) -> Result<Option<String>> {
        let contexts = self.session.contexts().await?;
        match pick_context(current, &contexts) {
            Some(target) => {
                self.session.switch_context(&target).await?;
                Ok(Some(target))
            }
            None => {
                self.logger.warn(&format!(
                    "Only one context available ({:?}), staying in {}",
                    contexts, current
                ));
                Ok(None)
            }
        }
    }

    /// Click `locator`, let the web view load, then switch into it
    pub async fn switch_to_web_context(&self, locator: &Locator) -> Result<Option<String>> {
        let started = Instant::now();
        let result = async {
            let current = self.session.current_context().await?;
            self.click(locator).await?;
            self.wait(self.timing.context_wait()).await?;
            self.switch_away(&current).await
        }
        .await;
        self.report(
            started,
            result,
            |target| format!("Switch to the web context {:?}", target),
            |e| format!("Switch to the web context failed: {}", e),
        )
    }

    pub async fn switch_to_native_context(&self) -> Result<Option<String>> {
        let started = Instant::now();
        let result = async {
            let current = self.session.current_context().await?;
            self.switch_away(&current).await
        }
        .await;
        self.report(
            started,
            result,
            |target| format!("Switch to the native context {:?}", target),
            |e| format!("Switch to the native context failed: {}", e),
        )
    }

    pub async fn key_code(&self, code: u32) -> Result<()> {
        let started = Instant::now();
        let result = self.session.press_keycode(code).await;
        self.report(
            started,
            result,
            |_| format!("The physical keyboard number for the operation is {}", code),
            |e| format!("The physical keyboard {} performs an error: {}", code, e),
        )
    }

    pub async fn long_key_code(&self, code: u32) -> Result<()> {
        let started = Instant::now();
        let result = self.session.long_press_keycode(code).await;
        self.report(
            started,
            result,
            |_| format!("Long press the physical keyboard number is {}", code),
            |e| format!("Long press the physical keyboard {} failed: {}", code, e),
        )
    }

    /// Press one of HOME, BACK or CAMERA by name
    pub async fn key_event(&self, name: &str) -> Result<()> {
        let key = match NavigationKey::from_name(name) {
            Ok(key) => key,
            Err(e) => return self.report(Instant::now(), Err(e), |_| String::new(), |e| e.to_string()),
        };
        self.key_code(key.key_code().code()).await
    }

    pub async fn execute_script(&self, script: &str) -> Result<Value> {
        let started = Instant::now();
        let result = self.session.execute_script(script).await;
        self.report(
            started,
            result,
            |_| format!("Execute the JS script is {}", script),
            |e| format!("JS script execution fails: {}", e),
        )
    }

    pub async fn jquery_click(&self, css: &str) -> Result<()> {
        self.execute_script(&format!("$('{}').click()", css)).await?;
        Ok(())
    }

    pub async fn jquery_send(&self, css: &str, value: &str) -> Result<()> {
        self.execute_script(&format!("$('{}').val('{}')", css, value))
            .await?;
        Ok(())
    }

    pub async fn reset(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.session.reset().await;
        self.report(started, result, |_| "Reset the app".to_string(), |e| {
            format!("Reset the app failed: {}", e)
        })
    }

    pub async fn quit(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.session.quit().await;
        self.report(started, result, |_| "Close the session".to_string(), |e| {
            format!("Close the session failed: {}", e)
        })
    }

    /// Send the app to the background for `duration`
    pub async fn background(&self, duration: Duration) -> Result<()> {
        let started = Instant::now();
        let result = self.session.background_app(duration).await;
        self.report(
            started,
            result,
            |_| format!("App background operation {} seconds", duration.as_secs_f64()),
            |e| format!("App background running failure: {}", e),
        )
    }

    pub async fn close_app(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.session.close_app().await;
        self.report(started, result, |_| "Close the app".to_string(), |e| {
            format!("Close the app failed: {}", e)
        })
    }

    pub async fn is_app_installed(&self, package: &str) -> Result<bool> {
        let started = Instant::now();
        let result = self.session.is_app_installed(package).await;
        self.report(
            started,
            result,
            |installed| format!("App {} installed: {}", package, installed),
            |e| format!("Checking app {} failed: {}", package, e),
        )
    }

    pub async fn shake(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.session.shake().await;
        self.report(started, result, |_| "Shake the device".to_string(), |e| {
            format!("Shake the device failed: {}", e)
        })
    }

    pub async fn toggle_location_services(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.session.toggle_location_services().await;
        self.report(
            started,
            result,
            |_| "Toggle the location services on the device".to_string(),
            |e| format!("Toggle the location services failed: {}", e),
        )
    }

    pub async fn get_page_source(&self) -> Result<String> {
        let started = Instant::now();
        let result = self.session.page_source().await;
        self.report(
            started,
            result,
            |_| "Gets the source of the current page".to_string(),
            |e| format!("Gets the page source failed: {}", e),
        )
    }
}
