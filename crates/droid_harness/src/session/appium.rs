//! Session over the W3C WebDriver protocol with Appium extensions

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{ElementHandle, ElementRect, Locator, Point, Session, WindowSize};
use crate::error::{HarnessError, Result};

/// Key under which W3C servers return element references
const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// Key used by JSONWP-era servers
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const LONG_PRESS: Duration = Duration::from_millis(1000);
const SCROLL_MOVE: Duration = Duration::from_millis(600);

fn element_id(value: &Value) -> Option<String> {
    value
        .get(W3C_ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn center(rect: &ElementRect) -> Point {
    Point::new(
        (rect.x + rect.width / 2.0).round() as i32,
        (rect.y + rect.height / 2.0).round() as i32,
    )
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Touch pointer source: press at `from`, hold, optionally move, release
fn finger_path(name: &str, from: Point, to: Option<(Point, Duration)>, hold: Duration) -> Value {
    let mut actions = vec![
        json!({"type": "pointerMove", "duration": 0, "x": from.x, "y": from.y}),
        json!({"type": "pointerDown", "button": 0}),
        json!({"type": "pause", "duration": millis(hold)}),
    ];
    if let Some((to, duration)) = to {
        actions.push(json!({
            "type": "pointerMove",
            "duration": millis(duration),
            "origin": "viewport",
            "x": to.x,
            "y": to.y,
        }));
    }
    actions.push(json!({"type": "pointerUp", "button": 0}));

    json!({
        "type": "pointer",
        "id": name,
        "parameters": {"pointerType": "touch"},
        "actions": actions,
    })
}

/// HTTP client bound to one remote Appium session
#[derive(Debug, Clone)]
pub struct AppiumSession {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl AppiumSession {
    /// Create a new session on `server_url` with the given capabilities
    pub async fn start(server_url: &str, capabilities: &Map<String, Value>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        let base_url = server_url.trim_end_matches('/').to_string();

        let body = json!({
            "capabilities": {
                "alwaysMatch": capabilities,
                "firstMatch": [{}],
            },
            "desiredCapabilities": capabilities,
        });
        let response = client
            .post(format!("{}/session", base_url))
            .json(&body)
            .send()
            .await?;
        let payload = Self::unwrap_response("new_session", response).await?;

        let session_id = payload
            .get("value")
            .and_then(|v| v.get("sessionId"))
            .or_else(|| payload.get("sessionId"))
            .and_then(Value::as_str)
            .ok_or_else(|| HarnessError::backend("new_session", "response carried no sessionId"))?
            .to_string();

        debug!("Started session {} on {}", session_id, base_url);
        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    /// Attach to an existing session
    pub fn attach(server_url: &str, session_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            session_id: session_id.into(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Map a non-success response to `BackendOperation`, otherwise return its JSON body
    async fn unwrap_response(operation: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| {
                let value = body.get("value")?;
                let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
                let message = value.get("message").and_then(Value::as_str).unwrap_or("");
                Some(format!("{}: {}", error, message))
            })
            .unwrap_or_else(|| format!("HTTP {}: {}", status, text));

        Err(HarnessError::backend(operation, message))
    }

    /// Send one command and return its `value` field
    async fn command(&self, operation: &str, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::POST {
            request = request.json(&json!({}));
        }

        let payload = Self::unwrap_response(operation, request.send().await?).await?;
        Ok(payload.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn get(&self, operation: &str, path: &str) -> Result<Value> {
        self.command(operation, Method::GET, path, None).await
    }

    async fn post(&self, operation: &str, path: &str, body: Value) -> Result<Value> {
        self.command(operation, Method::POST, path, Some(body)).await
    }

    async fn element_get(&self, operation: &str, element: &ElementHandle, suffix: &str) -> Result<Value> {
        self.get(operation, &format!("/element/{}/{}", element.id(), suffix))
            .await
    }

    async fn perform(&self, operation: &str, sources: Vec<Value>) -> Result<()> {
        self.post(operation, "/actions", json!({"actions": sources}))
            .await?;
        Ok(())
    }

    fn expect_bool(operation: &str, value: Value) -> Result<bool> {
        value
            .as_bool()
            .ok_or_else(|| HarnessError::backend(operation, format!("expected boolean, got {}", value)))
    }

    fn expect_string(operation: &str, value: Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(HarnessError::backend(
                operation,
                format!("expected string, got {}", other),
            )),
        }
    }
}

#[async_trait]
impl Session for AppiumSession {
    async fn implicit_wait(&self, timeout: Duration) -> Result<()> {
        self.post("implicit_wait", "/timeouts", json!({"implicit": millis(timeout)}))
            .await?;
        Ok(())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let value = self
            .post(
                "find_elements",
                "/elements",
                json!({"using": locator.by.as_str(), "value": locator.selector}),
            )
            .await?;

        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(element_id)
                    .map(ElementHandle::new)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool> {
        let value = self.element_get("is_displayed", element, "displayed").await?;
        Self::expect_bool("is_displayed", value)
    }

    async fn is_selected(&self, element: &ElementHandle) -> Result<bool> {
        let value = self.element_get("is_selected", element, "selected").await?;
        Self::expect_bool("is_selected", value)
    }

    async fn text(&self, element: &ElementHandle) -> Result<String> {
        let value = self.element_get("text", element, "text").await?;
        Self::expect_string("text", value)
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let value = self
            .element_get("attribute", element, &format!("attribute/{}", name))
            .await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn rect(&self, element: &ElementHandle) -> Result<ElementRect> {
        let value = self.element_get("rect", element, "rect").await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        self.post("click", &format!("/element/{}/click", element.id()), json!({}))
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<()> {
        self.post("clear", &format!("/element/{}/clear", element.id()), json!({}))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, value: &str) -> Result<()> {
        let chars: Vec<String> = value.chars().map(String::from).collect();
        self.post(
            "send_keys",
            &format!("/element/{}/value", element.id()),
            json!({"text": value, "value": chars}),
        )
        .await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = self.get("screenshot", "/screenshot").await?;
        let encoded = Self::expect_string("screenshot", value)?;
        Ok(general_purpose::STANDARD.decode(encoded.trim())?)
    }

    async fn window_size(&self) -> Result<WindowSize> {
        let value = self.get("window_size", "/window/rect").await?;
        let dimension = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_f64)
                .map(|v| v as u32)
                .ok_or_else(|| HarnessError::backend("window_size", format!("missing {}", key)))
        };
        Ok(WindowSize {
            width: dimension("width")?,
            height: dimension("height")?,
        })
    }

    async fn swipe(&self, from: Point, to: Point, duration: Duration) -> Result<()> {
        self.perform(
            "swipe",
            vec![finger_path("finger1", from, Some((to, duration)), Duration::ZERO)],
        )
        .await
    }

    async fn tap(&self, points: &[Point], duration: Duration) -> Result<()> {
        let sources = points
            .iter()
            .enumerate()
            .map(|(i, point)| finger_path(&format!("finger{}", i + 1), *point, None, duration))
            .collect();
        self.perform("tap", sources).await
    }

    async fn drag_and_drop(&self, source: &ElementHandle, target: &ElementHandle) -> Result<()> {
        let from = center(&self.rect(source).await?);
        let to = center(&self.rect(target).await?);
        self.perform(
            "drag_and_drop",
            vec![finger_path("finger1", from, Some((to, SCROLL_MOVE)), LONG_PRESS)],
        )
        .await
    }

    async fn scroll(&self, source: &ElementHandle, target: &ElementHandle) -> Result<()> {
        let from = center(&self.rect(source).await?);
        let to = center(&self.rect(target).await?);
        self.perform(
            "scroll",
            vec![finger_path("finger1", from, Some((to, SCROLL_MOVE)), Duration::ZERO)],
        )
        .await
    }

    async fn current_context(&self) -> Result<String> {
        let value = self.get("current_context", "/context").await?;
        Self::expect_string("current_context", value)
    }

    async fn contexts(&self) -> Result<Vec<String>> {
        let value = self.get("contexts", "/contexts").await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn switch_context(&self, name: &str) -> Result<()> {
        self.post("switch_context", "/context", json!({"name": name}))
            .await?;
        Ok(())
    }

    async fn press_keycode(&self, code: u32) -> Result<()> {
        self.post("press_keycode", "/appium/device/press_keycode", json!({"keycode": code}))
            .await?;
        Ok(())
    }

    async fn long_press_keycode(&self, code: u32) -> Result<()> {
        self.post(
            "long_press_keycode",
            "/appium/device/long_press_keycode",
            json!({"keycode": code}),
        )
        .await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        self.post("execute_script", "/execute/sync", json!({"script": script, "args": []}))
            .await
    }

    async fn reset(&self) -> Result<()> {
        self.post("reset", "/appium/app/reset", json!({})).await?;
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        self.command("quit", Method::DELETE, "", None).await?;
        Ok(())
    }

    async fn background_app(&self, duration: Duration) -> Result<()> {
        self.post(
            "background_app",
            "/appium/app/background",
            json!({"seconds": duration.as_secs_f64()}),
        )
        .await?;
        Ok(())
    }

    async fn close_app(&self) -> Result<()> {
        self.post("close_app", "/appium/app/close", json!({})).await?;
        Ok(())
    }

    async fn is_app_installed(&self, package: &str) -> Result<bool> {
        let value = self
            .post(
                "is_app_installed",
                "/appium/device/app_installed",
                json!({"bundleId": package}),
            )
            .await?;
        Self::expect_bool("is_app_installed", value)
    }

    async fn shake(&self) -> Result<()> {
        self.post("shake", "/appium/device/shake", json!({})).await?;
        Ok(())
    }

    async fn toggle_location_services(&self) -> Result<()> {
        self.post(
            "toggle_location_services",
            "/appium/device/toggle_location_services",
            json!({}),
        )
        .await?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        let value = self.get("page_source", "/source").await?;
        Self::expect_string("page_source", value)
    }
}
