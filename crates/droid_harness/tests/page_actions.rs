//! Page-layer behaviour against a scripted session

mod common;

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

use common::{page_in, quiet_logger, read_log, FakeElement, FakeSession};
use droid_harness::page::OUTLINE_COLOR;
use droid_harness::{AdbClient, ArtifactCategory, HarnessError, Locator, Point, Selection};

#[tokio::test(start_paused = true)]
async fn test_find_element_waits_at_least_the_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let session = FakeSession::new();
    let (page, log) = page_in(dir.path(), session.clone());
    let missing = Locator::id("missing");

    let started = Instant::now();
    let err = page
        .find_element_within(&missing, Duration::from_secs(3))
        .await
        .unwrap_err();

    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(matches!(err, HarnessError::ElementNotFound { ref locator, .. } if *locator == missing));
    assert!(session.lookups(&missing) >= 6);
    assert!(read_log(&log).contains("[FAIL] Please enter the correct targeting elements! <id -> missing>"));
}

#[tokio::test(start_paused = true)]
async fn test_find_element_polls_until_displayed() {
    let dir = tempfile::tempdir().unwrap();
    let login = Locator::id("login");
    let session = FakeSession::new().with_elements_after(&login, vec![FakeElement::new("e1")], 2);
    let (page, _) = page_in(dir.path(), session.clone());

    let started = Instant::now();
    let element = page.find_element(&login).await.unwrap();

    assert_eq!(element.id(), "e1");
    assert_eq!(session.lookups(&login), 3);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_hidden_element_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let banner = Locator::id("banner");
    let session = FakeSession::new().with_elements(&banner, vec![FakeElement::new("e1").hidden()]);
    let (page, _) = page_in(dir.path(), session);

    assert!(matches!(
        page.find_element(&banner).await,
        Err(HarnessError::ElementNotFound { .. })
    ));
}

#[tokio::test]
async fn test_random_selection_stays_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let items = Locator::new(droid_harness::By::ClassName, "android.widget.TextView");
    let elements = (0..5).map(|i| FakeElement::new(&format!("e{}", i))).collect();
    let session = FakeSession::new().with_elements(&items, elements);
    let (page, _) = page_in(dir.path(), session);

    let mut seen = HashSet::new();
    for _ in 0..100 {
        let element = page.find_elements(&items, Selection::Random).await.unwrap();
        seen.insert(element.id().to_string());
    }
    let expected: HashSet<String> = (0..5).map(|i| format!("e{}", i)).collect();
    assert!(seen.is_subset(&expected));
    assert!(seen.len() > 1);
}

#[tokio::test]
async fn test_selection_errors() {
    let dir = tempfile::tempdir().unwrap();
    let items = Locator::id("item");
    let session = FakeSession::new().with_elements(&items, vec![FakeElement::new("a"), FakeElement::new("b")]);
    let (page, log) = page_in(dir.path(), session);

    assert_eq!(page.find_elements(&items, Selection::Index(1)).await.unwrap().id(), "b");
    assert!(matches!(
        page.find_elements(&items, Selection::Index(2)).await,
        Err(HarnessError::NoMatch { .. })
    ));
    assert!(matches!(
        page.find_elements(&Locator::id("none"), Selection::Random).await,
        Err(HarnessError::NoMatch { .. })
    ));
    assert!(matches!(
        page.find_elements(&Locator::id("none"), Selection::Index(0)).await,
        Err(HarnessError::NoMatch { .. })
    ));
    assert!(matches!(
        page.elements_click(&Locator::id("none"), 0).await,
        Err(HarnessError::NoMatch { .. })
    ));
    assert!(read_log(&log).contains("[FAIL] No related elements are found in the interface"));
}

#[tokio::test]
async fn test_elements_click_and_random_click() {
    let dir = tempfile::tempdir().unwrap();
    let items = Locator::id("item");
    let session = FakeSession::new().with_elements(&items, vec![FakeElement::new("a"), FakeElement::new("b")]);
    let (page, log) = page_in(dir.path(), session.clone());

    page.elements_click(&items, 1).await.unwrap();
    page.random_click(&items).await.unwrap();

    let clicks: Vec<String> = session.calls().into_iter().filter(|c| c.starts_with("click")).collect();
    assert_eq!(clicks[0], "click b");
    assert_eq!(clicks.len(), 2);
    assert!(read_log(&log).contains("[SUCCESS] Click the element <id -> item> at index 1"));
}

#[tokio::test]
async fn test_click_annotates_capture() {
    let dir = tempfile::tempdir().unwrap();
    let login = Locator::id("com.tdh.rpms:id/login");
    let session = FakeSession::new().with_elements(&login, vec![FakeElement::new("e1").rect(10.0, 20.0, 30.0, 10.0)]);
    let (page, log) = page_in(dir.path(), session.clone());

    page.click(&login).await.unwrap();

    let latest = page.get_latest_picture().await.unwrap();
    assert_eq!(latest, "com.tdh.rpms-id-login.png");

    let capture = page
        .artifacts()
        .name_artifact(ArtifactCategory::Img, Some("com.tdh.rpms-id-login"))
        .unwrap();
    let img = image::open(&capture).unwrap().to_rgba8();
    assert_eq!(*img.get_pixel(10, 20), OUTLINE_COLOR);
    assert_eq!(*img.get_pixel(40, 30), OUTLINE_COLOR);
    assert_eq!(*img.get_pixel(25, 25), image::Rgba([255, 255, 255, 255]));

    assert!(session.calls().contains(&"click e1".to_string()));
    assert!(read_log(&log).contains("[SUCCESS] Click the element <id -> com.tdh.rpms:id/login>"));
}

#[tokio::test]
async fn test_send_keys_clears_first() {
    let dir = tempfile::tempdir().unwrap();
    let phone = Locator::id("phone");
    let session = FakeSession::new().with_elements(&phone, vec![FakeElement::new("e1")]);
    let (page, _) = page_in(dir.path(), session.clone());

    page.send_keys("13564958080", &phone, true).await.unwrap();
    page.send_keys("0", &phone, false).await.unwrap();

    let calls: Vec<String> = session
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("clear") || c.starts_with("send_keys"))
        .collect();
    assert_eq!(calls, vec!["clear e1", "send_keys e1 13564958080", "send_keys e1 0"]);
}

#[tokio::test]
async fn test_text_and_attribute() {
    let dir = tempfile::tempdir().unwrap();
    let title = Locator::id("title");
    let session = FakeSession::new().with_elements(
        &title,
        vec![FakeElement::new("e1").text("Welcome back").attribute("enabled", "true")],
    );
    let (page, _) = page_in(dir.path(), session.clone());

    assert_eq!(page.get_text(&title).await.unwrap(), "Welcome back");
    assert_eq!(page.get_attribute(&title, "enabled").await.unwrap().as_deref(), Some("true"));
    assert_eq!(page.get_attribute(&title, "checked").await.unwrap(), None);

    let screenshots = session.calls().iter().filter(|c| *c == "screenshot").count();
    assert_eq!(screenshots, 1);
}

#[tokio::test(start_paused = true)]
async fn test_is_selected_treats_missing_as_false() {
    let dir = tempfile::tempdir().unwrap();
    let remember = Locator::id("remember");
    let session = FakeSession::new().with_elements(&remember, vec![FakeElement::new("e1").selected()]);
    let (page, _) = page_in(dir.path(), session);

    assert!(page.is_selected(&remember).await.unwrap());
    assert!(!page.is_selected(&Locator::id("absent")).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_checks_log_backend_failures() {
    let dir = tempfile::tempdir().unwrap();
    let status = Locator::id("status");
    let session = FakeSession::new()
        .with_elements(&status, vec![FakeElement::new("e1").text("Upload done")])
        .failing("find_elements");
    let (page, log) = page_in(dir.path(), session);

    let err = page
        .text_in_element(&status, "done", Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::BackendOperation { ref operation, .. } if operation == "find_elements"));
    assert!(read_log(&log).contains("[FAIL] Check the text done in element <id -> status> failed"));

    assert!(page.is_selected(&status).await.is_err());
    assert!(read_log(&log).contains("[FAIL] Gets the selected state of <id -> status> failed"));
}

#[tokio::test(start_paused = true)]
async fn test_annotate_logs_capture_failure() {
    let dir = tempfile::tempdir().unwrap();
    let login = Locator::id("login");
    let session = FakeSession::new()
        .with_elements(&login, vec![FakeElement::new("e1")])
        .failing("screenshot");
    let (page, log) = page_in(dir.path(), session);

    assert!(page.annotate(&login).await.is_err());
    assert!(read_log(&log).contains("[FAIL] Outline the element <id -> login> failed"));
}

#[tokio::test(start_paused = true)]
async fn test_text_in_element() {
    let dir = tempfile::tempdir().unwrap();
    let status = Locator::id("status");
    let session = FakeSession::new().with_elements(&status, vec![FakeElement::new("e1").text("Upload done")]);
    let (page, log) = page_in(dir.path(), session);

    assert!(page.text_in_element(&status, "done", Duration::from_secs(2)).await.unwrap());

    let started = Instant::now();
    assert!(!page.text_in_element(&status, "failed", Duration::from_secs(2)).await.unwrap());
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(read_log(&log).contains("[FAIL] The text failed not in element <id -> status>"));
}

#[tokio::test]
async fn test_get_element_image_crops_to_rect() {
    let dir = tempfile::tempdir().unwrap();
    let logo = Locator::id("logo");
    let session = FakeSession::new().with_elements(&logo, vec![FakeElement::new("e1").rect(5.0, 5.0, 40.0, 25.0)]);
    let (page, _) = page_in(dir.path(), session);

    let crop = page.get_element_image(&logo).await.unwrap();
    assert!(crop.to_string_lossy().contains("cut_img"));
    assert_eq!(image::open(&crop).unwrap().to_rgba8().dimensions(), (40, 25));
}

#[tokio::test]
async fn test_get_latest_picture_without_captures() {
    let dir = tempfile::tempdir().unwrap();
    let (page, _) = page_in(dir.path(), FakeSession::new());

    assert!(matches!(
        page.get_latest_picture().await,
        Err(HarnessError::ArtifactNotFound(_))
    ));
}

#[tokio::test]
async fn test_swipes_use_screen_fractions() {
    let dir = tempfile::tempdir().unwrap();
    let session = FakeSession::new().with_screen(1080, 2400);
    let (page, _) = page_in(dir.path(), session.clone());

    page.swipe_down(2, Duration::from_millis(500)).await.unwrap();
    page.swipe_left(1, Duration::from_millis(300)).await.unwrap();

    let swipes: Vec<String> = session.calls().into_iter().filter(|c| c.starts_with("swipe")).collect();
    assert_eq!(
        swipes,
        vec![
            "swipe 540,600 540,1800 500",
            "swipe 540,600 540,1800 500",
            "swipe 810,1200 54,1200 300",
        ]
    );
}

#[tokio::test]
async fn test_tap_drag_and_scroll() {
    let dir = tempfile::tempdir().unwrap();
    let from = Locator::id("from");
    let to = Locator::id("to");
    let session = FakeSession::new()
        .with_elements(&from, vec![FakeElement::new("a")])
        .with_elements(&to, vec![FakeElement::new("b")]);
    let (page, _) = page_in(dir.path(), session.clone());

    page.tap(&[Point::new(100, 200), Point::new(210, 300)], Duration::from_millis(10))
        .await
        .unwrap();
    page.drag_and_drop(&from, &to).await.unwrap();
    page.element_scroll(&from, &to).await.unwrap();

    let calls = session.calls();
    assert!(calls.contains(&"tap 100,200;210,300 10".to_string()));
    assert!(calls.contains(&"drag_and_drop a b".to_string()));
    assert!(calls.contains(&"scroll a b".to_string()));
}

#[tokio::test]
async fn test_switch_to_native_picks_last_differing_context() {
    let dir = tempfile::tempdir().unwrap();
    let session = FakeSession::new().with_contexts(&["NATIVE_APP", "WEBVIEW_a", "WEBVIEW_b"], "WEBVIEW_b");
    let (page, _) = page_in(dir.path(), session.clone());

    let target = page.switch_to_native_context().await.unwrap();
    assert_eq!(target.as_deref(), Some("WEBVIEW_a"));
    assert_eq!(session.current_context_name(), "WEBVIEW_a");
}

#[tokio::test]
async fn test_single_context_warns_and_stays() {
    let dir = tempfile::tempdir().unwrap();
    let session = FakeSession::new();
    let (page, log) = page_in(dir.path(), session.clone());

    assert_eq!(page.switch_to_native_context().await.unwrap(), None);
    assert_eq!(session.current_context_name(), "NATIVE_APP");
    assert!(read_log(&log).contains("[WARN] Only one context available"));
}

#[tokio::test]
async fn test_switch_to_web_context_clicks_then_waits() {
    let dir = tempfile::tempdir().unwrap();
    let banner = Locator::id("banner");
    let session = FakeSession::new()
        .with_elements(&banner, vec![FakeElement::new("e1")])
        .with_contexts(&["NATIVE_APP", "WEBVIEW_com.tdh.rpms"], "NATIVE_APP");
    let (page, _) = page_in(dir.path(), session.clone());

    let target = page.switch_to_web_context(&banner).await.unwrap();
    assert_eq!(target.as_deref(), Some("WEBVIEW_com.tdh.rpms"));

    let calls = session.calls();
    let click = calls.iter().position(|c| c == "click e1").unwrap();
    let wait = calls.iter().position(|c| c == "implicit_wait 3").unwrap();
    let switch = calls
        .iter()
        .position(|c| c == "switch_context WEBVIEW_com.tdh.rpms")
        .unwrap();
    assert!(click < wait && wait < switch);
}

#[tokio::test]
async fn test_key_events() {
    let dir = tempfile::tempdir().unwrap();
    let session = FakeSession::new();
    let (page, log) = page_in(dir.path(), session.clone());

    page.key_event("HOME").await.unwrap();
    page.long_key_code(26).await.unwrap();
    assert!(matches!(
        page.key_event("KEYCODE_BACK").await,
        Err(HarnessError::UnknownKey(_))
    ));

    assert_eq!(session.calls(), vec!["press_keycode 3", "long_press_keycode 26"]);
    assert!(read_log(&log).contains("[FAIL] Unknown key: KEYCODE_BACK"));
}

#[tokio::test]
async fn test_backend_failure_is_logged_and_propagated() {
    let dir = tempfile::tempdir().unwrap();
    let login = Locator::id("login");
    let session = FakeSession::new()
        .with_elements(&login, vec![FakeElement::new("e1")])
        .failing("click");
    let (page, log) = page_in(dir.path(), session);

    let err = page.click(&login).await.unwrap_err();
    assert!(matches!(err, HarnessError::BackendOperation { ref operation, .. } if operation == "click"));
    assert!(read_log(&log).contains("[FAIL] Element click failure <id -> login>"));
}

#[tokio::test]
async fn test_scripts_and_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let session = FakeSession::new();
    let (page, _) = page_in(dir.path(), session.clone());

    page.jquery_click("#kw").await.unwrap();
    page.jquery_send("#kw", "PYTHON").await.unwrap();
    page.background(Duration::from_secs(5)).await.unwrap();
    assert!(page.is_app_installed("com.tdh.rpms").await.unwrap());
    assert!(!page.is_app_installed("com.other").await.unwrap());
    assert_eq!(page.get_page_source().await.unwrap(), "<hierarchy/>");
    page.reset().await.unwrap();
    page.close_app().await.unwrap();
    page.shake().await.unwrap();
    page.toggle_location_services().await.unwrap();
    page.quit().await.unwrap();

    let calls = session.calls();
    assert_eq!(calls[0], "execute_script $('#kw').click()");
    assert_eq!(calls[1], "execute_script $('#kw').val('PYTHON')");
    assert_eq!(calls[2], "background_app 5");
    assert_eq!(calls.last().map(String::as_str), Some("quit"));
}

#[tokio::test]
async fn test_wait_and_sleep_log_info() {
    let dir = tempfile::tempdir().unwrap();
    let session = FakeSession::new();
    let (page, log) = page_in(dir.path(), session.clone());

    page.wait(Duration::from_secs(30)).await.unwrap();
    page.sleep(Duration::from_millis(1)).await;

    assert_eq!(session.calls(), vec!["implicit_wait 30"]);
    let log = read_log(&log);
    assert!(log.contains("[INFO] Implicit waiting 30 seconds"));
    assert!(log.contains("[INFO] Mandatory waiting 0.001 seconds"));
}

#[tokio::test]
async fn test_rebind_replaces_session_and_logger() {
    let dir = tempfile::tempdir().unwrap();
    let first = FakeSession::new();
    let (mut page, first_log) = page_in(dir.path(), first.clone());

    let second = FakeSession::new();
    let second_log = dir.path().join("second.log");
    page.rebind(
        Box::new(second.clone()),
        AdbClient::new(Some("emulator-5556".to_string())),
        quiet_logger(&second_log),
    );
    page.key_code(4).await.unwrap();

    assert!(first.calls().is_empty());
    assert_eq!(second.calls(), vec!["press_keycode 4"]);
    assert_eq!(page.adb().device_id(), Some("emulator-5556"));
    assert!(read_log(&first_log).is_empty());
    assert!(read_log(&second_log).contains("physical keyboard number for the operation is 4"));
}
