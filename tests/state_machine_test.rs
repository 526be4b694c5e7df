mod common;

use std::time::Duration;

use cloudeck::app::{FocusArea, ViewMode};
use cloudeck::module::ModuleState;
use cloudeck::testing::{FakeLoaded, FakeProbe};
use common::{app_with, fake, pump};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[tokio::test(start_paused = true)]
async fn test_stale_fetch_after_module_switch_is_discarded() {
    let slow = FakeProbe::default();
    slow.set_fetch_delay(Duration::from_millis(500));
    let fast = FakeProbe::default();
    fast.set_fetch_delay(Duration::from_millis(50));
    let (mut app, mut rx) = app_with(vec![fake("slow", &slow), fake("fast", &fast)]);

    app.enter_module("slow");
    app.enter_module("fast");

    // fast's own result, then slow's late one
    pump(&mut app, &mut rx, 2).await;

    assert!(slow.delivered().is_empty());
    assert_eq!(fast.delivered().len(), 1);
    assert_eq!(app.focus.active_module.as_deref(), Some("fast"));
    assert_eq!(app.active_module().unwrap().state(), ModuleState::Loaded);
}

#[tokio::test(start_paused = true)]
async fn test_stale_fetch_after_project_switch_is_discarded() {
    let probe = FakeProbe::default();
    probe.set_fetch_delay(Duration::from_millis(200));
    let (mut app, mut rx) = app_with(vec![fake("a", &probe)]);

    app.enter_module("a");
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.switch_project("beta");

    pump(&mut app, &mut rx, 2).await;

    assert_eq!(
        probe.delivered(),
        vec![FakeLoaded {
            project: "beta".to_string(),
            fetch: 2,
        }]
    );
}

#[tokio::test]
async fn test_focus_notifications_are_symmetric() {
    let probe = FakeProbe::default();
    let (mut app, _rx) = app_with(vec![fake("a", &probe), fake("b", &probe)]);

    app.enter_module("a");
    app.handle_key(press(KeyCode::Tab));
    app.handle_key(press(KeyCode::Tab));
    app.handle_key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL));
    app.handle_key(press(KeyCode::Esc));
    app.enter_module("b");
    app.go_home();

    assert_eq!(probe.focused(), probe.blurred());
    assert_eq!(app.focus.area, FocusArea::Sidebar);
}

#[tokio::test]
async fn test_palette_open_module_from_home() {
    let probe = FakeProbe::default();
    let (mut app, _rx) = app_with(vec![fake("queues", &probe)]);

    app.handle_key(press(KeyCode::Char(':')));
    assert_eq!(app.focus.palette_return, Some(FocusArea::Sidebar));
    for c in "open q".chars() {
        app.handle_key(press(KeyCode::Char(c)));
    }
    app.handle_key(press(KeyCode::Enter));

    assert_eq!(app.focus.view, ViewMode::ServiceDetail);
    assert_eq!(app.focus.area, FocusArea::Main);
    assert!(!app.focus.palette_open());
    assert!(app.focus.is_consistent());
}

#[tokio::test]
async fn test_palette_go_home_from_module_lands_on_sidebar() {
    let probe = FakeProbe::default();
    let (mut app, _rx) = app_with(vec![fake("queues", &probe)]);
    app.enter_module("queues");

    app.open_palette("go home");
    app.run_palette_selection();

    assert_eq!(app.focus.view, ViewMode::Home);
    assert_eq!(app.focus.area, FocusArea::Sidebar);
    assert!(app.focus.is_consistent());
    assert_eq!(probe.focused(), probe.blurred());
}

#[tokio::test(start_paused = true)]
async fn test_polling_stops_when_leaving_module() {
    let probe = FakeProbe::default();
    probe.set_poll_interval(Duration::from_secs(10));
    let (mut app, mut rx) = app_with(vec![fake("a", &probe)]);

    app.enter_module("a");
    pump(&mut app, &mut rx, 1).await;
    app.go_home();

    tokio::time::sleep(Duration::from_secs(35)).await;
    while let Ok(msg) = rx.try_recv() {
        app.handle_message(msg);
    }
    assert_eq!(probe.ticks(), 0);
    assert!(app.polling_module().is_none());
}

#[tokio::test]
async fn test_module_requests_home() {
    let probe = FakeProbe::default();
    let (mut app, _rx) = app_with(vec![fake("a", &probe)]);
    app.enter_module("a");

    app.handle_key(press(KeyCode::Char('g')));
    assert_eq!(app.focus.view, ViewMode::Home);
}

#[tokio::test]
async fn test_retry_key_recovers_failed_reinitialize() {
    let probe = FakeProbe::default();
    let (mut app, mut rx) = app_with(vec![fake("a", &probe)]);
    app.enter_module("a");
    pump(&mut app, &mut rx, 1).await;

    probe.fail_next_inits(1);
    app.switch_project("beta");
    assert_eq!(app.active_module().unwrap().state(), ModuleState::Error);
    assert!(app.last_error.is_some());

    app.handle_key(press(KeyCode::Char('r')));
    pump(&mut app, &mut rx, 1).await;

    assert_eq!(probe.initialized(), 2);
    assert_eq!(app.active_module().unwrap().state(), ModuleState::Loaded);
    assert_eq!(probe.last_project().as_deref(), Some("beta"));
    assert!(app.last_error.is_none());
}

#[tokio::test]
async fn test_reentering_active_module_retries_initialization() {
    let probe = FakeProbe::default();
    let (mut app, mut rx) = app_with(vec![fake("a", &probe)]);
    app.enter_module("a");
    pump(&mut app, &mut rx, 1).await;

    probe.fail_next_inits(1);
    app.switch_project("beta");
    app.handle_key(press(KeyCode::Tab));

    assert!(app.enter_module("a"));
    pump(&mut app, &mut rx, 1).await;

    assert_eq!(app.focus.area, FocusArea::Main);
    assert_eq!(app.active_module().unwrap().state(), ModuleState::Loaded);
    assert_eq!(probe.delivered().last().unwrap().project, "beta");
}

#[tokio::test]
async fn test_refresh_surfaces_repeated_initialization_failure() {
    let probe = FakeProbe::default();
    let (mut app, mut rx) = app_with(vec![fake("a", &probe)]);
    app.enter_module("a");
    pump(&mut app, &mut rx, 1).await;

    probe.fail_next_inits(2);
    app.switch_project("beta");
    app.last_error = None;
    app.refresh_active();

    assert_eq!(probe.initialized(), 2);
    assert_eq!(app.active_module().unwrap().state(), ModuleState::Error);
    assert!(app.last_error.as_deref().unwrap().contains("scripted failure"));
    assert_eq!(app.focus.view, ViewMode::ServiceDetail);
}
