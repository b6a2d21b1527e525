mod common;

use common::{controller_for, grant, refresh_body};
use session_core::{RefreshScheduler, RefreshSettings};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_settings() -> RefreshSettings {
    // Compressed timing: tick every second, always inside the refresh
    // window, debounce wide enough that only one refresh can fire.
    RefreshSettings {
        check_interval_secs: 1,
        refresh_threshold_secs: 3600,
        min_refresh_gap_ms: 10_000,
        offline_after_failures: 2,
    }
}

#[tokio::test]
async fn armed_scheduler_fires_a_single_debounced_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("fresh", 900)))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri());
    controller.establish_session(grant("stale", 60));

    let scheduler = RefreshScheduler::new(Arc::clone(&controller), fast_settings());
    let handle = scheduler.spawn();

    // Two ticks elapse; the debounce gap keeps the second one quiet.
    tokio::time::sleep(Duration::from_millis(2300)).await;
    handle.join().await;

    server.verify().await;
    assert!(controller.state().is_authenticated());
}

#[tokio::test]
async fn manual_refresh_within_the_gap_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("fresh", 900)))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri());
    // Not expiring: manual refresh bypasses the threshold check.
    controller.establish_session(grant("stale", 7200));

    let scheduler = RefreshScheduler::new(Arc::clone(&controller), fast_settings());

    let first = scheduler.force_refresh().await.unwrap();
    let second = scheduler.force_refresh().await.unwrap();

    assert!(first.is_authenticated());
    assert!(second.is_authenticated());
    server.verify().await;
}

#[tokio::test]
async fn offline_mode_suspends_proactive_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("fresh", 900)))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri());
    controller.establish_session(grant("stale", 60));
    controller.set_offline_mode(true);

    let scheduler = RefreshScheduler::new(Arc::clone(&controller), fast_settings());
    let handle = scheduler.spawn();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.join().await;
    server.verify().await;
}

#[tokio::test]
async fn shutdown_cancels_the_timer_before_it_fires() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("fresh", 900)))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller_for(&server.uri());
    controller.establish_session(grant("stale", 60));

    let scheduler = RefreshScheduler::new(Arc::clone(&controller), fast_settings());
    let handle = scheduler.spawn();
    handle.join().await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    server.verify().await;
}

#[tokio::test]
async fn repeated_transport_failures_degrade_to_offline_mode() {
    // Backend unreachable: every proactive refresh fails at the transport
    // level and the controller is asked to go offline after two of them.
    let controller = controller_for("http://127.0.0.1:9");
    controller.establish_session(grant("stale", 60));

    let settings = RefreshSettings {
        min_refresh_gap_ms: 100,
        ..fast_settings()
    };
    let scheduler = RefreshScheduler::new(Arc::clone(&controller), settings);
    let handle = scheduler.spawn();

    let mut state_rx = controller.subscribe();
    let entered_offline = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if state_rx.borrow_and_update().is_offline_mode {
                return;
            }
            if state_rx.changed().await.is_err() {
                return;
            }
        }
    })
    .await;

    handle.join().await;
    assert!(entered_offline.is_ok(), "never entered offline mode");
    // The session itself survives the degradation.
    assert!(controller.state().is_authenticated());
}
