//! Scheduler state-machine tests: overlap skipping, stop semantics, and
//! lifecycle suspension/resumption. Timer behavior runs under paused
//! virtual time.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;

use common::*;
use giftwatch::adapters::mock::MockResponse;
use giftwatch::poll::{PollingScheduler, DEFAULT_POLL_PERIOD};
use giftwatch::traits::Response;

fn ok_json(value: &serde_json::Value) -> MockResponse {
    MockResponse::Success(Response::new(200, Bytes::from(value.to_string())))
}

fn wire_up(h: &Harness) {
    h.http.set_response(
        &auth_url(),
        MockResponse::Success(Response::new(200, Bytes::from(r#"{"token":"jwt-1"}"#))),
    );
    h.http.set_response(&config_url(), ok_json(&signed_config()));
    h.http
        .set_response(&gifts_url(), ok_json(&json!([feed_row("g1", "500", "@News_Collections")])));
}

/// Let spawned cycle tasks make progress under paused time.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn first_cycle_runs_immediately_then_every_period() {
    let h = Harness::new();
    wire_up(&h);
    let cycle = h.cycle();
    let scheduler = PollingScheduler::new(Arc::clone(&cycle), DEFAULT_POLL_PERIOD, false);

    scheduler.start();
    settle().await;
    assert_eq!(cycle.cycles_completed(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(cycle.cycles_completed(), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(cycle.cycles_completed(), 4);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn overlapping_tick_is_skipped_not_queued() {
    let h = Harness::new();
    wire_up(&h);
    // The gift fetch takes longer than a polling period
    h.http.set_response(
        &gifts_url(),
        MockResponse::Delayed(
            Response::new(
                200,
                Bytes::from(json!([feed_row("g1", "500", "@News_Collections")]).to_string()),
            ),
            Duration::from_secs(45),
        ),
    );

    let cycle = h.cycle();
    let scheduler = PollingScheduler::new(Arc::clone(&cycle), DEFAULT_POLL_PERIOD, false);

    scheduler.start();
    settle().await;
    assert_eq!(cycle.cycles_completed(), 0);

    // A second fire lands while the first cycle is still in flight
    scheduler.run_now();
    settle().await;
    assert_eq!(scheduler.ticks_skipped(), 1);

    // Let the slow cycle finish
    tokio::time::sleep(Duration::from_secs(60)).await;
    settle().await;
    assert!(cycle.cycles_completed() >= 1);
    // The skipped fire was never queued as an extra cycle
    assert_eq!(h.notifier.sent_count(), 1);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_prevents_future_ticks() {
    let h = Harness::new();
    wire_up(&h);
    let cycle = h.cycle();
    let scheduler = PollingScheduler::new(Arc::clone(&cycle), DEFAULT_POLL_PERIOD, false);

    scheduler.start();
    settle().await;
    assert_eq!(cycle.cycles_completed(), 1);

    scheduler.stop();
    assert!(!scheduler.is_scheduled());

    tokio::time::sleep(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(cycle.cycles_completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn pause_suspends_and_resume_catches_up() {
    let h = Harness::new();
    wire_up(&h);
    let cycle = h.cycle();
    let scheduler = PollingScheduler::new(Arc::clone(&cycle), DEFAULT_POLL_PERIOD, false);

    scheduler.start();
    settle().await;
    assert_eq!(cycle.cycles_completed(), 1);

    // Backgrounded on a platform without background execution
    scheduler.on_pause();
    assert!(!scheduler.is_scheduled());
    tokio::time::sleep(Duration::from_secs(600)).await;
    settle().await;
    assert_eq!(cycle.cycles_completed(), 1);

    // Resume fires an immediate catch-up fetch
    scheduler.on_resume();
    settle().await;
    assert_eq!(cycle.cycles_completed(), 2);
    assert!(scheduler.is_scheduled());

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn background_capable_platform_keeps_polling_through_pause() {
    let h = Harness::new();
    wire_up(&h);
    let cycle = h.cycle();
    let scheduler = PollingScheduler::new(Arc::clone(&cycle), DEFAULT_POLL_PERIOD, true);

    scheduler.start();
    settle().await;
    scheduler.on_pause();
    assert!(scheduler.is_scheduled());

    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(cycle.cycles_completed(), 2);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn double_start_is_a_noop() {
    let h = Harness::new();
    wire_up(&h);
    let cycle = h.cycle();
    let scheduler = PollingScheduler::new(Arc::clone(&cycle), DEFAULT_POLL_PERIOD, false);

    scheduler.start();
    scheduler.start();
    settle().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;

    // One timer: immediate tick plus one period, not doubled
    assert_eq!(cycle.cycles_completed(), 2);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_does_not_kill_a_cycle_past_dispatch() {
    let h = Harness::new();
    wire_up(&h);
    // Slow fetch keeps the cycle in flight when stop() lands
    h.http.set_response(
        &gifts_url(),
        MockResponse::Delayed(
            Response::new(
                200,
                Bytes::from(json!([feed_row("g1", "500", "@News_Collections")]).to_string()),
            ),
            Duration::from_secs(5),
        ),
    );

    let cycle = h.cycle();
    let scheduler = PollingScheduler::new(Arc::clone(&cycle), DEFAULT_POLL_PERIOD, false);

    scheduler.start();
    settle().await;
    scheduler.stop();

    tokio::time::sleep(Duration::from_secs(10)).await;
    settle().await;

    // The in-flight cycle completed and delivered despite the stop
    assert_eq!(cycle.cycles_completed(), 1);
    assert_eq!(h.notifier.sent_count(), 1);
}
