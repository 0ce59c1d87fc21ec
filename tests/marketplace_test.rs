//! Checkout, dashboard and background timers integration tests

use agrolink_sdk::client::routes::{MY_CROPS, MY_HARVESTS, SALES_REPORT, UNREAD_NOTIFICATION_COUNT};
use agrolink_sdk::transport::Method;
use agrolink_sdk::{
    load_dashboard, place_order, spawn_ticker, spawn_unread_poller, CartStore, ClientConfig,
    KeyValueStore, ManualClock, MarketplaceApi, MemoryStore, MockTransport, NotificationStore,
    ProductRecord,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn url(path: &str) -> String {
    ClientConfig::default().url_for(path)
}

fn api() -> Arc<MarketplaceApi<MockTransport>> {
    Arc::new(MarketplaceApi::new(ClientConfig::default(), MockTransport::new()))
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_retry_after_failure() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
    let mut cart = CartStore::load(store.clone());
    let mut inbox = NotificationStore::load(store.clone(), clock);
    let api = api();
    api.transport()
        .unreachable(Method::Post, &url("pedidos"))
        .respond_json(Method::Post, &url("pedidos"), 201, json!({"id": 12}));

    cart.add_item(
        &ProductRecord::new(7, "Tomato", 2.5)
            .with_stock(10)
            .with_owner("ana@farm.test"),
        4,
    )
    .unwrap();

    let err = place_order(&api, &mut cart, &mut inbox, Some("t")).await.unwrap_err();
    assert_eq!(err.user_message(), "No connection to the server. Check your network and try again.");
    assert_eq!(cart.count(), 4);
    assert_eq!(CartStore::load(store.clone()).count(), 4);

    let receipt = place_order(&api, &mut cart, &mut inbox, Some("t")).await.unwrap();
    assert_eq!(receipt.total, 10.0);
    assert!(cart.is_empty());
    assert!(CartStore::load(store).is_empty());
    assert_eq!(inbox.unread_count("ana@farm.test"), 1);
    assert_eq!(inbox.list("ana@farm.test")[0].message, "4 kg of Tomato");
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
async fn test_dashboard_tolerates_failed_source() {
    let api = api();
    api.transport()
        .respond_json(Method::Get, &url(MY_CROPS.candidates[0]), 200, json!([{"id": 1}, {"id": 2}]))
        .respond_json(Method::Get, &url(SALES_REPORT.candidates[0]), 200, json!({"total": 6}));
    for path in MY_HARVESTS.candidates {
        api.transport().respond(Method::Get, &url(path), 404, None);
    }

    let dashboard = load_dashboard(&api, Some("t")).await;

    assert!(dashboard.harvests.is_err());
    assert_eq!(dashboard.crop_count(), 2);
    assert_eq!(*dashboard.sales_count.as_ref().unwrap(), 6);
}

// ============================================================================
// Timers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_poller_refreshes_on_interval() {
    let config = ClientConfig::default();
    let api = api();
    let count_url = url(UNREAD_NOTIFICATION_COUNT.candidates[0]);
    api.transport()
        .respond_json(Method::Get, &count_url, 200, json!(2))
        .respond(Method::Get, &count_url, 500, None)
        .respond_json(Method::Get, &count_url, 200, json!({"count": 4}));

    let (task, mut rx) = spawn_unread_poller(api.clone(), Some("t".into()), config.poll_interval);

    let mut seen = Vec::new();
    for _ in 0..3 {
        rx.changed().await.unwrap();
        seen.push(*rx.borrow_and_update());
    }
    // The failed poll walks every candidate before reporting 0
    assert_eq!(seen, vec![2, 0, 4]);
    assert!(task.is_running());

    drop(task);
    assert!(rx.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_timers_cancel_independently() {
    let config = ClientConfig::default();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
    let api = api();
    api.transport()
        .respond_json(Method::Get, &url(UNREAD_NOTIFICATION_COUNT.candidates[0]), 200, json!(1));

    let (poller, mut polls) = spawn_unread_poller(api.clone(), None, config.poll_interval);
    let (ticker, mut ticks) = spawn_ticker(clock, config.tick_interval);
    polls.changed().await.unwrap();
    ticks.changed().await.unwrap();

    poller.cancel();
    assert!(polls.changed().await.is_err());

    // The ticker keeps going after the poller is gone
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(ticker.is_running());
    assert!(ticks.has_changed().unwrap());
    assert_eq!(api.transport().requests().len(), 1);
}
