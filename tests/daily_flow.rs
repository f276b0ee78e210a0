//! Daily snapshot pipeline flow: counting, append-only persistence, and the
//! day-over-day comparison card.

mod common;

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use chrono::{Duration as ChronoDuration, FixedOffset, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::RecordingNotifier;
use feedback_worker::{
    clients::cms::{CmsClient, CmsConfig},
    config::{Category, Channel},
    pipeline::daily::{DailyPipeline, DailySettings},
    snapshot::store::{CategorySnapshot, ChannelSnapshot, DaySnapshot, SnapshotStore},
};

fn tz() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("offset")
}

fn cms_client(base_url: String) -> Arc<CmsClient> {
    Arc::new(
        CmsClient::new(CmsConfig {
            base_url,
            username: "reporter".to_string(),
            password: "secret".to_string(),
            connect_timeout: Duration::from_secs(3),
            total_timeout: Duration::from_secs(30),
        })
        .expect("cms client builds"),
    )
}

fn settings() -> DailySettings {
    DailySettings {
        categories: vec![Category {
            id: 25,
            title: "product".to_string(),
        }],
        channels: vec![
            Channel {
                key: "android".to_string(),
                webhook_url: "https://hooks.example.com/android".to_string(),
            },
            Channel {
                key: "ios".to_string(),
                webhook_url: "https://hooks.example.com/ios".to_string(),
            },
        ],
        concurrency: NonZeroUsize::new(2).expect("non-zero"),
        tz: tz(),
    }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/backend/account/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": "tok-1"})),
        )
        .mount(server)
        .await;
}

fn count_body(total: u64) -> serde_json::Value {
    json!({"code": 200, "data": {"content": [], "totalElements": total}})
}

async fn mount_counts(server: &MockServer) {
    // android: 4 resolved / 9 unresolved, ios: 2 resolved / 3 unresolved
    for (client_type, status, total) in [
        ("android", 1, 4u64),
        ("android", 0, 9),
        ("ios", 1, 2),
        ("ios", 0, 3),
    ] {
        Mock::given(method("POST"))
            .and(path("/user/behavior/backend/feedback/v2/page/0"))
            .and(body_partial_json(
                json!({"clientType": client_type, "status": status}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(count_body(total)))
            .mount(server)
            .await;
    }
}

fn seeded_prior_day() -> DaySnapshot {
    let mut android = ChannelSnapshot::new();
    android.insert(
        25,
        CategorySnapshot {
            category_title: "product".to_string(),
            resolved_total: 5,
            unresolved_total: 5,
        },
    );
    let mut day = DaySnapshot::new();
    day.insert("android".to_string(), android);
    day
}

#[tokio::test]
async fn daily_run_records_snapshot_and_sends_comparison() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_counts(&server).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store_path = dir.path().join("snapshots.yaml");

    let today_local = Utc::now().with_timezone(&tz()).date_naive();
    let snapshot_date = today_local - ChronoDuration::days(1);
    let prior_date = today_local - ChronoDuration::days(2);

    // Seed the store with the previous day's entry.
    let mut store = SnapshotStore::open(store_path.clone()).expect("open store");
    assert!(store.record(prior_date, seeded_prior_day()).expect("seed"));

    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = DailyPipeline::new(
        cms_client(server.uri()),
        Arc::clone(&notifier) as Arc<dyn feedback_worker::clients::webhook::Notifier>,
        settings(),
        store,
    );

    pipeline.run(Uuid::new_v4()).await.expect("daily run succeeds");

    // The new date was appended with the counted totals.
    let reloaded = SnapshotStore::open(store_path.clone()).expect("reload");
    let day = reloaded.day(snapshot_date).expect("snapshot recorded");
    assert_eq!(day["android"][&25].resolved_total, 4);
    assert_eq!(day["android"][&25].unresolved_total, 9);
    assert_eq!(day["ios"][&25].resolved_total, 2);
    assert_eq!(day["ios"][&25].unresolved_total, 3);

    // One comparison card per channel, routed to the channel webhook.
    let cards = notifier.cards();
    assert_eq!(cards.len(), 2);

    let android_card = cards
        .iter()
        .find(|card| card.webhook_url.ends_with("/android"))
        .expect("android card");
    assert!(android_card.title.contains("android"));
    // 13 total today vs 10 seeded yesterday.
    assert!(android_card.body.contains("total 13 (prior 10, ↑ +30.0%)"));

    let ios_card = cards
        .iter()
        .find(|card| card.webhook_url.ends_with("/ios"))
        .expect("ios card");
    // The seeded day had no ios entry: union keeps the category, prior is 0.
    assert!(ios_card.body.contains("total 5 (prior 0, new)"));
}

#[tokio::test]
async fn daily_rerun_never_overwrites_recorded_date() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_counts(&server).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store_path = dir.path().join("snapshots.yaml");

    let today_local = Utc::now().with_timezone(&tz()).date_naive();
    let snapshot_date = today_local - ChronoDuration::days(1);

    // Pre-record the snapshot date with different totals.
    let mut preexisting = ChannelSnapshot::new();
    preexisting.insert(
        25,
        CategorySnapshot {
            category_title: "product".to_string(),
            resolved_total: 100,
            unresolved_total: 200,
        },
    );
    let mut day = DaySnapshot::new();
    day.insert("android".to_string(), preexisting);

    let mut store = SnapshotStore::open(store_path.clone()).expect("open store");
    assert!(store.record(snapshot_date, day).expect("pre-record"));

    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = DailyPipeline::new(
        cms_client(server.uri()),
        Arc::clone(&notifier) as Arc<dyn feedback_worker::clients::webhook::Notifier>,
        settings(),
        store,
    );

    pipeline.run(Uuid::new_v4()).await.expect("daily rerun succeeds");

    // The recorded entry keeps its original totals.
    let reloaded = SnapshotStore::open(store_path).expect("reload");
    let day = reloaded.day(snapshot_date).expect("snapshot still there");
    assert_eq!(day["android"][&25].resolved_total, 100);
    assert_eq!(day["android"][&25].unresolved_total, 200);

    // Only one date exists, so no comparison card is possible.
    assert!(notifier.cards().is_empty());
}
