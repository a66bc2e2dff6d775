//! End-to-end tests for vaxwatch.
//!
//! A config file is written to a temporary directory, pointed at mock booking
//! and Pushbullet servers, loaded the way the CLI loads it, and run once.

use std::path::Path;

use serde_json::{Value, json};
use vaxwatch_config::AppConfig;
use vaxwatch_runner::{RunOptions, run_once};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Fixtures ─────────────────────────────────────────────────────────────

fn center(id: u64, name: &str, motives: Value, agendas: Value) -> Value {
    json!({"data": {
        "profile": {"id": id, "name_with_title": name},
        "visit_motives": motives,
        "agendas": agendas
    }})
}

async fn mount_center(server: &MockServer, slug: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/booking/{slug}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_devices(server: &MockServer, token: &str, devices: Value) {
    Mock::given(method("GET"))
        .and(path("/v2/devices"))
        .and(header("Access-Token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"devices": devices})))
        .mount(server)
        .await;
}

fn write_config(dir: &Path, booking: &MockServer, pushbullet: &MockServer, rest: &str) -> AppConfig {
    // Top-level keys in `rest` must come before any table header.
    let toml = format!(
        r#"
{rest}

[booking]
base_url = "{}"

[pushbullet]
base_url = "{}"
"#,
        booking.uri(),
        pushbullet.uri()
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, toml).unwrap();
    AppConfig::load_from(&path).unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_pfizer_slot_is_pushed_to_every_device() {
    let booking = MockServer::start().await;
    let pushbullet = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_center(
        &booking,
        "a",
        center(
            1,
            "A",
            json!([
                {"id": 1, "name": "1ère injection vaccin COVID-19 (Pfizer-BioNTech)"},
                {"id": 2, "name": "1ère injection vaccin COVID-19 (AstraZeneca)"}
            ]),
            json!([
                {"id": 10, "visit_motive_ids": [1], "practice_id": 100},
                {"id": 11, "visit_motive_ids": [2], "practice_id": 100}
            ]),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .and(query_param("visit_motive_ids", "1"))
        .and(query_param("agenda_ids", "10"))
        .and(query_param("practice_ids", "100"))
        .and(query_param("start_date", "2021-05-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "availabilities": [{"date": "2021-06-01", "slots": ["09:00", "09:05"]}],
            "total": 2
        })))
        .expect(1)
        .mount(&booking)
        .await;

    mount_devices(
        &pushbullet,
        "o.alice",
        json!([
            {"iden": "phone", "nickname": "Pixel", "pushable": true},
            {"iden": "laptop", "nickname": "ThinkPad", "pushable": true},
            {"iden": "box", "nickname": "Jeedom salon", "pushable": true}
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/v2/pushes"))
        .and(body_partial_json(json!({
            "type": "link",
            "title": "Vaccin Check",
            "body": "2 doses sont disponibles le 2021-06-01 à A"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&pushbullet)
        .await;

    let config = write_config(
        dir.path(),
        &booking,
        &pushbullet,
        r#"
[filter]
name_contains = ["pfizer"]

[[centers]]
name = "a"

[[profiles]]
name = "alice"
places = ["a"]
notify = { type = "pushbullet", token = "o.alice", exclude_devices = "Jeedom" }
"#,
    );

    let report = run_once(
        &config,
        RunOptions {
            start_date: chrono::NaiveDate::from_ymd_opt(2021, 5, 31),
            dry_run: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.name, "A");
    assert_eq!(record.available, 2);
    assert_eq!(record.when, "2021-06-01");
    assert_eq!(record.url, format!("{}/a", booking.uri()));
    assert_eq!(report.notified, vec![("alice".to_string(), 1)]);
}

#[tokio::test]
async fn e2e_profile_without_notify_is_skipped() {
    let booking = MockServer::start().await;
    let pushbullet = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    for slug in ["a", "b"] {
        mount_center(
            &booking,
            slug,
            center(
                1,
                &slug.to_uppercase(),
                json!([{"id": 1, "name": "Pfizer dose 1"}]),
                json!([{"id": 10, "visit_motive_ids": [1], "practice_id": 100}]),
            ),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "availabilities": [{"date": "2021-06-01", "slots": ["09:00"]}]
        })))
        .mount(&booking)
        .await;

    mount_devices(
        &pushbullet,
        "o.carol",
        json!([{"iden": "phone", "nickname": "Pixel", "pushable": true}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/v2/pushes"))
        .and(header("Access-Token", "o.carol"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&pushbullet)
        .await;

    let config = write_config(
        dir.path(),
        &booking,
        &pushbullet,
        r#"
[[profiles]]
name = "bob"
places = ["a"]

[[profiles]]
name = "carol"
places = ["b"]
notify = { type = "pushbullet", token = "o.carol" }

[[profiles]]
name = "dave"
places = ["a"]
notify = { type = "carrier_pigeon" }
"#,
    );

    let report = run_once(&config, RunOptions::default()).await.unwrap();
    assert_eq!(report.available().count(), 2);
    assert_eq!(report.notified, vec![("carol".to_string(), 1)]);
}

#[tokio::test]
async fn e2e_broadcast_gets_one_push_per_center_per_device() {
    let booking = MockServer::start().await;
    let pushbullet = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    for slug in ["a", "b", "c"] {
        mount_center(
            &booking,
            slug,
            center(
                1,
                slug,
                json!([{"id": 1, "name": "Pfizer dose 1"}]),
                json!([{"id": 10, "visit_motive_ids": [1], "practice_id": 100}]),
            ),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "availabilities": [{"date": "2021-06-01", "slots": ["09:00"]}]
        })))
        .mount(&booking)
        .await;

    mount_devices(
        &pushbullet,
        "o.all",
        json!([
            {"iden": "phone", "nickname": "Pixel", "pushable": true},
            {"iden": "tablet", "nickname": "Tab", "pushable": true},
            {"iden": "browser", "pushable": false}
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/v2/pushes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(6)
        .mount(&pushbullet)
        .await;

    let config = write_config(
        dir.path(),
        &booking,
        &pushbullet,
        r#"
[[centers]]
name = "a"

[[centers]]
name = "b"

[[centers]]
name = "c"

[broadcast]
type = "pushbullet"
token = "o.all"
"#,
    );

    let report = run_once(&config, RunOptions::default()).await.unwrap();
    assert_eq!(report.notified, vec![("broadcast".to_string(), 3)]);
}

#[tokio::test]
async fn e2e_filtered_out_center_makes_no_availability_request() {
    let booking = MockServer::start().await;
    let pushbullet = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_center(
        &booking,
        "a",
        center(
            1,
            "A",
            json!([{"id": 2, "name": "AstraZeneca dose 1"}]),
            json!([{"id": 11, "visit_motive_ids": [2], "practice_id": 100}]),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&booking)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pushbullet)
        .await;

    let config = write_config(
        dir.path(),
        &booking,
        &pushbullet,
        r#"
[filter]
name_contains = ["pfizer"]

[[centers]]
name = "a"

[broadcast]
type = "pushbullet"
token = "o.all"
"#,
    );

    let report = run_once(&config, RunOptions::default()).await.unwrap();
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].available, 0);
    assert_eq!(report.records[0].when, "");
    assert!(report.notified.is_empty());
}

#[tokio::test]
async fn e2e_failing_center_aborts_the_run() {
    let booking = MockServer::start().await;
    let pushbullet = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/booking/gone.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&booking)
        .await;

    let config = write_config(
        dir.path(),
        &booking,
        &pushbullet,
        r#"
[[centers]]
name = "gone"
"#,
    );

    let err = run_once(&config, RunOptions::default()).await.unwrap_err();
    assert!(err.to_string().contains("404"), "unexpected error: {err}");
}

#[tokio::test]
async fn e2e_profiles_from_external_json() {
    let booking = MockServer::start().await;
    let pushbullet = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_center(
        &booking,
        "a",
        center(
            1,
            "A",
            json!([{"id": 1, "name": "Pfizer dose 1"}]),
            json!([{"id": 10, "visit_motive_ids": [1], "practice_id": 100}]),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/availabilities.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "availabilities": [{"date": "2021-06-01", "slots": ["09:00"]}]
        })))
        .mount(&booking)
        .await;
    mount_devices(
        &pushbullet,
        "o.erin",
        json!([{"iden": "phone", "nickname": "Pixel", "pushable": true}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/v2/pushes"))
        .and(body_partial_json(json!({"body": "1 dose est disponible le 2021-06-01 à A"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&pushbullet)
        .await;

    std::fs::write(
        dir.path().join("profiles.json"),
        json!([
            {
                "name": "typo",
                "places": ["a"],
                "notify": {"token": "o.typo"}
            },
            {
                "name": "erin",
                "places": [format!("{}/centre-de-sante/x/a", booking.uri())],
                "notify": {"type": "pushbullet", "token": "o.erin"}
            }
        ])
        .to_string(),
    )
    .unwrap();

    let config = write_config(
        dir.path(),
        &booking,
        &pushbullet,
        r#"profiles_path = "profiles.json""#,
    );
    assert_eq!(config.profiles.len(), 2);

    let report = run_once(&config, RunOptions::default()).await.unwrap();
    assert_eq!(report.notified, vec![("erin".to_string(), 1)]);
}
