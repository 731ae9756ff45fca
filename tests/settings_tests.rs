use std::sync::Arc;

use serde_json::json;
use shipmap::constants::{LAYER_VISIBILITY_KEY, UPDATED_AT_FIELD};
use shipmap::prelude::*;

struct Tiers {
    session: Arc<StaticSession>,
    local: Arc<MemoryStore>,
    remote: Arc<MemoryRemoteStore>,
    repository: SettingsRepository,
}

fn tiers(session: StaticSession) -> Tiers {
    let session = Arc::new(session);
    let local = Arc::new(MemoryStore::new());
    let remote = Arc::new(MemoryRemoteStore::new());
    let repository = SettingsRepository::new(session.clone(), local.clone(), Some(remote.clone()));
    Tiers {
        session,
        local,
        remote,
        repository,
    }
}

#[tokio::test]
async fn anonymous_save_stays_local() {
    let t = tiers(StaticSession::anonymous());
    let mut visibility = LayerVisibility::default();
    visibility.set(LayerKey::Category(VesselCategory::Fishing), false);

    t.repository.save_visibility(&visibility).await;

    assert_eq!(t.remote.merge_count(), 0);
    let stored = t.local.get(LAYER_VISIBILITY_KEY).unwrap().unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored["fishingVessels"], json!(false));

    assert_eq!(t.repository.load_visibility().await, visibility);
    assert_eq!(t.remote.fetch_count(), 0);
}

#[tokio::test]
async fn signed_in_save_leaves_local_copy_alone() {
    let t = tiers(StaticSession::signed_in("account-1"));
    t.local
        .set(LAYER_VISIBILITY_KEY, r#"{"osm":false}"#)
        .unwrap();

    let mut visibility = LayerVisibility::default();
    visibility.set(LayerKey::VesselNames, true);
    t.repository.save_visibility(&visibility).await;

    assert_eq!(
        t.local.get(LAYER_VISIBILITY_KEY).unwrap().as_deref(),
        Some(r#"{"osm":false}"#)
    );
    let document = t.remote.document("account-1").unwrap();
    assert_eq!(document[LAYER_VISIBILITY_KEY]["vesselNames"], json!(true));
    assert!(document[UPDATED_AT_FIELD].as_u64().is_some());
    assert_eq!(t.repository.load_visibility().await, visibility);
}

#[tokio::test]
async fn remote_merge_touches_only_the_named_key() {
    let t = tiers(StaticSession::signed_in("account-1"));
    let mut document = serde_json::Map::new();
    document.insert("theme".to_string(), json!("dark"));
    t.remote.insert_document("account-1", document);

    t.repository.save("mapLayerVisibility", json!({"osm": false})).await;

    let document = t.remote.document("account-1").unwrap();
    assert_eq!(document["theme"], json!("dark"));
    assert_eq!(document["mapLayerVisibility"], json!({"osm": false}));
}

#[tokio::test]
async fn remote_values_merge_over_defaults() {
    let t = tiers(StaticSession::signed_in("account-2"));
    let mut document = serde_json::Map::new();
    document.insert(
        LAYER_VISIBILITY_KEY.to_string(),
        json!({"cargoVessels": false, "unknownLayer": true}),
    );
    t.remote.insert_document("account-2", document);

    let visibility = t.repository.load_visibility().await;
    assert!(!visibility.is_visible(LayerKey::Category(VesselCategory::Cargo)));
    assert!(visibility.is_visible(LayerKey::Category(VesselCategory::Tanker)));
    assert!(visibility.is_visible(LayerKey::Background));
}

#[tokio::test]
async fn remote_failure_falls_back_to_local() {
    let t = tiers(StaticSession::signed_in("account-3"));
    t.local
        .set(LAYER_VISIBILITY_KEY, r#"{"tugs":false}"#)
        .unwrap();
    t.remote.set_failing(true);

    let visibility = t.repository.load_visibility().await;
    assert!(!visibility.is_visible(LayerKey::Category(VesselCategory::Tug)));
    assert_eq!(t.remote.fetch_count(), 1);

    // a failed save is swallowed and never written locally instead
    t.repository.save_visibility(&LayerVisibility::default()).await;
    assert_eq!(
        t.local.get(LAYER_VISIBILITY_KEY).unwrap().as_deref(),
        Some(r#"{"tugs":false}"#)
    );
}

#[tokio::test]
async fn malformed_local_settings_use_defaults() {
    let t = tiers(StaticSession::anonymous());
    t.local.set(LAYER_VISIBILITY_KEY, "{broken").unwrap();
    assert_eq!(t.repository.load_visibility().await, LayerVisibility::default());

    t.local.set(LAYER_VISIBILITY_KEY, "[true, false]").unwrap();
    assert_eq!(t.repository.load_visibility().await, LayerVisibility::default());
}

#[tokio::test]
async fn session_switch_changes_tier() {
    let t = tiers(StaticSession::anonymous());
    t.repository.save("theme", json!("light")).await;
    assert_eq!(t.repository.load("theme").await, Some(json!("light")));

    t.session.sign_in("account-4");
    assert_eq!(t.repository.load("theme").await, None);
    t.repository.save("theme", json!("dark")).await;
    assert_eq!(t.repository.load("theme").await, Some(json!("dark")));

    t.session.sign_out();
    assert_eq!(t.repository.load("theme").await, Some(json!("light")));
}
