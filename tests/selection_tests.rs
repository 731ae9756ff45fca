mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{settle, vessel, MockFeed};
use shipmap::core::config::{SelectionConfig, ViewConfig};
use shipmap::prelude::*;
use tokio::time::sleep;

struct LoadedVessels(Vec<VesselRecord>);

impl VesselLookup for LoadedVessels {
    fn find_vessel(&self, id: &str) -> Option<VesselRecord> {
        self.0.iter().find(|v| v.matches_id(id)).cloned()
    }
}

#[derive(Default)]
struct RecordingNavigator(Mutex<Vec<(LatLng, f64)>>);

impl Navigator for RecordingNavigator {
    fn recenter(&self, center: LatLng, min_zoom: f64) {
        self.0.lock().unwrap().push((center, min_zoom));
    }
}

fn linker(
    loaded: Vec<VesselRecord>,
    feed: Arc<MockFeed>,
    navigator: Arc<dyn Navigator>,
) -> SelectionLinker {
    SelectionLinker::new(
        Arc::new(LoadedVessels(loaded)),
        feed,
        navigator,
        SelectionConfig::default(),
        None,
    )
}

#[tokio::test]
async fn loaded_vessel_resolves_without_network() {
    let feed = MockFeed::new();
    let navigator = Arc::new(RecordingNavigator::default());
    let linker = linker(vec![vessel(211_000_001, 54.3, 10.1, 70)], feed.clone(), navigator.clone());

    linker.resolve_external_id(Some("211000001")).await;

    assert_eq!(linker.phase(), SelectionPhase::Resolved);
    let state = linker.state();
    assert!(state.panel_open);
    assert_eq!(state.external_id.as_deref(), Some("211000001"));
    assert_eq!(state.entity.map(|v| v.mmsi), Some(211_000_001));
    assert!(feed.lookups().is_empty());
    assert!(navigator.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_vessel_is_fetched_once_and_recentered() {
    let feed = MockFeed::new();
    feed.add_vessel(vessel(244_660_000, 51.95, 4.12, 70));
    let navigator = Arc::new(RecordingNavigator::default());
    let linker = linker(Vec::new(), feed.clone(), navigator.clone());

    linker.resolve_external_id(Some("244660000")).await;

    assert_eq!(feed.lookups(), vec!["244660000".to_string()]);
    assert_eq!(linker.phase(), SelectionPhase::Resolved);
    let recenters = navigator.0.lock().unwrap().clone();
    assert_eq!(recenters, vec![(LatLng::new(51.95, 4.12), 10.0)]);
}

#[tokio::test]
async fn recenter_never_lowers_zoom() {
    let feed = MockFeed::new();
    feed.add_vessel(vessel(244_660_000, 51.95, 4.12, 70));
    feed.add_vessel(vessel(244_660_001, 52.10, 4.30, 70));
    let view = ViewStateController::new(Arc::new(MemoryStore::new()), &ViewConfig::default());
    let linker = linker(Vec::new(), feed.clone(), Arc::new(view.clone()));

    view.on_change(ViewState::new(0.0, 0.0, 13.0));
    linker.resolve_external_id(Some("244660000")).await;
    assert_eq!(view.view_state().center(), LatLng::new(51.95, 4.12));
    assert_eq!(view.view_state().zoom, 13.0);

    view.on_change(ViewState::new(0.0, 0.0, 3.0));
    linker.resolve_external_id(Some("244660001")).await;
    assert_eq!(view.view_state().zoom, 10.0);
    assert_eq!(feed.lookups().len(), 2);
}

#[tokio::test]
async fn failed_lookup_returns_to_idle() {
    let feed = MockFeed::new();
    let navigator = Arc::new(RecordingNavigator::default());
    let linker = linker(Vec::new(), feed.clone(), navigator.clone());

    linker.resolve_external_id(Some("999")).await;
    assert_eq!(linker.phase(), SelectionPhase::Idle);
    assert_eq!(linker.state(), SelectionState::default());

    feed.set_lookup_fails(true);
    feed.add_vessel(vessel(123, 1.0, 1.0, 30));
    linker.resolve_external_id(Some("123")).await;
    assert_eq!(linker.phase(), SelectionPhase::Idle);
    assert!(!linker.state().panel_open);
    assert_eq!(feed.lookups().len(), 2);
    assert!(navigator.0.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_resolution_never_commits() {
    let feed = MockFeed::new();
    feed.add_vessel(vessel(1, 10.0, 10.0, 70));
    feed.add_vessel(vessel(2, 20.0, 20.0, 70));
    feed.set_lookup_delay("1", Duration::from_secs(2));
    let navigator = Arc::new(RecordingNavigator::default());
    let linker = linker(Vec::new(), feed.clone(), navigator.clone());

    let _slow = linker.set_external_id(Some("1"));
    settle().await;
    assert_eq!(linker.phase(), SelectionPhase::Searching);
    assert!(linker.state().panel_open);

    let _fast = linker.set_external_id(Some("2"));
    sleep(Duration::from_secs(3)).await;

    let state = linker.state();
    assert_eq!(state.external_id.as_deref(), Some("2"));
    assert_eq!(state.entity.map(|v| v.mmsi), Some(2));
    assert_eq!(
        navigator.0.lock().unwrap().clone(),
        vec![(LatLng::new(20.0, 20.0), 10.0)]
    );
}

#[tokio::test(start_paused = true)]
async fn map_selection_supersedes_pending_lookup() {
    let feed = MockFeed::new();
    feed.add_vessel(vessel(1, 10.0, 10.0, 70));
    feed.set_lookup_delay("1", Duration::from_secs(2));
    let linker = linker(Vec::new(), feed.clone(), Arc::new(RecordingNavigator::default()));

    let _pending = linker.set_external_id(Some("1"));
    settle().await;
    linker.select_entity(vessel(7, 30.0, 30.0, 60));
    sleep(Duration::from_secs(3)).await;

    let state = linker.state();
    assert_eq!(state.external_id.as_deref(), Some("7"));
    assert_eq!(linker.phase(), SelectionPhase::Resolved);
}

#[tokio::test]
async fn picks_select_or_close() {
    let linker = linker(
        Vec::new(),
        MockFeed::new(),
        Arc::new(RecordingNavigator::default()),
    );
    let mut changes = linker.subscribe();

    linker.handle_pick(Some("cargo-vessel-layer"), Some(vessel(42, 1.0, 2.0, 70)));
    assert_eq!(linker.phase(), SelectionPhase::Resolved);
    assert_eq!(linker.state().external_id.as_deref(), Some("42"));
    assert!(changes.has_changed().unwrap());
    changes.borrow_and_update();

    // labels are not pickable targets
    linker.handle_pick(Some("cargo-vessel-names"), Some(vessel(43, 1.0, 2.0, 70)));
    assert_eq!(linker.phase(), SelectionPhase::Idle);

    linker.handle_pick(Some("osm-layer"), None);
    assert_eq!(linker.phase(), SelectionPhase::Idle);

    linker.handle_pick(Some("tug-vessel-layer"), Some(vessel(44, 1.0, 2.0, 52)));
    linker.close();
    assert_eq!(linker.state(), SelectionState::default());
}

#[tokio::test]
async fn empty_id_closes_panel() {
    let linker = linker(
        vec![vessel(5, 1.0, 1.0, 70)],
        MockFeed::new(),
        Arc::new(RecordingNavigator::default()),
    );
    linker.resolve_external_id(Some("5")).await;
    assert!(linker.state().panel_open);

    assert!(linker.set_external_id(Some("  ")).is_none());
    assert_eq!(linker.phase(), SelectionPhase::Idle);
    assert!(linker.state().external_id.is_none());
}

#[tokio::test]
async fn non_mmsi_id_never_reaches_the_feed() {
    let feed = MockFeed::new();
    let navigator = Arc::new(RecordingNavigator::default());
    let linker = linker(vec![vessel(5, 1.0, 1.0, 70)], feed.clone(), navigator.clone());
    linker.resolve_external_id(Some("5")).await;
    assert!(linker.state().panel_open);

    for id in ["../all", "a/b", "5x", "-5"] {
        assert!(linker.set_external_id(Some(id)).is_none(), "{id}");
        assert_eq!(linker.phase(), SelectionPhase::Idle);
        assert!(!linker.state().panel_open);
    }
    settle().await;
    assert!(feed.lookups().is_empty());
    assert!(navigator.0.lock().unwrap().is_empty());
}
