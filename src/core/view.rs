use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::core::config::ViewConfig;
use crate::core::constants::MAP_POSITION_KEY;
use crate::core::geo::{LatLng, SavedPosition, ViewState, ViewportBounds};
use crate::core::projection::GeoProjector;
use crate::selection::linker::Navigator;
use crate::settings::store::LocalStore;
use crate::sync::debounce::Debouncer;

/// Receives every successfully projected bounds change
pub trait BoundsListener: Send + Sync {
    fn on_bounds_changed(&self, bounds: ViewportBounds);
}

struct ViewModel {
    view: ViewState,
    width: f64,
    height: f64,
    projector: GeoProjector,
}

struct ViewInner {
    model: Mutex<ViewModel>,
    listeners: Mutex<Vec<Arc<dyn BoundsListener>>>,
    persist: Debouncer<SavedPosition>,
    changes: watch::Sender<ViewState>,
}

/// Owner of the current [`ViewState`].
///
/// Changes are projected and pushed to listeners immediately, while the
/// position is written to the local store only once the view has settled.
#[derive(Clone)]
pub struct ViewStateController {
    inner: Arc<ViewInner>,
}

impl ViewStateController {
    /// Restores the saved position from `local`. Must be called from within
    /// a tokio runtime.
    pub fn new(local: Arc<dyn LocalStore>, config: &ViewConfig) -> Self {
        let view = load_saved_view(local.as_ref());
        let persist = Debouncer::new(config.persist_debounce, move |position: SavedPosition| {
            let json = match serde_json::to_string(&position) {
                Ok(json) => json,
                Err(e) => {
                    log::warn!("failed to serialize map position: {}", e);
                    return;
                }
            };
            if let Err(e) = local.set(MAP_POSITION_KEY, &json) {
                log::warn!("failed to save map position: {}", e);
            }
        });

        let mut projector = GeoProjector::new();
        projector.update(&view, config.width, config.height);

        Self {
            inner: Arc::new(ViewInner {
                model: Mutex::new(ViewModel {
                    view,
                    width: config.width,
                    height: config.height,
                    projector,
                }),
                listeners: Mutex::new(Vec::new()),
                persist,
                changes: watch::channel(view).0,
            }),
        }
    }

    fn model(&self) -> MutexGuard<'_, ViewModel> {
        self.inner
            .model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_listener(&self, listener: Arc<dyn BoundsListener>) {
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.push(listener);
        }
    }

    pub fn view_state(&self) -> ViewState {
        self.model().view
    }

    /// Last successfully projected bounds
    pub fn bounds(&self) -> Option<ViewportBounds> {
        self.model().projector.bounds()
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        let model = self.model();
        (model.width, model.height)
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.changes.subscribe()
    }

    /// Interaction callback. Invalid states are ignored.
    pub fn on_change(&self, view: ViewState) {
        if !view.is_valid() {
            log::warn!("ignoring invalid view state {:?}", view);
            return;
        }
        let bounds = {
            let mut model = self.model();
            model.view = view;
            let (width, height) = (model.width, model.height);
            model.projector.refresh(&view, width, height)
        };
        self.inner.changes.send_replace(view);
        self.inner.persist.call(SavedPosition::from(&view));

        match bounds {
            Ok(bounds) => self.broadcast(bounds),
            Err(e) => log::error!("keeping previous bounds: {}", e),
        }
    }

    /// New pixel size of the map
    pub fn resize(&self, width: f64, height: f64) {
        let bounds = {
            let mut model = self.model();
            let view = model.view;
            let refreshed = model.projector.refresh(&view, width, height);
            if refreshed.is_ok() {
                model.width = width;
                model.height = height;
            }
            refreshed
        };
        match bounds {
            Ok(bounds) => self.broadcast(bounds),
            Err(e) => log::error!("ignoring viewport size {}x{}: {}", width, height, e),
        }
    }

    /// Pushes the current bounds to every listener again
    pub fn announce(&self) {
        if let Some(bounds) = self.bounds() {
            self.broadcast(bounds);
        }
    }

    fn broadcast(&self, bounds: ViewportBounds) {
        let listeners = match self.inner.listeners.lock() {
            Ok(listeners) => listeners.clone(),
            Err(_) => return,
        };
        for listener in listeners {
            listener.on_bounds_changed(bounds);
        }
    }
}

impl Navigator for ViewStateController {
    fn recenter(&self, center: LatLng, min_zoom: f64) {
        let view = self.view_state().recentered(center, min_zoom);
        log::info!(
            "recentering on {:.4},{:.4} at zoom {:.1}",
            view.latitude,
            view.longitude,
            view.zoom
        );
        self.on_change(view);
    }
}

/// Saved position from the local store, or the default view when missing or
/// unreadable
pub fn load_saved_view(local: &dyn LocalStore) -> ViewState {
    let raw = match local.get(MAP_POSITION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return ViewState::default(),
        Err(e) => {
            log::warn!("failed to read saved map position: {}", e);
            return ViewState::default();
        }
    };
    match serde_json::from_str::<SavedPosition>(&raw) {
        Ok(saved) => {
            let view = saved.into_view_state();
            if view.is_valid() && LatLng::new(view.latitude, view.longitude).is_valid() {
                view
            } else {
                log::warn!("ignoring out-of-range saved map position {}", raw);
                ViewState::default()
            }
        }
        Err(e) => {
            log::warn!("ignoring malformed saved map position: {}", e);
            ViewState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::store::MemoryStore;
    use std::time::Duration;

    struct Recorder(Mutex<Vec<ViewportBounds>>);

    impl BoundsListener for Recorder {
        fn on_bounds_changed(&self, bounds: ViewportBounds) {
            self.0.lock().unwrap().push(bounds);
        }
    }

    #[test]
    fn malformed_position_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set(MAP_POSITION_KEY, "{not json").unwrap();
        assert_eq!(load_saved_view(&store), ViewState::default());

        store
            .set(MAP_POSITION_KEY, r#"{"longitude":4.5,"latitude":"north","zoom":3}"#)
            .unwrap();
        assert_eq!(load_saved_view(&store), ViewState::default());

        store
            .set(MAP_POSITION_KEY, r#"{"longitude":4.5,"latitude":51.9,"zoom":7}"#)
            .unwrap();
        assert_eq!(load_saved_view(&store), ViewState::new(51.9, 4.5, 7.0));
    }

    #[tokio::test(start_paused = true)]
    async fn changes_propagate_now_and_persist_later() {
        let store = Arc::new(MemoryStore::new());
        let controller = ViewStateController::new(store.clone(), &ViewConfig::default());
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        controller.add_listener(recorder.clone());

        controller.on_change(ViewState::new(51.9, 4.5, 10.0));
        controller.on_change(ViewState::new(52.0, 4.6, 10.5));
        assert_eq!(recorder.0.lock().unwrap().len(), 2);
        assert_eq!(store.get(MAP_POSITION_KEY).unwrap(), None);

        tokio::time::sleep(Duration::from_millis(350)).await;
        let saved: SavedPosition =
            serde_json::from_str(&store.get(MAP_POSITION_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(saved.zoom, 10.5);
        assert_eq!(saved.latitude, 52.0);
    }

    #[tokio::test]
    async fn recenter_never_lowers_zoom() {
        let store = Arc::new(MemoryStore::new());
        let controller = ViewStateController::new(store, &ViewConfig::default());

        controller.on_change(ViewState::new(0.0, 0.0, 12.0));
        controller.recenter(LatLng::new(51.9, 4.5), 10.0);
        assert_eq!(controller.view_state().zoom, 12.0);

        controller.on_change(ViewState::new(0.0, 0.0, 3.0));
        controller.recenter(LatLng::new(51.9, 4.5), 10.0);
        let view = controller.view_state();
        assert_eq!(view.zoom, 10.0);
        assert_eq!(view.center(), LatLng::new(51.9, 4.5));
    }

    #[tokio::test]
    async fn bad_resize_keeps_previous_size() {
        let controller =
            ViewStateController::new(Arc::new(MemoryStore::new()), &ViewConfig::default());
        let before = controller.bounds();
        controller.resize(0.0, 600.0);
        assert_eq!(controller.viewport_size(), (1280.0, 800.0));
        assert_eq!(controller.bounds(), before);
    }
}
