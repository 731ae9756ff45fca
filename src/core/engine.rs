//! Wiring of the view controller, category schedulers, compositor, settings
//! and selection into one engine.
//!
//! The engine owns the single authoritative [`LayerVisibility`]. Every other
//! component reports back through [`EngineEvent`]s on a crossbeam channel
//! that the embedder drains at its own pace. The queue is bounded; events
//! emitted while it is full are dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::core::config::SyncOptions;
use crate::core::geo::{ViewState, ViewportBounds};
use crate::core::view::{BoundsListener, ViewStateController};
use crate::layers::compositor::{Composition, LayerCompositor};
use crate::layers::visibility::{LayerKey, LayerVisibility};
use crate::runtime::{self, AsyncHandle};
use crate::selection::link::ShareableLink;
use crate::selection::linker::{SelectionLinker, SelectionPhase, SelectionState};
use crate::settings::repository::SettingsRepository;
use crate::sync::registry::SchedulerRegistry;
use crate::sync::scheduler::CategorySnapshot;
use crate::vessels::{VesselCategory, VesselRecord};

/// Notifications emitted by the engine and its components.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The view settled on new query bounds
    BoundsChanged(ViewportBounds),
    /// A category applied a fresh result set
    CategoryUpdated(VesselCategory),
    /// A category fetch failed; the previous result set is kept
    CategoryFailed {
        category: VesselCategory,
        error: String,
    },
    VisibilityChanged {
        key: LayerKey,
        visible: bool,
    },
    /// Visibility was reloaded from the active settings tier
    SettingsReloaded(LayerVisibility),
    SelectionChanged(SelectionState),
}

/// Queues `event` without blocking. Dropped when nobody drains the queue.
pub(crate) fn emit(events: &Sender<EngineEvent>, event: EngineEvent) {
    match events.try_send(event) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
        Err(TrySendError::Full(event)) => log::trace!("event queue full; dropping {:?}", event),
    }
}

struct EventForwarder(Sender<EngineEvent>);

impl BoundsListener for EventForwarder {
    fn on_bounds_changed(&self, bounds: ViewportBounds) {
        emit(&self.0, EngineEvent::BoundsChanged(bounds));
    }
}

/// State shared between the engine and its session watcher.
#[derive(Clone)]
pub(crate) struct VisibilityState {
    visibility: Arc<Mutex<LayerVisibility>>,
    settings: SettingsRepository,
    registry: Arc<SchedulerRegistry>,
    events: Sender<EngineEvent>,
}

impl VisibilityState {
    fn lock(&self) -> MutexGuard<'_, LayerVisibility> {
        self.visibility
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn reload(&self) -> LayerVisibility {
        let loaded = self.settings.load_visibility().await;
        *self.lock() = loaded;
        self.registry.apply_visibility(&loaded);
        log::info!(
            "layer visibility reloaded: {} of {} categories visible",
            loaded.visible_categories().count(),
            VesselCategory::COUNT
        );
        emit(&self.events, EngineEvent::SettingsReloaded(loaded));
        loaded
    }
}

/// Viewport-driven vessel synchronization engine.
///
/// Create one with [`SyncEngineBuilder`](crate::SyncEngineBuilder).
pub struct SyncEngine {
    options: SyncOptions,
    view: ViewStateController,
    state: VisibilityState,
    selection: SelectionLinker,
    compositor: Mutex<LayerCompositor>,
    link: Mutex<ShareableLink>,
    persist: UnboundedSender<LayerVisibility>,
    events_rx: Receiver<EngineEvent>,
    tasks: Mutex<Vec<Box<dyn AsyncHandle>>>,
}

impl SyncEngine {
    pub(crate) fn assemble(
        options: SyncOptions,
        view: ViewStateController,
        settings: SettingsRepository,
        registry: Arc<SchedulerRegistry>,
        selection: SelectionLinker,
        visibility: LayerVisibility,
        events: (Sender<EngineEvent>, Receiver<EngineEvent>),
    ) -> Self {
        let (events_tx, events_rx) = events;
        view.add_listener(registry.clone());
        view.add_listener(Arc::new(EventForwarder(events_tx.clone())));

        let state = VisibilityState {
            visibility: Arc::new(Mutex::new(visibility)),
            settings: settings.clone(),
            registry,
            events: events_tx,
        };

        // Saves are applied one after another so the last toggle always wins.
        let (persist, mut pending) = unbounded_channel::<LayerVisibility>();
        let writer = settings.clone();
        let mut tasks = vec![runtime::spawn(async move {
            while let Some(visibility) = pending.recv().await {
                writer.save_visibility(&visibility).await;
            }
        })];

        if let Some(mut changes) = settings.session().subscribe() {
            let watcher = state.clone();
            tasks.push(runtime::spawn(async move {
                while changes.changed().await.is_ok() {
                    let account = changes.borrow_and_update().clone();
                    log::debug!("session changed (signed in: {})", account.is_some());
                    watcher.reload().await;
                }
            }));
        }

        Self {
            options,
            view,
            state,
            selection,
            compositor: Mutex::new(LayerCompositor::new()),
            link: Mutex::new(ShareableLink::default()),
            persist,
            events_rx,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn view(&self) -> &ViewStateController {
        &self.view
    }

    pub fn view_state(&self) -> ViewState {
        self.view.view_state()
    }

    pub fn bounds(&self) -> Option<ViewportBounds> {
        self.view.bounds()
    }

    /// Interaction callback of the map widget
    pub fn on_view_state_change(&self, view: ViewState) {
        self.view.on_change(view);
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.view.resize(width, height);
    }

    pub fn registry(&self) -> &SchedulerRegistry {
        &self.state.registry
    }

    pub fn snapshot(&self, category: VesselCategory) -> Option<CategorySnapshot> {
        self.state.registry.handle(category).map(|h| h.snapshot())
    }

    /// Fetches every enabled category now with its last bounds
    pub fn refresh_all(&self) {
        for handle in self.state.registry.handles() {
            handle.refresh_now();
        }
    }

    pub fn visibility(&self) -> LayerVisibility {
        *self.state.lock()
    }

    /// Flips one layer, enables or disables its scheduler and persists the
    /// new visibility to the active settings tier. Returns the new value.
    pub fn toggle_layer(&self, key: LayerKey) -> bool {
        let visible = !self.visibility().is_visible(key);
        self.set_layer_visible(key, visible);
        visible
    }

    pub fn set_layer_visible(&self, key: LayerKey, visible: bool) {
        let updated = {
            let mut visibility = self.state.lock();
            if visibility.is_visible(key) == visible {
                return;
            }
            visibility.set(key, visible);
            *visibility
        };
        if let LayerKey::Category(category) = key {
            self.state.registry.set_enabled(category, visible);
        }
        log::debug!("layer {} -> {}", key, visible);
        emit(&self.state.events, EngineEvent::VisibilityChanged { key, visible });
        if self.persist.send(updated).is_err() {
            log::warn!("settings writer stopped; layer {} not saved", key);
        }
    }

    /// Reloads visibility from the active settings tier. Called on sign-in
    /// and sign-out automatically when the session can report changes.
    pub async fn reload_settings(&self) -> LayerVisibility {
        self.state.reload().await
    }

    /// Render layers for the current bounds, visibility and result sets.
    /// Unchanged inputs return the previous composition.
    pub fn compose(&self) -> Arc<Composition> {
        let results: Vec<_> = self
            .state
            .registry
            .handles()
            .map(|h| (h.category(), h.records()))
            .collect();
        let visibility = self.visibility();
        let bounds = self.view.bounds();
        self.compositor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .compose(bounds, &visibility, &results)
    }

    pub fn selection(&self) -> &SelectionLinker {
        &self.selection
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn selection_phase(&self) -> SelectionPhase {
        self.selection.phase()
    }

    /// Applies a shareable link. Its `selectedVessel`, if any, is resolved in
    /// the background.
    pub fn open_link(&self, query: &str) -> Option<Box<dyn AsyncHandle>> {
        let link = ShareableLink::parse(query);
        let id = link.selected_vessel().map(str::to_string);
        *self.link.lock().unwrap_or_else(|p| p.into_inner()) = link;
        self.selection.set_external_id(id.as_deref())
    }

    /// Current shareable link, reflecting the selection
    pub fn link(&self) -> ShareableLink {
        let link = self.link.lock().unwrap_or_else(|p| p.into_inner()).clone();
        let state = self.selection.state();
        link.with_selected_vessel(state.external_id.as_deref())
    }

    pub fn select_vessel(&self, vessel: VesselRecord) {
        self.selection.select_entity(vessel);
    }

    pub fn handle_pick(&self, layer_id: Option<&str>, object: Option<VesselRecord>) {
        self.selection.handle_pick(layer_id, object);
    }

    pub fn close_selection(&self) {
        self.selection.close();
    }

    /// Engine notifications. Receivers share one queue, so each event goes to
    /// exactly one of them. At most
    /// [`EVENT_QUEUE_CAPACITY`](crate::core::constants::EVENT_QUEUE_CAPACITY)
    /// undrained events are kept.
    pub fn events(&self) -> Receiver<EngineEvent> {
        self.events_rx.clone()
    }

    /// Stops schedulers and background tasks. In-flight fetches are dropped.
    pub fn shutdown(&self) {
        self.state.registry.shutdown();
        if let Ok(tasks) = self.tasks.lock() {
            for task in tasks.iter() {
                task.cancel();
            }
        }
        log::info!("sync engine stopped");
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.lock() {
            for task in tasks.iter() {
                task.cancel();
            }
        }
    }
}
