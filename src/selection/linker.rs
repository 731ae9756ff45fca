//! Keeps the selected vessel, the detail panel and the shareable link in
//! step.
//!
//! A link id is first looked up in the result sets already on screen and only
//! fetched directly when none of them holds it. Every transition bumps a
//! generation counter; a resolution only commits while its generation is
//! still current, so a slow lookup for an old id can never override a newer
//! selection.

use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::Sender;
use tokio::sync::watch;

use crate::core::config::SelectionConfig;
use crate::core::engine::{self, EngineEvent};
use crate::core::geo::LatLng;
use crate::feed::PositionFeed;
use crate::layers::compositor::is_vessel_layer_id;
use crate::runtime::{self, AsyncHandle};
use crate::vessels::VesselRecord;

/// Search over the vessels currently loaded
pub trait VesselLookup: Send + Sync {
    fn find_vessel(&self, id: &str) -> Option<VesselRecord>;
}

/// Moves the map to a resolved vessel
pub trait Navigator: Send + Sync {
    /// Centers on `center`; zoom is raised to `min_zoom` but never lowered
    fn recenter(&self, center: LatLng, min_zoom: f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPhase {
    #[default]
    Idle,
    Searching,
    Resolved,
}

/// Panel state as seen by the UI. `panel_open` mirrors `external_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub external_id: Option<String>,
    pub entity: Option<VesselRecord>,
    pub panel_open: bool,
}

#[derive(Default)]
struct LinkerState {
    generation: u64,
    phase: SelectionPhase,
    selection: SelectionState,
}

struct LinkerInner {
    lookup: Arc<dyn VesselLookup>,
    feed: Arc<dyn PositionFeed>,
    navigator: Arc<dyn Navigator>,
    config: SelectionConfig,
    state: Mutex<LinkerState>,
    changes: watch::Sender<SelectionState>,
    events: Option<Sender<EngineEvent>>,
}

#[derive(Clone)]
pub struct SelectionLinker {
    inner: Arc<LinkerInner>,
}

impl SelectionLinker {
    pub fn new(
        lookup: Arc<dyn VesselLookup>,
        feed: Arc<dyn PositionFeed>,
        navigator: Arc<dyn Navigator>,
        config: SelectionConfig,
        events: Option<Sender<EngineEvent>>,
    ) -> Self {
        Self {
            inner: Arc::new(LinkerInner {
                lookup,
                feed,
                navigator,
                config,
                state: Mutex::new(LinkerState::default()),
                changes: watch::channel(SelectionState::default()).0,
                events,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LinkerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SelectionState {
        self.lock().selection.clone()
    }

    pub fn phase(&self) -> SelectionPhase {
        self.lock().phase
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.inner.changes.subscribe()
    }

    /// Reacts to the shareable id changing. A new id starts a background
    /// resolution whose handle is returned; an empty id, or one that is not
    /// an MMSI, closes the panel.
    pub fn set_external_id(&self, id: Option<&str>) -> Option<Box<dyn AsyncHandle>> {
        let (generation, id) = self.begin(id)?;
        let linker = self.clone();
        Some(runtime::spawn(async move {
            linker.resolve(generation, id).await;
        }))
    }

    /// Same as [`set_external_id`](Self::set_external_id) but resolves on the
    /// calling task
    pub async fn resolve_external_id(&self, id: Option<&str>) {
        if let Some((generation, id)) = self.begin(id) {
            self.resolve(generation, id).await;
        }
    }

    /// Moves to `Searching` for an MMSI that differs from the current one, or
    /// to `Idle` for an empty or malformed id
    fn begin(&self, id: Option<&str>) -> Option<(u64, String)> {
        let id = id.map(str::trim).filter(|id| !id.is_empty());
        let Some(id) = id else {
            self.close();
            return None;
        };
        if id.parse::<u32>().is_err() {
            log::warn!("ignoring selected vessel {:?}: not an MMSI", id);
            self.close();
            return None;
        }

        let mut state = self.lock();
        if state.phase != SelectionPhase::Idle
            && state.selection.external_id.as_deref() == Some(id)
        {
            return None;
        }
        state.generation += 1;
        state.phase = SelectionPhase::Searching;
        state.selection = SelectionState {
            external_id: Some(id.to_string()),
            entity: None,
            panel_open: true,
        };
        let generation = state.generation;
        self.publish(&state);
        log::debug!("resolving selected vessel {} (generation {})", id, generation);
        Some((generation, id.to_string()))
    }

    async fn resolve(&self, generation: u64, id: String) {
        if let Some(entity) = self.inner.lookup.find_vessel(&id) {
            log::debug!("vessel {} found in loaded data", id);
            self.commit(generation, entity);
            return;
        }

        match self.inner.feed.position(&id).await {
            Ok(Some(entity)) => {
                let position = entity.position();
                if self.commit(generation, entity) {
                    match position {
                        Some(center) => self.inner.navigator.recenter(center, self.inner.config.min_zoom),
                        None => log::warn!("vessel {} has no valid position", id),
                    }
                }
            }
            Ok(None) => {
                log::warn!("vessel {} not found", id);
                self.fail(generation);
            }
            Err(e) => {
                log::warn!("failed to fetch vessel {}: {}", id, e);
                self.fail(generation);
            }
        }
    }

    fn commit(&self, generation: u64, entity: VesselRecord) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            log::debug!(
                "dropping stale resolution (generation {} superseded by {})",
                generation,
                state.generation
            );
            return false;
        }
        state.phase = SelectionPhase::Resolved;
        state.selection.entity = Some(entity);
        self.publish(&state);
        true
    }

    fn fail(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        Self::reset(&mut state);
        self.publish(&state);
    }

    /// Selection made on the map
    pub fn select_entity(&self, entity: VesselRecord) {
        let mut state = self.lock();
        state.generation += 1;
        state.phase = SelectionPhase::Resolved;
        state.selection = SelectionState {
            external_id: Some(entity.mmsi.to_string()),
            entity: Some(entity),
            panel_open: true,
        };
        self.publish(&state);
    }

    /// A pick on a vessel icon selects it; a pick on anything else closes an
    /// open panel
    pub fn handle_pick(&self, layer_id: Option<&str>, object: Option<VesselRecord>) {
        match (layer_id, object) {
            (Some(layer), Some(entity)) if is_vessel_layer_id(layer) => self.select_entity(entity),
            _ => {
                if self.lock().selection.panel_open {
                    self.close();
                }
            }
        }
    }

    pub fn close(&self) {
        let mut state = self.lock();
        let was_open = state.phase != SelectionPhase::Idle;
        state.generation += 1;
        Self::reset(&mut state);
        if was_open {
            self.publish(&state);
        }
    }

    fn reset(state: &mut LinkerState) {
        state.phase = SelectionPhase::Idle;
        state.selection = SelectionState::default();
    }

    fn publish(&self, state: &LinkerState) {
        self.inner.changes.send_replace(state.selection.clone());
        if let Some(events) = &self.inner.events {
            engine::emit(events, EngineEvent::SelectionChanged(state.selection.clone()));
        }
    }
}
