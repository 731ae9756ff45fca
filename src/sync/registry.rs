use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;

use super::scheduler::{spawn_scheduler, CategorySnapshot, SchedulerHandle};
use crate::core::config::SchedulerConfig;
use crate::core::engine::EngineEvent;
use crate::core::geo::ViewportBounds;
use crate::core::view::BoundsListener;
use crate::feed::PositionFeed;
use crate::layers::visibility::{LayerKey, LayerVisibility};
use crate::runtime::AsyncHandle;
use crate::selection::linker::VesselLookup;
use crate::vessels::{VesselCategory, VesselRecord};

/// One scheduler per [`VesselCategory`], kept in category order.
pub struct SchedulerRegistry {
    schedulers: Vec<SchedulerHandle>,
    tasks: Mutex<Vec<Box<dyn AsyncHandle>>>,
}

impl SchedulerRegistry {
    /// Spawns a scheduler for every category, enabled according to
    /// `visibility`. Must be called from within a tokio runtime.
    pub fn spawn(
        feed: Arc<dyn PositionFeed>,
        config: &SchedulerConfig,
        visibility: &LayerVisibility,
        events: Option<Sender<EngineEvent>>,
    ) -> Self {
        let mut schedulers = Vec::with_capacity(VesselCategory::ALL.len());
        let mut tasks = Vec::with_capacity(VesselCategory::ALL.len());
        for category in VesselCategory::ALL {
            let enabled = visibility.is_visible(LayerKey::Category(category));
            let (handle, task) =
                spawn_scheduler(category, feed.clone(), config.clone(), enabled, events.clone());
            schedulers.push(handle);
            tasks.push(task);
        }
        log::info!("started {} category schedulers", schedulers.len());
        Self {
            schedulers,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn handle(&self, category: VesselCategory) -> Option<&SchedulerHandle> {
        self.schedulers.iter().find(|h| h.category() == category)
    }

    pub fn handles(&self) -> impl Iterator<Item = &SchedulerHandle> {
        self.schedulers.iter()
    }

    pub fn set_enabled(&self, category: VesselCategory, enabled: bool) {
        if let Some(handle) = self.handle(category) {
            handle.set_enabled(enabled);
        }
    }

    /// Pushes every category's visibility flag to its scheduler
    pub fn apply_visibility(&self, visibility: &LayerVisibility) {
        for handle in &self.schedulers {
            handle.set_enabled(visibility.is_visible(LayerKey::Category(handle.category())));
        }
    }

    pub fn broadcast_bounds(&self, bounds: ViewportBounds) {
        for handle in &self.schedulers {
            handle.on_bounds_changed(bounds);
        }
    }

    /// Current snapshot of every category, in category order
    pub fn snapshots(&self) -> Vec<(VesselCategory, CategorySnapshot)> {
        self.schedulers
            .iter()
            .map(|h| (h.category(), h.snapshot()))
            .collect()
    }

    /// Stops every scheduler. In-flight requests are cancelled.
    pub fn shutdown(&self) {
        for handle in &self.schedulers {
            handle.shutdown();
        }
        if let Ok(tasks) = self.tasks.lock() {
            log::debug!(
                "shutting down {} schedulers",
                tasks.iter().filter(|t| !t.is_finished()).count()
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.iter().any(|t| !t.is_finished()))
            .unwrap_or(false)
    }
}

impl BoundsListener for SchedulerRegistry {
    fn on_bounds_changed(&self, bounds: ViewportBounds) {
        self.broadcast_bounds(bounds);
    }
}

impl VesselLookup for SchedulerRegistry {
    fn find_vessel(&self, id: &str) -> Option<VesselRecord> {
        self.schedulers
            .iter()
            .filter(|h| h.is_enabled())
            .find_map(|h| h.records().iter().find(|r| r.matches_id(id)).cloned())
    }
}

impl Drop for SchedulerRegistry {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.lock() {
            for task in tasks.iter() {
                task.cancel();
            }
        }
    }
}
