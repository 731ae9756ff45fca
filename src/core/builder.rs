//! Engine builder for fluent API configuration
//!
//! Every collaborator is optional: without a feed the HTTP feed for the
//! configured base URL is used, without a local store an in-memory one, and
//! without a session the user is anonymous.

use std::sync::Arc;

use crate::core::config::{SyncOptions, SyncProfile};
use crate::core::constants::EVENT_QUEUE_CAPACITY;
use crate::core::engine::SyncEngine;
use crate::core::view::ViewStateController;
use crate::feed::PositionFeed;
use crate::selection::linker::SelectionLinker;
use crate::settings::repository::SettingsRepository;
use crate::settings::session::{Session, StaticSession};
use crate::settings::store::{LocalStore, MemoryStore, RemoteSettingsStore};
use crate::sync::registry::SchedulerRegistry;
use crate::Result;

/// Builder for creating and configuring [`SyncEngine`] instances
#[derive(Default)]
pub struct SyncEngineBuilder {
    profile: SyncProfile,
    feed: Option<Arc<dyn PositionFeed>>,
    local: Option<Arc<dyn LocalStore>>,
    remote: Option<Arc<dyn RemoteSettingsStore>>,
    session: Option<Arc<dyn Session>>,
    base_url: Option<String>,
    viewport_size: Option<(f64, f64)>,
    link: Option<String>,
}

impl SyncEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timing profile
    pub fn with_profile(mut self, profile: SyncProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set custom options
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.profile = SyncProfile::Custom(options);
        self
    }

    /// Use `feed` instead of the built-in HTTP feed
    pub fn with_feed(mut self, feed: Arc<dyn PositionFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Base URL of the built-in HTTP feed
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_local_store(mut self, local: Arc<dyn LocalStore>) -> Self {
        self.local = Some(local);
        self
    }

    pub fn with_remote_store(mut self, remote: Arc<dyn RemoteSettingsStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Initial pixel size of the map
    pub fn with_viewport_size(mut self, width: f64, height: f64) -> Self {
        self.viewport_size = Some((width, height));
        self
    }

    /// Shareable link query applied once the engine is running
    pub fn with_link(mut self, query: impl Into<String>) -> Self {
        self.link = Some(query.into());
        self
    }

    fn resolve_options(&self) -> SyncOptions {
        let mut options = self.profile.resolve();
        if let Some((width, height)) = self.viewport_size {
            options.view.width = width;
            options.view.height = height;
        }
        if let Some(base_url) = &self.base_url {
            options.feed.base_url = base_url.clone();
        }
        options
    }

    #[cfg(feature = "http")]
    fn default_feed(options: &SyncOptions) -> Result<Arc<dyn PositionFeed>> {
        Ok(Arc::new(crate::feed::HttpPositionFeed::new(&options.feed)?))
    }

    #[cfg(not(feature = "http"))]
    fn default_feed(_options: &SyncOptions) -> Result<Arc<dyn PositionFeed>> {
        Err(crate::Error::Config(
            "no position feed configured and the http feature is disabled".to_string(),
        ))
    }

    /// Loads settings, starts the schedulers and announces the initial
    /// bounds. Must be awaited within a tokio runtime.
    pub async fn build(self) -> Result<SyncEngine> {
        let options = self.resolve_options();
        let feed = match self.feed {
            Some(feed) => feed,
            None => Self::default_feed(&options)?,
        };
        let local = self
            .local
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn LocalStore>);
        let session = self
            .session
            .unwrap_or_else(|| Arc::new(StaticSession::anonymous()) as Arc<dyn Session>);

        let settings = SettingsRepository::new(session, local.clone(), self.remote);
        let visibility = settings.load_visibility().await;

        let events = crossbeam_channel::bounded(EVENT_QUEUE_CAPACITY);
        let registry = Arc::new(SchedulerRegistry::spawn(
            feed.clone(),
            &options.scheduler,
            &visibility,
            Some(events.0.clone()),
        ));
        let view = ViewStateController::new(local, &options.view);
        let selection = SelectionLinker::new(
            registry.clone(),
            feed,
            Arc::new(view.clone()),
            options.selection.clone(),
            Some(events.0.clone()),
        );

        let engine = SyncEngine::assemble(
            options, view, settings, registry, selection, visibility, events,
        );
        engine.view().announce();
        if let Some(query) = self.link {
            engine.open_link(&query);
        }
        log::info!("sync engine started at {:?}", engine.view_state());
        Ok(engine)
    }
}
