//! Prelude module for common shipmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use shipmap::prelude::*;`

pub use crate::core::{
    builder::SyncEngineBuilder,
    config::{FeedConfig, SchedulerConfig, SelectionConfig, SyncOptions, SyncProfile, ViewConfig},
    engine::{EngineEvent, SyncEngine},
    geo::{LatLng, SavedPosition, ViewState, ViewportBounds},
    projection::{viewport_bounds, GeoProjector},
    view::{BoundsListener, ViewStateController},
};

pub use crate::feed::{PositionFeed, PositionQuery};

#[cfg(feature = "http")]
pub use crate::feed::HttpPositionFeed;

pub use crate::layers::{
    compositor::{Composition, LayerCompositor, LayerDescriptor},
    visibility::{LayerKey, LayerVisibility},
};

pub use crate::selection::{
    link::ShareableLink,
    linker::{Navigator, SelectionLinker, SelectionPhase, SelectionState, VesselLookup},
};

pub use crate::settings::{
    repository::SettingsRepository,
    session::{Session, StaticSession},
    store::{FileStore, LocalStore, MemoryRemoteStore, MemoryStore, RemoteSettingsStore},
};

pub use crate::sync::{
    debounce::Debouncer,
    registry::SchedulerRegistry,
    scheduler::{CategorySnapshot, SchedulerHandle},
};

pub use crate::vessels::{VesselCategory, VesselRecord};

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::{Error, Result};

pub use fxhash::FxHashMap as HashMap;
pub use fxhash::FxHashSet as HashSet;
