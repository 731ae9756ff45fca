//! # shipmap
//!
//! Viewport-driven synchronization engine for live vessel maps.
//!
//! The engine turns a continuously changing map view into geographic query
//! bounds, keeps one debounced and periodically refreshed fetch schedule per
//! vessel category, composes the results into render-ready layer
//! descriptors, links the selected vessel to a shareable deep link and keeps
//! user preferences in a local or account-scoped settings tier.

pub mod core;
pub mod feed;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod selection;
pub mod settings;
pub mod sync;
pub mod vessels;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    builder::SyncEngineBuilder,
    config::{SyncOptions, SyncProfile},
    engine::{EngineEvent, SyncEngine},
    geo::{LatLng, ViewState, ViewportBounds},
    projection::GeoProjector,
    view::ViewStateController,
};

pub use feed::{PositionFeed, PositionQuery};

pub use layers::{
    compositor::{Composition, LayerCompositor, LayerDescriptor},
    visibility::{LayerKey, LayerVisibility},
};

pub use selection::{
    link::ShareableLink,
    linker::{SelectionLinker, SelectionPhase, SelectionState},
};

pub use settings::{
    repository::SettingsRepository,
    session::{Session, StaticSession},
    store::{FileStore, LocalStore, MemoryRemoteStore, MemoryStore, RemoteSettingsStore},
};

pub use sync::{
    registry::SchedulerRegistry,
    scheduler::{CategorySnapshot, SchedulerHandle},
};

pub use vessels::{VesselCategory, VesselRecord};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid view state: {0}")]
    InvalidView(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),
}

/// Error type alias for convenience
pub type Error = SyncError;
