//! Engine-wide defaults shared by the scheduler, view controller and stores.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

use std::time::Duration;

/// World size in pixels at zoom 0 (deck.gl / Mapbox convention).
pub const WORLD_TILE_SIZE: f64 = 512.0;

/// Quiet period after the last bounds change before a category fetch.
pub const DEFAULT_FETCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Interval of the independent per-category refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Quiet period before the view position is written to the local store.
pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(300);

/// Zoom a deep-linked vessel is shown at, at least.
pub const SELECTION_MIN_ZOOM: f64 = 10.0;

/// Default pixel viewport used until the embedder reports its real size.
pub const DEFAULT_VIEWPORT_SIZE: (f64, f64) = (1280.0, 800.0);

/// Events kept for the embedder before new ones are dropped.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Local store key for the last view position.
pub const MAP_POSITION_KEY: &str = "mapPosition";

/// Settings key for layer visibility, in both tiers.
pub const LAYER_VISIBILITY_KEY: &str = "mapLayerVisibility";

/// Query parameter carrying the selected vessel identifier.
pub const SELECTED_VESSEL_PARAM: &str = "selectedVessel";

/// Remote settings field stamped on every merge.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Background tiles.
pub const OSM_TILE_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_MIN_ZOOM: u8 = 0;
pub const OSM_MAX_ZOOM: u8 = 19;
pub const OSM_TILE_SIZE: u32 = 256;

/// Vessel icon size in pixels; anchored vessels are drawn at 3/4.
pub const VESSEL_ICON_SIZE: f64 = 40.0;

/// AIS "heading not available".
pub const HEADING_NOT_AVAILABLE: f64 = 511.0;

/// Name label style.
pub const NAME_TEXT_SIZE: f64 = 12.0;
pub const NAME_PIXEL_OFFSET: (f64, f64) = (10.0, -25.0);
