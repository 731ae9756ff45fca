//! Remote vessel position feed.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpPositionFeed;

use async_trait::async_trait;

use crate::core::geo::ViewportBounds;
use crate::vessels::{VesselCategory, VesselRecord};
use crate::Result;

/// Bounded-region, category-filtered position query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionQuery {
    pub bounds: ViewportBounds,
    pub category: VesselCategory,
}

impl PositionQuery {
    pub fn new(bounds: ViewportBounds, category: VesselCategory) -> Self {
        Self { bounds, category }
    }

    /// Query string parameters, in the order the feed documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("minLat", self.bounds.min_lat.to_string()),
            ("maxLat", self.bounds.max_lat.to_string()),
            ("minLon", self.bounds.min_lon.to_string()),
            ("maxLon", self.bounds.max_lon.to_string()),
            ("vesselTypes", self.category.type_codes_param()),
        ]
    }
}

/// Source of vessel positions. Non-success responses are errors; the direct
/// lookup reports an unknown vessel as `Ok(None)`.
#[async_trait]
pub trait PositionFeed: Send + Sync {
    /// `GET /v1/vessels/position/all` for one category within bounds
    async fn positions(&self, query: &PositionQuery) -> Result<Vec<VesselRecord>>;

    /// `GET /v1/vessels/position/{id}`
    async fn position(&self, id: &str) -> Result<Option<VesselRecord>>;
}
