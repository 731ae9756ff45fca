use serde::{Deserialize, Serialize};

use crate::core::constants::{HEADING_NOT_AVAILABLE, VESSEL_ICON_SIZE};
use crate::core::geo::LatLng;

/// Latest reported position of one vessel, as served by the position feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VesselRecord {
    #[serde(rename = "MMSI")]
    pub mmsi: u32,
    #[serde(default)]
    pub ship_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, alias = "NavigationalStatus")]
    pub navigation_status: Option<u8>,
    #[serde(default)]
    pub rate_of_turn: Option<f64>,
    #[serde(default)]
    pub speed_over_ground: Option<f64>,
    #[serde(default)]
    pub course_over_ground: Option<f64>,
    #[serde(default)]
    pub true_heading: Option<f64>,
    #[serde(default)]
    pub vessel_type: Option<u8>,
}

/// AIS navigational status "at anchor"
const STATUS_AT_ANCHOR: u8 = 1;

/// Which icon a vessel is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Underway,
    Anchored,
}

impl IconKind {
    pub fn url(&self) -> &'static str {
        match self {
            Self::Underway => "/Ship-Icon.png",
            Self::Anchored => "/Ship-Anchored.png",
        }
    }

    /// Source image size (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Underway => (360, 512),
            Self::Anchored => (512, 512),
        }
    }
}

impl VesselRecord {
    /// Position when both coordinates are present and in range
    pub fn position(&self) -> Option<LatLng> {
        let position = LatLng::new(self.latitude?, self.longitude?);
        position.is_valid().then_some(position)
    }

    /// Matches a shareable identifier against this vessel's MMSI
    pub fn matches_id(&self, id: &str) -> bool {
        id.trim().parse::<u32>().map(|m| m == self.mmsi).unwrap_or(false)
    }

    pub fn is_anchored(&self) -> bool {
        self.navigation_status == Some(STATUS_AT_ANCHOR)
    }

    pub fn icon(&self) -> IconKind {
        if self.is_anchored() {
            IconKind::Anchored
        } else {
            IconKind::Underway
        }
    }

    /// Icon rotation in degrees, counter-clockwise
    pub fn icon_angle(&self) -> f64 {
        if self.is_anchored() {
            return 0.0;
        }
        match self.true_heading {
            Some(h) if h != HEADING_NOT_AVAILABLE => 360.0 - h,
            _ => 0.0,
        }
    }

    pub fn icon_size(&self) -> f64 {
        if self.is_anchored() {
            VESSEL_ICON_SIZE * 0.75
        } else {
            VESSEL_ICON_SIZE
        }
    }
}
