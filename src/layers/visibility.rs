use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vessels::VesselCategory;

/// Every toggleable entry of the layer control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKey {
    /// OpenStreetMap background tiles
    Background,
    /// Name labels next to vessel icons
    VesselNames,
    /// Lighthouse overlay; persisted, no data layer yet
    Lighthouse,
    Category(VesselCategory),
}

impl LayerKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Background => "osm",
            Self::VesselNames => "vesselNames",
            Self::Lighthouse => "lighthouse",
            Self::Category(c) => c.visibility_key(),
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "osm" => Some(Self::Background),
            "vesselNames" => Some(Self::VesselNames),
            "lighthouse" => Some(Self::Lighthouse),
            other => VesselCategory::from_visibility_key(other).map(Self::Category),
        }
    }

    /// All keys in layer-control order
    pub fn all() -> impl Iterator<Item = LayerKey> {
        std::iter::once(Self::Background)
            .chain(VesselCategory::ALL.into_iter().map(Self::Category))
            .chain([Self::VesselNames, Self::Lighthouse])
    }
}

impl std::fmt::Display for LayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which layers are shown. Serialized as a flat `{ key: bool }` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerVisibility {
    background: bool,
    names: bool,
    lighthouse: bool,
    categories: [bool; VesselCategory::COUNT],
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self {
            background: true,
            names: false,
            lighthouse: false,
            categories: [true; VesselCategory::COUNT],
        }
    }
}

fn category_index(category: VesselCategory) -> usize {
    category as usize
}

impl LayerVisibility {
    pub fn is_visible(&self, key: LayerKey) -> bool {
        match key {
            LayerKey::Background => self.background,
            LayerKey::VesselNames => self.names,
            LayerKey::Lighthouse => self.lighthouse,
            LayerKey::Category(c) => self.categories[category_index(c)],
        }
    }

    pub fn set(&mut self, key: LayerKey, visible: bool) {
        match key {
            LayerKey::Background => self.background = visible,
            LayerKey::VesselNames => self.names = visible,
            LayerKey::Lighthouse => self.lighthouse = visible,
            LayerKey::Category(c) => self.categories[category_index(c)] = visible,
        }
    }

    /// Flips one entry and returns its new value
    pub fn toggle(&mut self, key: LayerKey) -> bool {
        let visible = !self.is_visible(key);
        self.set(key, visible);
        visible
    }

    /// Visible categories in render order
    pub fn visible_categories(&self) -> impl Iterator<Item = VesselCategory> + '_ {
        VesselCategory::ALL
            .into_iter()
            .filter(move |c| self.is_visible(LayerKey::Category(*c)))
    }

    /// Applies every recognized boolean entry of a stored object over the
    /// current values. Unknown keys and non-boolean values are skipped.
    /// Returns the number of entries applied.
    pub fn merge_json(&mut self, value: &Value) -> usize {
        let Some(object) = value.as_object() else {
            log::warn!("ignoring layer visibility that is not an object: {}", value);
            return 0;
        };
        let mut applied = 0;
        for (name, entry) in object {
            match (LayerKey::parse(name), entry.as_bool()) {
                (Some(key), Some(visible)) => {
                    self.set(key, visible);
                    applied += 1;
                }
                (None, _) => log::debug!("ignoring unknown layer key {}", name),
                (Some(_), None) => log::warn!("ignoring non-boolean visibility for {}", name),
            }
        }
        applied
    }

    /// Defaults with `value` merged over them
    pub fn from_json(value: &Value) -> Self {
        let mut visibility = Self::default();
        visibility.merge_json(value);
        visibility
    }
}

impl Serialize for LayerVisibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(LayerKey::all().count()))?;
        for key in LayerKey::all() {
            map.serialize_entry(key.as_str(), &self.is_visible(key))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LayerVisibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}
