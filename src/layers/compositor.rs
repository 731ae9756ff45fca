//! Turns bounds, visibility and per-category results into the ordered list
//! of render layers handed to the map renderer.

use std::sync::Arc;

use crate::core::constants::{
    NAME_PIXEL_OFFSET, NAME_TEXT_SIZE, OSM_MAX_ZOOM, OSM_MIN_ZOOM, OSM_TILE_SIZE,
    OSM_TILE_TEMPLATE,
};
use crate::core::geo::ViewportBounds;
use crate::layers::visibility::{LayerKey, LayerVisibility};
use crate::vessels::{VesselCategory, VesselRecord};

/// Background raster tiles
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayerDescriptor {
    pub id: &'static str,
    pub url_template: &'static str,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_size: u32,
}

impl Default for TileLayerDescriptor {
    fn default() -> Self {
        Self {
            id: "osm-layer",
            url_template: OSM_TILE_TEMPLATE,
            min_zoom: OSM_MIN_ZOOM,
            max_zoom: OSM_MAX_ZOOM,
            tile_size: OSM_TILE_SIZE,
        }
    }
}

/// Pickable vessel icons of one category
#[derive(Debug, Clone, PartialEq)]
pub struct IconLayerDescriptor {
    pub id: String,
    pub category: VesselCategory,
    pub data: Arc<Vec<VesselRecord>>,
    pub pickable: bool,
}

/// Ship name labels of one category
#[derive(Debug, Clone, PartialEq)]
pub struct NameLayerDescriptor {
    pub id: String,
    pub category: VesselCategory,
    pub data: Arc<Vec<VesselRecord>>,
    pub text_size: f64,
    pub pixel_offset: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerDescriptor {
    Tiles(TileLayerDescriptor),
    VesselIcons(IconLayerDescriptor),
    VesselNames(NameLayerDescriptor),
}

impl LayerDescriptor {
    pub fn id(&self) -> &str {
        match self {
            Self::Tiles(t) => t.id,
            Self::VesselIcons(i) => &i.id,
            Self::VesselNames(n) => &n.id,
        }
    }

    pub fn category(&self) -> Option<VesselCategory> {
        match self {
            Self::Tiles(_) => None,
            Self::VesselIcons(i) => Some(i.category),
            Self::VesselNames(n) => Some(n.category),
        }
    }
}

pub fn icon_layer_id(category: VesselCategory) -> String {
    format!("{}-vessel-layer", category.slug())
}

pub fn name_layer_id(category: VesselCategory) -> String {
    format!("{}-vessel-names", category.slug())
}

/// True when `id` names a pickable vessel icon layer
pub fn is_vessel_layer_id(id: &str) -> bool {
    VesselCategory::ALL
        .into_iter()
        .any(|c| icon_layer_id(c) == id)
}

/// Output of one composition pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub bounds: Option<ViewportBounds>,
    pub layers: Vec<LayerDescriptor>,
    /// Incremented every time the layer list is rebuilt
    pub revision: u64,
}

impl Composition {
    pub fn vessel_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| match l {
                LayerDescriptor::VesselIcons(i) => i.data.len(),
                _ => 0,
            })
            .sum()
    }
}

/// Builds the ordered layer list: background first when visible, then per
/// visible category its icons and, when names are on, its labels.
pub fn compose_layers(
    visibility: &LayerVisibility,
    results: &[(VesselCategory, Arc<Vec<VesselRecord>>)],
) -> Vec<LayerDescriptor> {
    let mut layers = Vec::new();
    if visibility.is_visible(LayerKey::Background) {
        layers.push(LayerDescriptor::Tiles(TileLayerDescriptor::default()));
    }

    let show_names = visibility.is_visible(LayerKey::VesselNames);
    for category in visibility.visible_categories() {
        let data = results
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, data)| data.clone())
            .unwrap_or_default();

        layers.push(LayerDescriptor::VesselIcons(IconLayerDescriptor {
            id: icon_layer_id(category),
            category,
            data: data.clone(),
            pickable: true,
        }));
        if show_names {
            layers.push(LayerDescriptor::VesselNames(NameLayerDescriptor {
                id: name_layer_id(category),
                category,
                data,
                text_size: NAME_TEXT_SIZE,
                pixel_offset: NAME_PIXEL_OFFSET,
            }));
        }
    }
    layers
}

struct CompositionInputs {
    bounds: Option<ViewportBounds>,
    visibility: LayerVisibility,
    results: Vec<(VesselCategory, Arc<Vec<VesselRecord>>)>,
}

impl CompositionInputs {
    fn same_as(
        &self,
        bounds: Option<ViewportBounds>,
        visibility: &LayerVisibility,
        results: &[(VesselCategory, Arc<Vec<VesselRecord>>)],
    ) -> bool {
        self.bounds == bounds
            && self.visibility == *visibility
            && self.results.len() == results.len()
            && self
                .results
                .iter()
                .zip(results)
                .all(|((a, da), (b, db))| a == b && Arc::ptr_eq(da, db))
    }
}

/// Memoizing wrapper around [`compose_layers`]: the previous composition is
/// returned as long as bounds, visibility and every result set (by identity)
/// are unchanged.
#[derive(Default)]
pub struct LayerCompositor {
    inputs: Option<CompositionInputs>,
    output: Arc<Composition>,
}

impl LayerCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compose(
        &mut self,
        bounds: Option<ViewportBounds>,
        visibility: &LayerVisibility,
        results: &[(VesselCategory, Arc<Vec<VesselRecord>>)],
    ) -> Arc<Composition> {
        if let Some(inputs) = &self.inputs {
            if inputs.same_as(bounds, visibility, results) {
                return self.output.clone();
            }
        }

        let revision = self.output.revision + 1;
        self.output = Arc::new(Composition {
            bounds,
            layers: compose_layers(visibility, results),
            revision,
        });
        self.inputs = Some(CompositionInputs {
            bounds,
            visibility: *visibility,
            results: results.to_vec(),
        });
        log::debug!(
            "composed {} layers (revision {})",
            self.output.layers.len(),
            revision
        );
        self.output.clone()
    }

    pub fn last(&self) -> Arc<Composition> {
        self.output.clone()
    }
}
