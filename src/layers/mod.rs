pub mod compositor;
pub mod visibility;

pub use compositor::{Composition, LayerCompositor, LayerDescriptor};
pub use visibility::{LayerKey, LayerVisibility};
