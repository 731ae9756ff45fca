//! Vessel selection and its shareable deep link.

pub mod link;
pub mod linker;

pub use link::ShareableLink;
pub use linker::{Navigator, SelectionLinker, SelectionPhase, SelectionState, VesselLookup};
