pub mod category;
pub mod record;

pub use category::VesselCategory;
pub use record::{IconKind, VesselRecord};
