pub mod debounce;
pub mod registry;
pub mod scheduler;

pub use debounce::Debouncer;
pub use registry::SchedulerRegistry;
pub use scheduler::{spawn_scheduler, CategorySnapshot, SchedulerHandle};
