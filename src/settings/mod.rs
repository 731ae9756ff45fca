//! Two-tier user settings: device-local storage for anonymous use and an
//! account document once signed in.

pub mod repository;
pub mod session;
pub mod store;

pub use repository::SettingsRepository;
pub use session::{Session, StaticSession};
pub use store::{FileStore, LocalStore, MemoryRemoteStore, MemoryStore, RemoteSettingsStore};
