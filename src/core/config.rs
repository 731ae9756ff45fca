//! Configuration system for synchronization timing and feed access
//!
//! Options are grouped per component and resolved from presets, so an
//! embedder can pick a profile and override only what it needs.

use std::time::Duration;

use crate::core::constants::{
    DEFAULT_FETCH_DEBOUNCE, DEFAULT_PERSIST_DEBOUNCE, DEFAULT_REFRESH_INTERVAL,
    DEFAULT_VIEWPORT_SIZE, SELECTION_MIN_ZOOM,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncProfile {
    #[default]
    Balanced,
    LowBandwidth,
    Realtime,
    Custom(SyncOptions),
}

impl SyncProfile {
    pub fn resolve(&self) -> SyncOptions {
        match self {
            Self::Balanced => SyncOptions {
                scheduler: SchedulerConfig {
                    debounce: DEFAULT_FETCH_DEBOUNCE,
                    refresh_interval: DEFAULT_REFRESH_INTERVAL,
                    refetch_on_enable: false,
                },
                view: ViewConfig::default(),
                selection: SelectionConfig::default(),
                feed: FeedConfig::default(),
            },
            Self::LowBandwidth => SyncOptions {
                scheduler: SchedulerConfig {
                    debounce: Duration::from_millis(500),
                    refresh_interval: Duration::from_secs(60),
                    refetch_on_enable: false,
                },
                view: ViewConfig {
                    persist_debounce: Duration::from_millis(1000),
                    ..ViewConfig::default()
                },
                selection: SelectionConfig::default(),
                feed: FeedConfig {
                    timeout: Duration::from_secs(20),
                    ..FeedConfig::default()
                },
            },
            Self::Realtime => SyncOptions {
                scheduler: SchedulerConfig {
                    debounce: Duration::from_millis(150),
                    refresh_interval: Duration::from_secs(10),
                    refetch_on_enable: true,
                },
                view: ViewConfig::default(),
                selection: SelectionConfig::default(),
                feed: FeedConfig {
                    timeout: Duration::from_secs(5),
                    ..FeedConfig::default()
                },
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    pub scheduler: SchedulerConfig,
    pub view: ViewConfig,
    pub selection: SelectionConfig,
    pub feed: FeedConfig,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncProfile::default().resolve()
    }
}

/// Timing of every category scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Quiet period after the last bounds change
    pub debounce: Duration,
    /// Independent refresh period; zero disables the periodic refresh
    pub refresh_interval: Duration,
    /// Arm a debounced fetch when a category is re-enabled with known bounds
    pub refetch_on_enable: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SyncProfile::Balanced.resolve().scheduler
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub persist_debounce: Duration,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
            width: DEFAULT_VIEWPORT_SIZE.0,
            height: DEFAULT_VIEWPORT_SIZE.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    /// Zoom a deep-linked vessel is brought to, at least
    pub min_zoom: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_zoom: SELECTION_MIN_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("shipmap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_is_default() {
        let options = SyncOptions::default();
        assert_eq!(options.scheduler.debounce, Duration::from_millis(250));
        assert_eq!(options.scheduler.refresh_interval, Duration::from_secs(30));
        assert_eq!(options.view.persist_debounce, Duration::from_millis(300));
        assert_eq!(options.selection.min_zoom, 10.0);
    }

    #[test]
    fn custom_profile_round_trips() {
        let mut options = SyncProfile::Realtime.resolve();
        options.feed.base_url = "https://ais.example.org".to_string();
        assert_eq!(SyncProfile::Custom(options.clone()).resolve(), options);
    }

    #[test]
    fn presets_differ_in_timing() {
        let low = SyncProfile::LowBandwidth.resolve();
        let fast = SyncProfile::Realtime.resolve();
        assert!(low.scheduler.refresh_interval > fast.scheduler.refresh_interval);
        assert!(low.scheduler.debounce > fast.scheduler.debounce);
    }
}
