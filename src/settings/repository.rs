use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};

use super::session::Session;
use super::store::{LocalStore, RemoteSettingsStore};
use crate::core::constants::{LAYER_VISIBILITY_KEY, UPDATED_AT_FIELD};
use crate::layers::visibility::LayerVisibility;

/// Routes settings reads and writes to the account tier when signed in and
/// to the local tier otherwise.
///
/// Nothing here returns an error: every failure is logged and the caller
/// falls back to defaults.
#[derive(Clone)]
pub struct SettingsRepository {
    session: Arc<dyn Session>,
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteSettingsStore>>,
}

impl SettingsRepository {
    pub fn new(
        session: Arc<dyn Session>,
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteSettingsStore>>,
    ) -> Self {
        Self {
            session,
            local,
            remote,
        }
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn local(&self) -> &Arc<dyn LocalStore> {
        &self.local
    }

    fn remote_account(&self) -> Option<(String, &Arc<dyn RemoteSettingsStore>)> {
        match (self.session.account_id(), &self.remote) {
            (Some(account), Some(remote)) => Some((account, remote)),
            _ => None,
        }
    }

    /// Stored value of `key`, `None` when absent or unreadable.
    ///
    /// A signed-in session reads its account document; only when that read
    /// fails is the local tier consulted.
    pub async fn load(&self, key: &str) -> Option<Value> {
        if let Some((account, remote)) = self.remote_account() {
            match remote.fetch(&account).await {
                Ok(Some(mut document)) => {
                    let value = document.remove(key);
                    if value.is_none() {
                        log::debug!("no remote {} for {}", key, account);
                    }
                    return value;
                }
                Ok(None) => {
                    log::debug!("no remote settings for {}", account);
                    return None;
                }
                Err(e) => {
                    log::warn!("failed to load remote settings for {}: {}", account, e);
                }
            }
        }
        self.load_local(key)
    }

    fn load_local(&self, key: &str) -> Option<Value> {
        let raw = match self.local.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("failed to read local {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("ignoring malformed local {}: {}", key, e);
                None
            }
        }
    }

    /// Persists one setting. Signed in, only the account document is
    /// touched (partial merge of `key` plus an update stamp); otherwise the
    /// local entry for `key` is replaced.
    pub async fn save(&self, key: &str, value: Value) {
        if let Some((account, remote)) = self.remote_account() {
            let mut patch = Map::new();
            patch.insert(key.to_string(), value);
            patch.insert(UPDATED_AT_FIELD.to_string(), Value::from(unix_millis()));
            match remote.merge(&account, patch).await {
                Ok(()) => log::debug!("saved {} for {}", key, account),
                Err(e) => log::warn!("failed to save {} for {}: {}", key, account, e),
            }
            return;
        }

        match self.local.set(key, &value.to_string()) {
            Ok(()) => log::debug!("saved {} locally", key),
            Err(e) => log::warn!("failed to save {} locally: {}", key, e),
        }
    }

    /// Layer visibility with the stored entries merged over the defaults
    pub async fn load_visibility(&self) -> LayerVisibility {
        match self.load(LAYER_VISIBILITY_KEY).await {
            Some(value) => LayerVisibility::from_json(&value),
            None => LayerVisibility::default(),
        }
    }

    pub async fn save_visibility(&self, visibility: &LayerVisibility) {
        match serde_json::to_value(visibility) {
            Ok(value) => self.save(LAYER_VISIBILITY_KEY, value).await,
            Err(e) => log::warn!("failed to serialize layer visibility: {}", e),
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
