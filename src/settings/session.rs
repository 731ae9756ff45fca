use tokio::sync::watch;

/// Source of the signed-in account, shared by everything that persists
/// account-scoped state.
pub trait Session: Send + Sync {
    /// Account id when signed in
    fn account_id(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.account_id().is_some()
    }

    /// Receiver notified on sign-in and sign-out, if the session can change
    fn subscribe(&self) -> Option<watch::Receiver<Option<String>>> {
        None
    }
}

/// In-process session whose account can be switched at runtime.
pub struct StaticSession {
    account: watch::Sender<Option<String>>,
}

impl StaticSession {
    pub fn anonymous() -> Self {
        Self {
            account: watch::channel(None).0,
        }
    }

    pub fn signed_in(account_id: impl Into<String>) -> Self {
        Self {
            account: watch::channel(Some(account_id.into())).0,
        }
    }

    pub fn sign_in(&self, account_id: impl Into<String>) {
        let account_id = account_id.into();
        log::info!("session signed in as {}", account_id);
        self.account.send_replace(Some(account_id));
    }

    pub fn sign_out(&self) {
        if self.account.send_replace(None).is_some() {
            log::info!("session signed out");
        }
    }
}

impl Default for StaticSession {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Session for StaticSession {
    fn account_id(&self) -> Option<String> {
        self.account.borrow().clone()
    }

    fn subscribe(&self) -> Option<watch::Receiver<Option<String>>> {
        Some(self.account.subscribe())
    }
}
