use std::sync::Arc;

use shared::{
    domain::{Identity, Session},
    protocol::SessionEvent,
};
use tokio::{
    sync::{broadcast, RwLock},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{error::WorkflowError, BackendResult, IdentityProvider, SignUpOutcome};

struct SessionState {
    provider: Arc<dyn IdentityProvider>,
    current: RwLock<Option<Identity>>,
    changes: broadcast::Sender<Option<Identity>>,
}

impl SessionState {
    async fn apply(&self, identity: Option<Identity>) {
        let changed = {
            let mut current = self.current.write().await;
            if *current == identity {
                false
            } else {
                *current = identity.clone();
                true
            }
        };
        if changed {
            let _ = self.changes.send(identity);
        }
    }
}

/// Owns the "current identity" and keeps it in step with the identity
/// collaborator's session notifications.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionState>,
}

/// Handle to a background listener; dropping it stops delivery.
pub struct SessionListener {
    task: JoinHandle<()>,
}

impl SessionListener {
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SessionManager {
    /// Fetches the session once, then follows change notifications until the
    /// returned listener is dropped.
    pub async fn start(provider: Arc<dyn IdentityProvider>) -> (Self, SessionListener) {
        // Subscribe before the initial fetch so no notification is missed.
        let mut events = provider.subscribe();
        let initial = match provider.current_session().await {
            Ok(session) => session.map(|session| session.user),
            Err(err) => {
                warn!(error = %err, "session: failed to fetch current session");
                None
            }
        };
        let (changes, _) = broadcast::channel(64);
        let manager = Self {
            inner: Arc::new(SessionState {
                provider,
                current: RwLock::new(initial),
                changes,
            }),
        };

        let state = Arc::clone(&manager.inner);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        info!(event = event_name(&event), "session: change received");
                        state.apply(event.identity().cloned()).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session: notifications lagged, re-reading session");
                        let identity = state
                            .provider
                            .current_session()
                            .await
                            .ok()
                            .flatten()
                            .map(|session| session.user);
                        state.apply(identity).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        (manager, SessionListener { task })
    }

    pub async fn current(&self) -> Option<Identity> {
        self.inner.current.read().await.clone()
    }

    pub async fn require(&self) -> Result<Identity, WorkflowError> {
        self.current().await.ok_or(WorkflowError::Unauthenticated)
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.inner.provider
    }

    /// Raw stream of identity changes, de-duplicated.
    pub fn watch(&self) -> broadcast::Receiver<Option<Identity>> {
        self.inner.changes.subscribe()
    }

    /// Runs `callback` for every identity change until the listener is dropped.
    pub fn on_change<F>(&self, callback: F) -> SessionListener
    where
        F: Fn(Option<Identity>) + Send + Sync + 'static,
    {
        let mut changes = self.watch();
        let state = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(identity) => callback(identity),
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        callback(state.current.read().await.clone());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        SessionListener { task }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let session = self
            .inner
            .provider
            .sign_in_with_password(email, password)
            .await?;
        self.inner.apply(Some(session.user.clone())).await;
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> BackendResult<SignUpOutcome> {
        let outcome = self.inner.provider.sign_up(email, password, username).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.inner.apply(Some(session.user.clone())).await;
        }
        Ok(outcome)
    }

    pub async fn sign_out(&self) -> BackendResult<()> {
        let result = self.inner.provider.sign_out().await;
        self.inner.apply(None).await;
        result
    }
}

fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::SignedIn(_) => "signed_in",
        SessionEvent::SignedOut => "signed_out",
        SessionEvent::TokenRefreshed(_) => "token_refreshed",
        SessionEvent::UserUpdated(_) => "user_updated",
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
