use async_trait::async_trait;
use chrono::{Duration, Utc};
use shared::{
    domain::Session,
    error::ErrorCode,
    protocol::{
        PasswordGrantRequest, RefreshGrantRequest, SessionEvent, SignUpRequest, SignUpResponse,
        TokenResponse, UserMetadata,
    },
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{check, decode, transport, SupabaseClient};
use crate::{BackendResult, IdentityProvider, SignUpOutcome};

/// Tokens this close to expiry are refreshed before they are sent.
const REFRESH_MARGIN_SECS: i64 = 30;

impl SupabaseClient {
    async fn token_grant<B: serde::Serialize + ?Sized>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> BackendResult<Session> {
        let response = self
            .with_api_key(self.http.post(self.endpoint("auth/v1/token")))
            .query(&[("grant_type", grant_type)])
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = decode(check(response).await?).await?;
        Ok(token.into_session(Utc::now()))
    }

    async fn store_session(&self, session: Option<Session>) {
        *self.session.write().await = session.clone();
        self.persist(session.as_ref()).await;
    }

    async fn persist(&self, session: Option<&Session>) {
        let Some(path) = &self.session_file else {
            return;
        };
        let result = match session {
            Some(session) => {
                if let Some(parent) = path.parent() {
                    let _ = tokio::fs::create_dir_all(parent).await;
                }
                match serde_json::to_vec_pretty(session) {
                    Ok(json) => tokio::fs::write(path, json).await,
                    Err(err) => Err(std::io::Error::other(err)),
                }
            }
            None => match tokio::fs::remove_file(path).await {
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(err) = result {
            warn!(path = %path.display(), error = %err, "auth: failed to persist session");
        }
    }

    async fn load_persisted(&self) -> Option<Session> {
        let path = self.session_file.as_ref()?;
        let raw = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "auth: discarding unreadable session file");
                None
            }
        }
    }

    async fn refresh_with(&self, refresh_token: &str) -> BackendResult<Session> {
        let session = self
            .token_grant(
                "refresh_token",
                &RefreshGrantRequest {
                    refresh_token: refresh_token.to_string(),
                },
            )
            .await?;
        self.store_session(Some(session.clone())).await;
        let _ = self.events.send(SessionEvent::TokenRefreshed(session.clone()));
        info!(user_id = %session.user.id, "auth: session refreshed");
        Ok(session)
    }

    /// Refreshes an expired session. A refused refresh signs the user out; an
    /// unreachable backend keeps the old session so a later request retries.
    async fn renew(&self, stale: Session) -> Option<Session> {
        let _guard = self.refresh_lock.lock().await;
        // Another request may have refreshed while this one waited.
        match self.session.read().await.clone() {
            Some(current) if current.refresh_token != stale.refresh_token => return Some(current),
            None => return None,
            Some(_) => {}
        }
        match self.refresh_with(&stale.refresh_token).await {
            Ok(fresh) => Some(fresh),
            Err(err) if err.code == ErrorCode::Transport => {
                warn!(error = %err, "auth: token refresh unreachable; keeping the current session");
                Some(stale)
            }
            Err(err) => {
                warn!(error = %err, "auth: expired session could not be refreshed");
                self.store_session(None).await;
                let _ = self.events.send(SessionEvent::SignedOut);
                None
            }
        }
    }

    pub(super) async fn access_token(&self) -> Option<String> {
        let session = self.session.read().await.clone()?;
        if !session.is_expired_at(Utc::now() + Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Some(session.access_token);
        }
        self.renew(session).await.map(|session| session.access_token)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn current_session(&self) -> BackendResult<Option<Session>> {
        let cached = self.session.read().await.clone();
        let session = match cached {
            Some(session) => session,
            None => match self.load_persisted().await {
                Some(session) => {
                    *self.session.write().await = Some(session.clone());
                    session
                }
                None => return Ok(None),
            },
        };

        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }
        Ok(self.renew(session).await)
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let session = self
            .token_grant(
                "password",
                &PasswordGrantRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        self.store_session(Some(session.clone())).await;
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> BackendResult<SignUpOutcome> {
        let request = SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
            data: UserMetadata {
                username: Some(username.to_string()),
            },
        };
        let response = self
            .with_api_key(self.http.post(self.endpoint("auth/v1/signup")))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        match decode::<SignUpResponse>(check(response).await?).await? {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                self.store_session(Some(session.clone())).await;
                let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
                Ok(SignUpOutcome::SignedIn(session))
            }
            SignUpResponse::User(user) => Ok(SignUpOutcome::ConfirmationRequired(user.into())),
        }
    }

    /// Local sign-out always happens; a failed remote revoke is only logged.
    async fn sign_out(&self) -> BackendResult<()> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone());
        if let Some(token) = token {
            let result = self
                .with_api_key(self.http.post(self.endpoint("auth/v1/logout")))
                .bearer_auth(token)
                .send()
                .await
                .map_err(transport);
            let result = match result {
                Ok(response) => check(response).await.map(|_| ()),
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                warn!(error = %err, "auth: remote sign-out failed");
            }
        }
        self.store_session(None).await;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }

    async fn refresh_session(&self) -> BackendResult<Option<Session>> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.refresh_token.clone());
        match refresh_token {
            Some(token) => self.refresh_with(&token).await.map(Some),
            None => Ok(None),
        }
    }
}
