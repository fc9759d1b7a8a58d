//! HTTP client for the hosted backend: GoTrue auth, PostgREST rows and the
//! storage bucket, all behind one base URL and anon key.

use std::path::PathBuf;

use reqwest::{Client, RequestBuilder, Response};
use shared::{
    domain::Session,
    error::BackendError,
    protocol::{ErrorBody, SessionEvent},
};
use tokio::sync::{broadcast, Mutex, RwLock};
use url::Url;

use crate::{config::Settings, BackendResult};

mod auth;
mod rest;
mod storage;

pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    session: RwLock<Option<Session>>,
    session_file: Option<PathBuf>,
    /// Refresh tokens are single-use; one refresh at a time.
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseClient {
    pub fn new(base_url: &Url, anon_key: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self::with_http(Client::new(), base_url, anon_key, bucket)
    }

    fn with_http(
        http: Client,
        base_url: &Url,
        anon_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            bucket: bucket.into(),
            session: RwLock::new(None),
            session_file: None,
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.base_url()?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        let mut client = Self::with_http(http, &base_url, &settings.anon_key, &settings.bucket);
        client.session_file = settings.session_file.clone();
        Ok(client)
    }

    /// Persist the session as JSON so the next launch can restore it.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn with_api_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.anon_key)
    }

    /// Signed-in requests carry the user's token, refreshed first when it is
    /// about to expire; anonymous ones the anon key.
    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .access_token()
            .await
            .unwrap_or_else(|| self.anon_key.clone());
        self.with_api_key(request).bearer_auth(token)
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::transport(err.to_string())
}

/// Turns a non-2xx response into the collaborator's own error message.
async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    Err(BackendError::from_status(status.as_u16(), message))
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> BackendResult<T> {
    response
        .json()
        .await
        .map_err(|err| BackendError::transport(format!("unexpected response body: {err}")))
}

#[cfg(test)]
#[path = "../tests/supabase_tests.rs"]
mod tests;
