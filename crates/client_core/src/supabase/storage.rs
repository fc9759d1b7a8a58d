use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use shared::error::ErrorCode;
use tracing::info;

use super::{check, transport, SupabaseClient};
use crate::{BackendResult, ObjectStore};

#[async_trait]
impl ObjectStore for SupabaseClient {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> BackendResult<()> {
        let size = bytes.len();
        let url = self.endpoint(&format!("storage/v1/object/{}/{path}", self.bucket));
        let response = self
            .authorized(self.http.post(url))
            .await
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(transport)?;

        // Storage reports an existing object as a 400 with "already exists".
        check(response).await.map_err(|mut err| {
            if err.message.to_ascii_lowercase().contains("already exists") {
                err.code = ErrorCode::Conflict;
            }
            err
        })?;
        info!(path, size, "storage: uploaded image");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.endpoint(&format!("storage/v1/object/public/{}/{path}", self.bucket))
    }
}
