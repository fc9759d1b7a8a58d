//! Image attachment lifecycle shared by every post/comment form.
//!
//! ```text
//! Empty ──choose──▶ Chosen ──commit(upload)──▶ Committed
//!                     ▲                           │
//!                     └──────choose───── RemoveRequested ◀─request_removal
//! ```

use shared::domain::ImageFolder;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{BackendResult, ObjectStore};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("there is no existing image to remove")]
    NothingToRemove,
}

/// A picked image file that has not been uploaded yet.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PendingImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PendingImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, content_type: Option<String>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_raw()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string()
            });
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Collision-free key: a random v4 id, never the original file name.
pub fn storage_key(folder: ImageFolder, image: &PendingImage) -> String {
    let id = Uuid::new_v4();
    match image.extension() {
        Some(ext) => format!("{}/{id}.{ext}", folder.as_str()),
        None => format!("{}/{id}", folder.as_str()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attachment {
    #[default]
    Empty,
    Chosen {
        image: PendingImage,
        /// Reference of the entity being edited, restored by `discard_choice`.
        previous: Option<String>,
    },
    RemoveRequested {
        previous: String,
    },
    Committed(String),
}

impl Attachment {
    pub fn from_existing(image_url: Option<String>) -> Self {
        match image_url {
            Some(url) => Attachment::Committed(url),
            None => Attachment::Empty,
        }
    }

    fn previous_reference(&self) -> Option<String> {
        match self {
            Attachment::Empty => None,
            Attachment::Chosen { previous, .. } => previous.clone(),
            Attachment::RemoveRequested { previous } => Some(previous.clone()),
            Attachment::Committed(url) => Some(url.clone()),
        }
    }

    /// Always lands in `Chosen`, cancelling any pending removal.
    pub fn choose(&mut self, image: PendingImage) {
        let previous = self.previous_reference();
        *self = Attachment::Chosen { image, previous };
    }

    pub fn discard_choice(&mut self) {
        if let Attachment::Chosen { previous, .. } = self {
            *self = Attachment::from_existing(previous.take());
        }
    }

    pub fn request_removal(&mut self) -> Result<(), AttachmentError> {
        let previous = self
            .previous_reference()
            .ok_or(AttachmentError::NothingToRemove)?;
        *self = Attachment::RemoveRequested { previous };
        Ok(())
    }

    pub fn undo_removal(&mut self) {
        if let Attachment::RemoveRequested { previous } = self {
            *self = Attachment::Committed(std::mem::take(previous));
        }
    }

    /// Whether submitting now would leave the entity with an image.
    pub fn has_image(&self) -> bool {
        matches!(
            self,
            Attachment::Chosen { .. } | Attachment::Committed(_)
        )
    }

    pub fn is_remove_requested(&self) -> bool {
        matches!(self, Attachment::RemoveRequested { .. })
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Attachment::Empty => None,
            Attachment::Chosen { image, .. } => Some(&image.file_name),
            Attachment::RemoveRequested { .. } => Some("image will be removed"),
            Attachment::Committed(url) => Some(url.rsplit('/').next().unwrap_or(url)),
        }
    }

    /// Resolves the final image reference, uploading a chosen file first.
    ///
    /// A successful upload moves the attachment to `Committed`, so a retry
    /// after a failed parent mutation reuses the stored object.
    pub async fn commit(
        &mut self,
        store: &dyn ObjectStore,
        folder: ImageFolder,
    ) -> BackendResult<Option<String>> {
        match self {
            Attachment::Empty | Attachment::RemoveRequested { .. } => Ok(None),
            Attachment::Committed(url) => Ok(Some(url.clone())),
            Attachment::Chosen { image, .. } => {
                let path = storage_key(folder, image);
                store
                    .upload(&path, image.bytes.clone(), &image.content_type)
                    .await?;
                let url = store.public_url(&path);
                info!(%path, bytes = image.bytes.len(), "attachment: uploaded image");
                *self = Attachment::Committed(url.clone());
                Ok(Some(url))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/attachment_tests.rs"]
mod tests;
