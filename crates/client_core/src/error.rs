use shared::error::BackendError;
use thiserror::Error;

use crate::{attachment::AttachmentError, pagination::PageError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Caught before any network call.
    #[error("{0}")]
    Validation(String),
    #[error("You must be logged in")]
    Unauthenticated,
    #[error("Image upload failed: {0}")]
    Upload(BackendError),
    #[error("{0}")]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
    #[error("a request for this form is already in progress")]
    Busy,
    #[error("no post is open")]
    NoOpenPost,
    #[error("{kind} {id} is not loaded")]
    NotLoaded { kind: &'static str, id: String },
    #[error("no delete is awaiting confirmation")]
    NothingToConfirm,
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}
