use async_trait::async_trait;
use shared::{
    domain::{Comment, CommentId, Identity, Post, PostId, Session},
    error::BackendError,
    protocol::{CommentPatch, NewCommentRow, NewPostRow, PostPatch, SessionEvent},
};
use tokio::sync::broadcast;

pub mod account;
pub mod attachment;
pub mod config;
pub mod error;
pub mod forms;
pub mod guard;
pub mod pagination;
pub mod session;
pub mod supabase;
pub mod workflow;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use attachment::{Attachment, PendingImage};
pub use error::WorkflowError;
pub use pagination::{PageWindow, RowRange, PAGE_SIZE};
pub use session::{SessionListener, SessionManager};
pub use supabase::SupabaseClient;
pub use workflow::{CommentEditOutcome, ContentWorkflow, DetailView, WorkflowSnapshot};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired(Identity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
}

/// Credential checks and session issuance live behind this trait.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_session(&self) -> BackendResult<Option<Session>>;
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session>;
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> BackendResult<SignUpOutcome>;
    async fn sign_out(&self) -> BackendResult<()>;
    async fn refresh_session(&self) -> BackendResult<Option<Session>>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Newest first, with the author name joined in.
    async fn list_posts(&self, range: RowRange) -> BackendResult<PostPage>;
    async fn insert_post(&self, row: NewPostRow) -> BackendResult<Post>;
    async fn update_post(&self, id: PostId, patch: PostPatch) -> BackendResult<Post>;
    async fn delete_post(&self, id: PostId) -> BackendResult<()>;
    /// Oldest first.
    async fn list_comments(&self, post_id: PostId) -> BackendResult<Vec<Comment>>;
    async fn insert_comment(&self, row: NewCommentRow) -> BackendResult<Comment>;
    async fn update_comment(&self, id: CommentId, patch: CommentPatch) -> BackendResult<Comment>;
    async fn delete_comment(&self, id: CommentId) -> BackendResult<()>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Never overwrites: uploading to an existing path is an error.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> BackendResult<()>;
    fn public_url(&self, path: &str) -> String;
}
