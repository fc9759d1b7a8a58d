//! List, detail and mutation state for posts and their comments.
//!
//! The workflow is owned by a single task and every operation takes
//! `&mut self`, so mutations are processed one at a time.

use std::sync::Arc;

use shared::{
    domain::{Comment, CommentId, ImageFolder, Post, PostId},
    protocol::{CommentPatch, NewCommentRow, NewPostRow, PostPatch},
};
use tracing::{debug, info, warn};

use crate::{
    error::WorkflowError,
    forms::{CommentDraft, PostDraft, COMMENT_CONTENT_REQUIRED},
    pagination::PageWindow,
    session::SessionManager,
    ObjectStore, RecordStore,
};

/// The open post with its comments, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub error: Option<String>,
}

/// Everything the presentation layer renders, cloned out after each command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowSnapshot {
    pub posts: Vec<Post>,
    pub window: PageWindow,
    pub list_error: Option<String>,
    pub detail: Option<DetailView>,
    pub pending_delete: Option<PostId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentEditOutcome {
    Updated(Comment),
    /// The edit left neither text nor image, so the comment was removed.
    Deleted(CommentId),
}

pub struct ContentWorkflow {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    session: SessionManager,
    posts: Vec<Post>,
    window: PageWindow,
    list_error: Option<String>,
    detail: Option<DetailView>,
    pending_delete: Option<PostId>,
}

impl ContentWorkflow {
    pub fn new(
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        session: SessionManager,
    ) -> Self {
        Self {
            records,
            objects,
            session,
            posts: Vec::new(),
            window: PageWindow::default(),
            list_error: None,
            detail: None,
            pending_delete: None,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn list_error(&self) -> Option<&str> {
        self.list_error.as_deref()
    }

    pub fn dismiss_list_error(&mut self) {
        self.list_error = None;
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn pending_delete(&self) -> Option<PostId> {
        self.pending_delete
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            posts: self.posts.clone(),
            window: self.window,
            list_error: self.list_error.clone(),
            detail: self.detail.clone(),
            pending_delete: self.pending_delete,
        }
    }

    // ---- listing ----

    /// Fetches the current page. A failure leaves the previous rows in place
    /// and raises the list banner.
    pub async fn refresh_posts(&mut self) -> Result<(), WorkflowError> {
        self.fetch_page().await?;

        // The total shrank under us: fall back to the new last page once.
        if self.window.page() > 1 && self.window.total() > 0 && self.window.expected_len() == 0 {
            let last_page = self.window.total_pages();
            self.window.go_to(last_page)?;
            self.fetch_page().await?;
        }
        Ok(())
    }

    async fn fetch_page(&mut self) -> Result<(), WorkflowError> {
        let range = self.window.range();
        match self.records.list_posts(range).await {
            Ok(page) => {
                debug!(
                    page = self.window.page(),
                    rows = page.posts.len(),
                    total = page.total,
                    "workflow: loaded posts"
                );
                self.window.set_total(page.total);
                self.posts = page.posts;
                self.list_error = None;
                Ok(())
            }
            Err(err) => {
                warn!(page = self.window.page(), error = %err, "workflow: failed to load posts");
                self.list_error = Some(err.message.clone());
                Err(err.into())
            }
        }
    }

    /// Out-of-range pages are rejected without a request; a failed fetch
    /// restores the page that was showing.
    pub async fn go_to_page(&mut self, page: u64) -> Result<(), WorkflowError> {
        let previous = self.window;
        self.window.go_to(page)?;
        if let Err(err) = self.refresh_posts().await {
            self.window = previous;
            return Err(err);
        }
        Ok(())
    }

    pub async fn next_page(&mut self) -> Result<(), WorkflowError> {
        self.go_to_page(self.window.page() + 1).await
    }

    pub async fn prev_page(&mut self) -> Result<(), WorkflowError> {
        self.go_to_page(self.window.page().saturating_sub(1)).await
    }

    // ---- posts ----

    /// Uploads the chosen image, inserts the row and shows page 1 again.
    ///
    /// The draft's attachment is committed in place, so a retry after a
    /// failed insert reuses the uploaded object.
    pub async fn create_post(&mut self, draft: &mut PostDraft) -> Result<Post, WorkflowError> {
        let (title, content) = draft.validated_fields()?;
        let identity = self.session.require().await?;
        let image_url = draft
            .image
            .commit(self.objects.as_ref(), ImageFolder::Posts)
            .await
            .map_err(WorkflowError::Upload)?;

        let post = self
            .records
            .insert_post(NewPostRow {
                title,
                content,
                user_id: identity.id,
                image_url,
            })
            .await?;
        info!(post_id = %post.id, user_id = %identity.id, "workflow: post created");

        // The post exists either way. A failed reload shows the banner and
        // keeps the pager on the page whose rows are still showing.
        let previous = self.window;
        self.window.reset();
        if self.refresh_posts().await.is_err() {
            self.window = previous;
        }
        Ok(post)
    }

    /// Two-phase update: patch the local copy, then replace the list with a
    /// fresh fetch. If the fetch fails the patched copy stays.
    pub async fn edit_post(
        &mut self,
        id: PostId,
        draft: &mut PostDraft,
    ) -> Result<Post, WorkflowError> {
        let (title, content) = draft.validated_fields()?;
        self.session.require().await?;
        let image_url = draft
            .image
            .commit(self.objects.as_ref(), ImageFolder::Posts)
            .await
            .map_err(WorkflowError::Upload)?;

        let patch = PostPatch {
            title,
            content,
            image_url,
        };
        let updated = self.records.update_post(id, patch.clone()).await?;
        info!(post_id = %id, "workflow: post updated");

        self.apply_patch(id, &patch);
        if self.refresh_posts().await.is_ok() {
            if let Some(fresh) = self.posts.iter().find(|post| post.id == id).cloned() {
                self.replace_detail_post(fresh);
            }
        }
        Ok(updated)
    }

    fn apply_patch(&mut self, id: PostId, patch: &PostPatch) {
        let detail_post = self
            .detail
            .as_mut()
            .map(|detail| &mut detail.post)
            .filter(|post| post.id == id);
        for post in self
            .posts
            .iter_mut()
            .filter(|post| post.id == id)
            .chain(detail_post)
        {
            post.title = patch.title.clone();
            post.content = patch.content.clone();
            post.image_url = patch.image_url.clone();
        }
    }

    fn replace_detail_post(&mut self, post: Post) {
        if let Some(detail) = self.detail.as_mut().filter(|detail| detail.post.id == post.id) {
            detail.post = post;
        }
    }

    fn find_post(&self, id: PostId) -> Option<&Post> {
        self.posts
            .iter()
            .chain(self.detail.as_ref().map(|detail| &detail.post))
            .find(|post| post.id == id)
    }

    /// Records the post awaiting the confirm dialog.
    pub fn request_delete(&mut self, id: PostId) -> Result<(), WorkflowError> {
        if self.find_post(id).is_none() {
            return Err(WorkflowError::NotLoaded {
                kind: "post",
                id: id.to_string(),
            });
        }
        self.pending_delete = Some(id);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Removes the post locally without a re-fetch; the page stays where it is.
    pub async fn confirm_delete(&mut self) -> Result<PostId, WorkflowError> {
        let id = self
            .pending_delete
            .take()
            .ok_or(WorkflowError::NothingToConfirm)?;
        self.session.require().await?;

        if let Err(err) = self.records.delete_post(id).await {
            warn!(post_id = %id, error = %err, "workflow: failed to delete post");
            self.list_error = Some(err.message.clone());
            return Err(err.into());
        }

        let before = self.posts.len();
        self.posts.retain(|post| post.id != id);
        if self.posts.len() < before {
            self.window
                .set_total(self.window.total().saturating_sub(1));
        }
        if self.detail.as_ref().is_some_and(|detail| detail.post.id == id) {
            self.detail = None;
        }
        info!(post_id = %id, "workflow: post deleted");
        Ok(id)
    }

    // ---- detail and comments ----

    /// Opens a listed post and loads its comments. The detail stays open when
    /// the comment fetch fails, with the message on the detail view.
    pub async fn open_post(&mut self, id: PostId) -> Result<(), WorkflowError> {
        let post = self
            .find_post(id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotLoaded {
                kind: "post",
                id: id.to_string(),
            })?;
        self.detail = Some(DetailView {
            post,
            comments: Vec::new(),
            error: None,
        });
        self.reload_comments().await
    }

    pub async fn reload_comments(&mut self) -> Result<(), WorkflowError> {
        let post_id = self.open_post_id()?;
        let result = self.records.list_comments(post_id).await;
        let Some(detail) = self.detail.as_mut() else {
            return Ok(());
        };
        match result {
            Ok(comments) => {
                debug!(post_id = %post_id, count = comments.len(), "workflow: loaded comments");
                detail.comments = comments;
                detail.error = None;
                Ok(())
            }
            Err(err) => {
                warn!(post_id = %post_id, error = %err, "workflow: failed to load comments");
                detail.error = Some(err.message.clone());
                Err(err.into())
            }
        }
    }

    pub fn close_post(&mut self) {
        self.detail = None;
    }

    fn open_post_id(&self) -> Result<PostId, WorkflowError> {
        self.detail
            .as_ref()
            .map(|detail| detail.post.id)
            .ok_or(WorkflowError::NoOpenPost)
    }

    fn ensure_comment_loaded(&self, id: CommentId) -> Result<(), WorkflowError> {
        let loaded = self
            .detail
            .as_ref()
            .is_some_and(|detail| detail.comments.iter().any(|comment| comment.id == id));
        if loaded {
            Ok(())
        } else {
            Err(WorkflowError::NotLoaded {
                kind: "comment",
                id: id.to_string(),
            })
        }
    }

    /// Appends the stored comment to the open post's list.
    pub async fn create_comment(
        &mut self,
        draft: &mut CommentDraft,
    ) -> Result<Comment, WorkflowError> {
        let post_id = self.open_post_id()?;
        if draft.is_blank() {
            return Err(WorkflowError::validation(COMMENT_CONTENT_REQUIRED));
        }
        let identity = self.session.require().await?;
        let text = draft.text_value();
        let image_url = draft
            .image
            .commit(self.objects.as_ref(), ImageFolder::Comments)
            .await
            .map_err(WorkflowError::Upload)?;

        let comment = self
            .records
            .insert_comment(NewCommentRow {
                blog_id: post_id,
                user_id: identity.id,
                comment: text,
                image_url,
            })
            .await?;
        info!(comment_id = %comment.id, post_id = %post_id, "workflow: comment added");

        if let Some(detail) = self.detail.as_mut().filter(|detail| detail.post.id == post_id) {
            detail.comments.push(comment.clone());
        }
        Ok(comment)
    }

    /// An edit that leaves neither text nor image deletes the comment; that
    /// is decided before anything is uploaded.
    pub async fn edit_comment(
        &mut self,
        id: CommentId,
        draft: &mut CommentDraft,
    ) -> Result<CommentEditOutcome, WorkflowError> {
        self.ensure_comment_loaded(id)?;
        self.session.require().await?;

        if draft.is_blank() {
            self.remove_comment(id).await?;
            return Ok(CommentEditOutcome::Deleted(id));
        }

        let text = draft.text_value();
        let image_url = draft
            .image
            .commit(self.objects.as_ref(), ImageFolder::Comments)
            .await
            .map_err(WorkflowError::Upload)?;
        let updated = self
            .records
            .update_comment(
                id,
                CommentPatch {
                    comment: text,
                    image_url,
                },
            )
            .await?;
        info!(comment_id = %id, "workflow: comment updated");

        if let Some(slot) = self
            .detail
            .as_mut()
            .and_then(|detail| detail.comments.iter_mut().find(|comment| comment.id == id))
        {
            *slot = updated.clone();
        }
        Ok(CommentEditOutcome::Updated(updated))
    }

    pub async fn delete_comment(&mut self, id: CommentId) -> Result<(), WorkflowError> {
        self.ensure_comment_loaded(id)?;
        self.session.require().await?;
        if let Err(err) = self.remove_comment(id).await {
            if let Some(detail) = self.detail.as_mut() {
                detail.error = Some(err.to_string());
            }
            return Err(err);
        }
        Ok(())
    }

    async fn remove_comment(&mut self, id: CommentId) -> Result<(), WorkflowError> {
        if let Err(err) = self.records.delete_comment(id).await {
            warn!(comment_id = %id, error = %err, "workflow: failed to delete comment");
            return Err(err.into());
        }
        if let Some(detail) = self.detail.as_mut() {
            detail.comments.retain(|comment| comment.id != id);
            detail.error = None;
        }
        info!(comment_id = %id, "workflow: comment deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
