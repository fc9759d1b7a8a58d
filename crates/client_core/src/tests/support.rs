//! In-memory collaborators shared by the workflow, session and account tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{
    domain::{Comment, CommentId, Identity, Post, PostId, Session, UserId},
    error::{BackendError, ErrorCode},
    protocol::{CommentPatch, NewCommentRow, NewPostRow, PostPatch, SessionEvent},
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    BackendResult, IdentityProvider, ObjectStore, PostPage, RecordStore, RowRange,
    SignUpOutcome,
};

pub(crate) const PUBLIC_PREFIX: &str = "https://cdn.test/storage/v1/object/public/blog-images/";

struct Account {
    password: String,
    identity: Identity,
}

#[derive(Default)]
struct FakeState {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    uploads: HashMap<String, (Vec<u8>, String)>,
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    failures: HashMap<&'static str, BackendError>,
    calls: Vec<&'static str>,
    tick: i64,
}

impl FakeState {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.tick)
    }

    fn enter(&mut self, op: &'static str) -> BackendResult<()> {
        self.calls.push(op);
        match self.failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn author_name(&self, user_id: UserId) -> Option<String> {
        self.accounts
            .values()
            .find(|account| account.identity.id == user_id)
            .and_then(|account| account.identity.username.clone())
    }
}

/// One object standing in for the identity, record and object collaborators.
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
    events: broadcast::Sender<SessionEvent>,
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
            events,
        })
    }

    pub(crate) fn add_account(&self, username: &str) -> Identity {
        let identity = Identity {
            id: UserId(Uuid::new_v4()),
            email: Some(format!("{username}@example.com")),
            username: Some(username.to_string()),
        };
        self.state.lock().unwrap().accounts.insert(
            format!("{username}@example.com"),
            Account {
                password: "secret".to_string(),
                identity: identity.clone(),
            },
        );
        identity
    }

    pub(crate) fn session_for(identity: &Identity) -> Session {
        Session {
            access_token: format!("access-{}", identity.id),
            refresh_token: format!("refresh-{}", identity.id),
            expires_at: Utc::now() + Duration::hours(1),
            user: identity.clone(),
        }
    }

    /// Installs a session without emitting an event, as if restored on launch.
    pub(crate) fn restore_session(&self, identity: &Identity) {
        self.state.lock().unwrap().session = Some(Self::session_for(identity));
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn seed_post(&self, owner: &Identity, title: &str) -> Post {
        let mut state = self.state.lock().unwrap();
        let created_at = state.next_timestamp();
        let post = Post {
            id: PostId(Uuid::new_v4()),
            title: title.to_string(),
            content: format!("{title} body"),
            user_id: owner.id,
            image_url: None,
            created_at,
            author_name: owner.username.clone(),
        };
        state.posts.push(post.clone());
        post
    }

    pub(crate) fn seed_comment(&self, post: &Post, owner: &Identity, text: &str) -> Comment {
        let mut state = self.state.lock().unwrap();
        let created_at = state.next_timestamp();
        let comment = Comment {
            id: CommentId(Uuid::new_v4()),
            post_id: post.id,
            user_id: owner.id,
            text: Some(text.to_string()),
            image_url: None,
            created_at,
        };
        state.comments.push(comment.clone());
        comment
    }

    pub(crate) fn fail(&self, op: &'static str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(op, BackendError::from_status(400, message));
    }

    pub(crate) fn recover(&self, op: &'static str) {
        self.state.lock().unwrap().failures.remove(op);
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| **call == op)
            .count()
    }

    pub(crate) fn stored_post(&self, id: PostId) -> Option<Post> {
        let state = self.state.lock().unwrap();
        state.posts.iter().find(|post| post.id == id).cloned()
    }

    pub(crate) fn stored_posts(&self) -> Vec<Post> {
        self.state.lock().unwrap().posts.clone()
    }

    pub(crate) fn stored_comment(&self, id: CommentId) -> Option<Comment> {
        let state = self.state.lock().unwrap();
        state.comments.iter().find(|comment| comment.id == id).cloned()
    }

    pub(crate) fn upload_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.state.lock().unwrap().uploads.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Rewrites a stored post behind the client's back.
    pub(crate) fn tamper_post(&self, id: PostId, title: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(post) = state.posts.iter_mut().find(|post| post.id == id) {
            post.title = title.to_string();
        }
    }
}

fn not_found(what: &str) -> BackendError {
    BackendError::new(ErrorCode::NotFound, format!("{what} not found"))
}

#[async_trait]
impl IdentityProvider for FakeBackend {
    async fn current_session(&self) -> BackendResult<Option<Session>> {
        let mut state = self.state.lock().unwrap();
        state.enter("current_session")?;
        Ok(state.session.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let session = {
            let mut state = self.state.lock().unwrap();
            state.enter("sign_in")?;
            let account = state
                .accounts
                .get(email)
                .filter(|account| account.password == password)
                .ok_or_else(|| BackendError::from_status(400, "Invalid login credentials"))?;
            let session = Self::session_for(&account.identity);
            state.session = Some(session.clone());
            session
        };
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> BackendResult<SignUpOutcome> {
        let session = {
            let mut state = self.state.lock().unwrap();
            state.enter("sign_up")?;
            if state.accounts.contains_key(email) {
                return Err(BackendError::from_status(422, "User already registered"));
            }
            let identity = Identity {
                id: UserId(Uuid::new_v4()),
                email: Some(email.to_string()),
                username: Some(username.to_string()),
            };
            state.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    identity: identity.clone(),
                },
            );
            let session = Self::session_for(&identity);
            state.session = Some(session.clone());
            session
        };
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_out(&self) -> BackendResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.enter("sign_out")?;
            state.session = None;
        }
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    async fn refresh_session(&self) -> BackendResult<Option<Session>> {
        let mut state = self.state.lock().unwrap();
        state.enter("refresh_session")?;
        Ok(state.session.clone())
    }
}

#[async_trait]
impl RecordStore for FakeBackend {
    async fn list_posts(&self, range: RowRange) -> BackendResult<PostPage> {
        let mut state = self.state.lock().unwrap();
        state.enter("list_posts")?;
        let mut posts = state.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = posts.len() as u64;
        let posts = posts
            .into_iter()
            .skip(range.from as usize)
            .take((range.to - range.from + 1) as usize)
            .collect();
        Ok(PostPage { posts, total })
    }

    async fn insert_post(&self, row: NewPostRow) -> BackendResult<Post> {
        let mut state = self.state.lock().unwrap();
        state.enter("insert_post")?;
        let created_at = state.next_timestamp();
        let post = Post {
            id: PostId(Uuid::new_v4()),
            title: row.title,
            content: row.content,
            user_id: row.user_id,
            image_url: row.image_url,
            created_at,
            author_name: state.author_name(row.user_id),
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: PostId, patch: PostPatch) -> BackendResult<Post> {
        let mut state = self.state.lock().unwrap();
        state.enter("update_post")?;
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or_else(|| not_found("post"))?;
        post.title = patch.title;
        post.content = patch.content;
        post.image_url = patch.image_url;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: PostId) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        state.enter("delete_post")?;
        state.posts.retain(|post| post.id != id);
        state.comments.retain(|comment| comment.post_id != id);
        Ok(())
    }

    async fn list_comments(&self, post_id: PostId) -> BackendResult<Vec<Comment>> {
        let mut state = self.state.lock().unwrap();
        state.enter("list_comments")?;
        let mut comments: Vec<_> = state
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn insert_comment(&self, row: NewCommentRow) -> BackendResult<Comment> {
        let mut state = self.state.lock().unwrap();
        state.enter("insert_comment")?;
        let created_at = state.next_timestamp();
        let comment = Comment {
            id: CommentId(Uuid::new_v4()),
            post_id: row.blog_id,
            user_id: row.user_id,
            text: row.comment,
            image_url: row.image_url,
            created_at,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: CommentId, patch: CommentPatch) -> BackendResult<Comment> {
        let mut state = self.state.lock().unwrap();
        state.enter("update_comment")?;
        let comment = state
            .comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or_else(|| not_found("comment"))?;
        comment.text = patch.comment;
        comment.image_url = patch.image_url;
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: CommentId) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        state.enter("delete_comment")?;
        state.comments.retain(|comment| comment.id != id);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FakeBackend {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        state.enter("upload")?;
        if state.uploads.contains_key(path) {
            return Err(BackendError::from_status(409, "The resource already exists"));
        }
        state
            .uploads
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{PUBLIC_PREFIX}{path}")
    }
}
