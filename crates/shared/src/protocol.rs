use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Comment, CommentId, Identity, Post, PostId, Session, UserId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRef {
    #[serde(default)]
    pub username: Option<String>,
}

/// The `profiles` foreign join comes back as an object or as a one-element
/// array depending on how the relationship is inferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileJoin {
    Many(Vec<ProfileRef>),
    One(ProfileRef),
}

impl ProfileJoin {
    pub fn username(self) -> Option<String> {
        match self {
            ProfileJoin::Many(profiles) => profiles.into_iter().next().and_then(|p| p.username),
            ProfileJoin::One(profile) => profile.username,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRow {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profiles: Option<ProfileJoin>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            user_id: row.user_id,
            image_url: non_empty(row.image_url),
            created_at: row.created_at,
            author_name: row.profiles.and_then(ProfileJoin::username),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostRow {
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: CommentId,
    pub blog_id: PostId,
    pub user_id: UserId,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.blog_id,
            user_id: row.user_id,
            text: non_empty(row.comment),
            image_url: non_empty(row.image_url),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCommentRow {
    pub blog_id: PostId,
    pub user_id: UserId,
    pub comment: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPatch {
    pub comment: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl From<UserRecord> for Identity {
    fn from(user: UserRecord) -> Self {
        Identity {
            id: user.id,
            email: user.email,
            username: user.user_metadata.username,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordGrantRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshGrantRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub data: UserMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: UserRecord,
}

impl TokenResponse {
    pub fn into_session(self, issued_at: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(|| issued_at + chrono::Duration::seconds(self.expires_in));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Sign-up returns a full session when e-mail confirmation is disabled and a
/// bare user otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    User(UserRecord),
}

/// The different error envelopes used by the auth, rest and storage APIs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
    UserUpdated(Session),
}

impl SessionEvent {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionEvent::SignedIn(session)
            | SessionEvent::TokenRefreshed(session)
            | SessionEvent::UserUpdated(session) => Some(&session.user),
            SessionEvent::SignedOut => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "6f0c1f4e-8a57-4d43-9c69-2f4f1f6f5b10";
    const POST: &str = "0b1f3c9a-3d53-4c6b-a8f6-3c0d5f2b9e77";

    fn post_json(profiles: &str) -> String {
        format!(
            r#"{{"id":"{POST}","title":"Hello","content":"v1 is live","user_id":"{USER}",
                "image_url":"","created_at":"2026-10-01T12:00:00+00:00","profiles":{profiles}}}"#
        )
    }

    #[test]
    fn author_join_accepts_object_array_and_null() {
        let one: PostRow = serde_json::from_str(&post_json(r#"{"username":"u1"}"#)).expect("object");
        assert_eq!(Post::from(one).author_name.as_deref(), Some("u1"));

        let many: PostRow = serde_json::from_str(&post_json(r#"[{"username":"u2"}]"#)).expect("array");
        assert_eq!(Post::from(many).author_name.as_deref(), Some("u2"));

        let missing: PostRow = serde_json::from_str(&post_json("null")).expect("null");
        let post = Post::from(missing);
        assert_eq!(post.author_name, None);
        assert_eq!(post.author_label(), crate::domain::UNKNOWN_AUTHOR);
        assert_eq!(post.image_url, None, "empty image url reads as no image");
    }

    #[test]
    fn sign_up_without_confirmation_carries_a_session() {
        let with_session = format!(
            r#"{{"access_token":"a","refresh_token":"r","expires_in":3600,
                "user":{{"id":"{USER}","email":"u1@example.com","user_metadata":{{"username":"u1"}}}}}}"#
        );
        match serde_json::from_str::<SignUpResponse>(&with_session).expect("session") {
            SignUpResponse::Session(token) => {
                let issued = DateTime::<Utc>::from_timestamp(1_000, 0).expect("timestamp");
                let session = token.into_session(issued);
                assert_eq!(session.expires_at, issued + chrono::Duration::seconds(3600));
                assert_eq!(session.user.username.as_deref(), Some("u1"));
            }
            SignUpResponse::User(_) => panic!("expected a session"),
        }

        let bare = format!(r#"{{"id":"{USER}","email":"u1@example.com"}}"#);
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(&bare).expect("user"),
            SignUpResponse::User(_)
        ));
    }

    #[test]
    fn error_body_prefers_message_fields_in_order() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .expect("body");
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));

        let blank: ErrorBody = serde_json::from_str(r#"{"message":"  "}"#).expect("blank");
        assert_eq!(blank.into_message(), None);
    }
}
