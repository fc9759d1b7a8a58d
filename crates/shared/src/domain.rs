use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(PostId);
id_newtype!(CommentId);

pub const UNKNOWN_AUTHOR: &str = "Unknown user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_name: Option<String>,
}

impl Post {
    pub fn author_label(&self) -> &str {
        self.author_name.as_deref().unwrap_or(UNKNOWN_AUTHOR)
    }

    pub fn is_owned_by(&self, identity: Option<&Identity>) -> bool {
        identity.is_some_and(|identity| identity.id == self.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_owned_by(&self, identity: Option<&Identity>) -> bool {
        identity.is_some_and(|identity| identity.id == self.user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFolder {
    Posts,
    Comments,
}

impl ImageFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFolder::Posts => "blogs",
            ImageFolder::Comments => "comments",
        }
    }
}
