use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, ACCEPT, RANGE},
    RequestBuilder, StatusCode,
};
use shared::{
    domain::{Comment, CommentId, Post, PostId},
    error::{BackendError, ErrorCode},
    protocol::{CommentPatch, CommentRow, NewCommentRow, NewPostRow, PostPatch, PostRow},
};
use tracing::debug;

use super::{check, decode, transport, SupabaseClient};
use crate::{BackendResult, PostPage, RecordStore, RowRange};

const POSTS_TABLE: &str = "rest/v1/blogs";
const COMMENTS_TABLE: &str = "rest/v1/comments";
const POST_SELECT: &str =
    "id,title,content,user_id,created_at,image_url,profiles!blogs_user_id_fkey(username)";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// `Content-Range: 0-7/23` or `*/0`; the part after the slash is the total.
pub(crate) fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("content-range")?
        .to_str()
        .ok()?
        .rsplit_once('/')?
        .1
        .parse()
        .ok()
}

fn eq(id: impl std::fmt::Display) -> String {
    format!("eq.{id}")
}

impl SupabaseClient {
    async fn send_single<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> BackendResult<T> {
        let response = self
            .authorized(request)
            .await
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await
            .map_err(transport)?;
        decode(check(response).await?).await
    }

    /// Row-level security turns a forbidden delete into a no-op, so ask for
    /// the deleted rows back and treat none as a failure.
    async fn delete_one(&self, table: &str, id: String, kind: &str) -> BackendResult<()> {
        let response = self
            .authorized(self.http.delete(self.endpoint(table)))
            .await
            .query(&[("id", id)])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(transport)?;
        let deleted: Vec<serde_json::Value> = decode(check(response).await?).await?;
        if deleted.is_empty() {
            return Err(BackendError::new(
                ErrorCode::NotFound,
                format!("The {kind} could not be deleted"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn list_posts(&self, range: RowRange) -> BackendResult<PostPage> {
        let response = self
            .authorized(self.http.get(self.endpoint(POSTS_TABLE)))
            .await
            .query(&[("select", POST_SELECT), ("order", "created_at.desc")])
            .header("Range-Unit", "items")
            .header(RANGE, format!("{}-{}", range.from, range.to))
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            let total = content_range_total(response.headers()).unwrap_or(0);
            debug!(from = range.from, total, "rest: requested range past the end");
            return Ok(PostPage {
                posts: Vec::new(),
                total,
            });
        }

        let response = check(response).await?;
        let total = content_range_total(response.headers());
        let rows: Vec<PostRow> = decode(response).await?;
        let total = total.unwrap_or(range.from + rows.len() as u64);
        Ok(PostPage {
            posts: rows.into_iter().map(Post::from).collect(),
            total,
        })
    }

    async fn insert_post(&self, row: NewPostRow) -> BackendResult<Post> {
        let request = self
            .http
            .post(self.endpoint(POSTS_TABLE))
            .query(&[("select", POST_SELECT)])
            .json(&row);
        let row: PostRow = self.send_single(request).await?;
        Ok(row.into())
    }

    async fn update_post(&self, id: PostId, patch: PostPatch) -> BackendResult<Post> {
        let request = self
            .http
            .patch(self.endpoint(POSTS_TABLE))
            .query(&[("id", eq(id).as_str()), ("select", POST_SELECT)])
            .json(&patch);
        let row: PostRow = self.send_single(request).await?;
        Ok(row.into())
    }

    async fn delete_post(&self, id: PostId) -> BackendResult<()> {
        self.delete_one(POSTS_TABLE, eq(id), "post").await
    }

    async fn list_comments(&self, post_id: PostId) -> BackendResult<Vec<Comment>> {
        let response = self
            .authorized(self.http.get(self.endpoint(COMMENTS_TABLE)))
            .await
            .query(&[
                ("select", "*".to_string()),
                ("blog_id", eq(post_id)),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<CommentRow> = decode(check(response).await?).await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn insert_comment(&self, row: NewCommentRow) -> BackendResult<Comment> {
        let request = self.http.post(self.endpoint(COMMENTS_TABLE)).json(&row);
        let row: CommentRow = self.send_single(request).await?;
        Ok(row.into())
    }

    async fn update_comment(&self, id: CommentId, patch: CommentPatch) -> BackendResult<Comment> {
        let request = self
            .http
            .patch(self.endpoint(COMMENTS_TABLE))
            .query(&[("id", eq(id))])
            .json(&patch);
        let row: CommentRow = self.send_single(request).await?;
        Ok(row.into())
    }

    async fn delete_comment(&self, id: CommentId) -> BackendResult<()> {
        self.delete_one(COMMENTS_TABLE, eq(id), "comment").await
    }
}
