use shared::domain::{Comment, Post};

use crate::{attachment::Attachment, error::WorkflowError};

pub const POST_FIELDS_REQUIRED: &str = "Title and content are required";
pub const COMMENT_CONTENT_REQUIRED: &str = "Write a comment or attach an image";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub image: Attachment,
}

impl PostDraft {
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            image: Attachment::from_existing(post.image_url.clone()),
        }
    }

    pub(crate) fn validated_fields(&self) -> Result<(String, String), WorkflowError> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(WorkflowError::validation(POST_FIELDS_REQUIRED));
        }
        Ok((title.to_string(), content.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
    pub image: Attachment,
}

impl CommentDraft {
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            text: comment.text.clone().unwrap_or_default(),
            image: Attachment::from_existing(comment.image_url.clone()),
        }
    }

    pub(crate) fn text_value(&self) -> Option<String> {
        let text = self.text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Neither text nor an image would remain after submitting.
    pub fn is_blank(&self) -> bool {
        self.text_value().is_none() && !self.image.has_image()
    }
}

/// Draft plus the inline error and in-flight flag every overlay carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState<D> {
    pub draft: D,
    error: Option<String>,
    submitting: bool,
}

impl<D: Clone + Default> FormState<D> {
    pub fn new(draft: D) -> Self {
        Self {
            draft,
            error: None,
            submitting: false,
        }
    }

    /// Hands out the draft to submit; a second call before the outcome is
    /// reported is rejected so one click issues one request.
    pub fn begin_submit(&mut self) -> Result<D, WorkflowError> {
        if self.submitting {
            return Err(WorkflowError::Busy);
        }
        self.submitting = true;
        self.error = None;
        Ok(self.draft.clone())
    }

    pub fn succeed(&mut self) {
        *self = Self::default();
    }

    /// Keeps every field so the user can retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.error = Some(message.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::PendingImage;

    #[test]
    fn post_draft_requires_trimmed_title_and_content() {
        let draft = PostDraft {
            title: "  ".into(),
            content: "body".into(),
            image: Attachment::Empty,
        };
        assert_eq!(
            draft.validated_fields(),
            Err(WorkflowError::validation(POST_FIELDS_REQUIRED))
        );

        let draft = PostDraft {
            title: " Launch ".into(),
            content: "v1 is live".into(),
            image: Attachment::Empty,
        };
        assert_eq!(
            draft.validated_fields(),
            Ok(("Launch".to_string(), "v1 is live".to_string()))
        );
    }

    #[test]
    fn image_alone_makes_a_comment_non_blank() {
        let mut draft = CommentDraft::default();
        assert!(draft.is_blank());
        draft
            .image
            .choose(PendingImage::new("a.png", vec![1], None));
        assert!(!draft.is_blank());
        assert_eq!(draft.text_value(), None);
    }

    #[test]
    fn begin_submit_blocks_double_submission() {
        let mut form = FormState::new(CommentDraft {
            text: "hi".into(),
            image: Attachment::Empty,
        });
        let draft = form.begin_submit().expect("first submit");
        assert_eq!(draft.text, "hi");
        assert_eq!(form.begin_submit(), Err(WorkflowError::Busy));

        form.fail("rejected");
        assert_eq!(form.error(), Some("rejected"));
        assert_eq!(form.draft.text, "hi");
        assert!(form.begin_submit().is_ok());

        form.succeed();
        assert_eq!(form, FormState::default());
    }
}
