//! UI/backend events and error modeling for the desktop app.

use client_core::{
    forms::{CommentDraft, PostDraft},
    WorkflowError, WorkflowSnapshot,
};
use shared::{domain::Identity, error::ErrorCode};

/// Every overlay that submits something and waits for the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
    CreatePost,
    EditPost,
    Composer,
    EditComment,
}

/// The draft as the worker left it. After a failed insert the attachment is
/// already committed, and handing it back keeps a retry from re-uploading.
pub enum ReturnedDraft {
    Post(PostDraft),
    Comment(CommentDraft),
}

pub enum UiEvent {
    Info(String),
    Error(UiError),
    SessionChanged(Option<Identity>),
    Snapshot(WorkflowSnapshot),
    FormSubmitted(FormKind),
    FormFailed {
        form: FormKind,
        error: UiError,
        draft: Option<ReturnedDraft>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Permission,
    Transport,
    Validation,
    Conflict,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Session,
    List,
    Comments,
    Form(FormKind),
}

pub fn classify_startup_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("supabase_url") || lower.contains("config file") {
        format!("Configuration error: {message}")
    } else if lower.contains("runtime") {
        "Backend worker startup failure; verify local app environment and restart.".to_string()
    } else {
        format!("Startup error: {message}")
    }
}

fn category_for_code(code: ErrorCode) -> UiErrorCategory {
    match code {
        ErrorCode::Unauthorized => UiErrorCategory::Auth,
        ErrorCode::Forbidden => UiErrorCategory::Permission,
        ErrorCode::Transport => UiErrorCategory::Transport,
        ErrorCode::Validation => UiErrorCategory::Validation,
        ErrorCode::Conflict => UiErrorCategory::Conflict,
        ErrorCode::NotFound | ErrorCode::RateLimited | ErrorCode::Internal => {
            UiErrorCategory::Unknown
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("jwt expired")
            || lower.contains("invalid token")
            || lower.contains("not logged in")
        {
            UiErrorCategory::Auth
        } else if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("disconnected")
        {
            UiErrorCategory::Transport
        } else if lower.contains("invalid") || lower.contains("required") {
            UiErrorCategory::Validation
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Uses the typed error where one exists; the message is shown verbatim.
    pub fn from_workflow(context: UiErrorContext, err: &WorkflowError) -> Self {
        let category = match err {
            WorkflowError::Validation(_)
            | WorkflowError::Attachment(_)
            | WorkflowError::Page(_) => UiErrorCategory::Validation,
            WorkflowError::Unauthenticated => UiErrorCategory::Auth,
            WorkflowError::Backend(backend) | WorkflowError::Upload(backend) => {
                category_for_code(backend.code)
            }
            WorkflowError::Busy
            | WorkflowError::NoOpenPost
            | WorkflowError::NotLoaded { .. }
            | WorkflowError::NothingToConfirm => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
