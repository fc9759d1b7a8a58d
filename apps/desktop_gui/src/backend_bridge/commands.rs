//! Backend commands queued from UI to backend worker.

use client_core::{
    account::{LoginForm, RegisterForm},
    forms::{CommentDraft, PostDraft},
};
use shared::domain::{CommentId, PostId};

pub enum BackendCommand {
    SignIn(LoginForm),
    Register(RegisterForm),
    SignOut,
    RefreshPosts,
    GoToPage(u64),
    DismissListError,
    CreatePost(PostDraft),
    EditPost { id: PostId, draft: PostDraft },
    RequestDelete(PostId),
    CancelDelete,
    ConfirmDelete,
    OpenPost(PostId),
    ClosePost,
    CreateComment(CommentDraft),
    EditComment { id: CommentId, draft: CommentDraft },
    DeleteComment(CommentId),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::SignIn(_) => "sign_in",
            BackendCommand::Register(_) => "register",
            BackendCommand::SignOut => "sign_out",
            BackendCommand::RefreshPosts => "refresh_posts",
            BackendCommand::GoToPage(_) => "go_to_page",
            BackendCommand::DismissListError => "dismiss_list_error",
            BackendCommand::CreatePost(_) => "create_post",
            BackendCommand::EditPost { .. } => "edit_post",
            BackendCommand::RequestDelete(_) => "request_delete",
            BackendCommand::CancelDelete => "cancel_delete",
            BackendCommand::ConfirmDelete => "confirm_delete",
            BackendCommand::OpenPost(_) => "open_post",
            BackendCommand::ClosePost => "close_post",
            BackendCommand::CreateComment(_) => "create_comment",
            BackendCommand::EditComment { .. } => "edit_comment",
            BackendCommand::DeleteComment(_) => "delete_comment",
        }
    }
}
