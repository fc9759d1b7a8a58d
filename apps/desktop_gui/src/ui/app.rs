use std::time::Duration;

use client_core::{
    account::{AccountForms, AuthMode},
    forms::{CommentDraft, FormState, PostDraft},
    guard::{self, Route},
    Attachment, WorkflowError, WorkflowSnapshot,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{Comment, CommentId, Identity, Post, PostId};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{FormKind, ReturnedDraft, UiError, UiEvent},
    orchestration::dispatch_backend_command,
};
use crate::ui::format::{load_pending_image, local_timestamp, page_summary, pager, preview};

/// Clicks collected while drawing and applied once the frame is laid out.
enum UiAction {
    Command(BackendCommand),
    OpenCreate,
    OpenEdit(Post),
    OpenCommentEdit(Comment),
}

enum FormOutcome {
    Idle,
    Submit,
    Close,
}

pub struct BlogDeskApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    route: Route,
    identity: Option<Identity>,
    snapshot: WorkflowSnapshot,

    account: AccountForms,
    account_busy: bool,
    create_form: Option<FormState<PostDraft>>,
    edit_form: Option<(PostId, FormState<PostDraft>)>,
    composer: FormState<CommentDraft>,
    comment_edit: Option<(CommentId, FormState<CommentDraft>)>,
    delete_in_flight: bool,

    status: String,
    banner: Option<UiError>,
}

impl BlogDeskApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            route: guard::resolve(Route::parse("/"), None),
            identity: None,
            snapshot: WorkflowSnapshot::default(),
            account: AccountForms::default(),
            account_busy: false,
            create_form: None,
            edit_form: None,
            composer: FormState::default(),
            comment_edit: None,
            delete_in_flight: false,
            status: "Connecting...".to_string(),
            banner: None,
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) -> bool {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status)
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::Error(err) => {
                    tracing::debug!(category = ?err.category(), context = ?err.context(), "ui error");
                    if err.requires_reauth() && self.identity.is_some() {
                        self.status = "Your session has ended; please sign in again".to_string();
                    }
                    self.banner = Some(err);
                }
                UiEvent::SessionChanged(identity) => self.apply_identity(identity),
                UiEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot),
                UiEvent::FormSubmitted(form) => self.form_submitted(form),
                UiEvent::FormFailed { form, error, draft } => self.form_failed(form, error, draft),
            }
        }
    }

    fn apply_identity(&mut self, identity: Option<Identity>) {
        self.route = guard::resolve(self.route, identity.as_ref());
        self.status = match &identity {
            Some(identity) => format!("Signed in as {}", identity.display_name()),
            None => "Not signed in".to_string(),
        };
        if identity.is_none() {
            self.create_form = None;
            self.edit_form = None;
            self.comment_edit = None;
            self.composer = FormState::default();
        }
        self.identity = identity;
    }

    fn apply_snapshot(&mut self, snapshot: WorkflowSnapshot) {
        let previous_post = self.snapshot.detail.as_ref().map(|detail| detail.post.id);
        let current_post = snapshot.detail.as_ref().map(|detail| detail.post.id);
        if previous_post != current_post {
            self.composer = FormState::default();
            self.comment_edit = None;
        }
        self.delete_in_flight = false;
        self.snapshot = snapshot;
    }

    fn form_submitted(&mut self, form: FormKind) {
        match form {
            FormKind::Login | FormKind::Register => {
                self.account_busy = false;
                let mode = self.account.mode();
                self.account = AccountForms::default();
                self.account.set_mode(mode);
            }
            FormKind::CreatePost => self.create_form = None,
            FormKind::EditPost => self.edit_form = None,
            FormKind::Composer => self.composer.succeed(),
            FormKind::EditComment => self.comment_edit = None,
        }
    }

    fn form_failed(&mut self, form: FormKind, error: UiError, draft: Option<ReturnedDraft>) {
        let message = error.message().to_string();
        match form {
            FormKind::Login | FormKind::Register => {
                self.account_busy = false;
                self.account.set_error(message);
            }
            FormKind::CreatePost => {
                if let Some(state) = self.create_form.as_mut() {
                    restore_post_image(state, draft);
                    state.fail(message);
                }
            }
            FormKind::EditPost => {
                if let Some((_, state)) = self.edit_form.as_mut() {
                    restore_post_image(state, draft);
                    state.fail(message);
                }
            }
            FormKind::Composer => {
                restore_comment_image(&mut self.composer, draft);
                self.composer.fail(message);
            }
            FormKind::EditComment => {
                if let Some((_, state)) = self.comment_edit.as_mut() {
                    restore_comment_image(state, draft);
                    state.fail(message);
                }
            }
        }
    }

    fn apply_actions(&mut self, actions: Vec<UiAction>) {
        for action in actions {
            match action {
                UiAction::Command(cmd) => {
                    if matches!(cmd, BackendCommand::ConfirmDelete) {
                        self.delete_in_flight = true;
                    }
                    self.dispatch(cmd);
                }
                UiAction::OpenCreate => {
                    if self.create_form.is_none() {
                        self.create_form = Some(FormState::default());
                    }
                }
                UiAction::OpenEdit(post) => {
                    self.edit_form = Some((post.id, FormState::new(PostDraft::from_post(&post))));
                }
                UiAction::OpenCommentEdit(comment) => {
                    self.comment_edit = Some((
                        comment.id,
                        FormState::new(CommentDraft::from_comment(&comment)),
                    ));
                }
            }
        }
    }

    // ---------- login view ----------

    fn show_login_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            ui.add_space((avail.y * 0.12).clamp(18.0, 90.0));

            ui.vertical_centered(|ui| {
                ui.set_width(avail.x.clamp(360.0, 440.0));
                egui::Frame::group(ui.style())
                    .inner_margin(egui::Margin::same(16))
                    .show(ui, |ui| {
                        ui.heading("Blog Desk");
                        ui.weak("Sign in to read and write posts.");
                        ui.add_space(8.0);
                        self.show_banner(ui);

                        let mut mode = self.account.mode();
                        ui.horizontal(|ui| {
                            ui.selectable_value(&mut mode, AuthMode::Login, "Sign in");
                            ui.selectable_value(&mut mode, AuthMode::Register, "Register");
                        });
                        if mode != self.account.mode() {
                            self.account.set_mode(mode);
                        }
                        ui.separator();

                        let submitted = match mode {
                            AuthMode::Login => self.login_fields(ui),
                            AuthMode::Register => self.register_fields(ui),
                        };

                        if let Some(error) = self.account.error() {
                            ui.colored_label(ui.visuals().error_fg_color, error);
                        }

                        let label = match mode {
                            AuthMode::Login => "Sign in",
                            AuthMode::Register => "Create account",
                        };
                        let button = egui::Button::new(egui::RichText::new(label).strong())
                            .min_size(egui::vec2(ui.available_width(), 34.0));
                        let clicked = ui.add_enabled(!self.account_busy, button).clicked();
                        if (clicked || submitted) && !self.account_busy {
                            self.submit_account(mode);
                        }
                        if self.account_busy {
                            ui.spinner();
                        }
                    });
                ui.add_space(6.0);
                ui.small(egui::RichText::new(&self.status).weak());
            });
        });
    }

    fn login_fields(&mut self, ui: &mut egui::Ui) -> bool {
        let mut edited = false;
        ui.label("Email");
        edited |= ui
            .add(egui::TextEdit::singleline(&mut self.account.login.email).desired_width(f32::INFINITY))
            .changed();
        ui.label("Password");
        let password = ui.add(
            egui::TextEdit::singleline(&mut self.account.login.password)
                .password(true)
                .desired_width(f32::INFINITY),
        );
        edited |= password.changed();
        if edited {
            self.account.field_edited();
        }
        password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter))
    }

    fn register_fields(&mut self, ui: &mut egui::Ui) -> bool {
        let form = &mut self.account.register;
        let mut edited = false;
        ui.label("Username");
        edited |= ui
            .add(egui::TextEdit::singleline(&mut form.username).desired_width(f32::INFINITY))
            .changed();
        ui.label("Email");
        edited |= ui
            .add(egui::TextEdit::singleline(&mut form.email).desired_width(f32::INFINITY))
            .changed();
        ui.label("Password");
        edited |= ui
            .add(
                egui::TextEdit::singleline(&mut form.password)
                    .password(true)
                    .desired_width(f32::INFINITY),
            )
            .changed();
        ui.label("Confirm password");
        let confirm = ui.add(
            egui::TextEdit::singleline(&mut form.confirm_password)
                .password(true)
                .desired_width(f32::INFINITY),
        );
        edited |= confirm.changed();
        if edited {
            self.account.field_edited();
        }
        confirm.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter))
    }

    /// Field checks run here too so an invalid form never leaves the window.
    fn submit_account(&mut self, mode: AuthMode) {
        let (validation, cmd) = match mode {
            AuthMode::Login => (
                self.account.login.validate(),
                BackendCommand::SignIn(self.account.login.clone()),
            ),
            AuthMode::Register => (
                self.account.register.validate(),
                BackendCommand::Register(self.account.register.clone()),
            ),
        };
        if let Err(err) = validation {
            self.account.set_error(err.to_string());
            return;
        }
        self.account_busy = self.dispatch(cmd);
    }

    // ---------- home view ----------

    fn show_home(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Blog Desk");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Log out").clicked() {
                        actions.push(UiAction::Command(BackendCommand::SignOut));
                    }
                    if let Some(identity) = &self.identity {
                        ui.label(format!("Signed in as {}", identity.display_name()));
                    }
                    if ui.button("New post").clicked() {
                        actions.push(UiAction::OpenCreate);
                    }
                    if ui.button("Refresh").clicked() {
                        actions.push(UiAction::Command(BackendCommand::RefreshPosts));
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("pager").show(ctx, |ui| {
            self.show_pager(ui, &mut actions);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_banner(ui);
            if let Some(message) = &self.snapshot.list_error {
                ui.horizontal_wrapped(|ui| {
                    ui.colored_label(ui.visuals().error_fg_color, message);
                    if ui.button("Dismiss").clicked() {
                        actions.push(UiAction::Command(BackendCommand::DismissListError));
                    }
                });
                ui.separator();
            }

            egui::ScrollArea::vertical().id_salt("posts").show(ui, |ui| {
                if self.snapshot.posts.is_empty() {
                    ui.weak("No posts to show.");
                }
                for post in &self.snapshot.posts {
                    post_card(ui, post, self.identity.as_ref(), &mut actions);
                    ui.add_space(6.0);
                }
            });
        });

        self.show_create_window(ctx);
        self.show_edit_window(ctx);
        self.show_detail_window(ctx, &mut actions);
        self.show_comment_edit_window(ctx);
        self.show_delete_confirmation(ctx, &mut actions);

        self.apply_actions(actions);
    }

    fn show_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.banner.clone() else {
            return;
        };
        egui::Frame::new()
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(banner.message()).color(egui::Color32::WHITE));
                    if ui.button("Dismiss").clicked() {
                        self.banner = None;
                    }
                });
            });
        ui.add_space(6.0);
    }

    fn show_pager(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let window = self.snapshot.window;
        let model = pager(&window);
        ui.horizontal(|ui| {
            if ui.add_enabled(model.prev_enabled, egui::Button::new("Prev")).clicked() {
                actions.push(UiAction::Command(BackendCommand::GoToPage(window.page() - 1)));
            }
            for (page, current) in &model.pages {
                let button = egui::Button::new(page.to_string()).selected(*current);
                if ui.add_enabled(!*current, button).clicked() {
                    actions.push(UiAction::Command(BackendCommand::GoToPage(*page)));
                }
            }
            if ui.add_enabled(model.next_enabled, egui::Button::new("Next")).clicked() {
                actions.push(UiAction::Command(BackendCommand::GoToPage(window.page() + 1)));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.weak(page_summary(&window));
            });
        });
    }

    fn show_create_window(&mut self, ctx: &egui::Context) {
        let Some(mut form) = self.create_form.take() else {
            return;
        };
        let mut open = true;
        let mut outcome = FormOutcome::Idle;
        egui::Window::new("New post")
            .collapsible(false)
            .default_width(480.0)
            .open(&mut open)
            .show(ctx, |ui| outcome = post_form_ui(ui, &mut form, "Publish"));

        match outcome {
            FormOutcome::Submit => {
                if let Ok(draft) = form.begin_submit() {
                    if !self.dispatch(BackendCommand::CreatePost(draft)) {
                        form.fail(self.status.clone());
                    }
                }
            }
            FormOutcome::Close => open = false,
            FormOutcome::Idle => {}
        }
        if open {
            self.create_form = Some(form);
        }
    }

    fn show_edit_window(&mut self, ctx: &egui::Context) {
        let Some((id, mut form)) = self.edit_form.take() else {
            return;
        };
        let mut open = true;
        let mut outcome = FormOutcome::Idle;
        egui::Window::new("Edit post")
            .collapsible(false)
            .default_width(480.0)
            .open(&mut open)
            .show(ctx, |ui| outcome = post_form_ui(ui, &mut form, "Save"));

        match outcome {
            FormOutcome::Submit => {
                if let Ok(draft) = form.begin_submit() {
                    if !self.dispatch(BackendCommand::EditPost { id, draft }) {
                        form.fail(self.status.clone());
                    }
                }
            }
            FormOutcome::Close => open = false,
            FormOutcome::Idle => {}
        }
        if open {
            self.edit_form = Some((id, form));
        }
    }

    fn show_detail_window(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Some(detail) = self.snapshot.detail.clone() else {
            return;
        };
        let mut open = true;
        let mut composer_outcome = FormOutcome::Idle;
        let identity = self.identity.clone();
        egui::Window::new(detail.post.title.clone())
            .id(egui::Id::new("post_detail"))
            .default_width(560.0)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.weak(format!(
                    "by {} · {}",
                    detail.post.author_label(),
                    local_timestamp(detail.post.created_at)
                ));
                ui.add_space(4.0);
                ui.label(&detail.post.content);
                if let Some(url) = &detail.post.image_url {
                    ui.hyperlink_to("View image", url);
                }
                ui.separator();

                ui.label(egui::RichText::new(format!("Comments ({})", detail.comments.len())).strong());
                if let Some(error) = &detail.error {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }
                egui::ScrollArea::vertical()
                    .id_salt("comments")
                    .max_height(280.0)
                    .show(ui, |ui| {
                        for comment in &detail.comments {
                            comment_row(ui, comment, identity.as_ref(), actions);
                        }
                    });
                ui.separator();
                composer_outcome = comment_form_ui(ui, &mut self.composer, "Comment");
            });

        if let FormOutcome::Submit = composer_outcome {
            if let Ok(draft) = self.composer.begin_submit() {
                if !self.dispatch(BackendCommand::CreateComment(draft)) {
                    let status = self.status.clone();
                    self.composer.fail(status);
                }
            }
        }
        if !open {
            actions.push(UiAction::Command(BackendCommand::ClosePost));
        }
    }

    fn show_comment_edit_window(&mut self, ctx: &egui::Context) {
        let Some((id, mut form)) = self.comment_edit.take() else {
            return;
        };
        let mut open = true;
        let mut outcome = FormOutcome::Idle;
        egui::Window::new("Edit comment")
            .collapsible(false)
            .default_width(420.0)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.weak("Clearing both the text and the image deletes the comment.");
                outcome = comment_form_ui(ui, &mut form, "Save");
            });

        match outcome {
            FormOutcome::Submit => {
                if let Ok(draft) = form.begin_submit() {
                    if !self.dispatch(BackendCommand::EditComment { id, draft }) {
                        form.fail(self.status.clone());
                    }
                }
            }
            FormOutcome::Close => open = false,
            FormOutcome::Idle => {}
        }
        if open {
            self.comment_edit = Some((id, form));
        }
    }

    fn show_delete_confirmation(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Some(id) = self.snapshot.pending_delete else {
            return;
        };
        let title = self
            .snapshot
            .posts
            .iter()
            .chain(self.snapshot.detail.as_ref().map(|detail| &detail.post))
            .find(|post| post.id == id)
            .map(|post| post.title.clone())
            .unwrap_or_default();
        egui::Window::new("Delete post?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!("\"{title}\" will be deleted permanently."));
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!self.delete_in_flight, egui::Button::new("Delete"))
                        .clicked()
                    {
                        actions.push(UiAction::Command(BackendCommand::ConfirmDelete));
                    }
                    if ui
                        .add_enabled(!self.delete_in_flight, egui::Button::new("Cancel"))
                        .clicked()
                    {
                        actions.push(UiAction::Command(BackendCommand::CancelDelete));
                    }
                });
            });
    }
}

fn restore_post_image(state: &mut FormState<PostDraft>, draft: Option<ReturnedDraft>) {
    if let Some(ReturnedDraft::Post(returned)) = draft {
        state.draft.image = returned.image;
    }
}

fn restore_comment_image(state: &mut FormState<CommentDraft>, draft: Option<ReturnedDraft>) {
    if let Some(ReturnedDraft::Comment(returned)) = draft {
        state.draft.image = returned.image;
    }
}

fn post_card(
    ui: &mut egui::Ui,
    post: &Post,
    identity: Option<&Identity>,
    actions: &mut Vec<UiAction>,
) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new(&post.title).strong().size(18.0));
        ui.weak(format!(
            "by {} · {}",
            post.author_label(),
            local_timestamp(post.created_at)
        ));
        ui.label(preview(&post.content));
        ui.horizontal(|ui| {
            if ui.button("Open").clicked() {
                actions.push(UiAction::Command(BackendCommand::OpenPost(post.id)));
            }
            if let Some(url) = &post.image_url {
                ui.hyperlink_to("View image", url);
            }
            if post.is_owned_by(identity) {
                if ui.button("Edit").clicked() {
                    actions.push(UiAction::OpenEdit(post.clone()));
                }
                if ui.button("Delete").clicked() {
                    actions.push(UiAction::Command(BackendCommand::RequestDelete(post.id)));
                }
            }
        });
    });
}

fn comment_row(
    ui: &mut egui::Ui,
    comment: &Comment,
    identity: Option<&Identity>,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal_wrapped(|ui| {
        ui.weak(local_timestamp(comment.created_at));
        if let Some(text) = &comment.text {
            ui.label(text);
        }
        if let Some(url) = &comment.image_url {
            ui.hyperlink_to("image", url);
        }
        if comment.is_owned_by(identity) {
            if ui.small_button("Edit").clicked() {
                actions.push(UiAction::OpenCommentEdit(comment.clone()));
            }
            if ui.small_button("Delete").clicked() {
                actions.push(UiAction::Command(BackendCommand::DeleteComment(comment.id)));
            }
        }
    });
}

fn post_form_ui(ui: &mut egui::Ui, form: &mut FormState<PostDraft>, submit_label: &str) -> FormOutcome {
    let busy = form.is_submitting();
    let mut outcome = FormOutcome::Idle;
    ui.add_enabled_ui(!busy, |ui| {
        ui.label("Title");
        if ui
            .add(egui::TextEdit::singleline(&mut form.draft.title).desired_width(f32::INFINITY))
            .changed()
        {
            form.clear_error();
        }
        ui.label("Content");
        if ui
            .add(
                egui::TextEdit::multiline(&mut form.draft.content)
                    .desired_rows(8)
                    .desired_width(f32::INFINITY),
            )
            .changed()
        {
            form.clear_error();
        }
        attachment_controls(ui, form);
    });
    if let Some(error) = form.error() {
        ui.colored_label(ui.visuals().error_fg_color, error);
    }
    ui.horizontal(|ui| {
        if ui.add_enabled(!busy, egui::Button::new(submit_label)).clicked() {
            outcome = FormOutcome::Submit;
        }
        if ui.add_enabled(!busy, egui::Button::new("Cancel")).clicked() {
            outcome = FormOutcome::Close;
        }
        if busy {
            ui.spinner();
        }
    });
    outcome
}

fn comment_form_ui(
    ui: &mut egui::Ui,
    form: &mut FormState<CommentDraft>,
    submit_label: &str,
) -> FormOutcome {
    let busy = form.is_submitting();
    let mut outcome = FormOutcome::Idle;
    ui.add_enabled_ui(!busy, |ui| {
        if ui
            .add(
                egui::TextEdit::multiline(&mut form.draft.text)
                    .hint_text("Write a comment")
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            )
            .changed()
        {
            form.clear_error();
        }
        attachment_controls(ui, form);
    });
    if let Some(error) = form.error() {
        ui.colored_label(ui.visuals().error_fg_color, error);
    }
    ui.horizontal(|ui| {
        if ui.add_enabled(!busy, egui::Button::new(submit_label)).clicked() {
            outcome = FormOutcome::Submit;
        }
        if busy {
            ui.spinner();
        }
    });
    outcome
}

/// Drafts that carry an image attachment.
trait HasAttachment {
    fn attachment(&mut self) -> &mut Attachment;
}

impl HasAttachment for PostDraft {
    fn attachment(&mut self) -> &mut Attachment {
        &mut self.image
    }
}

impl HasAttachment for CommentDraft {
    fn attachment(&mut self) -> &mut Attachment {
        &mut self.image
    }
}

fn attachment_controls<D: HasAttachment + Clone + Default>(ui: &mut egui::Ui, form: &mut FormState<D>) {
    let mut picked_error = None;
    ui.horizontal_wrapped(|ui| {
        let attachment = form.draft.attachment();
        if ui.button("Choose image...").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
                .pick_file()
            {
                match load_pending_image(&path) {
                    Ok(image) => attachment.choose(image),
                    Err(err) => picked_error = Some(err),
                }
            }
        }
        match attachment {
            Attachment::Empty => {
                ui.weak("No image");
            }
            Attachment::Chosen { .. } => {
                ui.label(attachment.label().unwrap_or_default().to_string());
                if ui.small_button("Discard").clicked() {
                    attachment.discard_choice();
                }
            }
            Attachment::Committed(_) => {
                ui.label(attachment.label().unwrap_or_default().to_string());
                if ui.small_button("Remove image").clicked() {
                    if let Err(err) = attachment.request_removal() {
                        picked_error = Some(WorkflowError::from(err).to_string());
                    }
                }
            }
            Attachment::RemoveRequested { .. } => {
                ui.weak("Image will be removed");
                if ui.small_button("Undo").clicked() {
                    attachment.undo_removal();
                }
            }
        }
    });
    if let Some(err) = picked_error {
        form.fail(err);
    }
}

impl eframe::App for BlogDeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        match self.route {
            Route::Home => self.show_home(ctx),
            Route::Login | Route::Unknown => self.show_login_screen(ctx),
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
