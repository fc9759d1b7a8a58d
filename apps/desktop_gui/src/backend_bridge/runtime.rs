//! Backend worker: a tokio runtime on its own thread that owns the workflow
//! and runs queued UI commands one at a time.

use std::{sync::Arc, thread};

use client_core::{
    account::{submit_login, submit_registration},
    config::Settings,
    ContentWorkflow, SessionManager, SignUpOutcome, SupabaseClient, WorkflowError,
};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{
    classify_startup_failure, FormKind, ReturnedDraft, UiError, UiErrorContext, UiEvent,
};

pub fn launch(
    settings: Settings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    classify_startup_failure(&format!("failed to build runtime: {err}")),
                )));
                return;
            }
        };
        runtime.block_on(run_worker(settings, cmd_rx, ui_tx));
    })
}

async fn run_worker(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let client = match SupabaseClient::from_settings(&settings) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            error!("failed to create backend client: {err:#}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                classify_startup_failure(&format!("{err:#}")),
            )));
            return;
        }
    };

    let (session, _session_listener) = SessionManager::start(client.clone()).await;
    let forward_tx = ui_tx.clone();
    let _identity_listener = session.on_change(move |identity| {
        let _ = forward_tx.try_send(UiEvent::SessionChanged(identity));
    });

    let initial = session.current().await;
    let signed_in = initial.is_some();
    let _ = ui_tx.try_send(UiEvent::SessionChanged(initial));

    let mut worker = Worker {
        workflow: ContentWorkflow::new(client.clone(), client, session.clone()),
        session,
        ui_tx,
    };
    if signed_in {
        worker.refresh_posts().await;
    }
    worker.publish_snapshot();
    info!(base_url = %settings.supabase_url, "backend worker ready");

    while let Ok(cmd) = cmd_rx.recv() {
        debug!(command = cmd.name(), "handling ui command");
        worker.handle(cmd).await;
        worker.publish_snapshot();
    }
    info!("ui command queue closed; backend worker exiting");
}

struct Worker {
    session: SessionManager,
    workflow: ContentWorkflow,
    ui_tx: Sender<UiEvent>,
}

impl Worker {
    async fn handle(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::SignIn(form) => match submit_login(&self.session, &form).await {
                Ok(_) => {
                    self.send(UiEvent::FormSubmitted(FormKind::Login));
                    self.refresh_posts().await;
                }
                Err(err) => self.form_failed(FormKind::Login, &err, None),
            },
            BackendCommand::Register(form) => {
                match submit_registration(&self.session, &form).await {
                    Ok(SignUpOutcome::SignedIn(_)) => {
                        self.send(UiEvent::FormSubmitted(FormKind::Register));
                        self.refresh_posts().await;
                    }
                    Ok(SignUpOutcome::ConfirmationRequired(identity)) => {
                        self.send(UiEvent::FormSubmitted(FormKind::Register));
                        let email = identity.email.unwrap_or(form.email);
                        self.send(UiEvent::Info(format!(
                            "Check {email} to confirm your account, then sign in"
                        )));
                    }
                    Err(err) => self.form_failed(FormKind::Register, &err, None),
                }
            }
            BackendCommand::SignOut => {
                if let Err(err) = self.session.sign_out().await {
                    warn!(error = %err, "sign-out reported an error");
                    self.send(UiEvent::Error(UiError::from_workflow(
                        UiErrorContext::Session,
                        &WorkflowError::from(err),
                    )));
                }
            }
            BackendCommand::RefreshPosts => self.refresh_posts().await,
            BackendCommand::GoToPage(page) => {
                // Backend failures land on the list banner via the snapshot.
                if let Err(WorkflowError::Page(err)) = self.workflow.go_to_page(page).await {
                    debug!(%err, "ignored out-of-range page request");
                }
            }
            BackendCommand::DismissListError => self.workflow.dismiss_list_error(),
            BackendCommand::CreatePost(mut draft) => {
                match self.workflow.create_post(&mut draft).await {
                    Ok(_) => self.send(UiEvent::FormSubmitted(FormKind::CreatePost)),
                    Err(err) => {
                        self.form_failed(FormKind::CreatePost, &err, Some(ReturnedDraft::Post(draft)))
                    }
                }
            }
            BackendCommand::EditPost { id, mut draft } => {
                match self.workflow.edit_post(id, &mut draft).await {
                    Ok(_) => self.send(UiEvent::FormSubmitted(FormKind::EditPost)),
                    Err(err) => {
                        self.form_failed(FormKind::EditPost, &err, Some(ReturnedDraft::Post(draft)))
                    }
                }
            }
            BackendCommand::RequestDelete(id) => {
                if let Err(err) = self.workflow.request_delete(id) {
                    self.send(UiEvent::Error(UiError::from_workflow(UiErrorContext::List, &err)));
                }
            }
            BackendCommand::CancelDelete => self.workflow.cancel_delete(),
            BackendCommand::ConfirmDelete => {
                if let Err(err @ WorkflowError::Unauthenticated) =
                    self.workflow.confirm_delete().await
                {
                    self.send(UiEvent::Error(UiError::from_workflow(UiErrorContext::List, &err)));
                }
            }
            BackendCommand::OpenPost(id) => {
                if let Err(err @ WorkflowError::NotLoaded { .. }) = self.workflow.open_post(id).await
                {
                    self.send(UiEvent::Error(UiError::from_workflow(
                        UiErrorContext::Comments,
                        &err,
                    )));
                }
            }
            BackendCommand::ClosePost => self.workflow.close_post(),
            BackendCommand::CreateComment(mut draft) => {
                match self.workflow.create_comment(&mut draft).await {
                    Ok(_) => self.send(UiEvent::FormSubmitted(FormKind::Composer)),
                    Err(err) => self.form_failed(
                        FormKind::Composer,
                        &err,
                        Some(ReturnedDraft::Comment(draft)),
                    ),
                }
            }
            BackendCommand::EditComment { id, mut draft } => {
                match self.workflow.edit_comment(id, &mut draft).await {
                    Ok(_) => self.send(UiEvent::FormSubmitted(FormKind::EditComment)),
                    Err(err) => self.form_failed(
                        FormKind::EditComment,
                        &err,
                        Some(ReturnedDraft::Comment(draft)),
                    ),
                }
            }
            BackendCommand::DeleteComment(id) => {
                if let Err(err) = self.workflow.delete_comment(id).await {
                    if err == WorkflowError::Unauthenticated {
                        self.send(UiEvent::Error(UiError::from_workflow(
                            UiErrorContext::Comments,
                            &err,
                        )));
                    }
                }
            }
        }
    }

    /// List failures are already on the banner; nothing more to report.
    async fn refresh_posts(&mut self) {
        let _ = self.workflow.refresh_posts().await;
    }

    fn form_failed(&self, form: FormKind, err: &WorkflowError, draft: Option<ReturnedDraft>) {
        if !err.is_validation() {
            warn!(?form, error = %err, "form submission failed");
        }
        self.send(UiEvent::FormFailed {
            form,
            error: UiError::from_workflow(UiErrorContext::Form(form), err),
            draft,
        });
    }

    fn publish_snapshot(&self) {
        self.send(UiEvent::Snapshot(self.workflow.snapshot()));
    }

    fn send(&self, event: UiEvent) {
        if self.ui_tx.try_send(event).is_err() {
            warn!("ui event queue unavailable; dropping event");
        }
    }
}
