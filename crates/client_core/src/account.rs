//! Login and registration forms.

use std::sync::LazyLock;

use regex::Regex;
use shared::domain::Identity;
use tracing::info;

use crate::{error::WorkflowError, SessionManager, SignUpOutcome};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(WorkflowError::validation("Please enter email and password"));
        }
        if !is_valid_email(&self.email) {
            return Err(WorkflowError::validation(
                "Please enter a valid email address",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.username.is_empty()
            || self.email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(WorkflowError::validation("All fields are required"));
        }
        if !is_valid_email(&self.email) {
            return Err(WorkflowError::validation(
                "Please enter a valid email address",
            ));
        }
        if self.password != self.confirm_password {
            return Err(WorkflowError::validation("Passwords do not match"));
        }
        Ok(())
    }
}

/// State of the login view: which tab is shown, both forms, one error line.
#[derive(Debug, Clone, Default)]
pub struct AccountForms {
    mode: AuthMode,
    pub login: LoginForm,
    pub register: RegisterForm,
    error: Option<String>,
}

impl AccountForms {
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
        self.error = None;
    }

    /// Any keystroke in a field dismisses the previous error.
    pub fn field_edited(&mut self) {
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

pub async fn submit_login(
    session: &SessionManager,
    form: &LoginForm,
) -> Result<Identity, WorkflowError> {
    form.validate()?;
    let issued = session.sign_in(&form.email, &form.password).await?;
    info!(user_id = %issued.user.id, "account: signed in");
    Ok(issued.user)
}

pub async fn submit_registration(
    session: &SessionManager,
    form: &RegisterForm,
) -> Result<SignUpOutcome, WorkflowError> {
    form.validate()?;
    let outcome = session
        .sign_up(&form.email, &form.password, &form.username)
        .await?;
    match &outcome {
        SignUpOutcome::SignedIn(issued) => {
            info!(user_id = %issued.user.id, "account: registered and signed in")
        }
        SignUpOutcome::ConfirmationRequired(identity) => {
            info!(user_id = %identity.id, "account: registered, awaiting e-mail confirmation")
        }
    }
    Ok(outcome)
}

#[cfg(test)]
#[path = "tests/account_tests.rs"]
mod tests;
