//! End-user signup flow, a linear step machine over the onboarding pages.
//!
//! Steps run Credentials → one step per page (ascending `index`) → Submitted.
//! Moving forward requires the current step to be complete; moving back is
//! always allowed. Submission happens from the last page.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use super::model::{OnboardingPage, sort_pages};
use crate::error::{ClientError, FormError};
use crate::forms::{
    AnswerObject, FieldValue, FormControl, find_binding, is_page_complete, render_page,
};

/// Where the user is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "step", content = "page", rename_all = "snake_case")]
pub enum SignupStep {
    Credentials,
    /// Position of the page in the sorted page list.
    Page(usize),
    Submitted,
}

impl SignupStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

impl std::fmt::Display for SignupStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credentials => write!(f, "credentials"),
            Self::Page(n) => write!(f, "page {}", n + 1),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}

/// Email and password entered on the first step.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    fn is_filled(&self) -> bool {
        !self.email.is_empty() && !self.password.expose_secret().is_empty()
    }

    fn duplicate(&self) -> Self {
        Self::new(self.email.clone(), self.password.expose_secret())
    }
}

/// The body sent to `POST /users`.
#[derive(Debug, Serialize)]
pub struct SignupSubmission {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    pub dynamic: AnswerObject,
}

fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Sends a finished signup somewhere.
#[async_trait]
pub trait SignupSubmitter: Send + Sync {
    async fn submit(&self, submission: &SignupSubmission) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A toast-style notification for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: &'static str,
    pub message: &'static str,
}

impl Notice {
    fn success() -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success",
            message: "User created successfully",
        }
    }

    fn failure() -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error",
            message: "Failed to create user",
        }
    }
}

/// Client-side state of one signup session.
#[derive(Debug)]
pub struct SignupFlow {
    pages: Vec<OnboardingPage>,
    step: SignupStep,
    credentials: Credentials,
    answers: AnswerObject,
    /// Credentials saved when leaving the first step; cleared after submission.
    draft: Option<Credentials>,
}

impl SignupFlow {
    pub fn new(mut pages: Vec<OnboardingPage>) -> Self {
        sort_pages(&mut pages);
        Self {
            pages,
            step: SignupStep::Credentials,
            credentials: Credentials::new("", ""),
            answers: AnswerObject::new(),
            draft: None,
        }
    }

    /// Start a flow prefilled from previously saved draft credentials.
    pub fn resume(pages: Vec<OnboardingPage>, draft: Credentials) -> Self {
        let mut flow = Self::new(pages);
        flow.credentials = draft.duplicate();
        flow.draft = Some(draft);
        flow
    }

    pub fn step(&self) -> SignupStep {
        self.step
    }

    pub fn answers(&self) -> &AnswerObject {
        &self.answers
    }

    pub fn draft(&self) -> Option<&Credentials> {
        self.draft.as_ref()
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.credentials.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.credentials.password = SecretString::from(password.into());
    }

    /// The page shown on the current step, if the step is a page.
    pub fn current_page(&self) -> Option<&OnboardingPage> {
        match self.step {
            SignupStep::Page(n) => self.pages.get(n),
            _ => None,
        }
    }

    /// Form controls for the current page.
    pub fn controls(&self) -> Vec<FormControl> {
        self.current_page()
            .map(|p| render_page(&p.components))
            .unwrap_or_default()
    }

    fn page_for_field(&self) -> Result<&OnboardingPage, FormError> {
        self.current_page().ok_or_else(|| FormError::StepBlocked {
            step: self.step.to_string(),
            reason: "no form fields on this step".to_string(),
        })
    }

    /// Write a value into the field at `path` on the current page.
    pub fn set_field(&mut self, path: &str, value: FieldValue) -> Result<(), FormError> {
        let page = self.page_for_field()?;
        let binding = find_binding(&page.components, path).ok_or_else(|| {
            FormError::ComponentNotFound {
                key: path.to_string(),
                index: page.index,
            }
        })?;
        binding.write(&mut self.answers, value)
    }

    /// Current value of the field at `path` on the current page.
    pub fn field_value(&self, path: &str) -> Option<FieldValue> {
        let page = self.current_page()?;
        find_binding(&page.components, path)?.read(&self.answers)
    }

    /// Whether the current step's completion rule holds.
    pub fn can_advance(&self) -> bool {
        match self.step {
            SignupStep::Credentials => self.credentials.is_filled(),
            SignupStep::Page(n) => self
                .pages
                .get(n)
                .is_some_and(|p| is_page_complete(&p.components, &self.answers)),
            SignupStep::Submitted => false,
        }
    }

    fn is_last_page(&self) -> bool {
        matches!(self.step, SignupStep::Page(n) if n + 1 == self.pages.len())
    }

    fn blocked(&self, reason: &str) -> FormError {
        FormError::StepBlocked {
            step: self.step.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Move to the next step.
    pub fn next(&mut self) -> Result<SignupStep, FormError> {
        if !self.can_advance() {
            return Err(self.blocked("step is incomplete"));
        }
        let next = match self.step {
            SignupStep::Credentials if self.pages.is_empty() => {
                return Err(self.blocked("no onboarding pages are configured"));
            }
            SignupStep::Credentials => {
                self.draft = Some(self.credentials.duplicate());
                SignupStep::Page(0)
            }
            SignupStep::Page(_) if self.is_last_page() => {
                return Err(self.blocked("last page is submitted, not advanced"));
            }
            SignupStep::Page(n) => SignupStep::Page(n + 1),
            SignupStep::Submitted => return Err(self.blocked("signup already submitted")),
        };
        self.step = next;
        Ok(next)
    }

    /// Move to the previous step. Entered data is kept.
    pub fn back(&mut self) -> SignupStep {
        self.step = match self.step {
            SignupStep::Credentials | SignupStep::Page(0) => SignupStep::Credentials,
            SignupStep::Page(n) => SignupStep::Page(n - 1),
            SignupStep::Submitted => SignupStep::Submitted,
        };
        self.step
    }

    /// Submit from the last page.
    ///
    /// On success the flow becomes terminal and the draft is cleared. On
    /// failure the flow stays on the last page with answers intact and an
    /// error notice is returned; there is no retry.
    pub async fn submit(&mut self, submitter: &dyn SignupSubmitter) -> Result<Notice, FormError> {
        if !self.is_last_page() {
            return Err(self.blocked("submission happens from the last page"));
        }
        if !self.can_advance() {
            return Err(self.blocked("step is incomplete"));
        }

        let submission = SignupSubmission {
            email: self.credentials.email.clone(),
            password: SecretString::from(self.credentials.password.expose_secret()),
            dynamic: self.answers.clone(),
        };

        match submitter.submit(&submission).await {
            Ok(()) => {
                info!(email = %submission.email, "Signup submitted");
                self.step = SignupStep::Submitted;
                self.draft = None;
                Ok(Notice::success())
            }
            Err(e) => {
                warn!(error = %e, "Signup submission failed");
                Ok(Notice::failure())
            }
        }
    }
}
