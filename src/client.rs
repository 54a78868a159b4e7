//! Typed HTTP client for the onboarding service.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;
use crate::onboarding::flow::{SignupSubmission, SignupSubmitter};
use crate::onboarding::layout::PageLayout;
use crate::onboarding::model::OnboardingPage;
use crate::users::model::UserDataRow;

/// Client for `/onboarding-form`, `/users` and `/data`.
#[derive(Clone)]
pub struct OnboardingClient {
    http: reqwest::Client,
    base_url: String,
}

impl OnboardingClient {
    /// `base_url` without a trailing slash, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /onboarding-form`
    pub async fn get_form(&self) -> Result<Vec<OnboardingPage>, ClientError> {
        self.get_json("/onboarding-form", "Get onboarding form").await
    }

    /// `PUT /onboarding-form`
    pub async fn update_form(&self, pages: &[OnboardingPage]) -> Result<(), ClientError> {
        let resp = self
            .http
            .put(self.url("/onboarding-form"))
            .json(pages)
            .send()
            .await?;
        check(resp, "Update onboarding form").await?;
        Ok(())
    }

    /// Save an edited layout through `PUT /onboarding-form`.
    ///
    /// Blocked layouts are refused locally with the same message the admin sees.
    pub async fn save_layout(&self, layout: PageLayout) -> Result<(), ClientError> {
        if let Some(warning) = layout.save_warning() {
            return Err(ClientError::Rejected(warning));
        }
        self.update_form(&layout.into_pages()).await
    }

    /// `POST /users`
    pub async fn create_user<T: Serialize + ?Sized>(&self, body: &T) -> Result<(), ClientError> {
        let resp = self.http.post(self.url("/users")).json(body).send().await?;
        check(resp, "Create user").await?;
        Ok(())
    }

    /// `GET /data`
    pub async fn get_data(&self) -> Result<Vec<UserDataRow>, ClientError> {
        self.get_json("/data", "Get data").await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &'static str,
    ) -> Result<T, ClientError> {
        let resp = self.http.get(self.url(path)).send().await?;
        let resp = check(resp, operation).await?;
        Ok(resp.json().await?)
    }
}

async fn check(
    resp: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    debug!(operation, status = status.as_u16(), body = %body, "Request failed");
    Err(ClientError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SignupSubmitter for OnboardingClient {
    async fn submit(&self, submission: &SignupSubmission) -> Result<(), ClientError> {
        self.create_user(submission).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let client = OnboardingClient::new("http://localhost:3000/");
        assert_eq!(client.url("/data"), "http://localhost:3000/data");
    }
}
