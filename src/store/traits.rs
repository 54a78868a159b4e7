//! Backend-agnostic `Database` trait: single async interface for all persistence.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::onboarding::model::OnboardingPage;
use crate::users::model::{NewUser, StoredUser, UserDataRow};

/// Backend-agnostic database trait covering onboarding pages and users.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Onboarding pages ────────────────────────────────────────────

    /// Number of persisted pages.
    async fn count_pages(&self) -> Result<u64, DatabaseError>;

    /// All pages, ascending by `index`.
    async fn get_pages(&self) -> Result<Vec<OnboardingPage>, DatabaseError>;

    /// Delete every page and insert `pages`, in one transaction.
    ///
    /// On failure the previously persisted set is left intact.
    async fn replace_pages(&self, pages: &[OnboardingPage]) -> Result<(), DatabaseError>;

    // ── Users ───────────────────────────────────────────────────────

    /// Insert a user and their address in one transaction.
    ///
    /// A duplicate email yields `DatabaseError::Constraint`.
    async fn create_user(&self, user: &NewUser) -> Result<StoredUser, DatabaseError>;

    /// Look up a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError>;

    /// Users joined with their address; users without an address are omitted.
    async fn list_user_data(&self) -> Result<Vec<UserDataRow>, DatabaseError>;
}
