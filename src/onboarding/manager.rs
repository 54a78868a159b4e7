//! OnboardingManager owns the page store. It reads the current layout and replaces
//! it wholesale after checking the page-set rules.

use std::sync::Arc;

use tracing::info;

use super::model::{OnboardingPage, component_count, field_count, validate_pages};
use crate::error::Error;
use crate::store::Database;

/// Reads and replaces the persisted onboarding page set.
pub struct OnboardingManager {
    db: Arc<dyn Database>,
}

impl OnboardingManager {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// All pages, ascending by `index`.
    pub async fn get_pages(&self) -> Result<Vec<OnboardingPage>, Error> {
        Ok(self.db.get_pages().await?)
    }

    /// Replace the whole page set.
    ///
    /// Rule violations are reported before storage is touched; the delete and
    /// insert then run as one transaction.
    pub async fn replace_pages(&self, pages: Vec<OnboardingPage>) -> Result<(), Error> {
        validate_pages(&pages)?;
        self.db.replace_pages(&pages).await?;
        info!(
            pages = pages.len(),
            components = component_count(&pages),
            fields = field_count(&pages),
            "Onboarding form updated"
        );
        Ok(())
    }
}
