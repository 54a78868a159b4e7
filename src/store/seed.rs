//! Install the default onboarding layout into an empty store.

use tracing::info;

use super::traits::Database;
use crate::error::DatabaseError;
use crate::onboarding::model::default_pages;

/// Seed the default pages if no pages exist. Returns whether seeding happened.
pub async fn seed_default_pages(db: &dyn Database) -> Result<bool, DatabaseError> {
    if db.count_pages().await? > 0 {
        return Ok(false);
    }

    let pages = default_pages();
    db.replace_pages(&pages).await?;
    info!(pages = pages.len(), "Seeded default onboarding pages");
    Ok(true)
}
