//! UserRegistry: creates users from signup submissions and lists the joined
//! user/address data.

use std::sync::Arc;

use tracing::info;

use super::model::{CreateUserRequest, NewUser, StoredUser, UserDataRow};
use super::password::hash_password_blocking;
use crate::error::Error;
use crate::store::Database;

pub struct UserRegistry {
    db: Arc<dyn Database>,
}

impl UserRegistry {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Validate, hash the password, then insert the user and address together.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<StoredUser, Error> {
        let signup = request.validate()?;
        let password_hash = hash_password_blocking(signup.password).await?;

        let stored = self
            .db
            .create_user(&NewUser {
                email: signup.email,
                password_hash,
                about_me: signup.about_me,
                birthday: signup.birthday,
                address: signup.address,
            })
            .await?;

        info!(user_id = %stored.id, "User created");
        Ok(stored)
    }

    /// Every user that has an address, oldest first.
    pub async fn list_data(&self) -> Result<Vec<UserDataRow>, Error> {
        Ok(self.db.list_user_data().await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, Error> {
        Ok(self.db.get_user_by_email(email).await?)
    }
}
