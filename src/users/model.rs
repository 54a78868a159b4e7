//! User and address models, plus validation of signup submissions.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::ValidationError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Local part: dot-separated atoms, so no leading, trailing or doubled dots.
    Regex::new(concat!(
        r"^[A-Za-z0-9_%+\-']+(?:\.[A-Za-z0-9_%+\-']+)*",
        r"@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?",
        r"(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$",
    ))
    .expect("email regex is valid")
});

/// Length of a valid zip code, in characters.
pub const ZIP_CODE_LEN: usize = 5;

/// Postal address owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl Address {
    fn validate(&self) -> Result<(), ValidationError> {
        require("address.street", &self.street)?;
        require("address.city", &self.city)?;
        require("address.state", &self.state)?;
        if self.zip_code.chars().count() != ZIP_CODE_LEN {
            return Err(ValidationError::InvalidZipCode);
        }
        Ok(())
    }
}

/// The answers collected by the dynamic pages of the signup flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicAnswers {
    pub about_me: String,
    /// ISO 8601 datetime string.
    pub birthday: String,
    pub address: Address,
}

/// Body of `POST /users`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(serialize_with = "expose_secret", deserialize_with = "secret_from_string")]
    pub password: SecretString,
    pub dynamic: DynamicAnswers,
}

fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn secret_from_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// A signup request that passed validation, password still in plain text.
#[derive(Debug)]
pub struct ValidatedSignup {
    pub email: String,
    pub password: SecretString,
    pub about_me: String,
    pub birthday: DateTime<Utc>,
    pub address: Address,
}

impl CreateUserRequest {
    /// Check every field rule; nothing is persisted on failure.
    pub fn validate(self) -> Result<ValidatedSignup, ValidationError> {
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email));
        }
        let email = self.email;
        require("aboutMe", &self.dynamic.about_me)?;
        let birthday = parse_birthday(&self.dynamic.birthday)?;
        self.dynamic.address.validate()?;

        Ok(ValidatedSignup {
            email,
            password: self.password,
            about_me: self.dynamic.about_me,
            birthday,
            address: self.dynamic.address,
        })
    }
}

/// A user row ready for insertion, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub about_me: String,
    pub birthday: DateTime<Utc>,
    pub address: Address,
}

/// A persisted user.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub about_me: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `GET /data`: a user joined with their address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataRow {
    pub email: String,
    pub about_me: String,
    pub birthday: String,
    pub address: Address,
}

/// Whether `email` looks like a deliverable address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Format a timestamp the way API responses carry it (`2024-01-31T00:00:00.000Z`).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_birthday(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| ValidationError::InvalidBirthday(format!("{raw}: {e}")))
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}
