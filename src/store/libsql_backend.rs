//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. All statements run on one
//! connection behind an async mutex, so a transaction in progress is never
//! interleaved with (or observed by) another request.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::forms::Component;
use crate::onboarding::model::OnboardingPage;
use crate::store::migrations;
use crate::store::traits::Database;
use crate::users::model::{Address, NewUser, StoredUser, UserDataRow, format_timestamp};

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Mutex<Connection>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db).await?;
        backend.init_schema().await?;
        Ok(backend)
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to enable foreign keys: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            conn: Mutex::new(conn),
        })
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

/// Map a libsql Row to an OnboardingPage.
///
/// Column order: 0:page_index, 1:components
fn row_to_page(row: &libsql::Row) -> Result<OnboardingPage, DatabaseError> {
    let index: i64 = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("page row parse: {e}")))?;
    let components_json: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("page row parse: {e}")))?;

    let index = u32::try_from(index)
        .map_err(|_| DatabaseError::Serialization(format!("page index {index} out of range")))?;
    let components: Vec<Component> = serde_json::from_str(&components_json).map_err(|e| {
        DatabaseError::Serialization(format!("page {index} components: {e}"))
    })?;

    Ok(OnboardingPage { index, components })
}

/// Map a libsql Row to a StoredUser.
///
/// Column order matches USER_COLUMNS.
fn row_to_user(row: &libsql::Row) -> Result<StoredUser, libsql::Error> {
    let id_str: String = row.get(0)?;
    let birthday_str: Option<String> = row.get(4).ok();
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;

    Ok(StoredUser {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        email: row.get(1)?,
        password_hash: row.get(2)?,
        about_me: row.get(3).ok(),
        birthday: parse_optional_datetime(&birthday_str),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

/// Map a joined user/address row to the `GET /data` shape.
fn row_to_user_data(row: &libsql::Row) -> Result<UserDataRow, libsql::Error> {
    let birthday_str: Option<String> = row.get(2).ok();

    Ok(UserDataRow {
        email: row.get(0)?,
        about_me: row.get::<String>(1).unwrap_or_default(),
        birthday: parse_optional_datetime(&birthday_str)
            .map(|d| format_timestamp(&d))
            .unwrap_or_default(),
        address: Address {
            street: row.get(3)?,
            city: row.get(4)?,
            state: row.get(5)?,
            zip_code: row.get(6)?,
        },
    })
}

async fn count(
    conn: &Connection,
    sql: &str,
    args: Vec<libsql::Value>,
) -> Result<u64, DatabaseError> {
    let mut rows = conn
        .query(sql, args)
        .await
        .map_err(|e| DatabaseError::Query(format!("count: {e}")))?;
    match rows.next().await {
        Ok(Some(row)) => {
            let n: i64 = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("count row parse: {e}")))?;
            Ok(n.max(0) as u64)
        }
        Ok(None) => Ok(0),
        Err(e) => Err(DatabaseError::Query(format!("count: {e}"))),
    }
}

/// Delete-all then insert, run inside the caller's transaction.
async fn write_pages(conn: &Connection, rows: &[(u32, String)]) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM onboarding_pages", ())
        .await
        .map_err(|e| DatabaseError::from_libsql("replace_pages delete", e))?;

    let now = Utc::now().to_rfc3339();
    for (index, components) in rows {
        conn.execute(
            "INSERT INTO onboarding_pages (id, page_index, components, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                i64::from(*index),
                components.as_str(),
                now.as_str(),
                now.as_str(),
            ],
        )
        .await
        .map_err(|e| DatabaseError::from_libsql("replace_pages insert", e))?;
    }
    Ok(())
}

/// Insert the user row and its address row, inside the caller's transaction.
async fn write_user(conn: &Connection, user: &NewUser) -> Result<StoredUser, DatabaseError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let now_str = now.to_rfc3339();

    conn.execute(
        "INSERT INTO users (id, email, password, about_me, birthday, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id.to_string(),
            user.email.as_str(),
            user.password_hash.as_str(),
            user.about_me.as_str(),
            user.birthday.to_rfc3339(),
            now_str.as_str(),
            now_str.as_str(),
        ],
    )
    .await
    .map_err(|e| DatabaseError::from_libsql("create_user", e))?;

    conn.execute(
        "INSERT INTO user_addresses (id, user_id, street, city, state, zip_code, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            Uuid::new_v4().to_string(),
            id.to_string(),
            user.address.street.as_str(),
            user.address.city.as_str(),
            user.address.state.as_str(),
            user.address.zip_code.as_str(),
            now_str.as_str(),
            now_str.as_str(),
        ],
    )
    .await
    .map_err(|e| DatabaseError::from_libsql("create_user address", e))?;

    Ok(StoredUser {
        id,
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        about_me: Some(user.about_me.clone()),
        birthday: Some(user.birthday),
        created_at: now,
        updated_at: now,
    })
}

// ── Trait implementation ────────────────────────────────────────────

const USER_COLUMNS: &str = "id, email, password, about_me, birthday, created_at, updated_at";

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.conn.lock().await;
        migrations::run_migrations(&conn).await
    }

    // ── Onboarding pages ────────────────────────────────────────────

    async fn count_pages(&self) -> Result<u64, DatabaseError> {
        let conn = self.conn.lock().await;
        count(&conn, "SELECT COUNT(*) FROM onboarding_pages", Vec::new()).await
    }

    async fn get_pages(&self) -> Result<Vec<OnboardingPage>, DatabaseError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT page_index, components FROM onboarding_pages ORDER BY page_index ASC",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_pages: {e}")))?;

        let mut pages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_pages: {e}")))?
        {
            pages.push(row_to_page(&row)?);
        }
        Ok(pages)
    }

    async fn replace_pages(&self, pages: &[OnboardingPage]) -> Result<(), DatabaseError> {
        let rows = pages
            .iter()
            .map(|p| serde_json::to_string(&p.components).map(|json| (p.index, json)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::Serialization(format!("page components: {e}")))?;

        let conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("replace_pages begin: {e}")))?;

        match write_pages(&tx, &rows).await {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|e| DatabaseError::Query(format!("replace_pages commit: {e}")))?;
                debug!(pages = rows.len(), "Onboarding pages replaced in DB");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "replace_pages rollback failed");
                }
                Err(e)
            }
        }
    }

    // ── Users ───────────────────────────────────────────────────────

    async fn create_user(&self, user: &NewUser) -> Result<StoredUser, DatabaseError> {
        let conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("create_user begin: {e}")))?;

        match write_user(&tx, user).await {
            Ok(stored) => {
                tx.commit()
                    .await
                    .map_err(|e| DatabaseError::Query(format!("create_user commit: {e}")))?;
                debug!(user_id = %stored.id, "User and address inserted into DB");
                Ok(stored)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "create_user rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user_by_email: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let user = row_to_user(&row).map_err(|e| {
                    DatabaseError::Query(format!("get_user_by_email row parse: {e}"))
                })?;
                Ok(Some(user))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_user_by_email: {e}"))),
        }
    }

    async fn list_user_data(&self) -> Result<Vec<UserDataRow>, DatabaseError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT u.email, u.about_me, u.birthday, a.street, a.city, a.state, a.zip_code
                 FROM users u
                 INNER JOIN user_addresses a ON u.id = a.user_id
                 ORDER BY u.created_at ASC, u.email ASC",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_user_data: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_user_data: {e}")))?
        {
            let data = row_to_user_data(&row)
                .map_err(|e| DatabaseError::Query(format!("list_user_data row parse: {e}")))?;
            out.push(data);
        }
        Ok(out)
    }
}

#[cfg(test)]
impl LibSqlBackend {
    /// Number of persisted addresses belonging to `email`'s user.
    pub(crate) async fn count_addresses_for(&self, email: &str) -> Result<u64, DatabaseError> {
        let conn = self.conn.lock().await;
        count(
            &conn,
            "SELECT COUNT(*) FROM user_addresses a
             INNER JOIN users u ON u.id = a.user_id
             WHERE u.email = ?1",
            vec![libsql::Value::Text(email.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::forms::FieldKind;
    use crate::onboarding::model::default_pages;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn page(index: u32, keys: &[&str]) -> OnboardingPage {
        OnboardingPage::new(
            index,
            keys.iter()
                .map(|k| Component::field(*k, *k, FieldKind::Text))
                .collect(),
        )
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            about_me: "About".to_string(),
            birthday: Utc.with_ymd_and_hms(1990, 1, 2, 0, 0, 0).unwrap(),
            address: Address {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip_code: "62701".to_string(),
            },
        }
    }

    // ── Page tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn empty_store_has_no_pages() {
        let db = test_db().await;
        assert_eq!(db.count_pages().await.unwrap(), 0);
        assert!(db.get_pages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_then_get_sorted() {
        let db = test_db().await;
        let pages = vec![page(3, &["c"]), page(0, &["a", "b"])];
        db.replace_pages(&pages).await.unwrap();

        let fetched = db.get_pages().await.unwrap();
        assert_eq!(fetched, vec![page(0, &["a", "b"]), page(3, &["c"])]);
        assert_eq!(db.count_pages().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn replace_discards_previous_set() {
        let db = test_db().await;
        db.replace_pages(&default_pages()).await.unwrap();
        db.replace_pages(&[page(7, &["only"])]).await.unwrap();

        let fetched = db.get_pages().await.unwrap();
        assert_eq!(fetched, vec![page(7, &["only"])]);
    }

    #[tokio::test]
    async fn nested_components_round_trip() {
        let db = test_db().await;
        db.replace_pages(&default_pages()).await.unwrap();
        assert_eq!(db.get_pages().await.unwrap(), default_pages());
    }

    #[tokio::test]
    async fn failed_replace_keeps_prior_pages() {
        let db = test_db().await;
        db.replace_pages(&default_pages()).await.unwrap();

        // Duplicate index violates the unique constraint on the second insert,
        // after the delete already ran.
        let err = db
            .replace_pages(&[page(0, &["a"]), page(0, &["b"])])
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));

        assert_eq!(db.get_pages().await.unwrap(), default_pages());
    }

    // ── User tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn create_and_lookup_user() {
        let db = test_db().await;
        let stored = db.create_user(&new_user("a@example.com")).await.unwrap();

        let fetched = db.get_user_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.password_hash, "$argon2id$stub");
        assert_eq!(fetched.about_me.as_deref(), Some("About"));
        assert_eq!(fetched.birthday, Some(Utc.with_ymd_and_hms(1990, 1, 2, 0, 0, 0).unwrap()));
        assert_eq!(db.count_addresses_for("a@example.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lookup_missing_user() {
        let db = test_db().await;
        assert!(db.get_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_constraint_error() {
        let db = test_db().await;
        db.create_user(&new_user("dup@example.com")).await.unwrap();

        let err = db.create_user(&new_user("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateEmail(_)));

        assert_eq!(db.count_addresses_for("dup@example.com").await.unwrap(), 1);
        assert_eq!(db.list_user_data().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_address_insert_rolls_back_user() {
        let db = test_db().await;
        {
            let conn = db.conn.lock().await;
            conn.execute(
                "CREATE TRIGGER reject_addresses BEFORE INSERT ON user_addresses
                 BEGIN SELECT RAISE(ABORT, 'address rejected'); END;",
                (),
            )
            .await
            .unwrap();
        }

        // The user row is written before the address insert fails.
        let err = db.create_user(&new_user("half@example.com")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Query(ref msg) if msg.contains("address rejected")));

        assert!(db.get_user_by_email("half@example.com").await.unwrap().is_none());
        assert_eq!(db.count_addresses_for("half@example.com").await.unwrap(), 0);

        // The connection is usable again once the trigger is gone.
        {
            let conn = db.conn.lock().await;
            conn.execute("DROP TRIGGER reject_addresses", ()).await.unwrap();
        }
        db.create_user(&new_user("half@example.com")).await.unwrap();
        assert_eq!(db.count_addresses_for("half@example.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_user_data_joins_address() {
        let db = test_db().await;
        db.create_user(&new_user("a@example.com")).await.unwrap();

        let rows = db.list_user_data().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "a@example.com");
        assert_eq!(rows[0].about_me, "About");
        assert_eq!(rows[0].birthday, "1990-01-02T00:00:00.000Z");
        assert_eq!(rows[0].address.zip_code, "62701");
    }

    #[tokio::test]
    async fn users_without_address_are_omitted() {
        let db = test_db().await;
        db.create_user(&new_user("a@example.com")).await.unwrap();
        {
            let conn = db.conn.lock().await;
            conn.execute(
                "INSERT INTO users (id, email, password, created_at, updated_at) VALUES ('orphan', 'orphan@example.com', 'x', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
                (),
            )
            .await
            .unwrap();
        }

        let rows = db.list_user_data().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "a@example.com");
    }

    #[tokio::test]
    async fn address_requires_existing_user() {
        let db = test_db().await;
        let conn = db.conn.lock().await;
        let result = conn
            .execute(
                "INSERT INTO user_addresses (id, user_id, street, city, state, zip_code, created_at, updated_at) VALUES ('a', 'missing', 's', 'c', 'st', '12345', 'now', 'now')",
                (),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn new_local_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("dir").join("test.db");
        let db = LibSqlBackend::new_local(&db_path).await.unwrap();
        db.replace_pages(&default_pages()).await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn new_local_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("onboarding.db");
        {
            let db = LibSqlBackend::new_local(&db_path).await.unwrap();
            db.replace_pages(&default_pages()).await.unwrap();
        }
        let db = LibSqlBackend::new_local(&db_path).await.unwrap();
        assert_eq!(db.get_pages().await.unwrap(), default_pages());
    }
}
