//! User identity for the Haven relay.
//!
//! Users register with nothing but a display name. A unique username handle
//! is derived from it (lowercased, spaces to underscores, numeric suffix on
//! collision), and authentication uses opaque bearer tokens. There are no
//! passwords — the token issued at registration or login is the credential.

use haven_types::{Voice, VoiceParseError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("stored voice preference is invalid: {0}")]
    StoredVoice(#[from] VoiceParseError),
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    /// Unique handle derived from the display name.
    pub username: String,
    /// The display name the user registered with.
    pub full_name: String,
    /// Preferred synthesis voice for assistant replies.
    pub voice_preference: Voice,
    /// Whether the user has consented to conversation persistence.
    pub consent: bool,
    /// Registration timestamp (ISO 8601).
    pub created_at: String,
}

/// Fields that can be changed through the profile endpoint.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileUpdate {
    pub voice_preference: Option<Voice>,
    pub consent: Option<bool>,
}

fn map_row_to_user(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, bool, String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn user_from_tuple(
    (id, username, full_name, voice, consent, created_at): (i64, String, String, String, bool, String),
) -> Result<User, IdentityError> {
    Ok(User {
        id,
        username,
        full_name,
        voice_preference: voice.parse()?,
        consent,
        created_at,
    })
}

const USER_COLUMNS: &str = "id, username, full_name, voice_preference, consent, created_at";

/// Derives the base handle from a display name: lowercased, spaces replaced
/// with underscores. Collision suffixes are appended by [`register_user`].
fn base_handle(full_name: &str) -> String {
    full_name.to_lowercase().replace(' ', "_")
}

/// Registers a new user from a display name and issues a bearer token.
///
/// The username handle is derived from the display name; on collision a
/// numeric suffix (`_2`, `_3`, …) is tried until the insert succeeds. The
/// insert itself is the uniqueness check, so concurrent registrations of
/// the same display name cannot race their way into a duplicate handle.
/// Consent is granted implicitly by registering.
///
/// # Errors
///
/// Returns `IdentityError::EmptyDisplayName` if the trimmed name is empty.
pub fn register_user(conn: &Connection, full_name: &str) -> Result<(User, String), IdentityError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(IdentityError::EmptyDisplayName);
    }

    let base = base_handle(full_name);
    let mut counter = 1u32;

    let id = loop {
        let candidate = if counter == 1 {
            base.clone()
        } else {
            format!("{base}_{counter}")
        };

        let inserted = conn.execute(
            "INSERT INTO users (username, full_name, consent) VALUES (?1, ?2, 1)",
            params![candidate, full_name],
        );

        match inserted {
            Ok(_) => break conn.last_insert_rowid(),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                counter += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    let user = user_by_id(conn, id)?.ok_or_else(|| IdentityError::NotFound(full_name.into()))?;
    let token = issue_token(conn, user.id)?;
    tracing::info!(user_id = user.id, username = %user.username, "registered user");
    Ok((user, token))
}

/// Looks up a user by display name and issues (or reuses) a bearer token.
///
/// # Errors
///
/// Returns `IdentityError::NotFound` if no user has registered that name.
pub fn login_user(conn: &Connection, full_name: &str) -> Result<(User, String), IdentityError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(IdentityError::EmptyDisplayName);
    }

    let tuple = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE full_name = ?1 ORDER BY id LIMIT 1"),
            [full_name],
            map_row_to_user,
        )
        .optional()?
        .ok_or_else(|| IdentityError::NotFound(full_name.to_string()))?;
    let user = user_from_tuple(tuple)?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT token FROM auth_tokens WHERE user_id = ?1 ORDER BY created_at LIMIT 1",
            [user.id],
            |row| row.get(0),
        )
        .optional()?;

    let token = match existing {
        Some(t) => t,
        None => issue_token(conn, user.id)?,
    };

    Ok((user, token))
}

/// Resolves a bearer token to its user, or `None` if the token is unknown.
pub fn user_by_token(conn: &Connection, token: &str) -> Result<Option<User>, IdentityError> {
    let tuple = conn
        .query_row(
            "SELECT u.id, u.username, u.full_name, u.voice_preference, u.consent, u.created_at
             FROM users u JOIN auth_tokens t ON t.user_id = u.id
             WHERE t.token = ?1",
            [token],
            map_row_to_user,
        )
        .optional()?;
    tuple.map(user_from_tuple).transpose()
}

/// Fetches a user by database id.
pub fn user_by_id(conn: &Connection, id: i64) -> Result<Option<User>, IdentityError> {
    let tuple = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            map_row_to_user,
        )
        .optional()?;
    tuple.map(user_from_tuple).transpose()
}

/// Applies a partial profile update and returns the fresh record.
///
/// Uses a single UPDATE with COALESCE semantics so a concurrent update to
/// the other field is never clobbered by a stale read-modify-write.
pub fn update_profile(
    conn: &Connection,
    user_id: i64,
    update: ProfileUpdate,
) -> Result<User, IdentityError> {
    conn.execute(
        "UPDATE users SET
            voice_preference = COALESCE(?1, voice_preference),
            consent = COALESCE(?2, consent)
         WHERE id = ?3",
        params![
            update.voice_preference.map(|v| v.as_str()),
            update.consent,
            user_id
        ],
    )?;

    user_by_id(conn, user_id)?.ok_or_else(|| IdentityError::NotFound(user_id.to_string()))
}

/// Issues a fresh opaque bearer token for a user.
fn issue_token(conn: &Connection, user_id: i64) -> Result<String, IdentityError> {
    let token = Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO auth_tokens (token, user_id) VALUES (?1, ?2)",
        params![token, user_id],
    )?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_db::{create_pool, run_migrations, DbRuntimeSettings};

    // A single pooled connection: every pooled connection to ":memory:"
    // would otherwise open its own private database.
    fn test_conn() -> haven_db::DbPool {
        let settings = DbRuntimeSettings {
            pool_max_size: 1,
            ..Default::default()
        };
        let pool = create_pool(":memory:", settings).expect("pool");
        run_migrations(&pool.get().expect("conn")).expect("migrations");
        pool
    }

    #[test]
    fn register_derives_handle() {
        let pool = test_conn();
        let conn = pool.get().unwrap();

        let (user, token) = register_user(&conn, "Ada Obi").expect("register");
        assert_eq!(user.username, "ada_obi");
        assert_eq!(user.full_name, "Ada Obi");
        assert_eq!(user.voice_preference, Voice::Chinenye);
        assert!(user.consent, "registration grants consent implicitly");
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn register_suffixes_on_collision() {
        let pool = test_conn();
        let conn = pool.get().unwrap();

        let (first, _) = register_user(&conn, "Ada Obi").unwrap();
        let (second, _) = register_user(&conn, "Ada Obi").unwrap();
        let (third, _) = register_user(&conn, "ada obi").unwrap();

        assert_eq!(first.username, "ada_obi");
        assert_eq!(second.username, "ada_obi_2");
        assert_eq!(third.username, "ada_obi_3");
    }

    #[test]
    fn register_rejects_empty_name() {
        let pool = test_conn();
        let conn = pool.get().unwrap();
        assert!(matches!(
            register_user(&conn, "   "),
            Err(IdentityError::EmptyDisplayName)
        ));
    }

    #[test]
    fn login_reuses_token() {
        let pool = test_conn();
        let conn = pool.get().unwrap();

        let (user, token) = register_user(&conn, "Tunde Bello").unwrap();
        let (logged_in, login_token) = login_user(&conn, "Tunde Bello").unwrap();

        assert_eq!(logged_in.id, user.id);
        assert_eq!(login_token, token);
    }

    #[test]
    fn login_unknown_name_fails() {
        let pool = test_conn();
        let conn = pool.get().unwrap();
        assert!(matches!(
            login_user(&conn, "Nobody Here"),
            Err(IdentityError::NotFound(_))
        ));
    }

    #[test]
    fn token_resolves_user() {
        let pool = test_conn();
        let conn = pool.get().unwrap();

        let (user, token) = register_user(&conn, "Chi Chi").unwrap();

        let found = user_by_token(&conn, &token).unwrap();
        assert_eq!(found, Some(user));

        let missing = user_by_token(&conn, "not-a-token").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn partial_profile_update() {
        let pool = test_conn();
        let conn = pool.get().unwrap();

        let (user, _) = register_user(&conn, "Funmi A").unwrap();

        let updated = update_profile(
            &conn,
            user.id,
            ProfileUpdate {
                voice_preference: Some(Voice::Emma),
                consent: None,
            },
        )
        .unwrap();
        assert_eq!(updated.voice_preference, Voice::Emma);
        assert!(updated.consent, "untouched field keeps its value");

        let updated = update_profile(
            &conn,
            user.id,
            ProfileUpdate {
                voice_preference: None,
                consent: Some(false),
            },
        )
        .unwrap();
        assert_eq!(updated.voice_preference, Voice::Emma);
        assert!(!updated.consent);
    }
}
