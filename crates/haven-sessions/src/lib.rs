//! Conversation session and message persistence.
//!
//! A session groups one user's messages across turns; the active session is
//! the most recently updated one, and sessions are never explicitly closed.
//! Messages are role-tagged utterances with optional audio blobs, ordered by
//! creation time within their session.
//!
//! Session selection uses an atomic find-or-create: the "create if none
//! exists" INSERT carries its own existence check, so two concurrent first
//! turns by the same user are serialized by SQLite's single-writer lock and
//! end up sharing one session instead of racing a SELECT-then-INSERT pair.

use haven_types::{Role, RoleParseError, Voice, VoiceParseError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during session store operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("session not found: {0}")]
    NotFound(i64),
    #[error("stored role is invalid: {0}")]
    StoredRole(#[from] RoleParseError),
    #[error("stored voice is invalid: {0}")]
    StoredVoice(#[from] VoiceParseError),
}

/// A conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub title: String,
    /// Creation timestamp (ISO 8601).
    pub started_at: String,
    /// Last-activity timestamp (ISO 8601), bumped on every append.
    pub updated_at: String,
}

/// A persisted message. The audio blob is included; callers listing large
/// histories should use [`session_messages`] sparingly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub session_id: i64,
    pub user_id: Option<i64>,
    pub role: Role,
    pub text: String,
    pub audio: Option<Vec<u8>>,
    pub audio_media_type: Option<String>,
    pub voice_used: Option<Voice>,
    pub created_at: String,
}

/// Parameters for appending a message to a session.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub user_id: Option<i64>,
    pub text: String,
    pub audio: Option<Vec<u8>>,
    pub audio_media_type: Option<String>,
    pub voice_used: Option<Voice>,
}

fn map_row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        started_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

const SESSION_COLUMNS: &str = "id, user_id, title, started_at, updated_at";

/// Returns the user's most recently active session, creating one if none
/// exists.
///
/// The INSERT carries its own `WHERE NOT EXISTS` guard and SQLite serializes
/// writers, so concurrent callers cannot both create a session once one is
/// visible. See the crate docs for the race discussion.
pub fn find_or_create_active_session(
    conn: &Connection,
    user_id: i64,
) -> Result<Session, SessionError> {
    let created = conn.execute(
        "INSERT INTO sessions (user_id)
         SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM sessions WHERE user_id = ?1)",
        [user_id],
    )?;
    if created > 0 {
        tracing::debug!(user_id, "created first session for user");
    }

    let session = conn
        .query_row(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE user_id = ?1
                 ORDER BY updated_at DESC, id DESC
                 LIMIT 1"
            ),
            [user_id],
            map_row_to_session,
        )
        .optional()?
        .ok_or(SessionError::NotFound(user_id))?;

    Ok(session)
}

/// Appends a message to a session and bumps the session's last-activity
/// timestamp. Returns the new message id.
pub fn append_message(
    conn: &Connection,
    session_id: i64,
    role: Role,
    message: &NewMessage,
) -> Result<i64, SessionError> {
    conn.execute(
        "INSERT INTO messages (session_id, user_id, role, text, audio, audio_media_type, voice_used)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            session_id,
            message.user_id,
            role.as_str(),
            message.text,
            message.audio,
            message.audio_media_type,
            message.voice_used.map(|v| v.as_str()),
        ],
    )?;
    let id = conn.last_insert_rowid();

    conn.execute(
        "UPDATE sessions SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?1",
        [session_id],
    )?;

    Ok(id)
}

/// Lists a user's sessions newest-first, capped at `limit`.
pub fn list_sessions(
    conn: &Connection,
    user_id: i64,
    limit: u32,
) -> Result<Vec<Session>, SessionError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions
         WHERE user_id = ?1
         ORDER BY updated_at DESC, id DESC
         LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![user_id, limit], map_row_to_session)?;
    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row?);
    }
    Ok(sessions)
}

/// Returns all messages in a session, ordered by creation time.
pub fn session_messages(conn: &Connection, session_id: i64) -> Result<Vec<Message>, SessionError> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, user_id, role, text, audio, audio_media_type, voice_used, created_at
         FROM messages
         WHERE session_id = ?1
         ORDER BY created_at, id",
    )?;

    let rows = stmt.query_map([session_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, Option<i64>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<Vec<u8>>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut messages = Vec::new();
    for row in rows {
        let (id, session_id, user_id, role, text, audio, audio_media_type, voice, created_at) =
            row?;
        messages.push(Message {
            id,
            session_id,
            user_id,
            role: Role::from_str_label(&role)?,
            text,
            audio,
            audio_media_type,
            voice_used: voice.map(|v| v.parse()).transpose()?,
            created_at,
        });
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_db::{create_pool, run_migrations, DbRuntimeSettings, DbPool};
    use haven_identity::register_user;

    // A single pooled connection: every pooled connection to ":memory:"
    // would otherwise open its own private database.
    fn test_pool() -> DbPool {
        let settings = DbRuntimeSettings {
            pool_max_size: 1,
            ..Default::default()
        };
        let pool = create_pool(":memory:", settings).expect("pool");
        run_migrations(&pool.get().expect("conn")).expect("migrations");
        pool
    }

    fn seed_user(conn: &Connection) -> i64 {
        register_user(conn, "Test User").expect("user").0.id
    }

    #[test]
    fn creates_then_reuses_session() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user_id = seed_user(&conn);

        let first = find_or_create_active_session(&conn, user_id).unwrap();
        let second = find_or_create_active_session(&conn, user_id).unwrap();
        assert_eq!(first.id, second.id, "existing session must be reused");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn append_bumps_last_activity() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user_id = seed_user(&conn);

        let session = find_or_create_active_session(&conn, user_id).unwrap();

        // strftime has millisecond resolution; a short sleep keeps the bump
        // observable.
        std::thread::sleep(std::time::Duration::from_millis(5));

        append_message(
            &conn,
            session.id,
            Role::User,
            &NewMessage {
                user_id: Some(user_id),
                text: "hello".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let refreshed = find_or_create_active_session(&conn, user_id).unwrap();
        assert_eq!(refreshed.id, session.id);
        assert!(
            refreshed.updated_at > session.updated_at,
            "append must bump updated_at ({} vs {})",
            refreshed.updated_at,
            session.updated_at
        );
    }

    #[test]
    fn messages_keep_creation_order() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user_id = seed_user(&conn);
        let session = find_or_create_active_session(&conn, user_id).unwrap();

        for (role, text) in [
            (Role::User, "first"),
            (Role::Assistant, "second"),
            (Role::User, "third"),
        ] {
            append_message(
                &conn,
                session.id,
                role,
                &NewMessage {
                    user_id: Some(user_id),
                    text: text.into(),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        let messages = session_messages(&conn, session.id).unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn audio_and_voice_round_trip() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user_id = seed_user(&conn);
        let session = find_or_create_active_session(&conn, user_id).unwrap();

        append_message(
            &conn,
            session.id,
            Role::Assistant,
            &NewMessage {
                user_id: Some(user_id),
                text: "spoken reply".into(),
                audio: Some(vec![1, 2, 3, 4]),
                audio_media_type: Some("audio/mpeg".into()),
                voice_used: Some(Voice::Emma),
            },
        )
        .unwrap();

        let messages = session_messages(&conn, session.id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].audio.as_deref(), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(messages[0].audio_media_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(messages[0].voice_used, Some(Voice::Emma));
    }

    #[test]
    fn list_is_newest_first_and_capped() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user_id = seed_user(&conn);

        // Create a dozen sessions directly; only the listing cap is under test.
        for i in 0..12 {
            conn.execute(
                "INSERT INTO sessions (user_id, title, updated_at)
                 VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?3))",
                params![user_id, format!("s{i}"), format!("-{} seconds", 12 - i)],
            )
            .unwrap();
        }

        let sessions = list_sessions(&conn, user_id, 10).unwrap();
        assert_eq!(sessions.len(), 10);
        assert_eq!(sessions[0].title, "s11", "newest first");
        assert_eq!(sessions[9].title, "s2");
    }

    #[test]
    fn sessions_are_per_user() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user_a = seed_user(&conn);
        let (user_b, _) = register_user(&conn, "Other User").unwrap();

        let a = find_or_create_active_session(&conn, user_a).unwrap();
        let b = find_or_create_active_session(&conn, user_b.id).unwrap();
        assert_ne!(a.id, b.id);

        assert_eq!(list_sessions(&conn, user_a, 10).unwrap().len(), 1);
        assert_eq!(list_sessions(&conn, user_b.id, 10).unwrap().len(), 1);
    }
}
