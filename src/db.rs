use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::session::Session;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Where sessions live between interactions. The process never keeps a
/// session in globals; every handler loads it from here and saves it back.
pub enum SessionStore {
    Memory(Mutex<HashMap<Uuid, Session>>),
    Postgres(PgPool),
}

impl SessionStore {
    pub fn memory() -> Self {
        SessionStore::Memory(Mutex::new(HashMap::new()))
    }

    pub async fn load(&self, id: Uuid) -> anyhow::Result<Option<Session>> {
        match self {
            SessionStore::Memory(sessions) => {
                let sessions = sessions
                    .lock()
                    .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
                Ok(sessions.get(&id).cloned())
            }
            SessionStore::Postgres(pool) => {
                let row = sqlx::query("SELECT state FROM baqa.sessions WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;

                match row {
                    Some(row) => {
                        let state: String = row.get("state");
                        let session = serde_json::from_str(&state)
                            .with_context(|| format!("corrupt session {id}"))?;
                        Ok(Some(session))
                    }
                    None => Ok(None),
                }
            }
        }
    }

    pub async fn save(&self, session: &Session) -> anyhow::Result<()> {
        match self {
            SessionStore::Memory(sessions) => {
                let mut sessions = sessions
                    .lock()
                    .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
                sessions.insert(session.id, session.clone());
            }
            SessionStore::Postgres(pool) => {
                let state = serde_json::to_string(session)?;
                sqlx::query(
                    r#"
                    INSERT INTO baqa.sessions (id, state, updated_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT (id) DO UPDATE
                    SET state = EXCLUDED.state, updated_at = NOW()
                    "#,
                )
                .bind(session.id)
                .bind(state)
                .execute(pool)
                .await?;
            }
        }
        Ok(())
    }

    /// Loads the session with `id`, or starts a fresh one under that id.
    pub async fn load_or_new(&self, id: Option<Uuid>) -> anyhow::Result<Session> {
        let Some(id) = id else {
            return Ok(Session::default());
        };
        match self.load(id).await? {
            Some(session) => {
                tracing::info!(session = %id, "resumed session");
                Ok(session)
            }
            None => Ok(Session::new(id)),
        }
    }
}
