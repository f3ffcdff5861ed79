use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;
use crate::error::{DiscoveryError, Result};
use crate::models::session::SessionState;

/// Random v4 id; it is the only thing guarding a session's credential.
pub type SessionId = Uuid;

struct SessionEntry {
    state: SessionState,
    last_seen: Instant,
}

/// In-memory owner of every live discovery session.
///
/// The lock is only ever held for synchronous state transitions, never while
/// a provider request is outstanding. Sessions untouched for longer than the
/// idle timeout are dropped.
pub struct SessionRepo {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    default_credential: Option<String>,
    idle_timeout: Duration,
}

impl SessionRepo {
    /// `default_credential` is handed to sessions that start without one of
    /// their own, standing in for a previously saved key.
    pub fn new(
        default_credential: Option<String>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            default_credential,
            idle_timeout,
        }
    }

    pub async fn create_session(
        &self,
        credential: Option<&str>,
    ) -> Result<(SessionId, SessionState)> {
        let session = match credential.or(self.default_credential.as_deref()) {
            Some(credential) => SessionState::with_credential(credential)?,
            None => SessionState::new(),
        };

        let session_id = Uuid::new_v4();
        let mut sessions = self.sessions.lock().await;
        self.evict_idle(&mut sessions);
        sessions.insert(session_id, SessionEntry { state: session.clone(), last_seen: Instant::now() });
        info!("Opened discovery session {}", session_id);

        Ok((session_id, session))
    }

    /// Runs `f` against the session while holding the registry lock.
    pub async fn with_session<T>(
        &self,
        session_id: SessionId,
        f: impl FnOnce(&mut SessionState) -> T,
    ) -> Result<T> {
        let mut sessions = self.sessions.lock().await;
        self.evict_idle(&mut sessions);
        let entry = sessions
            .get_mut(&session_id)
            .ok_or_else(|| DiscoveryError::NotFound(format!("session {} does not exist", session_id)))?;
        entry.last_seen = Instant::now();

        Ok(f(&mut entry.state))
    }

    pub async fn remove_session(
        &self,
        session_id: SessionId,
    ) -> Result<()> {
        match self.sessions.lock().await.remove(&session_id) {
            Some(_) => {
                debug!("Closed discovery session {}", session_id);
                Ok(())
            }
            None => Err(DiscoveryError::NotFound(format!("session {} does not exist", session_id))),
        }
    }

    fn evict_idle(&self, sessions: &mut HashMap<SessionId, SessionEntry>) {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < self.idle_timeout);

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Expired {} idle discovery sessions", evicted);
        }
    }
}
