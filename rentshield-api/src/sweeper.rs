//! Periodic removal of expired sessions
//!
//! Expired sessions are already never resolved; the sweep only keeps the
//! session table from growing.

use rentshield_shared::services::sessions::SessionManager;
use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Spawns the sweep loop; it stops when `shutdown` is cancelled
pub fn spawn_session_sweeper(
    sessions: SessionManager,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match sessions.sweep_expired().await {
                        Ok(removed) if removed > 0 => {
                            tracing::info!(removed, "Removed expired sessions");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use rentshield_shared::{
        models::{session::CreateSession, user::UserRole},
        store::{memory::MemoryStore, SessionStore, SharedStore},
    };
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops_on_cancel() {
        let memory = Arc::new(MemoryStore::new());
        memory
            .insert_session(CreateSession {
                user_id: Uuid::new_v4(),
                role: UserRole::Tenant,
                token_hash: "a".repeat(64),
                expires_at: Utc::now() - ChronoDuration::hours(1),
            })
            .await
            .unwrap();

        let store: SharedStore = memory.clone();
        let shutdown = CancellationToken::new();
        let handle = spawn_session_sweeper(
            SessionManager::new(store),
            Duration::from_millis(10),
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let leftover = memory.delete_expired_sessions(Utc::now()).await.unwrap();
        assert_eq!(leftover, 0);
    }
}
