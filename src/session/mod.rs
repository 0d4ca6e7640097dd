use std::sync::Arc;

use chrono::Utc;
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::auth::model::Role;

/// Name of the cookie holding the opaque session id.
pub const SESSION_COOKIE: &str = "pawconnect_sid";

const SESSION_KEY_PREFIX: &str = "session:";

/// Server-side session document, stored in Redis under `session:<id>` with a
/// TTL. The client only ever sees the opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub account_id: String,
    pub role: Role,
    pub created_at: i64,
    pub expires_at: i64,
}

fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, session_id)
}

fn serde_err(e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((
        redis::ErrorKind::IoError,
        "session serialization error",
        e.to_string(),
    ))
}

impl Session {
    pub async fn create(
        redis: &Arc<RedisClient>,
        account_id: &str,
        role: Role,
        ttl: u64,
    ) -> Result<Self, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let now = Utc::now().timestamp();
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            role,
            created_at: now,
            expires_at: now + ttl as i64,
        };

        let json = serde_json::to_string(&session).map_err(serde_err)?;
        let _: () = conn.set_ex(session_key(&session.session_id), json, ttl).await?;

        Ok(session)
    }

    pub async fn fetch(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<Option<Self>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(session_key(session_id)).await?;
        match result {
            Some(json) => {
                let session = serde_json::from_str(&json).map_err(serde_err)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Sliding expiry: push the TTL forward without rewriting the document.
    pub async fn touch(
        redis: &Arc<RedisClient>,
        session_id: &str,
        ttl: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let _: () = conn.expire(session_key(session_id), ttl as i64).await?;
        Ok(())
    }

    pub async fn destroy(
        redis: &Arc<RedisClient>,
        session_id: &str,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(session_key(session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_prefixed_with_namespace() {
        assert_eq!(session_key("abc"), "session:abc");
    }

    #[test]
    fn session_survives_json_round_trip() {
        let session = Session {
            session_id: "sid".into(),
            account_id: "acc".into(),
            role: Role::Ngo,
            created_at: 100,
            expires_at: 200,
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.account_id, "acc");
        assert_eq!(back.role, Role::Ngo);
        assert_eq!(back.expires_at, 200);
    }
}
