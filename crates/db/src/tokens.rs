use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{Db, DbError};

// ==== Refresh tokens (rotation) ====

#[derive(sqlx::FromRow, Debug, Serialize, Clone)]
pub struct RefreshRow {
    pub id: i64,
    pub user_id: Uuid,
    pub jti: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshRow {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

pub async fn insert_refresh(
    db: &Db,
    user_id: Uuid,
    jti: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), DbError> {
    debug!(%user_id, jti, %expires_at, "storing refresh token");
    sqlx::query(
        r#"INSERT INTO refresh_tokens (user_id, jti, token_hash, expires_at)
           VALUES ($1, $2, $3, $4)"#,
    )
    .bind(user_id)
    .bind(jti)
    .bind(token_hash)
    .bind(expires_at)
    .execute(&db.0)
    .await?;
    Ok(())
}

pub async fn get_refresh_by_jti(db: &Db, jti: &str) -> Result<Option<RefreshRow>, DbError> {
    let row = sqlx::query_as::<_, RefreshRow>(
        "SELECT id, user_id, jti, token_hash, expires_at, revoked, created_at
         FROM refresh_tokens WHERE jti = $1",
    )
    .bind(jti)
    .fetch_optional(&db.0)
    .await?;
    Ok(row)
}

pub async fn revoke_refresh(db: &Db, jti: &str) -> Result<u64, DbError> {
    let res = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = $1 AND NOT revoked")
        .bind(jti)
        .execute(&db.0)
        .await?;
    Ok(res.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn revoked_or_expired_rows_are_unusable() {
        let now = Utc::now();
        let mut row = RefreshRow {
            id: 1,
            user_id: Uuid::new_v4(),
            jti: "abc".into(),
            token_hash: "sha256:00".into(),
            expires_at: now + Duration::hours(1),
            revoked: false,
            created_at: now,
        };
        assert!(row.is_usable(now));
        row.revoked = true;
        assert!(!row.is_usable(now));
        row.revoked = false;
        row.expires_at = now - Duration::seconds(1);
        assert!(!row.is_usable(now));
    }
}
