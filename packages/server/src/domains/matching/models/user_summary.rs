use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

/// The few user fields notifications need.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    pub push_token: Option<String>,
}

impl UserSummary {
    pub async fn find_by_ids(ids: &[UserId], pool: &PgPool) -> Result<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, display_name, push_token FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
