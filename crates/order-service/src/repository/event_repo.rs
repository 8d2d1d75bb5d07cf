//! 活动仓储（只读）

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::EventRepositoryTrait;
use crate::error::StoreResult;
use crate::models::Event;

/// 活动仓储
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 根据 ID 获取活动
    pub async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, venue_id, organizer_id, title, description, event_date,
                   ticket_price, available_tickets, total_tickets, status,
                   created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }
}

#[async_trait]
impl EventRepositoryTrait for EventRepository {
    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        self.get_event(id).await
    }
}
