//! Message repository.

use std::sync::Arc;

use crate::entities::{Message, message};
use metagram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a message by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<message::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::MessageNotFound(id.to_string()))
    }

    /// Create a new message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a message.
    pub async fn update(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a message.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Message::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a page of the global feed (newest ID first, optional exact tag filter).
    pub async fn find_page(
        &self,
        tag: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<message::Model>> {
        let mut query = Message::find().order_by_desc(message::Column::Id);

        if let Some(tag) = tag {
            query = query.filter(message::Column::Tag.eq(tag));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count messages in the global feed (optional exact tag filter).
    pub async fn count(&self, tag: Option<&str>) -> AppResult<u64> {
        let mut query = Message::find();

        if let Some(tag) = tag {
            query = query.filter(message::Column::Tag.eq(tag));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a page of one author's messages (newest ID first).
    pub async fn find_page_by_author(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(message::Column::AuthorId.eq(author_id))
            .order_by_desc(message::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count one author's messages.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get every message an author owns (for cascade deletion).
    pub async fn find_all_by_author(&self, author_id: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(message::Column::AuthorId.eq(author_id))
            .order_by_desc(message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment like count atomically (single UPDATE query, no fetch).
    pub async fn increment_like_count(&self, message_id: &str) -> AppResult<()> {
        Message::update_many()
            .col_expr(
                message::Column::LikeCount,
                Expr::col(message::Column::LikeCount).add(1),
            )
            .filter(message::Column::Id.eq(message_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement like count atomically (single UPDATE query, no fetch).
    pub async fn decrement_like_count(&self, message_id: &str) -> AppResult<()> {
        Message::update_many()
            .col_expr(
                message::Column::LikeCount,
                Expr::cust("GREATEST(like_count - 1, 0)"),
            )
            .filter(message::Column::Id.eq(message_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
