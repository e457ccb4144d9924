//! Message like repository.

use std::sync::Arc;

use crate::entities::{MessageLike, message_like};
use metagram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter,
};

/// Message like repository for database operations.
#[derive(Clone)]
pub struct MessageLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageLikeRepository {
    /// Create a new message like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by message and user.
    pub async fn find_by_pair(
        &self,
        message_id: &str,
        user_id: &str,
    ) -> AppResult<Option<message_like::Model>> {
        MessageLike::find()
            .filter(message_like::Column::MessageId.eq(message_id))
            .filter(message_like::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has liked a message.
    pub async fn has_liked(&self, message_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(message_id, user_id).await?.is_some())
    }

    /// Create a new like.
    pub async fn create(&self, model: message_like::ActiveModel) -> AppResult<message_like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a like by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        MessageLike::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a like by pair; absent pairs are a no-op.
    pub async fn delete_by_pair(&self, message_id: &str, user_id: &str) -> AppResult<()> {
        let like = self.find_by_pair(message_id, user_id).await?;
        if let Some(l) = like {
            l.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Get a viewer's likes among the given messages (for feed annotation).
    pub async fn find_for_viewer(
        &self,
        user_id: &str,
        message_ids: &[String],
    ) -> AppResult<Vec<message_like::Model>> {
        if message_ids.is_empty() {
            return Ok(vec![]);
        }

        MessageLike::find()
            .filter(message_like::Column::UserId.eq(user_id))
            .filter(message_like::Column::MessageId.is_in(message_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes on a message.
    pub async fn count_for_message(&self, message_id: &str) -> AppResult<u64> {
        MessageLike::find()
            .filter(message_like::Column::MessageId.eq(message_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_like(id: &str, message_id: &str, user_id: &str) -> message_like::Model {
        message_like::Model {
            id: id.to_string(),
            message_id: message_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let like = create_test_like("l1", "m1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like.clone()]])
                .into_connection(),
        );

        let repo = MessageLikeRepository::new(db);
        let result = repo.find_by_pair("m1", "user1").await.unwrap();

        assert!(result.is_some());
        let found = result.unwrap();
        assert_eq!(found.message_id, "m1");
        assert_eq!(found.user_id, "user1");
    }

    #[tokio::test]
    async fn test_has_liked_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message_like::Model>::new()])
                .into_connection(),
        );

        let repo = MessageLikeRepository::new(db);
        let result = repo.has_liked("m1", "user1").await.unwrap();

        assert!(!result);
    }

    #[tokio::test]
    async fn test_delete_by_pair_absent_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message_like::Model>::new()])
                .into_connection(),
        );

        let repo = MessageLikeRepository::new(db);
        assert!(repo.delete_by_pair("m1", "user1").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_by_pair_existing() {
        let like = create_test_like("l1", "m1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = MessageLikeRepository::new(db);
        assert!(repo.delete_by_pair("m1", "user1").await.is_ok());
    }

    #[tokio::test]
    async fn test_find_for_viewer_empty_ids_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = MessageLikeRepository::new(db);
        let result = repo.find_for_viewer("user1", &[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_find_for_viewer() {
        let l1 = create_test_like("l1", "m1", "user1");
        let l2 = create_test_like("l2", "m3", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[l1, l2]])
                .into_connection(),
        );

        let repo = MessageLikeRepository::new(db);
        let result = repo
            .find_for_viewer(
                "user1",
                &["m1".to_string(), "m2".to_string(), "m3".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }
}
