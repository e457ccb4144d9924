//! Like toggle service.

use metagram_common::{AppResult, IdGenerator};
use metagram_db::{
    entities::message_like,
    repositories::{MessageLikeRepository, MessageRepository},
};
use sea_orm::Set;

/// Resulting state of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    /// The actor is now in the like set.
    Liked,
    /// The actor is no longer in the like set.
    Unliked,
}

/// Like toggle service.
///
/// The toggle is the only mutation of a message's like set: callers
/// cannot force a target state, they can only flip the current one.
#[derive(Clone)]
pub struct LikeService {
    like_repo: MessageLikeRepository,
    message_repo: MessageRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub fn new(like_repo: MessageLikeRepository, message_repo: MessageRepository) -> Self {
        Self {
            like_repo,
            message_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Flip the actor's membership in the message's like set.
    ///
    /// Any authenticated user may like any message, including their own.
    /// A caller racing itself here is last-write-wins; the unique
    /// `(message_id, user_id)` index prevents duplicate memberships.
    pub async fn toggle(&self, message_id: &str, actor_id: &str) -> AppResult<LikeState> {
        // Stale references surface as MessageNotFound
        self.message_repo.get_by_id(message_id).await?;

        if let Some(existing) = self.like_repo.find_by_pair(message_id, actor_id).await? {
            self.like_repo.delete(&existing.id).await?;
            self.message_repo.decrement_like_count(message_id).await?;
            tracing::debug!(message_id = %message_id, user_id = %actor_id, "Message unliked");
            return Ok(LikeState::Unliked);
        }

        let model = message_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            message_id: Set(message_id.to_string()),
            user_id: Set(actor_id.to_string()),
            ..Default::default()
        };
        self.like_repo.create(model).await?;
        self.message_repo.increment_like_count(message_id).await?;
        tracing::debug!(message_id = %message_id, user_id = %actor_id, "Message liked");
        Ok(LikeState::Liked)
    }

    /// Check if a user has liked a message.
    pub async fn has_liked(&self, message_id: &str, user_id: &str) -> AppResult<bool> {
        self.like_repo.has_liked(message_id, user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use metagram_common::AppError;
    use metagram_db::entities::message;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_message(id: &str, author_id: &str) -> message::Model {
        message::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            text: "Test message".to_string(),
            tag: "art".to_string(),
            filename: Some("abc.jpg".to_string()),
            like_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_like(id: &str, message_id: &str, user_id: &str) -> message_like::Model {
        message_like::Model {
            id: id.to_string(),
            message_id: message_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_toggle_message_not_found() {
        let like_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let message_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message::Model>::new()])
                .into_connection(),
        );

        let service = LikeService::new(
            MessageLikeRepository::new(like_db),
            MessageRepository::new(message_db),
        );

        let result = service.toggle("nonexistent", "user1").await;
        assert!(result.is_err());
        match result {
            Err(AppError::MessageNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected MessageNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_toggle_adds_like_when_absent() {
        let message = create_test_message("m1", "author1");
        let created = create_test_like("l1", "m1", "user1");

        let like_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message_like::Model>::new(), vec![created]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );
        let message_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let service = LikeService::new(
            MessageLikeRepository::new(like_db),
            MessageRepository::new(message_db),
        );

        let state = service.toggle("m1", "user1").await.unwrap();
        assert_eq!(state, LikeState::Liked);
    }

    #[tokio::test]
    async fn test_toggle_removes_existing_like() {
        let message = create_test_message("m1", "author1");
        let existing = create_test_like("l1", "m1", "user1");

        let like_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );
        let message_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let service = LikeService::new(
            MessageLikeRepository::new(like_db),
            MessageRepository::new(message_db),
        );

        let state = service.toggle("m1", "user1").await.unwrap();
        assert_eq!(state, LikeState::Unliked);
    }

    #[tokio::test]
    async fn test_toggle_twice_is_an_involution() {
        let message = create_test_message("m1", "author1");
        let created = create_test_like("l1", "m1", "user1");

        // First toggle: no like found, insert; second toggle: found, delete
        let like_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    Vec::<message_like::Model>::new(),
                    vec![created.clone()],
                    vec![created],
                ])
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );
        let message_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message.clone()], [message]])
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );

        let service = LikeService::new(
            MessageLikeRepository::new(like_db),
            MessageRepository::new(message_db),
        );

        let first = service.toggle("m1", "user1").await.unwrap();
        let second = service.toggle("m1", "user1").await.unwrap();

        assert_eq!(first, LikeState::Liked);
        assert_eq!(second, LikeState::Unliked);
    }

    #[tokio::test]
    async fn test_author_may_like_own_message() {
        let message = create_test_message("m1", "user1");
        let created = create_test_like("l1", "m1", "user1");

        let like_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message_like::Model>::new(), vec![created]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );
        let message_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let service = LikeService::new(
            MessageLikeRepository::new(like_db),
            MessageRepository::new(message_db),
        );

        let state = service.toggle("m1", "user1").await.unwrap();
        assert_eq!(state, LikeState::Liked);
    }
}
