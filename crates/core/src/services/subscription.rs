//! Subscription service.

use metagram_common::{AppResult, IdGenerator};
use metagram_db::{
    entities::{subscription, user},
    repositories::{SubscriptionRepository, UserRepository},
};
use sea_orm::Set;

/// Subscription service for the social graph.
///
/// All subscription-set mutations go through here so the set invariants
/// (idempotence, no duplicate membership) live in one place.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub fn new(subscription_repo: SubscriptionRepository, user_repo: UserRepository) -> Self {
        Self {
            subscription_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Subscribe a user to another user's channel.
    ///
    /// Idempotent: an existing subscription is a no-op success.
    /// Subscribing to one's own channel is permitted.
    pub async fn subscribe(&self, subscriber_id: &str, target_id: &str) -> AppResult<()> {
        // Target must exist; surfaces stale references as UserNotFound
        self.user_repo.get_by_id(target_id).await?;

        if self
            .subscription_repo
            .is_subscribed(subscriber_id, target_id)
            .await?
        {
            return Ok(());
        }

        let model = subscription::ActiveModel {
            id: Set(self.id_gen.generate()),
            subscriber_id: Set(subscriber_id.to_string()),
            target_id: Set(target_id.to_string()),
            ..Default::default()
        };
        self.subscription_repo.create(model).await?;
        tracing::debug!(subscriber_id = %subscriber_id, target_id = %target_id, "Subscribed");
        Ok(())
    }

    /// Unsubscribe a user from another user's channel.
    ///
    /// Removing an absent subscription is a no-op, not an error.
    pub async fn unsubscribe(&self, subscriber_id: &str, target_id: &str) -> AppResult<()> {
        self.subscription_repo
            .delete_by_pair(subscriber_id, target_id)
            .await?;
        tracing::debug!(subscriber_id = %subscriber_id, target_id = %target_id, "Unsubscribed");
        Ok(())
    }

    /// Check if a user subscribes to another user's channel.
    pub async fn is_subscribed(&self, subscriber_id: &str, target_id: &str) -> AppResult<bool> {
        self.subscription_repo
            .is_subscribed(subscriber_id, target_id)
            .await
    }

    /// Users subscribed to the given user's channel (derived reverse view).
    pub async fn subscribers(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let subscriptions = self.subscription_repo.find_by_target(user_id).await?;
        let ids: Vec<String> = subscriptions
            .into_iter()
            .map(|s| s.subscriber_id)
            .collect();
        self.user_repo.find_by_ids(&ids).await
    }

    /// Channels the given user subscribes to (derived forward view).
    pub async fn subscriptions(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let subscriptions = self.subscription_repo.find_by_subscriber(user_id).await?;
        let ids: Vec<String> = subscriptions.into_iter().map(|s| s.target_id).collect();
        self.user_repo.find_by_ids(&ids).await
    }

    /// Count a channel's subscribers.
    pub async fn subscriber_count(&self, user_id: &str) -> AppResult<u64> {
        self.subscription_repo.count_subscribers(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use metagram_common::AppError;
    use metagram_db::entities::user::{Role, roles_json};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: "$argon2$test".to_string(),
            email: None,
            active: true,
            activation_code: None,
            roles: roles_json(&[Role::User]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_subscription(
        id: &str,
        subscriber_id: &str,
        target_id: &str,
    ) -> subscription::Model {
        subscription::Model {
            id: id.to_string(),
            subscriber_id: subscriber_id.to_string(),
            target_id: target_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_subscribe_creates_when_absent() {
        let target = create_test_user("user2", "bob");
        let created = create_test_subscription("s1", "user1", "user2");

        let subscription_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subscription::Model>::new(), vec![created]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[target]])
                .into_connection(),
        );

        let service = SubscriptionService::new(
            SubscriptionRepository::new(subscription_db),
            UserRepository::new(user_db),
        );

        assert!(service.subscribe("user1", "user2").await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_twice_is_idempotent() {
        let target = create_test_user("user2", "bob");
        let existing = create_test_subscription("s1", "user1", "user2");

        // Existing pair found: no insert is attempted (no exec scripted)
        let subscription_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[target]])
                .into_connection(),
        );

        let service = SubscriptionService::new(
            SubscriptionRepository::new(subscription_db),
            UserRepository::new(user_db),
        );

        assert!(service.subscribe("user1", "user2").await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_to_missing_target_fails() {
        let subscription_db =
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = SubscriptionService::new(
            SubscriptionRepository::new(subscription_db),
            UserRepository::new(user_db),
        );

        let result = service.subscribe("user1", "ghost").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_subscribe_to_self_is_allowed() {
        let target = create_test_user("user1", "alice");
        let created = create_test_subscription("s1", "user1", "user1");

        let subscription_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subscription::Model>::new(), vec![created]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[target]])
                .into_connection(),
        );

        let service = SubscriptionService::new(
            SubscriptionRepository::new(subscription_db),
            UserRepository::new(user_db),
        );

        assert!(service.subscribe("user1", "user1").await.is_ok());
    }

    #[tokio::test]
    async fn test_unsubscribe_absent_is_noop() {
        let subscription_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subscription::Model>::new()])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = SubscriptionService::new(
            SubscriptionRepository::new(subscription_db),
            UserRepository::new(user_db),
        );

        assert!(service.unsubscribe("user1", "user2").await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribers_resolves_users() {
        let s1 = create_test_subscription("s1", "user2", "user1");
        let s2 = create_test_subscription("s2", "user3", "user1");
        let bob = create_test_user("user2", "bob");
        let carol = create_test_user("user3", "carol");

        let subscription_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[s1, s2]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bob, carol]])
                .into_connection(),
        );

        let service = SubscriptionService::new(
            SubscriptionRepository::new(subscription_db),
            UserRepository::new(user_db),
        );

        let result = service.subscribers("user1").await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].username, "bob");
    }
}
