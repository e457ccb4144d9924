//! Subscription repository.

use std::sync::Arc;

use crate::entities::{Subscription, subscription};
use metagram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subscription by subscriber and target.
    pub async fn find_by_pair(
        &self,
        subscriber_id: &str,
        target_id: &str,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::TargetId.eq(target_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user subscribes to another user's channel.
    pub async fn is_subscribed(&self, subscriber_id: &str, target_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(subscriber_id, target_id).await?.is_some())
    }

    /// Create a new subscription.
    pub async fn create(
        &self,
        model: subscription::ActiveModel,
    ) -> AppResult<subscription::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a subscription by pair; absent pairs are a no-op.
    pub async fn delete_by_pair(&self, subscriber_id: &str, target_id: &str) -> AppResult<()> {
        let subscription = self.find_by_pair(subscriber_id, target_id).await?;
        if let Some(s) = subscription {
            s.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Get subscriptions held by a user (the channels they follow).
    pub async fn find_by_subscriber(
        &self,
        subscriber_id: &str,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .order_by_desc(subscription::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get subscriptions pointing at a user (their channel's subscribers).
    pub async fn find_by_target(&self, target_id: &str) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::TargetId.eq(target_id))
            .order_by_desc(subscription::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a channel's subscribers.
    pub async fn count_subscribers(&self, target_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::TargetId.eq(target_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the channels a user follows.
    pub async fn count_subscriptions(&self, subscriber_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
