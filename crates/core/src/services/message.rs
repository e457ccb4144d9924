//! Message service: posting, editing, deletion, and feed queries.

use std::collections::{HashMap, HashSet};

use metagram_common::{AppError, AppResult, IdGenerator};
use metagram_db::{
    entities::message,
    repositories::{
        MessageLikeRepository, MessageRepository, SubscriptionRepository, UserRepository,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::attachment::{AttachmentService, FileUpload};

/// Default feed page size.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Largest page size a caller may request.
const MAX_PAGE_SIZE: u64 = 100;

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, 1-indexed.
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Create a page request, normalizing out-of-range values.
    #[must_use]
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    const fn offset(self) -> u64 {
        (self.page.saturating_sub(1)) * self.per_page
    }
}

/// One page of results, with the totals a caller needs for navigation.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Page number, 1-indexed.
    pub page: u64,
    /// Requested page size.
    pub per_page: u64,
    /// Total matching items across all pages.
    pub total_items: u64,
    /// Total page count (0 for an empty result set).
    pub total_pages: u64,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total_items,
            total_pages: total_items.div_ceil(request.per_page),
        }
    }
}

/// A message as presented in a feed.
#[derive(Debug, Clone)]
pub struct MessageSummary {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub tag: String,
    pub filename: Option<String>,
    pub like_count: i32,
    /// Whether the viewing user has liked this message.
    pub liked_by_viewer: bool,
}

/// An author's feed page with per-viewer annotations.
#[derive(Debug, Clone)]
pub struct AuthorFeed {
    /// The author's messages.
    pub page: Page<MessageSummary>,
    /// Whether the viewer subscribes to this author's channel.
    pub viewer_is_subscriber: bool,
    /// Whether the viewer is the author.
    pub viewer_is_author: bool,
}

/// Outcome of an update request.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The message was updated.
    Updated(message::Model),
    /// The request referenced no (or a stale) message; nothing changed.
    NoChangeRequested,
}

/// Input for posting a new message.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageInput {
    #[validate(length(max = 2048, message = "Message too long."))]
    pub text: String,

    #[validate(length(max = 255, message = "Tag too long."))]
    pub tag: String,
}

/// Input for editing a message.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMessageInput {
    /// The message to edit; absent means nothing to change.
    pub message_id: Option<String>,

    /// New text; empty or absent leaves the field untouched.
    #[validate(length(max = 2048, message = "Message too long."))]
    pub text: Option<String>,

    /// New tag; empty or absent leaves the field untouched.
    #[validate(length(max = 255, message = "Tag too long."))]
    pub tag: Option<String>,
}

/// Message service for business logic.
#[derive(Clone)]
pub struct MessageService {
    message_repo: MessageRepository,
    like_repo: MessageLikeRepository,
    user_repo: UserRepository,
    subscription_repo: SubscriptionRepository,
    attachments: AttachmentService,
    id_gen: IdGenerator,
}

impl MessageService {
    /// Create a new message service.
    #[must_use]
    pub fn new(
        message_repo: MessageRepository,
        like_repo: MessageLikeRepository,
        user_repo: UserRepository,
        subscription_repo: SubscriptionRepository,
        attachments: AttachmentService,
    ) -> Self {
        Self {
            message_repo,
            like_repo,
            user_repo,
            subscription_repo,
            attachments,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a message by ID.
    pub async fn get(&self, id: &str) -> AppResult<message::Model> {
        self.message_repo.get_by_id(id).await
    }

    /// Post a new message. An attachment is mandatory on this path.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateMessageInput,
        upload: Option<&FileUpload>,
    ) -> AppResult<message::Model> {
        input.validate()?;
        if input.text.trim().is_empty() {
            return Err(AppError::Validation("Please, fill the message.".to_string()));
        }
        if input.tag.trim().is_empty() {
            return Err(AppError::Validation("Please, add tags.".to_string()));
        }
        let upload = match upload {
            Some(u) if !u.is_empty() => u,
            _ => return Err(AppError::Validation("Please, add photo.".to_string())),
        };

        let filename = self.attachments.attach(Some(upload)).await?;

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            text: Set(input.text),
            tag: Set(input.tag),
            filename: Set(filename),
            ..Default::default()
        };

        let created = self.message_repo.create(model).await?;
        tracing::debug!(message_id = %created.id, author_id = %author_id, "Message posted");
        Ok(created)
    }

    /// Edit a message. Only the author may edit.
    ///
    /// An absent or stale message reference resolves to
    /// [`UpdateOutcome::NoChangeRequested`] so callers can surface
    /// "nothing to change" as a field-level notice.
    pub async fn update(
        &self,
        actor_id: &str,
        input: UpdateMessageInput,
        upload: Option<&FileUpload>,
    ) -> AppResult<UpdateOutcome> {
        input.validate()?;

        let Some(message_id) = input.message_id.as_deref() else {
            return Ok(UpdateOutcome::NoChangeRequested);
        };
        let Some(existing) = self.message_repo.find_by_id(message_id).await? else {
            return Ok(UpdateOutcome::NoChangeRequested);
        };

        if existing.author_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author may edit a message".to_string(),
            ));
        }

        let previous_filename = existing.filename.clone();
        // Empty uploads are a no-op here: the prior filename stays
        let new_filename = self.attachments.attach(upload).await?;

        let mut active: message::ActiveModel = existing.into();
        if let Some(text) = input.text.filter(|t| !t.trim().is_empty()) {
            active.text = Set(text);
        }
        if let Some(tag) = input.tag.filter(|t| !t.trim().is_empty()) {
            active.tag = Set(tag);
        }
        if let Some(name) = new_filename {
            active.filename = Set(Some(name));
            if let Some(old) = previous_filename {
                if let Err(e) = self.attachments.remove(&old).await {
                    tracing::warn!(error = %e, filename = %old, "Failed to remove replaced attachment");
                }
            }
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.message_repo.update(active).await?;
        Ok(UpdateOutcome::Updated(updated))
    }

    /// Delete a message. Allowed for its author or an admin.
    pub async fn delete(&self, message_id: &str, actor_id: &str) -> AppResult<()> {
        let message = self.message_repo.get_by_id(message_id).await?;

        if message.author_id != actor_id {
            let actor = self.user_repo.get_by_id(actor_id).await?;
            if !actor.is_admin() {
                return Err(AppError::Forbidden(
                    "Only the author or an admin may delete a message".to_string(),
                ));
            }
        }

        // Blob first; a failed blob removal must not orphan the row
        if let Some(ref filename) = message.filename {
            if let Err(e) = self.attachments.remove(filename).await {
                tracing::warn!(error = %e, filename = %filename, "Failed to remove attachment blob");
            }
        }

        self.message_repo.delete(message_id).await?;
        tracing::debug!(message_id = %message_id, actor_id = %actor_id, "Message deleted");
        Ok(())
    }

    /// Global feed: all messages, optional exact tag filter, newest first.
    pub async fn global_feed(
        &self,
        filter: Option<&str>,
        page: PageRequest,
        viewer: Option<&str>,
    ) -> AppResult<Page<MessageSummary>> {
        let tag = filter.map(str::trim).filter(|t| !t.is_empty());

        let rows = self
            .message_repo
            .find_page(tag, page.per_page, page.offset())
            .await?;
        let total = self.message_repo.count(tag).await?;
        let summaries = self.summarize(rows, viewer).await?;

        Ok(Page::new(summaries, page, total))
    }

    /// Author feed: one user's messages with per-viewer annotations.
    pub async fn author_feed(
        &self,
        author_id: &str,
        page: PageRequest,
        viewer: Option<&str>,
    ) -> AppResult<AuthorFeed> {
        let author = self.user_repo.get_by_id(author_id).await?;

        let rows = self
            .message_repo
            .find_page_by_author(author_id, page.per_page, page.offset())
            .await?;
        let total = self.message_repo.count_by_author(author_id).await?;

        let liked = self.viewer_likes(&rows, viewer).await?;
        let summaries = rows
            .into_iter()
            .map(|m| {
                let liked_by_viewer = liked.contains(&m.id);
                MessageSummary {
                    id: m.id,
                    author_id: author.id.clone(),
                    author_name: author.username.clone(),
                    text: m.text,
                    tag: m.tag,
                    filename: m.filename,
                    like_count: m.like_count,
                    liked_by_viewer,
                }
            })
            .collect();

        let viewer_is_author = viewer == Some(author_id);
        let viewer_is_subscriber = match viewer {
            Some(v) => self.subscription_repo.is_subscribed(v, author_id).await?,
            None => false,
        };

        Ok(AuthorFeed {
            page: Page::new(summaries, page, total),
            viewer_is_subscriber,
            viewer_is_author,
        })
    }

    /// The subset of `rows` the viewer has liked. Anonymous viewers like nothing.
    async fn viewer_likes(
        &self,
        rows: &[message::Model],
        viewer: Option<&str>,
    ) -> AppResult<HashSet<String>> {
        let Some(viewer) = viewer else {
            return Ok(HashSet::new());
        };
        let ids: Vec<String> = rows.iter().map(|m| m.id.clone()).collect();
        Ok(self
            .like_repo
            .find_for_viewer(viewer, &ids)
            .await?
            .into_iter()
            .map(|l| l.message_id)
            .collect())
    }

    /// Resolve authors and like state for a page of messages.
    async fn summarize(
        &self,
        rows: Vec<message::Model>,
        viewer: Option<&str>,
    ) -> AppResult<Vec<MessageSummary>> {
        let liked = self.viewer_likes(&rows, viewer).await?;

        let mut author_ids: Vec<String> = rows.iter().map(|m| m.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(rows
            .into_iter()
            .map(|m| {
                let liked_by_viewer = liked.contains(&m.id);
                let author_name = authors
                    .get(&m.author_id)
                    .cloned()
                    .unwrap_or_else(|| "<unknown>".to_string());
                MessageSummary {
                    id: m.id,
                    author_id: m.author_id,
                    author_name,
                    text: m.text,
                    tag: m.tag,
                    filename: m.filename,
                    like_count: m.like_count,
                    liked_by_viewer,
                }
            })
            .collect())
    }
}
