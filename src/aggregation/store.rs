use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::types::{Feed, NewPost, Post};

#[derive(Debug, Error)]
pub enum InsertPostError {
    #[error("a post with this url already exists")]
    DuplicateUrl,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[async_trait]
pub trait FeedStore: Send + Sync {
    /// The feed with the oldest `last_fetched_at`, never-fetched feeds first.
    async fn next_feed_to_fetch(&self) -> Result<Option<Feed>>;
    async fn mark_feed_fetched(&self, feed_id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post, InsertPostError>;
}
