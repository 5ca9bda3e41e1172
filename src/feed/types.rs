use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FeedRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub url: String,
    pub user_id: Uuid,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FeedWithCreator {
    pub name: String,
    pub url: String,
    pub user_name: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FollowedFeed {
    pub feed_name: String,
    pub feed_url: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FollowOutcome {
    Followed { feed_name: String, user_name: String },
    AlreadyFollowing { feed_name: String },
}

#[derive(Serialize)]
pub struct FeedAddResult {
    pub feed: FeedRow,
    pub follow: FollowOutcome,
}

#[derive(Serialize)]
pub struct FeedList {
    pub feeds: Vec<FeedWithCreator>,
}

#[derive(Serialize)]
pub struct FollowingList {
    pub user: String,
    pub feeds: Vec<FollowedFeed>,
}

#[derive(Serialize)]
pub struct UnfollowResult {
    pub feed_name: String,
    pub removed: bool,
}
