use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostForUser {
    pub feed_name: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct BrowseResult {
    pub user: String,
    pub limit: i64,
    pub posts: Vec<PostForUser>,
}
