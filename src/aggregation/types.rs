use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A feed row as seen by the polling loop.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub user_id: Uuid,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub feed_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub feed_id: Uuid,
}

/// One decoded RSS document. Lives only for the duration of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedDocument {
    pub title: String,
    pub description: String,
    pub items: Vec<RawItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum ItemOutcome {
    Inserted,
    Duplicate,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub feed_id: Uuid,
    pub feed_url: String,
    pub outcomes: Vec<ItemOutcome>,
}

impl CycleReport {
    pub fn inserted(&self) -> usize { self.count(|o| matches!(o, ItemOutcome::Inserted)) }
    pub fn duplicates(&self) -> usize { self.count(|o| matches!(o, ItemOutcome::Duplicate)) }
    pub fn failed(&self) -> usize { self.count(|o| matches!(o, ItemOutcome::Failed(_))) }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}
