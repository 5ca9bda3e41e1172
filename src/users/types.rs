use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
}

#[derive(Serialize)]
pub struct UserEntry {
    pub name: String,
    pub current: bool,
}

#[derive(Serialize)]
pub struct UserList {
    pub users: Vec<UserEntry>,
}

#[derive(Serialize)]
pub struct ResetPlan {
    pub action: &'static str,
    pub users: i64,
}

#[derive(Serialize)]
pub struct ResetResult {
    pub deleted_users: u64,
}
