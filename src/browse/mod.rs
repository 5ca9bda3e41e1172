use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;

use crate::config::Config;
use crate::telemetry::{self};
use crate::telemetry::ops::browse::Phase as BrowsePhase;
use crate::users;

mod db;
pub mod types;

use types::PostForUser;

/// gator browse [limit]
#[derive(Args)]
pub struct BrowseCmd {
    /// Number of posts to show
    #[arg(default_value_t = 2, value_parser = clap::value_parser!(i64).range(1..=i32::MAX as i64))]
    pub limit: i64,
}

pub async fn run(pool: &PgPool, cfg: &Config, args: BrowseCmd) -> Result<()> {
    let log = telemetry::browse();
    let _g = log.root_span_kv([("limit", args.limit.to_string())]).entered();

    let user = users::current_user(pool, cfg).await?;
    let posts = {
        let _s = log.span(&BrowsePhase::Query).entered();
        db::posts_for_user(pool, user.id, args.limit).await.context("error getting posts for user")?
    };

    if telemetry::config::json_mode() {
        log.result(&types::BrowseResult { user: user.name, limit: args.limit, posts })?;
        return Ok(());
    }
    if posts.is_empty() {
        println!("No posts to display");
        return Ok(());
    }
    for post in &posts {
        println!("{}\n", render_post(post));
    }
    Ok(())
}

fn render_post(post: &PostForUser) -> String {
    let published = post
        .published_at
        .map(|t| t.format("%d %b %y %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let description = post.description.as_deref().unwrap_or("(no description)");
    format!(
        "Feed: {}\n{}\n{}\nPublished: {}\n{}",
        post.feed_name, post.title, post.url, published, description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post() -> PostForUser {
        PostForUser {
            feed_name: "Boot Blog".to_string(),
            title: "Hello".to_string(),
            url: "https://blog.test/hello".to_string(),
            description: Some("First post".to_string()),
            published_at: Some(Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap()),
        }
    }

    #[test]
    fn renders_all_fields() {
        let out = render_post(&post());
        assert_eq!(out, "Feed: Boot Blog\nHello\nhttps://blog.test/hello\nPublished: 02 Jan 06 22:04 UTC\nFirst post");
    }

    #[test]
    fn renders_placeholders_for_missing_fields() {
        let mut p = post();
        p.description = None;
        p.published_at = None;
        let out = render_post(&p);
        assert!(out.contains("Published: unknown"));
        assert!(out.ends_with("(no description)"));
    }
}
