use anyhow::{bail, Context, Result};
use clap::Args;
use sqlx::PgPool;
use url::Url;

use crate::config::Config;
use crate::telemetry::{self};
use crate::telemetry::ops::feed::Phase as FeedPhase;
use crate::users::{self, types::User};

mod db;
pub mod types;

use types::FollowOutcome;

/// gator addfeed <name> <url>
#[derive(Args)]
pub struct AddFeedCmd {
    pub name: String,
    pub url: String,
}

/// gator follow <url>
#[derive(Args)]
pub struct FollowCmd {
    pub url: String,
}

/// gator unfollow <url>
#[derive(Args)]
pub struct UnfollowCmd {
    pub url: String,
}

pub async fn add_feed(pool: &PgPool, cfg: &Config, args: AddFeedCmd) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span_kv([("name", args.name.clone()), ("url", args.url.clone())]).entered();

    // URL validation (friendly error before DB I/O)
    if Url::parse(&args.url).is_err() { bail!("Invalid URL: {}", args.url); }
    let user = users::current_user(pool, cfg).await?;

    let _s = log.span(&FeedPhase::Add).entered();
    let Some(feed) = db::create_feed(pool, &args.name, &args.url, user.id).await.context("error creating feed")? else {
        bail!("a feed with url {} already exists; use `gator follow {}`", args.url, args.url);
    };
    log.info(format!("➕ Feed added: {} ({})", feed.name, feed.url));

    let follow = follow_feed(pool, &user, &feed).await.context("error following new feed")?;
    if telemetry::config::json_mode() {
        log.result(&types::FeedAddResult { feed, follow })?;
    }
    Ok(())
}

pub async fn list(pool: &PgPool) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span().entered();
    let _s = log.span(&FeedPhase::List).entered();

    let feeds = db::list_feeds(pool).await.context("error getting feeds")?;
    if telemetry::config::json_mode() {
        log.result(&types::FeedList { feeds })?;
    } else {
        for f in &feeds {
            println!("* Feed: {:?} URL: {:?} Creator: {}", f.name, f.url, f.user_name);
        }
    }
    Ok(())
}

pub async fn follow(pool: &PgPool, cfg: &Config, args: FollowCmd) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span_kv([("url", args.url.clone())]).entered();

    let user = users::current_user(pool, cfg).await?;
    let feed = db::get_feed_by_url(pool, &args.url)
        .await
        .context("error getting feed by URL")?
        .with_context(|| format!("no feed with url {}", args.url))?;

    let outcome = follow_feed(pool, &user, &feed).await?;
    if telemetry::config::json_mode() {
        log.result(&outcome)?;
    }
    Ok(())
}

async fn follow_feed(pool: &PgPool, user: &User, feed: &types::FeedRow) -> Result<FollowOutcome> {
    let log = telemetry::feed();
    let _s = log.span_kv(&FeedPhase::Follow, [("feed_id", feed.id.to_string())]).entered();
    let outcome = if db::create_feed_follow(pool, user.id, feed.id).await? {
        log.info(format!("📌 {} now follows {}", user.name, feed.name));
        FollowOutcome::Followed { feed_name: feed.name.clone(), user_name: user.name.clone() }
    } else {
        log.info("You're already following that feed.");
        FollowOutcome::AlreadyFollowing { feed_name: feed.name.clone() }
    };
    Ok(outcome)
}

pub async fn following(pool: &PgPool, cfg: &Config) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span().entered();
    let _s = log.span(&FeedPhase::Following).entered();

    let user = users::current_user(pool, cfg).await?;
    let feeds = db::follows_for_user(pool, user.id).await.context("error getting followed feeds")?;
    if telemetry::config::json_mode() {
        log.result(&types::FollowingList { user: user.name, feeds })?;
    } else {
        println!("{}'s followed feeds:", user.name);
        for f in &feeds {
            println!("* {}", f.feed_name);
        }
    }
    Ok(())
}

pub async fn unfollow(pool: &PgPool, cfg: &Config, args: UnfollowCmd) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span_kv([("url", args.url.clone())]).entered();
    let _s = log.span(&FeedPhase::Unfollow).entered();

    let user = users::current_user(pool, cfg).await?;
    let feed = db::get_feed_by_url(pool, &args.url)
        .await
        .context("error getting feed by URL")?
        .with_context(|| format!("no feed with url {}", args.url))?;
    let removed = db::delete_feed_follow(pool, user.id, feed.id).await.context("error deleting feed follow")? > 0;

    if removed {
        log.info(format!("➖ {} unfollowed by {}", feed.name, user.name));
    } else {
        log.warn(format!("{} was not following {}", user.name, feed.name));
    }
    if telemetry::config::json_mode() {
        log.result(&types::UnfollowResult { feed_name: feed.name, removed })?;
    }
    Ok(())
}
