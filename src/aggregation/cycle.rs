use anyhow::anyhow;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::telemetry::{self};
use crate::telemetry::ops::agg::Phase as AggPhase;

use super::fetch::{FeedFetcher, FetchError};
use super::normalize::normalize_pub_date;
use super::store::{FeedStore, InsertPostError, PostStore};
use super::types::{CycleReport, Feed, ItemOutcome, NewPost, RawItem};

pub const CYCLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const ITEM_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("no feeds to fetch")]
    NoFeeds,
    #[error("couldn't fetch next feed to fetch: {0:#}")]
    Select(anyhow::Error),
    #[error("couldn't mark feed {feed_id} as fetched: {error:#}")]
    MarkFetched { feed_id: Uuid, error: anyhow::Error },
    #[error("error fetching feed {url}: {source}")]
    Fetch { url: String, #[source] source: FetchError },
}

/// Run one select-fetch-ingest cycle against the stalest feed.
///
/// The feed's freshness marker moves before the fetch, so a feed that keeps
/// failing still yields its turn. Item failures are reported in the returned
/// [`CycleReport`] and never abort the cycle.
pub async fn scrape_once<S, F>(store: &S, fetcher: &F) -> Result<CycleReport, CycleError>
where
    S: FeedStore + PostStore + ?Sized,
    F: FeedFetcher + ?Sized,
{
    let log = telemetry::agg();
    let deadline = Instant::now() + CYCLE_TIMEOUT;

    let feed = within(deadline, store.next_feed_to_fetch())
        .instrument(log.span(&AggPhase::Select))
        .await
        .map_err(CycleError::Select)?
        .ok_or(CycleError::NoFeeds)?;

    within(deadline, store.mark_feed_fetched(feed.id, Utc::now()))
        .instrument(log.span_kv(&AggPhase::MarkFetched, [("feed_id", feed.id.to_string())]))
        .await
        .map_err(|error| CycleError::MarkFetched { feed_id: feed.id, error })?;

    let doc = fetcher
        .fetch(&feed.url, deadline)
        .instrument(log.span_kv(&AggPhase::Fetch, [("url", feed.url.clone())]))
        .await
        .map_err(|source| CycleError::Fetch { url: feed.url.clone(), source })?;

    log.debug_kv("📥 fetched", [("feed", feed.name.clone()), ("channel", doc.title.clone()), ("items", doc.items.len().to_string())]);

    let mut outcomes = Vec::with_capacity(doc.items.len());
    for item in doc.items {
        let link = item.link.clone();
        let outcome = ingest_item(store, &feed, item, deadline)
            .instrument(log.span(&AggPhase::Item))
            .await;
        match &outcome {
            ItemOutcome::Inserted => log.debug_kv("➕ insert", [("url", link)]),
            ItemOutcome::Duplicate => log.debug_kv("↩️ skip", [("url", link), ("reason", "duplicate".to_string())]),
            ItemOutcome::Failed(reason) => log.warn_kv("⚠️ item failed", [("url", link), ("error", reason.clone())]),
        }
        outcomes.push(outcome);
    }

    Ok(CycleReport { feed_id: feed.id, feed_url: feed.url, outcomes })
}

async fn ingest_item<S>(store: &S, feed: &Feed, item: RawItem, outer: Instant) -> ItemOutcome
where
    S: PostStore + ?Sized,
{
    // outer deadline always wins
    let deadline = outer.min(Instant::now() + ITEM_TIMEOUT);
    if item.link.trim().is_empty() {
        return ItemOutcome::Failed("item has no link".to_string());
    }
    let post = new_post(feed.id, item, Utc::now());
    match tokio::time::timeout_at(deadline, store.insert_post(post)).await {
        Ok(Ok(_)) => ItemOutcome::Inserted,
        Ok(Err(InsertPostError::DuplicateUrl)) => ItemOutcome::Duplicate,
        Ok(Err(InsertPostError::Store(e))) => ItemOutcome::Failed(format!("{e:#}")),
        Err(_) => ItemOutcome::Failed("insert deadline exceeded".to_string()),
    }
}

fn new_post(feed_id: Uuid, item: RawItem, now: DateTime<Utc>) -> NewPost {
    let published_at = normalize_pub_date(&item.pub_date);
    let description = if item.description.is_empty() { None } else { Some(item.description) };
    NewPost {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        title: item.title,
        url: item.link,
        description,
        published_at,
        feed_id,
    }
}

async fn within<T>(deadline: Instant, fut: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| anyhow!("cycle deadline exceeded"))?
}
