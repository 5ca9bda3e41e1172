use anyhow::{bail, Result};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::telemetry::{self};
use crate::telemetry::ops::agg::Phase as AggPhase;

use super::cycle::scrape_once;
use super::fetch::FeedFetcher;
use super::store::{FeedStore, PostStore};

/// Run a cycle now and then once per `interval` until `stop` is cancelled.
///
/// Cycle failures are logged and never end the loop. Ticks missed while a
/// slow cycle runs are skipped rather than replayed. Cancelling `stop` while a
/// cycle is running abandons that cycle where it is: the feed stays marked
/// fetched and items not yet inserted are dropped.
pub async fn run_scheduler<S, F>(store: &S, fetcher: &F, interval: Duration, stop: CancellationToken) -> Result<()>
where
    S: FeedStore + PostStore + ?Sized,
    F: FeedFetcher + ?Sized,
{
    if interval.is_zero() {
        bail!("interval between requests must be greater than zero");
    }
    let log = telemetry::agg();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick().instrument(log.span(&AggPhase::Wait)) => {}
        }

        let outcome = tokio::select! {
            _ = stop.cancelled() => break,
            r = scrape_once(store, fetcher).instrument(log.span(&AggPhase::Cycle)) => r,
        };
        match outcome {
            Ok(report) => {
                log.cycle_summary(&report.feed_url, report.inserted(), report.duplicates(), report.failed());
                if telemetry::config::json_mode() {
                    if let Err(e) = log.result(&report) { log.warn(format!("couldn't emit cycle report: {e}")); }
                }
            }
            Err(e) => log.error(format!("❌ error scraping feed: {e}")),
        }
    }

    log.info("🛑 polling stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::cycle::tests::{doc, feed, item, Canned, MemStore};
    use crate::aggregation::fetch::FetchError;
    use crate::aggregation::types::RawFeedDocument;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Fails every other fetch and cancels the loop after `stop_after` calls.
    struct CountingFetcher {
        calls: AtomicUsize,
        stop_after: usize,
        stop: CancellationToken,
        canned: Canned,
    }

    #[async_trait]
    impl FeedFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str, _deadline: Instant) -> Result<RawFeedDocument, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.stop_after {
                self.stop.cancel();
            }
            if n % 2 == 0 {
                return Err(FetchError::Status(503));
            }
            match &self.canned {
                Canned::Doc(d) => Ok(d.clone()),
                _ => Err(FetchError::Timeout),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_polling_through_failures_until_stopped() {
        let store = MemStore::with_feeds(vec![feed("https://a.test/rss", None), feed("https://b.test/rss", None)]);
        let stop = CancellationToken::new();
        let fetcher = CountingFetcher {
            calls: AtomicUsize::new(0),
            stop_after: 4,
            stop: stop.clone(),
            canned: Canned::Doc(doc(vec![item("https://a.test/1", "")])),
        };

        let start = Instant::now();
        run_scheduler(&store, &fetcher, Duration::from_secs(60), stop).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
        // first cycle runs immediately, the next three wait one interval each
        assert!(Instant::now() - start >= Duration::from_secs(180));
        assert!(store.feeds.lock().unwrap().iter().all(|f| f.last_fetched_at.is_some()));
    }

    /// Cancels the loop from inside the fetch, then takes a long time to answer.
    struct StallingFetcher {
        stop: CancellationToken,
    }

    #[async_trait]
    impl FeedFetcher for StallingFetcher {
        async fn fetch(&self, _url: &str, _deadline: Instant) -> Result<RawFeedDocument, FetchError> {
            self.stop.cancel();
            tokio::time::sleep(Duration::from_secs(20)).await;
            Ok(doc(vec![item("https://a.test/1", "")]))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_mid_cycle_abandons_it() {
        let store = MemStore::with_feeds(vec![feed("https://a.test/rss", None)]);
        let stop = CancellationToken::new();
        let fetcher = StallingFetcher { stop: stop.clone() };

        let start = Instant::now();
        run_scheduler(&store, &fetcher, Duration::from_secs(60), stop).await.unwrap();

        assert!(Instant::now() - start < Duration::from_secs(20));
        assert!(store.feeds.lock().unwrap()[0].last_fetched_at.is_some());
        assert!(store.posts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_store_does_not_stop_the_loop() {
        let store = MemStore::default();
        let fetcher = crate::aggregation::cycle::tests::FakeFetcher::default();
        let stop = CancellationToken::new();
        let stopper = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(35)).await;
            stopper.cancel();
        });

        run_scheduler(&store, &fetcher, Duration::from_secs(10), stop).await.unwrap();
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn already_cancelled_token_runs_nothing() {
        let store = MemStore::with_feeds(vec![feed("https://a.test/rss", None)]);
        let fetcher = crate::aggregation::cycle::tests::FakeFetcher::default();
        let stop = CancellationToken::new();
        stop.cancel();

        run_scheduler(&store, &fetcher, Duration::from_secs(1), stop).await.unwrap();
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let store = MemStore::default();
        let fetcher = crate::aggregation::cycle::tests::FakeFetcher::default();
        let err = run_scheduler(&store, &fetcher, Duration::ZERO, CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
