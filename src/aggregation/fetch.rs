use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use rss::Channel;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use super::types::{RawFeedDocument, RawItem};

pub const USER_AGENT: &str = "gator";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("malformed feed: {0}")]
    Parse(#[from] rss::Error),
}

/// Retrieves and decodes one feed document.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str, deadline: Instant) -> Result<RawFeedDocument, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<Bytes, FetchError> {
        let resp = self.client.get(url).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        Ok(resp.bytes().await?)
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, deadline: Instant) -> Result<RawFeedDocument, FetchError> {
        let body = tokio::time::timeout_at(deadline, self.get(url))
            .await
            .map_err(|_| FetchError::Timeout)??;
        parse_document(&body)
    }
}

/// Decode an RSS 2.0 body and unescape HTML entities in titles and descriptions.
pub fn parse_document(xml: &[u8]) -> Result<RawFeedDocument, FetchError> {
    let channel = Channel::read_from(xml)?;
    let items = channel
        .items()
        .iter()
        .map(|item| RawItem {
            title: unescape(item.title().unwrap_or_default()),
            link: item.link().unwrap_or_default().to_string(),
            description: unescape(item.description().unwrap_or_default()),
            pub_date: item.pub_date().unwrap_or_default().to_string(),
        })
        .collect();
    Ok(RawFeedDocument {
        title: unescape(channel.title()),
        description: unescape(channel.description()),
        items,
    })
}

fn unescape(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Boot &amp;amp; Blog</title>
    <link>https://blog.test</link>
    <description>Notes &amp;lt;daily&amp;gt;</description>
    <generator>ignored</generator>
    <item>
      <title>First &amp;quot;post&amp;quot;</title>
      <link>https://blog.test/1</link>
      <description>Tom &amp;amp; Jerry</description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Second</title>
      <link>https://blog.test/2</link>
    </item>
  </channel>
</rss>"#;

    fn far_deadline() -> Instant { Instant::now() + Duration::from_secs(30) }

    #[test]
    fn parses_and_unescapes() {
        let doc = parse_document(FEED.as_bytes()).unwrap();
        assert_eq!(doc.title, "Boot & Blog");
        assert_eq!(doc.description, "Notes <daily>");
        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].title, "First \"post\"");
        assert_eq!(doc.items[0].description, "Tom & Jerry");
        assert_eq!(doc.items[0].link, "https://blog.test/1");
        assert_eq!(doc.items[0].pub_date, "Mon, 02 Jan 2006 15:04:05 -0700");
    }

    #[test]
    fn absent_optional_elements_are_empty() {
        let doc = parse_document(FEED.as_bytes()).unwrap();
        assert_eq!(doc.items[1].description, "");
        assert_eq!(doc.items[1].pub_date, "");
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let err = parse_document(b"<rss><channel><title>oops</channel>").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn non_rss_document_is_parse_error() {
        let err = parse_document(b"<html><body>hello</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn fetch_sends_user_agent_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let doc = fetcher.fetch(&format!("{}/feed.xml", server.uri()), far_deadline()).await.unwrap();
        assert_eq!(doc.items.len(), 2);
    }

    #[tokio::test]
    async fn non_200_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&server.uri(), far_deadline()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
    }

    #[tokio::test]
    async fn no_content_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&server.uri(), far_deadline()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(204)));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("this is not xml"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&server.uri(), far_deadline()).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn outer_deadline_wins_over_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let deadline = Instant::now() + Duration::from_millis(100);
        let err = fetcher.fetch(&server.uri(), deadline).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }
}
