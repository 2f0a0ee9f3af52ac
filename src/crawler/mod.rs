//! Multi-source endpoint discovery.
//!
//! The aggregator runs every registered [`EndpointSource`] to completion,
//! unions the results, and reports per-source progress through a
//! [`CrawlObserver`]. Source failures are logged and swallowed so one
//! provider cannot abort a crawl cycle.

pub mod extract;
pub mod sources;
pub mod validator;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

pub use sources::{EcosystemSource, EndpointSource, GithubSource, SourceError};
pub use validator::{EndpointValidator, HttpValidator};

/// Observer for crawl progress events.
///
/// Decouples the pipeline from any particular consumer: the progress
/// tracker implements this, tests plug in counters, and one-shot CLI runs
/// use [`NoopObserver`].
pub trait CrawlObserver: Send + Sync {
    /// Called before and after each source runs with the running discovered
    /// count and, on completion, the number of URLs that source produced.
    fn on_source_progress(&self, source: &str, discovered: usize, source_total: usize);
}

/// Observer that ignores all events.
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {
    fn on_source_progress(&self, _source: &str, _discovered: usize, _source_total: usize) {}
}

/// Run all sources and union their candidate URLs.
///
/// Duplicates across sources collapse; first-seen order is kept. Ordering
/// across sources is otherwise not significant.
pub async fn crawl_all_sources(
    sources: &[Arc<dyn EndpointSource>],
    observer: &dyn CrawlObserver,
) -> Vec<String> {
    let mut all_urls = Vec::new();
    let mut seen = HashSet::new();

    info!(sources = sources.len(), "Starting crawl of all sources");

    for source in sources {
        observer.on_source_progress(source.name(), all_urls.len(), 0);

        match source.crawl().await {
            Ok(urls) => {
                let source_total = urls.len();
                for url in urls {
                    if seen.insert(url.clone()) {
                        all_urls.push(url);
                    }
                }
                observer.on_source_progress(source.name(), all_urls.len(), source_total);
                info!(source = source.name(), discovered = source_total, "Source completed");
            }
            Err(error) => {
                warn!(source = source.name(), error = %error, "Source crawl failed");
            }
        }
    }

    all_urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedSource {
        name: &'static str,
        urls: Vec<String>,
    }

    #[async_trait]
    impl EndpointSource for FixedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn crawl(&self) -> sources::Result<Vec<String>> {
            Ok(self.urls.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EndpointSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn crawl(&self) -> sources::Result<Vec<String>> {
            Err(SourceError::Malformed("boom".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<(String, usize, usize)>>,
    }

    impl CrawlObserver for RecordingObserver {
        fn on_source_progress(&self, source: &str, discovered: usize, source_total: usize) {
            self.events
                .lock()
                .unwrap()
                .push((source.to_string(), discovered, source_total));
        }
    }

    #[tokio::test]
    async fn test_union_across_sources() {
        let sources: Vec<Arc<dyn EndpointSource>> = vec![
            Arc::new(FixedSource {
                name: "a",
                urls: vec!["https://api.one.test/v1".into(), "https://api.two.test/v1".into()],
            }),
            Arc::new(FixedSource {
                name: "b",
                urls: vec!["https://api.two.test/v1".into(), "https://api.three.test/v1".into()],
            }),
        ];

        let urls = crawl_all_sources(&sources, &NoopObserver).await;
        assert_eq!(
            urls,
            vec![
                "https://api.one.test/v1",
                "https://api.two.test/v1",
                "https://api.three.test/v1"
            ]
        );
    }

    #[tokio::test]
    async fn test_source_failure_is_isolated() {
        let sources: Vec<Arc<dyn EndpointSource>> = vec![
            Arc::new(FailingSource),
            Arc::new(FixedSource {
                name: "ok",
                urls: vec!["https://api.ok.test/v1".into()],
            }),
        ];

        let urls = crawl_all_sources(&sources, &NoopObserver).await;
        assert_eq!(urls, vec!["https://api.ok.test/v1"]);
    }

    #[tokio::test]
    async fn test_observer_receives_completion_events() {
        let sources: Vec<Arc<dyn EndpointSource>> = vec![Arc::new(FixedSource {
            name: "a",
            urls: vec!["https://api.one.test/v1".into()],
        })];

        let observer = RecordingObserver::default();
        crawl_all_sources(&sources, &observer).await;

        let events = observer.events.lock().unwrap();
        assert_eq!(events.as_slice(), &[
            ("a".to_string(), 0, 0),
            ("a".to_string(), 1, 1),
        ]);
    }
}
