//! Discovery pipeline: refresh, probing, progress, and scheduling.

pub mod probe;
pub mod progress;
pub mod refresher;
pub mod service;

pub use probe::{DirectProber, DiscoveryOptions};
pub use progress::{CrawlPhase, CrawlStatus, CrawlerProgress, ProgressTracker};
pub use refresher::{EndpointRefresher, RefreshOutcome};
pub use service::{CrawlerService, ScheduleConfig};
