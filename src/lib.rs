pub mod aggregator;
pub mod config;
pub mod digest;
pub mod fetcher;
pub mod mailer;
pub mod normalizer;
pub mod persist;
pub mod types;
pub mod window;

pub use aggregator::FeedAggregator;
pub use config::{EmailConfig, FeedList, LimitPolicy};
pub use digest::{render_digest, RenderedDigest};
pub use fetcher::{FeedFetcher, FetchConfig};
pub use mailer::SmtpSettings;
pub use types::{Article, DigestError, FeedFailure, FeedSnapshot, Result};
pub use window::WindowPolicy;
