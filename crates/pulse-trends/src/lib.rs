pub mod client;
pub mod error;
pub mod parse;
pub mod relevance;
pub mod types;

pub use client::{RssTrendSource, TrendSource};
pub use error::TrendError;
pub use parse::parse_feed;
pub use relevance::score_entries;
pub use types::FeedEntry;
