pub mod client;
pub mod error;
pub mod normalize;
mod rate_limit;
pub mod types;

pub use client::{ApifyClient, ScraperClient};
pub use error::ScraperError;
pub use normalize::{normalize_instagram, normalize_tiktok};
pub use types::{InstagramPost, InstagramProfileItem, TiktokItem};
