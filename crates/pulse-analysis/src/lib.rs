pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::{AnalysisClient, AnthropicClient};
pub use error::AnalysisError;
pub use types::AnalysisRequest;
