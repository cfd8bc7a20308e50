pub mod client;
pub mod error;
pub mod number;

pub use client::{Delivery, MessagingClient, TwilioClient, MAX_BODY_CHARS};
pub use error::MessagingError;
pub use number::normalize_e164;
