pub mod app_config;
pub mod config;
pub mod ideas;
pub mod messages;
pub mod posts;
pub mod profile;
pub mod schedule;
pub mod trends;
pub mod weights;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use ideas::{Idea, IdeaStatus, NewIdea};
pub use messages::{DeliveryStatus, MessageCategory, MessageKind, SentMessage};
pub use posts::{mean_engagement, Platform, ProfilePost};
pub use profile::{
    load_profile, parse_profile, AgentProfile, CreatorProfile, PostingWindow, TrendConfig,
};
pub use schedule::{
    default_timetable, parse_time_of_day, DayTable, Rollover, ScheduleSlot, SlotAction,
    SlotEntry, SlotStatus,
};
pub use trends::{NewTrendItem, TrendItem};
pub use weights::{LearningParams, WeightSet, DEFAULT_WEIGHT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read profile file {path}: {source}")]
    ProfileFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile file: {0}")]
    ProfileFileParse(#[from] serde_yaml::Error),

    #[error("profile validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("idea status cannot move from {from} to {to}")]
    InvalidStatusTransition { from: IdeaStatus, to: IdeaStatus },

    #[error("unknown {kind}: \"{value}\"")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("invalid time of day \"{0}\"; expected HH:MM")]
    InvalidTimeOfDay(String),
}
