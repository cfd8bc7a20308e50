//! Slot dispatching and the actions behind each slot: profile scans, trend
//! checks, idea composition with a specificity gate, reminder messages,
//! no-post nudges, the weekly report and engagement feedback.

pub mod actions;
pub mod compose;
pub mod dispatcher;
pub mod error;
pub mod feedback;
pub mod prompts;
pub mod reminder;
pub mod report;
pub mod specificity;
mod terms;

pub use actions::{Agent, AgentSettings, Collaborators};
pub use compose::{Composer, Composition, IdeaBatch, IdeaOrigin, ScoredIdea};
pub use dispatcher::{Dispatcher, DispatcherConfig, SlotFailure, SlotHandler, TickReport};
pub use error::{ErrorKind, SlotError};
pub use reminder::NoPostCheck;
pub use report::{render_weekly_report, WeeklyStats};
pub use specificity::{check_specificity, Specificity, SpecificityPolicy, VagueReason};
