pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod scheduling;
pub mod session;

pub use clock::{ClockSource, FixedClock, ManualClock, OffsetClock, SystemClock};
pub use config::SchedulerConfig;
pub use database::{SqliteStore, StateStore};
pub use error::{ConfigError, Result, ReviewError, StoreError};
pub use models::{
    Grade, LearningItem, ProgressEvent, RawGrade, ReviewOutcome, ReviewSubmission, ScheduleState,
    Transition,
};
pub use scheduling::{DailyLimiter, DeckStats, ReviewQueueBuilder, ReviewScheduler};
pub use session::ReviewSession;
