pub mod grade;
pub mod learning_item;
pub mod review;
pub mod schedule_state;

pub use grade::{Grade, RawGrade};
pub use learning_item::LearningItem;
pub use review::{ProgressEvent, ReviewOutcome, ReviewSubmission, Transition};
pub use schedule_state::ScheduleState;
