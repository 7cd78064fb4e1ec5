pub mod job;
pub mod map;
pub mod user;

pub use job::{CommandRecord, JobState, JobStatusRecord, JobStatusView};
pub use map::{format_bytes, validate_tags, ElementCounts, MapRecord, MapTags};
pub use user::User;
