mod job;
mod time;

pub use job::{Category, Job, VideoId};
pub use time::{format_seconds, TimeRange};
