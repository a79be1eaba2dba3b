mod command;
mod ffmpeg;
mod ytdl;

pub use command::{FFMPEG, YT_DLP};
pub use ffmpeg::{Ffmpeg, Transcoder};
pub use ytdl::{diagnose, FetchReport, MediaFetcher, Ytdl};
