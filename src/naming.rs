use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::types::{Category, VideoId};

/// Number of segments already assigned to each video of the active category
#[derive(Debug, Default)]
pub struct SegmentCounters(HashMap<VideoId, u32>);

impl SegmentCounters {
    /// Return the segment index for a new occurrence of the video
    /// and bump its counter.
    pub fn next_index(&mut self, video_id: &VideoId) -> u32 {
        let count = self.0.entry(video_id.clone()).or_insert(0);
        let idx = *count;
        *count += 1;
        idx
    }

    pub fn reset(&mut self) {
        self.0.clear();
    }
}

/// `<category>-<video_id>_seg<segment>.wav`
pub fn output_file_name(category: &Category, video_id: &VideoId, segment: u32) -> String {
    format!("{category}-{video_id}_seg{segment}.wav")
}

/// Full path of a segment under the wav root
pub fn output_path(
    wav_root: &Path,
    category: &Category,
    video_id: &VideoId,
    segment: u32,
) -> PathBuf {
    category_dir(wav_root, category).join(output_file_name(category, video_id, segment))
}

pub fn category_dir(wav_root: &Path, category: &Category) -> PathBuf {
    wav_root.join(&**category)
}

/// Where the full stream of a video is downloaded before being trimmed.
///
/// Keyed by video only: two jobs on the same video reuse the same path,
/// which only holds because jobs run one after the other.
pub fn temp_path(dir: &Path, video_id: &VideoId) -> PathBuf {
    dir.join(format!("temp_{video_id}.wav"))
}
