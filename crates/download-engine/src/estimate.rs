//! Per-chapter size estimates for progress weighting

use talefetch_core::Chapter;

/// Nominal audiobook bitrate used to turn a declared duration into a
/// byte estimate: 128 kbit/s.
const ESTIMATE_BYTES_PER_SECOND: u64 = 16_000;

/// Estimate for chapters with no usable duration
const FALLBACK_CHAPTER_BYTES: u64 = 25 * 1024 * 1024;

/// Initial byte estimate for one chapter.
///
/// Estimates only weight the overall progress fraction; they are
/// replaced with the server's Content-Length once the chapter's
/// transfer starts reporting.
pub fn estimate_chapter_bytes(chapter: &Chapter) -> u64 {
    match chapter.duration_seconds() {
        0 => FALLBACK_CHAPTER_BYTES,
        seconds => seconds * ESTIMATE_BYTES_PER_SECOND,
    }
}

/// Size-estimate table for a whole chapter list
pub fn estimate_all(chapters: &[Chapter]) -> Vec<u64> {
    chapters.iter().map(estimate_chapter_bytes).collect()
}
