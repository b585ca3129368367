//! Estimated reading time

use super::ContentSection;
use crate::richtext::RichTextFormat;

/// Default reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Estimate reading time in minutes.
///
/// Each section is rounded up on its own and the results are summed, so a
/// post with many short sections reads "longer" than its total word count
/// suggests. Empty content is 0 minutes.
pub fn estimate_reading_time<F>(
    sections: &[ContentSection],
    formatter: &F,
    words_per_minute: usize,
) -> u32
where
    F: RichTextFormat + ?Sized,
{
    let wpm = words_per_minute.max(1);
    let minutes: usize = sections
        .iter()
        .map(|section| section_words(section, formatter).div_ceil(wpm))
        .sum();
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Word count of one section: heading tokens plus body tokens.
///
/// Tokens are whatever lies between single spaces, so consecutive spaces and
/// empty strings still produce (empty) tokens.
pub fn section_words<F>(section: &ContentSection, formatter: &F) -> usize
where
    F: RichTextFormat + ?Sized,
{
    let heading = section.heading.split(' ').count();
    let body: String = formatter
        .as_text(&section.body)
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .collect();
    heading + body.split(' ').count()
}
