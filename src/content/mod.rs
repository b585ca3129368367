//! Content module - view models, listing pagination and reading time

mod pagination;
mod post;
mod reading_time;

pub use pagination::{format_posts_pagination, Feed, LoadState};
pub use post::{ContentSection, PostDetail, PostPage, PostSummary};
pub use reading_time::{estimate_reading_time, section_words, WORDS_PER_MINUTE};
