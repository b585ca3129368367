//! List posts available from the content API

use anyhow::{Context, Result};
use std::io::Write;

use crate::cms::ContentApi;
use crate::content::{format_posts_pagination, Feed, LoadState};
use crate::helpers::{DateFormatter, Locale};
use crate::Blog;

/// Print every post the listing would show
pub fn run(blog: &Blog) -> Result<()> {
    let client = blog.client();
    let stdout = std::io::stdout();
    list_posts(blog, &client, &mut stdout.lock())
}

/// Follow the listing to its end and write one line per post
pub fn list_posts<W: Write>(blog: &Blog, api: &dyn ContentApi, out: &mut W) -> Result<()> {
    let config = &blog.config;
    let dates = DateFormatter::new(Locale::from_tag(&config.language), config.tz());

    let first = api
        .get_by_type(&config.document_type, config.page_size)
        .context("Failed to fetch the first page of posts")?;
    let mut feed = Feed::new(format_posts_pagination(first, &dates));

    while feed.pages() < config.max_pages && feed.load_more(api, &dates) {
        if let LoadState::Failed(message) = feed.state() {
            writeln!(out, "warning: listing incomplete: {}", message)?;
            break;
        }
    }

    writeln!(out, "Posts ({}):", feed.posts().len())?;
    for post in feed.posts() {
        writeln!(
            out,
            "  {} - {} [{}]",
            post.first_publication_date,
            post.title,
            post.uid.as_deref().unwrap_or("-")
        )?;
    }

    Ok(())
}
