//! Generator module - fetches posts and writes static HTML using the
//! built-in Tera templates

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tera::Context;
use walkdir::WalkDir;

use crate::cms::ContentApi;
use crate::content::{
    estimate_reading_time, format_posts_pagination, Feed, LoadState, PostDetail,
};
use crate::helpers::{
    date_xml, full_url_for, html_escape, page_path, parse_timestamp, post_path, url_for,
    DateFormatter, Locale,
};
use crate::richtext::{RichTextFormat, StructuredText};
use crate::templates::{
    ConfigData, ListItemData, LoadMoreData, PostViewData, SectionData, TemplateRenderer,
};
use crate::Blog;

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Listing steps written (home page plus one per "load more")
    pub listing_pages: usize,
    /// Posts in the accumulated listing
    pub posts: usize,
    /// Detail pages written
    pub post_pages: usize,
    /// Detail pages skipped because the post could not be fetched
    pub failed_posts: usize,
    /// Whether following the cursor stopped on an error
    pub load_failed: bool,
}

/// Static site generator
pub struct Generator<'a> {
    blog: &'a Blog,
    api: &'a dyn ContentApi,
    renderer: TemplateRenderer,
    dates: DateFormatter,
    rich_text: StructuredText,
    keep_failed_steps: bool,
}

/// Last listing step reached while following the cursor
struct ListingStep {
    number: usize,
    html: String,
}

impl<'a> Generator<'a> {
    /// Create a new generator reading from `api`
    pub fn new(blog: &'a Blog, api: &'a dyn ContentApi) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let dates = DateFormatter::new(Locale::from_tag(&blog.config.language), blog.config.tz());

        Ok(Self {
            blog,
            api,
            renderer,
            dates,
            rich_text: StructuredText,
            keep_failed_steps: true,
        })
    }

    /// Leave listing steps whose "load more" failed unwritten, so a server
    /// can fetch them again when they are requested
    pub fn skip_failed_steps(mut self) -> Self {
        self.keep_failed_steps = false;
        self
    }

    /// Generate the entire site
    pub fn generate(&self) -> Result<GenerateReport> {
        fs::create_dir_all(&self.blog.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.blog.public_dir))?;

        self.copy_source_assets()?;

        let mut report = GenerateReport::default();

        let feed = self.generate_listing_pages(&mut report)?;
        report.posts = feed.posts().len();

        self.generate_post_pages(&feed, &mut report)?;

        Ok(report)
    }

    /// Fetch the listing and write one page per "load more" step.
    ///
    /// Step 1 is the home page; step n lives at `page/n/` and shows every post
    /// loaded so far. Only the first fetch is fatal.
    fn generate_listing_pages(&self, report: &mut GenerateReport) -> Result<Feed> {
        let config = &self.blog.config;
        let (feed, _) = self.follow_listing(config.max_pages, report)?;

        if !report.load_failed && feed.can_load_more() {
            tracing::warn!(
                "Stopped following the listing after {} pages (max_pages)",
                config.max_pages
            );
        }

        tracing::info!(
            "Generated {} listing pages with {} posts",
            report.listing_pages,
            feed.posts().len()
        );
        Ok(feed)
    }

    /// Follow the listing up to `step`, writing every step on the way, and
    /// return the HTML shown for that step.
    ///
    /// When loading more fails earlier, the failed step is returned instead.
    /// `None` means the listing ends before `step`.
    pub fn render_listing_step(&self, step: usize) -> Result<Option<String>> {
        let mut report = GenerateReport::default();
        let (_, reached) = self.follow_listing(step, &mut report)?;

        Ok((reached.number == step || report.load_failed).then_some(reached.html))
    }

    /// Write listing steps until `stop_at`, the end of the listing, a failed
    /// load or `max_pages`, whichever comes first
    fn follow_listing(
        &self,
        stop_at: usize,
        report: &mut GenerateReport,
    ) -> Result<(Feed, ListingStep)> {
        let config = &self.blog.config;

        let first = self
            .api
            .get_by_type(&config.document_type, config.page_size)
            .context("Failed to fetch the first page of posts")?;
        let mut feed = Feed::new(format_posts_pagination(first, &self.dates));

        let mut step = 1;
        let mut first_new = 0;
        loop {
            let failed = match feed.state() {
                LoadState::Failed(message) => Some(message.clone()),
                _ => None,
            };
            let is_failed = failed.is_some();
            let has_next = !is_failed && feed.can_load_more() && step < config.max_pages;

            let html = self.render_listing_page(step, &feed, first_new, has_next, failed)?;
            let path = page_path(step);
            if is_failed && !self.keep_failed_steps {
                self.remove_page(&path)?;
            } else {
                self.write_page(&path, &html)?;
                report.listing_pages += 1;
            }

            if !has_next || step >= stop_at {
                report.load_failed = is_failed;
                return Ok((feed, ListingStep { number: step, html }));
            }

            first_new = feed.posts().len() + 1;
            feed.load_more(self.api, &self.dates);
            step += 1;
        }
    }

    fn render_listing_page(
        &self,
        step: usize,
        feed: &Feed,
        first_new: usize,
        has_next: bool,
        failed: Option<String>,
    ) -> Result<String> {
        let config = &self.blog.config;

        let posts: Vec<ListItemData> = feed
            .posts()
            .iter()
            .map(|p| ListItemData {
                url: p.uid.as_deref().map(|uid| url_for(config, &post_path(uid))),
                title: p.title.clone(),
                subtitle: p.subtitle.clone(),
                author: p.author.clone(),
                date: p.first_publication_date.clone(),
            })
            .collect();

        let load_more = LoadMoreData {
            next_url: has_next.then(|| url_for(config, &page_path(step + 1))),
            label: config.load_more_label.clone(),
            failed,
            retry_url: url_for(config, &page_path(step)),
            retry_label: config.retry_label.clone(),
        };

        let mut context = self.create_base_context(&config.description, &page_path(step));
        context.insert("posts", &posts);
        context.insert("first_new", &first_new);
        context.insert("load_more", &load_more);

        self.renderer.render("index.html", &context)
    }

    /// Fetch and write a detail page for every listed post
    fn generate_post_pages(&self, feed: &Feed, report: &mut GenerateReport) -> Result<()> {
        let mut seen = HashSet::new();

        for uid in feed.posts().iter().filter_map(|p| p.uid.as_deref()) {
            if !seen.insert(uid) {
                continue;
            }

            match self.api.get_by_uid(&self.blog.config.document_type, uid) {
                Ok(doc) => {
                    let post = PostDetail::from(doc);
                    self.write_post(&post)?;
                    report.post_pages += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping post {:?}: {}", uid, e);
                    report.failed_posts += 1;
                }
            }
        }

        tracing::info!("Generated {} post pages", report.post_pages);
        Ok(())
    }

    /// Render and write a single post page, returning the HTML
    pub fn write_post(&self, post: &PostDetail) -> Result<String> {
        let html = self.render_post(post)?;
        self.write_page(&post_path(&post.uid), &html)?;
        Ok(html)
    }

    /// Render a single post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let view = self.post_view(post);

        let mut context = self.create_base_context(&post.subtitle, &post_path(&post.uid));
        context.insert("post", &view);

        self.renderer.render("post.html", &context)
    }

    fn post_view(&self, post: &PostDetail) -> PostViewData {
        let raw_date = post.first_publication_date.as_deref();

        PostViewData {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: self.dates.format_publication_date(raw_date),
            date_xml: raw_date
                .and_then(parse_timestamp)
                .map(|d| date_xml(&d))
                .unwrap_or_default(),
            banner_url: html_escape(&post.banner_url),
            reading_time: estimate_reading_time(
                &post.content,
                &self.rich_text,
                self.blog.config.words_per_minute,
            ),
            sections: post
                .content
                .iter()
                .map(|s| SectionData {
                    heading: s.heading.clone(),
                    html: self.rich_text.as_html(&s.body),
                })
                .collect(),
        }
    }

    fn build_config_data(&self) -> ConfigData {
        let config = &self.blog.config;
        let logo = &config.logo;
        let logo_url = if logo.starts_with("http://") || logo.starts_with("https://") {
            logo.clone()
        } else {
            url_for(config, logo)
        };

        ConfigData {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            home_url: url_for(config, ""),
            logo_url: html_escape(&logo_url),
        }
    }

    /// Create a base context with common variables
    fn create_base_context(&self, description: &str, path: &str) -> Context {
        let mut context = Context::new();
        context.insert("config", &self.build_config_data());
        context.insert("description", description);
        context.insert(
            "canonical",
            &html_escape(&full_url_for(&self.blog.config, path)),
        );
        context
    }

    /// Write `html` as `<public>/<path>/index.html`
    fn write_page(&self, path: &str, html: &str) -> Result<()> {
        let output_path: PathBuf = self
            .blog
            .public_dir
            .join(path.trim_start_matches('/'))
            .join("index.html");
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Delete a stale `<public>/<path>/index.html`
    fn remove_page(&self, path: &str) -> Result<()> {
        let output_path = self
            .blog
            .public_dir
            .join(path.trim_start_matches('/'))
            .join("index.html");
        if output_path.exists() {
            fs::remove_file(&output_path)
                .with_context(|| format!("Failed to remove {:?}", output_path))?;
        }
        Ok(())
    }

    /// Copy static assets (logo, images, ...) to the public directory
    fn copy_source_assets(&self) -> Result<()> {
        let source_dir = &self.blog.source_dir;
        if !source_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
        }

        Ok(())
    }
}
