//! Listing pagination: raw query results to view models, and the
//! accumulating "load more" feed

use serde::Serialize;

use super::{PostPage, PostSummary};
use crate::cms::{ContentApi, FetchError, RawQuery};
use crate::helpers::DateFormatter;

/// Map a raw query result to a listing page.
///
/// Provider order is kept and nothing is filtered or merged.
pub fn format_posts_pagination(raw: RawQuery, dates: &DateFormatter) -> PostPage {
    PostPage {
        next_page: raw.next_page,
        results: raw
            .results
            .into_iter()
            .map(|doc| PostSummary::from_raw(doc, dates))
            .collect(),
    }
}

/// State of the "load more" action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    /// Last load failed; the cursor is kept so it can be retried
    Failed(String),
}

/// Accumulated listing: every post loaded so far and the cursor to the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feed {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    state: LoadState,
    pages: usize,
}

impl Feed {
    /// Start from the first page
    pub fn new(first: PostPage) -> Self {
        let mut feed = Self::default();
        feed.apply(first);
        feed
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    /// Current cursor, `None` once the last page has been loaded
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Number of pages applied so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Whether triggering "load more" would fetch anything
    pub fn can_load_more(&self) -> bool {
        self.next_page().is_some() && self.state != LoadState::Loading
    }

    /// Claim the cursor for a fetch.
    ///
    /// Returns `None` when there is nothing left to load or a load is already
    /// in flight, so a second trigger never races the first.
    pub fn begin_load(&mut self) -> Option<String> {
        if !self.can_load_more() {
            return None;
        }
        self.state = LoadState::Loading;
        self.next_page().map(str::to_string)
    }

    /// Settle a fetch started with [`Feed::begin_load`]
    pub fn finish_load(&mut self, result: Result<PostPage, FetchError>) {
        match result {
            Ok(page) => {
                self.apply(page);
                self.state = LoadState::Idle;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!("Failed to load more posts, retry later: {}", e);
                } else {
                    tracing::error!("Failed to load more posts: {}", e);
                }
                self.state = LoadState::Failed(e.to_string());
            }
        }
    }

    /// Append a page's results and take over its cursor
    pub fn apply(&mut self, page: PostPage) {
        self.next_page = page.cursor().map(str::to_string);
        self.posts.extend(page.results);
        self.pages += 1;
    }

    /// Fetch and apply the next page. Returns `false` without fetching when
    /// there is nothing to load.
    pub fn load_more<A>(&mut self, api: &A, dates: &DateFormatter) -> bool
    where
        A: ContentApi + ?Sized,
    {
        let Some(cursor) = self.begin_load() else {
            return false;
        };
        tracing::debug!("Loading more posts from {}", cursor);
        let result = api
            .fetch_page(&cursor)
            .map(|raw| format_posts_pagination(raw, dates));
        self.finish_load(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::memory::{self, MemoryApi};

    fn dates() -> DateFormatter {
        DateFormatter::default()
    }

    fn uids(posts: &[PostSummary]) -> Vec<&str> {
        posts.iter().map(|p| p.uid.as_deref().unwrap_or("-")).collect()
    }

    #[test]
    fn test_maps_identifier_and_fields() {
        let raw = memory::page(
            vec![{
                let mut doc = memory::summary("abc", "T");
                doc.data.subtitle = "S".to_string();
                doc.data.author = "A".to_string();
                doc.first_publication_date = Some("2021-05-01T00:00:00Z".to_string());
                doc
            }],
            None,
        );
        let page = format_posts_pagination(raw, &dates());
        let post = &page.results[0];
        assert_eq!(post.uid.as_deref(), Some("abc"));
        assert_eq!(post.title, "T");
        assert_eq!(post.subtitle, "S");
        assert_eq!(post.author, "A");
        assert!(!post.first_publication_date.is_empty());
        assert_eq!(post.first_publication_date, "1 de mai de 2021");
    }

    #[test]
    fn test_keeps_order_and_duplicates() {
        let raw = memory::page(
            vec![
                memory::summary("b", "B"),
                memory::summary("a", "A"),
                memory::summary("b", "B again"),
            ],
            Some("cursor-2"),
        );
        let page = format_posts_pagination(raw, &dates());
        assert_eq!(uids(&page.results), vec!["b", "a", "b"]);
        assert_eq!(page.results[2].title, "B again");
        assert_eq!(page.next_page.as_deref(), Some("cursor-2"));
    }

    // Null publication dates are formatted as the epoch instead of being
    // surfaced as missing.
    #[test]
    fn test_null_publication_date_is_still_formatted() {
        let mut doc = memory::summary("abc", "T");
        doc.first_publication_date = None;
        let page = format_posts_pagination(memory::page(vec![doc], None), &dates());
        assert_eq!(page.results[0].first_publication_date, "1 de jan de 1970");
    }

    #[test]
    fn test_empty_results() {
        let page = format_posts_pagination(RawQuery::default(), &dates());
        assert!(page.results.is_empty());
        assert_eq!(page.cursor(), None);
    }

    #[test]
    fn test_load_more_appends_and_replaces_cursor() {
        let api = MemoryApi::new(memory::page(vec![], None))
            .with_page(
                "p2",
                memory::page(
                    vec![memory::summary("c", "C"), memory::summary("d", "D")],
                    Some("p3"),
                ),
            )
            .with_page("p3", memory::page(vec![memory::summary("e", "E")], Some("")));

        let first = format_posts_pagination(
            memory::page(
                vec![memory::summary("a", "A"), memory::summary("b", "B")],
                Some("p2"),
            ),
            &dates(),
        );
        let mut feed = Feed::new(first);
        assert_eq!(feed.pages(), 1);

        assert!(feed.load_more(&api, &dates()));
        assert_eq!(uids(feed.posts()), vec!["a", "b", "c", "d"]);
        assert_eq!(feed.next_page(), Some("p3"));

        assert!(feed.load_more(&api, &dates()));
        assert_eq!(uids(feed.posts()), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(feed.next_page(), None);
        assert_eq!(feed.state(), &LoadState::Idle);
        assert_eq!(feed.pages(), 3);
    }

    #[test]
    fn test_terminal_page_never_fetches() {
        let api = MemoryApi::new(memory::page(vec![], None));
        let mut feed = Feed::new(format_posts_pagination(
            memory::page(vec![memory::summary("a", "A")], None),
            &dates(),
        ));
        assert!(!feed.can_load_more());
        assert!(!feed.load_more(&api, &dates()));
        assert!(api.calls().is_empty());
        assert_eq!(feed.posts().len(), 1);
    }

    #[test]
    fn test_second_trigger_while_loading_is_ignored() {
        let mut feed = Feed::new(PostPage {
            next_page: Some("p2".to_string()),
            results: vec![],
        });
        assert_eq!(feed.begin_load().as_deref(), Some("p2"));
        assert_eq!(feed.state(), &LoadState::Loading);
        assert_eq!(feed.begin_load(), None);

        feed.finish_load(Ok(PostPage {
            next_page: None,
            results: vec![],
        }));
        assert_eq!(feed.state(), &LoadState::Idle);
        assert_eq!(feed.begin_load(), None);
    }

    #[test]
    fn test_failure_keeps_state_and_allows_retry() {
        let err = FetchError::Status {
            url: "p2".to_string(),
            status: 503,
        };
        let api = MemoryApi::new(memory::page(vec![], None)).with_failure("p2", err.clone());
        let mut feed = Feed::new(format_posts_pagination(
            memory::page(vec![memory::summary("a", "A")], Some("p2")),
            &dates(),
        ));

        assert!(feed.load_more(&api, &dates()));
        assert_eq!(feed.state(), &LoadState::Failed(err.to_string()));
        assert_eq!(uids(feed.posts()), vec!["a"]);
        assert_eq!(feed.next_page(), Some("p2"));

        // Retrying reuses the same cursor
        assert!(feed.can_load_more());
        assert_eq!(feed.begin_load().as_deref(), Some("p2"));
    }

    #[test]
    fn test_load_state_serializes_for_templates() {
        let json = serde_json::to_value(LoadState::Failed("boom".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"state": "failed", "message": "boom"}));
        let json = serde_json::to_value(LoadState::Idle).unwrap();
        assert_eq!(json, serde_json::json!({"state": "idle"}));
    }
}
