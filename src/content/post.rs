//! Post view models

use serde::Serialize;

use crate::cms::RawDocument;
use crate::helpers::DateFormatter;
use crate::richtext::RichTextBlock;

/// A post as shown in the home page listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// List key; duplicates are kept as delivered
    pub uid: Option<String>,

    /// Localized publication date
    pub first_publication_date: String,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Project a raw document, copying text fields verbatim
    pub fn from_raw(doc: RawDocument, dates: &DateFormatter) -> Self {
        Self {
            first_publication_date: dates
                .format_publication_date(doc.first_publication_date.as_deref()),
            uid: doc.uid,
            title: doc.data.title,
            subtitle: doc.data.subtitle,
            author: doc.data.author,
        }
    }
}

/// One page of listing results plus the cursor to the next one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostPage {
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

impl PostPage {
    /// The next cursor, if there is one. An empty cursor means there is none.
    pub fn cursor(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|c| !c.is_empty())
    }
}

/// A full post for the detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    /// Raw ISO 8601 timestamp as delivered
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    /// Sections in document order
    pub content: Vec<ContentSection>,
}

impl From<RawDocument> for PostDetail {
    fn from(doc: RawDocument) -> Self {
        let data = doc.data;
        Self {
            uid: doc.uid.unwrap_or_default(),
            first_publication_date: doc.first_publication_date,
            title: data.title,
            subtitle: data.subtitle,
            author: data.author,
            banner_url: data.banner.and_then(|b| b.url).unwrap_or_default(),
            content: data
                .content
                .into_iter()
                .map(|s| ContentSection {
                    heading: s.heading,
                    body: s.body,
                })
                .collect(),
        }
    }
}

/// A heading followed by rich text
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

impl ContentSection {
    pub fn new(heading: impl Into<String>, body: Vec<RichTextBlock>) -> Self {
        Self {
            heading: heading.into(),
            body,
        }
    }
}
