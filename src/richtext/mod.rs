//! Rich text module - structured text blocks as delivered by the content API
//!
//! The content API ships post bodies as an ordered list of blocks (one per
//! paragraph, heading, list item, image...) with inline spans expressed as
//! character offsets. [`RichTextFormat`] turns those blocks into plain text
//! (used for reading time) or HTML (used for rendering).

mod serializer;

use serde::{Deserialize, Serialize};

pub use serializer::StructuredText;

/// Converts structured text blocks to plain text or markup
pub trait RichTextFormat {
    /// Flatten blocks to plain text, one separator between blocks
    fn as_text(&self, blocks: &[RichTextBlock]) -> String;

    /// Render blocks to HTML
    fn as_html(&self, blocks: &[RichTextBlock]) -> String;
}

/// Block type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Unknown,
}

/// A single rich text block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub text: String,
    pub spans: Vec<Span>,

    /// Image source (image blocks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Image alternative text (image blocks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// oEmbed payload (embed blocks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

impl RichTextBlock {
    /// Create a text block of the given kind with no spans
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            ..Self::default()
        }
    }

    /// Create a plain paragraph
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    /// Attach a span
    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }
}

/// Inline span kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Inline formatting over `[start, end)` character offsets of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

impl Span {
    pub fn new(kind: SpanKind, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            kind,
            data: None,
        }
    }

    /// Hyperlink span pointing at `url`
    pub fn link(start: usize, end: usize, url: impl Into<String>) -> Self {
        Self {
            start,
            end,
            kind: SpanKind::Hyperlink,
            data: Some(SpanData {
                url: Some(url.into()),
                ..SpanData::default()
            }),
        }
    }
}

/// Extra span payload (links and labels)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    pub url: Option<String>,
    pub target: Option<String>,
    pub label: Option<String>,
}

/// oEmbed payload attached to embed blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Embed {
    pub html: Option<String>,
    pub embed_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub provider_name: Option<String>,
}
