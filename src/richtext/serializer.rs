//! Default structured text serializer

use super::{BlockKind, RichTextBlock, RichTextFormat, Span, SpanKind};
use crate::helpers::html_escape;

/// Structured text serializer matching the content API's own helpers:
/// blocks are joined with a single space for plain text, and rendered as
/// one HTML element per block with consecutive list items grouped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredText;

impl RichTextFormat for StructuredText {
    fn as_text(&self, blocks: &[RichTextBlock]) -> String {
        let mut result = String::new();
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                result.push(' ');
            }
            result.push_str(&block.text);
        }
        result
    }

    fn as_html(&self, blocks: &[RichTextBlock]) -> String {
        let mut html = String::new();
        let mut list: Option<BlockKind> = None;

        for block in blocks {
            let is_list = matches!(block.kind, BlockKind::ListItem | BlockKind::OListItem);

            if list.is_some() && list != Some(block.kind) {
                html.push_str(list_close(list));
                list = None;
            }
            if is_list && list.is_none() {
                html.push_str(if block.kind == BlockKind::ListItem {
                    "<ul>"
                } else {
                    "<ol>"
                });
                list = Some(block.kind);
            }

            html.push_str(&serialize_block(block));
        }

        html.push_str(list_close(list));
        html
    }
}

fn list_close(list: Option<BlockKind>) -> &'static str {
    match list {
        Some(BlockKind::ListItem) => "</ul>",
        Some(BlockKind::OListItem) => "</ol>",
        _ => "",
    }
}

fn serialize_block(block: &RichTextBlock) -> String {
    let tag = match block.kind {
        BlockKind::Paragraph => "p",
        BlockKind::Heading1 => "h1",
        BlockKind::Heading2 => "h2",
        BlockKind::Heading3 => "h3",
        BlockKind::Heading4 => "h4",
        BlockKind::Heading5 => "h5",
        BlockKind::Heading6 => "h6",
        BlockKind::Preformatted => "pre",
        BlockKind::ListItem | BlockKind::OListItem => "li",
        BlockKind::Image => return serialize_image(block),
        BlockKind::Embed => return serialize_embed(block),
        BlockKind::Unknown => return String::new(),
    };
    format!("<{tag}>{}</{tag}>", serialize_spans(&block.text, &block.spans))
}

fn serialize_image(block: &RichTextBlock) -> String {
    let url = block.url.as_deref().unwrap_or_default();
    let alt = block.alt.as_deref().unwrap_or_default();
    format!(
        r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
        html_escape(url),
        html_escape(alt)
    )
}

fn serialize_embed(block: &RichTextBlock) -> String {
    let Some(embed) = &block.oembed else {
        return String::new();
    };
    let mut attrs = String::new();
    if let Some(url) = &embed.embed_url {
        attrs.push_str(&format!(r#" data-oembed="{}""#, html_escape(url)));
    }
    if let Some(kind) = &embed.kind {
        attrs.push_str(&format!(r#" data-oembed-type="{}""#, html_escape(kind)));
    }
    if let Some(provider) = &embed.provider_name {
        attrs.push_str(&format!(
            r#" data-oembed-provider="{}""#,
            html_escape(&provider.to_lowercase())
        ));
    }
    // oEmbed html is provider markup and is emitted as-is
    format!("<div{}>{}</div>", attrs, embed.html.as_deref().unwrap_or(""))
}

/// Apply inline spans to a block's text.
///
/// Offsets count characters. Overlapping spans are closed and reopened so the
/// output always nests correctly.
fn serialize_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut spans: Vec<Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .map(|s| Span {
            end: s.end.min(len),
            ..s.clone()
        })
        .collect();
    // Outer spans open first
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();

    for pos in 0..=len {
        if open.iter().any(|s| s.end == pos) {
            let mut reopen = Vec::new();
            while let Some(span) = open.pop() {
                out.push_str(close_tag(span));
                if span.end != pos {
                    reopen.push(span);
                }
                if !open.iter().any(|s| s.end == pos) {
                    break;
                }
            }
            for span in reopen.into_iter().rev() {
                out.push_str(&open_tag(span));
                open.push(span);
            }
        }

        for span in spans.iter().filter(|s| s.start == pos) {
            out.push_str(&open_tag(span));
            open.push(span);
        }

        if pos < len {
            match chars[pos] {
                '\n' => out.push_str("<br />"),
                c => out.push_str(&html_escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Label => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or_default();
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        SpanKind::Hyperlink => {
            let data = span.data.as_ref();
            let url = data.and_then(|d| d.url.as_deref()).unwrap_or_default();
            match data.and_then(|d| d.target.as_deref()) {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    html_escape(url),
                    html_escape(target)
                ),
                None => format!(r#"<a href="{}">"#, html_escape(url)),
            }
        }
        SpanKind::Unknown => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Label | SpanKind::Unknown => "</span>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::{Embed, SpanData};

    #[test]
    fn test_as_text_joins_with_space() {
        let blocks = vec![
            RichTextBlock::paragraph("first line"),
            RichTextBlock::new(BlockKind::Heading3, "second"),
        ];
        assert_eq!(StructuredText.as_text(&blocks), "first line second");
        assert_eq!(StructuredText.as_text(&[]), "");
    }

    #[test]
    fn test_as_text_keeps_newlines() {
        let blocks = vec![RichTextBlock::paragraph("a\nb")];
        assert_eq!(StructuredText.as_text(&blocks), "a\nb");
    }

    #[test]
    fn test_paragraph_and_heading() {
        let blocks = vec![
            RichTextBlock::new(BlockKind::Heading2, "Title"),
            RichTextBlock::paragraph("1 < 2 & 3"),
        ];
        assert_eq!(
            StructuredText.as_html(&blocks),
            "<h2>Title</h2><p>1 &lt; 2 &amp; 3</p>"
        );
    }

    #[test]
    fn test_spans() {
        let block = RichTextBlock::paragraph("Hello brave world")
            .with_span(Span::new(SpanKind::Strong, 0, 5))
            .with_span(Span::link(6, 11, "https://example.com"));
        assert_eq!(
            StructuredText.as_html(&[block]),
            r#"<p><strong>Hello</strong> <a href="https://example.com">brave</a> world</p>"#
        );
    }

    #[test]
    fn test_overlapping_spans_nest() {
        let block = RichTextBlock::paragraph("abcdef")
            .with_span(Span::new(SpanKind::Strong, 0, 4))
            .with_span(Span::new(SpanKind::Em, 2, 6));
        assert_eq!(
            StructuredText.as_html(&[block]),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_span_out_of_range_is_clamped() {
        let block = RichTextBlock::paragraph("abc").with_span(Span::new(SpanKind::Em, 1, 99));
        assert_eq!(StructuredText.as_html(&[block]), "<p>a<em>bc</em></p>");
    }

    #[test]
    fn test_label_span() {
        let mut span = Span::new(SpanKind::Label, 0, 3);
        span.data = Some(SpanData {
            label: Some("codespan".to_string()),
            ..SpanData::default()
        });
        let block = RichTextBlock::paragraph("foo").with_span(span);
        assert_eq!(
            StructuredText.as_html(&[block]),
            r#"<p><span class="codespan">foo</span></p>"#
        );
    }

    #[test]
    fn test_list_grouping() {
        let blocks = vec![
            RichTextBlock::new(BlockKind::ListItem, "a"),
            RichTextBlock::new(BlockKind::ListItem, "b"),
            RichTextBlock::new(BlockKind::OListItem, "c"),
            RichTextBlock::paragraph("d"),
        ];
        assert_eq!(
            StructuredText.as_html(&blocks),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>"
        );
    }

    #[test]
    fn test_newline_becomes_br() {
        let blocks = vec![RichTextBlock::new(BlockKind::Preformatted, "a\nb")];
        assert_eq!(StructuredText.as_html(&blocks), "<pre>a<br />b</pre>");
    }

    #[test]
    fn test_image_and_embed() {
        let image = RichTextBlock {
            kind: BlockKind::Image,
            url: Some("https://img/x.png".to_string()),
            alt: Some("x".to_string()),
            ..RichTextBlock::default()
        };
        let embed = RichTextBlock {
            kind: BlockKind::Embed,
            oembed: Some(Embed {
                html: Some("<iframe></iframe>".to_string()),
                embed_url: Some("https://youtu.be/1".to_string()),
                kind: Some("video".to_string()),
                provider_name: Some("YouTube".to_string()),
            }),
            ..RichTextBlock::default()
        };
        let html = StructuredText.as_html(&[image, embed]);
        assert!(html.contains(r#"<img src="https://img/x.png" alt="x">"#));
        assert!(html.contains(r#"data-oembed-provider="youtube""#));
        assert!(html.contains("<iframe></iframe>"));
    }
}
