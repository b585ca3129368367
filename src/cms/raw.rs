//! Raw response shapes returned by the content API
//!
//! Nothing here is validated. Missing or `null` fields fall back to their
//! defaults so that whatever the provider sends reaches the view models.

use serde::{Deserialize, Deserializer, Serialize};

use crate::richtext::RichTextBlock;

/// A page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawQuery {
    pub page: u32,
    pub results_per_page: u32,
    pub results_size: u32,
    pub total_results_size: u32,
    pub total_pages: u32,
    /// Absolute URL of the next page, `null` on the last page
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<RawDocument>,
}

/// A single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    pub id: Option<String>,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub data: RawPostData,
}

/// Custom fields of a `post` document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPostData {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    pub banner: Option<RawImage>,
    #[serde(deserialize_with = "null_as_default")]
    pub content: Vec<RawSection>,
}

/// Image field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawImage {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// One entry of the `content` group field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSection {
    #[serde(deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: Vec<RichTextBlock>,
}

/// API root document, used to discover the master ref
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawApi {
    pub refs: Vec<RawRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "isMasterRef")]
    pub is_master_ref: bool,
}

impl RawApi {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let json = r#"{
            "page": 1,
            "results_per_page": 3,
            "results_size": 1,
            "total_results_size": 4,
            "total_pages": 2,
            "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?page=2",
            "prev_page": null,
            "results": [{
                "id": "YF1",
                "uid": "como-utilizar-hooks",
                "type": "post",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "last_publication_date": "2021-03-15T19:25:28+0000",
                "tags": [],
                "data": {"title": "Como utilizar Hooks", "subtitle": "Pensando em sincronização", "author": "Joseph Oliveira"}
            }]
        }"#;
        let query: RawQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.total_pages, 2);
        assert!(query.next_page.is_some());
        let doc = &query.results[0];
        assert_eq!(doc.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(doc.data.author, "Joseph Oliveira");
        assert!(doc.data.content.is_empty());
    }

    #[test]
    fn test_nulls_fall_back_to_defaults() {
        let json = r#"{
            "next_page": null,
            "results": null
        }"#;
        let query: RawQuery = serde_json::from_str(json).unwrap();
        assert!(query.results.is_empty());

        let doc: RawDocument = serde_json::from_str(
            r#"{"uid": null, "first_publication_date": null,
                "data": {"title": null, "content": [{"heading": null, "body": null}]}}"#,
        )
        .unwrap();
        assert_eq!(doc.uid, None);
        assert_eq!(doc.data.title, "");
        assert_eq!(doc.data.content.len(), 1);
        assert!(doc.data.content[0].body.is_empty());
    }

    #[test]
    fn test_master_ref() {
        let api: RawApi = serde_json::from_str(
            r#"{"refs": [
                {"id": "preview", "ref": "P1", "isMasterRef": false},
                {"id": "master", "ref": "M1", "label": "Master", "isMasterRef": true}
            ]}"#,
        )
        .unwrap();
        assert_eq!(api.master_ref(), Some("M1"));
        assert_eq!(RawApi::default().master_ref(), None);
    }
}
