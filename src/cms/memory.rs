//! In-memory content API used by tests

use std::collections::HashMap;
use std::sync::Mutex;

use super::raw::{RawDocument, RawPostData, RawQuery, RawSection};
use super::{ContentApi, FetchError};

/// Serves canned pages and documents and records every request
#[derive(Default)]
pub struct MemoryApi {
    first: Option<RawQuery>,
    pages: HashMap<String, RawQuery>,
    failing: HashMap<String, FetchError>,
    documents: HashMap<String, RawDocument>,
    calls: Mutex<Vec<String>>,
}

impl MemoryApi {
    pub fn new(first: RawQuery) -> Self {
        Self {
            first: Some(first),
            ..Self::default()
        }
    }

    /// Register the page returned for a cursor
    pub fn with_page(mut self, cursor: &str, page: RawQuery) -> Self {
        self.pages.insert(cursor.to_string(), page);
        self
    }

    /// Make a cursor fail
    pub fn with_failure(mut self, cursor: &str, err: FetchError) -> Self {
        self.failing.insert(cursor.to_string(), err);
        self
    }

    /// Make fetching the document `uid` fail
    pub fn with_document_failure(mut self, uid: &str, err: FetchError) -> Self {
        self.failing.insert(format!("uid:{}", uid), err);
        self
    }

    /// Register a full document
    pub fn with_document(mut self, doc: RawDocument) -> Self {
        let uid = doc.uid.clone().unwrap_or_default();
        self.documents.insert(uid, doc);
        self
    }

    /// Requests seen so far, as `type:<name>`, `uid:<uid>` or the cursor
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ContentApi for MemoryApi {
    fn get_by_type(&self, type_name: &str, _page_size: usize) -> Result<RawQuery, FetchError> {
        self.record(format!("type:{}", type_name));
        self.first.clone().ok_or_else(|| FetchError::Status {
            url: "memory://first".to_string(),
            status: 503,
        })
    }

    fn get_by_uid(&self, type_name: &str, uid: &str) -> Result<RawDocument, FetchError> {
        let call = format!("uid:{}", uid);
        self.record(call.clone());
        if let Some(err) = self.failing.get(&call) {
            return Err(err.clone());
        }
        self.documents
            .get(uid)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                type_name: type_name.to_string(),
                uid: uid.to_string(),
            })
    }

    fn fetch_page(&self, url: &str) -> Result<RawQuery, FetchError> {
        self.record(url.to_string());
        if let Some(err) = self.failing.get(url) {
            return Err(err.clone());
        }
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// List entry with the given uid and title
pub fn summary(uid: &str, title: &str) -> RawDocument {
    RawDocument {
        uid: Some(uid.to_string()),
        kind: Some("post".to_string()),
        first_publication_date: Some("2021-05-01T00:00:00+0000".to_string()),
        data: RawPostData {
            title: title.to_string(),
            subtitle: format!("{} subtitle", title),
            author: "Joseph Oliveira".to_string(),
            ..RawPostData::default()
        },
        ..RawDocument::default()
    }
}

/// A page of results with an optional cursor
pub fn page(results: Vec<RawDocument>, next_page: Option<&str>) -> RawQuery {
    RawQuery {
        results,
        next_page: next_page.map(str::to_string),
        ..RawQuery::default()
    }
}

/// Full document with banner and sections
pub fn document(uid: &str, title: &str, sections: Vec<RawSection>) -> RawDocument {
    let mut doc = summary(uid, title);
    doc.data.banner = Some(super::raw::RawImage {
        url: Some(format!("https://images.example.com/{}.png", uid)),
        alt: None,
    });
    doc.data.content = sections;
    doc
}
