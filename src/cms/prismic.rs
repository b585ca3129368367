//! HTTP client for a Prismic-style REST API

use serde::de::DeserializeOwned;
use std::sync::Mutex;
use std::time::Duration;

use super::raw::{RawApi, RawDocument, RawQuery};
use super::{ContentApi, FetchError};
use crate::config::SiteConfig;

/// Blocking client for the content API
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    agent: ureq::Agent,
    master_ref: Mutex<Option<String>>,
}

impl PrismicClient {
    /// Create a client for an API endpoint such as
    /// `https://<repo>.cdn.prismic.io/api/v2`
    pub fn new(endpoint: &str, access_token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("ignite-blog/", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
            agent,
            master_ref: Mutex::new(None),
        }
    }

    /// Create a client from site configuration
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(&config.api_endpoint, config.access_token.clone())
    }

    /// Resolve (and remember) the ref documents are read from
    fn master_ref(&self) -> Result<String, FetchError> {
        let mut cached = self
            .master_ref
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(reference) = cached.as_ref() {
            return Ok(reference.clone());
        }

        let api: RawApi = self.get_json(&self.endpoint, &self.token_param())?;
        let reference = api
            .master_ref()
            .ok_or_else(|| FetchError::MissingRef(self.endpoint.clone()))?
            .to_string();
        tracing::debug!("Resolved master ref {}", reference);
        *cached = Some(reference.clone());
        Ok(reference)
    }

    fn token_param(&self) -> Vec<(&'static str, String)> {
        self.access_token
            .iter()
            .map(|t| ("access_token", t.clone()))
            .collect()
    }

    /// Run a predicate query against `/documents/search`
    fn search(&self, predicate: &str, page_size: Option<usize>) -> Result<RawQuery, FetchError> {
        let mut params = vec![("ref", self.master_ref()?), ("q", predicate.to_string())];
        if let Some(size) = page_size {
            params.push(("pageSize", size.to_string()));
        }
        params.extend(self.token_param());

        let url = format!("{}/documents/search", self.endpoint);
        self.get_json(&url, &params)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let mut request = self.agent.get(url);
        for (key, value) in params {
            request = request.query(key, value);
        }

        tracing::debug!("GET {}", url);
        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(status, _) => FetchError::Status {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => FetchError::Http {
                url: url.to_string(),
                message: transport.to_string(),
            },
        })?;

        let body = response.into_string().map_err(|e| FetchError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl ContentApi for PrismicClient {
    fn get_by_type(&self, type_name: &str, page_size: usize) -> Result<RawQuery, FetchError> {
        self.search(&type_predicate(type_name), Some(page_size))
    }

    fn get_by_uid(&self, type_name: &str, uid: &str) -> Result<RawDocument, FetchError> {
        let query = self.search(&uid_predicate(type_name, uid), None)?;
        query
            .results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound {
                type_name: type_name.to_string(),
                uid: uid.to_string(),
            })
    }

    fn fetch_page(&self, url: &str) -> Result<RawQuery, FetchError> {
        // The cursor already carries ref, predicate and token
        self.get_json(url, &[])
    }
}

fn type_predicate(type_name: &str) -> String {
    format!(r#"[[at(document.type,"{}")]]"#, quote(type_name))
}

fn uid_predicate(type_name: &str, uid: &str) -> String {
    format!(r#"[[at(my.{}.uid,"{}")]]"#, type_name, quote(uid))
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
