//! Content API module - fetching posts from the headless CMS

mod error;
#[cfg(test)]
pub mod memory;
mod prismic;
pub mod raw;

pub use error::FetchError;
pub use prismic::PrismicClient;
pub use raw::{RawDocument, RawQuery};

/// Read access to the content service
pub trait ContentApi {
    /// First page of documents of `type_name`
    fn get_by_type(&self, type_name: &str, page_size: usize) -> Result<RawQuery, FetchError>;

    /// Single document of `type_name` by its uid
    fn get_by_uid(&self, type_name: &str, uid: &str) -> Result<RawDocument, FetchError>;

    /// Follow an opaque `next_page` cursor
    fn fetch_page(&self, url: &str) -> Result<RawQuery, FetchError>;
}
