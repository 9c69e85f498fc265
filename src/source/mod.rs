//! HTTP/HTML listing source
//!
//! A [`crate::crawler::PageAccessor`] for listings served as plain HTML:
//! - HTTP fetching with status classification
//! - Card, pagination and detail parsing with CSS selectors
//! - Page positioning through a query parameter

mod fetch;
mod html;
mod parse;

pub use fetch::{build_http_client, fetch_url, FetchResult};
pub use html::HtmlPageAccessor;
pub use parse::{collapse_whitespace, parse_detail, parse_listing, ListingPage};
