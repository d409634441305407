//! Pagination metadata from `reqwest` response headers.

use idconsole_domain::{PaginationHeaders, PaginationMeta, parse_pagination_headers};
use reqwest::header::HeaderMap;

/// Borrowed view of a `HeaderMap` for the domain header parser.
#[derive(Debug, Clone, Copy)]
pub struct HeaderMapView<'a>(pub &'a HeaderMap);

impl PaginationHeaders for HeaderMapView<'_> {
    fn header(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Parse `Link` and `X-Total-Count` from response headers.
pub fn pagination_from_headers(headers: &HeaderMap) -> PaginationMeta {
    parse_pagination_headers(&HeaderMapView(headers))
}
