//! Token pagination metadata from `Link` and `X-Total-Count` response headers.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use url::Url;

static TARGET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<([^>]+)>").ok());
static REL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r#"rel="([^"]+)""#).ok());
static RELATIVE_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[?&]page_token=([^&]+)").ok());

const PAGE_TOKEN: &str = "page_token";

/// Pagination state extracted from one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Token for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    /// Token for the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_token: Option<String>,
    /// Total item count reported by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// Case-insensitive header lookup.
pub trait PaginationHeaders {
    /// Returns the first value of `name`, matched case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;
}

impl PaginationHeaders for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl<S: std::hash::BuildHasher> PaginationHeaders for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl PaginationHeaders for [(&str, &str)] {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

/// Parse an RFC 5988 `Link` header into page tokens.
///
/// Entries without a `<target>` or a `rel="..."` are skipped, as are entries
/// whose target carries no non-empty `page_token`. Later entries win.
pub fn parse_link_header(link: Option<&str>) -> PaginationMeta {
    let mut meta = PaginationMeta::default();
    let Some(link) = link.filter(|value| !value.trim().is_empty()) else {
        return meta;
    };
    let (Some(target_re), Some(rel_re)) = (TARGET.as_ref(), REL.as_ref()) else {
        return meta;
    };

    for entry in link.split(',') {
        let target = target_re
            .captures(entry)
            .and_then(|captures| captures.get(1));
        let rel = rel_re.captures(entry).and_then(|captures| captures.get(1));
        let (Some(target), Some(rel)) = (target, rel) else {
            continue;
        };
        let Some(token) = page_token(target.as_str()) else {
            continue;
        };

        match rel.as_str() {
            "next" => meta.next_token = Some(token),
            "prev" | "previous" => meta.prev_token = Some(token),
            _ => {},
        }
    }

    meta
}

/// Parse `Link` and `X-Total-Count` from a header collection.
pub fn parse_pagination_headers<H: PaginationHeaders + ?Sized>(headers: &H) -> PaginationMeta {
    let mut meta = parse_link_header(headers.header("link"));
    meta.total_count = headers.header("x-total-count").and_then(parse_total_count);
    meta
}

fn page_token(target: &str) -> Option<String> {
    let token = match Url::parse(target) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == PAGE_TOKEN)
            .map(|(_, value)| value.into_owned()),
        Err(_) => relative_page_token(target),
    };
    token.filter(|token| !token.is_empty())
}

/// Percent-decodes the token of a relative target.
///
/// Unlike query strings on absolute targets, a literal `+` stays a `+`.
fn relative_page_token(target: &str) -> Option<String> {
    let raw = RELATIVE_TOKEN
        .as_ref()?
        .captures(target)?
        .get(1)?
        .as_str();
    let pair = format!("{PAGE_TOKEN}={}", raw.replace('+', "%2B"));
    url::form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(_, decoded)| decoded.into_owned())
}

fn parse_total_count(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(count) = trimmed.parse::<u64>() {
        return Some(count);
    }
    // Exponent forms such as `1e3`.
    let float = trimmed.parse::<f64>().ok()?;
    if !float.is_finite() || float < 0.0 || float.fract() != 0.0 {
        return None;
    }
    format!("{float:.0}").parse().ok()
}
