//! Paginated reads against the active profile's APIs.

use crate::InfraResult;
use crate::console::Console;
use idconsole_adapters::{ApiPage, PageQuery};
use idconsole_domain::PaginationMeta;
use idconsole_ports::ApiKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize)]
struct CachedPage {
    status: u16,
    body: Value,
    next: Option<String>,
    prev: Option<String>,
    total: Option<u64>,
}

/// Fetch one page, serving repeats from the query cache.
///
/// Only 2xx pages are cached, and only if no profile change invalidated the
/// cache while the request was in flight.
pub async fn fetch_page(
    console: &Console,
    kind: ApiKind,
    path: &str,
    query: &PageQuery,
) -> InfraResult<ApiPage> {
    let endpoints = console.store().active_endpoints();
    let client = console.clients().client_for(kind, &endpoints)?;
    let key = cache_key(client.base_url().as_str(), path, query);

    if let Some(page) = console
        .queries()
        .get(&key)
        .and_then(|value| serde_json::from_value::<CachedPage>(value).ok())
    {
        return Ok(ApiPage {
            status: page.status,
            body: page.body,
            pagination: PaginationMeta {
                next_token: page.next,
                prev_token: page.prev,
                total_count: page.total,
            },
        });
    }

    let generation = console.queries().generation();
    let page = client.get_page(path, query).await?;
    if (200..300).contains(&page.status) {
        let cached = CachedPage {
            status: page.status,
            body: page.body.clone(),
            next: page.pagination.next_token.clone(),
            prev: page.pagination.prev_token.clone(),
            total: page.pagination.total_count,
        };
        if let Ok(value) = serde_json::to_value(cached) {
            console.queries().insert(key, value, generation);
        }
    }
    Ok(page)
}

fn cache_key(base_url: &str, path: &str, query: &PageQuery) -> String {
    format!(
        "{base_url}{}?page_token={}&page_size={}",
        path.trim_start_matches('/'),
        query.page_token.as_deref().unwrap_or_default(),
        query.page_size.map(|size| size.to_string()).unwrap_or_default()
    )
}
