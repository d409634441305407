//! Pagination header parsing command.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, json_output, ok_output};
use idconsole_domain::{PaginationMeta, parse_pagination_headers};

/// Parse raw `Link` / `X-Total-Count` values and print the tokens.
pub fn run_pagination_parse(
    mode: OutputMode,
    link: Option<&str>,
    total_count: Option<&str>,
) -> Result<CliOutput, CliError> {
    let mut headers: Vec<(&str, &str)> = Vec::new();
    if let Some(link) = link {
        headers.push(("link", link));
    }
    if let Some(total) = total_count {
        headers.push(("x-total-count", total));
    }
    let meta = parse_pagination_headers(headers.as_slice());

    if mode.is_json() {
        return json_output(&serde_json::json!({
            "status": "ok",
            "pagination": meta,
        }));
    }
    Ok(ok_output(format_meta_text(&meta)))
}

fn format_meta_text(meta: &PaginationMeta) -> String {
    let mut out = String::new();
    for (label, value) in [
        ("next", meta.next_token.clone()),
        ("prev", meta.prev_token.clone()),
        ("total", meta.total_count.map(|count| count.to_string())),
    ] {
        out.push_str(label);
        out.push_str(": ");
        out.push_str(value.as_deref().unwrap_or("-"));
        out.push('\n');
    }
    out
}
