use reqwest::Client;
use std::time::Duration;

use crate::error::AppError;
use crate::models::search::SearchResult;

const RESULT_CLASS: &str = "instant";
const PLAY_MARKER: &str = "play('";

/// Scrapes the sound-effect site's search page for playable clips.
#[derive(Clone)]
pub struct SearchProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl SearchProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, AppError> {
        let url = format!("{}/search/", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("name", query)])
            .header("User-Agent", "espsoundboard/0.1 (sound search)")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Search(format!("{url} returned {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Search(format!("failed to read {url}: {e}")))?;

        let results = parse_results(&body, &self.base_url);
        tracing::debug!("found {} results for query {query:?}", results.len());
        Ok(results)
    }
}

/// Extract `{title, link}` pairs from every element whose class list contains `instant`.
fn parse_results(html: &str, base_url: &str) -> Vec<SearchResult> {
    let starts = result_element_starts(html);
    let mut results = Vec::new();

    for (i, &start) in starts.iter().enumerate() {
        let end = element_end(html, start)
            .unwrap_or_else(|| starts.get(i + 1).copied().unwrap_or(html.len()));
        let segment = &html[start..end];

        let Some(path) = extract_play_path(segment) else {
            continue;
        };
        let title = collapse_whitespace(&decode_html_entities(&strip_tags(segment)));

        results.push(SearchResult {
            title,
            link: resolve_link(&path, base_url),
        });
    }

    results
}

/// Byte offsets of opening tags carrying the result class.
fn result_element_starts(html: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut search_from = 0;

    while let Some((abs_start, tag)) = next_tag(html, search_from) {
        if !tag.starts_with("</") {
            let is_result = extract_attr(tag, "class")
                .map(|classes| classes.split_whitespace().any(|c| c == RESULT_CLASS))
                .unwrap_or(false);
            if is_result {
                starts.push(abs_start);
            }
        }

        search_from = abs_start + tag.len();
    }

    starts
}

/// Byte offset just past the tag closing the element opened at `start`.
///
/// Only tags with the same name are counted, so unclosed void elements
/// inside the result do not throw off the depth.
fn element_end(html: &str, start: usize) -> Option<usize> {
    let (_, open_tag) = next_tag(html, start)?;
    let name = tag_name(open_tag);
    if name.is_empty() || open_tag.ends_with("/>") {
        return None;
    }

    let mut depth = 0usize;
    let mut search_from = start;
    while let Some((abs_start, tag)) = next_tag(html, search_from) {
        search_from = abs_start + tag.len();
        if !tag_name(tag).eq_ignore_ascii_case(name) {
            continue;
        }
        if tag.starts_with("</") {
            depth -= 1;
            if depth == 0 {
                return Some(search_from);
            }
        } else if !tag.ends_with("/>") {
            depth += 1;
        }
    }

    None
}

/// The next `<...>` tag at or after `from`, with its byte offset.
fn next_tag(html: &str, from: usize) -> Option<(usize, &str)> {
    let abs_start = from + html[from..].find('<')?;
    let end = html[abs_start..].find('>')?;
    Some((abs_start, &html[abs_start..abs_start + end + 1]))
}

fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<').trim_start_matches('/');
    let len = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    &inner[..len]
}

/// Find the clip path inside a `play('...')` handler within the segment.
fn extract_play_path(segment: &str) -> Option<String> {
    let start = segment.find(PLAY_MARKER)? + PLAY_MARKER.len();
    let len = segment[start..].find('\'')?;
    let path = segment[start..start + len].trim();
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Extract an HTML attribute value from a tag string.
fn extract_attr(tag: &str, attr_name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    for quote in ['"', '\''] {
        let pattern = format!("{attr_name}={quote}");
        let mut from = 0;
        while let Some(pos) = lower[from..].find(&pattern) {
            let start = from + pos;
            // Skip matches that are the tail of a longer attribute name (e.g. data-class).
            let preceded_by_space = start == 0
                || lower[..start]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_whitespace);
            let value_start = start + pattern.len();
            if preceded_by_space {
                if let Some(end) = tag[value_start..].find(quote) {
                    return Some(tag[value_start..value_start + end].to_string());
                }
            }
            from = value_start;
        }
    }
    None
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a clip path against the site's base URL.
fn resolve_link(path: &str, base_url: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    if path.starts_with('/') {
        return format!("{base_url}{path}");
    }
    format!("{base_url}/{path}")
}

/// Decode common HTML entities.
fn decode_html_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
