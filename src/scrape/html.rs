//! Section-scoped anchor extraction from documentation HTML.
//!
//! The vendor pages are Sphinx output: each heading opens a section element
//! carrying the heading's anchor id. Older builds emit
//! `<div class="section" id="...">`, newer ones `<section id="...">`; both
//! are accepted. Only anchors nested inside that element are considered.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Any opening, closing, or self-closing tag: (closing slash, name, attributes, self-closing slash).
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)<(/?)([a-z][a-z0-9]*)\b((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#)
});

static ID_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});

static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});

static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)(?:^|\s)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});

/// Returns the value of the first capture group that matched.
fn attr_value(regex: &Regex, attrs: &str) -> Option<String> {
    let caps = regex.captures(attrs)?;
    (1..caps.len())
        .find_map(|i| caps.get(i))
        .map(|m| decode_entities(m.as_str().trim()))
}

/// Decodes the handful of entities that show up inside attribute values.
fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#38;", "&")
        .replace("&amp;", "&")
}

fn is_section_element(tag_name: &str, attrs: &str) -> bool {
    tag_name.eq_ignore_ascii_case("section")
        || attr_value(&CLASS_ATTR_RE, attrs)
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == "section"))
}

/// Returns the inner HTML of the section element whose id is `section_id`.
///
/// An unterminated section extends to the end of the document.
#[must_use]
pub fn find_section<'a>(html: &'a str, section_id: &str) -> Option<&'a str> {
    let mut tags = TAG_RE.captures_iter(html);

    let (tag_name, content_start) = tags.by_ref().find_map(|caps| {
        let whole = caps.get(0)?;
        let is_closing = !caps.get(1)?.as_str().is_empty();
        let name = caps.get(2)?.as_str();
        let attrs = caps.get(3).map_or("", |m| m.as_str());
        let self_closing = !caps.get(4).map_or("", |m| m.as_str()).is_empty();

        if is_closing || self_closing {
            return None;
        }
        let matches_id = attr_value(&ID_ATTR_RE, attrs).is_some_and(|id| id == section_id);
        (matches_id && is_section_element(name, attrs))
            .then(|| (name.to_ascii_lowercase(), whole.end()))
    })?;

    let mut depth = 1_usize;
    for caps in tags {
        let (Some(whole), Some(closing), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if !name.as_str().eq_ignore_ascii_case(&tag_name) {
            continue;
        }
        if !closing.as_str().is_empty() {
            depth -= 1;
            if depth == 0 {
                return Some(&html[content_start..whole.start()]);
            }
        } else if caps.get(4).is_none_or(|m| m.as_str().is_empty()) {
            depth += 1;
        }
    }

    Some(&html[content_start..])
}

/// Returns the raw `href` values of all anchors in `fragment`, in document order.
#[must_use]
pub fn anchor_hrefs(fragment: &str) -> Vec<String> {
    TAG_RE
        .captures_iter(fragment)
        .filter(|caps| {
            caps.get(1).is_some_and(|m| m.as_str().is_empty())
                && caps
                    .get(2)
                    .is_some_and(|m| m.as_str().eq_ignore_ascii_case("a"))
        })
        .filter_map(|caps| attr_value(&HREF_ATTR_RE, caps.get(3).map_or("", |m| m.as_str())))
        .filter(|href| !href.is_empty())
        .collect()
}

/// Returns true if the two host strings refer to the same host, ignoring case
/// and a trailing root dot.
#[must_use]
pub fn hosts_match(lhs: &str, rhs: &str) -> bool {
    lhs.trim_end_matches('.')
        .eq_ignore_ascii_case(rhs.trim_end_matches('.'))
}

/// Extracts the links inside `section_id` that point at `download_host`.
///
/// Relative links are resolved against `base`. Order follows the page;
/// repeated links are kept once.
#[must_use]
pub fn extract_section_links(
    html: &str,
    base: &Url,
    section_id: &str,
    download_host: &str,
) -> Vec<Url> {
    let Some(section) = find_section(html, section_id) else {
        return Vec::new();
    };

    let mut links: Vec<Url> = Vec::new();
    for href in anchor_hrefs(section) {
        let Ok(url) = base.join(&href) else {
            continue;
        };
        if !url
            .host_str()
            .is_some_and(|host| hosts_match(host, download_host))
        {
            continue;
        }
        if !links.contains(&url) {
            links.push(url);
        }
    }
    links
}
