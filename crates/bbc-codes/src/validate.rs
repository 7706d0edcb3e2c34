use bbc_types::{TagGrammar, TagSet};
use chrono::DateTime;
use regex::Regex;
use std::sync::OnceLock;

static SCHEME_RE: OnceLock<Regex> = OnceLock::new();

/// Make a link target safe to put in `href`/`src`.
///
/// Targets without a known scheme get `http://` prepended, which also defuses `javascript:` and
/// friends. Anchors (`#top`) are kept when `allow_anchor` is set.
pub fn sanitize_url(data: &str, allow_anchor: bool) -> String {
    let data = data.trim().replace("<br />", "");
    if allow_anchor && data.starts_with('#') {
        return data;
    }
    let scheme = SCHEME_RE.get_or_init(|| Regex::new(r"(?i)^(?:https?|ftps?)://").unwrap());
    if scheme.is_match(&data) {
        data
    } else {
        format!("http://{data}")
    }
}

/// Undo the html escaping done when the message was stored.
pub fn un_html_special_chars(data: &str) -> String {
    data.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Format a unix timestamp the way the forum shows dates.
pub(crate) fn format_time(value: &str) -> Option<String> {
    let seconds = value.trim().parse::<i64>().ok()?;
    let time = DateTime::from_timestamp(seconds, 0)?;
    Some(time.format("%B %d, %Y, %I:%M:%S %p").to_string())
}

/// `[url]` and `[img]` targets.
pub(crate) fn link(_: &TagGrammar, data: &mut Vec<String>, _: &TagSet) {
    if let Some(v) = data.first_mut() {
        *v = sanitize_url(v, false);
    }
}

/// `[iurl]` targets may be anchors in the same page.
pub(crate) fn inner_link(_: &TagGrammar, data: &mut Vec<String>, _: &TagSet) {
    if let Some(v) = data.first_mut() {
        *v = sanitize_url(v, true);
    }
}

pub(crate) fn email(_: &TagGrammar, data: &mut Vec<String>, _: &TagSet) {
    if let Some(v) = data.first_mut() {
        *v = v.replace("<br />", "");
    }
}

/// Keep tabs visible inside code blocks.
pub(crate) fn code(_: &TagGrammar, data: &mut Vec<String>, disabled: &TagSet) {
    if disabled.contains("code") {
        return;
    }
    if let Some(v) = data.first_mut() {
        *v = v.replace('\t', "<span class=\"tab\">\t</span>");
    }
}

/// Raw html is only trusted while the tag is enabled.
pub(crate) fn html(_: &TagGrammar, data: &mut Vec<String>, disabled: &TagSet) {
    if disabled.contains("html") {
        return;
    }
    if let Some(v) = data.first_mut() {
        *v = un_html_special_chars(v);
    }
}

/// Numeric sizes 1 to 7 map onto the css keywords.
pub(crate) fn size(_: &TagGrammar, data: &mut Vec<String>, _: &TagSet) {
    const SIZES: [&str; 7] = [
        "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large",
    ];
    if let Some(v) = data.first_mut() {
        if let Ok(n @ 1..=7) = v.parse::<usize>() {
            *v = SIZES[n - 1].to_owned();
        }
    }
}

pub(crate) fn time(_: &TagGrammar, data: &mut Vec<String>, _: &TagSet) {
    if let Some(v) = data.first_mut() {
        if let Some(formatted) = format_time(v) {
            *v = formatted;
        }
    }
}
