use bbc_types::HtmlParser;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use tracing::trace;

/// Formatting elements converted back into real markup when balanced.
const ELEMENTS: [&str; 12] = [
    "b",
    "i",
    "u",
    "s",
    "em",
    "strong",
    "del",
    "ins",
    "pre",
    "blockquote",
    "sub",
    "sup",
];

/// Nested elements of one name are unwrapped one level per pass.
const MAX_PASSES: usize = 8;

static ELEMENT_RES: OnceLock<Vec<(Regex, String)>> = OnceLock::new();

static BR_RE: OnceLock<Regex> = OnceLock::new();

static HR_RE: OnceLock<Regex> = OnceLock::new();

/// `<a href="...">text</a>`, escaped.
static ANCHOR_RE: OnceLock<Regex> = OnceLock::new();

/// `<img src="..." ...>`, escaped.
static IMAGE_RE: OnceLock<Regex> = OnceLock::new();

/// Raw html support for messages stored entity-escaped.
///
/// Only a small safe subset is restored. Links and images are turned into bbc tags instead of
/// markup so that they go through the same validation as user written tags.
#[derive(Clone, Copy, Debug, Default)]
pub struct EscapedHtmlParser;

impl EscapedHtmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl HtmlParser for EscapedHtmlParser {
    fn parse(&self, data: &mut String) {
        if !data.contains("&lt;") {
            return;
        }

        let elements = ELEMENT_RES.get_or_init(|| {
            ELEMENTS
                .iter()
                .map(|name| {
                    (
                        Regex::new(&format!(r"(?is)&lt;{name}&gt;(.*?)&lt;/{name}&gt;")).unwrap(),
                        format!("<{name}>${{1}}</{name}>"),
                    )
                })
                .collect()
        });
        for (re, replacement) in elements {
            for _ in 0..MAX_PASSES {
                match re.replace_all(data, replacement.as_str()) {
                    Cow::Borrowed(_) => break,
                    Cow::Owned(v) => *data = v,
                }
            }
        }

        let br = BR_RE.get_or_init(|| Regex::new(r"(?i)&lt;br\s*/?&gt;").unwrap());
        replace_in_place(data, br, "<br />");

        let hr = HR_RE.get_or_init(|| Regex::new(r"(?i)&lt;hr\s*/?&gt;").unwrap());
        replace_in_place(data, hr, "[hr]");

        let anchor = ANCHOR_RE.get_or_init(|| {
            Regex::new(concat!(
                r"(?is)&lt;a\s+href=&quot;(.+?)&quot;",
                r"(?:\s+[a-z\-]+=&quot;.*?&quot;)*\s*&gt;(.*?)&lt;/a&gt;",
            ))
            .unwrap()
        });
        replace_in_place(data, anchor, "[url=${1}]${2}[/url]");

        let image = IMAGE_RE.get_or_init(|| {
            Regex::new(concat!(
                r"(?i)&lt;img\s+src=&quot;(.+?)&quot;",
                r"(?:\s+[a-z\-]+=&quot;.*?&quot;)*\s*/?&gt;",
            ))
            .unwrap()
        });
        replace_in_place(data, image, "[img]${1}[/img]");
    }
}

fn replace_in_place(data: &mut String, re: &Regex, replacement: &str) {
    if let Cow::Owned(v) = re.replace_all(data, replacement) {
        trace!("html replaced by {}", re.as_str());
        *data = v;
    }
}
