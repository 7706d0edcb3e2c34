use bbc_codes::Codes;
use bbc_types::Autolink;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::trace;

/// Bare links and e-mail addresses, links win when both start at one position.
static LINK_RE: OnceLock<Regex> = OnceLock::new();

/// Escaped characters that end a link.
const LINK_TERMINATORS: [&str; 5] = ["&quot;", "&lt;", "&gt;", "&#039;", "&nbsp;"];

/// Turns bare links into `[url]` and addresses into `[email]` tags.
///
/// A kind of link is only detected when the registry has its tag and the tag is not disabled.
#[derive(Clone, Debug)]
pub struct UrlAutolinker {
    url: bool,
    email: bool,
    possible: bool,
}

impl UrlAutolinker {
    pub fn new(codes: &Codes) -> Self {
        let enabled = |name: &str| codes.has_tag(name) && !codes.is_disabled(name);
        Self {
            url: enabled("url"),
            email: enabled("email"),
            possible: false,
        }
    }

    fn regex() -> &'static Regex {
        LINK_RE.get_or_init(|| {
            Regex::new(concat!(
                r#"(?i)(?P<url>\b(?:(?:https?|ftps?)://|www\.)[^\s<>\[\]"\r]+)"#,
                r"|(?P<email>\b[\w.+\-]+@[\w\-]+(?:\.[\w\-]+)+)",
            ))
            .unwrap()
        })
    }

    /// Render one match, `None` to leave the text alone.
    fn link(&self, captures: &Captures) -> Option<(usize, String)> {
        if let Some(m) = captures.name("url") {
            if !self.url {
                return None;
            }
            let link = trim_link(m.as_str());
            if link.is_empty() || !link.contains('.') {
                return None;
            }
            let tag = if link.len() > 4 && link[..4].eq_ignore_ascii_case("www.") {
                format!("[url=http://{link}]{link}[/url]")
            } else {
                format!("[url]{link}[/url]")
            };
            return Some((link.len(), tag));
        }

        let m = captures.name("email")?;
        if !self.email {
            return None;
        }
        let address = m.as_str().trim_end_matches(['.', '-']);
        Some((address.len(), format!("[email]{address}[/email]")))
    }
}

impl Autolink for UrlAutolinker {
    fn set_possible(&mut self, message: &str) {
        self.possible = (self.url && (message.contains("://") || message.contains("www.")))
            || (self.email && message.contains('@'));
    }

    fn has_possible(&self) -> bool {
        self.possible
    }

    fn parse(&self, data: &mut String) {
        if !self.possible {
            return;
        }

        let mut out = String::with_capacity(data.len());
        let mut last = 0;
        for captures in Self::regex().captures_iter(data) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if whole.start() < last || inside_tag_syntax(&data[..whole.start()]) {
                continue;
            }
            let Some((len, tag)) = self.link(&captures) else {
                continue;
            };
            out.push_str(&data[last..whole.start()]);
            out.push_str(&tag);
            last = whole.start() + len;
        }

        if last > 0 {
            out.push_str(&data[last..]);
            trace!("autolinked {:?}", out);
            *data = out;
        }
    }
}

/// Text right before a link shows it is already a tag value or content.
fn inside_tag_syntax(before: &str) -> bool {
    before.ends_with(['=', ']', '"']) || before.ends_with("&quot;")
}

/// Cut escaped terminators and trailing punctuation off a detected link.
fn trim_link(link: &str) -> &str {
    let end = LINK_TERMINATORS
        .iter()
        .filter_map(|x| link.find(x))
        .min()
        .unwrap_or(link.len());
    let mut link = link[..end].trim_end_matches(['.', ',', ';', ':', '!', '?', '\'']);
    // Keep a closing parenthesis only when the link opened one.
    while link.ends_with(')') && link.matches(')').count() > link.matches('(').count() {
        link = link[..link.len() - 1].trim_end_matches(['.', ',', ';', ':', '!', '?', '\'']);
    }
    link
}
