/// Detects bare links and e-mail addresses in literal text and rewrites them into tags.
///
/// The parser owns one instance per top-level parse. Nested parses always get a fresh one, an
/// autolinker is never shared between two parser instances.
pub trait Autolink {
    /// Look at the whole message once and remember whether any link may be present.
    fn set_possible(&mut self, message: &str);

    /// Result of the last [`Autolink::set_possible`].
    fn has_possible(&self) -> bool;

    /// Rewrite links found in `data` into `[url]`/`[email]` tags, in place.
    fn parse(&self, data: &mut String);
}

/// Converts entity-escaped HTML (`&lt;b&gt;`) in literal text back into markup or tags.
pub trait HtmlParser {
    fn parse(&self, data: &mut String);
}

/// Substitutes smiley codes in user text.
///
/// Only ever called with text outside rendered tags.
pub trait SmileyParser {
    fn parse(&self, text: &mut String);
}
