use crate::autolink::UrlAutolinker;
use crate::footnote::{render_footnotes, FootnoteCounter};
use crate::handlers::handle_disabled;
use crate::params::ParamCache;
use crate::scanner::Scanner;
use crate::settings::ParserSettings;
use crate::stack::TagStack;
use crate::text::{cleanup_whitespace, finish_smileys, no_smileys, sanitize_ms_cut_paste};
use crate::{OPEN, SLASH, SMILEY_MARKER};
use bbc_codes::Codes;
use bbc_html::EscapedHtmlParser;
use bbc_types::{Autolink, HtmlParser, SmileyParser, TagGrammar, TagSet};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, instrument, trace};

/// Whitespace removed where a tag trims. Keeps smiley markers.
static TRIM_RE: OnceLock<Regex> = OnceLock::new();

/// Converts bbc markup into html.
///
/// A parser is reusable but not reentrant: state of the message being parsed lives in the
/// parser, so one instance parses one message at a time. Values of parsed-equals tags are parsed
/// by a fresh parser.
pub struct Parser {
    pub(crate) codes: Arc<Codes>,

    autolinker: Box<dyn Autolink>,

    /// Loaded on the first message that may contain escaped html.
    html_parser: Option<Box<dyn HtmlParser>>,

    smiley_parser: Option<Arc<dyn SmileyParser>>,

    settings: ParserSettings,

    do_smileys: bool,

    pub(crate) scanner: Scanner,

    pub(crate) stack: TagStack,

    /// Cleared once a no-cache tag is matched.
    pub(crate) can_cache: bool,

    /// Footnote tags matched in the current message.
    pub(crate) num_footnotes: usize,

    possible_html: bool,

    /// Shared with parsers of tag values.
    pub(crate) param_cache: ParamCache,
}

impl Parser {
    /// A parser over `codes` with the default autolinker and no smiley parser.
    pub fn new(codes: Arc<Codes>) -> Self {
        let autolinker = Box::new(UrlAutolinker::new(&codes));
        Self {
            codes,
            autolinker,
            html_parser: None,
            smiley_parser: None,
            settings: ParserSettings::default(),
            do_smileys: true,
            scanner: Scanner::default(),
            stack: TagStack::default(),
            can_cache: true,
            num_footnotes: 0,
            possible_html: false,
            param_cache: ParamCache::default(),
        }
    }

    pub fn with_autolinker(mut self, autolinker: impl Autolink + 'static) -> Self {
        self.autolinker = Box::new(autolinker);
        self
    }

    pub fn with_html_parser(mut self, html_parser: impl HtmlParser + 'static) -> Self {
        self.html_parser = Some(Box::new(html_parser));
        self
    }

    pub fn with_smiley_parser(mut self, smiley_parser: impl SmileyParser + 'static) -> Self {
        self.smiley_parser = Some(Arc::new(smiley_parser));
        self
    }

    pub fn with_settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Turn the smiley pass on or off for following messages.
    pub fn enable_smileys(&mut self, enable: bool) -> &mut Self {
        self.do_smileys = enable;
        self
    }

    /// Whether the last parsed message may be cached. `false` once a no-cache tag was used.
    pub fn can_cache_result(&self) -> bool {
        self.can_cache
    }

    pub fn supported_grammars(&self) -> &[TagGrammar] {
        self.codes.grammars()
    }

    /// Parse one message on its own, footnotes are numbered from 1.
    pub fn parse(&mut self, message: &str) -> String {
        self.parse_with_footnotes(message, &mut FootnoteCounter::default())
    }

    /// Parse one message of several shown together, footnotes are numbered after `footnotes`
    /// which is then advanced.
    #[instrument(skip_all, fields(len = message.len()))]
    pub fn parse_with_footnotes(
        &mut self,
        message: &str,
        footnotes: &mut FootnoteCounter,
    ) -> String {
        if message.is_empty() {
            return String::new();
        }

        let message = sanitize_ms_cut_paste(message);
        if !self.settings.enable_bbc {
            return message;
        }

        self.reset();
        let message = message.replace('\n', "<br />");

        self.autolinker.set_possible(&message);
        self.possible_html = self.settings.enable_post_html && message.contains("&lt;");
        if self.possible_html && self.html_parser.is_none() {
            debug!("loading html parser");
            self.html_parser = Some(Box::new(EscapedHtmlParser::new()));
        }

        self.scanner = Scanner::new(message);
        self.parse_loop();

        // Close whatever is still open.
        while let Some(tag) = self.stack.pop() {
            self.scanner.push_str(&no_smileys(&tag.after));
        }

        let mut message = cleanup_whitespace(self.scanner.take());

        if self.num_footnotes > 0 {
            render_footnotes(&mut message, footnotes);
        }

        let smileys = if self.do_smileys {
            self.smiley_parser.as_deref()
        } else {
            None
        };
        finish_smileys(&mut message, smileys);

        message
    }

    fn reset(&mut self) {
        self.scanner = Scanner::default();
        self.stack.clear();
        self.can_cache = true;
        self.num_footnotes = 0;
        self.possible_html = false;
    }

    fn parse_loop(&mut self) {
        let mut started = false;

        loop {
            let from = if started {
                self.scanner.last_pos = self.scanner.last_pos.max(self.scanner.pos);
                self.scanner.pos + 1
            } else {
                0
            };

            // Never move backwards.
            self.scanner.pos = match self.scanner.find_byte(OPEN, from) {
                Some(p) if p >= self.scanner.last_pos => p,
                _ => self.scanner.len() + 1,
            };

            let has_text = if started {
                self.scanner.last_pos + 1 < self.scanner.pos
            } else {
                self.scanner.pos > 0
            };
            started = true;
            if has_text {
                self.between_tags();
            }

            let pos = self.scanner.pos;
            if pos + 1 >= self.scanner.len() {
                return;
            }
            let Some(next_char) = self.scanner.byte(pos + 1).map(|x| x.to_ascii_lowercase()) else {
                return;
            };

            if next_char == SLASH {
                if !self.stack.is_empty() {
                    self.handle_open_tags();
                }
                continue;
            }

            if !self.codes.has_candidates(next_char) {
                continue;
            }

            let inside = self.stack.last().cloned();

            if self.at_item_code(next_char) {
                if self.item_code_allowed() {
                    self.handle_item_code(inside.as_ref());
                }
                continue;
            }

            let Some(mut tag) = self.find_tag(next_char, inside.as_ref()) else {
                // Lists and tables only hold their own children, anything else closes them.
                if let Some(inside) = inside.filter(|x| x.require_children.is_some()) {
                    self.stack.pop();
                    let inserted = self.scanner.insert(pos, &no_smileys(&inside.after));
                    self.scanner.pos += inserted.saturating_sub(1);
                }
                continue;
            };

            // Disallowed children are disallowed in the whole subtree.
            if let Some(denied) = inside.as_ref().and_then(|x| x.disallow_children.as_ref()) {
                tag.disallow_children
                    .get_or_insert_with(TagSet::new)
                    .extend(denied.iter().cloned());
            }

            if self.codes.is_disabled(&tag.name) {
                handle_disabled(&mut tag);
            }

            if tag.block_level
                && tag.name != "html"
                && !inside.as_ref().map_or(false, |x| x.block_level)
            {
                self.close_non_block_level();
            }

            let block_level = tag.block_level;
            let trim = tag.trim;
            if self.handle_tag(tag) {
                continue;
            }

            let at = self.scanner.pos + 1;
            if block_level && self.scanner.starts_with_at(at, "<br />") {
                self.scanner.remove(at, 6);
            }
            if trim.trims_inside() {
                self.trim_whitespace(at);
            }
        }
    }

    /// Text between two tags: raw html, links and tabs.
    fn between_tags(&mut self) {
        let start = self.scanner.last_pos;
        let end = self.scanner.pos.min(self.scanner.len());
        if start >= end {
            return;
        }

        let original = self.scanner.slice(start, end).to_owned();
        // Trailing marker of the previous tag.
        if original.strip_prefix(SMILEY_MARKER) == Some("") {
            return;
        }

        let mut data = original.clone();
        if self.possible_html && data.contains("&lt;") {
            if let Some(html_parser) = &self.html_parser {
                html_parser.parse(&mut data);
            }
        }
        if self.settings.autolink_urls {
            self.auto_link(&mut data);
        }
        if data.contains('\t') {
            data = data.replace('\t', "&nbsp;&nbsp;&nbsp;");
        }

        if data != original {
            self.scanner.splice(start, end - start, &data);
            // Rewritten text may hold new tags, look again from its start.
            let old_pos = start + data.len();
            self.scanner.pos = self
                .scanner
                .find_byte(OPEN, start)
                .map_or(old_pos, |x| x.min(old_pos));
        }
    }

    fn auto_link(&self, data: &mut String) {
        if data.is_empty() || !self.autolinker.has_possible() {
            return;
        }
        // Every open tag has to allow links.
        if self.stack.iter().any(|x| !x.autolink) {
            return;
        }
        self.autolinker.parse(data);
    }

    /// Parse a tag value with a parser of its own.
    ///
    /// A non empty `allowed` restricts the tags parsed and turns smileys off. A no-cache tag in
    /// the value makes the whole message uncacheable.
    pub(crate) fn recursive_parse(&mut self, data: &mut String, allowed: &[String]) {
        let codes = if allowed.is_empty() {
            Arc::clone(&self.codes)
        } else {
            Arc::new(self.codes.restrict_to(allowed))
        };
        trace!("recursive parse of {} bytes", data.len());

        let mut parser = Parser::new(codes).with_settings(self.settings.clone());
        parser.smiley_parser = self.smiley_parser.clone();
        parser.enable_smileys(allowed.is_empty());
        parser.param_cache = std::mem::take(&mut self.param_cache);
        *data = parser.parse(data);

        self.param_cache = std::mem::take(&mut parser.param_cache);
        self.can_cache &= parser.can_cache_result();
    }

    /// Remove line breaks and whitespace at `at`.
    pub(crate) fn trim_whitespace(&mut self, at: usize) {
        let re = TRIM_RE.get_or_init(|| Regex::new(r"^(?:<br />|&nbsp;|[^\S\r])+").unwrap());
        let len = re.find(self.scanner.slice_from(at)).map_or(0, |x| x.end());
        if len > 0 {
            self.scanner.remove(at, len);
        }
    }
}
