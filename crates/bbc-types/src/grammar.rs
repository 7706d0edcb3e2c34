use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

/// Set of tag names.
pub type TagSet = BTreeSet<String>;

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// A test or parameter pattern does not compile.
    ///
    /// * tag: tag name owning the pattern.
    /// * pattern: the pattern as written.
    #[error("invalid pattern {pattern:?} on tag {tag:?}: {source}")]
    InvalidPattern {
        tag: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Where whitespace around a tag is removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trim {
    #[default]
    None,

    /// After the opening tag.
    Inside,

    /// After the closing tag.
    Outside,

    Both,
}

impl Trim {
    pub fn trims_inside(self) -> bool {
        matches!(self, Trim::Inside | Trim::Both)
    }

    pub fn trims_outside(self) -> bool {
        matches!(self, Trim::Outside | Trim::Both)
    }
}

/// Whether a tag value may be wrapped in `&quot;`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quoting {
    #[default]
    Never,
    Optional,
    Required,
}

/// Validation callback of a grammar.
///
/// Receives the matched tag, the captured values and the names of all disabled tags. Captured
/// values are positional: `$1` is at index 0. A validator rejects a value by replacing it, it
/// never aborts the parse.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&TagGrammar, &mut Vec<String>, &TagSet) + Send + Sync>);

impl Validator {
    pub fn new(f: impl Fn(&TagGrammar, &mut Vec<String>, &TagSet) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, tag: &TagGrammar, data: &mut Vec<String>, disabled: &TagSet) {
        (self.0)(tag, data, disabled)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Validator")
    }
}

/// Transforms one matched parameter value.
#[derive(Clone)]
pub struct ParamFilter(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl ParamFilter {
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &str) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for ParamFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("ParamFilter")
    }
}

/// Compiled test pattern, anchored at both ends.
#[derive(Clone, Debug)]
pub struct TestPattern {
    source: String,
    regex: Regex,
}

impl TestPattern {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl Serialize for TestPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.source)
    }
}

/// One named parameter of a tag, written as ` name=value` inside the opening tag.
///
/// Parameters may appear in any order in user markup.
#[derive(Clone, Debug, Serialize)]
pub struct Param {
    pub name: String,

    pub optional: bool,

    /// Value is wrapped in `&quot;`.
    pub quoted: bool,

    /// Regex fragment the value must match, `.+?` when absent.
    pub pattern: Option<String>,

    /// Template the value is rendered through, `$1` is the matched value.
    pub value: Option<String>,

    #[serde(skip)]
    pub filter: Option<ParamFilter>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            quoted: false,
            pattern: None,
            value: None,
            filter: None,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(name)
        }
    }

    pub fn quoted(mut self) -> Self {
        self.quoted = true;
        self
    }

    /// Restrict the value to `pattern`.
    ///
    /// # Errors
    ///
    /// When the pattern does not compile.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Result<Self, GrammarError> {
        let pattern = pattern.into();
        if let Err(e) = Regex::new(&format!("(?:{pattern})")) {
            return Err(GrammarError::InvalidPattern {
                tag: self.name,
                pattern,
                source: e,
            });
        }
        self.pattern = Some(pattern);
        Ok(self)
    }

    pub fn value(mut self, template: impl Into<String>) -> Self {
        self.value = Some(template.into());
        self
    }

    pub fn filter(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.filter = Some(ParamFilter::new(f));
        self
    }
}

/// Content shape of a tag.
///
/// Each variant carries exactly the templates its handler renders. Templates use `$1`, `$2`, ...
/// for captured values and `{name}` for parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TagKind {
    /// `[b]parsed[/b]`.
    ParsedContent { before: String, after: String },

    /// `[code]verbatim[/code]`, rendered through `content`.
    UnparsedContent { content: String },

    /// `[hr]`, `[br /]`. No content, no closer.
    Closed { content: String },

    /// `[color=red]parsed[/color]`, the value is taken verbatim.
    UnparsedEquals {
        before: String,
        after: String,
        quoted: Quoting,
    },

    /// `[quote=author]parsed[/quote]`, the value is parsed as well.
    ParsedEquals {
        before: String,
        after: String,
        quoted: Quoting,
        /// Tags allowed inside the value. Empty means all tags.
        parsed_tags_allowed: Vec<String>,
    },

    /// `[code=php]verbatim[/code]`: `$1` is the body, `$2` the value.
    UnparsedEqualsContent { content: String, quoted: Quoting },

    /// `[glow=red,2,300]parsed[/glow]`: `$1`, `$2`... are the comma separated values.
    UnparsedCommas { before: String, after: String },

    /// `[flash=200,100]verbatim[/flash]`: `$1` is the body, `$2`... the values.
    UnparsedCommasContent { content: String },
}

impl TagKind {
    pub fn parsed_content(before: impl Into<String>, after: impl Into<String>) -> Self {
        TagKind::ParsedContent {
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn unparsed_content(content: impl Into<String>) -> Self {
        TagKind::UnparsedContent {
            content: content.into(),
        }
    }

    pub fn closed(content: impl Into<String>) -> Self {
        TagKind::Closed {
            content: content.into(),
        }
    }

    pub fn unparsed_equals(before: impl Into<String>, after: impl Into<String>) -> Self {
        TagKind::UnparsedEquals {
            before: before.into(),
            after: after.into(),
            quoted: Quoting::Never,
        }
    }

    pub fn parsed_equals(before: impl Into<String>, after: impl Into<String>) -> Self {
        TagKind::ParsedEquals {
            before: before.into(),
            after: after.into(),
            quoted: Quoting::Never,
            parsed_tags_allowed: vec![],
        }
    }

    pub fn unparsed_equals_content(content: impl Into<String>) -> Self {
        TagKind::UnparsedEqualsContent {
            content: content.into(),
            quoted: Quoting::Never,
        }
    }

    pub fn unparsed_commas(before: impl Into<String>, after: impl Into<String>) -> Self {
        TagKind::UnparsedCommas {
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn unparsed_commas_content(content: impl Into<String>) -> Self {
        TagKind::UnparsedCommasContent {
            content: content.into(),
        }
    }

    /// Set how the value may be quoted. No effect on shapes without a single value.
    pub fn with_quoting(mut self, quoting: Quoting) -> Self {
        match &mut self {
            TagKind::UnparsedEquals { quoted, .. }
            | TagKind::ParsedEquals { quoted, .. }
            | TagKind::UnparsedEqualsContent { quoted, .. } => *quoted = quoting,
            _ => {}
        }
        self
    }

    /// Restrict the tags parsed inside a [`TagKind::ParsedEquals`] value.
    pub fn with_parsed_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let TagKind::ParsedEquals {
            parsed_tags_allowed,
            ..
        } = &mut self
        {
            *parsed_tags_allowed = tags.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Snake case name of the shape, as serialized.
    pub fn name(&self) -> &'static str {
        match self {
            TagKind::ParsedContent { .. } => "parsed_content",
            TagKind::UnparsedContent { .. } => "unparsed_content",
            TagKind::Closed { .. } => "closed",
            TagKind::UnparsedEquals { .. } => "unparsed_equals",
            TagKind::ParsedEquals { .. } => "parsed_equals",
            TagKind::UnparsedEqualsContent { .. } => "unparsed_equals_content",
            TagKind::UnparsedCommas { .. } => "unparsed_commas",
            TagKind::UnparsedCommasContent { .. } => "unparsed_commas_content",
        }
    }

    /// The opening tag must continue with `=`.
    pub fn needs_equals(&self) -> bool {
        matches!(
            self,
            TagKind::UnparsedEquals { .. }
                | TagKind::ParsedEquals { .. }
                | TagKind::UnparsedEqualsContent { .. }
                | TagKind::UnparsedCommas { .. }
                | TagKind::UnparsedCommasContent { .. }
        )
    }

    pub fn quoting(&self) -> Quoting {
        match self {
            TagKind::UnparsedEquals { quoted, .. }
            | TagKind::ParsedEquals { quoted, .. }
            | TagKind::UnparsedEqualsContent { quoted, .. } => *quoted,
            _ => Quoting::Never,
        }
    }

    pub fn before(&self) -> Option<&str> {
        match self {
            TagKind::ParsedContent { before, .. }
            | TagKind::UnparsedEquals { before, .. }
            | TagKind::ParsedEquals { before, .. }
            | TagKind::UnparsedCommas { before, .. } => Some(before),
            _ => None,
        }
    }

    pub fn after(&self) -> Option<&str> {
        match self {
            TagKind::ParsedContent { after, .. }
            | TagKind::UnparsedEquals { after, .. }
            | TagKind::ParsedEquals { after, .. }
            | TagKind::UnparsedCommas { after, .. } => Some(after),
            _ => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            TagKind::UnparsedContent { content }
            | TagKind::Closed { content }
            | TagKind::UnparsedEqualsContent { content, .. }
            | TagKind::UnparsedCommasContent { content } => Some(content),
            _ => None,
        }
    }

    pub fn before_mut(&mut self) -> Option<&mut String> {
        match self {
            TagKind::ParsedContent { before, .. }
            | TagKind::UnparsedEquals { before, .. }
            | TagKind::ParsedEquals { before, .. }
            | TagKind::UnparsedCommas { before, .. } => Some(before),
            _ => None,
        }
    }

    pub fn after_mut(&mut self) -> Option<&mut String> {
        match self {
            TagKind::ParsedContent { after, .. }
            | TagKind::UnparsedEquals { after, .. }
            | TagKind::ParsedEquals { after, .. }
            | TagKind::UnparsedCommas { after, .. } => Some(after),
            _ => None,
        }
    }

    pub fn content_mut(&mut self) -> Option<&mut String> {
        match self {
            TagKind::UnparsedContent { content }
            | TagKind::Closed { content }
            | TagKind::UnparsedEqualsContent { content, .. }
            | TagKind::UnparsedCommasContent { content } => Some(content),
            _ => None,
        }
    }
}

/// Declarative rule for one bracket tag.
///
/// Several grammars may share a name (`[quote]`, `[quote=x]`, `[quote author=x]`), the registry
/// keeps them adjacent and the first one whose syntax matches wins.
#[derive(Clone, Debug, Serialize)]
pub struct TagGrammar {
    /// Lower case tag name.
    pub name: String,

    pub kind: TagKind,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,

    /// Content forms its own layout block.
    pub block_level: bool,

    /// Literal text inside may be autolinked.
    pub autolink: bool,

    /// Rendering depends on something other than the message, do not cache.
    pub no_cache: bool,

    pub trim: Trim,

    /// Only valid directly inside one of these tags.
    pub require_parents: Option<TagSet>,

    /// Only these tags are valid directly inside.
    pub require_children: Option<TagSet>,

    /// Not valid directly inside these tags, unless `disallow_before` and `disallow_after` are set.
    pub disallow_parents: Option<TagSet>,

    /// Not valid anywhere inside. Inherited by every descendant.
    pub disallow_children: Option<TagSet>,

    pub disallow_before: Option<String>,
    pub disallow_after: Option<String>,

    pub disabled_before: Option<String>,
    pub disabled_after: Option<String>,
    pub disabled_content: Option<String>,

    /// Text between the tag name and the next `]` must match.
    pub test: Option<TestPattern>,

    #[serde(skip)]
    pub validate: Option<Validator>,
}

impl TagGrammar {
    pub fn new(name: impl Into<String>, kind: TagKind) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            kind,
            params: vec![],
            block_level: false,
            autolink: true,
            no_cache: false,
            trim: Trim::None,
            require_parents: None,
            require_children: None,
            disallow_parents: None,
            disallow_children: None,
            disallow_before: None,
            disallow_after: None,
            disabled_before: None,
            disabled_after: None,
            disabled_content: None,
            test: None,
            validate: None,
        }
    }

    /// Length of the tag name in bytes.
    pub fn len(&self) -> usize {
        self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn block_level(mut self) -> Self {
        self.block_level = true;
        self
    }

    pub fn no_autolink(mut self) -> Self {
        self.autolink = false;
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    pub fn trim(mut self, trim: Trim) -> Self {
        self.trim = trim;
        self
    }

    pub fn params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn require_parents<const N: usize>(mut self, tags: [&str; N]) -> Self {
        self.require_parents = Some(tag_set(tags));
        self
    }

    pub fn require_children<const N: usize>(mut self, tags: [&str; N]) -> Self {
        self.require_children = Some(tag_set(tags));
        self
    }

    pub fn disallow_children<const N: usize>(mut self, tags: [&str; N]) -> Self {
        self.disallow_children = Some(tag_set(tags));
        self
    }

    /// Forbid this tag directly inside `tags`. When both replacement templates are given the tag
    /// still parses inside them but renders through the replacements.
    pub fn disallow_parents<const N: usize>(
        mut self,
        tags: [&str; N],
        replacement: Option<(&str, &str)>,
    ) -> Self {
        self.disallow_parents = Some(tag_set(tags));
        if let Some((before, after)) = replacement {
            self.disallow_before = Some(before.to_owned());
            self.disallow_after = Some(after.to_owned());
        }
        self
    }

    pub fn disabled_before(mut self, template: impl Into<String>) -> Self {
        self.disabled_before = Some(template.into());
        self
    }

    pub fn disabled_after(mut self, template: impl Into<String>) -> Self {
        self.disabled_after = Some(template.into());
        self
    }

    pub fn disabled_content(mut self, template: impl Into<String>) -> Self {
        self.disabled_content = Some(template.into());
        self
    }

    /// Attach a test pattern. The pattern is anchored at both ends.
    ///
    /// # Errors
    ///
    /// When the pattern does not compile.
    pub fn test(mut self, pattern: impl Into<String>) -> Result<Self, GrammarError> {
        let source = pattern.into();
        match Regex::new(&format!("^(?:{source})$")) {
            Ok(regex) => {
                self.test = Some(TestPattern { source, regex });
                Ok(self)
            }
            Err(e) => Err(GrammarError::InvalidPattern {
                tag: self.name,
                pattern: source,
                source: e,
            }),
        }
    }

    pub fn validate(
        mut self,
        f: impl Fn(&TagGrammar, &mut Vec<String>, &TagSet) + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Validator::new(f));
        self
    }
}

fn tag_set<const N: usize>(tags: [&str; N]) -> TagSet {
    tags.into_iter().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let tag = TagGrammar::new("size", TagKind::unparsed_equals("", ""))
            .test("[1-7]")
            .unwrap();
        let test = tag.test.as_ref().unwrap();
        assert!(test.is_match("3"));
        assert!(!test.is_match("3;color:red"));
    }

    #[test]
    fn invalid_pattern_reports_tag() {
        let err = TagGrammar::new("bad", TagKind::closed(""))
            .test("(")
            .unwrap_err();
        assert!(err.to_string().contains("\"bad\""));
    }

    #[test]
    fn templates_follow_shape() {
        let mut kind = TagKind::unparsed_content("<pre>$1</pre>");
        assert!(kind.before_mut().is_none());
        assert_eq!(kind.content(), Some("<pre>$1</pre>"));

        let kind = TagKind::parsed_equals("<a>", "</a>").with_quoting(Quoting::Optional);
        assert_eq!(kind.quoting(), Quoting::Optional);
        assert!(kind.needs_equals());
        assert!(!TagKind::parsed_content("", "").needs_equals());
    }

    #[test]
    fn trim_sides() {
        assert!(Trim::Both.trims_inside() && Trim::Both.trims_outside());
        assert!(Trim::Inside.trims_inside() && !Trim::Inside.trims_outside());
        assert!(!Trim::None.trims_inside());
    }
}
