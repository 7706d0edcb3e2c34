use bbc_types::{GrammarError, TagGrammar, TagSet};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

mod standard;
mod validate;

pub use validate::{sanitize_url, un_html_special_chars};

#[derive(Debug, thiserror::Error)]
pub enum CodesError {
    /// A grammar in the table failed to build.
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// Tried to disable a tag the registry does not have.
    #[error("unknown tag {0:?}")]
    UnknownTag(String),
}

/// Default item codes and the list style each one produces.
const ITEM_CODES: [(u8, &str); 8] = [
    (b'*', "disc"),
    (b'@', "disc"),
    (b'+', "square"),
    (b'x', "square"),
    (b'#', "decimal"),
    (b'0', "circle"),
    (b'o', "circle"),
    (b'O', "circle"),
];

/// Registry of tag grammars.
///
/// Grammars are indexed by the lower-cased first byte of their name. Within one character the
/// candidates are ordered longest name first, and grammars sharing a name stay in registration
/// order next to each other.
#[derive(Clone, Debug)]
pub struct Codes {
    /// All grammars, in registration order.
    grammars: Vec<TagGrammar>,

    /// Single character shorthands for list items, with the list style they produce.
    item_codes: BTreeMap<u8, String>,

    /// Administratively disabled tags.
    disabled: TagSet,

    /// When set only these tags are parsed.
    parsed_tags: Option<TagSet>,

    /// Candidates for each starting character.
    for_parsing: HashMap<u8, Vec<TagGrammar>>,
}

impl Codes {
    /// Build a registry from `grammars` with the default item codes.
    pub fn new(grammars: Vec<TagGrammar>) -> Self {
        let mut codes = Self {
            grammars,
            item_codes: ITEM_CODES
                .iter()
                .map(|(c, style)| (*c, (*style).to_owned()))
                .collect(),
            disabled: TagSet::new(),
            parsed_tags: None,
            for_parsing: HashMap::new(),
        };
        codes.rebuild();
        codes
    }

    /// The standard tag set.
    ///
    /// # Errors
    ///
    /// Only if a built-in pattern fails to compile.
    pub fn standard() -> Result<Self, CodesError> {
        Ok(Self::new(standard::grammars()?))
    }

    fn rebuild(&mut self) {
        let mut for_parsing: HashMap<u8, Vec<TagGrammar>> = HashMap::new();
        for grammar in &self.grammars {
            if let Some(allowed) = &self.parsed_tags {
                if !allowed.contains(&grammar.name) {
                    continue;
                }
            }
            let Some(first) = grammar.name.bytes().next() else {
                continue;
            };
            for_parsing
                .entry(first.to_ascii_lowercase())
                .or_default()
                .push(grammar.clone());
        }
        for candidates in for_parsing.values_mut() {
            // Stable, grammars of one tag stay adjacent.
            candidates.sort_by(|a, b| b.len().cmp(&a.len()));
        }
        self.for_parsing = for_parsing;
    }

    /// Register another grammar.
    pub fn add_code(&mut self, grammar: TagGrammar) {
        debug!("adding grammar for tag {}", grammar.name);
        self.grammars.push(grammar);
        self.rebuild();
    }

    /// Drop every grammar of `name`. Returns how many were removed.
    pub fn remove_code(&mut self, name: &str) -> usize {
        let before = self.grammars.len();
        self.grammars.retain(|x| x.name != name);
        self.rebuild();
        before - self.grammars.len()
    }

    /// Replace the item code table.
    pub fn set_item_codes(&mut self, codes: impl IntoIterator<Item = (u8, String)>) {
        self.item_codes = codes.into_iter().collect();
    }

    /// Disable tags by name.
    ///
    /// Disabled tags are still recognized but render through their disabled templates.
    ///
    /// # Errors
    ///
    /// [`CodesError::UnknownTag`] when a name has no grammar. Nothing is changed then.
    pub fn set_disabled<I, S>(&mut self, names: I) -> Result<(), CodesError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut disabled = TagSet::new();
        for name in names {
            let name = name.as_ref().trim().to_ascii_lowercase();
            if !self.grammars.iter().any(|x| x.name == name) {
                return Err(CodesError::UnknownTag(name));
            }
            disabled.insert(name);
        }
        self.disabled = disabled;
        Ok(())
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    /// Names of all disabled tags, handed to validators.
    pub fn disabled(&self) -> &TagSet {
        &self.disabled
    }

    /// A copy of this registry that only parses `tags`.
    pub fn restrict_to<I, S>(&self, tags: I) -> Codes
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes = self.clone();
        codes.parsed_tags = Some(
            tags.into_iter()
                .map(|x| x.as_ref().to_ascii_lowercase())
                .collect(),
        );
        codes.rebuild();
        codes
    }

    fn parses(&self, name: &str) -> bool {
        self.parsed_tags
            .as_ref()
            .map_or(true, |allowed| allowed.contains(name))
    }

    /// Grammars that may start with character `c`, already lower-cased.
    pub fn candidates(&self, c: u8) -> &[TagGrammar] {
        self.for_parsing.get(&c).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Character `c` may start a tag or is an item code.
    pub fn has_candidates(&self, c: u8) -> bool {
        self.for_parsing.contains_key(&c) || self.item_code(c).is_some()
    }

    /// List style of item code `c`.
    pub fn item_code(&self, c: u8) -> Option<&str> {
        if !self.parses("list") || !self.parses("li") {
            return None;
        }
        self.item_codes.get(&c).map(String::as_str)
    }

    /// Whether the parsed grammar called `name` is block level, `false` when unknown.
    pub fn block_level(&self, name: &str) -> bool {
        name.bytes()
            .next()
            .and_then(|c| {
                self.candidates(c.to_ascii_lowercase())
                    .iter()
                    .find(|x| x.name == name)
            })
            .map_or(false, |x| x.block_level)
    }

    /// A parsed grammar called `name` exists.
    pub fn has_tag(&self, name: &str) -> bool {
        name.bytes().next().map_or(false, |c| {
            self.candidates(c.to_ascii_lowercase())
                .iter()
                .any(|x| x.name == name)
        })
    }

    /// All registered grammars.
    pub fn grammars(&self) -> &[TagGrammar] {
        &self.grammars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbc_types::TagKind;

    #[test]
    fn candidates_longest_first_and_adjacent() {
        let codes = Codes::standard().unwrap();
        let names = codes
            .candidates(b'i')
            .iter()
            .map(|x| x.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names.first(), Some(&"iurl"));
        assert_eq!(names.last(), Some(&"i"));

        let quotes = codes.candidates(b'q');
        assert!(quotes.len() >= 3);
        assert!(quotes.iter().all(|x| x.name == "quote"));
    }

    #[test]
    fn item_codes_are_parseable() {
        let codes = Codes::standard().unwrap();
        assert!(codes.has_candidates(b'*'));
        assert_eq!(codes.item_code(b'#'), Some("decimal"));
        assert_eq!(codes.item_code(b'z'), None);
    }

    #[test]
    fn restriction_hides_tags_and_item_codes() {
        let codes = Codes::standard().unwrap().restrict_to(["url", "iurl"]);
        assert!(codes.has_tag("url"));
        assert!(!codes.has_tag("b"));
        assert!(codes.candidates(b'b').is_empty());
        assert_eq!(codes.item_code(b'*'), None);
        // Restriction only changes parsing, grammars are still listed.
        assert!(codes.grammars().iter().any(|x| x.name == "b"));
    }

    #[test]
    fn disable_known_and_unknown() {
        let mut codes = Codes::standard().unwrap();
        codes.set_disabled(["B", "html"]).unwrap();
        assert!(codes.is_disabled("b"));
        assert!(codes.disabled().contains("html"));

        let err = codes.set_disabled(["nope"]).unwrap_err();
        assert!(matches!(err, CodesError::UnknownTag(ref x) if x == "nope"));
        // Failed call keeps the previous set.
        assert!(codes.is_disabled("b"));
    }

    #[test]
    fn block_level_lookup() {
        let codes = Codes::standard().unwrap();
        assert!(codes.block_level("quote"));
        assert!(!codes.block_level("b"));
        assert!(!codes.block_level("missing"));
    }

    #[test]
    fn add_and_remove() {
        let mut codes = Codes::new(vec![]);
        codes.add_code(TagGrammar::new("Spoiler", TagKind::parsed_content("<s>", "</s>")));
        assert!(codes.has_tag("spoiler"));
        assert_eq!(codes.remove_code("spoiler"), 1);
        assert!(!codes.has_tag("spoiler"));
    }
}
