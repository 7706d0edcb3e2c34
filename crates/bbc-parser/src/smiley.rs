use bbc_types::SmileyParser;

/// Codes every forum knows, with the image file they show.
const STANDARD_SMILEYS: [(&str, &str, &str); 10] = [
    (">:D", "evil.gif", "Evil"),
    (":)", "smiley.gif", "Smiley"),
    (";)", "wink.gif", "Wink"),
    (":D", "cheesy.gif", "Cheesy"),
    (";D", "grin.gif", "Grin"),
    (">:(", "angry.gif", "Angry"),
    (":(", "sad.gif", "Sad"),
    (":o", "shocked.gif", "Shocked"),
    ("8)", "cool.gif", "Cool"),
    (":P", "tongue.gif", "Tongue"),
];

/// Smiley codes replaced by images.
///
/// A code is only replaced when it stands on its own: at the start or after whitespace or
/// punctuation, and not followed by a letter or digit.
#[derive(Clone, Debug)]
pub struct SmileyMap {
    /// Directory url the image files live in.
    url: String,

    /// Code, file and description. Longest code first.
    smileys: Vec<(String, String, String)>,
}

impl SmileyMap {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            smileys: vec![],
        }
    }

    /// The common smiley set served from `url`.
    pub fn standard(url: impl Into<String>) -> Self {
        STANDARD_SMILEYS
            .iter()
            .fold(Self::new(url), |map, (code, file, description)| {
                map.add(*code, *file, *description)
            })
    }

    pub fn add(
        mut self,
        code: impl Into<String>,
        file: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.smileys
            .push((code.into(), file.into(), description.into()));
        self.smileys.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    fn render(&self, file: &str, description: &str) -> String {
        format!(
            "<img src=\"{}/{file}\" alt=\"&#58;{description}\" title=\"{description}\" \
             class=\"smiley\" />",
            self.url.trim_end_matches('/')
        )
    }
}

fn opens_smiley(prev: Option<char>) -> bool {
    prev.map_or(true, |x| {
        x.is_whitespace()
            || matches!(
                x,
                '>' | ':' | '?' | '.' | '[' | ']' | '(' | ')' | '*' | '\\' | ';' | '\u{a0}'
            )
    })
}

fn closes_smiley(next: Option<char>) -> bool {
    next.map_or(true, |x| !x.is_alphanumeric())
}

impl SmileyParser for SmileyMap {
    fn parse(&self, text: &mut String) {
        if self.smileys.is_empty() {
            return;
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text.as_str();
        let mut prev = None;
        'outer: while !rest.is_empty() {
            if opens_smiley(prev) {
                for (code, file, description) in &self.smileys {
                    if let Some(tail) = rest.strip_prefix(code.as_str()) {
                        if closes_smiley(tail.chars().next()) {
                            out.push_str(&self.render(file, description));
                            rest = tail;
                            prev = code.chars().last();
                            continue 'outer;
                        }
                    }
                }
            }
            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                out.push(ch);
                prev = Some(ch);
            }
            rest = chars.as_str();
        }
        *text = out;
    }
}
