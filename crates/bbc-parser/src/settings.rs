use serde::{Deserialize, Serialize};

/// Switches for one parser.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserSettings {
    /// When off, messages only get cut and paste cleanup.
    pub enable_bbc: bool,

    /// Restore entity-escaped html with an [`bbc_types::HtmlParser`].
    pub enable_post_html: bool,

    /// Turn bare links into tags.
    pub autolink_urls: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            enable_bbc: true,
            enable_post_html: false,
            autolink_urls: true,
        }
    }
}
