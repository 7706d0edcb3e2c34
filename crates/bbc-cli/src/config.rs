use anyhow::{Context, Result};
use bbc_codes::Codes;
use bbc_parser::ParserSettings;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::trace;

/// Config definition for rendering.
///
/// ```toml
/// [parser]
/// enable_post_html = true
///
/// [codes]
/// disabled = ["flash", "html"]
///
/// [smileys]
/// url = "https://example.org/smileys"
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) parser: ParserSettings,

    pub(crate) codes: CodesConfig,

    pub(crate) smileys: SmileysConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CodesConfig {
    /// Tags rendered through their disabled templates.
    pub(crate) disabled: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SmileysConfig {
    /// Directory url holding the smiley images.
    pub(crate) url: String,
}

impl Default for SmileysConfig {
    fn default() -> Self {
        Self {
            url: "/smileys".to_owned(),
        }
    }
}

impl Config {
    /// Load config from `path`, default config when not set.
    pub(crate) async fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = fs::read_to_string(path)
            .await
            .context("when reading config file")?;
        let config: Config = toml::from_str(data.as_str()).context("invalid config")?;
        trace!("{config:#?}");
        Ok(config)
    }

    /// The standard registry with configured tags disabled.
    pub(crate) fn codes(&self) -> Result<Codes> {
        let mut codes = Codes::standard().context("failed to build standard tags")?;
        codes
            .set_disabled(&self.codes.disabled)
            .context("invalid disabled tags")?;
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let config: Config = toml::from_str(
            r#"
            [parser]
            autolink_urls = false

            [codes]
            disabled = ["flash"]
            "#,
        )
        .unwrap();
        assert!(config.parser.enable_bbc);
        assert!(!config.parser.autolink_urls);
        assert_eq!(config.smileys.url, "/smileys");
        assert!(config.codes().unwrap().is_disabled("flash"));
    }

    #[test]
    fn unknown_disabled_tag() {
        let config: Config = toml::from_str("[codes]\ndisabled = [\"blink\"]").unwrap();
        assert!(config.codes().is_err());
    }
}
