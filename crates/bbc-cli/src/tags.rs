use crate::cmd::TagsArgs;
use crate::config::Config;
use anyhow::{Context, Result};
use bbc_types::{TagGrammar, Trim};
use serde::Serialize;

/// What the list shows of one grammar.
#[derive(Debug, Serialize)]
struct TagInfo<'a> {
    name: &'a str,
    kind: &'static str,
    block_level: bool,
    trim: Trim,
    parameters: Vec<&'a str>,
    disabled: bool,
}

impl<'a> TagInfo<'a> {
    fn new(grammar: &'a TagGrammar, disabled: bool) -> Self {
        Self {
            name: grammar.name.as_str(),
            kind: grammar.kind.name(),
            block_level: grammar.block_level,
            trim: grammar.trim,
            parameters: grammar.params.iter().map(|x| x.name.as_str()).collect(),
            disabled,
        }
    }
}

pub async fn run_tags_command(args: TagsArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref()).await?;
    let codes = config.codes()?;

    let tags = codes
        .grammars()
        .iter()
        .map(|x| TagInfo::new(x, codes.is_disabled(&x.name)))
        .collect::<Vec<_>>();

    if args.json {
        let output = serde_json::to_string_pretty(&tags).context("failed to serialize tags")?;
        println!("{output}");
        return Ok(());
    }

    for tag in tags {
        println!(
            "{:<10} {:<24} {:<6} {:<20} {}",
            tag.name,
            tag.kind,
            if tag.block_level { "block" } else { "inline" },
            tag.parameters.join(","),
            if tag.disabled { "disabled" } else { "" },
        );
    }
    Ok(())
}
