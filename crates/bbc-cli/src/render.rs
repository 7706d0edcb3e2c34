use crate::cmd::RenderArgs;
use crate::config::Config;
use anyhow::{Context, Result};
use bbc_parser::{FootnoteCounter, Parser, SmileyMap};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Files read at the same time.
const READ_BUFFER: usize = 4;

pub async fn run_render_command(args: RenderArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref()).await?;
    let codes = Arc::new(config.codes()?);

    let mut parser = Parser::new(codes)
        .with_settings(config.parser.clone())
        .with_smiley_parser(SmileyMap::standard(config.smileys.url.as_str()));
    parser.enable_smileys(!args.no_smileys);

    let messages = read_messages(&args.files).await?;

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir)
            .await
            .context("when creating output directory")?;
    }

    // Messages are shown on one page, footnote anchors must not collide.
    let mut footnotes = FootnoteCounter::new(args.footnote_start);
    for (path, message) in args.files.iter().zip(messages) {
        let html = parser.parse_with_footnotes(&message, &mut footnotes);
        let cacheable = parser.can_cache_result();
        debug!("rendered {path}, {} footnotes so far", footnotes.total());

        match &args.output {
            Some(dir) => {
                let stem = Path::new(path)
                    .file_stem()
                    .and_then(|x| x.to_str())
                    .context("invalid message file name")?;
                let out = Path::new(dir).join(format!("{stem}.html"));
                fs::write(&out, html)
                    .await
                    .with_context(|| format!("when writing {}", out.display()))?;
                println!("{path} -> {} (cacheable: {cacheable})", out.display());
            }
            None => {
                println!("<!-- {path} (cacheable: {cacheable}) -->");
                println!("{html}");
            }
        }
    }

    Ok(())
}

/// Read message files, at most [`READ_BUFFER`] at once, keeping the order of `paths`.
async fn read_messages(paths: &[String]) -> Result<Vec<String>> {
    futures::stream::iter(paths.iter().map(|path| async move {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("when reading message file {path}"))
    }))
    .buffered(READ_BUFFER)
    .collect::<Vec<_>>()
    .await
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn messages_keep_file_order() {
        let dir = std::env::temp_dir().join(format!("bbc-cli-read-{}", std::process::id()));
        fs::create_dir_all(&dir).await.unwrap();
        let mut paths = vec![];
        for i in 0..6 {
            let path = dir.join(format!("{i}.txt"));
            fs::write(&path, format!("[b]{i}[/b]")).await.unwrap();
            paths.push(path.display().to_string());
        }

        let messages = read_messages(&paths).await.unwrap();
        assert_eq!(messages[0], "[b]0[/b]");
        assert_eq!(messages[5], "[b]5[/b]");

        paths.push(dir.join("missing.txt").display().to_string());
        let err = read_messages(&paths).await.unwrap_err();
        assert!(format!("{err:#}").contains("missing.txt"));

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
