use crate::render::run_render_command;
use crate::tags::run_tags_command;
use anyhow::Result;
use clap::ArgAction;
use clap::{Args, Parser, Subcommand};

///////// Args /////////

#[derive(Clone, Debug, Args)]
pub struct RenderArgs {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the config file holding parser settings and disabled tags"
    )]
    pub config: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        help = "Directory to save rendered html. Print to stdout when not set"
    )]
    pub output: Option<String>,

    #[arg(
        long = "no-smileys",
        help = "Keep smiley codes as text",
        default_value = "false",
        action = ArgAction::SetTrue,
    )]
    pub no_smileys: bool,

    #[arg(
        long = "footnote-start",
        help = "Number footnotes after this many already shown on the page",
        default_value = "0"
    )]
    pub footnote_start: usize,

    #[arg(required = true, help = "Files containing bbc messages, rendered in order")]
    pub files: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct TagsArgs {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the config file, disabled tags are marked in the list"
    )]
    pub config: Option<String>,

    #[arg(
        long = "json",
        help = "Print grammars as json",
        default_value = "false",
        action = ArgAction::SetTrue,
    )]
    pub json: bool,
}

///////// Subcommand /////////

#[derive(Clone, Debug, Parser)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    #[command(about = "render bbc files into html")]
    Render(RenderArgs),

    #[command(about = "list supported tags")]
    Tags(TagsArgs),
}

/// Main entry of all subcommands.
pub async fn run_command_with_args(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render(render_args) => run_render_command(render_args).await,
        Command::Tags(tags_args) => run_tags_command(tags_args).await,
    }
}
