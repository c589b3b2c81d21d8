use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "lineanchor",
    version,
    about = "Anchors model-generated code review feedback onto pull request lines",
    long_about = "lineanchor: turns the free-form answer of a review model into line-anchored \
and general pull request comments, with a single aggregated fallback comment for everything \
that could not be placed.",
    after_long_help = "Examples:\n  lineanchor apply https://github.com/owner/repo/pull/123 answer.txt\n  lineanchor apply https://github.com/owner/repo/pull/123 answer.txt --max-line-offset 5\n  lineanchor inspect answer.txt\n  lineanchor auth login ghp_xxx\n  lineanchor config show"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Post the feedback from a model answer file onto a pull request")]
    Apply {
        #[arg(help = "GitHub PR link, e.g. https://github.com/owner/repo/pull/123")]
        pr_url: String,
        #[arg(help = "File holding the raw model response")]
        answer_file: String,
        #[arg(
            long,
            help = "Search bound for the line offset probe (overrides the configured default)"
        )]
        max_line_offset: Option<i64>,
    },
    #[command(about = "Parse and classify a model answer file without posting anything")]
    Inspect {
        #[arg(help = "File holding the raw model response")]
        answer_file: String,
    },
    #[command(about = "Authentication (save a token, show the active token source)")]
    Auth(AuthCommand),
    #[command(about = "Local configuration")]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthSubcommand {
    #[command(about = "Save a GitHub token to the local config directory")]
    Login { token: String },
    #[command(about = "Show which token source is active (gh/env/stored)")]
    Which,
}

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    #[command(about = "Print the active configuration and its file path")]
    Show,
    #[command(about = "Persist the default line offset search bound")]
    SetMaxLineOffset { value: i64 },
}
