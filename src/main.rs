mod application;
mod domain;
mod infrastructure;
mod interface;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use application::{
    auth_manager::AuthManager,
    extract::extract_json_candidate,
    feedback_workflow::{FeedbackWorkflow, FeedbackWorkflowOptions},
    normalize::normalize_item,
    repair::parse_or_repair,
};
use domain::{entities::NormalizedItem, errors::FeedbackError, ports::ConfigRepository};
use infrastructure::{
    github_adapter::OctocrabCommentGateway,
    local_config_adapter::LocalConfigAdapter,
    shell_adapter::CommandShellAdapter,
    token_providers::{EnvTokenProvider, GhCliTokenProvider, StoredTokenProvider},
};
use interface::cli::{AuthSubcommand, Cli, Commands, ConfigSubcommand};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config_repo = LocalConfigAdapter::new()?;
    let shell = CommandShellAdapter;
    let stored_provider = StoredTokenProvider::new(config_repo.auth_token_path());
    let gh_provider = GhCliTokenProvider::new(&shell);
    let env_provider = EnvTokenProvider;

    let auth_manager = AuthManager::new(
        vec![&gh_provider, &env_provider, &stored_provider],
        &stored_provider,
    );

    match cli.command {
        Commands::Apply {
            pr_url,
            answer_file,
            max_line_offset,
        } => {
            let (owner, repo, pr_number) = parse_github_pr_url(&pr_url)?;
            let raw_response = read_answer_file(&answer_file)?;

            let resolution = auth_manager.resolve_token()?.context(
                "no GitHub token found (checked: gh auth token, GITHUB_TOKEN, stored token)",
            )?;
            let gateway = OctocrabCommentGateway::new(resolution.token)?;

            let config = config_repo.load_config()?;
            let options = FeedbackWorkflowOptions {
                max_line_offset: max_line_offset.unwrap_or(config.max_line_offset),
            };

            let workflow = FeedbackWorkflow::new(&gateway, options);
            let report = workflow.apply(owner, repo, pr_number, &raw_response).await?;

            println!(
                "items={} posted_inline={} posted_general={} failed_validation={} exhausted_placement={} fallback_posted={} degraded_raw={}",
                report.total_items,
                report.posted_inline,
                report.posted_general,
                report.failed_validation,
                report.exhausted_placement,
                report.fallback_posted,
                report.degraded_raw,
            );
            if !report.offsets_used.is_empty() {
                println!(
                    "offsets_used={}",
                    report
                        .offsets_used
                        .iter()
                        .map(|o| o.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                );
            }
        }
        Commands::Inspect { answer_file } => {
            let raw_response = read_answer_file(&answer_file)?;
            print!("{}", render_inspection(&raw_response)?);
        }
        Commands::Auth(auth) => match auth.command {
            AuthSubcommand::Login { token } => {
                auth_manager.login(&token)?;
                println!("token saved to local config");
            }
            AuthSubcommand::Which => {
                if let Some(resolution) = auth_manager.resolve_token()? {
                    println!("token source: {}", resolution.source);
                    println!(
                        "token prefix: {}***",
                        &resolution.token.chars().take(6).collect::<String>()
                    );
                } else {
                    println!("no token found (checked: gh auth token, GITHUB_TOKEN, stored token)");
                }
            }
        },
        Commands::Config(config) => match config.command {
            ConfigSubcommand::Show => {
                let cfg = config_repo.load_config()?;
                println!("max_line_offset={}", cfg.max_line_offset);
                println!("config: {}", config_repo.config_path().display());
            }
            ConfigSubcommand::SetMaxLineOffset { value } => {
                if value < 0 {
                    anyhow::bail!("max_line_offset cannot be negative");
                }
                let mut cfg = config_repo.load_config()?;
                cfg.max_line_offset = value;
                config_repo.save_config(&cfg)?;
                println!("max_line_offset={value}");
            }
        },
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn read_answer_file(path: &str) -> Result<String> {
    let path = Path::new(path.trim());
    if !path.is_file() {
        anyhow::bail!("answer file does not exist: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Dry parse of an answer file: classification only, nothing posted.
fn render_inspection(raw_response: &str) -> Result<String> {
    let candidate = extract_json_candidate(raw_response).ok_or(FeedbackError::NoJsonPayload)?;
    let items = parse_or_repair(&candidate)?;

    let mut out = String::new();
    for (idx, value) in items.iter().enumerate() {
        let line = match normalize_item(value) {
            Ok(NormalizedItem::General(note)) => format!(
                "{}. general change_id={} comment={}",
                idx + 1,
                note.change_id,
                preview(&note.comment)
            ),
            Ok(NormalizedItem::Anchored(note)) => format!(
                "{}. anchored change_id={} file={} line={} summary={}",
                idx + 1,
                note.change_id,
                note.file_name,
                note.start_line,
                preview(&note.summary)
            ),
            Err(invalid) => format!("{}. invalid: {}", idx + 1, invalid.reason),
        };
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let mut preview = flat.chars().take(60).collect::<String>();
    if flat.chars().count() > 60 {
        preview.push_str("...");
    }
    preview
}

fn parse_github_pr_url(url: &str) -> Result<(&str, &str, u64)> {
    let normalized = url.trim().trim_end_matches('/');
    let needle = "github.com/";
    let idx = normalized
        .find(needle)
        .ok_or_else(|| anyhow::anyhow!("not a github.com URL"))?;
    let tail = &normalized[(idx + needle.len())..];
    let parts = tail.split('/').collect::<Vec<_>>();
    if parts.len() < 4 {
        anyhow::bail!("URL format must be github.com/<owner>/<repo>/pull/<number>");
    }
    let owner = parts[0];
    let repo = parts[1];
    if parts[2] != "pull" {
        anyhow::bail!("URL path segment must contain /pull/");
    }
    let pr_number = parts[3].parse::<u64>()?;
    Ok((owner, repo, pr_number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pr_url() {
        let (owner, repo, number) =
            parse_github_pr_url("https://github.com/owner/repo/pull/123/").expect("valid url");
        assert_eq!((owner, repo, number), ("owner", "repo", 123));
    }

    #[test]
    fn rejects_non_pull_url() {
        assert!(parse_github_pr_url("https://github.com/owner/repo/issues/5").is_err());
    }

    #[test]
    fn inspection_lists_each_item() {
        let raw = r#"[
            {"change_id": "-1", "comment": "overall fine"},
            {"change_id": "2", "file_name": "./a.py", "start_line": "10", "summary": "s"},
            {"change_id": "3"}
        ]"#;
        let rendered = render_inspection(raw).expect("inspectable");
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("general"));
        assert!(lines[1].contains("file=a.py"));
        assert!(lines[2].contains("invalid"));
    }
}
