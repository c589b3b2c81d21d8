use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::{AppConfig, PullRequestSummary};

/// Comment surface of one pull request. A rejection from
/// `post_line_comment` is the expected, non-exceptional signal that the
/// requested line is not part of the diff.
#[async_trait]
pub trait CommentGateway: Send + Sync {
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
    ) -> Result<PullRequestSummary>;
    async fn post_general_comment(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        body: &str,
    ) -> Result<()>;
    async fn post_line_comment(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        commit_sha: &str,
        path: &str,
        line: u64,
        body: &str,
    ) -> Result<()>;
    async fn post_fallback_comment(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        body: &str,
    ) -> Result<()>;
}

pub trait ConfigRepository: Send + Sync {
    fn load_config(&self) -> Result<AppConfig>;
    fn save_config(&self, config: &AppConfig) -> Result<()>;
    fn config_path(&self) -> &std::path::Path;
}

pub trait TokenProvider: Send + Sync {
    fn source_name(&self) -> &'static str;
    fn token(&self) -> Result<Option<String>>;
}

pub trait TokenWriter: Send + Sync {
    fn save_token(&self, token: &str) -> Result<()>;
}
