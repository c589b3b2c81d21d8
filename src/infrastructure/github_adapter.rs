use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use crate::domain::{entities::PullRequestSummary, ports::CommentGateway};

#[derive(Clone)]
pub struct OctocrabCommentGateway {
    client: octocrab::Octocrab,
}

impl OctocrabCommentGateway {
    pub fn new(token: String) -> Result<Self> {
        let client = octocrab::Octocrab::builder()
            .personal_token(token)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CommentGateway for OctocrabCommentGateway {
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
    ) -> Result<PullRequestSummary> {
        let pr = self.client.pulls(owner, repo).get(pull_number).await?;
        Ok(PullRequestSummary {
            number: pr.number,
            title: pr.title.unwrap_or_else(|| "(no title)".to_string()),
            head_sha: pr.head.sha,
            html_url: pr.html_url.map(|url| url.to_string()),
        })
    }

    async fn post_general_comment(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        body: &str,
    ) -> Result<()> {
        self.client
            .issues(owner, repo)
            .create_comment(pull_number, body)
            .await?;
        Ok(())
    }

    async fn post_line_comment(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        commit_sha: &str,
        path: &str,
        line: u64,
        body: &str,
    ) -> Result<()> {
        let route = format!("/repos/{owner}/{repo}/pulls/{pull_number}/comments");
        let payload = json!({
            "body": body,
            "commit_id": commit_sha,
            "path": path,
            "line": line,
            "side": "RIGHT",
        });
        let _: serde_json::Value = self.client.post(route, Some(&payload)).await?;
        Ok(())
    }

    async fn post_fallback_comment(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
        body: &str,
    ) -> Result<()> {
        self.client
            .issues(owner, repo)
            .create_comment(pull_number, body)
            .await?;
        Ok(())
    }
}
