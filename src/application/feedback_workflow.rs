use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::application::{
    extract::extract_json_candidate,
    normalize::{decode_sentinels, normalize_item},
    repair::parse_or_repair,
};
use crate::domain::{
    entities::{AnchoredNote, GeneralNote, NormalizedItem, PlacementOutcome},
    ports::CommentGateway,
};

const DEFAULT_MAX_LINE_OFFSET: i64 = 10;

const FALLBACK_HEADER: &str =
    "The following feedback could not be added to specific lines, but still contains valuable information:";

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlacementReport {
    pub total_items: usize,
    pub posted_inline: usize,
    pub posted_general: usize,
    pub failed_validation: usize,
    pub exhausted_placement: usize,
    pub fallback_posted: bool,
    pub degraded_raw: bool,
    pub offsets_used: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct FeedbackWorkflowOptions {
    pub max_line_offset: i64,
}

impl Default for FeedbackWorkflowOptions {
    fn default() -> Self {
        Self {
            max_line_offset: DEFAULT_MAX_LINE_OFFSET,
        }
    }
}

/// Turns one raw model response into pull request annotations.
///
/// Every feedback item ends up either as a placed comment or as an entry
/// in a single fallback comment; nothing is silently dropped. Items are
/// processed in payload order and the run is sequential end to end, so the
/// order of posted comments matches the order the model emitted them.
pub struct FeedbackWorkflow<'a> {
    gateway: &'a dyn CommentGateway,
    options: FeedbackWorkflowOptions,
}

impl<'a> FeedbackWorkflow<'a> {
    pub fn new(gateway: &'a dyn CommentGateway, options: FeedbackWorkflowOptions) -> Self {
        Self { gateway, options }
    }

    pub async fn apply(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        raw_response: &str,
    ) -> Result<PlacementReport> {
        let mut report = PlacementReport::default();

        let items = match self.recover_items(raw_response) {
            Ok(items) => items,
            Err(err) => {
                // batch-fatal parse path: the raw text still surfaces verbatim
                tracing::warn!(%err, "feedback payload unusable, degrading to raw fallback");
                report.degraded_raw = true;
                self.post_fallback(owner, repo, pr_number, &[decode_sentinels(raw_response)])
                    .await?;
                report.fallback_posted = true;
                return Ok(report);
            }
        };

        report.total_items = items.len();
        let pr = self.gateway.get_pull_request(owner, repo, pr_number).await?;
        tracing::info!(
            pr = pr.number,
            title = %pr.title,
            url = ?pr.html_url,
            items = report.total_items,
            "placing feedback items"
        );

        let mut unplaced: Vec<String> = Vec::new();
        for value in &items {
            match normalize_item(value) {
                Err(item) => {
                    tracing::warn!(reason = %item.reason, "feedback item failed validation");
                    report.failed_validation += 1;
                    unplaced.push(decode_sentinels(&item.raw.to_string()));
                }
                Ok(NormalizedItem::General(note)) => {
                    match self
                        .gateway
                        .post_general_comment(owner, repo, pr_number, &note.comment)
                        .await
                    {
                        Ok(()) => report.posted_general += 1,
                        Err(err) => {
                            tracing::warn!(%err, change_id = %note.change_id, "general comment rejected");
                            unplaced.push(render_general_entry(&note));
                        }
                    }
                }
                Ok(NormalizedItem::Anchored(note)) => {
                    let body = render_line_comment(&note);
                    match self
                        .locate_and_post(owner, repo, pr_number, &pr.head_sha, &note, &body)
                        .await
                    {
                        PlacementOutcome::Posted { offset } => {
                            report.posted_inline += 1;
                            report.offsets_used.push(offset);
                        }
                        PlacementOutcome::Unprocessed { reason } => {
                            tracing::warn!(
                                file = %note.file_name,
                                line = note.start_line,
                                %reason,
                                "all line offsets rejected"
                            );
                            report.exhausted_placement += 1;
                            unplaced.push(render_anchored_entry(&note, &body));
                        }
                    }
                }
            }
        }

        if !unplaced.is_empty() {
            self.post_fallback(owner, repo, pr_number, &unplaced).await?;
            report.fallback_posted = true;
        }

        Ok(report)
    }

    /// Probes outward from the claimed line until the diff accepts one.
    /// Candidate lines below 1 count as rejected without an API call; any
    /// gateway error counts as "this offset is invalid" and the search
    /// moves on.
    async fn locate_and_post(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        commit_sha: &str,
        note: &AnchoredNote,
        body: &str,
    ) -> PlacementOutcome {
        let mut last_reason = String::new();
        for offset in offset_sequence(self.options.max_line_offset) {
            let line = note.start_line + offset;
            if line < 1 {
                last_reason = format!("line {line} out of range");
                continue;
            }
            match self
                .gateway
                .post_line_comment(
                    owner,
                    repo,
                    pr_number,
                    commit_sha,
                    &note.file_name,
                    line as u64,
                    body,
                )
                .await
            {
                Ok(()) => return PlacementOutcome::Posted { offset },
                Err(err) => last_reason = err.to_string(),
            }
        }

        PlacementOutcome::Unprocessed {
            reason: last_reason,
        }
    }

    async fn post_fallback(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        entries: &[String],
    ) -> Result<()> {
        let body = build_fallback_body(entries);
        if let Err(err) = self
            .gateway
            .post_fallback_comment(owner, repo, pr_number, &body)
            .await
        {
            tracing::error!(%err, "failed to post fallback comment");
            return Err(err);
        }
        Ok(())
    }

    fn recover_items(&self, raw_response: &str) -> Result<Vec<Value>> {
        let candidate = extract_json_candidate(raw_response)
            .ok_or(crate::domain::errors::FeedbackError::NoJsonPayload)?;
        Ok(parse_or_repair(&candidate)?)
    }
}

/// `0, -1, +1, -2, +2, ...` — the claimed line is usually off by a small,
/// diff-context-dependent amount, so the search expands symmetrically.
pub fn offset_sequence(max_offset: i64) -> Vec<i64> {
    let mut offsets = vec![0];
    for step in 1..=max_offset.max(0) {
        offsets.push(-step);
        offsets.push(step);
    }
    offsets
}

fn render_line_comment(note: &AnchoredNote) -> String {
    let text = note.comment.clone().unwrap_or_else(|| note.reason.clone());
    format!("{}\n\n```\n{}\n```", text, note.proposed_code)
}

fn render_general_entry(note: &GeneralNote) -> String {
    format!("(general, change_id {})\n{}", note.change_id, note.comment)
}

fn render_anchored_entry(note: &AnchoredNote, body: &str) -> String {
    format!("`{}`:{}\n{}", note.file_name, note.start_line, body)
}

fn build_fallback_body(entries: &[String]) -> String {
    let mut out = String::new();
    out.push_str(FALLBACK_HEADER);
    out.push('\n');
    for entry in entries {
        out.push_str("\n```\n");
        out.push_str(entry);
        out.push_str("\n```\n");
    }
    out
}
