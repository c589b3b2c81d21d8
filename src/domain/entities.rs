use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_max_line_offset")]
    pub max_line_offset: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_line_offset: default_max_line_offset(),
        }
    }
}

fn default_max_line_offset() -> i64 {
    10
}

#[derive(Debug, Clone)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub head_sha: String,
    pub html_url: Option<String>,
}

/// One feedback item after validation and sentinel decoding.
#[derive(Debug, Clone)]
pub enum NormalizedItem {
    General(GeneralNote),
    Anchored(AnchoredNote),
}

/// Feedback not tied to a file/line (`change_id` sentinel "-1"/"-2").
#[derive(Debug, Clone)]
pub struct GeneralNote {
    pub change_id: String,
    pub comment: String,
}

/// Feedback tied to a file and a claimed line on the post-change side.
///
/// `comment` stays optional: the posted body falls back to `reason` when
/// the model did not supply one.
#[derive(Debug, Clone)]
pub struct AnchoredNote {
    pub change_id: String,
    pub file_name: String,
    pub start_line: i64,
    pub summary: String,
    pub reason: String,
    pub proposed_code: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    Posted { offset: i64 },
    Unprocessed { reason: String },
}
