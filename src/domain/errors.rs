use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("no JSON payload found in model response")]
    NoJsonPayload,
    #[error("feedback JSON could not be repaired, parse error at char {offset}: ...{window}...")]
    Unrepairable { offset: usize, window: String },
}
