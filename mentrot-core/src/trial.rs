use serde::{Deserialize, Serialize};

pub const TRAINING_BLOCK: &str = "training";
pub const TEST_BLOCK: &str = "test";

/// States a running trial moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    /// Stimuli on screen, waiting for the pointer.
    Awaiting,
    /// Response captured, feedback dwell in progress.
    Feedback,
    Complete,
}

/// Classification of a pointer response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Correct,
    Incorrect,
}

impl Response {
    pub fn as_str(self) -> &'static str {
        match self {
            Response::Correct => "correct",
            Response::Incorrect => "incorrect",
        }
    }

    /// Name of the feedback indicator image for this response.
    pub fn feedback_name(self) -> &'static str {
        match self {
            Response::Correct => crate::stimulus::FEEDBACK_CORRECT,
            Response::Incorrect => crate::stimulus::FEEDBACK_INCORRECT,
        }
    }
}

/// Recorded outcome of one trial, immutable once pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub block: String,
    /// 1-based position within the block.
    pub trial: usize,
    pub rt_ms: Option<u64>,
    pub response: Option<Response>,
}
