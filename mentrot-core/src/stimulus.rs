/// Stimulus naming scheme for the mental rotation task.
///
/// One image file per symbolic name: seven UI screens plus
/// `target{i}`/`correct{i}`/`wrong{i}` for the fifteen enumerated trials.
pub const UI_NAMES: [&str; 7] = [
    "instructions",
    "instruction2",
    "correct",
    "incorrect",
    "training",
    "readyforreal",
    "thatwasit",
];

pub const TRIAL_COUNT: usize = 15;
pub const TRAINING_TRIAL_COUNT: usize = 5;

/// The decorative overlay drawn beside the trial stimuli when present.
pub const OVERLAY_NAME: &str = "instruction2";

/// Feedback indicator names, keyed by response.
pub const FEEDBACK_CORRECT: &str = "correct";
pub const FEEDBACK_INCORRECT: &str = "incorrect";

/// Three stimulus names making up one trial presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSpec {
    pub target: String,
    pub correct: String,
    pub wrong: String,
}

impl TrialSpec {
    /// Spec for trial index `i` (1-based). Names always resolve to
    /// `target{i}`, `correct{i}`, `wrong{i}`.
    pub fn for_index(i: usize) -> Self {
        Self {
            target: format!("target{i}"),
            correct: format!("correct{i}"),
            wrong: format!("wrong{i}"),
        }
    }
}

/// Trial specs 1..=5, in order.
pub fn training_specs() -> Vec<TrialSpec> {
    (1..=TRAINING_TRIAL_COUNT).map(TrialSpec::for_index).collect()
}

/// Trial specs 6..=15, in order.
pub fn test_specs() -> Vec<TrialSpec> {
    (TRAINING_TRIAL_COUNT + 1..=TRIAL_COUNT)
        .map(TrialSpec::for_index)
        .collect()
}

/// Every name the asset directory is expected to provide (52 entries).
pub fn all_names() -> Vec<String> {
    let mut names: Vec<String> = UI_NAMES.iter().map(|n| n.to_string()).collect();
    names.extend(required_names());
    names
}

/// The names whose absence is a configuration error: the 45 trial stimuli.
pub fn required_names() -> Vec<String> {
    let mut names = Vec::with_capacity(TRIAL_COUNT * 3);
    for prefix in ["target", "correct", "wrong"] {
        for i in 1..=TRIAL_COUNT {
            names.push(format!("{prefix}{i}"));
        }
    }
    names
}
