use crate::trial::{TEST_BLOCK, TRAINING_BLOCK};

/// Linear session phases, no branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Intro,
    TrainingIntro,
    Training,
    TestIntro,
    Test,
    Summary,
    Persist,
    Outro,
    Done,
}

impl SessionPhase {
    pub fn next(self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Intro => TrainingIntro,
            TrainingIntro => Training,
            Training => TestIntro,
            TestIntro => Test,
            Test => Summary,
            Summary => Persist,
            Persist => Outro,
            Outro => Done,
            Done => return None,
        })
    }

    /// True while a trial block is running.
    pub fn is_block(self) -> bool {
        matches!(self, SessionPhase::Training | SessionPhase::Test)
    }

    /// Block label recorded on results produced in this phase.
    pub fn block_name(self) -> Option<&'static str> {
        match self {
            SessionPhase::Training => Some(TRAINING_BLOCK),
            SessionPhase::Test => Some(TEST_BLOCK),
            _ => None,
        }
    }

    pub fn is_done(self) -> bool {
        self == SessionPhase::Done
    }
}
