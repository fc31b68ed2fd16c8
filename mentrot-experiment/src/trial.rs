use anyhow::{Result, anyhow};
use mentrot_core::layout::{Bounds, Side, TrialLayout};
use mentrot_core::source::StimulusSource;
use mentrot_core::stimulus::TrialSpec;
use mentrot_core::trial::{Response, TrialState};

/// One trial in flight: layout, hit bounds, onset stamp, and (after the
/// pointer lands) the captured outcome.
#[derive(Debug, Clone)]
pub struct ActiveTrial {
    pub index: usize,
    pub spec: TrialSpec,
    pub layout: TrialLayout,
    pub correct_bounds: Bounds,
    pub onset_ms: u64,
    pub outcome: Option<(u64, Response)>,
    pub feedback_until_ms: Option<u64>,
}

impl ActiveTrial {
    /// Lay out trial `index` with the correct image on `side`. The hit
    /// bounds come from the correct stimulus' dimensions; that stimulus is
    /// guaranteed present by startup validation, so a miss here is a
    /// configuration error.
    pub fn start(
        index: usize,
        spec: TrialSpec,
        side: Side,
        center: (f32, f32),
        stimuli: &impl StimulusSource,
        onset_ms: u64,
    ) -> Result<Self> {
        let layout = TrialLayout::place(center, side);
        let (w, h) = stimuli
            .dimensions(&spec.correct)
            .ok_or_else(|| anyhow!("stimulus {} missing from registry", spec.correct))?;
        Ok(Self {
            index,
            spec,
            layout,
            correct_bounds: Bounds::centered_at(layout.correct, w, h),
            onset_ms,
            outcome: None,
            feedback_until_ms: None,
        })
    }

    pub fn state(&self) -> TrialState {
        match self.outcome {
            None => TrialState::Awaiting,
            Some(_) if self.feedback_until_ms.is_some() => TrialState::Feedback,
            Some(_) => TrialState::Complete,
        }
    }

    /// Classify a pointer-down at `pos`, `now_ms` from the session clock.
    /// Inside the correct image's bounds is `Correct`; anywhere else on the
    /// screen, including the foil and the target, is `Incorrect`.
    pub fn classify(&self, pos: (f32, f32), now_ms: u64) -> (u64, Response) {
        let rt = now_ms.saturating_sub(self.onset_ms);
        let response = if self.correct_bounds.contains(pos) {
            Response::Correct
        } else {
            Response::Incorrect
        };
        (rt, response)
    }
}
