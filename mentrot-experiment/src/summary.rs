use mentrot_core::trial::{Response, TEST_BLOCK, TrialResult};

/// Score feedback computed over the test block only.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub percent_correct: f64,
    /// Mean RT over correct responses, 0.0 when there are none.
    pub avg_rt_correct_ms: f64,
}

impl SessionSummary {
    pub fn compute(results: &[TrialResult]) -> Self {
        let test: Vec<&TrialResult> = results.iter().filter(|r| r.block == TEST_BLOCK).collect();
        if test.is_empty() {
            return Self {
                percent_correct: 0.0,
                avg_rt_correct_ms: 0.0,
            };
        }

        let correct: Vec<&&TrialResult> = test
            .iter()
            .filter(|r| r.response == Some(Response::Correct))
            .collect();
        let percent_correct = correct.len() as f64 / test.len() as f64 * 100.0;

        let rts: Vec<u64> = correct.iter().filter_map(|r| r.rt_ms).collect();
        let avg_rt_correct_ms = if rts.is_empty() {
            0.0
        } else {
            rts.iter().sum::<u64>() as f64 / rts.len() as f64
        };

        Self {
            percent_correct,
            avg_rt_correct_ms,
        }
    }

    /// The lines shown on the summary screen.
    pub fn display_lines(&self) -> Vec<String> {
        vec![
            format!(
                "Percentage correct (Test block): {:.1}%",
                self.percent_correct
            ),
            format!("Average RT (correct only): {:.0} ms", self.avg_rt_correct_ms),
            "Press space to continue.".to_string(),
        ]
    }
}
