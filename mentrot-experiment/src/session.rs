use anyhow::{Context, Result};
use mentrot_core::layout::Side;
use mentrot_core::phase::SessionPhase;
use mentrot_core::scene::{Scene, TrialScene};
use mentrot_core::source::StimulusSource;
use mentrot_core::stimulus::{OVERLAY_NAME, test_specs, training_specs};
use mentrot_core::trial::{TEST_BLOCK, TRAINING_BLOCK, TrialResult};
use mentrot_timing::Clock;
use rand::Rng;

use crate::block::BlockRun;
use crate::config::SessionConfig;
use crate::results::ResultSink;
use crate::summary::SessionSummary;
use crate::trial::ActiveTrial;

/// Keyboard input as the engine sees it. Intro screens advance on any key,
/// the summary screen only on space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Other,
}

/// The session orchestrator: a linear phase machine over the trial blocks.
///
/// The app shell feeds it key presses and pointer-downs in logical screen
/// coordinates and calls `update` once per frame so dwells can expire; a
/// quit signal never reaches the engine, it tears the process down from the
/// shell. Generic over its capabilities so tests run it against a virtual
/// clock, a seeded RNG, a plain size table and an in-memory sink.
pub struct SessionRunner<C, R, S, W>
where
    C: Clock,
    R: Rng,
    S: StimulusSource,
    W: ResultSink,
{
    pub phase: SessionPhase,
    pub config: SessionConfig,
    clock: C,
    rng: R,
    stimuli: S,
    sink: W,
    block: Option<BlockRun>,
    active: Option<ActiveTrial>,
    results: Vec<TrialResult>,
    summary: Option<SessionSummary>,
    outro_until_ms: Option<u64>,
}

impl<C, R, S, W> SessionRunner<C, R, S, W>
where
    C: Clock,
    R: Rng,
    S: StimulusSource,
    W: ResultSink,
{
    pub fn new(config: SessionConfig, clock: C, rng: R, stimuli: S, sink: W) -> Self {
        Self {
            phase: SessionPhase::default(),
            config,
            clock,
            rng,
            stimuli,
            sink,
            block: None,
            active: None,
            results: Vec::new(),
            summary: None,
            outro_until_ms: None,
        }
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn current_trial(&self) -> Option<&ActiveTrial> {
        self.active.as_ref()
    }

    /// A key press. Ignored during trials and timed dwells.
    pub fn handle_key(&mut self, key: Key) -> Result<()> {
        match self.phase {
            SessionPhase::Intro | SessionPhase::TrainingIntro | SessionPhase::TestIntro => {
                self.advance_phase()
            }
            SessionPhase::Summary if key == Key::Space => self.advance_phase(),
            SessionPhase::Outro if self.outro_until_ms.is_none() => self.advance_phase(),
            _ => Ok(()),
        }
    }

    /// A pointer-down at `pos`. Captures at most one response per trial;
    /// presses during the feedback dwell are dropped.
    pub fn handle_pointer(&mut self, pos: (f32, f32)) -> Result<()> {
        if !self.phase.is_block() {
            return Ok(());
        }
        let now = self.clock.now_ms();
        let feedback_ms = self.config.feedback_ms;
        if let Some(trial) = self.active.as_mut() {
            if trial.outcome.is_some() {
                return Ok(());
            }
            trial.outcome = Some(trial.classify(pos, now));
            trial.feedback_until_ms = Some(now + feedback_ms);
        }
        Ok(())
    }

    /// Advance timed state: feedback dwell expiry and the closing dwell.
    pub fn update(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        match self.phase {
            SessionPhase::Training | SessionPhase::Test => {
                let expired = self
                    .active
                    .as_ref()
                    .and_then(|t| t.feedback_until_ms)
                    .is_some_and(|until| now >= until);
                if expired {
                    self.finish_trial()?;
                }
                Ok(())
            }
            SessionPhase::Outro => {
                if self.outro_until_ms.is_some_and(|until| now >= until) {
                    self.advance_phase()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn advance_phase(&mut self) -> Result<()> {
        let Some(next) = self.phase.next() else {
            return Ok(());
        };
        self.phase = next;
        match next {
            SessionPhase::Training => {
                println!("Starting training block...");
                self.block = Some(BlockRun::new(TRAINING_BLOCK, training_specs()));
                self.start_trial()
            }
            SessionPhase::Test => {
                println!("Starting test block...");
                self.block = Some(BlockRun::new(TEST_BLOCK, test_specs()));
                self.start_trial()
            }
            SessionPhase::Summary => {
                self.summary = Some(SessionSummary::compute(&self.results));
                Ok(())
            }
            SessionPhase::Persist => {
                self.persist();
                self.advance_phase()
            }
            SessionPhase::Outro => {
                self.outro_until_ms = self
                    .stimuli
                    .contains("thatwasit")
                    .then(|| self.clock.now_ms() + self.config.outro_ms);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn start_trial(&mut self) -> Result<()> {
        let (index, spec) = {
            let block = self.block.as_mut().context("no active block")?;
            block.next_spec().context("block already exhausted")?
        };
        let side = if self.rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        self.active = Some(ActiveTrial::start(
            index,
            spec,
            side,
            self.config.center(),
            &self.stimuli,
            self.clock.now_ms(),
        )?);
        Ok(())
    }

    fn finish_trial(&mut self) -> Result<()> {
        let Some(trial) = self.active.take() else {
            return Ok(());
        };
        let Some((rt_ms, response)) = trial.outcome else {
            return Ok(());
        };
        let block_name = self
            .block
            .as_ref()
            .map(|b| b.name())
            .context("no active block")?;
        self.results.push(TrialResult {
            block: block_name.to_string(),
            trial: trial.index,
            rt_ms: Some(rt_ms),
            response: Some(response),
        });

        let exhausted = self.block.as_ref().is_none_or(|b| b.is_exhausted());
        if exhausted {
            self.advance_phase()
        } else {
            self.start_trial()
        }
    }

    /// Flush the full ordered result sequence once. A write failure is
    /// reported to the operator and does not block the closing screen.
    fn persist(&mut self) {
        if let Err(e) = self.sink.write_all(&self.results) {
            eprintln!("Failed to write results: {e:#}");
        }
    }

    /// View model for the current frame.
    pub fn scene(&self) -> Scene {
        match self.phase {
            SessionPhase::Intro => Scene::screen(
                "instructions",
                &["Instructions:", "Press any key to start training."],
            ),
            SessionPhase::TrainingIntro => {
                Scene::screen("training", &["Training Block", "Press any key to continue."])
            }
            SessionPhase::TestIntro => {
                Scene::screen("readyforreal", &["Test Block", "Press any key to continue."])
            }
            SessionPhase::Training | SessionPhase::Test => match &self.active {
                Some(trial) => match trial.outcome {
                    None => Scene::Trial(TrialScene {
                        target: trial.spec.target.clone(),
                        correct: trial.spec.correct.clone(),
                        wrong: trial.spec.wrong.clone(),
                        overlay: OVERLAY_NAME.to_string(),
                        layout: trial.layout,
                    }),
                    Some((_, response)) => Scene::Feedback {
                        image: response.feedback_name().to_string(),
                        pos: trial.layout.feedback,
                    },
                },
                None => Scene::Blank,
            },
            SessionPhase::Summary => Scene::Summary {
                lines: self
                    .summary
                    .as_ref()
                    .map(|s| s.display_lines())
                    .unwrap_or_default(),
            },
            SessionPhase::Outro => {
                Scene::screen("thatwasit", &["That was it!", "Press any key to exit."])
            }
            SessionPhase::Persist | SessionPhase::Done => Scene::Blank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{CSV_HEADER, CsvResultSink};
    use mentrot_core::source::StimulusSizes;
    use mentrot_core::trial::Response;
    use mentrot_timing::VirtualClock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemorySink {
        writes: Arc<Mutex<Vec<Vec<TrialResult>>>>,
    }

    impl ResultSink for MemorySink {
        fn write_all(&mut self, results: &[TrialResult]) -> Result<()> {
            self.writes.lock().unwrap().push(results.to_vec());
            Ok(())
        }
    }

    struct FailingSink;

    impl ResultSink for FailingSink {
        fn write_all(&mut self, _results: &[TrialResult]) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn full_stimuli() -> StimulusSizes {
        let mut sizes = StimulusSizes::new();
        for name in mentrot_core::stimulus::all_names() {
            sizes.insert(name, (100, 100));
        }
        sizes
    }

    fn session_with<W: ResultSink>(
        clock: VirtualClock,
        stimuli: StimulusSizes,
        sink: W,
    ) -> SessionRunner<VirtualClock, StdRng, StimulusSizes, W> {
        SessionRunner::new(
            SessionConfig::default(),
            clock,
            StdRng::seed_from_u64(42),
            stimuli,
            sink,
        )
    }

    /// Run one block's worth of trials, clicking where `click_at` says and
    /// advancing the virtual clock by `rts[i]` before each click.
    fn run_block_trials<W: ResultSink>(
        session: &mut SessionRunner<VirtualClock, StdRng, StimulusSizes, W>,
        clock: &VirtualClock,
        rts: &[u64],
        click_at: impl Fn(&ActiveTrial) -> (f32, f32),
    ) {
        for &rt in rts {
            let pos = click_at(session.current_trial().expect("trial active"));
            clock.advance_ms(rt);
            session.handle_pointer(pos).unwrap();
            clock.advance_ms(session.config.feedback_ms);
            session.update().unwrap();
        }
    }

    const TRAINING_RTS: [u64; 5] = [500, 510, 520, 530, 540];
    const TEST_RTS: [u64; 10] = [400, 420, 440, 460, 480, 500, 520, 540, 560, 580];

    #[test]
    fn full_correct_session_end_to_end() {
        let clock = VirtualClock::new();
        let sink = MemorySink::default();
        let writes = sink.writes.clone();
        let mut session = session_with(clock.clone(), full_stimuli(), sink);

        assert_eq!(session.phase, SessionPhase::Intro);
        session.handle_key(Key::Other).unwrap();
        assert_eq!(session.phase, SessionPhase::TrainingIntro);
        session.handle_key(Key::Space).unwrap();
        assert_eq!(session.phase, SessionPhase::Training);

        run_block_trials(&mut session, &clock, &TRAINING_RTS, |t| t.layout.correct);
        assert_eq!(session.phase, SessionPhase::TestIntro);
        session.handle_key(Key::Other).unwrap();

        run_block_trials(&mut session, &clock, &TEST_RTS, |t| t.layout.correct);
        assert_eq!(session.phase, SessionPhase::Summary);

        let summary = session.summary().unwrap();
        assert!((summary.percent_correct - 100.0).abs() < 1e-9);
        let expected_avg = TEST_RTS.iter().sum::<u64>() as f64 / TEST_RTS.len() as f64;
        assert!((summary.avg_rt_correct_ms - expected_avg).abs() < 1e-9);

        // only space leaves the summary
        session.handle_key(Key::Other).unwrap();
        assert_eq!(session.phase, SessionPhase::Summary);
        session.handle_key(Key::Space).unwrap();
        assert_eq!(session.phase, SessionPhase::Outro);

        // persisted exactly once, before the closing screen
        let persisted = writes.lock().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].len(), 15);
        drop(persisted);

        // closing dwell, then done
        session.handle_key(Key::Other).unwrap();
        assert_eq!(session.phase, SessionPhase::Outro);
        clock.advance_ms(session.config.outro_ms);
        session.update().unwrap();
        assert_eq!(session.phase, SessionPhase::Done);
    }

    #[test]
    fn results_are_tagged_per_block_in_order() {
        let clock = VirtualClock::new();
        let mut session = session_with(clock.clone(), full_stimuli(), MemorySink::default());
        session.handle_key(Key::Other).unwrap();
        session.handle_key(Key::Other).unwrap();
        run_block_trials(&mut session, &clock, &TRAINING_RTS, |t| t.layout.correct);
        session.handle_key(Key::Other).unwrap();
        run_block_trials(&mut session, &clock, &TEST_RTS, |t| t.layout.correct);

        let results = session.results();
        assert_eq!(results.len(), 15);
        let training: Vec<_> = results.iter().filter(|r| r.block == "training").collect();
        let test: Vec<_> = results.iter().filter(|r| r.block == "test").collect();
        assert_eq!(training.len(), 5);
        assert_eq!(test.len(), 10);
        for (i, row) in training.iter().enumerate() {
            assert_eq!(row.trial, i + 1);
            assert_eq!(row.rt_ms, Some(TRAINING_RTS[i]));
            assert_eq!(row.response, Some(Response::Correct));
        }
        for (i, row) in test.iter().enumerate() {
            assert_eq!(row.trial, i + 1);
            assert_eq!(row.rt_ms, Some(TEST_RTS[i]));
        }
    }

    #[test]
    fn clicks_outside_correct_bounds_are_incorrect() {
        let clock = VirtualClock::new();
        let mut session = session_with(clock.clone(), full_stimuli(), MemorySink::default());
        session.handle_key(Key::Other).unwrap();
        session.handle_key(Key::Other).unwrap();
        // click the foil for every training trial
        run_block_trials(&mut session, &clock, &TRAINING_RTS, |t| t.layout.wrong);
        // click blank background for every test trial
        run_block_trials_after_intro(&mut session, &clock);

        let summary = session.summary().unwrap();
        assert_eq!(summary.percent_correct, 0.0);
        assert_eq!(summary.avg_rt_correct_ms, 0.0);
        assert!(
            session
                .results()
                .iter()
                .all(|r| r.response == Some(Response::Incorrect))
        );
    }

    fn run_block_trials_after_intro(
        session: &mut SessionRunner<VirtualClock, StdRng, StimulusSizes, MemorySink>,
        clock: &VirtualClock,
    ) {
        assert_eq!(session.phase, SessionPhase::TestIntro);
        session.handle_key(Key::Other).unwrap();
        run_block_trials(session, clock, &TEST_RTS, |_| (1.0, 1.0));
        assert_eq!(session.phase, SessionPhase::Summary);
    }

    #[test]
    fn input_during_feedback_dwell_is_dropped() {
        let clock = VirtualClock::new();
        let mut session = session_with(clock.clone(), full_stimuli(), MemorySink::default());
        session.handle_key(Key::Other).unwrap();
        session.handle_key(Key::Other).unwrap();

        let pos = session.current_trial().unwrap().layout.correct;
        clock.advance_ms(300);
        session.handle_pointer(pos).unwrap();
        let outcome = session.current_trial().unwrap().outcome;
        assert_eq!(outcome, Some((300, Response::Correct)));

        // a second press mid-dwell changes nothing and emits no result
        clock.advance_ms(100);
        session.handle_pointer((1.0, 1.0)).unwrap();
        assert_eq!(session.current_trial().unwrap().outcome, outcome);
        assert!(session.results().is_empty());

        // keys are ignored during trials too
        session.handle_key(Key::Space).unwrap();
        assert_eq!(session.phase, SessionPhase::Training);

        clock.advance_ms(session.config.feedback_ms);
        session.update().unwrap();
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.current_trial().unwrap().index, 2);
    }

    #[test]
    fn feedback_dwell_waits_full_duration() {
        let clock = VirtualClock::new();
        let mut session = session_with(clock.clone(), full_stimuli(), MemorySink::default());
        session.handle_key(Key::Other).unwrap();
        session.handle_key(Key::Other).unwrap();

        let pos = session.current_trial().unwrap().layout.correct;
        session.handle_pointer(pos).unwrap();
        clock.advance_ms(session.config.feedback_ms - 1);
        session.update().unwrap();
        assert!(session.results().is_empty());
        clock.advance_ms(1);
        session.update().unwrap();
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn scene_projection_follows_phase() {
        let clock = VirtualClock::new();
        let mut session = session_with(clock.clone(), full_stimuli(), MemorySink::default());
        assert_eq!(
            session.scene(),
            Scene::screen(
                "instructions",
                &["Instructions:", "Press any key to start training."]
            )
        );

        session.handle_key(Key::Other).unwrap();
        session.handle_key(Key::Other).unwrap();
        let Scene::Trial(trial) = session.scene() else {
            panic!("expected trial scene");
        };
        assert_eq!(trial.target, "target1");
        assert_eq!(trial.correct, "correct1");
        assert_eq!(trial.wrong, "wrong1");
        assert_eq!(trial.overlay, "instruction2");

        let pos = session.current_trial().unwrap().layout.correct;
        session.handle_pointer(pos).unwrap();
        let Scene::Feedback { image, pos } = session.scene() else {
            panic!("expected feedback scene");
        };
        assert_eq!(image, "correct");
        assert_eq!(pos, (400.0, 500.0));
    }

    #[test]
    fn outro_without_image_waits_for_any_key() {
        let clock = VirtualClock::new();
        // stimulus table without the closing image
        let mut stimuli = StimulusSizes::new();
        for name in mentrot_core::stimulus::all_names() {
            if name != "thatwasit" {
                stimuli.insert(name, (100, 100));
            }
        }

        let mut session = session_with(clock.clone(), stimuli, MemorySink::default());
        session.handle_key(Key::Other).unwrap();
        session.handle_key(Key::Other).unwrap();
        run_block_trials(&mut session, &clock, &TRAINING_RTS, |t| t.layout.correct);
        session.handle_key(Key::Other).unwrap();
        run_block_trials(&mut session, &clock, &TEST_RTS, |t| t.layout.correct);
        session.handle_key(Key::Space).unwrap();
        assert_eq!(session.phase, SessionPhase::Outro);

        // no timed dwell: update never finishes the session on its own
        clock.advance_ms(60_000);
        session.update().unwrap();
        assert_eq!(session.phase, SessionPhase::Outro);
        session.handle_key(Key::Other).unwrap();
        assert_eq!(session.phase, SessionPhase::Done);
    }

    #[test]
    fn sink_failure_is_reported_not_fatal() {
        let clock = VirtualClock::new();
        let mut session = session_with(clock.clone(), full_stimuli(), FailingSink);
        session.handle_key(Key::Other).unwrap();
        session.handle_key(Key::Other).unwrap();
        run_block_trials(&mut session, &clock, &TRAINING_RTS, |t| t.layout.correct);
        session.handle_key(Key::Other).unwrap();
        run_block_trials(&mut session, &clock, &TEST_RTS, |t| t.layout.correct);
        session.handle_key(Key::Space).unwrap();
        assert_eq!(session.phase, SessionPhase::Outro);
    }

    #[test]
    fn scripted_session_writes_csv_file() {
        let dir =
            std::env::temp_dir().join(format!("mentrot-session-{}-e2e", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let clock = VirtualClock::new();
        let mut session = session_with(clock.clone(), full_stimuli(), CsvResultSink::new(&dir));
        session.handle_key(Key::Other).unwrap();
        session.handle_key(Key::Other).unwrap();
        run_block_trials(&mut session, &clock, &TRAINING_RTS, |t| t.layout.correct);
        session.handle_key(Key::Other).unwrap();
        run_block_trials(&mut session, &clock, &TEST_RTS, |t| t.layout.correct);
        session.handle_key(Key::Space).unwrap();
        clock.advance_ms(session.config.outro_ms);
        session.update().unwrap();
        assert!(session.phase.is_done());

        let content = std::fs::read_to_string(dir.join("results1.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("training,1,"));
        assert!(lines[6].starts_with("test,1,"));
        assert!(lines[15].starts_with("test,10,"));
        assert!(lines[1..].iter().all(|l| l.ends_with(",correct")));
    }
}
