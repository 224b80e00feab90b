//! Playback session: the timed state machine that walks a speech timeline.
//!
//! # Contracts
//! - At most one advance timer is pending; scheduling a new one cancels the
//!   previous handle, and a fired timer whose handle is no longer current is
//!   ignored.
//! - A paused session does not move its clock, so the pending dwell resumes
//!   where it left off.
//! - Reaching a unit whose next action is `Stop` schedules one final
//!   [`FINAL_DELAY`] and then stops; the session never re-enters playing on
//!   its own afterwards.
//! - Reported conditions never panic: they are logged, kept in
//!   [`Session::last_report`], and returned to the caller.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::config::{DwellFallback, SubtitleConfig};
use crate::error::{SubtitleError, SubtitleResult};
use crate::names::NameStyleRegistry;
use crate::present::{present, PresentContext, Stage};
use crate::schedule::{Scheduler, TimerAction, TimerHandle};
use crate::script::{AudioClip, NextAction, ScriptSource, SpeechUnit, Timeline};

/// Delay between the last unit's dwell ending and the session stopping.
pub const FINAL_DELAY: Duration = Duration::from_secs(1);

/// Observable playback state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing(usize),
    Paused(usize),
    Stopped,
}

/// Current position and pause flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub index: usize,
    pub paused: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Active,
    Stopped,
}

/// One dialogue playback session and everything it presents through.
pub struct Session {
    config: SubtitleConfig,
    source: Option<ScriptSource>,
    timeline: Timeline,
    names: NameStyleRegistry,
    stage: Stage,
    scheduler: Scheduler,
    phase: Phase,
    cursor: Cursor,
    pending: Option<TimerHandle>,
    last_report: Option<SubtitleError>,
}

impl Session {
    pub fn new(config: SubtitleConfig, stage: Stage) -> Self {
        let names = config.name_registry();
        Self {
            config,
            source: None,
            timeline: Timeline::default(),
            names,
            stage,
            scheduler: Scheduler::new(),
            phase: Phase::Idle,
            cursor: Cursor::default(),
            pending: None,
            last_report: None,
        }
    }

    pub fn with_source(mut self, source: ScriptSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn set_source(&mut self, source: ScriptSource) {
        self.source = Some(source);
    }

    /// Reads a script file as the session source. A failed read clears the
    /// current timeline.
    pub fn load_source(&mut self, path: &Path) -> SubtitleResult<()> {
        match ScriptSource::from_path(path) {
            Ok(source) => {
                self.source = Some(source);
                Ok(())
            }
            Err(err) => {
                self.clear_script();
                self.source = None;
                self.report(err)
            }
        }
    }

    /// Compiles the source (when the timeline is empty) and schedules
    /// autoplay if configured.
    pub fn activate(&mut self) -> SubtitleResult<()> {
        if self.timeline.is_empty() && self.source.is_some() {
            self.compile_script()?;
        }
        if !self.config.playback.play_on_awake {
            return Ok(());
        }
        let seconds = self.config.playback.delay_to_play;
        let delay = match seconds_to_duration(seconds, "delay to play") {
            Ok(delay) => delay,
            Err(err) => return self.report(err),
        };
        info!(?delay, "autoplay scheduled");
        self.schedule(delay, TimerAction::Start);
        Ok(())
    }

    /// Replaces the timeline with a fresh compilation of the source.
    ///
    /// The previous timeline is cleared first, so a failure leaves nothing
    /// half applied.
    #[instrument(skip(self))]
    pub fn compile_script(&mut self) -> SubtitleResult<usize> {
        self.clear_script();
        let Some(source) = &self.source else {
            return self
                .report(SubtitleError::SourceUnreadable {
                    name: "<unassigned>".to_string(),
                    reason: "no script source assigned".to_string(),
                })
                .map(|()| 0);
        };
        self.timeline = source.compile(&self.config, &mut self.names);
        Ok(self.timeline.len())
    }

    /// Empties the timeline and resets the list name. Playback returns to
    /// idle; a unit still on screen is hidden and its audio stopped.
    pub fn clear_script(&mut self) {
        self.cancel_pending();
        if self.phase == Phase::Active {
            self.stage.audio.stop();
            self.stage.surface.set_visible(false);
        }
        self.timeline.clear();
        self.phase = Phase::Idle;
        self.cursor = Cursor::default();
    }

    /// Presents the first unit and schedules the next one.
    ///
    /// Resumes instead when paused. Compiles the source first when nothing
    /// has been compiled yet.
    pub fn start(&mut self) -> SubtitleResult<()> {
        if self.cursor.paused {
            self.resume();
            return Ok(());
        }
        if self.timeline.is_empty() && self.source.is_some() {
            self.compile_script()?;
        }
        if self.timeline.is_empty() {
            return self.report(SubtitleError::EmptySequence);
        }
        info!(list = %self.timeline.list_name, units = self.timeline.len(), "playback started");
        self.cancel_pending();
        self.enter(0)
    }

    /// Advances past the current unit, as if its dwell had just elapsed.
    ///
    /// While paused this only resumes; while idle it starts. A stopped
    /// session stays stopped until [`Session::start`] or [`Session::jump`].
    pub fn next(&mut self) -> SubtitleResult<()> {
        match self.phase {
            _ if self.cursor.paused => {
                self.resume();
                Ok(())
            }
            Phase::Idle => self.start(),
            Phase::Stopped => {
                debug!("next ignored while stopped");
                Ok(())
            }
            Phase::Active => {
                self.cancel_pending();
                self.advance_from(self.cursor.index)
            }
        }
    }

    /// Jumps to the 1-based unit `n`, leaving the cursor on 0-based `n - 1`.
    ///
    /// Behaves as if the dwell of the preceding unit (1-based `n - 1`,
    /// 0-based `n - 2`) had just elapsed, so a `Stop` on that unit ends
    /// playback instead of moving on.
    #[instrument(skip(self))]
    pub fn jump(&mut self, n: usize) -> SubtitleResult<()> {
        if n == 0 || n > self.timeline.len() {
            return self.report(SubtitleError::SequenceExhausted {
                index: n.saturating_sub(1),
            });
        }
        self.cancel_pending();
        if self.cursor.paused {
            self.cursor.paused = false;
            self.stage.audio.stop();
        }
        if n == 1 {
            return self.enter(0);
        }
        self.advance_from(n - 2)
    }

    /// Freezes playback at the current unit.
    pub fn pause(&mut self) {
        if self.phase != Phase::Active || self.cursor.paused {
            return;
        }
        self.cursor.paused = true;
        self.stage.audio.pause();
        info!(index = self.cursor.index, "playback paused");
    }

    /// Continues a paused session at the same unit.
    pub fn resume(&mut self) {
        if !self.cursor.paused {
            return;
        }
        self.cursor.paused = false;
        self.stage.surface.set_visible(true);
        self.stage.audio.resume();
        info!(index = self.cursor.index, "playback resumed");
    }

    /// Stops playback immediately. Calling it again has no further effect.
    pub fn stop(&mut self) {
        self.cancel_pending();
        self.cursor.paused = false;
        if self.phase == Phase::Stopped {
            return;
        }
        self.phase = Phase::Stopped;
        self.stage.audio.stop();
        self.stage.surface.set_visible(false);
        info!(index = self.cursor.index, "playback stopped");
    }

    /// Moves the session clock forward by `dt` and fires every timer that
    /// falls due. Returns the first condition reported while doing so.
    pub fn update(&mut self, dt: Duration) -> SubtitleResult<()> {
        if self.cursor.paused {
            return Ok(());
        }
        let target = self.scheduler.now().saturating_add(dt);
        let mut outcome = Ok(());
        while let Some(fired) = self.scheduler.pop_due(target) {
            if self.pending != Some(fired.handle) {
                debug!(action = ?fired.action, "ignoring stale timer");
                continue;
            }
            self.pending = None;
            let result = match fired.action {
                TimerAction::Start => self.start(),
                TimerAction::Advance => self.advance_from(self.cursor.index),
                TimerAction::Finish => {
                    self.stop();
                    Ok(())
                }
            };
            if outcome.is_ok() {
                outcome = result;
            }
        }
        self.scheduler.advance_to(target);
        outcome
    }

    /// Attaches a clip to the 1-based script line.
    pub fn attach_audio(&mut self, line: usize, clip: AudioClip) -> SubtitleResult<()> {
        match self.timeline.attach_audio(line, clip) {
            Ok(()) => Ok(()),
            Err(err) => self.report(err),
        }
    }

    /// Fills unit durations from each line's clip length.
    pub fn estimate_durations(&mut self) -> usize {
        self.timeline.estimate_durations()
    }

    pub fn state(&self) -> PlaybackState {
        match self.phase {
            Phase::Idle => PlaybackState::Idle,
            Phase::Stopped => PlaybackState::Stopped,
            Phase::Active if self.cursor.paused => PlaybackState::Paused(self.cursor.index),
            Phase::Active => PlaybackState::Playing(self.cursor.index),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn unit_mut(&mut self, index: usize) -> Option<&mut SpeechUnit> {
        self.timeline.get_mut(index)
    }

    pub fn names(&self) -> &NameStyleRegistry {
        &self.names
    }

    pub fn names_mut(&mut self) -> &mut NameStyleRegistry {
        &mut self.names
    }

    pub fn config(&self) -> &SubtitleConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&ScriptSource> {
        self.source.as_ref()
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Time left on the pending timer, if any.
    pub fn pending_delay(&self) -> Option<Duration> {
        self.pending
            .and_then(|handle| self.scheduler.remaining(handle))
    }

    pub fn last_report(&self) -> Option<&SubtitleError> {
        self.last_report.as_ref()
    }

    pub fn take_report(&mut self) -> Option<SubtitleError> {
        self.last_report.take()
    }

    fn advance_from(&mut self, index: usize) -> SubtitleResult<()> {
        let Some(unit) = self.timeline.get(index) else {
            return self.report(SubtitleError::SequenceExhausted { index });
        };
        if unit.next_action == NextAction::Stop {
            debug!(index, "final unit reached");
            self.cursor.index = index;
            self.schedule(FINAL_DELAY, TimerAction::Finish);
            return Ok(());
        }
        unit.on_end.emit(unit);
        let next = index + 1;
        if next >= self.timeline.len() {
            return self.report(SubtitleError::SequenceExhausted { index: next });
        }
        self.enter(next)
    }

    /// Presents `index` and schedules the advance after its dwell time.
    fn enter(&mut self, index: usize) -> SubtitleResult<()> {
        self.phase = Phase::Active;
        self.cursor.index = index;
        self.present_unit(index);
        let Some(unit) = self.timeline.get(index) else {
            return self.report(SubtitleError::SequenceExhausted { index });
        };
        let dwell = match (unit.dwell(), self.config.playback.dwell_fallback) {
            (Some(dwell), _) => dwell,
            (None, DwellFallback::Fixed(seconds)) => {
                match seconds_to_duration(seconds, "fixed dwell") {
                    Ok(dwell) => dwell,
                    Err(err) => return self.report(err),
                }
            }
            (None, DwellFallback::Halt) => {
                return self.report(SubtitleError::MissingDwellInput { index });
            }
        };
        self.schedule(dwell, TimerAction::Advance);
        Ok(())
    }

    fn present_unit(&mut self, index: usize) {
        let Some(unit) = self.timeline.units.get(index) else {
            return;
        };
        debug!(index, speaker = %unit.speaker_name, "presenting unit");
        unit.on_start.emit(unit);
        self.stage.surface.set_visible(true);
        let ctx = PresentContext {
            features: self.config.features,
            config: &self.config.presentation,
            split_character: self.config.script.split_character,
            names: &self.names,
        };
        present(&mut self.stage, &ctx, unit);
    }

    fn schedule(&mut self, delay: Duration, action: TimerAction) {
        self.cancel_pending();
        self.pending = Some(self.scheduler.schedule_once(delay, action));
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn report(&mut self, err: SubtitleError) -> SubtitleResult<()> {
        match &err {
            SubtitleError::SequenceExhausted { .. } | SubtitleError::EmptySequence => {
                warn!(%err, "playback halted");
            }
            _ => error!(%err, "playback error"),
        }
        self.last_report = Some(err.clone());
        Err(err)
    }
}

/// Converts configured seconds, rejecting negative and non-finite values.
fn seconds_to_duration(seconds: f32, label: &str) -> SubtitleResult<Duration> {
    Duration::try_from_secs_f32(seconds).map_err(|_| {
        SubtitleError::InvalidConfig(format!("{label} must be non-negative, got {seconds}"))
    })
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
