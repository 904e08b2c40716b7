//! Activity timer
//!
//! A per-profile stopwatch for the currently tracked activity. Elapsed
//! time is derived from wall-clock deltas between resume instants and
//! "now", so a sleeping machine or a stalled UI tick cannot lose time.
//!
//! Every transition that finishes a tracking segment (pause, reset,
//! remove, retargeting the activity, switching profiles, unload) yields
//! at most one [`DurationLogInput`] for the caller to persist, via the
//! repository's fire-and-forget `queue_duration_log`. A segment is only
//! worth flushing when it has positive elapsed time and a non-empty
//! activity title.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::DurationLogInput;

/// Timer phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Stopwatch for one profile's current activity
#[derive(Debug)]
pub struct ActivityTimer {
    profile_id: Uuid,
    state: TimerState,
    /// Instant the current run segment began, when running
    resumed_at: Option<DateTime<Utc>>,
    activity_title: String,
    /// Daily this activity counts toward, if any
    task_id: Option<Uuid>,
    reward_id: Option<Uuid>,
    /// One auto-complete trigger per start
    autocomplete_fired: bool,
    /// One unload flush per timer
    unload_flushed: bool,
}

impl ActivityTimer {
    pub fn new(profile_id: Uuid) -> Self {
        Self {
            profile_id,
            state: TimerState::Idle,
            resumed_at: None,
            activity_title: String::new(),
            task_id: None,
            reward_id: None,
            autocomplete_fired: false,
            unload_flushed: false,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn profile_id(&self) -> Uuid {
        self.profile_id
    }

    pub fn activity_title(&self) -> &str {
        &self.activity_title
    }

    /// Seconds on the clock for the in-flight run segment.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        match (self.state, self.resumed_at) {
            (TimerState::Running, Some(resumed_at)) => (now - resumed_at).num_seconds().max(0),
            _ => 0,
        }
    }

    /// Name the tracked activity and optional linked task/reward.
    ///
    /// Retargeting while time is on the clock finishes the old activity's
    /// segment first; the returned entry belongs to the old title.
    pub fn set_activity(
        &mut self,
        title: &str,
        task_id: Option<Uuid>,
        reward_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Option<DurationLogInput> {
        let retargeted = title != self.activity_title
            || task_id != self.task_id
            || reward_id != self.reward_id;
        let flush = if retargeted && self.elapsed_secs(now) > 0 {
            let was_running = self.state == TimerState::Running;
            let flush = self.take_segment(now);
            if was_running {
                self.resume(now);
            }
            flush
        } else {
            None
        };

        self.activity_title = title.trim().to_string();
        self.task_id = task_id;
        self.reward_id = reward_id;
        flush
    }

    /// Start, or resume from pause. No-op while already running.
    pub fn start(&mut self, now: DateTime<Utc>) {
        match self.state {
            TimerState::Running => {}
            TimerState::Idle => {
                self.autocomplete_fired = false;
                self.resume(now);
            }
            TimerState::Paused => self.resume(now),
        }
    }

    fn resume(&mut self, now: DateTime<Utc>) {
        self.state = TimerState::Running;
        self.resumed_at = Some(now);
    }

    /// Stop the clock and finish the current segment.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<DurationLogInput> {
        if self.state != TimerState::Running {
            return None;
        }
        let flush = self.take_segment(now);
        self.state = TimerState::Paused;
        flush
    }

    /// Zero the timer, flushing whatever was on the clock.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Option<DurationLogInput> {
        let flush = self.take_segment(now);
        self.state = TimerState::Idle;
        self.autocomplete_fired = false;
        flush
    }

    /// Tear the timer down entirely; also clears the tracked activity.
    pub fn remove(&mut self, now: DateTime<Utc>) -> Option<DurationLogInput> {
        let flush = self.reset(now);
        self.activity_title.clear();
        self.task_id = None;
        self.reward_id = None;
        flush
    }

    /// Move the timer to another profile. Tracked time belongs to the
    /// outgoing profile, so it is flushed before the switch.
    pub fn switch_profile(
        &mut self,
        new_profile_id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<DurationLogInput> {
        if new_profile_id == self.profile_id {
            return None;
        }
        let flush = self.remove(now);
        self.profile_id = new_profile_id;
        self.unload_flushed = false;
        flush
    }

    /// Final flush on teardown. Fires at most once; later calls return
    /// None even if the timer keeps running.
    pub fn unload_flush(&mut self, now: DateTime<Utc>) -> Option<DurationLogInput> {
        if self.unload_flushed {
            return None;
        }
        self.unload_flushed = true;
        self.pause(now)
    }

    /// Whether the linked daily should be auto-completed now. Fires at
    /// most once per start, when the threshold is crossed.
    pub fn autocomplete_due(&mut self, threshold_secs: i64, now: DateTime<Utc>) -> bool {
        if self.autocomplete_fired || self.state != TimerState::Running {
            return false;
        }
        if threshold_secs <= 0 || self.elapsed_secs(now) < threshold_secs {
            return false;
        }
        self.autocomplete_fired = true;
        true
    }

    /// Finish the in-flight run segment and convert it into a log input.
    /// Untitled or zero-length segments are dropped silently, but the
    /// clock is zeroed either way.
    fn take_segment(&mut self, now: DateTime<Utc>) -> Option<DurationLogInput> {
        let elapsed = self.elapsed_secs(now);
        self.resumed_at = None;

        if elapsed <= 0 || self.activity_title.is_empty() {
            return None;
        }
        Some(DurationLogInput {
            profile_id: self.profile_id,
            title: self.activity_title.clone(),
            duration_secs: elapsed,
            timestamp: now,
            task_id: self.task_id,
            reward_id: self.reward_id,
        })
    }
}
