//! Core domain types for goldleaf
//!
//! These types form the canonical data model shared by both storage
//! backends. The same structs are what the local SQLite store persists and
//! what the remote API serializes over the wire.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Profile** | An isolated workspace owning tasks, logs, and a gold balance |
//! | **Task** | A unit of work; one of habit / daily / todo / reward |
//! | **Cadence** | Recurrence unit (day/week/month/year) plus an "every N" multiplier |
//! | **Period** | One cadence-aligned block anchored to the task's creation date |
//! | **Streak** | Count of consecutive periods completed without a gap |
//! | **Gold** | The virtual currency balance mutated by task actions |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================
// Fixed-point amounts (gold, counts, percents)
// ============================================

/// A fixed-point decimal with two fractional digits, stored as whole cents.
///
/// Used for gold balances and deltas, habit counters, and streak bonus
/// percentages. Parsing and rendering always use the canonical `-12.50`
/// string form; arithmetic never leaves cent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Parse a decimal string like `"12.5"`, `"-3.00"`, or `"7"`.
    pub fn parse(field: &str, value: &str) -> Result<Self> {
        let s = value.trim();
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(Error::validation(field, format!("not a number: {value:?}")));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
            || frac.len() > 2
        {
            return Err(Error::validation(field, format!("not a number: {value:?}")));
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| Error::validation(field, format!("out of range: {value:?}")))?
        };
        let frac_cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap() * 10,
            _ => frac.parse::<i64>().unwrap(),
        };
        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .and_then(|c| c.checked_mul(sign))
            .map(Amount)
            .ok_or_else(|| Error::validation(field, format!("out of range: {value:?}")))
    }

    /// Apply a percentage bonus: `self * (1 + percent/100)`.
    ///
    /// Rounds half away from zero back to cent precision.
    pub fn with_bonus_percent(self, percent: Amount) -> Amount {
        let numerator = self.0 as i128 * (10_000 + percent.0 as i128);
        let denominator = 10_000i128;
        let half = denominator / 2;
        let rounded = if numerator >= 0 {
            (numerator + half) / denominator
        } else {
            (numerator - half) / denominator
        };
        Amount(rounded as i64)
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl std::ops::Neg for Amount {
    type Output = Amount;
    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::parse("amount", &s).map_err(serde::de::Error::custom)
    }
}

// ============================================
// Durations
// ============================================

/// Parse a duration string into whole seconds.
///
/// Accepts `HH:MM:SS`, `H:MM:SS`, and the day-prefixed `D HH:MM:SS` form
/// used for autocomplete thresholds.
pub fn parse_duration_secs(field: &str, value: &str) -> Result<i64> {
    let s = value.trim();
    let (days, clock) = match s.split_once(' ') {
        Some((d, rest)) => {
            let days: i64 = d
                .parse()
                .map_err(|_| Error::validation(field, format!("malformed duration: {value:?}")))?;
            (days, rest.trim())
        }
        None => (0, s),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 {
        return Err(Error::validation(field, format!("malformed duration: {value:?}")));
    }
    let mut nums = [0i64; 3];
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::validation(field, format!("malformed duration: {value:?}")));
        }
        nums[i] = part
            .parse()
            .map_err(|_| Error::validation(field, format!("malformed duration: {value:?}")))?;
    }
    if nums[1] >= 60 || nums[2] >= 60 {
        return Err(Error::validation(field, format!("malformed duration: {value:?}")));
    }
    Ok(days * 86_400 + nums[0] * 3_600 + nums[1] * 60 + nums[2])
}

/// Format whole seconds as `H:MM:SS` (hours unpadded, unbounded).
pub fn format_duration_secs(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}:{:02}:{:02}", secs / 3_600, (secs % 3_600) / 60, secs % 60)
}

// ============================================
// Enumerations
// ============================================

/// Fixed task variants. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Habit,
    Daily,
    Todo,
    Reward,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Habit => "habit",
            TaskType::Daily => "daily",
            TaskType::Todo => "todo",
            TaskType::Reward => "reward",
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "habit" => Ok(TaskType::Habit),
            "daily" => Ok(TaskType::Daily),
            "todo" => Ok(TaskType::Todo),
            "reward" => Ok(TaskType::Reward),
            _ => Err(format!("unknown task type: {s}")),
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence unit for daily scheduling.
///
/// Dailies never use "never"; that value only exists for habit counter
/// resets (see [`Cadence`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatCadence {
    Day,
    Week,
    Month,
    Year,
}

impl RepeatCadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatCadence::Day => "day",
            RepeatCadence::Week => "week",
            RepeatCadence::Month => "month",
            RepeatCadence::Year => "year",
        }
    }
}

impl std::str::FromStr for RepeatCadence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "day" => Ok(RepeatCadence::Day),
            "week" => Ok(RepeatCadence::Week),
            "month" => Ok(RepeatCadence::Month),
            "year" => Ok(RepeatCadence::Year),
            _ => Err(format!("unknown cadence: {s}")),
        }
    }
}

/// Habit counter reset cadence. `Never` means the counter never resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Never,
    Day,
    Week,
    Month,
    Year,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Never => "never",
            Cadence::Day => "day",
            Cadence::Week => "week",
            Cadence::Month => "month",
            Cadence::Year => "year",
        }
    }
}

impl std::str::FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "never" => Ok(Cadence::Never),
            "day" => Ok(Cadence::Day),
            "week" => Ok(Cadence::Week),
            "month" => Ok(Cadence::Month),
            "year" => Ok(Cadence::Year),
            _ => Err(format!("unknown cadence: {s}")),
        }
    }
}

/// Audit log entry types, one per balance-mutating action plus timer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    HabitIncremented,
    DailyCompleted,
    TodoCompleted,
    RewardClaimed,
    ActivityDuration,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::HabitIncremented => "habit_incremented",
            LogType::DailyCompleted => "daily_completed",
            LogType::TodoCompleted => "todo_completed",
            LogType::RewardClaimed => "reward_claimed",
            LogType::ActivityDuration => "activity_duration",
        }
    }
}

impl std::str::FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "habit_incremented" => Ok(LogType::HabitIncremented),
            "daily_completed" => Ok(LogType::DailyCompleted),
            "todo_completed" => Ok(LogType::TodoCompleted),
            "reward_claimed" => Ok(LogType::RewardClaimed),
            "activity_duration" => Ok(LogType::ActivityDuration),
            _ => Err(format!("unknown log type: {s}")),
        }
    }
}

// ============================================
// Profile
// ============================================

/// A tenant workspace. Owns tasks, logs, and the cached gold balance.
///
/// Invariant: `gold_balance` always equals the `user_gold` snapshot on the
/// most recently created log entry for this profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub gold_balance: Amount,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("name", "profile name must not be empty"));
        }
        Ok(Profile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            gold_balance: Amount::ZERO,
            created_at: Utc::now(),
        })
    }
}

// ============================================
// Task
// ============================================

/// A unit of work. One struct holds the union of all variant fields; the
/// `task_type` tag decides which subset is meaningful, mirroring the
/// single-table storage layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub task_type: TaskType,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    /// Positive to earn, negative to spend (rewards).
    pub gold_delta: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_action_at: Option<DateTime<Utc>>,
    pub total_actions_count: i64,

    // Habit fields
    pub current_count: Amount,
    pub count_increment: Amount,
    pub count_reset_cadence: Option<Cadence>,

    // Daily fields
    pub repeat_cadence: Option<RepeatCadence>,
    pub repeat_every: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub streak_goal: u32,
    /// Period start date of the last period this daily was completed in.
    pub last_completion_period: Option<NaiveDate>,
    /// Elapsed-time threshold (whole seconds) for timer auto-completion.
    pub autocomplete_time_threshold: Option<i64>,

    // Todo fields
    pub due_at: Option<DateTime<Utc>>,
    pub is_done: bool,
    pub completed_at: Option<DateTime<Utc>>,

    // Reward fields
    pub is_repeatable: bool,
    pub is_claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claim_count: u32,
}

/// Input for creating a task. Variant-specific fields default to the
/// stored-column defaults of the single-table layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub profile_id: Uuid,
    pub task_type: TaskType,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    #[serde(default)]
    pub gold_delta: Amount,

    #[serde(default)]
    pub count_increment: Option<Amount>,
    #[serde(default)]
    pub count_reset_cadence: Option<Cadence>,

    #[serde(default)]
    pub repeat_cadence: Option<RepeatCadence>,
    #[serde(default)]
    pub repeat_every: Option<u32>,
    #[serde(default)]
    pub streak_goal: Option<u32>,
    #[serde(default)]
    pub autocomplete_time_threshold: Option<String>,

    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_repeatable: Option<bool>,
}

/// Partial update for a task. `task_type` is deliberately absent: the
/// variant is immutable after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub gold_delta: Option<Amount>,
    #[serde(default)]
    pub count_increment: Option<Amount>,
    #[serde(default)]
    pub count_reset_cadence: Option<Cadence>,
    #[serde(default)]
    pub repeat_cadence: Option<RepeatCadence>,
    #[serde(default)]
    pub repeat_every: Option<u32>,
    #[serde(default)]
    pub streak_goal: Option<u32>,
    #[serde(default)]
    pub autocomplete_time_threshold: Option<String>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_repeatable: Option<bool>,
}

impl Task {
    /// Build and validate a task from creation input.
    pub fn from_input(input: TaskInput, now: DateTime<Utc>) -> Result<Task> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::validation("title", "title must not be empty"));
        }

        let mut task = Task {
            id: Uuid::new_v4(),
            profile_id: input.profile_id,
            task_type: input.task_type,
            title,
            notes: input.notes,
            is_hidden: input.is_hidden,
            tag_ids: input.tag_ids,
            gold_delta: input.gold_delta,
            created_at: now,
            updated_at: now,
            last_action_at: None,
            total_actions_count: 0,
            current_count: Amount::ZERO,
            count_increment: Amount::from_cents(100),
            count_reset_cadence: None,
            repeat_cadence: None,
            repeat_every: 1,
            current_streak: 0,
            best_streak: 0,
            streak_goal: 0,
            last_completion_period: None,
            autocomplete_time_threshold: None,
            due_at: None,
            is_done: false,
            completed_at: None,
            is_repeatable: false,
            is_claimed: false,
            claimed_at: None,
            claim_count: 0,
        };

        match input.task_type {
            TaskType::Habit => {
                if let Some(inc) = input.count_increment {
                    if inc <= Amount::ZERO {
                        return Err(Error::validation(
                            "count_increment",
                            "count increment must be positive",
                        ));
                    }
                    task.count_increment = inc;
                }
                task.count_reset_cadence = input.count_reset_cadence;
            }
            TaskType::Daily => {
                task.repeat_cadence = Some(input.repeat_cadence.ok_or_else(|| {
                    Error::validation("repeat_cadence", "daily tasks require a repeat cadence")
                })?);
                task.repeat_every = input.repeat_every.unwrap_or(1).max(1);
                task.streak_goal = input.streak_goal.unwrap_or(0);
                if let Some(threshold) = &input.autocomplete_time_threshold {
                    task.autocomplete_time_threshold = Some(parse_duration_secs(
                        "autocomplete_time_threshold",
                        threshold,
                    )?);
                }
            }
            TaskType::Todo => {
                task.due_at = input.due_at;
            }
            TaskType::Reward => {
                if !input.gold_delta.is_negative() {
                    return Err(Error::validation("gold_delta", "reward cost must be negative"));
                }
                task.is_repeatable = input.is_repeatable.unwrap_or(false);
            }
        }

        Ok(task)
    }

    /// Apply a partial update. The task type never changes.
    pub fn apply_patch(&mut self, patch: TaskPatch, now: DateTime<Utc>) -> Result<()> {
        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(Error::validation("title", "title must not be empty"));
            }
            self.title = title;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(hidden) = patch.is_hidden {
            self.is_hidden = hidden;
        }
        if let Some(tags) = patch.tag_ids {
            self.tag_ids = tags;
        }
        if let Some(gold) = patch.gold_delta {
            if self.task_type == TaskType::Reward && !gold.is_negative() {
                return Err(Error::validation("gold_delta", "reward cost must be negative"));
            }
            self.gold_delta = gold;
        }
        if let Some(inc) = patch.count_increment {
            if inc <= Amount::ZERO {
                return Err(Error::validation(
                    "count_increment",
                    "count increment must be positive",
                ));
            }
            self.count_increment = inc;
        }
        if patch.count_reset_cadence.is_some() {
            self.count_reset_cadence = patch.count_reset_cadence;
        }
        if let Some(cadence) = patch.repeat_cadence {
            self.repeat_cadence = Some(cadence);
        }
        if let Some(every) = patch.repeat_every {
            self.repeat_every = every.max(1);
        }
        if let Some(goal) = patch.streak_goal {
            self.streak_goal = goal;
        }
        if let Some(threshold) = &patch.autocomplete_time_threshold {
            self.autocomplete_time_threshold = Some(parse_duration_secs(
                "autocomplete_time_threshold",
                threshold,
            )?);
        }
        if patch.due_at.is_some() {
            self.due_at = patch.due_at;
        }
        if let Some(repeatable) = patch.is_repeatable {
            self.is_repeatable = repeatable;
        }
        self.updated_at = now;
        Ok(())
    }
}

// ============================================
// Log entries
// ============================================

/// Immutable audit record. Append-only; never mutated or deleted except
/// via cascading profile/task deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub profile_id: Uuid,
    /// When the real-world action occurred. May precede `created_at` for
    /// queued/flushed entries.
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub log_type: LogType,
    pub task_id: Option<Uuid>,
    /// Set only for `reward_claimed` entries.
    pub reward_id: Option<Uuid>,
    pub gold_delta: Amount,
    /// Balance snapshot after this entry was applied.
    pub user_gold: Amount,
    pub count_delta: Option<Amount>,
    pub duration_secs: Option<i64>,
    /// Task title frozen at action time; survives rename and deletion.
    pub title_snapshot: String,
}

/// Query filters for the log stream. Results are newest-first.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Clamped to `[1, 500]`.
    pub limit: Option<usize>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub log_type: Option<LogType>,
    pub task_id: Option<Uuid>,
}

/// Input for an `activity_duration` log entry from the timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationLogInput {
    pub profile_id: Uuid,
    pub title: String,
    pub duration_secs: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    #[serde(default)]
    pub reward_id: Option<Uuid>,
}

// ============================================
// Streak bonus rules
// ============================================

/// Bonus rule attached to a daily: once `current_streak >= streak_goal`,
/// completion gold is multiplied by `1 + bonus_percent/100`. Among all
/// qualifying rules the highest percentage wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakBonusRule {
    pub id: Uuid,
    pub task_id: Uuid,
    pub streak_goal: u32,
    pub bonus_percent: Amount,
    pub created_at: DateTime<Utc>,
}

impl StreakBonusRule {
    pub fn new(task_id: Uuid, streak_goal: u32, bonus_percent: Amount) -> Result<Self> {
        if streak_goal < 1 {
            return Err(Error::validation("streak_goal", "streak goal must be at least 1"));
        }
        Ok(StreakBonusRule {
            id: Uuid::new_v4(),
            task_id,
            streak_goal,
            bonus_percent,
            created_at: Utc::now(),
        })
    }
}

// ============================================
// New-day rollover payloads
// ============================================

/// One daily eligible for rollover acknowledgment, with the streak
/// context the user reviews before committing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDayPreviewItem {
    pub id: Uuid,
    pub title: String,
    pub previous_period_start: NaiveDate,
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_completion_period: Option<NaiveDate>,
}

/// Result of a new-day preview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDayPreview {
    pub dailies: Vec<NewDayPreviewItem>,
}

/// Result of a new-day start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDayOutcome {
    pub updated_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parse_and_display() {
        assert_eq!(Amount::parse("x", "12.50").unwrap().cents(), 1250);
        assert_eq!(Amount::parse("x", "-3.05").unwrap().cents(), -305);
        assert_eq!(Amount::parse("x", "7").unwrap().cents(), 700);
        assert_eq!(Amount::parse("x", "0.5").unwrap().cents(), 50);
        assert_eq!(Amount::from_cents(-305).to_string(), "-3.05");
        assert_eq!(Amount::from_cents(1250).to_string(), "12.50");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_amount_parse_rejects_garbage() {
        for bad in ["", "abc", "1.234", "--1", "1.2.3", "1,50"] {
            assert!(Amount::parse("x", bad).is_err(), "should reject {bad:?}");
        }
    }

    #[test]
    fn test_amount_bonus_percent() {
        let base = Amount::from_cents(200); // 2.00
        let half = Amount::from_cents(5000); // 50%
        assert_eq!(base.with_bonus_percent(half).cents(), 300);
        assert_eq!(base.with_bonus_percent(Amount::ZERO).cents(), 200);
        // 1.00 at 12.5% -> 1.13 (half away from zero)
        let one = Amount::from_cents(100);
        assert_eq!(one.with_bonus_percent(Amount::from_cents(1250)).cents(), 113);
    }

    #[test]
    fn test_duration_parse_and_format() {
        assert_eq!(parse_duration_secs("d", "00:00:03").unwrap(), 3);
        assert_eq!(parse_duration_secs("d", "1:02:03").unwrap(), 3723);
        assert_eq!(parse_duration_secs("d", "1 02:00:00").unwrap(), 93_600);
        assert!(parse_duration_secs("d", "1:99:00").is_err());
        assert!(parse_duration_secs("d", "90 minutes").is_err());
        assert_eq!(format_duration_secs(3723), "1:02:03");
        assert_eq!(format_duration_secs(93_600), "26:00:00");
    }

    #[test]
    fn test_daily_requires_cadence() {
        let input = TaskInput {
            profile_id: Uuid::new_v4(),
            task_type: TaskType::Daily,
            title: "Stretch".into(),
            notes: String::new(),
            is_hidden: false,
            tag_ids: vec![],
            gold_delta: Amount::from_cents(100),
            count_increment: None,
            count_reset_cadence: None,
            repeat_cadence: None,
            repeat_every: None,
            streak_goal: None,
            autocomplete_time_threshold: None,
            due_at: None,
            is_repeatable: None,
        };
        assert!(matches!(
            Task::from_input(input, Utc::now()),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_reward_requires_negative_cost() {
        let input = TaskInput {
            profile_id: Uuid::new_v4(),
            task_type: TaskType::Reward,
            title: "Movie night".into(),
            notes: String::new(),
            is_hidden: false,
            tag_ids: vec![],
            gold_delta: Amount::from_cents(500),
            count_increment: None,
            count_reset_cadence: None,
            repeat_cadence: None,
            repeat_every: None,
            streak_goal: None,
            autocomplete_time_threshold: None,
            due_at: None,
            is_repeatable: None,
        };
        assert!(Task::from_input(input, Utc::now()).is_err());
    }

    #[test]
    fn test_repeat_every_clamped_to_one() {
        let input = TaskInput {
            profile_id: Uuid::new_v4(),
            task_type: TaskType::Daily,
            title: "Run".into(),
            notes: String::new(),
            is_hidden: false,
            tag_ids: vec![],
            gold_delta: Amount::from_cents(100),
            count_increment: None,
            count_reset_cadence: None,
            repeat_cadence: Some(RepeatCadence::Day),
            repeat_every: Some(0),
            streak_goal: None,
            autocomplete_time_threshold: None,
            due_at: None,
            is_repeatable: None,
        };
        let task = Task::from_input(input, Utc::now()).unwrap();
        assert_eq!(task.repeat_every, 1);
    }
}
