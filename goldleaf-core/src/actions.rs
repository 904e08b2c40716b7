//! Task action engine
//!
//! The four balance-mutating actions: habit increment, daily complete,
//! todo complete, reward claim. Each validates ownership and type, mutates
//! the task and profile in place, and returns the single audit log entry
//! to persist alongside them. Callers (the storage backends) are
//! responsible for making the task + profile + log write atomic.
//!
//! All functions here are deterministic given their time arguments; the
//! backends convert "now" to the local calendar date at their boundary.

use chrono::{DateTime, Local, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::periods;
use crate::types::{Amount, LogEntry, LogType, Profile, StreakBonusRule, Task, TaskType};

/// Local calendar date a task's periods are anchored to: its creation day.
pub fn anchor_date(task: &Task) -> NaiveDate {
    task.created_at.with_timezone(&Local).date_naive()
}

/// Reject a task that belongs to a different profile. Cross-tenant ids are
/// indistinguishable from missing ones by design.
pub fn assert_owned(task: &Task, profile: &Profile) -> Result<()> {
    if task.profile_id != profile.id {
        return Err(Error::NotFound(format!("task {}", task.id)));
    }
    Ok(())
}

fn expect_type(task: &Task, expected: TaskType) -> Result<()> {
    if task.task_type != expected {
        return Err(Error::TypeMismatch(format!(
            "action requires a {} task, got {}",
            expected, task.task_type
        )));
    }
    Ok(())
}

/// Bump the bookkeeping every action shares.
fn touch(task: &mut Task, now: DateTime<Utc>) {
    task.last_action_at = Some(now);
    task.updated_at = now;
    task.total_actions_count += 1;
}

fn log_entry(
    task: &Task,
    profile: &Profile,
    log_type: LogType,
    gold_delta: Amount,
    count_delta: Option<Amount>,
    reward_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> LogEntry {
    LogEntry {
        id: Uuid::new_v4(),
        profile_id: profile.id,
        timestamp: now,
        created_at: now,
        log_type,
        task_id: Some(task.id),
        reward_id,
        gold_delta,
        user_gold: profile.gold_balance,
        count_delta,
        duration_secs: None,
        title_snapshot: task.title.clone(),
    }
}

/// Increment a habit counter and award its flat gold.
///
/// The increment amount and the gold award are independent: gold is never
/// scaled by `by`. No guard blocks repeated calls.
pub fn habit_increment(
    task: &mut Task,
    profile: &mut Profile,
    by: Option<Amount>,
    now: DateTime<Utc>,
) -> Result<LogEntry> {
    assert_owned(task, profile)?;
    expect_type(task, TaskType::Habit)?;

    let delta = by.unwrap_or(task.count_increment);
    task.current_count += delta;
    touch(task, now);

    profile.gold_balance += task.gold_delta;

    Ok(log_entry(
        task,
        profile,
        LogType::HabitIncremented,
        task.gold_delta,
        Some(delta),
        None,
        now,
    ))
}

/// Complete a daily once per period, continuing or resetting the streak,
/// and award gold with the highest qualifying streak bonus applied.
///
/// The streak continues only when the previous period was completed;
/// otherwise it resets to 1. The log records the bonus-adjusted amount,
/// not the base rate.
pub fn daily_complete(
    task: &mut Task,
    profile: &mut Profile,
    rules: &[StreakBonusRule],
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<LogEntry> {
    assert_owned(task, profile)?;
    expect_type(task, TaskType::Daily)?;

    let anchor = anchor_date(task);
    let cur = periods::period_start(anchor, task.repeat_cadence, task.repeat_every, today);
    if task.last_completion_period == Some(cur) {
        return Err(Error::AlreadyCompleted(format!(
            "daily {} already completed for period starting {}",
            task.id, cur
        )));
    }

    let prev = periods::previous_period_start(cur, task.repeat_cadence, task.repeat_every);
    if task.last_completion_period == Some(prev) {
        task.current_streak += 1;
    } else {
        task.current_streak = 1;
    }
    task.best_streak = task.best_streak.max(task.current_streak);
    task.last_completion_period = Some(cur);
    touch(task, now);

    let bonus_percent = rules
        .iter()
        .filter(|r| r.task_id == task.id && r.streak_goal <= task.current_streak)
        .map(|r| r.bonus_percent)
        .max()
        .unwrap_or(Amount::ZERO);
    let final_gold = task.gold_delta.with_bonus_percent(bonus_percent);

    profile.gold_balance += final_gold;

    Ok(log_entry(
        task,
        profile,
        LogType::DailyCompleted,
        final_gold,
        None,
        None,
        now,
    ))
}

/// Mark a todo done exactly once and award its flat gold.
pub fn todo_complete(task: &mut Task, profile: &mut Profile, now: DateTime<Utc>) -> Result<LogEntry> {
    assert_owned(task, profile)?;
    expect_type(task, TaskType::Todo)?;
    if task.is_done {
        return Err(Error::AlreadyCompleted(format!("todo {} is already done", task.id)));
    }

    task.is_done = true;
    task.completed_at = Some(now);
    touch(task, now);

    profile.gold_balance += task.gold_delta;

    Ok(log_entry(
        task,
        profile,
        LogType::TodoCompleted,
        task.gold_delta,
        None,
        None,
        now,
    ))
}

/// Claim a reward, spending gold. Guards repeatability and the
/// non-negative balance invariant before anything is mutated.
pub fn reward_claim(task: &mut Task, profile: &mut Profile, now: DateTime<Utc>) -> Result<LogEntry> {
    assert_owned(task, profile)?;
    expect_type(task, TaskType::Reward)?;
    if !task.gold_delta.is_negative() {
        return Err(Error::InvalidState(format!(
            "reward {} cost must be negative, got {}",
            task.id, task.gold_delta
        )));
    }
    if !task.is_repeatable && task.is_claimed {
        return Err(Error::AlreadyClaimed(format!("reward {}", task.id)));
    }
    let next_balance = profile.gold_balance + task.gold_delta;
    if next_balance < Amount::ZERO {
        return Err(Error::InsufficientFunds(format!(
            "balance {} cannot cover cost {}",
            profile.gold_balance, task.gold_delta
        )));
    }

    profile.gold_balance = next_balance;
    task.claim_count += 1;
    task.is_claimed = true;
    task.claimed_at = Some(now);
    touch(task, now);

    Ok(log_entry(
        task,
        profile,
        LogType::RewardClaimed,
        task.gold_delta,
        None,
        Some(task.id),
        now,
    ))
}

/// Whether a habit counter is due for its cadence reset: the last action
/// predates the current reset bucket and there is something to reset.
pub fn habit_reset_due(task: &Task, today: NaiveDate) -> bool {
    if task.task_type != TaskType::Habit || task.current_count == Amount::ZERO {
        return false;
    }
    let cadence = match task.count_reset_cadence {
        Some(c) if c != crate::types::Cadence::Never => c,
        _ => return false,
    };
    let last = task
        .last_action_at
        .unwrap_or(task.created_at)
        .with_timezone(&Local)
        .date_naive();
    last < periods::habit_reset_period_start(today, cadence)
}

/// Zero a habit counter at the start of a new reset period. Emits no log
/// entry and touches no balance.
pub fn apply_habit_reset(task: &mut Task, now: DateTime<Utc>) {
    task.current_count = Amount::ZERO;
    task.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RepeatCadence, TaskInput};
    use chrono::TimeZone;

    fn local_noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn profile_with(balance_cents: i64) -> Profile {
        let mut p = Profile::new("Test").unwrap();
        p.gold_balance = Amount::from_cents(balance_cents);
        p
    }

    fn daily_task(profile: &Profile, created: DateTime<Utc>, every: u32) -> Task {
        let mut task = Task::from_input(
            TaskInput {
                profile_id: profile.id,
                task_type: TaskType::Daily,
                title: "Stretch".into(),
                notes: String::new(),
                is_hidden: false,
                tag_ids: vec![],
                gold_delta: Amount::from_cents(100),
                count_increment: None,
                count_reset_cadence: None,
                repeat_cadence: Some(RepeatCadence::Day),
                repeat_every: Some(every),
                streak_goal: None,
                autocomplete_time_threshold: None,
                due_at: None,
                is_repeatable: None,
            },
            created,
        )
        .unwrap();
        task.created_at = created;
        task
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_habit_increment_flat_gold_and_count() {
        let mut profile = profile_with(0);
        let mut task = Task::from_input(
            TaskInput {
                profile_id: profile.id,
                task_type: TaskType::Habit,
                title: "Drink water".into(),
                notes: String::new(),
                is_hidden: false,
                tag_ids: vec![],
                gold_delta: Amount::from_cents(200),
                count_increment: Some(Amount::from_cents(100)),
                count_reset_cadence: None,
                repeat_cadence: None,
                repeat_every: None,
                streak_goal: None,
                autocomplete_time_threshold: None,
                due_at: None,
                is_repeatable: None,
            },
            Utc::now(),
        )
        .unwrap();

        let log1 = habit_increment(&mut task, &mut profile, None, Utc::now()).unwrap();
        let log2 = habit_increment(&mut task, &mut profile, None, Utc::now()).unwrap();

        assert_eq!(task.current_count, Amount::from_cents(200));
        assert_eq!(profile.gold_balance, Amount::from_cents(400));
        assert_eq!(log1.gold_delta, Amount::from_cents(200));
        assert_eq!(log2.gold_delta, Amount::from_cents(200));
        assert_eq!(log2.user_gold, profile.gold_balance);
        assert_eq!(log1.count_delta, Some(Amount::from_cents(100)));
        assert_eq!(task.total_actions_count, 2);
    }

    #[test]
    fn test_habit_increment_explicit_by_does_not_scale_gold() {
        let mut profile = profile_with(0);
        let mut task = daily_task(&profile, local_noon(2026, 2, 1), 1);
        task.task_type = TaskType::Habit;
        task.repeat_cadence = None;
        task.gold_delta = Amount::from_cents(200);

        let log = habit_increment(
            &mut task,
            &mut profile,
            Some(Amount::from_cents(550)),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(task.current_count, Amount::from_cents(550));
        assert_eq!(log.count_delta, Some(Amount::from_cents(550)));
        assert_eq!(log.gold_delta, Amount::from_cents(200));
    }

    #[test]
    fn test_daily_consecutive_completions_build_streak() {
        // Scenario A: daily every 1, created 2026-02-01, completed on the
        // 1st and 2nd -> streak 2.
        let mut profile = profile_with(0);
        let created = local_noon(2026, 2, 1);
        let mut task = daily_task(&profile, created, 1);

        daily_complete(&mut task, &mut profile, &[], created, date(2026, 2, 1)).unwrap();
        assert_eq!(task.current_streak, 1);

        daily_complete(
            &mut task,
            &mut profile,
            &[],
            local_noon(2026, 2, 2),
            date(2026, 2, 2),
        )
        .unwrap();
        assert_eq!(task.current_streak, 2);
        assert_eq!(task.best_streak, 2);
        assert_eq!(profile.gold_balance, Amount::from_cents(200));
    }

    #[test]
    fn test_daily_skipped_period_resets_streak() {
        // Scenario B: skip 2026-02-03, complete 02-04 -> streak resets to 1,
        // best stays at 2.
        let mut profile = profile_with(0);
        let created = local_noon(2026, 2, 1);
        let mut task = daily_task(&profile, created, 1);
        task.current_streak = 2;
        task.best_streak = 2;
        task.last_completion_period = Some(date(2026, 2, 2));

        daily_complete(
            &mut task,
            &mut profile,
            &[],
            local_noon(2026, 2, 4),
            date(2026, 2, 4),
        )
        .unwrap();
        assert_eq!(task.current_streak, 1);
        assert_eq!(task.best_streak, 2);
    }

    #[test]
    fn test_daily_double_completion_rejected() {
        let mut profile = profile_with(0);
        let created = local_noon(2026, 2, 1);
        let mut task = daily_task(&profile, created, 1);

        daily_complete(&mut task, &mut profile, &[], created, date(2026, 2, 1)).unwrap();
        let err = daily_complete(&mut task, &mut profile, &[], created, date(2026, 2, 1));
        assert!(matches!(err, Err(Error::AlreadyCompleted(_))));
        // Balance untouched by the rejected attempt.
        assert_eq!(profile.gold_balance, Amount::from_cents(100));
    }

    #[test]
    fn test_daily_multi_day_cadence_streak() {
        // Every 3 days anchored 2026-02-01: completing in the 02-01 and
        // 02-04 blocks continues the streak.
        let mut profile = profile_with(0);
        let created = local_noon(2026, 2, 1);
        let mut task = daily_task(&profile, created, 3);

        daily_complete(&mut task, &mut profile, &[], created, date(2026, 2, 2)).unwrap();
        assert_eq!(task.last_completion_period, Some(date(2026, 2, 1)));

        daily_complete(
            &mut task,
            &mut profile,
            &[],
            local_noon(2026, 2, 5),
            date(2026, 2, 5),
        )
        .unwrap();
        assert_eq!(task.last_completion_period, Some(date(2026, 2, 4)));
        assert_eq!(task.current_streak, 2);
    }

    #[test]
    fn test_daily_streak_bonus_takes_highest_qualifying_rule() {
        let mut profile = profile_with(0);
        let created = local_noon(2026, 2, 1);
        let mut task = daily_task(&profile, created, 1);
        task.current_streak = 4;
        task.last_completion_period = Some(date(2026, 2, 4));
        let rules = vec![
            StreakBonusRule::new(task.id, 3, Amount::from_cents(1000)).unwrap(), // 10%
            StreakBonusRule::new(task.id, 5, Amount::from_cents(5000)).unwrap(), // 50%
            StreakBonusRule::new(Uuid::new_v4(), 1, Amount::from_cents(9000)).unwrap(), // other task
        ];

        // Fifth consecutive completion: streak hits 5, the 50% rule wins.
        let log = daily_complete(
            &mut task,
            &mut profile,
            &rules,
            local_noon(2026, 2, 5),
            date(2026, 2, 5),
        )
        .unwrap();
        assert_eq!(task.current_streak, 5);
        assert_eq!(log.gold_delta, Amount::from_cents(150));
        assert_eq!(profile.gold_balance, Amount::from_cents(150));
    }

    #[test]
    fn test_todo_complete_once() {
        let mut profile = profile_with(0);
        let mut task = Task::from_input(
            TaskInput {
                profile_id: profile.id,
                task_type: TaskType::Todo,
                title: "Inbox zero".into(),
                notes: String::new(),
                is_hidden: false,
                tag_ids: vec![],
                gold_delta: Amount::from_cents(300),
                count_increment: None,
                count_reset_cadence: None,
                repeat_cadence: None,
                repeat_every: None,
                streak_goal: None,
                autocomplete_time_threshold: None,
                due_at: None,
                is_repeatable: None,
            },
            Utc::now(),
        )
        .unwrap();

        todo_complete(&mut task, &mut profile, Utc::now()).unwrap();
        assert!(task.is_done);
        assert!(task.completed_at.is_some());
        assert_eq!(profile.gold_balance, Amount::from_cents(300));

        assert!(matches!(
            todo_complete(&mut task, &mut profile, Utc::now()),
            Err(Error::AlreadyCompleted(_))
        ));
    }

    #[test]
    fn test_reward_claim_insufficient_funds() {
        // Scenario C: cost 5.00, balance 3.00 -> rejected, balance unchanged.
        let mut profile = profile_with(300);
        let mut task = Task::from_input(
            TaskInput {
                profile_id: profile.id,
                task_type: TaskType::Reward,
                title: "Movie night".into(),
                notes: String::new(),
                is_hidden: false,
                tag_ids: vec![],
                gold_delta: Amount::from_cents(-500),
                count_increment: None,
                count_reset_cadence: None,
                repeat_cadence: None,
                repeat_every: None,
                streak_goal: None,
                autocomplete_time_threshold: None,
                due_at: None,
                is_repeatable: None,
            },
            Utc::now(),
        )
        .unwrap();

        let err = reward_claim(&mut task, &mut profile, Utc::now());
        assert!(matches!(err, Err(Error::InsufficientFunds(_))));
        assert_eq!(profile.gold_balance, Amount::from_cents(300));
        assert_eq!(task.claim_count, 0);
        assert!(!task.is_claimed);
    }

    #[test]
    fn test_reward_claim_spends_exact_cost() {
        let mut profile = profile_with(1000);
        let mut task = Task::from_input(
            TaskInput {
                profile_id: profile.id,
                task_type: TaskType::Reward,
                title: "Coffee".into(),
                notes: String::new(),
                is_hidden: false,
                tag_ids: vec![],
                gold_delta: Amount::from_cents(-250),
                count_increment: None,
                count_reset_cadence: None,
                repeat_cadence: None,
                repeat_every: None,
                streak_goal: None,
                autocomplete_time_threshold: None,
                due_at: None,
                is_repeatable: Some(true),
            },
            Utc::now(),
        )
        .unwrap();

        let log = reward_claim(&mut task, &mut profile, Utc::now()).unwrap();
        assert_eq!(profile.gold_balance, Amount::from_cents(750));
        assert_eq!(log.gold_delta, Amount::from_cents(-250));
        assert_eq!(log.reward_id, Some(task.id));
        assert_eq!(log.user_gold, Amount::from_cents(750));

        // Repeatable: a second claim goes through.
        reward_claim(&mut task, &mut profile, Utc::now()).unwrap();
        assert_eq!(task.claim_count, 2);
        assert_eq!(profile.gold_balance, Amount::from_cents(500));
    }

    #[test]
    fn test_nonrepeatable_reward_rejected_on_second_claim() {
        let mut profile = profile_with(10_000);
        let mut task = Task::from_input(
            TaskInput {
                profile_id: profile.id,
                task_type: TaskType::Reward,
                title: "New book".into(),
                notes: String::new(),
                is_hidden: false,
                tag_ids: vec![],
                gold_delta: Amount::from_cents(-100),
                count_increment: None,
                count_reset_cadence: None,
                repeat_cadence: None,
                repeat_every: None,
                streak_goal: None,
                autocomplete_time_threshold: None,
                due_at: None,
                is_repeatable: Some(false),
            },
            Utc::now(),
        )
        .unwrap();

        reward_claim(&mut task, &mut profile, Utc::now()).unwrap();
        assert!(matches!(
            reward_claim(&mut task, &mut profile, Utc::now()),
            Err(Error::AlreadyClaimed(_))
        ));
    }

    #[test]
    fn test_cross_profile_action_is_not_found() {
        let mut profile = profile_with(0);
        let other = profile_with(0);
        let mut task = daily_task(&other, local_noon(2026, 2, 1), 1);
        let err = daily_complete(&mut task, &mut profile, &[], Utc::now(), date(2026, 2, 1));
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut profile = profile_with(0);
        let mut task = daily_task(&profile, local_noon(2026, 2, 1), 1);
        assert!(matches!(
            habit_increment(&mut task, &mut profile, None, Utc::now()),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_habit_reset_due_after_new_period() {
        let profile = profile_with(0);
        let mut task = daily_task(&profile, local_noon(2026, 2, 1), 1);
        task.task_type = TaskType::Habit;
        task.repeat_cadence = None;
        task.count_reset_cadence = Some(crate::types::Cadence::Day);
        task.current_count = Amount::from_cents(400);
        task.last_action_at = Some(local_noon(2026, 2, 20));

        assert!(!habit_reset_due(&task, date(2026, 2, 20)));
        assert!(habit_reset_due(&task, date(2026, 2, 21)));

        apply_habit_reset(&mut task, Utc::now());
        assert_eq!(task.current_count, Amount::ZERO);
        assert!(!habit_reset_due(&task, date(2026, 2, 21)));
    }
}
