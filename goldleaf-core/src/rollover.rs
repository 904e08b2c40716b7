//! New-day rollover engine
//!
//! Computes which dailies have a genuinely missed previous period and,
//! on user confirmation, retroactively acknowledges that period so streak
//! state survives. An acknowledgment is not a completion: it awards no
//! gold and writes no log entry.
//!
//! The preview/start split exists so the user can review the affected
//! dailies before committing; `start` re-evaluates eligibility to defend
//! against stale previews and silently skips anything no longer eligible.

use chrono::NaiveDate;

use crate::actions::anchor_date;
use crate::periods;
use crate::types::{NewDayPreviewItem, Task, TaskType};

/// If `task` is a daily with an unacknowledged missed previous period,
/// returns that period's start date.
///
/// Eligible iff all of:
/// 1. the task existed during the missed period (created on/before it),
/// 2. at least one full period has elapsed (current != previous),
/// 3. not already completed for the current period,
/// 4. not completed for the previous period either.
pub fn missed_previous_period(task: &Task, today: NaiveDate) -> Option<NaiveDate> {
    if task.task_type != TaskType::Daily {
        return None;
    }
    let anchor = anchor_date(task);
    let cur = periods::period_start(anchor, task.repeat_cadence, task.repeat_every, today);
    let prev = periods::previous_period_start(cur, task.repeat_cadence, task.repeat_every);

    if anchor > prev {
        return None;
    }
    if cur == prev {
        return None;
    }
    if task.last_completion_period == Some(cur) || task.last_completion_period == Some(prev) {
        return None;
    }
    Some(prev)
}

/// Preview entry for an eligible daily.
pub fn preview_item(task: &Task, prev: NaiveDate) -> NewDayPreviewItem {
    NewDayPreviewItem {
        id: task.id,
        title: task.title.clone(),
        previous_period_start: prev,
        current_streak: task.current_streak,
        best_streak: task.best_streak,
        last_completion_period: task.last_completion_period,
    }
}

/// Retroactively mark `prev` as completed for streak bookkeeping.
///
/// Continues the streak only when the period immediately before `prev`
/// was completed. Leaves `last_action_at` and the action counter alone:
/// this is a backdated acknowledgment, not a new event.
pub fn acknowledge_missed_period(task: &mut Task, prev: NaiveDate) {
    let before_prev = periods::previous_period_start(prev, task.repeat_cadence, task.repeat_every);
    if task.last_completion_period == Some(before_prev) {
        task.current_streak += 1;
    } else {
        task.current_streak = 1;
    }
    task.best_streak = task.best_streak.max(task.current_streak);
    task.last_completion_period = Some(prev);
}
