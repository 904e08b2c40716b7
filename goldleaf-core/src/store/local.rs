//! Local SQLite backend
//!
//! Implements the full repository contract on-device. Unlike the remote
//! backend there is no server to enforce invariants, so every ownership
//! check, type guard, and atomicity requirement is enforced here: each
//! action runs inside a single transaction spanning the task, the profile
//! balance, and the log entry.
//!
//! All reads map rows into owned structs, so callers can never mutate
//! cached store state through a shared reference.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use crate::actions;
use crate::error::{Error, Result};
use crate::periods;
use crate::rollover;
use crate::types::{
    Amount, Cadence, DurationLogInput, LogEntry, LogQuery, LogType, NewDayOutcome, NewDayPreview,
    Profile, RepeatCadence, StreakBonusRule, Task, TaskInput, TaskPatch, TaskType,
};

use super::{Repository, StreakRuleInput};

/// Database handle with a single pooled connection
pub struct LocalStore {
    conn: Mutex<Connection>,
}

fn conv_err(e: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
}

fn parse_uuid(s: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&s).map_err(|e| conv_err(e.to_string()))
}

fn parse_ts(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conv_err(e.to_string()))
}

impl LocalStore {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Foreign keys drive the ownership cascades; WAL for concurrency.
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Row mapping
    // ============================================

    fn row_to_profile(row: &Row) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: parse_uuid(row.get("id")?)?,
            name: row.get("name")?,
            gold_balance: Amount::from_cents(row.get("gold_balance")?),
            created_at: parse_ts(row.get("created_at")?),
        })
    }

    fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
        let task_type: TaskType = row
            .get::<_, String>("task_type")?
            .parse()
            .map_err(conv_err)?;
        let tag_ids: Vec<Uuid> =
            serde_json::from_str(&row.get::<_, String>("tag_ids")?).unwrap_or_default();
        let count_reset_cadence = row
            .get::<_, Option<String>>("count_reset_cadence")?
            .map(|s| s.parse::<Cadence>().map_err(conv_err))
            .transpose()?;
        let repeat_cadence = row
            .get::<_, Option<String>>("repeat_cadence")?
            .map(|s| s.parse::<RepeatCadence>().map_err(conv_err))
            .transpose()?;
        let last_completion_period = row
            .get::<_, Option<String>>("last_completion_period")?
            .map(parse_date)
            .transpose()?;

        Ok(Task {
            id: parse_uuid(row.get("id")?)?,
            profile_id: parse_uuid(row.get("profile_id")?)?,
            task_type,
            title: row.get("title")?,
            notes: row.get("notes")?,
            is_hidden: row.get("is_hidden")?,
            tag_ids,
            gold_delta: Amount::from_cents(row.get("gold_delta")?),
            created_at: parse_ts(row.get("created_at")?),
            updated_at: parse_ts(row.get("updated_at")?),
            last_action_at: row.get::<_, Option<String>>("last_action_at")?.map(parse_ts),
            total_actions_count: row.get("total_actions_count")?,
            current_count: Amount::from_cents(row.get("current_count")?),
            count_increment: Amount::from_cents(row.get("count_increment")?),
            count_reset_cadence,
            repeat_cadence,
            repeat_every: row.get("repeat_every")?,
            current_streak: row.get("current_streak")?,
            best_streak: row.get("best_streak")?,
            streak_goal: row.get("streak_goal")?,
            last_completion_period,
            autocomplete_time_threshold: row.get("autocomplete_time_threshold")?,
            due_at: row.get::<_, Option<String>>("due_at")?.map(parse_ts),
            is_done: row.get("is_done")?,
            completed_at: row.get::<_, Option<String>>("completed_at")?.map(parse_ts),
            is_repeatable: row.get("is_repeatable")?,
            is_claimed: row.get("is_claimed")?,
            claimed_at: row.get::<_, Option<String>>("claimed_at")?.map(parse_ts),
            claim_count: row.get("claim_count")?,
        })
    }

    fn row_to_log(row: &Row) -> rusqlite::Result<LogEntry> {
        let log_type: LogType = row.get::<_, String>("log_type")?.parse().map_err(conv_err)?;
        Ok(LogEntry {
            id: parse_uuid(row.get("id")?)?,
            profile_id: parse_uuid(row.get("profile_id")?)?,
            timestamp: parse_ts(row.get("timestamp")?),
            created_at: parse_ts(row.get("created_at")?),
            log_type,
            task_id: row
                .get::<_, Option<String>>("task_id")?
                .map(parse_uuid)
                .transpose()?,
            reward_id: row
                .get::<_, Option<String>>("reward_id")?
                .map(parse_uuid)
                .transpose()?,
            gold_delta: Amount::from_cents(row.get("gold_delta")?),
            user_gold: Amount::from_cents(row.get("user_gold")?),
            count_delta: row
                .get::<_, Option<i64>>("count_delta")?
                .map(Amount::from_cents),
            duration_secs: row.get("duration_secs")?,
            title_snapshot: row.get("title_snapshot")?,
        })
    }

    fn row_to_rule(row: &Row) -> rusqlite::Result<StreakBonusRule> {
        Ok(StreakBonusRule {
            id: parse_uuid(row.get("id")?)?,
            task_id: parse_uuid(row.get("task_id")?)?,
            streak_goal: row.get("streak_goal")?,
            bonus_percent: Amount::from_cents(row.get("bonus_percent")?),
            created_at: parse_ts(row.get("created_at")?),
        })
    }

    // ============================================
    // Transaction-scoped lookups and writes
    // ============================================

    fn profile_tx(tx: &Transaction, id: Uuid) -> Result<Profile> {
        tx.query_row(
            "SELECT * FROM profiles WHERE id = ?",
            [id.to_string()],
            Self::row_to_profile,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("profile {id}")))
    }

    /// Task lookup scoped by profile: a cross-tenant id behaves exactly
    /// like a missing one.
    fn task_tx(tx: &Transaction, id: Uuid, profile_id: Uuid) -> Result<Task> {
        Self::try_task_tx(tx, id, profile_id)?.ok_or_else(|| Error::NotFound(format!("task {id}")))
    }

    fn try_task_tx(tx: &Transaction, id: Uuid, profile_id: Uuid) -> Result<Option<Task>> {
        tx.query_row(
            "SELECT * FROM tasks WHERE id = ? AND profile_id = ?",
            [id.to_string(), profile_id.to_string()],
            Self::row_to_task,
        )
        .optional()
        .map_err(Error::from)
    }

    fn rules_for_task_tx(tx: &Transaction, task_id: Uuid) -> Result<Vec<StreakBonusRule>> {
        let mut stmt = tx.prepare(
            "SELECT * FROM streak_bonus_rules WHERE task_id = ? ORDER BY streak_goal, created_at",
        )?;
        let rules = stmt
            .query_map([task_id.to_string()], Self::row_to_rule)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rules)
    }

    fn insert_task_tx(tx: &Transaction, task: &Task) -> Result<()> {
        tx.execute(
            r#"
            INSERT INTO tasks (
                id, profile_id, task_type, title, notes, is_hidden, tag_ids,
                gold_delta, created_at, updated_at, last_action_at, total_actions_count,
                current_count, count_increment, count_reset_cadence,
                repeat_cadence, repeat_every, current_streak, best_streak, streak_goal,
                last_completion_period, autocomplete_time_threshold,
                due_at, is_done, completed_at,
                is_repeatable, is_claimed, claimed_at, claim_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)
            "#,
            params![
                task.id.to_string(),
                task.profile_id.to_string(),
                task.task_type.as_str(),
                task.title,
                task.notes,
                task.is_hidden,
                serde_json::to_string(&task.tag_ids)?,
                task.gold_delta.cents(),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
                task.last_action_at.map(|t| t.to_rfc3339()),
                task.total_actions_count,
                task.current_count.cents(),
                task.count_increment.cents(),
                task.count_reset_cadence.map(|c| c.as_str()),
                task.repeat_cadence.map(|c| c.as_str()),
                task.repeat_every,
                task.current_streak,
                task.best_streak,
                task.streak_goal,
                task.last_completion_period.map(|d| d.to_string()),
                task.autocomplete_time_threshold,
                task.due_at.map(|t| t.to_rfc3339()),
                task.is_done,
                task.completed_at.map(|t| t.to_rfc3339()),
                task.is_repeatable,
                task.is_claimed,
                task.claimed_at.map(|t| t.to_rfc3339()),
                task.claim_count,
            ],
        )?;
        Ok(())
    }

    fn save_task_tx(tx: &Transaction, task: &Task) -> Result<()> {
        tx.execute(
            r#"
            UPDATE tasks SET
                title = ?2, notes = ?3, is_hidden = ?4, tag_ids = ?5, gold_delta = ?6,
                updated_at = ?7, last_action_at = ?8, total_actions_count = ?9,
                current_count = ?10, count_increment = ?11, count_reset_cadence = ?12,
                repeat_cadence = ?13, repeat_every = ?14, current_streak = ?15,
                best_streak = ?16, streak_goal = ?17, last_completion_period = ?18,
                autocomplete_time_threshold = ?19, due_at = ?20, is_done = ?21,
                completed_at = ?22, is_repeatable = ?23, is_claimed = ?24,
                claimed_at = ?25, claim_count = ?26
            WHERE id = ?1
            "#,
            params![
                task.id.to_string(),
                task.title,
                task.notes,
                task.is_hidden,
                serde_json::to_string(&task.tag_ids)?,
                task.gold_delta.cents(),
                task.updated_at.to_rfc3339(),
                task.last_action_at.map(|t| t.to_rfc3339()),
                task.total_actions_count,
                task.current_count.cents(),
                task.count_increment.cents(),
                task.count_reset_cadence.map(|c| c.as_str()),
                task.repeat_cadence.map(|c| c.as_str()),
                task.repeat_every,
                task.current_streak,
                task.best_streak,
                task.streak_goal,
                task.last_completion_period.map(|d| d.to_string()),
                task.autocomplete_time_threshold,
                task.due_at.map(|t| t.to_rfc3339()),
                task.is_done,
                task.completed_at.map(|t| t.to_rfc3339()),
                task.is_repeatable,
                task.is_claimed,
                task.claimed_at.map(|t| t.to_rfc3339()),
                task.claim_count,
            ],
        )?;
        Ok(())
    }

    fn save_profile_balance_tx(tx: &Transaction, profile: &Profile) -> Result<()> {
        tx.execute(
            "UPDATE profiles SET gold_balance = ?2 WHERE id = ?1",
            params![profile.id.to_string(), profile.gold_balance.cents()],
        )?;
        Ok(())
    }

    fn insert_log_tx(tx: &Transaction, log: &LogEntry) -> Result<()> {
        tx.execute(
            r#"
            INSERT INTO log_entries (
                id, profile_id, timestamp, created_at, log_type, task_id, reward_id,
                gold_delta, user_gold, count_delta, duration_secs, title_snapshot
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                log.id.to_string(),
                log.profile_id.to_string(),
                log.timestamp.to_rfc3339(),
                log.created_at.to_rfc3339(),
                log.log_type.as_str(),
                log.task_id.map(|t| t.to_string()),
                log.reward_id.map(|t| t.to_string()),
                log.gold_delta.cents(),
                log.user_gold.cents(),
                log.count_delta.map(|c| c.cents()),
                log.duration_secs,
                log.title_snapshot,
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Period-state refresh (habit counter resets)
    // ============================================

    /// Zero habit counters whose reset cadence rolled into a new bucket
    /// since the last action. Runs before task reads and actions, the way
    /// the server refreshes period state before serving a request.
    pub fn refresh_period_state_at(&self, profile_id: Uuid, now: DateTime<Utc>, today: NaiveDate) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::profile_tx(&tx, profile_id)?;

        let habits: Vec<Task> = {
            let mut stmt = tx.prepare(
                "SELECT * FROM tasks
                 WHERE profile_id = ? AND task_type = 'habit'
                   AND count_reset_cadence IS NOT NULL AND count_reset_cadence != 'never'",
            )?;
            let habits = stmt
                .query_map([profile_id.to_string()], Self::row_to_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            habits
        };

        let mut reset_count = 0;
        for mut habit in habits {
            if actions::habit_reset_due(&habit, today) {
                actions::apply_habit_reset(&mut habit, now);
                Self::save_task_tx(&tx, &habit)?;
                reset_count += 1;
            }
        }
        tx.commit()?;

        if reset_count > 0 {
            tracing::debug!(profile_id = %profile_id, reset_count, "Reset habit counters for new period");
        }
        Ok(reset_count)
    }

    // ============================================
    // Time-explicit action variants
    // ============================================

    pub fn create_task_at(&self, input: TaskInput, now: DateTime<Utc>) -> Result<Task> {
        let task = Task::from_input(input, now)?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::profile_tx(&tx, task.profile_id)?;
        Self::insert_task_tx(&tx, &task)?;
        tx.commit()?;
        Ok(task)
    }

    pub fn habit_increment_at(
        &self,
        id: Uuid,
        profile_id: Uuid,
        by: Option<Amount>,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Task> {
        self.refresh_period_state_at(profile_id, now, today)?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut profile = Self::profile_tx(&tx, profile_id)?;
        let mut task = Self::task_tx(&tx, id, profile_id)?;
        let log = actions::habit_increment(&mut task, &mut profile, by, now)?;
        Self::save_task_tx(&tx, &task)?;
        Self::save_profile_balance_tx(&tx, &profile)?;
        Self::insert_log_tx(&tx, &log)?;
        tx.commit()?;
        Ok(task)
    }

    pub fn daily_complete_at(
        &self,
        id: Uuid,
        profile_id: Uuid,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Task> {
        self.refresh_period_state_at(profile_id, now, today)?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut profile = Self::profile_tx(&tx, profile_id)?;
        let mut task = Self::task_tx(&tx, id, profile_id)?;
        let rules = Self::rules_for_task_tx(&tx, task.id)?;
        let log = actions::daily_complete(&mut task, &mut profile, &rules, now, today)?;
        Self::save_task_tx(&tx, &task)?;
        Self::save_profile_balance_tx(&tx, &profile)?;
        Self::insert_log_tx(&tx, &log)?;
        tx.commit()?;
        Ok(task)
    }

    pub fn todo_complete_at(&self, id: Uuid, profile_id: Uuid, now: DateTime<Utc>) -> Result<Task> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut profile = Self::profile_tx(&tx, profile_id)?;
        let mut task = Self::task_tx(&tx, id, profile_id)?;
        let log = actions::todo_complete(&mut task, &mut profile, now)?;
        Self::save_task_tx(&tx, &task)?;
        Self::save_profile_balance_tx(&tx, &profile)?;
        Self::insert_log_tx(&tx, &log)?;
        tx.commit()?;
        Ok(task)
    }

    pub fn reward_claim_at(&self, id: Uuid, profile_id: Uuid, now: DateTime<Utc>) -> Result<Task> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut profile = Self::profile_tx(&tx, profile_id)?;
        let mut task = Self::task_tx(&tx, id, profile_id)?;
        let log = actions::reward_claim(&mut task, &mut profile, now)?;
        Self::save_task_tx(&tx, &task)?;
        Self::save_profile_balance_tx(&tx, &profile)?;
        Self::insert_log_tx(&tx, &log)?;
        tx.commit()?;
        Ok(task)
    }

    pub fn new_day_preview_at(&self, profile_id: Uuid, today: NaiveDate) -> Result<NewDayPreview> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::profile_tx(&tx, profile_id)?;

        let dailies: Vec<Task> = {
            let mut stmt = tx.prepare(
                "SELECT * FROM tasks WHERE profile_id = ? AND task_type = 'daily'
                 ORDER BY created_at",
            )?;
            let dailies = stmt
                .query_map([profile_id.to_string()], Self::row_to_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            dailies
        };
        tx.commit()?;

        let items = dailies
            .iter()
            .filter_map(|task| {
                rollover::missed_previous_period(task, today)
                    .map(|prev| rollover::preview_item(task, prev))
            })
            .collect();
        Ok(NewDayPreview { dailies: items })
    }

    /// Acknowledge missed periods for the checked dailies, all inside one
    /// transaction. Eligibility is re-evaluated per task; stale or foreign
    /// ids are silently skipped.
    pub fn new_day_start_at(
        &self,
        profile_id: Uuid,
        checked_ids: &[Uuid],
        today: NaiveDate,
    ) -> Result<NewDayOutcome> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::profile_tx(&tx, profile_id)?;

        let mut updated_count = 0;
        for &id in checked_ids {
            let mut task = match Self::try_task_tx(&tx, id, profile_id)? {
                Some(task) => task,
                None => continue,
            };
            let prev = match rollover::missed_previous_period(&task, today) {
                Some(prev) => prev,
                None => continue,
            };
            rollover::acknowledge_missed_period(&mut task, prev);
            Self::save_task_tx(&tx, &task)?;
            updated_count += 1;
        }
        tx.commit()?;

        tracing::info!(profile_id = %profile_id, updated_count, "New-day rollover applied");
        Ok(NewDayOutcome { updated_count })
    }

    pub fn create_duration_log_at(
        &self,
        input: DurationLogInput,
        created_at: DateTime<Utc>,
    ) -> Result<LogEntry> {
        if input.title.trim().is_empty() {
            return Err(Error::validation("title", "activity title must not be empty"));
        }
        if input.duration_secs <= 0 {
            return Err(Error::validation("duration", "duration must be positive"));
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let profile = Self::profile_tx(&tx, input.profile_id)?;
        if let Some(task_id) = input.task_id {
            Self::task_tx(&tx, task_id, input.profile_id)?;
        }
        if let Some(reward_id) = input.reward_id {
            let reward = Self::task_tx(&tx, reward_id, input.profile_id)?;
            if reward.task_type != TaskType::Reward {
                return Err(Error::NotFound(format!("reward {reward_id}")));
            }
        }

        let log = LogEntry {
            id: Uuid::new_v4(),
            profile_id: profile.id,
            timestamp: input.timestamp,
            created_at,
            log_type: LogType::ActivityDuration,
            task_id: input.task_id,
            reward_id: input.reward_id,
            gold_delta: Amount::ZERO,
            user_gold: profile.gold_balance,
            count_delta: None,
            duration_secs: Some(input.duration_secs),
            title_snapshot: input.title.trim().to_string(),
        };
        Self::insert_log_tx(&tx, &log)?;
        tx.commit()?;
        Ok(log)
    }
}

impl Repository for LocalStore {
    fn fetch_profiles(&self) -> Result<Vec<Profile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM profiles ORDER BY created_at")?;
        let profiles = stmt
            .query_map([], Self::row_to_profile)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(profiles)
    }

    fn create_profile(&self, name: &str) -> Result<Profile> {
        let profile = Profile::new(name)?;
        let conn = self.conn.lock().unwrap();
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM profiles WHERE name = ?",
            [&profile.name],
            |r| r.get(0),
        )?;
        if exists > 0 {
            return Err(Error::validation("name", "a profile with this name already exists"));
        }
        conn.execute(
            "INSERT INTO profiles (id, name, gold_balance, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                profile.id.to_string(),
                profile.name,
                profile.gold_balance.cents(),
                profile.created_at.to_rfc3339(),
            ],
        )?;
        Ok(profile)
    }

    fn delete_profile(&self, id: Uuid) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::profile_tx(&tx, id)?;
        let total: i64 = tx.query_row("SELECT COUNT(*) FROM profiles", [], |r| r.get(0))?;
        if total <= 1 {
            return Err(Error::InvalidState(
                "cannot delete the last remaining profile".to_string(),
            ));
        }
        // Cascades to tasks, rules, and logs via foreign keys.
        tx.execute("DELETE FROM profiles WHERE id = ?", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn fetch_tasks(&self, profile_id: Uuid) -> Result<Vec<Task>> {
        let now = Utc::now();
        self.refresh_period_state_at(profile_id, now, periods::local_today(now))?;
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM tasks WHERE profile_id = ? ORDER BY created_at")?;
        let tasks = stmt
            .query_map([profile_id.to_string()], Self::row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    fn create_task(&self, input: TaskInput) -> Result<Task> {
        self.create_task_at(input, Utc::now())
    }

    fn update_task(&self, id: Uuid, profile_id: Uuid, patch: TaskPatch) -> Result<Task> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut task = Self::task_tx(&tx, id, profile_id)?;
        task.apply_patch(patch, Utc::now())?;
        Self::save_task_tx(&tx, &task)?;
        tx.commit()?;
        Ok(task)
    }

    fn delete_task(&self, id: Uuid, profile_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM tasks WHERE id = ? AND profile_id = ?",
            [id.to_string(), profile_id.to_string()],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("task {id}")));
        }
        Ok(())
    }

    fn habit_increment(&self, id: Uuid, profile_id: Uuid, by: Option<Amount>) -> Result<Task> {
        let now = Utc::now();
        self.habit_increment_at(id, profile_id, by, now, periods::local_today(now))
    }

    fn daily_complete(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        let now = Utc::now();
        self.daily_complete_at(id, profile_id, now, periods::local_today(now))
    }

    fn todo_complete(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        self.todo_complete_at(id, profile_id, Utc::now())
    }

    fn reward_claim(&self, id: Uuid, profile_id: Uuid) -> Result<Task> {
        self.reward_claim_at(id, profile_id, Utc::now())
    }

    fn fetch_logs(&self, profile_id: Uuid, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT * FROM log_entries WHERE profile_id = ?");
        let mut params_vec: Vec<String> = vec![profile_id.to_string()];

        if let Some(log_type) = query.log_type {
            sql.push_str(" AND log_type = ?");
            params_vec.push(log_type.as_str().to_string());
        }
        if let Some(task_id) = query.task_id {
            sql.push_str(" AND task_id = ?");
            params_vec.push(task_id.to_string());
        }
        if let Some(from) = query.from_date {
            sql.push_str(" AND date(timestamp) >= ?");
            params_vec.push(from.to_string());
        }
        if let Some(to) = query.to_date {
            sql.push_str(" AND date(timestamp) <= ?");
            params_vec.push(to.to_string());
        }
        // Limit is clamped internally, never raw user text.
        let limit = query.limit.unwrap_or(100).clamp(1, 500);
        sql.push_str(&format!(
            " ORDER BY timestamp DESC, created_at DESC LIMIT {limit}"
        ));

        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params_from_iter(params_vec.iter()), Self::row_to_log)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    fn fetch_streak_rules(&self, profile_id: Uuid, task_id: Uuid) -> Result<Vec<StreakBonusRule>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::task_tx(&tx, task_id, profile_id)?;
        let rules = Self::rules_for_task_tx(&tx, task_id)?;
        tx.commit()?;
        Ok(rules)
    }

    fn replace_streak_rules(
        &self,
        profile_id: Uuid,
        task_id: Uuid,
        rules: Vec<StreakRuleInput>,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let task = Self::task_tx(&tx, task_id, profile_id)?;
        if task.task_type != TaskType::Daily {
            return Err(Error::TypeMismatch(
                "streak bonus rules only attach to daily tasks".to_string(),
            ));
        }

        tx.execute(
            "DELETE FROM streak_bonus_rules WHERE task_id = ?",
            [task_id.to_string()],
        )?;
        for rule in rules {
            let rule = StreakBonusRule::new(task_id, rule.streak_goal, rule.bonus_percent)?;
            tx.execute(
                "INSERT INTO streak_bonus_rules (id, task_id, streak_goal, bonus_percent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    rule.id.to_string(),
                    rule.task_id.to_string(),
                    rule.streak_goal,
                    rule.bonus_percent.cents(),
                    rule.created_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn new_day_preview(&self, profile_id: Uuid) -> Result<NewDayPreview> {
        self.new_day_preview_at(profile_id, periods::local_today(Utc::now()))
    }

    fn new_day_start(&self, profile_id: Uuid, checked_ids: &[Uuid]) -> Result<NewDayOutcome> {
        self.new_day_start_at(profile_id, checked_ids, periods::local_today(Utc::now()))
    }

    fn create_duration_log(&self, input: DurationLogInput) -> Result<LogEntry> {
        self.create_duration_log_at(input, Utc::now())
    }

    fn queue_duration_log(&self, input: DurationLogInput) {
        // Best-effort: the timer UI must never block on logging.
        if let Err(e) = self.create_duration_log(input) {
            tracing::warn!(error = %e, "Failed to queue activity duration log");
        }
    }
}
