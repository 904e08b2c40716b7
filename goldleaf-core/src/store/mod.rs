//! Storage layer for goldleaf
//!
//! Two backends implement the same [`Repository`] contract: a local SQLite
//! store that enforces every invariant itself inside single transactions,
//! and a remote client that delegates validation and atomicity to the
//! server. Callers pick one implementation at startup from configuration
//! and never branch on the backend again.

pub mod local;
pub mod remote;
pub mod schema;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Backend, Config};
use crate::error::Result;
use crate::types::{
    Amount, DurationLogInput, LogEntry, LogQuery, NewDayOutcome, NewDayPreview, Profile,
    StreakBonusRule, Task, TaskInput, TaskPatch,
};

pub use local::LocalStore;
pub use remote::RemoteStore;

/// Input for replacing a daily's streak bonus rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakRuleInput {
    pub streak_goal: u32,
    pub bonus_percent: Amount,
}

/// The operation set both storage backends implement identically.
///
/// Every task, log, and rule operation is scoped by `profile_id`; an id
/// from another profile behaves exactly like a missing one. Reads return
/// owned values, so callers can never mutate backend state out-of-band.
pub trait Repository: Send {
    // Profiles
    fn fetch_profiles(&self) -> Result<Vec<Profile>>;
    fn create_profile(&self, name: &str) -> Result<Profile>;
    /// Blocked when `id` is the last remaining profile.
    fn delete_profile(&self, id: Uuid) -> Result<()>;

    // Tasks
    fn fetch_tasks(&self, profile_id: Uuid) -> Result<Vec<Task>>;
    fn create_task(&self, input: TaskInput) -> Result<Task>;
    fn update_task(&self, id: Uuid, profile_id: Uuid, patch: TaskPatch) -> Result<Task>;
    fn delete_task(&self, id: Uuid, profile_id: Uuid) -> Result<()>;

    // Task actions (atomic: task + balance + log, all or nothing)
    fn habit_increment(&self, id: Uuid, profile_id: Uuid, by: Option<Amount>) -> Result<Task>;
    fn daily_complete(&self, id: Uuid, profile_id: Uuid) -> Result<Task>;
    fn todo_complete(&self, id: Uuid, profile_id: Uuid) -> Result<Task>;
    fn reward_claim(&self, id: Uuid, profile_id: Uuid) -> Result<Task>;

    // Logs, newest-first; limit clamped to [1, 500]
    fn fetch_logs(&self, profile_id: Uuid, query: &LogQuery) -> Result<Vec<LogEntry>>;

    // Streak bonus rules
    fn fetch_streak_rules(&self, profile_id: Uuid, task_id: Uuid) -> Result<Vec<StreakBonusRule>>;
    /// Full replace: delete-all-then-insert.
    fn replace_streak_rules(
        &self,
        profile_id: Uuid,
        task_id: Uuid,
        rules: Vec<StreakRuleInput>,
    ) -> Result<()>;

    // New-day rollover
    fn new_day_preview(&self, profile_id: Uuid) -> Result<NewDayPreview>;
    fn new_day_start(&self, profile_id: Uuid, checked_ids: &[Uuid]) -> Result<NewDayOutcome>;

    // Activity duration logs
    fn create_duration_log(&self, input: DurationLogInput) -> Result<LogEntry>;
    /// Fire-and-forget variant for timer flushes and page teardown.
    /// Failures are logged and swallowed; they must never block the caller.
    fn queue_duration_log(&self, input: DurationLogInput);
}

/// Resolve the configured backend into one concrete repository.
pub fn open(config: &Config) -> Result<Box<dyn Repository>> {
    match config.backend {
        Backend::Local => {
            let store = LocalStore::open(&Config::database_path())?;
            store.migrate()?;
            Ok(Box::new(store))
        }
        Backend::Remote => Ok(Box::new(RemoteStore::new(config.remote.clone())?)),
    }
}
