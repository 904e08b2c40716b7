//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//! Money and counter columns store whole cents as INTEGERs; dates and
//! timestamps store ISO-8601 TEXT.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL UNIQUE,
        gold_balance     INTEGER NOT NULL DEFAULT 0,
        created_at       TEXT NOT NULL
    );

    -- Single-table union of habit / daily / todo / reward. The task_type
    -- tag decides which variant columns are meaningful; the rest stay at
    -- their defaults.
    CREATE TABLE IF NOT EXISTS tasks (
        id               TEXT PRIMARY KEY,
        profile_id       TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        task_type        TEXT NOT NULL,
        title            TEXT NOT NULL,
        notes            TEXT NOT NULL DEFAULT '',
        is_hidden        INTEGER NOT NULL DEFAULT 0,
        tag_ids          JSON NOT NULL DEFAULT '[]',
        gold_delta       INTEGER NOT NULL DEFAULT 0,
        created_at       TEXT NOT NULL,
        updated_at       TEXT NOT NULL,
        last_action_at   TEXT,
        total_actions_count INTEGER NOT NULL DEFAULT 0,

        -- Habit
        current_count    INTEGER NOT NULL DEFAULT 0,
        count_increment  INTEGER NOT NULL DEFAULT 100,
        count_reset_cadence TEXT,

        -- Daily
        repeat_cadence   TEXT,
        repeat_every     INTEGER NOT NULL DEFAULT 1,
        current_streak   INTEGER NOT NULL DEFAULT 0,
        best_streak      INTEGER NOT NULL DEFAULT 0,
        streak_goal      INTEGER NOT NULL DEFAULT 0,
        last_completion_period TEXT,
        autocomplete_time_threshold INTEGER,

        -- Todo
        due_at           TEXT,
        is_done          INTEGER NOT NULL DEFAULT 0,
        completed_at     TEXT,

        -- Reward
        is_repeatable    INTEGER NOT NULL DEFAULT 0,
        is_claimed       INTEGER NOT NULL DEFAULT 0,
        claimed_at       TEXT,
        claim_count      INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS streak_bonus_rules (
        id               TEXT PRIMARY KEY,
        task_id          TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        streak_goal      INTEGER NOT NULL,
        bonus_percent    INTEGER NOT NULL DEFAULT 0,
        created_at       TEXT NOT NULL,

        UNIQUE(task_id, streak_goal)
    );

    -- Append-only audit log. Task references are severed (not cascaded)
    -- on task deletion so history survives; profile deletion cascades.
    CREATE TABLE IF NOT EXISTS log_entries (
        id               TEXT PRIMARY KEY,
        profile_id       TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        timestamp        TEXT NOT NULL,
        created_at       TEXT NOT NULL,
        log_type         TEXT NOT NULL,
        task_id          TEXT REFERENCES tasks(id) ON DELETE SET NULL,
        reward_id        TEXT REFERENCES tasks(id) ON DELETE SET NULL,
        gold_delta       INTEGER NOT NULL DEFAULT 0,
        user_gold        INTEGER NOT NULL DEFAULT 0,
        count_delta      INTEGER,
        duration_secs    INTEGER,
        title_snapshot   TEXT NOT NULL DEFAULT ''
    );

    CREATE INDEX IF NOT EXISTS idx_tasks_profile_type ON tasks(profile_id, task_type, is_hidden);
    CREATE INDEX IF NOT EXISTS idx_tasks_profile_created ON tasks(profile_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_rules_task_goal ON streak_bonus_rules(task_id, streak_goal);
    CREATE INDEX IF NOT EXISTS idx_logs_profile_ts ON log_entries(profile_id, timestamp DESC);
    CREATE INDEX IF NOT EXISTS idx_logs_profile_type_ts ON log_entries(profile_id, log_type, timestamp DESC);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
