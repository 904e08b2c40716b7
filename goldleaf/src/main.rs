//! goldleaf - personal task and habit tracker with a gold economy
//!
//! Thin CLI over the repository contract in goldleaf-core. The same
//! commands work against the local SQLite database or a remote goldleaf
//! server, chosen by the `backend` key in the config file.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/goldleaf/goldleaf.db (~/.local/share/goldleaf/goldleaf.db)
//! - Logs: $XDG_STATE_HOME/goldleaf/goldleaf.log (~/.local/state/goldleaf/goldleaf.log)
//! - Config: $XDG_CONFIG_HOME/goldleaf/config.toml (~/.config/goldleaf/config.toml)

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use goldleaf_core::store::{self, Repository, StreakRuleInput};
use goldleaf_core::types::{
    format_duration_secs, parse_duration_secs, Amount, Cadence, DurationLogInput, LogQuery,
    LogType, RepeatCadence, TaskInput, TaskPatch, TaskType,
};
use goldleaf_core::Config;

#[derive(Parser)]
#[command(name = "goldleaf")]
#[command(about = "Personal task and habit tracker with a gold economy")]
#[command(version)]
struct Args {
    /// Config file path (defaults to $XDG_CONFIG_HOME/goldleaf/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage profiles
    Profiles {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Perform a task's action: increment a habit, complete a daily or
    /// todo, claim a reward
    Do {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Task id
        task: Uuid,
        /// Habit counter increment, e.g. "2.00" (habits only)
        #[arg(long)]
        by: Option<String>,
    },
    /// Replace a daily's streak bonus rules
    Rules {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Daily task id
        task: Uuid,
        /// Rules as GOAL:PERCENT pairs, e.g. "7:25.00" (empty clears all)
        rules: Vec<String>,
    },
    /// Show the audit log, newest first
    Log {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Max entries (1-500)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Filter by log type (e.g. daily_completed)
        #[arg(long = "type")]
        log_type: Option<LogType>,
        /// Filter by task id
        #[arg(long)]
        task: Option<Uuid>,
        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Review and acknowledge missed daily periods
    NewDay {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Apply the acknowledgments instead of only previewing
        #[arg(long)]
        apply: bool,
        /// Restrict --apply to these task ids (default: all eligible)
        tasks: Vec<Uuid>,
    },
    /// Record a finished activity duration
    Track {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Activity title
        #[arg(short, long)]
        title: String,
        /// Duration as H:MM:SS
        #[arg(short, long)]
        duration: String,
        /// Daily this activity counts toward
        #[arg(long)]
        task: Option<Uuid>,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// List profiles with balances
    List,
    /// Create a profile
    Add { name: String },
    /// Delete a profile and everything it owns
    Remove { id: Uuid },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// List a profile's tasks
    List {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Filter by task type
        #[arg(long = "type")]
        task_type: Option<TaskType>,
    },
    /// Create a task
    Add {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Task type: habit, daily, todo, or reward
        #[arg(long = "type")]
        task_type: TaskType,
        /// Title
        #[arg(short, long)]
        title: String,
        /// Gold earned per action (negative cost for rewards), e.g. "1.50"
        #[arg(short, long, default_value = "0")]
        gold: String,
        /// Notes
        #[arg(long, default_value = "")]
        notes: String,
        /// Daily repeat cadence: day, week, month, or year
        #[arg(long)]
        cadence: Option<RepeatCadence>,
        /// Repeat every N cadence units
        #[arg(long)]
        every: Option<u32>,
        /// Daily streak goal
        #[arg(long)]
        streak_goal: Option<u32>,
        /// Timer threshold for daily auto-completion, as H:MM:SS
        #[arg(long)]
        autocomplete_after: Option<String>,
        /// Habit counter increment per action, e.g. "1.00"
        #[arg(long)]
        increment: Option<String>,
        /// Habit counter reset cadence: never, day, week, month, or year
        #[arg(long)]
        reset_cadence: Option<Cadence>,
        /// Reward can be claimed repeatedly
        #[arg(long)]
        repeatable: bool,
    },
    /// Rename a task
    Rename {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Task id
        id: Uuid,
        /// New title
        title: String,
    },
    /// Delete a task (its log history survives)
    Remove {
        /// Profile id
        #[arg(short, long)]
        profile: Uuid,
        /// Task id
        id: Uuid,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    let _log_guard =
        goldleaf_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("goldleaf starting");

    let repo = store::open(&config).context("failed to open storage backend")?;

    match args.command {
        Command::Profiles { command } => run_profiles(repo.as_ref(), command),
        Command::Tasks { command } => run_tasks(repo.as_ref(), command),
        Command::Do { profile, task, by } => run_do(repo.as_ref(), profile, task, by),
        Command::Rules {
            profile,
            task,
            rules,
        } => run_rules(repo.as_ref(), profile, task, &rules),
        Command::Log {
            profile,
            limit,
            log_type,
            task,
            from,
            to,
        } => run_log(repo.as_ref(), profile, limit, log_type, task, from, to),
        Command::NewDay {
            profile,
            apply,
            tasks,
        } => run_new_day(repo.as_ref(), profile, apply, &tasks),
        Command::Track {
            profile,
            title,
            duration,
            task,
        } => run_track(repo.as_ref(), profile, &title, &duration, task),
    }
}

fn run_profiles(repo: &dyn Repository, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::List => {
            let profiles = repo.fetch_profiles().context("failed to list profiles")?;
            if profiles.is_empty() {
                println!("No profiles. Create one with: goldleaf profiles add <name>");
                return Ok(());
            }
            for profile in profiles {
                println!("{}  {}  {} gold", profile.id, profile.name, profile.gold_balance);
            }
        }
        ProfileCommand::Add { name } => {
            let profile = repo
                .create_profile(&name)
                .context("failed to create profile")?;
            println!("Created profile {} ({})", profile.name, profile.id);
        }
        ProfileCommand::Remove { id } => {
            repo.delete_profile(id).context("failed to delete profile")?;
            println!("Deleted profile {}", id);
        }
    }
    Ok(())
}

fn run_tasks(repo: &dyn Repository, command: TaskCommand) -> Result<()> {
    match command {
        TaskCommand::List { profile, task_type } => {
            let tasks = repo.fetch_tasks(profile).context("failed to list tasks")?;
            let tasks: Vec<_> = tasks
                .into_iter()
                .filter(|t| task_type.map_or(true, |ty| t.task_type == ty))
                .collect();
            if tasks.is_empty() {
                println!("No tasks.");
                return Ok(());
            }
            for task in tasks {
                let detail = match task.task_type {
                    TaskType::Habit => format!("count {}", task.current_count),
                    TaskType::Daily => format!(
                        "streak {} (best {}), every {} {}",
                        task.current_streak,
                        task.best_streak,
                        task.repeat_every,
                        task.repeat_cadence.map(|c| c.as_str()).unwrap_or("?"),
                    ),
                    TaskType::Todo => {
                        if task.is_done {
                            "done".to_string()
                        } else {
                            "open".to_string()
                        }
                    }
                    TaskType::Reward => format!("claimed {} time(s)", task.claim_count),
                };
                println!(
                    "{}  [{}] {}  {} gold  ({})",
                    task.id, task.task_type, task.title, task.gold_delta, detail
                );
            }
        }
        TaskCommand::Add {
            profile,
            task_type,
            title,
            gold,
            notes,
            cadence,
            every,
            streak_goal,
            autocomplete_after,
            increment,
            reset_cadence,
            repeatable,
        } => {
            let input = TaskInput {
                profile_id: profile,
                task_type,
                title,
                notes,
                is_hidden: false,
                tag_ids: vec![],
                gold_delta: Amount::parse("gold", &gold)?,
                count_increment: increment
                    .map(|s| Amount::parse("increment", &s))
                    .transpose()?,
                count_reset_cadence: reset_cadence,
                repeat_cadence: cadence,
                repeat_every: every,
                streak_goal,
                autocomplete_time_threshold: autocomplete_after,
                due_at: None,
                is_repeatable: if repeatable { Some(true) } else { None },
            };
            let task = repo.create_task(input).context("failed to create task")?;
            println!("Created {} \"{}\" ({})", task.task_type, task.title, task.id);
        }
        TaskCommand::Rename { profile, id, title } => {
            let task = repo
                .update_task(
                    id,
                    profile,
                    TaskPatch {
                        title: Some(title),
                        ..Default::default()
                    },
                )
                .context("failed to update task")?;
            println!("Renamed task {} to \"{}\"", task.id, task.title);
        }
        TaskCommand::Remove { profile, id } => {
            repo.delete_task(id, profile).context("failed to delete task")?;
            println!("Deleted task {}", id);
        }
    }
    Ok(())
}

/// Dispatch on the task's type so one command covers all four actions.
fn run_do(repo: &dyn Repository, profile: Uuid, task_id: Uuid, by: Option<String>) -> Result<()> {
    let tasks = repo.fetch_tasks(profile).context("failed to fetch tasks")?;
    let task = tasks
        .iter()
        .find(|t| t.id == task_id)
        .with_context(|| format!("task {} not found", task_id))?;

    if by.is_some() && task.task_type != TaskType::Habit {
        bail!("--by only applies to habits");
    }

    let task = match task.task_type {
        TaskType::Habit => {
            let by = by.map(|s| Amount::parse("by", &s)).transpose()?;
            repo.habit_increment(task_id, profile, by)
                .context("failed to increment habit")?
        }
        TaskType::Daily => repo
            .daily_complete(task_id, profile)
            .context("failed to complete daily")?,
        TaskType::Todo => repo
            .todo_complete(task_id, profile)
            .context("failed to complete todo")?,
        TaskType::Reward => repo
            .reward_claim(task_id, profile)
            .context("failed to claim reward")?,
    };

    let balance = repo
        .fetch_profiles()
        .context("failed to fetch profiles")?
        .into_iter()
        .find(|p| p.id == profile)
        .map(|p| p.gold_balance)
        .unwrap_or(Amount::ZERO);

    match task.task_type {
        TaskType::Habit => println!(
            "\"{}\" count {} -> balance {} gold",
            task.title, task.current_count, balance
        ),
        TaskType::Daily => println!(
            "\"{}\" streak {} -> balance {} gold",
            task.title, task.current_streak, balance
        ),
        TaskType::Todo => println!("\"{}\" done -> balance {} gold", task.title, balance),
        TaskType::Reward => println!("\"{}\" claimed -> balance {} gold", task.title, balance),
    }
    Ok(())
}

fn run_rules(repo: &dyn Repository, profile: Uuid, task: Uuid, rules: &[String]) -> Result<()> {
    let rules = rules
        .iter()
        .map(|spec| parse_rule_spec(spec))
        .collect::<Result<Vec<_>>>()?;
    let count = rules.len();
    repo.replace_streak_rules(profile, task, rules)
        .context("failed to replace streak rules")?;
    println!("Set {} rule(s) on task {}", count, task);
    Ok(())
}

/// Parse "GOAL:PERCENT", e.g. "7:25.00" for +25% at a 7-streak.
fn parse_rule_spec(spec: &str) -> Result<StreakRuleInput> {
    let (goal, percent) = spec
        .split_once(':')
        .with_context(|| format!("expected GOAL:PERCENT, got {:?}", spec))?;
    Ok(StreakRuleInput {
        streak_goal: goal
            .parse()
            .with_context(|| format!("invalid streak goal {:?}", goal))?,
        bonus_percent: Amount::parse("bonus_percent", percent)?,
    })
}

fn run_log(
    repo: &dyn Repository,
    profile: Uuid,
    limit: Option<usize>,
    log_type: Option<LogType>,
    task: Option<Uuid>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let query = LogQuery {
        limit,
        from_date: from,
        to_date: to,
        log_type,
        task_id: task,
    };
    let logs = repo.fetch_logs(profile, &query).context("failed to fetch logs")?;
    if logs.is_empty() {
        println!("No log entries.");
        return Ok(());
    }
    for entry in logs {
        let when = entry.timestamp.with_timezone(&chrono::Local);
        let extra = match entry.log_type {
            LogType::ActivityDuration => entry
                .duration_secs
                .map(format_duration_secs)
                .unwrap_or_default(),
            _ if entry.gold_delta.is_negative() => entry.gold_delta.to_string(),
            _ => format!("+{}", entry.gold_delta),
        };
        println!(
            "{}  {:<18} {:<30} {:>10}  balance {}",
            when.format("%Y-%m-%d %H:%M"),
            entry.log_type.as_str(),
            entry.title_snapshot,
            extra,
            entry.user_gold,
        );
    }
    Ok(())
}

fn run_new_day(repo: &dyn Repository, profile: Uuid, apply: bool, tasks: &[Uuid]) -> Result<()> {
    let preview = repo
        .new_day_preview(profile)
        .context("failed to compute new-day preview")?;
    if preview.dailies.is_empty() {
        println!("No missed daily periods.");
        return Ok(());
    }

    println!("Missed previous periods:");
    for item in &preview.dailies {
        println!(
            "  {}  \"{}\"  period {}  streak {} (best {})",
            item.id, item.title, item.previous_period_start, item.current_streak, item.best_streak
        );
    }

    if !apply {
        println!("\nRun with --apply to acknowledge these periods.");
        return Ok(());
    }

    let checked: Vec<Uuid> = if tasks.is_empty() {
        preview.dailies.iter().map(|item| item.id).collect()
    } else {
        tasks.to_vec()
    };
    let outcome = repo
        .new_day_start(profile, &checked)
        .context("failed to apply new-day rollover")?;
    println!("\nAcknowledged {} daily period(s).", outcome.updated_count);
    Ok(())
}

fn run_track(
    repo: &dyn Repository,
    profile: Uuid,
    title: &str,
    duration: &str,
    task: Option<Uuid>,
) -> Result<()> {
    let duration_secs = parse_duration_secs("duration", duration)?;
    let entry = repo
        .create_duration_log(DurationLogInput {
            profile_id: profile,
            title: title.to_string(),
            duration_secs,
            timestamp: Utc::now(),
            task_id: task,
            reward_id: None,
        })
        .context("failed to record activity")?;
    println!(
        "Recorded {} of \"{}\"",
        format_duration_secs(duration_secs),
        entry.title_snapshot
    );
    Ok(())
}
