use std::io::Write;

use anyhow::{Context, Result};
use tasklist_app::{IgnoreReason, IntentOutcome, TaskIntents};
use tasklist_core::TaskId;
use tasklist_store::TreeStore;

use crate::Command;
use crate::render;

/// Dispatch one CLI command and print its outcome to `out`.
pub async fn run<S, W>(command: Command, intents: &TaskIntents<S>, out: &mut W) -> Result<()>
where
    S: TreeStore,
    W: Write + Send,
{
    match command {
        Command::Add { text } => {
            let outcome = intents.add_task(&text).await.context("failed to add task")?;
            report(out, &outcome, None)
        }
        Command::Check { id } => toggle(intents, out, &id, true).await,
        Command::Uncheck { id } => toggle(intents, out, &id, false).await,
        Command::Rm { id } => {
            let id = parse_id(&id)?;
            let outcome = intents
                .delete_task(&id)
                .await
                .with_context(|| format!("failed to delete task {id}"))?;
            report(out, &outcome, Some(&id))
        }
        Command::Ls { json } => {
            let view = intents.repository().view();
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&view.tasks)?)?;
            } else {
                render::write_list(out, &view)?;
            }
            Ok(())
        }
        Command::Stats { json } => {
            let view = intents.repository().view();
            if json {
                let mut stats = serde_json::to_value(&view)?;
                if let Some(fields) = stats.as_object_mut() {
                    fields.remove("tasks");
                }
                writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
            } else {
                render::write_stats(out, &view)?;
            }
            Ok(())
        }
    }
}

async fn toggle<S, W>(intents: &TaskIntents<S>, out: &mut W, raw: &str, checked: bool) -> Result<()>
where
    S: TreeStore,
    W: Write + Send,
{
    let id = parse_id(raw)?;
    let outcome = intents
        .toggle_task(&id, checked)
        .await
        .with_context(|| format!("failed to update task {id}"))?;
    report(out, &outcome, Some(&id))
}

fn parse_id(raw: &str) -> Result<TaskId> {
    raw.trim()
        .parse()
        .with_context(|| format!("invalid task id '{raw}'"))
}

fn report(out: &mut impl Write, outcome: &IntentOutcome, target: Option<&TaskId>) -> Result<()> {
    let target = target.map_or_else(String::new, |id| format!(" {id}"));
    match outcome {
        IntentOutcome::Added(id) => writeln!(out, "created task: {id}")?,
        IntentOutcome::Updated => writeln!(out, "updated task:{target}")?,
        IntentOutcome::Archived => writeln!(out, "archived task:{target}")?,
        IntentOutcome::Ignored(IgnoreReason::EmptyText) => {
            writeln!(out, "nothing added: task text is empty")?;
        }
        IntentOutcome::Ignored(IgnoreReason::VanishedTask) => {
            writeln!(out, "no such task:{target}")?;
        }
        IntentOutcome::Ignored(IgnoreReason::PendingCreation) => {
            writeln!(out, "task{target} is still being created")?;
        }
    }
    Ok(())
}
