//! Text rendering of view models.

use std::io::{self, Write};

use tasklist_core::{Task, ViewModel};

const BAR_WIDTH: usize = 20;

/// One list line: checkbox, text, id.
pub fn task_line(task: &Task) -> String {
    let mark = if task.is_checked { 'x' } else { ' ' };
    format!("[{mark}] {} ({})", task.text, task.id)
}

/// `[#####---------------]` filled in proportion to a 0..=100 ratio.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn write_list(out: &mut impl Write, view: &ViewModel) -> io::Result<()> {
    if view.tasks.is_empty() {
        return writeln!(out, "No tasks");
    }
    for task in &view.tasks {
        writeln!(out, "{}", task_line(task))?;
    }
    Ok(())
}

pub fn write_stats(out: &mut impl Write, view: &ViewModel) -> io::Result<()> {
    writeln!(
        out,
        "Completed {} of {} tasks ({} remaining)",
        view.completed_count,
        view.total_count,
        view.remaining_count()
    )?;
    writeln!(
        out,
        "{} {:5.1}%",
        progress_bar(view.completion_ratio, BAR_WIDTH),
        view.completion_ratio
    )?;
    writeln!(
        out,
        "Deleted: {} (active {:.1}% / archived {:.1}%)",
        view.deleted_count, view.active_share, view.archived_share
    )
}
