use crate::lifecycle::{CompletionReport, IncompleteTask, MigrationSummary};
use crate::model::{ProgressSnapshot, Sprint, SprintStatus, Subtask, Task, TaskStatus};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format sprint status with color coding
pub fn format_sprint_status(status: SprintStatus) -> colored::ColoredString {
    match status {
        SprintStatus::Planning => "planning".blue(),
        SprintStatus::Active => "active".yellow(),
        SprintStatus::Completed => "completed".green(),
        SprintStatus::Cancelled => "cancelled".red(),
    }
}

pub fn format_task_status(status: &TaskStatus) -> colored::ColoredString {
    if status.is_complete() {
        status.as_str().green()
    } else {
        status.as_str().white()
    }
}

fn format_progress(snapshot: &ProgressSnapshot) -> String {
    format!(
        "{}/{} tasks, {}/{} points ({:.0}%)",
        snapshot.tasks_completed,
        snapshot.total_tasks,
        snapshot.story_points_completed,
        snapshot.total_story_points,
        snapshot.completion_ratio() * 100.0
    )
}

pub fn print_sprint(sprint: &Sprint, progress: Option<&ProgressSnapshot>) {
    println!("{} {}", sprint.id.cyan().bold(), sprint.name.bold());
    println!("Project:  {}", sprint.project.magenta());
    println!("Status:   {}", format_sprint_status(sprint.status));
    println!(
        "Dates:    {} .. {} ({} days)",
        sprint.start_date,
        sprint.end_date,
        sprint.duration_days()
    );
    println!("Capacity: {}h", sprint.capacity);
    if let Some(started) = sprint.actual_start {
        println!(
            "Started:  {}",
            started.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }
    if let Some(ended) = sprint.actual_end {
        println!(
            "Ended:    {}",
            ended.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }
    if let Some(progress) = progress {
        println!("Progress: {}", format_progress(progress));
    }

    if !sprint.goal.is_empty() {
        println!();
        println!("{}", sprint.goal);
    }
}

pub fn print_sprint_list(sprints: &[Sprint]) {
    if sprints.is_empty() {
        println!("No sprints found.");
        return;
    }

    for sprint in sprints {
        println!(
            "{} {} [{}] {} .. {}",
            sprint.id.cyan(),
            format_sprint_status(sprint.status),
            sprint.project.magenta(),
            sprint.start_date,
            sprint.end_date,
        );
        println!("    {}", sprint.name);
    }
}

fn print_subtasks(subtasks: &[Subtask]) {
    for (i, subtask) in subtasks.iter().enumerate() {
        let mark = if subtask.is_completed { "[x]" } else { "[ ]" };
        println!(
            "  {} {} {} ({})",
            format!("{}.", i + 1).dimmed(),
            mark,
            subtask.title,
            format_task_status(&subtask.status)
        );
    }
}

pub fn print_task(task: &Task) {
    println!("{} {}", task.id.cyan().bold(), task.title.bold());
    println!("Project:  {}", task.project.magenta());
    println!("Status:   {}", format_task_status(&task.status));
    match &task.sprint {
        Some(sprint) => println!("Sprint:   {}", sprint.cyan()),
        None => println!("Sprint:   {}", "backlog".dimmed()),
    }
    if let Some(points) = task.story_points {
        println!("Points:   {}", points);
    }
    if task.archived {
        println!("Archived: {}", "yes".yellow());
    }
    if let Some(from) = &task.moved_from_sprint {
        let to = match &task.moved_to_sprint {
            Some(to) => to.cyan().to_string(),
            None if task.moved_to_backlog => "backlog".to_string(),
            None => "-".to_string(),
        };
        println!("Moved:    {} -> {}", from.cyan(), to);
    }
    println!(
        "Updated:  {}",
        task.updated.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );

    if !task.subtasks.is_empty() {
        println!("Subtasks:");
        print_subtasks(&task.subtasks);
    }
    if !task.description.is_empty() {
        println!();
        println!("{}", task.description);
    }
}

/// Print a list of tasks (compact format)
pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    for task in tasks {
        let sprint = task
            .sprint
            .as_deref()
            .map(|s| s.cyan())
            .unwrap_or_else(|| "backlog".dimmed());
        let points = task
            .story_points
            .map(|p| format!(" ({}pt)", p))
            .unwrap_or_default();
        println!(
            "{} {} [{}] {}{}",
            task.id.cyan(),
            format_task_status(&task.status),
            sprint,
            task.title,
            points.dimmed()
        );
    }
}

pub fn print_incomplete(tasks: &[IncompleteTask]) {
    if tasks.is_empty() {
        println!("No unfinished tasks.");
        return;
    }

    for task in tasks {
        println!(
            "{} {} {}",
            task.task_id.cyan(),
            format_task_status(&task.status),
            task.title
        );
        for subtask in &task.incomplete_subtasks {
            println!("    {} {}", "[ ]".dimmed(), subtask.title.dimmed());
        }
    }
}

pub fn print_completion(report: &CompletionReport) {
    println!(
        "{} {} {}",
        "Completed".green(),
        report.sprint.id.cyan(),
        report.sprint.name
    );
    if let Some(snapshot) = &report.sprint.snapshot {
        println!("  Final:     {}", format_progress(snapshot));
    }
    if let Some(created) = &report.created_sprint {
        println!(
            "  {} {} {}",
            "Created".green(),
            created.id.cyan(),
            created.name
        );
    }
    if !report.moved_to_sprint.is_empty() {
        println!("  To sprint: {}", report.moved_to_sprint.join(", ").cyan());
    }
    if !report.moved_to_backlog.is_empty() {
        println!("  Backlog:   {}", report.moved_to_backlog.join(", ").cyan());
    }
    if !report.skipped.is_empty() {
        println!("  Skipped:   {}", report.skipped.join(", ").dimmed());
    }
    if !report.partial_failures.is_empty() {
        println!(
            "  {} {} (retry with `sprints sprint migrate {} <ids>`)",
            "Failed:".red(),
            report.partial_failures.join(", "),
            report.sprint.id
        );
    }
}

pub fn print_migration(summary: &MigrationSummary) {
    println!("{} {} task(s)", "Moved".green(), summary.moved.len());
    if !summary.skipped.is_empty() {
        println!("  Skipped: {}", summary.skipped.join(", ").dimmed());
    }
    if !summary.failed.is_empty() {
        println!("  {} {}", "Failed:".red(), summary.failed.join(", "));
    }
}
