use crate::cli::{SprintAction, SprintSpecArgs};
use crate::lifecycle::{MigrationPlan, MigrationTarget, SprintSpec};
use crate::model::{Sprint, SprintStatus};
use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use colored::Colorize;
use serde_json::json;

use super::CommandContext;
use super::utils::{
    format_sprint_status, print_completion, print_incomplete, print_json, print_migration,
    print_sprint, print_sprint_list, print_task_list,
};

pub fn handle_sprint(ctx: &CommandContext, action: SprintAction) -> Result<()> {
    match action {
        SprintAction::Create { spec, json } => create(ctx, spec, json),
        SprintAction::List {
            project,
            status,
            json,
        } => list(ctx, project, status.map(Into::into), json),
        SprintAction::Show { id, json } => show(ctx, &id, json),
        SprintAction::Start { id, json } => {
            let sprint = ctx.service.start_sprint(&id)?;
            report_transition(&sprint, "Started", json)
        }
        SprintAction::Cancel { id, json } => {
            let sprint = ctx.service.cancel_sprint(&id)?;
            report_transition(&sprint, "Cancelled", json)
        }
        SprintAction::Incomplete { id, json } => {
            let tasks = ctx.service.get_incomplete_tasks(&id)?;
            if json {
                print_json(&tasks)
            } else {
                print_incomplete(&tasks);
                Ok(())
            }
        }
        SprintAction::Complete {
            id,
            selected,
            target,
            new_sprint_name,
            new_auto_name,
            new_start,
            new_end,
            new_capacity,
            json,
        } => {
            let new_sprint = if new_sprint_name.is_some()
                || new_auto_name
                || new_start.is_some()
                || new_end.is_some()
                || new_capacity.is_some()
            {
                let closing = ctx.service.get_sprint(&id)?;
                Some(follow_up_spec(
                    ctx,
                    &closing,
                    SprintSpecArgs {
                        name: new_sprint_name,
                        project: None,
                        start: new_start,
                        end: new_end,
                        capacity: new_capacity,
                        goal: None,
                    },
                )?)
            } else {
                None
            };

            let plan = MigrationPlan {
                selected_task_ids: selected.into_iter().collect(),
                target_sprint_id: target,
                new_sprint,
            };
            let report = ctx.service.complete_sprint(&id, Some(&plan))?;

            if json {
                print_json(&report)
            } else {
                print_completion(&report);
                Ok(())
            }
        }
        SprintAction::Migrate { from, ids, to, json } => {
            let target = match to {
                Some(sprint) => MigrationTarget::Sprint(sprint),
                None => MigrationTarget::Backlog,
            };
            let summary = ctx.service.migrate_tasks(&from, &ids, &target)?;
            if json {
                print_json(&summary)
            } else {
                print_migration(&summary);
                Ok(())
            }
        }
    }
}

fn create(ctx: &CommandContext, args: SprintSpecArgs, json: bool) -> Result<()> {
    let start = args.start.unwrap_or_else(|| Local::now().date_naive());
    let spec = spec_from_args(ctx, args, start)?;
    let sprint = ctx.service.create_sprint(&spec)?;

    if json {
        print_json(&sprint)
    } else {
        println!(
            "{} {} {} ({} .. {})",
            "Created".green(),
            sprint.id.cyan(),
            sprint.name,
            sprint.start_date,
            sprint.end_date
        );
        Ok(())
    }
}

/// Spec for the sprint that receives carried-over work. Dates default to the
/// day after the closing sprint ends.
fn follow_up_spec(ctx: &CommandContext, closing: &Sprint, args: SprintSpecArgs) -> Result<SprintSpec> {
    let start = match args.start {
        Some(start) => start,
        None => closing
            .end_date
            .checked_add_days(Days::new(1))
            .context("Sprint end date is out of range")?,
    };
    let mut spec = spec_from_args(ctx, args, start)?;
    spec.project = closing.project.clone();
    Ok(spec)
}

fn spec_from_args(ctx: &CommandContext, args: SprintSpecArgs, start: NaiveDate) -> Result<SprintSpec> {
    let settings = &ctx.config.sprints;
    let end = match args.end {
        Some(end) => end,
        None => default_end(start, settings.default_length_days)?,
    };

    let mut spec = SprintSpec::new(
        args.project.unwrap_or_else(|| settings.project.clone()),
        start,
        end,
    )
    .with_capacity(args.capacity.unwrap_or(settings.default_capacity));
    if let Some(name) = args.name {
        spec = spec.with_name(name);
    }
    if let Some(goal) = args.goal {
        spec = spec.with_goal(goal);
    }
    Ok(spec)
}

fn default_end(start: NaiveDate, length_days: i64) -> Result<NaiveDate> {
    let offset = u64::try_from(length_days.max(1) - 1).unwrap_or(0);
    start
        .checked_add_days(Days::new(offset))
        .context("Sprint end date is out of range")
}

fn list(
    ctx: &CommandContext,
    project: Option<String>,
    status: Option<SprintStatus>,
    json: bool,
) -> Result<()> {
    let mut sprints = ctx.service.list_sprints(project.as_deref())?;
    if let Some(status) = status {
        sprints.retain(|s| s.status == status);
    }

    if json {
        print_json(&sprints)
    } else {
        print_sprint_list(&sprints);
        Ok(())
    }
}

fn show(ctx: &CommandContext, id: &str, json: bool) -> Result<()> {
    let sprint = ctx.service.get_sprint(id)?;
    let progress = ctx.service.progress(id)?;
    let tasks = ctx.service.sprint_tasks(id)?;

    if json {
        print_json(&json!({
            "sprint": sprint,
            "progress": progress,
            "tasks": tasks,
        }))
    } else {
        print_sprint(&sprint, Some(&progress));
        println!();
        print_task_list(&tasks);
        Ok(())
    }
}

fn report_transition(sprint: &Sprint, verb: &str, json: bool) -> Result<()> {
    if json {
        print_json(sprint)
    } else {
        println!(
            "{} {} is now {}",
            verb.green(),
            sprint.id.cyan(),
            format_sprint_status(sprint.status)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_end_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(
            default_end(start, 14).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
        );
        assert_eq!(default_end(start, 0).unwrap(), start);
    }
}
