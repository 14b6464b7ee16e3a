use crate::cli::TaskAction;
use crate::lifecycle::NewTask;
use crate::model::{Task, TaskStatus};
use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use super::utils::{format_task_status, print_json, print_task, print_task_list};

pub fn handle_task(ctx: &CommandContext, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::Create {
            title,
            project,
            sprint,
            status,
            points,
            description,
            subtask,
            json,
        } => {
            let input = NewTask {
                title,
                project: project.unwrap_or_else(|| ctx.config.sprints.project.clone()),
                status: status.map(|s| s.parse::<TaskStatus>()).transpose()?,
                sprint,
                story_points: points,
                description,
                subtasks: subtask,
            };
            let task = ctx.service.create_task(&input)?;
            if json {
                print_json(&task)
            } else {
                let place = task.sprint.as_deref().unwrap_or("backlog");
                println!("{} {} in {}", "Created".green(), task.id.cyan(), place);
                Ok(())
            }
        }
        TaskAction::List {
            sprint,
            backlog,
            archived,
            json,
        } => {
            let mut tasks = match (&sprint, backlog) {
                (Some(sprint_id), _) => ctx.service.sprint_tasks(sprint_id)?,
                (None, true) => ctx.service.backlog()?,
                (None, false) => ctx.service.list_tasks()?,
            };
            if !archived {
                tasks.retain(|t| !t.archived);
            }
            if json {
                print_json(&tasks)
            } else {
                print_task_list(&tasks);
                Ok(())
            }
        }
        TaskAction::Show { id, json } => {
            let task = ctx.service.get_task(&id)?;
            if json {
                print_json(&task)
            } else {
                print_task(&task);
                Ok(())
            }
        }
        TaskAction::Status { id, status, json } => {
            let task = ctx.service.set_task_status(&id, status.parse()?)?;
            report(&task, json, |t| {
                format!("{} is now {}", t.id.cyan(), format_task_status(&t.status))
            })
        }
        TaskAction::Assign { id, sprint, json } => {
            let task = ctx.service.assign_task(&id, &sprint)?;
            report(&task, json, |t| {
                format!("{} {} -> {}", "Assigned".green(), t.id.cyan(), sprint.cyan())
            })
        }
        TaskAction::Archive { id, json } => {
            let task = ctx.service.archive_task(&id)?;
            report(&task, json, |t| format!("{} {}", "Archived".yellow(), t.id.cyan()))
        }
        TaskAction::SubtaskAdd { id, title, json } => {
            let task = ctx.service.add_subtask(&id, &title)?;
            report(&task, json, |t| {
                format!(
                    "{} subtask {} to {}",
                    "Added".green(),
                    t.subtasks.len(),
                    t.id.cyan()
                )
            })
        }
        TaskAction::SubtaskStatus {
            id,
            index,
            status,
            json,
        } => {
            if index == 0 {
                anyhow::bail!("Subtask positions start at 1");
            }
            let task = ctx
                .service
                .set_subtask_status(&id, index - 1, status.parse()?)?;
            report(&task, json, |t| {
                format!(
                    "Subtask {} of {} is now {}",
                    index,
                    t.id.cyan(),
                    format_task_status(&t.subtasks[index - 1].status)
                )
            })
        }
    }
}

fn report(task: &Task, json: bool, message: impl FnOnce(&Task) -> String) -> Result<()> {
    if json {
        print_json(task)
    } else {
        println!("{}", message(task));
        Ok(())
    }
}
