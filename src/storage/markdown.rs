use crate::error::{Result, SprintError};
use crate::model::{Sprint, Task};
use serde::{Serialize, de::DeserializeOwned};

const YAML_DELIMITER: &str = "---";
const TOML_DELIMITER: &str = "+++";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontmatterFormat {
    #[default]
    Toml,
    Yaml,
}

impl FrontmatterFormat {
    fn delimiter(self) -> &'static str {
        match self {
            FrontmatterFormat::Toml => TOML_DELIMITER,
            FrontmatterFormat::Yaml => YAML_DELIMITER,
        }
    }
}

/// An aggregate persisted as frontmatter plus a free-text markdown body.
pub trait Document: Serialize + DeserializeOwned {
    fn body(&self) -> &str;
    fn set_body(&mut self, body: String);
}

impl Document for Sprint {
    fn body(&self) -> &str {
        &self.goal
    }

    fn set_body(&mut self, body: String) {
        self.goal = body;
    }
}

impl Document for Task {
    fn body(&self) -> &str {
        &self.description
    }

    fn set_body(&mut self, body: String) {
        self.description = body;
    }
}

pub fn detect_format(content: &str) -> Option<FrontmatterFormat> {
    let content = content.trim_start();
    if content.starts_with(TOML_DELIMITER) {
        Some(FrontmatterFormat::Toml)
    } else if content.starts_with(YAML_DELIMITER) {
        Some(FrontmatterFormat::Yaml)
    } else {
        None
    }
}

pub fn parse_document<T: Document>(content: &str) -> Result<T> {
    let content = content.trim();
    let format = detect_format(content)
        .ok_or_else(|| SprintError::Parse("Missing frontmatter delimiter".to_string()))?;
    let delimiter = format.delimiter();

    let after_first = &content[delimiter.len()..];
    let end_index = after_first
        .find(&format!("\n{}", delimiter))
        .ok_or_else(|| SprintError::Parse("Missing closing frontmatter delimiter".to_string()))?;

    let frontmatter = after_first[..end_index].trim();
    let body_start = end_index + 1 + delimiter.len();
    let body = after_first[body_start..].trim().to_string();

    let mut doc: T = match format {
        FrontmatterFormat::Toml => toml::from_str(frontmatter)?,
        FrontmatterFormat::Yaml => serde_yaml::from_str(frontmatter)?,
    };
    doc.set_body(body);

    Ok(doc)
}

pub fn render_document<T: Document>(doc: &T, format: FrontmatterFormat) -> Result<String> {
    let frontmatter = match format {
        FrontmatterFormat::Toml => toml::to_string(doc)?,
        FrontmatterFormat::Yaml => serde_yaml::to_string(doc)?,
    };
    let delimiter = format.delimiter();

    let mut output = String::new();
    output.push_str(delimiter);
    output.push('\n');
    output.push_str(frontmatter.trim());
    output.push('\n');
    output.push_str(delimiter);
    output.push('\n');

    if !doc.body().is_empty() {
        output.push('\n');
        output.push_str(doc.body());
        output.push('\n');
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProgressSnapshot, SprintStatus, Subtask, TaskStatus};
    use chrono::NaiveDate;

    #[test]
    fn test_parse_toml_task() {
        let content = r#"+++
id = "tk-abc12"
title = "Fix login"
project = "web"
sprint = "sp-00001"
status = "in_progress"
archived = false
moved_to_backlog = false
created = "2026-01-01T00:00:00Z"
updated = "2026-01-01T00:00:00Z"

[[subtasks]]
title = "write test"
status = "done"
is_completed = true
+++

Users get logged out on refresh.
"#;

        let task: Task = parse_document(content).unwrap();
        assert_eq!(task.id, "tk-abc12");
        assert_eq!(task.sprint.as_deref(), Some("sp-00001"));
        assert_eq!(task.status, TaskStatus::new("in_progress"));
        assert_eq!(task.subtasks.len(), 1);
        assert!(task.subtasks[0].is_completed);
        assert_eq!(task.description, "Users get logged out on refresh.");
    }

    #[test]
    fn test_parse_yaml_sprint() {
        let content = r#"---
id: sp-00002
project: web
name: Sprint 2
status: active
start_date: 2026-02-02
end_date: 2026-02-15
capacity: 40.0
created: 2026-01-20T09:00:00Z
updated: 2026-01-20T09:00:00Z
---

Ship the new checkout.
"#;

        let sprint: Sprint = parse_document(content).unwrap();
        assert_eq!(sprint.name, "Sprint 2");
        assert_eq!(sprint.status, SprintStatus::Active);
        assert_eq!(sprint.goal, "Ship the new checkout.");
    }

    #[test]
    fn test_render_completed_sprint_keeps_snapshot() {
        let mut sprint = Sprint::new(
            "sp-00003".into(),
            "web".into(),
            "Sprint 3".into(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        )
        .with_capacity(24.0)
        .with_goal("Stabilise payments".into());
        sprint.status = SprintStatus::Completed;
        sprint.snapshot = Some(ProgressSnapshot {
            tasks_completed: 4,
            total_tasks: 6,
            story_points_completed: 13,
            total_story_points: 21,
        });

        for format in [FrontmatterFormat::Toml, FrontmatterFormat::Yaml] {
            let rendered = render_document(&sprint, format).unwrap();
            assert_eq!(detect_format(&rendered), Some(format));
            let parsed: Sprint = parse_document(&rendered).unwrap();
            assert_eq!(parsed, sprint);
        }
    }

    #[test]
    fn test_render_task_with_subtasks() {
        let task = Task::new("tk-1".into(), "Checkout".into(), "web".into())
            .with_subtasks(vec![Subtask::new("cart".into(), TaskStatus::todo())]);
        let rendered = render_document(&task, FrontmatterFormat::Toml).unwrap();
        assert!(rendered.starts_with("+++\n"));
        assert!(rendered.contains("[[subtasks]]"));
        assert!(rendered.contains("title = \"Checkout\""));
    }

    #[test]
    fn test_missing_delimiter() {
        let result: Result<Task> = parse_document("id = \"tk-1\"");
        assert!(matches!(result, Err(SprintError::Parse(_))));
    }
}
