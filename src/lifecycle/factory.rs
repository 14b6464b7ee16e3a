use crate::error::Result;
use crate::model::Sprint;
use crate::storage::SprintStore;
use crate::validation;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME_PREFIX: &str = "Sprint";

/// Everything needed to create a sprint. A missing name is auto-numbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSpec {
    pub project: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default)]
    pub capacity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
}

impl SprintSpec {
    pub fn new(project: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            project: project.into(),
            name: None,
            start_date,
            end_date,
            capacity: 0.0,
            goal: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_project(&self.project)?;
        if let Some(name) = &self.name {
            validation::validate_sprint_name(name)?;
        }
        validation::validate_date_range(self.start_date, self.end_date)?;
        validation::validate_capacity(self.capacity)?;
        if let Some(goal) = &self.goal {
            validation::validate_body(goal)?;
        }
        Ok(())
    }
}

/// Creates sprints in planning status.
pub struct SprintFactory<'a> {
    sprints: &'a dyn SprintStore,
    name_prefix: &'a str,
}

impl<'a> SprintFactory<'a> {
    pub fn new(sprints: &'a dyn SprintStore, name_prefix: &'a str) -> Self {
        Self {
            sprints,
            name_prefix,
        }
    }

    pub fn create(&self, spec: &SprintSpec) -> Result<Sprint> {
        spec.validate()?;

        let name = match &spec.name {
            Some(name) => name.trim().to_string(),
            None => {
                let existing = self.sprints.list_sprints(Some(&spec.project))?;
                next_sprint_name(&existing, self.name_prefix)
            }
        };

        let id = self.sprints.next_sprint_id()?;
        let sprint = Sprint::new(id, spec.project.clone(), name, spec.start_date, spec.end_date)
            .with_capacity(spec.capacity)
            .with_goal(spec.goal.clone().unwrap_or_default());

        let sprint = self.sprints.insert_sprint(&sprint)?;
        tracing::info!(
            sprint = %sprint.id,
            name = %sprint.name,
            project = %sprint.project,
            "Created sprint"
        );
        Ok(sprint)
    }
}

/// Next name in the "<prefix> <n>" sequence.
///
/// Uses the highest number already taken; when no sprint follows the pattern,
/// falls back to the sprint count plus one.
pub fn next_sprint_name(existing: &[Sprint], prefix: &str) -> String {
    let pattern = format!(r"^{}\s+(\d+)$", regex::escape(prefix));
    let highest = Regex::new(&pattern).ok().and_then(|re| {
        existing
            .iter()
            .filter_map(|s| re.captures(s.name.trim()))
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
            .max()
    });

    let next = match highest {
        Some(n) => n + 1,
        None => existing.len() as u64 + 1,
    };
    format!("{} {}", prefix, next)
}
