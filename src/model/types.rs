use crate::error::{Result, SprintError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    #[default]
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl SprintStatus {
    /// Completed and cancelled sprints never change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, SprintStatus::Completed | SprintStatus::Cancelled)
    }

    /// Open sprints can still receive tasks.
    pub fn is_open(self) -> bool {
        matches!(self, SprintStatus::Planning | SprintStatus::Active)
    }

    /// The transition table. Nothing ever returns to planning.
    pub fn can_transition_to(self, next: SprintStatus) -> bool {
        matches!(
            (self, next),
            (SprintStatus::Planning, SprintStatus::Active)
                | (SprintStatus::Planning, SprintStatus::Cancelled)
                | (SprintStatus::Active, SprintStatus::Completed)
                | (SprintStatus::Active, SprintStatus::Cancelled)
        )
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SprintStatus::Planning => write!(f, "planning"),
            SprintStatus::Active => write!(f, "active"),
            SprintStatus::Completed => write!(f, "completed"),
            SprintStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for SprintStatus {
    type Err = SprintError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "planning" | "planned" => Ok(SprintStatus::Planning),
            "active" | "started" => Ok(SprintStatus::Active),
            "completed" | "done" | "closed" => Ok(SprintStatus::Completed),
            "cancelled" | "canceled" => Ok(SprintStatus::Cancelled),
            _ => Err(SprintError::Parse(format!("Invalid sprint status: {}", s))),
        }
    }
}

/// Project-defined task status.
///
/// Projects name their own workflow columns ("todo", "review", "qa", ...), so the
/// status is kept as a free-form string. The engine only cares whether a value is
/// one of the complete statuses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStatus(String);

/// Statuses that count as finished work.
pub const COMPLETE_STATUSES: &[&str] = &["done", "completed"];

impl TaskStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn todo() -> Self {
        Self::new("todo")
    }

    pub fn done() -> Self {
        Self::new("done")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_complete(&self) -> bool {
        let normalized = self.0.trim().to_lowercase();
        COMPLETE_STATUSES.contains(&normalized.as_str())
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::todo()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskStatus {
    type Err = SprintError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SprintError::Validation("Task status cannot be empty".to_string()));
        }
        Ok(TaskStatus::new(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use SprintStatus::*;
        let all = [Planning, Active, Completed, Cancelled];
        let allowed: Vec<_> = all
            .iter()
            .flat_map(|from| all.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();
        assert_eq!(
            allowed,
            vec![
                (Planning, Active),
                (Planning, Cancelled),
                (Active, Completed),
                (Active, Cancelled)
            ]
        );
    }

    #[test]
    fn test_nothing_leaves_terminal_states() {
        for next in [
            SprintStatus::Planning,
            SprintStatus::Active,
            SprintStatus::Completed,
            SprintStatus::Cancelled,
        ] {
            assert!(!SprintStatus::Completed.can_transition_to(next));
            assert!(!SprintStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_task_status_complete_partition() {
        assert!(TaskStatus::new("done").is_complete());
        assert!(TaskStatus::new("Completed").is_complete());
        assert!(TaskStatus::new(" DONE ").is_complete());
        assert!(!TaskStatus::new("in_progress").is_complete());
        assert!(!TaskStatus::new("review").is_complete());
        assert!(!TaskStatus::new("cancelled").is_complete());
    }

    #[test]
    fn test_sprint_status_parse() {
        assert_eq!(
            "Canceled".parse::<SprintStatus>().unwrap(),
            SprintStatus::Cancelled
        );
        assert!("archived".parse::<SprintStatus>().is_err());
        assert!("  ".parse::<TaskStatus>().is_err());
    }
}
