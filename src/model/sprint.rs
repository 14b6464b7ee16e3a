use super::types::SprintStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Progress counts frozen into a sprint when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub tasks_completed: usize,
    pub total_tasks: usize,
    pub story_points_completed: u32,
    pub total_story_points: u32,
}

impl ProgressSnapshot {
    pub fn completion_ratio(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.tasks_completed as f64 / self.total_tasks as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub project: String,
    pub name: String,

    #[serde(default)]
    pub status: SprintStatus,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<DateTime<Utc>>,

    /// Planned capacity in hours.
    #[serde(default)]
    pub capacity: f64,

    #[serde(default)]
    pub created: DateTime<Utc>,

    #[serde(default)]
    pub updated: DateTime<Utc>,

    /// Frozen at completion; never rewritten afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ProgressSnapshot>,

    /// Sprint goal, stored as the markdown body.
    #[serde(skip)]
    pub goal: String,
}

impl Sprint {
    pub fn new(
        id: String,
        project: String,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            project,
            name,
            status: SprintStatus::Planning,
            start_date,
            end_date,
            actual_start: None,
            actual_end: None,
            capacity: 0.0,
            snapshot: None,
            created: now,
            updated: now,
            goal: String::new(),
        }
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_goal(mut self, goal: String) -> Self {
        self.goal = goal;
        self
    }

    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Fields the lifecycle writes when a sprint changes status.
///
/// Stores apply a patch only if the sprint is still in the status the caller
/// observed, which is what makes the status field the concurrency gate.
#[derive(Debug, Clone, PartialEq)]
pub struct SprintPatch {
    pub status: SprintStatus,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub snapshot: Option<ProgressSnapshot>,
}

impl SprintPatch {
    pub fn status(status: SprintStatus) -> Self {
        Self {
            status,
            actual_start: None,
            actual_end: None,
            snapshot: None,
        }
    }

    pub fn with_actual_start(mut self, at: DateTime<Utc>) -> Self {
        self.actual_start = Some(at);
        self
    }

    pub fn with_actual_end(mut self, at: DateTime<Utc>) -> Self {
        self.actual_end = Some(at);
        self
    }

    pub fn with_snapshot(mut self, snapshot: ProgressSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Apply to a sprint. Unset optional fields leave existing values alone and an
    /// existing snapshot is never overwritten.
    pub fn apply(&self, sprint: &mut Sprint) {
        sprint.status = self.status;
        if let Some(at) = self.actual_start {
            sprint.actual_start = Some(at);
        }
        if let Some(at) = self.actual_end {
            sprint.actual_end = Some(at);
        }
        if sprint.snapshot.is_none() {
            sprint.snapshot = self.snapshot;
        }
        sprint.touch();
    }
}
