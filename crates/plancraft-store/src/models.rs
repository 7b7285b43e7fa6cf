use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use plancraft_core::{FeatureId, MilestoneId, PlanError, ProjectId, TaskId, UserId};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ── Task status ────────────────────────────────────────────────

/// Lifecycle state of a task assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in-progress", alias = "in progress", alias = "in_progress")]
    InProgress,
    #[serde(rename = "blocked")]
    Blocked,
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Done,
    ];

    /// Statuses that count as open work.
    pub const OPEN: [TaskStatus; 2] = [TaskStatus::Todo, TaskStatus::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = PlanError;

    /// Accepts any case, and spaces or underscores in place of the hyphen.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "todo" | "to-do" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "blocked" => Ok(TaskStatus::Blocked),
            "done" | "completed" | "complete" => Ok(TaskStatus::Done),
            _ => Err(PlanError::Validation(format!("invalid status value '{s}'"))),
        }
    }
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: PlanError| FromSqlError::Other(Box::new(e)))
    }
}

/// Parse an ISO-8601 date or date-time into a naive timestamp.
///
/// Offsets are converted to UTC and dropped; a bare date means midnight.
pub fn parse_eta(raw: &str) -> plancraft_core::Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| PlanError::Validation(format!("'{raw}' is not an ISO-8601 date-time")))
}

// ── Users ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Option<String>,
    pub company: Option<String>,
    pub skills: Option<Value>,
    pub level: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub skills: Option<Value>,
    #[serde(default)]
    pub level: Option<i64>,
}

// ── Projects ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Option<UserId>,
    pub status: String,
    pub lead: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub lead: Option<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub lead: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProject {
    pub id: i64,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUserProject {
    pub user_id: UserId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub role: Option<String>,
}

// ── Milestones, features, tech stack ───────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub project_id: ProjectId,
    pub name: String,
    pub done: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMilestone {
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MilestoneUpdate {
    pub name: Option<String>,
    pub done: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub project_id: ProjectId,
    pub milestone_id: Option<MilestoneId>,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFeature {
    pub project_id: ProjectId,
    #[serde(default)]
    pub milestone_id: Option<MilestoneId>,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureUpdate {
    pub milestone_id: Option<MilestoneId>,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechStackItem {
    pub id: i64,
    pub project_id: ProjectId,
    pub tech: String,
    pub level: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTechStackItem {
    pub project_id: ProjectId,
    pub tech: String,
    pub level: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechStackUpdate {
    pub tech: Option<String>,
    pub level: Option<i64>,
}

// ── Task assignments ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub id: TaskId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_by: Option<UserId>,
    pub eta: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
}

/// A task to insert. `assigned_by` is never part of the payload; the
/// repository takes it from the acting user.
#[derive(Debug, Clone)]
pub struct NewTaskAssignment {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub status: Option<TaskStatus>,
    pub eta: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskAssignmentUpdate {
    pub user_id: Option<UserId>,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub status: Option<TaskStatus>,
    pub eta: Option<NaiveDateTime>,
}

// ── UML designs ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUml {
    pub id: i64,
    pub project_id: Option<ProjectId>,
    #[serde(rename = "type")]
    pub uml_type: String,
    pub uml_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProjectUml {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(rename = "type")]
    pub uml_type: String,
    pub uml_schema: Value,
}
