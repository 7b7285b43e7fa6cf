/// Database identifier of a user.
pub type UserId = i64;

/// Database identifier of a project.
pub type ProjectId = i64;

/// Database identifier of a task assignment.
pub type TaskId = i64;

/// Database identifier of a milestone.
pub type MilestoneId = i64;

/// Database identifier of a feature.
pub type FeatureId = i64;
