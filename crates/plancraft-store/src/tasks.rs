use chrono::NaiveDateTime;
use plancraft_core::{Result, TaskId, UserId};
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use tracing::{debug, warn};

use crate::db::{Store, found, now, parse_timestamp, storage};
use crate::models::{NewTaskAssignment, TaskAssignment, TaskAssignmentUpdate, TaskStatus};

const COLUMNS: &str =
    "id, user_id, project_id, description, type, status, assigned_by, eta, created_at";
const ETA_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Task persistence as seen by the chat agent's tools.
pub trait TaskRepository: Send + Sync {
    /// Insert one task with `assigned_by` set to the acting user.
    ///
    /// The insert is atomic: on failure nothing is written.
    fn create_task(&self, task: &NewTaskAssignment, assigned_by: UserId) -> Result<TaskAssignment>;

    /// Tasks assigned to `user` whose status is one of `statuses`, oldest first.
    fn tasks_for_user(&self, user: UserId, statuses: &[TaskStatus]) -> Result<Vec<TaskAssignment>>;
}

fn read_task(row: &Row<'_>) -> rusqlite::Result<TaskAssignment> {
    let eta = row
        .get::<_, Option<String>>(7)?
        .map(|raw| {
            NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
            })
        })
        .transpose()?;
    let created: String = row.get(8)?;
    Ok(TaskAssignment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        description: row.get(3)?,
        task_type: row.get(4)?,
        status: row.get(5)?,
        assigned_by: row.get(6)?,
        eta,
        created_at: parse_timestamp(8, &created)?,
    })
}

fn format_eta(eta: Option<NaiveDateTime>) -> Option<String> {
    eta.map(|e| e.format(ETA_FORMAT).to_string())
}

impl TaskRepository for Store {
    fn create_task(&self, task: &NewTaskAssignment, assigned_by: UserId) -> Result<TaskAssignment> {
        let mut db = self.conn();
        let tx = db.transaction().map_err(storage)?;
        tx.execute(
            "INSERT INTO task_assignments
                (user_id, project_id, description, type, status, assigned_by, eta, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.user_id,
                task.project_id,
                task.description,
                task.task_type,
                task.status,
                assigned_by,
                format_eta(task.eta),
                now(),
            ],
        )
        .map_err(|e| {
            warn!(error = %e, "task insert failed, rolling back");
            storage(e)
        })?;
        let id = tx.last_insert_rowid();
        let created = tx
            .query_row(
                &format!("SELECT {COLUMNS} FROM task_assignments WHERE id = ?1"),
                params![id],
                read_task,
            )
            .map_err(storage)?;
        tx.commit().map_err(storage)?;
        debug!(task = id, assignee = task.user_id, assigned_by, "task created");
        Ok(created)
    }

    fn tasks_for_user(&self, user: UserId, statuses: &[TaskStatus]) -> Result<Vec<TaskAssignment>> {
        if statuses.is_empty() {
            return Ok(vec![]);
        }
        let placeholders = (0..statuses.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {COLUMNS} FROM task_assignments
             WHERE user_id = ?1 AND status IN ({placeholders})
             ORDER BY id"
        );
        let mut bind: Vec<Value> = vec![Value::Integer(user)];
        bind.extend(statuses.iter().map(|s| Value::Text(s.as_str().to_string())));

        let db = self.conn();
        let mut stmt = db.prepare(&sql).map_err(storage)?;
        let rows = stmt
            .query_map(params_from_iter(bind.iter()), read_task)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(rows)
    }
}

impl Store {
    pub fn get_task(&self, id: TaskId) -> Result<TaskAssignment> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM task_assignments WHERE id = ?1"),
                params![id],
                read_task,
            )
            .optional()
            .map_err(storage)?;
        found(row, || "Task assignment".to_string())
    }

    /// Every task assigned to `user`, newest first.
    pub fn tasks_assigned_to(&self, user: UserId) -> Result<Vec<TaskAssignment>> {
        let db = self.conn();
        let mut stmt = db
            .prepare(&format!(
                "SELECT {COLUMNS} FROM task_assignments
                 WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
            ))
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![user], read_task)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(rows)
    }

    /// Apply the set fields of `update`; unset fields keep their value.
    pub fn update_task(&self, id: TaskId, update: &TaskAssignmentUpdate) -> Result<TaskAssignment> {
        let current = self.get_task(id)?;
        self.conn()
            .execute(
                "UPDATE task_assignments
                 SET user_id = ?1, description = ?2, type = ?3, status = ?4, eta = ?5
                 WHERE id = ?6",
                params![
                    update.user_id.unwrap_or(current.user_id),
                    update.description.as_ref().or(current.description.as_ref()),
                    update.task_type.as_ref().or(current.task_type.as_ref()),
                    update.status.or(current.status),
                    format_eta(update.eta.or(current.eta)),
                    id,
                ],
            )
            .map_err(storage)?;
        self.get_task(id)
    }
}
