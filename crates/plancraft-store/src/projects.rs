use plancraft_core::{PlanError, ProjectId, Result, UserId};
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use crate::db::{Store, found, now, parse_timestamp, storage};
use crate::models::{NewProject, NewUserProject, Project, ProjectUpdate, UserProject};

const PROJECT_COLUMNS: &str = "id, name, description, owner_id, status, lead, created_at";
const LINK_COLUMNS: &str = "id, user_id, project_id, role, created_at";

fn read_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    let created: String = row.get(6)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        status: row.get(4)?,
        lead: row.get(5)?,
        created_at: parse_timestamp(6, &created)?,
    })
}

fn read_link(row: &Row<'_>) -> rusqlite::Result<UserProject> {
    let created: String = row.get(4)?;
    Ok(UserProject {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        role: row.get(3)?,
        created_at: parse_timestamp(4, &created)?,
    })
}

impl Store {
    // ── Projects ───────────────────────────────────────────────

    pub fn create_project(&self, project: &NewProject, owner: UserId) -> Result<Project> {
        let db = self.conn();
        db.execute(
            "INSERT INTO projects (name, description, owner_id, status, lead, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project.name,
                project.description,
                owner,
                project.status.as_deref().unwrap_or("development"),
                project.lead,
                now(),
            ],
        )
        .map_err(storage)?;
        let id = db.last_insert_rowid();
        debug!(project = id, owner, "project created");
        db.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            read_project,
        )
        .map_err(storage)
    }

    /// Fetch a project, but only if `owner` owns it.
    pub fn get_project(&self, id: ProjectId, owner: UserId) -> Result<Project> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1 AND owner_id = ?2"),
                params![id, owner],
                read_project,
            )
            .optional()
            .map_err(storage)?;
        found(row, || "Project".to_string())
    }

    pub fn project_exists(&self, id: ProjectId) -> Result<bool> {
        self.conn()
            .query_row("SELECT 1 FROM projects WHERE id = ?1", params![id], |_| Ok(()))
            .optional()
            .map(|r| r.is_some())
            .map_err(storage)
    }

    pub fn projects_owned_by(&self, owner: UserId) -> Result<Vec<Project>> {
        let db = self.conn();
        let mut stmt = db
            .prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ?1 ORDER BY id"
            ))
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![owner], read_project)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(rows)
    }

    pub fn update_project(
        &self,
        id: ProjectId,
        owner: UserId,
        update: &ProjectUpdate,
    ) -> Result<Project> {
        let current = self.get_project(id, owner)?;
        self.conn()
            .execute(
                "UPDATE projects SET name = ?1, description = ?2, status = ?3, lead = ?4
                 WHERE id = ?5",
                params![
                    update.name.as_ref().unwrap_or(&current.name),
                    update.description.as_ref().or(current.description.as_ref()),
                    update.status.as_ref().unwrap_or(&current.status),
                    update.lead.or(current.lead),
                    id,
                ],
            )
            .map_err(storage)?;
        self.get_project(id, owner)
    }

    pub fn delete_project(&self, id: ProjectId, owner: UserId) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "DELETE FROM projects WHERE id = ?1 AND owner_id = ?2",
                params![id, owner],
            )
            .map_err(storage)?;
        if rows == 0 {
            return Err(PlanError::NotFound("Project".into()));
        }
        Ok(())
    }

    // ── User ↔ project membership ──────────────────────────────

    pub fn add_user_to_project(&self, link: &NewUserProject) -> Result<UserProject> {
        if !self.user_exists(link.user_id)? {
            return Err(PlanError::NotFound("User".into()));
        }
        if !self.project_exists(link.project_id)? {
            return Err(PlanError::NotFound("Project".into()));
        }
        let db = self.conn();
        db.execute(
            "INSERT INTO user_projects (user_id, project_id, role, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                link.user_id,
                link.project_id,
                link.role.as_deref().unwrap_or("member"),
                now(),
            ],
        )
        .map_err(|e| match storage(e) {
            PlanError::Conflict(_) => {
                PlanError::Conflict("User already associated with this project".into())
            }
            other => other,
        })?;
        let id = db.last_insert_rowid();
        db.query_row(
            &format!("SELECT {LINK_COLUMNS} FROM user_projects WHERE id = ?1"),
            params![id],
            read_link,
        )
        .map_err(storage)
    }

    pub fn projects_of_user(&self, user: UserId) -> Result<Vec<UserProject>> {
        self.links_where("user_id", user)
    }

    pub fn members_of_project(&self, project: ProjectId) -> Result<Vec<UserProject>> {
        self.links_where("project_id", project)
    }

    fn links_where(&self, column: &str, value: i64) -> Result<Vec<UserProject>> {
        let db = self.conn();
        let mut stmt = db
            .prepare(&format!(
                "SELECT {LINK_COLUMNS} FROM user_projects WHERE {column} = ?1 ORDER BY id"
            ))
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![value], read_link)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(rows)
    }

    pub fn remove_user_project(&self, id: i64) -> Result<()> {
        let rows = self
            .conn()
            .execute("DELETE FROM user_projects WHERE id = ?1", params![id])
            .map_err(storage)?;
        if rows == 0 {
            return Err(PlanError::NotFound("User-project association".into()));
        }
        Ok(())
    }
}
