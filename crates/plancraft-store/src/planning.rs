use plancraft_core::{FeatureId, MilestoneId, PlanError, ProjectId, Result};
use rusqlite::{OptionalExtension, Row, params};

use crate::db::{Store, found, storage};
use crate::models::{
    Feature, FeatureUpdate, Milestone, MilestoneUpdate, NewFeature, NewMilestone,
    NewTechStackItem, TechStackItem, TechStackUpdate,
};

fn read_milestone(row: &Row<'_>) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        done: row.get(3)?,
    })
}

fn read_feature(row: &Row<'_>) -> rusqlite::Result<Feature> {
    Ok(Feature {
        id: row.get(0)?,
        project_id: row.get(1)?,
        milestone_id: row.get(2)?,
        name: row.get(3)?,
        status: row.get(4)?,
    })
}

fn read_tech(row: &Row<'_>) -> rusqlite::Result<TechStackItem> {
    Ok(TechStackItem {
        id: row.get(0)?,
        project_id: row.get(1)?,
        tech: row.get(2)?,
        level: row.get(3)?,
    })
}

impl Store {
    pub(crate) fn query_list<T>(
        &self,
        sql: &str,
        param: i64,
        read: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let db = self.conn();
        let mut stmt = db.prepare(sql).map_err(storage)?;
        let rows = stmt
            .query_map(params![param], read)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(rows)
    }

    pub(crate) fn query_one<T>(
        &self,
        sql: &str,
        id: i64,
        read: fn(&Row<'_>) -> rusqlite::Result<T>,
        what: &str,
    ) -> Result<T> {
        let row = self
            .conn()
            .query_row(sql, params![id], read)
            .optional()
            .map_err(storage)?;
        found(row, || what.to_string())
    }

    pub(crate) fn delete_by_id(&self, table: &str, id: i64, what: &str) -> Result<()> {
        let rows = self
            .conn()
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])
            .map_err(storage)?;
        if rows == 0 {
            return Err(PlanError::NotFound(what.into()));
        }
        Ok(())
    }

    // ── Milestones ─────────────────────────────────────────────

    pub fn create_milestone(&self, m: &NewMilestone) -> Result<Milestone> {
        let id = {
            let db = self.conn();
            db.execute(
                "INSERT INTO milestones (project_id, name, done) VALUES (?1, ?2, ?3)",
                params![m.project_id, m.name, m.done],
            )
            .map_err(storage)?;
            db.last_insert_rowid()
        };
        self.get_milestone(id)
    }

    pub fn get_milestone(&self, id: MilestoneId) -> Result<Milestone> {
        self.query_one(
            "SELECT id, project_id, name, done FROM milestones WHERE id = ?1",
            id,
            read_milestone,
            "Milestone",
        )
    }

    pub fn milestones_for_project(&self, project: ProjectId) -> Result<Vec<Milestone>> {
        self.query_list(
            "SELECT id, project_id, name, done FROM milestones WHERE project_id = ?1 ORDER BY id",
            project,
            read_milestone,
        )
    }

    pub fn update_milestone(&self, id: MilestoneId, update: &MilestoneUpdate) -> Result<Milestone> {
        let current = self.get_milestone(id)?;
        self.conn()
            .execute(
                "UPDATE milestones SET name = ?1, done = ?2 WHERE id = ?3",
                params![
                    update.name.as_ref().unwrap_or(&current.name),
                    update.done.unwrap_or(current.done),
                    id,
                ],
            )
            .map_err(storage)?;
        self.get_milestone(id)
    }

    pub fn delete_milestone(&self, id: MilestoneId) -> Result<()> {
        self.delete_by_id("milestones", id, "Milestone")
    }

    // ── Features ───────────────────────────────────────────────

    pub fn create_feature(&self, f: &NewFeature) -> Result<Feature> {
        let id = {
            let db = self.conn();
            db.execute(
                "INSERT INTO features (project_id, milestone_id, name, status)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    f.project_id,
                    f.milestone_id,
                    f.name,
                    f.status.as_deref().unwrap_or("todo"),
                ],
            )
            .map_err(storage)?;
            db.last_insert_rowid()
        };
        self.get_feature(id)
    }

    pub fn get_feature(&self, id: FeatureId) -> Result<Feature> {
        self.query_one(
            "SELECT id, project_id, milestone_id, name, status FROM features WHERE id = ?1",
            id,
            read_feature,
            "Feature",
        )
    }

    pub fn features_for_project(&self, project: ProjectId) -> Result<Vec<Feature>> {
        self.query_list(
            "SELECT id, project_id, milestone_id, name, status FROM features
             WHERE project_id = ?1 ORDER BY id",
            project,
            read_feature,
        )
    }

    pub fn features_for_milestone(&self, milestone: MilestoneId) -> Result<Vec<Feature>> {
        self.query_list(
            "SELECT id, project_id, milestone_id, name, status FROM features
             WHERE milestone_id = ?1 ORDER BY id",
            milestone,
            read_feature,
        )
    }

    pub fn update_feature(&self, id: FeatureId, update: &FeatureUpdate) -> Result<Feature> {
        let current = self.get_feature(id)?;
        self.conn()
            .execute(
                "UPDATE features SET milestone_id = ?1, name = ?2, status = ?3 WHERE id = ?4",
                params![
                    update.milestone_id.or(current.milestone_id),
                    update.name.as_ref().unwrap_or(&current.name),
                    update.status.as_ref().unwrap_or(&current.status),
                    id,
                ],
            )
            .map_err(storage)?;
        self.get_feature(id)
    }

    pub fn delete_feature(&self, id: FeatureId) -> Result<()> {
        self.delete_by_id("features", id, "Feature")
    }

    // ── Tech stack ─────────────────────────────────────────────

    pub fn create_tech(&self, t: &NewTechStackItem) -> Result<TechStackItem> {
        let id = {
            let db = self.conn();
            db.execute(
                "INSERT INTO tech_stack (project_id, tech, level) VALUES (?1, ?2, ?3)",
                params![t.project_id, t.tech, t.level],
            )
            .map_err(storage)?;
            db.last_insert_rowid()
        };
        self.get_tech(id)
    }

    pub fn get_tech(&self, id: i64) -> Result<TechStackItem> {
        self.query_one(
            "SELECT id, project_id, tech, level FROM tech_stack WHERE id = ?1",
            id,
            read_tech,
            "Tech Stack item",
        )
    }

    pub fn tech_for_project(&self, project: ProjectId) -> Result<Vec<TechStackItem>> {
        self.query_list(
            "SELECT id, project_id, tech, level FROM tech_stack WHERE project_id = ?1 ORDER BY id",
            project,
            read_tech,
        )
    }

    pub fn update_tech(&self, id: i64, update: &TechStackUpdate) -> Result<TechStackItem> {
        let current = self.get_tech(id)?;
        self.conn()
            .execute(
                "UPDATE tech_stack SET tech = ?1, level = ?2 WHERE id = ?3",
                params![
                    update.tech.as_ref().unwrap_or(&current.tech),
                    update.level.unwrap_or(current.level),
                    id,
                ],
            )
            .map_err(storage)?;
        self.get_tech(id)
    }

    pub fn delete_tech(&self, id: i64) -> Result<()> {
        self.delete_by_id("tech_stack", id, "Tech Stack item")
    }
}
