use plancraft_core::{ProjectId, Result};
use rusqlite::{Row, params};

use crate::db::{Store, parse_json, storage};
use crate::models::{NewProjectUml, ProjectUml};

fn read_uml(row: &Row<'_>) -> rusqlite::Result<ProjectUml> {
    let raw: String = row.get(3)?;
    Ok(ProjectUml {
        id: row.get(0)?,
        project_id: row.get(1)?,
        uml_type: row.get(2)?,
        uml_schema: parse_json(3, &raw)?,
    })
}

impl Store {
    pub fn create_uml(&self, uml: &NewProjectUml) -> Result<ProjectUml> {
        let id = {
            let db = self.conn();
            db.execute(
                "INSERT INTO project_uml (project_id, type, uml_schema) VALUES (?1, ?2, ?3)",
                params![uml.project_id, uml.uml_type, uml.uml_schema.to_string()],
            )
            .map_err(storage)?;
            db.last_insert_rowid()
        };
        self.get_uml(id)
    }

    pub fn get_uml(&self, id: i64) -> Result<ProjectUml> {
        self.query_one(
            "SELECT id, project_id, type, uml_schema FROM project_uml WHERE id = ?1",
            id,
            read_uml,
            "UML",
        )
    }

    pub fn umls_for_project(&self, project: ProjectId) -> Result<Vec<ProjectUml>> {
        self.query_list(
            "SELECT id, project_id, type, uml_schema FROM project_uml
             WHERE project_id = ?1 ORDER BY id",
            project,
            read_uml,
        )
    }

    /// Replace every field of a stored design.
    pub fn replace_uml(&self, id: i64, uml: &NewProjectUml) -> Result<ProjectUml> {
        self.get_uml(id)?;
        self.conn()
            .execute(
                "UPDATE project_uml SET project_id = ?1, type = ?2, uml_schema = ?3 WHERE id = ?4",
                params![uml.project_id, uml.uml_type, uml.uml_schema.to_string(), id],
            )
            .map_err(storage)?;
        self.get_uml(id)
    }

    pub fn delete_uml(&self, id: i64) -> Result<()> {
        self.delete_by_id("project_uml", id, "UML")
    }
}
