use plancraft_core::{Result, UserId};
use rusqlite::{OptionalExtension, Row, params};

use crate::db::{Store, found, parse_json, storage};
use crate::models::{NewUser, User};

const COLUMNS: &str = "id, name, username, email, role, company, skills, level";

fn read_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let skills = row
        .get::<_, Option<String>>(6)?
        .map(|raw| parse_json(6, &raw))
        .transpose()?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        company: row.get(5)?,
        skills,
        level: row.get(7)?,
    })
}

impl Store {
    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        let skills = user.skills.as_ref().map(|s| s.to_string());
        let db = self.conn();
        db.execute(
            "INSERT INTO users (name, username, email, role, company, skills, level)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.name,
                user.username,
                user.email,
                user.role.as_deref().unwrap_or("user"),
                user.company,
                skills,
                user.level.unwrap_or(1),
            ],
        )
        .map_err(storage)?;
        let id = db.last_insert_rowid();
        db.query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            read_user,
        )
        .map_err(storage)
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                read_user,
            )
            .optional()
            .map_err(storage)?;
        found(row, || format!("User {id}"))
    }

    pub fn user_exists(&self, id: UserId) -> Result<bool> {
        self.conn()
            .query_row("SELECT 1 FROM users WHERE id = ?1", params![id], |_| Ok(()))
            .optional()
            .map(|r| r.is_some())
            .map_err(storage)
    }

    /// Users of `company` whose name starts with `prefix`, ignoring case.
    pub fn search_company_employees(&self, company: &str, prefix: &str) -> Result<Vec<User>> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        let db = self.conn();
        let mut stmt = db
            .prepare(&format!(
                "SELECT {COLUMNS} FROM users
                 WHERE company = ?1 AND lower(name) LIKE ?2 ESCAPE '\\'
                 ORDER BY name, id"
            ))
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![company, pattern], read_user)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(rows)
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plancraft_core::PlanError;

    fn new_user(name: &str, username: &str, company: Option<&str>) -> NewUser {
        NewUser {
            name: name.into(),
            username: username.into(),
            email: format!("{username}@example.com"),
            role: None,
            company: company.map(String::from),
            skills: Some(serde_json::json!(["rust", "sql"])),
            level: None,
        }
    }

    #[test]
    fn create_and_get_user_applies_defaults() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user(&new_user("Ada", "ada", None)).unwrap();
        assert_eq!(user.role.as_deref(), Some("user"));
        assert_eq!(user.level, Some(1));
        assert_eq!(store.get_user(user.id).unwrap(), user);
        assert_eq!(user.skills.unwrap()[0], "rust");
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let store = Store::open_in_memory().unwrap();
        store.create_user(&new_user("Ada", "ada", None)).unwrap();
        let mut dup = new_user("Ada 2", "ada", None);
        dup.email = "other@example.com".into();
        assert!(matches!(store.create_user(&dup), Err(PlanError::Conflict(_))));
    }

    #[test]
    fn missing_user_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.get_user(42), Err(PlanError::NotFound(_))));
        assert!(!store.user_exists(42).unwrap());
    }

    #[test]
    fn employee_search_is_case_insensitive_prefix() {
        let store = Store::open_in_memory().unwrap();
        store.create_user(&new_user("Alice", "alice", Some("Acme"))).unwrap();
        store.create_user(&new_user("alan", "alan", Some("Acme"))).unwrap();
        store.create_user(&new_user("Bob", "bob", Some("Acme"))).unwrap();
        store.create_user(&new_user("Alba", "alba", Some("Other"))).unwrap();

        let hits = store.search_company_employees("Acme", "AL").unwrap();
        let names: Vec<&str> = hits.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "alan"]);
        assert!(store.search_company_employees("Acme", "%").unwrap().is_empty());
    }
}
