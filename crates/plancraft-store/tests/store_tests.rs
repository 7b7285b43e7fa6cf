#[cfg(test)]
mod tests {
    use plancraft_core::PlanError;
    use plancraft_store::*;

    struct Seed {
        store: Store,
        alice: i64,
        bob: i64,
        project: i64,
    }

    fn user(store: &Store, username: &str) -> i64 {
        store
            .create_user(&NewUser {
                name: username.into(),
                username: username.into(),
                email: format!("{username}@example.com"),
                role: None,
                company: Some("Acme".into()),
                skills: None,
                level: None,
            })
            .unwrap()
            .id
    }

    fn seed() -> Seed {
        let store = Store::open_in_memory().unwrap();
        let alice = user(&store, "alice");
        let bob = user(&store, "bob");
        let project = store
            .create_project(
                &NewProject {
                    name: "Apollo".into(),
                    description: None,
                    status: None,
                    lead: None,
                },
                alice,
            )
            .unwrap()
            .id;
        Seed {
            store,
            alice,
            bob,
            project,
        }
    }

    fn task(assignee: i64, project: i64, status: TaskStatus) -> NewTaskAssignment {
        NewTaskAssignment {
            user_id: assignee,
            project_id: project,
            description: Some(format!("{status} work")),
            task_type: Some("development".into()),
            status: Some(status),
            eta: None,
        }
    }

    // ── Task repository ────────────────────────────────────────

    #[test]
    fn test_create_task_records_acting_user_as_assigner() {
        let s = seed();
        let created = s
            .store
            .create_task(&task(s.bob, s.project, TaskStatus::Todo), s.alice)
            .unwrap();
        assert_eq!(created.assigned_by, Some(s.alice));
        assert_eq!(created.user_id, s.bob);
        assert_eq!(created.status, Some(TaskStatus::Todo));
        assert_eq!(s.store.get_task(created.id).unwrap(), created);
    }

    #[test]
    fn test_create_task_failure_writes_nothing() {
        let s = seed();
        let err = s
            .store
            .create_task(&task(s.bob, 999, TaskStatus::Todo), s.alice)
            .unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
        assert!(s.store.tasks_assigned_to(s.bob).unwrap().is_empty());
    }

    #[test]
    fn test_tasks_for_user_filters_by_status_and_user() {
        let s = seed();
        for status in TaskStatus::ALL {
            s.store
                .create_task(&task(s.bob, s.project, status), s.alice)
                .unwrap();
        }
        s.store
            .create_task(&task(s.alice, s.project, TaskStatus::Todo), s.alice)
            .unwrap();

        let open = s.store.tasks_for_user(s.bob, &TaskStatus::OPEN).unwrap();
        let statuses: Vec<_> = open.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![Some(TaskStatus::Todo), Some(TaskStatus::InProgress)]
        );
        assert!(open.iter().all(|t| t.user_id == s.bob));

        let blocked = s
            .store
            .tasks_for_user(s.bob, &[TaskStatus::Blocked])
            .unwrap();
        assert_eq!(blocked.len(), 1);
        assert!(s.store.tasks_for_user(s.bob, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_tasks_for_user_is_stable_across_calls() {
        let s = seed();
        s.store
            .create_task(&task(s.bob, s.project, TaskStatus::Todo), s.alice)
            .unwrap();
        let first = s.store.tasks_for_user(s.bob, &TaskStatus::OPEN).unwrap();
        let second = s.store.tasks_for_user(s.bob, &TaskStatus::OPEN).unwrap();
        assert_eq!(first, second);
    }

    // ── Task CRUD ──────────────────────────────────────────────

    #[test]
    fn test_update_task_keeps_unset_fields() {
        let s = seed();
        let mut new = task(s.bob, s.project, TaskStatus::Todo);
        new.eta = Some(parse_eta("2025-06-01T09:30:00Z").unwrap());
        let created = s.store.create_task(&new, s.alice).unwrap();
        let updated = s
            .store
            .update_task(
                created.id,
                &TaskAssignmentUpdate {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, Some(TaskStatus::Done));
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.eta, created.eta);
        assert_eq!(
            updated.eta.unwrap().to_string(),
            "2025-06-01 09:30:00"
        );
    }

    #[test]
    fn test_update_missing_task_is_not_found() {
        let s = seed();
        let err = s
            .store
            .update_task(5, &TaskAssignmentUpdate::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Task assignment not found");
    }

    #[test]
    fn test_tasks_assigned_to_newest_first() {
        let s = seed();
        let a = s
            .store
            .create_task(&task(s.bob, s.project, TaskStatus::Todo), s.alice)
            .unwrap();
        let b = s
            .store
            .create_task(&task(s.bob, s.project, TaskStatus::Done), s.alice)
            .unwrap();
        let ids: Vec<_> = s
            .store
            .tasks_assigned_to(s.bob)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn test_deleting_user_cascades_tasks() {
        let s = seed();
        s.store
            .create_task(&task(s.bob, s.project, TaskStatus::Todo), s.alice)
            .unwrap();
        s.store
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", [s.bob])
            .unwrap();
        assert!(s.store.tasks_assigned_to(s.bob).unwrap().is_empty());
    }

    // ── UML designs ────────────────────────────────────────────

    #[test]
    fn test_uml_roundtrip_and_replace() {
        let s = seed();
        let schema = serde_json::json!({"nodes": [], "relationships": []});
        let uml = s
            .store
            .create_uml(&NewProjectUml {
                project_id: Some(s.project),
                uml_type: "system".into(),
                uml_schema: schema.clone(),
            })
            .unwrap();
        assert_eq!(uml.uml_schema, schema);
        assert_eq!(s.store.umls_for_project(s.project).unwrap().len(), 1);

        let replaced = s
            .store
            .replace_uml(
                uml.id,
                &NewProjectUml {
                    project_id: None,
                    uml_type: "class".into(),
                    uml_schema: serde_json::json!({"nodes": [{"id": "a"}]}),
                },
            )
            .unwrap();
        assert_eq!(replaced.uml_type, "class");
        assert!(s.store.umls_for_project(s.project).unwrap().is_empty());
        s.store.delete_uml(uml.id).unwrap();
        assert!(matches!(s.store.get_uml(uml.id), Err(PlanError::NotFound(_))));
    }

    // ── File-backed database ───────────────────────────────────

    #[test]
    fn test_reopen_file_database_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.db");
        let id = {
            let store = Store::open(&path).unwrap();
            user(&store, "carol")
        };
        let store = Store::open(&path).unwrap();
        assert_eq!(store.get_user(id).unwrap().username, "carol");
    }
}
