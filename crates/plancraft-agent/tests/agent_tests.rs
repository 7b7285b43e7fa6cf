#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use plancraft_config::ServicesConfig;
    use plancraft_core::{
        ChatTurn, ExecutionTrace, Message, MessageContent, PlanError, Result, StructuredSignal,
        ToolCall, ToolExecutor, TraceStep, UserId,
    };
    use plancraft_llm::{
        AgentRequest, AgentRun, MockProvider, ModelClient, ToolCallingClient, Usage,
    };
    use plancraft_store::{NewTaskAssignment, Store, TaskAssignment, TaskRepository, TaskStatus};
    use plancraft_agent::tools::{CREATE_TASK, LIST_TASKS_BY_STATUS, SHOW_TASK_STATUS};
    use plancraft_agent::{ChatAgent, SYSTEM_PROMPT, ToolRegistry};
    use serde_json::{Value, json};

    fn services() -> ServicesConfig {
        ServicesConfig {
            api_key: Some("test-key".into()),
            ..Default::default()
        }
    }

    /// Users 7 and 9 and project 3 at fixed ids.
    fn seeded_store() -> Arc<Store> {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                "INSERT INTO users (id, name, username, email) VALUES
                    (7, 'Ada', 'ada', 'ada@example.com'),
                    (9, 'Grace', 'grace', 'grace@example.com');
                 INSERT INTO projects (id, name, owner_id, status, created_at)
                    VALUES (3, 'Apollo', 7, 'development', '2025-01-01T00:00:00Z');",
            )
            .unwrap();
        Arc::new(store)
    }

    fn agent_with(provider: MockProvider, store: Arc<Store>) -> (ChatAgent, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        let client = ToolCallingClient::new(provider.clone(), "mock/test-model");
        (
            ChatAgent::new(Arc::new(client), store, services()),
            provider,
        )
    }

    fn call(tool: &str, args: Value) -> ToolCall {
        ToolCall {
            id: format!("call_{tool}"),
            tool_name: tool.into(),
            arguments: args,
        }
    }

    fn observation(message: &Message) -> String {
        message
            .content
            .iter()
            .find_map(|c| match c {
                MessageContent::ToolResult { content, .. } => Some(content.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// A model client that reports a fixed trace without running any tool.
    struct ScriptedClient {
        output: String,
        steps: Vec<(String, Value)>,
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn run(&self, _request: AgentRequest, _tools: &dyn ToolExecutor) -> Result<AgentRun> {
            let trace: ExecutionTrace = self
                .steps
                .iter()
                .map(|(tool, args)| TraceStep {
                    call: call(tool, args.clone()),
                    observation: "ok".into(),
                    is_error: false,
                })
                .collect();
            Ok(AgentRun {
                output: self.output.clone(),
                trace,
                usage: Usage::default(),
            })
        }
    }

    fn scripted(output: &str, steps: Vec<(&str, Value)>) -> ChatAgent {
        let client = ScriptedClient {
            output: output.into(),
            steps: steps
                .into_iter()
                .map(|(t, a)| (t.to_string(), a))
                .collect(),
        };
        ChatAgent::new(Arc::new(client), seeded_store(), services())
    }

    struct FailingRepo;

    impl TaskRepository for FailingRepo {
        fn create_task(&self, _: &NewTaskAssignment, _: UserId) -> Result<TaskAssignment> {
            Err(PlanError::Storage("disk I/O error".into()))
        }

        fn tasks_for_user(&self, _: UserId, _: &[TaskStatus]) -> Result<Vec<TaskAssignment>> {
            Err(PlanError::Storage("disk I/O error".into()))
        }
    }

    // ── End-to-end scenarios ───────────────────────────────────

    #[tokio::test]
    async fn test_status_question_yields_show_task_status_signal() {
        let provider = MockProvider::new("mock")
            .with_tool_call(SHOW_TASK_STATUS, json!({"task_id": 21}))
            .with_response("Here is the status of task 21.");
        let (agent, provider) = agent_with(provider, seeded_store());

        let resp = agent
            .answer("what is the status of task 21", 7, &[])
            .await
            .unwrap();

        assert!(!resp.output_text.is_empty());
        assert_eq!(
            resp.tool_action,
            Some(StructuredSignal::ShowTaskStatus {
                task_id: 21,
                user_id: 7
            })
        );
        let requests = provider.recorded_requests();
        assert_eq!(requests[0].system.as_deref(), Some(SYSTEM_PROMPT));
        let names: Vec<_> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![CREATE_TASK, LIST_TASKS_BY_STATUS, SHOW_TASK_STATUS]);
    }

    #[tokio::test]
    async fn test_create_task_for_other_user_has_no_signal() {
        let store = seeded_store();
        let provider = MockProvider::new("mock")
            .with_tool_call(
                CREATE_TASK,
                json!({
                    "description": "Write tests",
                    "project_id": 3,
                    "assignee_user_id": 9,
                    "assigned_by": 9
                }),
            )
            .with_response("Done, the task is created.");
        let (agent, provider) = agent_with(provider, store.clone());

        let resp = agent
            .answer("create a task to write tests for project 3, assign to user 9", 7, &[])
            .await
            .unwrap();
        assert_eq!(resp.tool_action, None);

        let tasks = store.tasks_assigned_to(9).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].assigned_by, Some(7));
        assert_eq!(tasks[0].status, Some(TaskStatus::Todo));
        assert_eq!(tasks[0].task_type.as_deref(), Some("development"));

        let second = &provider.recorded_requests()[1];
        let text = observation(second.messages.last().unwrap());
        assert!(text.contains(&format!("ID {}", tasks[0].id)));
        assert!(text.contains("project 3"));
        assert!(text.contains("user 9"));
    }

    #[tokio::test]
    async fn test_plain_answer_has_no_signal() {
        let provider = MockProvider::new("mock").with_response("Hello! How can I help?");
        let (agent, _) = agent_with(provider, seeded_store());
        let resp = agent.answer("hi", 7, &[]).await.unwrap();
        assert_eq!(resp.output_text, "Hello! How can I help?");
        assert!(resp.tool_action.is_none());
    }

    #[tokio::test]
    async fn test_history_is_forwarded_in_order() {
        let provider = MockProvider::new("mock").with_response("Sure.");
        let (agent, provider) = agent_with(provider, seeded_store());
        let history = vec![ChatTurn::human("hello"), ChatTurn::assistant("hi there")];
        agent.answer("and now?", 7, &history).await.unwrap();

        let texts: Vec<_> = provider.recorded_requests()[0]
            .messages
            .iter()
            .map(|m| m.text_content())
            .collect();
        assert_eq!(texts, vec!["hello", "hi there", "and now?"]);
    }

    // ── Signal extraction through the agent ────────────────────

    #[tokio::test]
    async fn test_every_argument_shape_yields_the_same_signal() {
        for args in [json!({"task_id": 21}), json!({"task_id": "21"}), json!(21), json!("21")] {
            let agent = scripted("ok", vec![(SHOW_TASK_STATUS, args.clone())]);
            let resp = agent.answer("status?", 7, &[]).await.unwrap();
            assert_eq!(
                resp.tool_action,
                Some(StructuredSignal::ShowTaskStatus {
                    task_id: 21,
                    user_id: 7
                }),
                "arguments {args}"
            );
        }
    }

    #[tokio::test]
    async fn test_first_of_many_signals_wins() {
        let agent = scripted(
            "ok",
            vec![
                (LIST_TASKS_BY_STATUS, json!({})),
                (SHOW_TASK_STATUS, json!({"task_id": [1]})),
                (SHOW_TASK_STATUS, json!({"task_id": 4})),
                (SHOW_TASK_STATUS, json!({"task_id": 5})),
            ],
        );
        let resp = agent.answer("status?", 2, &[]).await.unwrap();
        assert_eq!(
            resp.tool_action,
            Some(StructuredSignal::ShowTaskStatus {
                task_id: 4,
                user_id: 2
            })
        );
    }

    #[tokio::test]
    async fn test_empty_output_falls_back_to_last_observation() {
        let agent = scripted("  ", vec![(LIST_TASKS_BY_STATUS, json!({}))]);
        let resp = agent.answer("list", 7, &[]).await.unwrap();
        assert_eq!(resp.output_text, "ok");
    }

    #[tokio::test]
    async fn test_empty_output_without_steps_is_malformed() {
        let agent = scripted("", vec![]);
        let err = agent.answer("?", 7, &[]).await.unwrap_err();
        assert!(matches!(err, PlanError::MalformedOutput(_)));
    }

    // ── Failure handling ───────────────────────────────────────

    #[tokio::test]
    async fn test_missing_credential_fails_before_model_call() {
        let provider = Arc::new(MockProvider::new("mock").with_response("unused"));
        let client = ToolCallingClient::new(provider.clone(), "mock/test-model");
        let agent = ChatAgent::new(Arc::new(client), seeded_store(), ServicesConfig::default());

        let err = agent.answer("hi", 7, &[]).await.unwrap_err();
        assert!(matches!(err, PlanError::MissingCredential(_)));
        assert!(provider.recorded_requests().is_empty());
        assert_eq!(provider.remaining(), 1);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let provider = MockProvider::new("mock").with_error("HTTP 503: unavailable");
        let (agent, _) = agent_with(provider, seeded_store());
        let err = agent.answer("hi", 7, &[]).await.unwrap_err();
        assert!(matches!(err, PlanError::LlmProvider(_)));
    }

    #[tokio::test]
    async fn test_repository_failure_becomes_observation() {
        let provider = MockProvider::new("mock")
            .with_tool_call(
                CREATE_TASK,
                json!({"description": "x", "project_id": 3, "assignee_user_id": 9}),
            )
            .with_response("Sorry, I could not create the task.");
        let provider = Arc::new(provider);
        let client = ToolCallingClient::new(provider.clone(), "mock/test-model");
        let agent = ChatAgent::new(Arc::new(client), Arc::new(FailingRepo), services());

        let resp = agent.answer("create it", 7, &[]).await.unwrap();
        assert_eq!(resp.output_text, "Sorry, I could not create the task.");

        let text = observation(provider.recorded_requests()[1].messages.last().unwrap());
        assert!(text.starts_with("Failed to create task:"));
    }

    // ── Registry ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_defaults_to_open_tasks_of_acting_user() {
        let store = seeded_store();
        for status in TaskStatus::ALL {
            store
                .create_task(
                    &NewTaskAssignment {
                        user_id: 7,
                        project_id: 3,
                        description: Some(format!("{status} item")),
                        task_type: None,
                        status: Some(status),
                        eta: None,
                    },
                    9,
                )
                .unwrap();
        }
        let registry = ToolRegistry::for_user(7, store.clone());
        let result = registry
            .execute(&call(LIST_TASKS_BY_STATUS, json!({})))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert!(result.content.contains("todo item"));
        assert!(result.content.contains("in-progress item"));
        assert!(!result.content.contains("blocked item"));
        assert!(!result.content.contains("done item"));

        let again = registry
            .execute(&call(LIST_TASKS_BY_STATUS, json!({})))
            .await
            .unwrap();
        assert_eq!(result.content, again.content);

        let other = ToolRegistry::for_user(9, store);
        let empty = other
            .execute(&call(LIST_TASKS_BY_STATUS, json!({"status": null})))
            .await
            .unwrap();
        assert_eq!(
            empty.content,
            "No tasks found for user 9 with status todo or in-progress."
        );
    }

    #[tokio::test]
    async fn test_list_accepts_spaced_status() {
        let store = seeded_store();
        let registry = ToolRegistry::for_user(7, store);
        let result = registry
            .execute(&call(LIST_TASKS_BY_STATUS, json!({"status": "in progress"})))
            .await
            .unwrap();
        assert_eq!(
            result.content,
            "No tasks found for user 7 with status in-progress."
        );
    }

    #[tokio::test]
    async fn test_list_accepts_completed_as_done() {
        let store = seeded_store();
        store
            .create_task(
                &NewTaskAssignment {
                    user_id: 7,
                    project_id: 3,
                    description: Some("Ship v1".into()),
                    task_type: None,
                    status: Some(TaskStatus::Done),
                    eta: None,
                },
                9,
            )
            .unwrap();
        let registry = ToolRegistry::for_user(7, store);
        let result = registry
            .execute(&call(LIST_TASKS_BY_STATUS, json!({"status": "completed"})))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert!(result.content.starts_with("Tasks for user 7 with status done:"));
        assert!(result.content.contains("Ship v1"));
    }

    #[tokio::test]
    async fn test_list_with_unknown_status_reports_failure() {
        let registry = ToolRegistry::for_user(7, seeded_store());
        let result = registry
            .execute(&call(LIST_TASKS_BY_STATUS, json!({"status": "someday"})))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.content.starts_with("Failed to list tasks:"));
        assert!(result.content.contains("'someday'"));
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments_are_error_observations() {
        let registry = ToolRegistry::for_user(7, seeded_store());
        let unknown = registry
            .execute(&call("delete_everything", json!({})))
            .await
            .unwrap();
        assert!(unknown.is_error);
        assert_eq!(unknown.content, "Tool not found: delete_everything");

        let missing = registry
            .execute(&call(CREATE_TASK, json!({"description": "x"})))
            .await
            .unwrap();
        assert!(missing.is_error);
        assert!(missing.content.contains("missing required parameter 'project_id'"));

        let bad_status = registry
            .execute(&call(
                CREATE_TASK,
                json!({"description": "x", "project_id": 3, "assignee_user_id": 9, "status": "someday"}),
            ))
            .await
            .unwrap();
        assert!(bad_status.is_error);
        assert!(bad_status.content.starts_with("Failed to create task:"));
    }

    #[tokio::test]
    async fn test_create_task_parses_eta() {
        let store = seeded_store();
        let registry = ToolRegistry::for_user(7, store.clone());
        let result = registry
            .execute(&call(
                CREATE_TASK,
                json!({
                    "description": "Ship it",
                    "project_id": "3",
                    "assignee_user_id": 9,
                    "status": "in_progress",
                    "eta": "2025-12-31T23:59:59"
                }),
            ))
            .await
            .unwrap();
        assert!(!result.is_error, "{}", result.content);
        let task = &store.tasks_assigned_to(9).unwrap()[0];
        assert_eq!(task.status, Some(TaskStatus::InProgress));
        assert_eq!(
            task.eta.unwrap().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2025-12-31T23:59:59"
        );
    }
}
