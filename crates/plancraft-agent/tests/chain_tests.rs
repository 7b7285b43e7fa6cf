#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plancraft_agent::ChainRunner;
    use plancraft_agent::chains::{
        DependencyInput, MilestonesInput, NodeKind, RoadmapInput, SystemDesignInput,
    };
    use plancraft_config::PlanConfig;
    use plancraft_core::PlanError;
    use plancraft_llm::{MockProvider, ResponseFormat};

    fn config() -> PlanConfig {
        let mut config = PlanConfig::default();
        config.services.api_key = Some("test-key".into());
        config
    }

    fn runner(provider: MockProvider) -> (ChainRunner, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        (ChainRunner::new(provider.clone(), &config()), provider)
    }

    fn roadmap_input() -> RoadmapInput {
        RoadmapInput {
            requirements: "  A todo app  ".into(),
            tech_stack: "Rust, Postgres".into(),
            best_practices: None,
            temperature: 0.3,
        }
    }

    fn design_input() -> SystemDesignInput {
        SystemDesignInput {
            features: "Chat".into(),
            expected_users: "10k DAU".into(),
            geography: "EU".into(),
            constraints: None,
            tech_stack: Some("Rust".into()),
            temperature: 0.2,
            project_id: Some(1),
        }
    }

    // ── Planning chains ────────────────────────────────────────

    #[tokio::test]
    async fn test_roadmap_renders_inputs() {
        let (runner, provider) = runner(MockProvider::new("mock").with_response("# Roadmap"));
        let text = runner.generate_roadmap(&roadmap_input()).await.unwrap();
        assert_eq!(text, "# Roadmap");

        let request = &provider.recorded_requests()[0];
        let prompt = request.messages[0].text_content();
        assert!(prompt.starts_with("Requirements:\nA todo app\n"));
        assert!(prompt.contains("Best Practices / Context (optional):\nN/A"));
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(request.response_format, ResponseFormat::Text);
        assert!(request
            .system
            .as_deref()
            .unwrap()
            .starts_with("You are a senior software delivery planner."));
    }

    #[tokio::test]
    async fn test_plan_feeds_each_stage_into_the_next() {
        let provider = MockProvider::new("mock")
            .with_response("ROADMAP")
            .with_response("MILESTONES")
            .with_response("TASKS");
        let (runner, provider) = runner(provider);
        let plan = runner.generate_plan(&roadmap_input()).await.unwrap();
        assert_eq!(plan.roadmap, "ROADMAP");
        assert_eq!(plan.milestones, "MILESTONES");
        assert_eq!(plan.tasks, "TASKS");

        let requests = provider.recorded_requests();
        assert!(requests[1].messages[0].text_content().contains("Requirements:\nROADMAP"));
        assert!(requests[2].messages[0].text_content().contains("Milestones:\nMILESTONES"));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_call() {
        let provider = Arc::new(MockProvider::new("mock").with_response("unused"));
        let runner = ChainRunner::new(provider.clone(), &PlanConfig::default());
        let err = runner
            .generate_milestones(&MilestonesInput {
                requirements: "x".into(),
                tech_stack: None,
                temperature: 0.2,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::MissingCredential(_)));
        assert!(provider.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_temperature_is_rejected() {
        let (runner, provider) = runner(MockProvider::new("mock").with_response("x"));
        let mut input = roadmap_input();
        input.temperature = 1.5;
        let err = runner.generate_roadmap(&input).await.unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
        assert_eq!(provider.remaining(), 1);
    }

    // ── System design ──────────────────────────────────────────

    #[tokio::test]
    async fn test_uml_design_parses_fenced_json() {
        let reply = r#"```json
{"type": "system", "uml_schema": {
  "nodes": [
    {"id": "lb", "name": "LB", "type": "load_balancer", "x": 0, "y": 0, "w": 100, "h": 40},
    {"id": "api", "name": "API", "type": "service", "x": 150, "y": 0, "w": 100, "h": 40}
  ],
  "relationships": [{"source": "lb", "to": "api", "type": "http"}]
}}
```"#;
        let (runner, provider) = runner(MockProvider::new("mock").with_response(reply));
        let design = runner.generate_system_design(&design_input()).await.unwrap();
        assert_eq!(design.design_type, "system");
        assert_eq!(design.uml_schema.nodes[0].kind, NodeKind::LoadBalancer);
        assert_eq!(design.uml_schema.relationships.len(), 1);
        assert_eq!(
            provider.recorded_requests()[0].response_format,
            ResponseFormat::Json
        );
    }

    #[tokio::test]
    async fn test_uml_design_with_dangling_edge_is_malformed() {
        let reply = r#"{"type": "system", "uml_schema": {"nodes": [],
            "relationships": [{"source": "a", "to": "b", "type": "http"}]}}"#;
        let (runner, _) = runner(MockProvider::new("mock").with_response(reply));
        let err = runner.generate_system_design(&design_input()).await.unwrap_err();
        assert!(matches!(err, PlanError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_text_design_renders_optional_inputs() {
        let (runner, provider) = runner(MockProvider::new("mock").with_response("# Design"));
        runner
            .generate_system_design_text(&design_input())
            .await
            .unwrap();
        let prompt = provider.recorded_requests()[0].messages[0].text_content();
        assert!(prompt.contains("Tech Stack (optional):\nRust"));
        assert!(prompt.contains("Constraints/Notes (optional):\nN/A"));
    }

    // ── Feature chains ─────────────────────────────────────────

    #[tokio::test]
    async fn test_dependency_analysis() {
        let reply = r#"{"new_feature": "Export", "depends_on": [2, 5], "reasoning": "needs reports"}"#;
        let (runner, provider) = runner(MockProvider::new("mock").with_response(reply));
        let analysis = runner
            .analyze_feature_dependencies(&DependencyInput {
                project_name: "Apollo".into(),
                features: "2: Reports\n5: Auth".into(),
                milestones: "MVP".into(),
                tech_stack: "Rust".into(),
                new_feature: "Export".into(),
            })
            .await
            .unwrap();
        assert_eq!(analysis.depends_on, vec![2, 5]);
        let prompt = provider.recorded_requests()[0].messages[0].text_content();
        assert!(prompt.contains("Project: Apollo"));
        assert!(prompt.contains("\"new_feature\": \"Export\""));
    }

    #[tokio::test]
    async fn test_breakdown_tolerates_missing_categories() {
        let reply = r#"{"frontend_tasks": ["Form"], "backend_tasks": ["Endpoint", "Job"]}"#;
        let (runner, _) = runner(MockProvider::new("mock").with_response(reply));
        let breakdown = runner.breakdown_feature("CSV export").await.unwrap();
        assert_eq!(breakdown.total(), 3);
        assert!(breakdown.security_tasks.is_empty());
    }

    #[tokio::test]
    async fn test_non_json_reply_is_malformed() {
        let (runner, _) = runner(MockProvider::new("mock").with_response("I cannot do that."));
        let err = runner.breakdown_feature("x").await.unwrap_err();
        assert!(matches!(err, PlanError::MalformedOutput(_)));
    }
}
