use plancraft_core::{FeatureId, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ChainRunner;

const DEPENDENCY_PROMPT: &str = r#"
You are an expert project architect helping to determine dependencies between software features.
Answer with JSON only.
"#;

const BREAKDOWN_PROMPT: &str = r#"
You are an expert software engineer. Your task is to break down a given feature into smaller, actionable tasks across different development domains.
Consider frontend, backend, database, and security aspects.
Provide a comprehensive list of tasks for each category.

Respond with a single JSON object with exactly these keys, each holding a list of task strings:
"frontend_tasks", "backend_tasks", "database_tasks", "security_tasks", "other_tasks".
"#;

/// Project context for a dependency analysis, already rendered as text.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyInput {
    pub project_name: String,
    pub features: String,
    pub milestones: String,
    pub tech_stack: String,
    pub new_feature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub new_feature: String,
    #[serde(default)]
    pub depends_on: Vec<FeatureId>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureBreakdown {
    #[serde(default)]
    pub frontend_tasks: Vec<String>,
    #[serde(default)]
    pub backend_tasks: Vec<String>,
    #[serde(default)]
    pub database_tasks: Vec<String>,
    #[serde(default)]
    pub security_tasks: Vec<String>,
    #[serde(default)]
    pub other_tasks: Vec<String>,
}

impl FeatureBreakdown {
    pub fn total(&self) -> usize {
        self.frontend_tasks.len()
            + self.backend_tasks.len()
            + self.database_tasks.len()
            + self.security_tasks.len()
            + self.other_tasks.len()
    }
}

impl ChainRunner {
    pub async fn analyze_feature_dependencies(
        &self,
        input: &DependencyInput,
    ) -> Result<DependencyAnalysis> {
        let new_feature = input.new_feature.trim();
        let user = format!(
            "Project: {}\n\n\
             Existing features (with IDs, milestone, and description):\n{}\n\n\
             Milestones:\n{}\n\n\
             Tech stack and constraints:\n{}\n\n\
             A new feature is being added:\n\"{new_feature}\"\n\n---\n\n\
             Task:\n\
             1. Based on the existing features, milestones, and tech stack, decide if this new feature depends on any existing feature(s).\n\
             2. If dependencies exist, list the feature IDs and explain why.\n\
             3. If no dependencies exist, state \"No dependencies\".\n\
             4. Output in JSON format:\n\n\
             {{\n  \"new_feature\": \"{new_feature}\",\n  \"depends_on\": [list of feature IDs or empty],\n  \"reasoning\": \"short explanation\"\n}}",
            input.project_name.trim(),
            input.features.trim(),
            input.milestones.trim(),
            input.tech_stack.trim(),
        );
        let analysis: DependencyAnalysis =
            self.complete_json(DEPENDENCY_PROMPT, user, 0.2).await?;
        info!(
            depends_on = ?analysis.depends_on,
            "feature dependencies analyzed"
        );
        Ok(analysis)
    }

    pub async fn breakdown_feature(&self, description: &str) -> Result<FeatureBreakdown> {
        let user = format!("Break down the following feature: {}", description.trim());
        let breakdown: FeatureBreakdown =
            self.complete_json(BREAKDOWN_PROMPT, user, 0.2).await?;
        info!(tasks = breakdown.total(), "feature broken down");
        Ok(breakdown)
    }
}
