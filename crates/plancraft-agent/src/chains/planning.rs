use plancraft_core::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ChainRunner, default_temperature, or_na};

const ROADMAP_PROMPT: &str = r#"
You are a senior software delivery planner. Given product requirements and a specified tech stack,
produce a structured, step-by-step engineering roadmap.

Follow this structure strictly:

1) Features
   - Bullet list of top-level features extracted from the requirements.
2) Milestones per Feature
   - For each feature, list 3-6 milestones (schema, API, UI, integrations, testing, deployment).
3) Day-to-Day Tasks
   - Break each milestone into daily tasks with crisp, actionable items (1 day each when possible).
   - Use task verbs like: Design, Implement, Migrate, Test, Document, Review, Deploy.
4) Dependencies
   - Note any ordering constraints between milestones/features.
5) Deliverables & Acceptance Criteria
   - Concrete outputs per milestone and simple acceptance criteria.

Constraints and style:
- Reflect the provided tech stack and best practices.
- Prefer pragmatic sequencing and parallelization opportunities where safe.
- Be concise but complete; avoid filler text.
- Output in clean markdown with headings and bullet lists only.
"#;

const MILESTONES_PROMPT: &str = r#"
You are a senior product/engineering planner.
Given a product requirement description, extract clear features and convert them into concise milestones.

Strictly follow this output structure in clean markdown:

# Features
- <feature-1>
- <feature-2>
- ...

# Milestones by Feature
## <feature-1>
- Schema: short milestone describing the data model work (tables, fields, indexes, migrations)
- API: short milestone describing backend/API endpoints and contracts
- UI: short milestone describing the user interface flows/components

## <feature-2>
- Schema: ...
- API: ...
- UI: ...

# Notes
- Keep each milestone 1-2 lines, crisp and actionable.
- Prefer verbs: Design, Implement, Migrate, Test, Document.
- If a feature does not require a category, write: "<category>: N/A".
- Do not include any prose outside of these sections.
"#;

const TASKS_PROMPT: &str = r#"
You are a senior delivery lead.
Given a list of milestones (from features like Schema, API, UI), break them down into concrete day-to-day engineering tasks.

Strictly follow this output format in clean markdown:

# Daily Task Plan

## <milestone-1>
- Day 1: <concise task>
  - Subtasks: <bullet(s) as needed>
- Day 2: <concise task>
- Day 3: <concise task>
...

## <milestone-2>
- Day 1: <concise task>
...

Guidelines:
- Keep tasks small, actionable, and specific (e.g., "Implement user table", "Create React login form").
- Prefer verbs: Design, Implement, Migrate, Test, Document, Review, Refactor, Deploy.
- Include testing and documentation tasks as appropriate.
- If a milestone is too small for multiple days, group multiple tasks under Day 1 and stop.
- Do not add prose outside the sections. Keep it concise and complete.
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct RoadmapInput {
    pub requirements: String,
    pub tech_stack: String,
    #[serde(default)]
    pub best_practices: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MilestonesInput {
    pub requirements: String,
    #[serde(default)]
    pub tech_stack: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TasksInput {
    pub milestones: String,
    #[serde(default)]
    pub tech_stack: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Roadmap, milestones and daily tasks produced in sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutput {
    pub roadmap: String,
    pub milestones: String,
    pub tasks: String,
}

impl ChainRunner {
    pub async fn generate_roadmap(&self, input: &RoadmapInput) -> Result<String> {
        let user = format!(
            "Requirements:\n{}\n\nTech Stack:\n{}\n\nBest Practices / Context (optional):\n{}\n\n\
             Please produce the roadmap now.",
            input.requirements.trim(),
            input.tech_stack.trim(),
            or_na(input.best_practices.as_deref()),
        );
        self.complete_text(ROADMAP_PROMPT, user, input.temperature)
            .await
    }

    pub async fn generate_milestones(&self, input: &MilestonesInput) -> Result<String> {
        let user = format!(
            "Requirements:\n{}\n\nTech Stack (optional):\n{}\n\n\
             Please extract features and produce milestones now.",
            input.requirements.trim(),
            or_na(input.tech_stack.as_deref()),
        );
        self.complete_text(MILESTONES_PROMPT, user, input.temperature)
            .await
    }

    pub async fn generate_tasks(&self, input: &TasksInput) -> Result<String> {
        let user = format!(
            "Milestones:\n{}\n\nTech Stack (optional):\n{}\n\n\
             Please produce a day-to-day task plan per milestone now.",
            input.milestones.trim(),
            or_na(input.tech_stack.as_deref()),
        );
        self.complete_text(TASKS_PROMPT, user, input.temperature)
            .await
    }

    /// Roadmap, then milestones from the roadmap, then tasks from the milestones.
    pub async fn generate_plan(&self, input: &RoadmapInput) -> Result<PlanOutput> {
        let roadmap = self.generate_roadmap(input).await?;
        let milestones = self
            .generate_milestones(&MilestonesInput {
                requirements: roadmap.clone(),
                tech_stack: Some(input.tech_stack.clone()),
                temperature: input.temperature,
            })
            .await?;
        let tasks = self
            .generate_tasks(&TasksInput {
                milestones: milestones.clone(),
                tech_stack: Some(input.tech_stack.clone()),
                temperature: input.temperature,
            })
            .await?;
        info!(
            roadmap = roadmap.len(),
            milestones = milestones.len(),
            tasks = tasks.len(),
            "plan generated"
        );
        Ok(PlanOutput {
            roadmap,
            milestones,
            tasks,
        })
    }
}
