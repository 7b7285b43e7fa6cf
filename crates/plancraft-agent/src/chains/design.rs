use std::collections::HashSet;

use plancraft_core::{PlanError, ProjectId, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ChainRunner, default_temperature, or_na};

const SYSTEM_DESIGN_PROMPT: &str = r#"
You are a principal systems architect. Given product features, expected users, and geography,
produce a pragmatic, production-ready system design.

Strictly output clean markdown with these sections only:

# High-Level Architecture
- Overall architecture style (monolith, microservices, modular monolith) with rationale
- Data flow at a glance (ingress -> processing -> storage -> egress)

# Core Components
- List services/components with concise responsibilities
- For each, specify interfaces/APIs and key dependencies

# Data Storage & Models
- Primary databases and rationale (SQL/NoSQL/time-series/etc.)
- Key entities/tables/collections and relationships
- Indexing, partitioning/sharding strategy, and expected data volumes

# Traffic, Scale & Performance
- Estimated QPS/throughput and growth assumptions
- Latency budgets per critical path and how they are met (caching, async, batching)
- Caching layers (client, CDN, edge, server, DB) and eviction policies

# Geography & Multi-Region Strategy
- Where users are located and what this implies (CDN POPs, edge compute, data residency)
- Region selection, active-active/active-passive, failover/RTO/RPO
- Compliance considerations (GDPR/CCPA/data sovereignty) if relevant

# Reliability & Operations
- Observability (logs, metrics, traces, dashboards, alerts)
- Resiliency patterns (circuit breakers, retries with backoff, idempotency)
- Deployment strategy (CI/CD, blue/green or canary), infra-as-code

# Security & Compliance
- AuthN/AuthZ approach (OIDC, JWT, RBAC/ABAC)
- Secrets management, encryption in transit/at rest, key management
- Threat model notes and mitigations

# API Design
- External/internal APIs with example endpoints and payload shapes
- Versioning, pagination, error handling conventions

# Data Lifecycle
- Backups, retention, archival, GDPR delete
- Migrations and schema evolution strategy

# Cost Considerations
- Primary cost drivers and cost-control levers (autoscaling, storage tiers, cache hit rate)

# Phased Evolution
- MVP architecture
- Near-term scaling steps
- Longer-term refactors

Notes:
- Be concise but complete. Use bullet points, no prose outside sections above.
- Align recommendations with inputs and good engineering practices.
"#;

const UML_PROMPT: &str = r#"
You are a principal systems architect. Given product features, expected users, and geography,
design the system and describe it as a diagram a canvas editor can render.

Respond with a single JSON object and nothing else, in exactly this shape:

{
  "type": "system",
  "uml_schema": {
    "nodes": [
      {"id": "api", "name": "API Service", "type": "service", "x": 100, "y": 80, "w": 160, "h": 60, "description": "Handles REST traffic"}
    ],
    "relationships": [
      {"source": "lb", "to": "api", "type": "http"}
    ]
  }
}

Rules:
- Node "type" must be one of: database, load_balancer, service, queue, cache.
- Every node "id" is unique; relationships reference existing node ids only.
- Lay nodes out left to right in request order, without overlaps; x, y, w, h are pixels.
- Relationship "type" names the interaction, e.g. "http", "grpc", "reads", "writes", "publishes".
- Reflect the expected scale and geography (replicas, caches, queues) where it matters.
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct SystemDesignInput {
    pub features: String,
    pub expected_users: String,
    pub geography: String,
    #[serde(default)]
    pub constraints: Option<String>,
    #[serde(default)]
    pub tech_stack: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Database,
    LoadBalancer,
    Service,
    Queue,
    Cache,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UmlNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UmlRelationship {
    pub source: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UmlSchema {
    #[serde(default)]
    pub nodes: Vec<UmlNode>,
    #[serde(default)]
    pub relationships: Vec<UmlRelationship>,
}

/// A generated design diagram, ready to persist as a project UML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UmlDesign {
    #[serde(rename = "type")]
    pub design_type: String,
    pub uml_schema: UmlSchema,
}

impl UmlDesign {
    /// Node ids must be unique and every relationship must join known nodes.
    pub fn validate(&self) -> Result<()> {
        if self.design_type.trim().is_empty() {
            return Err(PlanError::MalformedOutput("design type is empty".into()));
        }
        let mut ids = HashSet::new();
        for node in &self.uml_schema.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(PlanError::MalformedOutput(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }
        for rel in &self.uml_schema.relationships {
            for end in [&rel.source, &rel.to] {
                if !ids.contains(end.as_str()) {
                    return Err(PlanError::MalformedOutput(format!(
                        "relationship references unknown node '{end}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn design_inputs(input: &SystemDesignInput) -> String {
    format!(
        "Inputs\n\nFeatures:\n{}\n\nExpected Users (types, scale, usage patterns):\n{}\n\n\
         Geography (where users are, data residency, latency needs):\n{}\n\n\
         Tech Stack (optional):\n{}\n\nConstraints/Notes (optional):\n{}",
        input.features.trim(),
        input.expected_users.trim(),
        input.geography.trim(),
        or_na(input.tech_stack.as_deref()),
        or_na(input.constraints.as_deref()),
    )
}

impl ChainRunner {
    /// Markdown system design.
    pub async fn generate_system_design_text(&self, input: &SystemDesignInput) -> Result<String> {
        let user = format!(
            "{}\n\nPlease produce the system design now.",
            design_inputs(input)
        );
        self.complete_text(SYSTEM_DESIGN_PROMPT, user, input.temperature)
            .await
    }

    /// System design as a validated diagram.
    pub async fn generate_system_design(&self, input: &SystemDesignInput) -> Result<UmlDesign> {
        let user = format!(
            "{}\n\nPlease produce the system design diagram JSON now.",
            design_inputs(input)
        );
        let design: UmlDesign = self
            .complete_json(UML_PROMPT, user, input.temperature)
            .await?;
        design.validate()?;
        info!(
            project = ?input.project_id,
            nodes = design.uml_schema.nodes.len(),
            relationships = design.uml_schema.relationships.len(),
            "system design generated"
        );
        Ok(design)
    }
}
