//! Single-shot prompt chains: render a template, call the model once, return
//! text or validated JSON.

pub mod design;
pub mod features;
pub mod planning;

use std::sync::Arc;

use once_cell::sync::Lazy;
use plancraft_config::{PlanConfig, ServicesConfig};
use plancraft_core::{PlanError, Result};
use plancraft_llm::{LlmProvider, LlmRequest, ResponseFormat};
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use design::{NodeKind, SystemDesignInput, UmlDesign, UmlNode, UmlRelationship, UmlSchema};
pub use features::{DependencyAnalysis, DependencyInput, FeatureBreakdown};
pub use planning::{MilestonesInput, PlanOutput, RoadmapInput, TasksInput};

static CODE_FENCE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\n?\s*```\s*$").ok());

pub(crate) fn default_temperature() -> f32 {
    0.2
}

/// Render an optional input, using `N/A` when absent or blank.
pub fn or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let inner = CODE_FENCE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1));
    match inner {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

/// Runs prompt chains against one provider.
#[derive(Clone)]
pub struct ChainRunner {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    services: ServicesConfig,
}

impl ChainRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &PlanConfig) -> Self {
        Self {
            provider,
            model: config.model.model.clone(),
            max_tokens: config.model.max_tokens,
            services: config.services.clone(),
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: String,
        temperature: f32,
        format: ResponseFormat,
    ) -> Result<String> {
        self.services.require_api_key()?;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(PlanError::Validation(
                "temperature must be between 0.0 and 1.0".into(),
            ));
        }
        let mut request = LlmRequest::prompt(&self.model, Some(system.trim().to_string()), user);
        request.temperature = temperature;
        request.max_tokens = self.max_tokens;
        request.response_format = format;

        let response = self.provider.complete(&request).await?;
        let text = response.message.text_content();
        debug!(
            provider = self.provider.name(),
            tokens = response.usage.total_tokens(),
            chars = text.len(),
            "chain completed"
        );
        Ok(text)
    }

    pub(crate) async fn complete_text(
        &self,
        system: &str,
        user: String,
        temperature: f32,
    ) -> Result<String> {
        let text = self
            .complete(system, user, temperature, ResponseFormat::Text)
            .await?;
        if text.trim().is_empty() {
            return Err(PlanError::MalformedOutput("model returned no text".into()));
        }
        Ok(text)
    }

    pub(crate) async fn complete_json<T: DeserializeOwned>(
        &self,
        system: &str,
        user: String,
        temperature: f32,
    ) -> Result<T> {
        let text = self
            .complete(system, user, temperature, ResponseFormat::Json)
            .await?;
        serde_json::from_str(strip_code_fence(&text)).map_err(|e| {
            warn!(error = %e, "model reply is not the expected JSON");
            PlanError::MalformedOutput(format!("failed to parse model response as JSON: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_inputs_render_as_na() {
        assert_eq!(or_na(None), "N/A");
        assert_eq!(or_na(Some("   ")), "N/A");
        assert_eq!(or_na(Some(" Rust \n")), "Rust");
    }

    #[test]
    fn strips_fences_with_and_without_language() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }
}
