use serde::{Deserialize, Serialize};

use crate::tool::ToolCall;

/// One tool invocation made while answering a query, with its observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub call: ToolCall,
    pub observation: String,
    pub is_error: bool,
}

/// Ordered record of every tool invocation made during one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTrace {
    steps: Vec<TraceStep>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: TraceStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the invoked tools, in order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.call.tool_name.as_str()).collect()
    }
}

impl FromIterator<TraceStep> for ExecutionTrace {
    fn from_iter<I: IntoIterator<Item = TraceStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}
