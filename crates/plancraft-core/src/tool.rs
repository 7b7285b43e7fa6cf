use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Description of a tool as sent to the model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Unique name, e.g. "create_task".
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: String,
    /// JSON Schema of the parameters object.
    pub parameters: Value,
}

/// A request from the LLM to call a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub tool_name: String,
    pub arguments: Value,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    /// Observation fed back to the model.
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// Semantic type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    /// ISO-8601 date-time carried as a string.
    DateTime,
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Coerce a raw argument into this parameter's canonical JSON shape.
    fn coerce(&self, raw: &Value) -> Result<Value, String> {
        match self.kind {
            ParamKind::Integer => match raw {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Ok(json!(i))
                    } else if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0) {
                        Ok(json!(f as i64))
                    } else {
                        Err(format!("'{}' must be an integer, got {n}", self.name))
                    }
                }
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(|i| json!(i))
                    .map_err(|_| format!("'{}' must be an integer, got \"{s}\"", self.name)),
                other => Err(format!("'{}' must be an integer, got {other}", self.name)),
            },
            ParamKind::String | ParamKind::DateTime => match raw {
                Value::String(s) => Ok(Value::String(s.clone())),
                other => Err(format!("'{}' must be a string, got {other}", self.name)),
            },
        }
    }
}

/// A tool's name, description, and ordered parameter schema.
///
/// The same descriptor drives the schema sent to the model and local
/// validation of the arguments the model sends back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// Render the JSON Schema object advertised to the model.
    pub fn to_tool(&self) -> Tool {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for p in &self.params {
            let mut prop = Map::new();
            let ty = match p.kind {
                ParamKind::Integer => "integer",
                ParamKind::String | ParamKind::DateTime => "string",
            };
            prop.insert("type".into(), json!(ty));
            if p.kind == ParamKind::DateTime {
                prop.insert("format".into(), json!("date-time"));
            }
            let description = match &p.default {
                Some(d) => format!("{} Defaults to {d}.", p.description),
                None => p.description.clone(),
            };
            prop.insert("description".into(), json!(description));
            properties.insert(p.name.clone(), Value::Object(prop));
            if p.required {
                required.push(json!(p.name));
            }
        }
        Tool {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    /// Validate raw model arguments against the declared parameters.
    ///
    /// Returns only declared parameters, coerced to their canonical shape, with
    /// defaults filled in. Undeclared keys are dropped. `null` counts as absent.
    pub fn validate(&self, args: &Value) -> Result<Map<String, Value>, String> {
        let empty = Map::new();
        let given = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => return Err(format!("arguments must be an object, got {other}")),
        };

        let mut out = Map::new();
        for p in &self.params {
            match given.get(&p.name).filter(|v| !v.is_null()) {
                Some(raw) => {
                    out.insert(p.name.clone(), p.coerce(raw)?);
                }
                None => {
                    if let Some(ref d) = p.default {
                        out.insert(p.name.clone(), d.clone());
                    } else if p.required {
                        return Err(format!("missing required parameter '{}'", p.name));
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Trait implemented by anything that can execute tool calls.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// List all tools this executor provides.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a single tool call and return the result.
    async fn execute(&self, call: &ToolCall) -> crate::Result<ToolResult>;
}
