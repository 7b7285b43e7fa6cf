use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Message raised whenever a model-calling operation runs without a credential.
pub const MISSING_API_KEY_MESSAGE: &str =
    "API key is not set. Please set API_KEY or GOOGLE_API_KEY in your environment/.env.";

/// Root configuration — maps to `plancraft.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub model: ModelConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub services: ServicesConfig,
}

// ── Model ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Hosted model identifier, e.g. "gemini-1.5-flash".
    pub model: String,
    /// Sampling temperature for the prompt chains (0.0 - 1.0).
    pub temperature: f32,
    /// Sampling temperature for the chat agent.
    pub agent_temperature: f32,
    /// Maximum output tokens per model call.
    pub max_tokens: u32,
    /// Maximum tool-calling rounds per chat query before the agent is stopped.
    pub max_iterations: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".into(),
            temperature: 0.2,
            agent_temperature: 0.2,
            max_tokens: 8192,
            max_iterations: 10,
        }
    }
}

// ── Database ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("plancraft.db"),
        }
    }
}

// ── Server ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address.
    pub listen: String,
    /// Enable permissive CORS.
    pub cors: bool,
    /// Optional shared bearer secret required on every API route.
    pub api_key: Option<String>,
    /// Header carrying the authenticated user id, set by the fronting auth gateway.
    pub user_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".into(),
            cors: true,
            api_key: None,
            user_header: "x-user-id".into(),
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Services ───────────────────────────────────────────────────

/// Credentials and endpoints for the hosted model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Model API key. Falls back to API_KEY, then GOOGLE_API_KEY.
    pub api_key: Option<String>,
    /// Base URL of the generative language API.
    pub api_base_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

impl ServicesConfig {
    /// Return the credential or the fatal configuration error.
    pub fn require_api_key(&self) -> plancraft_core::Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                plancraft_core::PlanError::MissingCredential(MISSING_API_KEY_MESSAGE.into())
            })
    }

    /// The credential with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|k| {
            let tail: String = k
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            if k.chars().count() <= 4 {
                "****".into()
            } else {
                format!("****{tail}")
            }
        })
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };
        write!(f, "{} {}: {}", label, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl PlanConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Model ───
        if self.model.model.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "model.model".into(),
                message: "model is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 'gemini-1.5-flash'".into()),
            });
        }

        for (field, t) in [
            ("model.temperature", self.model.temperature),
            ("model.agent_temperature", self.model.agent_temperature),
        ] {
            if !(0.0..=1.0).contains(&t) {
                warnings.push(ConfigWarning {
                    field: field.into(),
                    message: format!("temperature {} is out of range", t),
                    severity: WarningSeverity::Error,
                    hint: Some("Temperature must be between 0.0 and 1.0".into()),
                });
            }
        }

        if self.model.max_tokens == 0 {
            warnings.push(ConfigWarning {
                field: "model.max_tokens".into(),
                message: "max_tokens is 0, the model won't produce output".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 8192".into()),
            });
        }

        if self.model.max_iterations == 0 {
            warnings.push(ConfigWarning {
                field: "model.max_iterations".into(),
                message: "max_iterations is 0, the chat agent can never answer".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 10".into()),
            });
        }

        // ── Server listen address ───
        if self.server.listen.is_empty() {
            warnings.push(ConfigWarning {
                field: "server.listen".into(),
                message: "listen address is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. '127.0.0.1:8000'".into()),
            });
        } else if self.server.listen.starts_with("0.0.0.0") && self.server.api_key.is_none() {
            warnings.push(ConfigWarning {
                field: "server.api_key".into(),
                message: "no API key set while server is network-accessible".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set server.api_key or keep the server behind the auth gateway".into()),
            });
        }

        if self.server.user_header.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "server.user_header".into(),
                message: "user header name is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 'x-user-id'".into()),
            });
        }

        // ── Credential ───
        if self.services.api_key.is_none() {
            warnings.push(ConfigWarning {
                field: "services.api_key".into(),
                message: "no model API key configured; model-backed routes will fail".into(),
                severity: WarningSeverity::Info,
                hint: Some("Set API_KEY or GOOGLE_API_KEY".into()),
            });
        }

        // ── Logging ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
