use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::PlanConfig;

static SETTINGS: OnceCell<PlanConfig> = OnceCell::new();

/// Loads the Plancraft configuration.
pub struct ConfigLoader {
    config: PlanConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > PLANCRAFT_CONFIG env > ./plancraft.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        Self::resolve_path_from(explicit, |k| std::env::var(k).ok())
    }

    fn resolve_path_from(
        explicit: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Some(p) = lookup("PLANCRAFT_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("plancraft.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> plancraft_core::Result<Self> {
        Self::load_with(path, |k| std::env::var(k).ok())
    }

    /// Load with an explicit environment lookup.
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> plancraft_core::Result<Self> {
        let config_path = Self::resolve_path_from(path, &lookup);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str::<PlanConfig>(&raw).map_err(|e| {
                plancraft_core::PlanError::Config(format!(
                    "failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            PlanConfig::default()
        };

        let config = Self::apply_overrides_from(config, &lookup);

        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(plancraft_core::PlanError::Config(e));
            }
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Get a copy of the loaded config.
    pub fn get(&self) -> PlanConfig {
        self.config.clone()
    }

    /// Consume the loader and return the config.
    pub fn into_config(self) -> PlanConfig {
        self.config
    }

    /// Path the config was resolved from.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (PLANCRAFT_MODEL, PLANCRAFT_LISTEN, etc.)
    pub fn apply_env_overrides(config: PlanConfig) -> PlanConfig {
        Self::apply_overrides_from(config, |k| std::env::var(k).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment.
    pub fn apply_overrides_from(
        mut config: PlanConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> PlanConfig {
        if let Some(v) = lookup("PLANCRAFT_MODEL") {
            config.model.model = v;
        }
        if let Some(v) = lookup("PLANCRAFT_LISTEN") {
            config.server.listen = v;
        }
        if let Some(v) = lookup("PLANCRAFT_DB") {
            config.database.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("PLANCRAFT_LOG_LEVEL") {
            config.logging.level = v;
        }
        // Config file takes priority, then API_KEY, then GOOGLE_API_KEY.
        // A blank key counts as absent.
        if config
            .services
            .api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
        {
            config.services.api_key = lookup("API_KEY")
                .filter(|v| !v.is_empty())
                .or_else(|| lookup("GOOGLE_API_KEY").filter(|v| !v.is_empty()));
        }
        config
    }
}

/// Process-wide settings, loaded once from the default location on first use.
pub fn settings() -> plancraft_core::Result<&'static PlanConfig> {
    SETTINGS.get_or_try_init(|| ConfigLoader::load(None).map(ConfigLoader::into_config))
}

/// Seed the process-wide settings from `path`. A no-op once settings are loaded.
pub fn init_settings(path: Option<&Path>) -> plancraft_core::Result<&'static PlanConfig> {
    SETTINGS.get_or_try_init(|| ConfigLoader::load(path).map(ConfigLoader::into_config))
}
