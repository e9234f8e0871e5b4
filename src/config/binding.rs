//! Config binding facade.
//!
//! Binds an application's external configuration document to a typed value.
//! The source key is `<root>/<application>.<env>.<format>`.

use arc_swap::ArcSwap;
use notify::RecommendedWatcher;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::loader::ConfigError;
use crate::config::watcher::ConfigWatcher;
use crate::factory::BackendFactory;
use crate::outcome::{BoxError, BoxResult, Code};
use crate::validate::{Field, Validate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    pub fn decode<T: DeserializeOwned>(self, content: &str) -> Result<T, ConfigError> {
        Ok(match self {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        })
    }
}

/// Options of the config binding facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOption {
    pub application: String,
    pub env: String,
    /// Directory holding the documents.
    pub root: String,
    pub format: ConfigFormat,
    /// Reload when the document changes.
    pub update: bool,
    pub interval_secs: u64,
}

impl Default for ConfigOption {
    fn default() -> Self {
        Self {
            application: String::new(),
            env: String::new(),
            root: "config".to_string(),
            format: ConfigFormat::Toml,
            update: false,
            interval_secs: 2,
        }
    }
}

impl Validate for ConfigOption {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("application", "application name", &self.application, "required"),
            Field::new("env", "environment", &self.env, "required"),
            Field::new("root", "config root", &self.root, "required"),
            Field::new("format", "config format", self.format.as_str(), "oneof=toml json"),
            Field::new("interval_secs", "refresh interval", self.interval_secs, "gte=1"),
        ]
    }
}

impl ConfigOption {
    pub fn source(&self) -> PathBuf {
        Path::new(&self.root).join(format!(
            "{}.{}.{}",
            self.application,
            self.env,
            self.format.as_str()
        ))
    }
}

/// A typed, hot-swappable view of a configuration document.
pub struct ConfigBinding<T> {
    source: PathBuf,
    format: ConfigFormat,
    current: Arc<ArcSwap<T>>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl<T> ConfigBinding<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    pub const DISCRIMINATOR: &'static str = "file";

    /// Load the document and, if requested, start watching it.
    pub fn open(option: &ConfigOption) -> BoxResult<Self> {
        let source = option.source();
        let value = read::<T>(&source, option.format).map_err(BoxError::from)?;
        let binding = Self {
            source,
            format: option.format,
            current: Arc::new(ArcSwap::from_pointee(value)),
            watcher: Mutex::new(None),
        };
        if option.update {
            binding.watch(Duration::from_secs(option.interval_secs.max(1)))?;
        }
        Ok(binding)
    }

    /// Constructor table for the config binding facade.
    pub fn factory() -> BackendFactory<ConfigBinding<T>, ConfigOption> {
        let mut factory = BackendFactory::new("config");
        factory.register(Self::DISCRIMINATOR, |ctx, option: &ConfigOption| {
            tracing::info!(trace = %ctx, source = ?option.source(), "Binding config document");
            Ok(Arc::new(Self::open(option)?))
        });
        factory
    }

    /// The latest successfully loaded value.
    pub fn current(&self) -> Arc<T> {
        self.current.load_full()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.lock().expect("watcher lock poisoned").is_some()
    }

    /// Re-read the document now. On failure the current value is kept.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let value = read::<T>(&self.source, self.format)?;
        self.current.store(Arc::new(value));
        Ok(())
    }

    fn watch(&self, interval: Duration) -> BoxResult<()> {
        let current = self.current.clone();
        let format = self.format;
        let watcher = ConfigWatcher::new(&self.source, interval)
            .run(move |path| match read::<T>(path, format) {
                Ok(value) => {
                    current.store(Arc::new(value));
                    tracing::info!(path = ?path, "Config reloaded");
                }
                Err(e) => {
                    tracing::error!(path = ?path, error = %e, "Failed to reload config, keeping current value");
                }
            })
            .map_err(|e| {
                BoxError::new(Code::RUNTIME_PARAM_ERROR, "failed to watch config source").with_cause(e)
            })?;
        *self.watcher.lock().expect("watcher lock poisoned") = Some(watcher);
        Ok(())
    }
}

fn read<T: DeserializeOwned>(path: &Path, format: ConfigFormat) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    format.decode(&content)
}
