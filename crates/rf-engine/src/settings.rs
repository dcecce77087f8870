use std::path::PathBuf;

use crate::runtime::RuntimeConfig;

/// Where the engine finds its directives and how it reaches the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Top-level experiment directive file.
    pub config_path: PathBuf,
    /// Directory construct files are resolved against.
    pub trainable_config_dir: PathBuf,
    pub runtime: RuntimeConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("configs/basic-config.yaml"),
            trainable_config_dir: PathBuf::from("configs/trainables"),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl EngineSettings {
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn with_trainable_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trainable_config_dir = dir.into();
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }
}
