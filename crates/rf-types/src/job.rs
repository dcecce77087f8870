//! Parameter spaces, run configuration and the job descriptor handed to the
//! external tuning engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Unique job identifier
pub type JobId = Uuid;

/// Canonical sections of a committed parameter space, in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSection {
    Environment,
    Framework,
    Rollouts,
    Training,
    Resources,
    Evaluation,
}

impl ParameterSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Framework => "framework",
            Self::Rollouts => "rollouts",
            Self::Training => "training",
            Self::Resources => "resources",
            Self::Evaluation => "evaluation",
        }
    }
}

impl fmt::Display for ParameterSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration, one sub-mapping per section.
///
/// Built once by a construct commit and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    sections: BTreeMap<ParameterSection, Map<String, Value>>,
}

impl ParameterSpace {
    pub fn from_sections<I>(sections: I) -> Self
    where
        I: IntoIterator<Item = (ParameterSection, Map<String, Value>)>,
    {
        Self {
            sections: sections.into_iter().collect(),
        }
    }

    pub fn section(&self, section: ParameterSection) -> Option<&Map<String, Value>> {
        self.sections.get(&section)
    }

    pub fn sections(&self) -> impl Iterator<Item = (ParameterSection, &Map<String, Value>)> {
        self.sections.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Merge every section into one flat mapping, the shape RLlib expects
    /// for `param_space`.
    pub fn flatten(&self) -> Map<String, Value> {
        let mut flat = Map::new();
        for values in self.sections.values() {
            for (key, value) in values {
                flat.insert(key.clone(), value.clone());
            }
        }
        flat
    }
}

/// Stop criteria, metric name to limit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopConditions(BTreeMap<String, Value>);

impl StopConditions {
    pub const TRAINING_ITERATION: &'static str = "training_iteration";
    pub const TIMESTEPS_TOTAL: &'static str = "timesteps_total";
    pub const EPISODE_REWARD_MEAN: &'static str = "episode_reward_mean";

    /// Metrics every run configuration has to bound.
    pub const REQUIRED: [&'static str; 3] = [
        Self::TRAINING_ITERATION,
        Self::TIMESTEPS_TOTAL,
        Self::EPISODE_REWARD_MEAN,
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: impl Into<String>, limit: Value) -> Self {
        self.0.insert(metric.into(), limit);
        self
    }

    pub fn get(&self, metric: &str) -> Option<&Value> {
        self.0.get(metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Checkpoint policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Checkpoint every N training iterations (0 disables periodic checkpoints).
    pub checkpoint_frequency: u64,
    pub checkpoint_at_end: bool,
}

/// Run-level configuration, independent of any construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub stop: StopConditions,
    pub checkpoint: CheckpointConfig,
    pub verbose: u8,
}

/// Everything the external tuning engine needs to launch one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    id: JobId,
    trainable: String,
    algorithm: String,
    param_space: ParameterSpace,
    run_config: RunConfig,
    created_at: DateTime<Utc>,
}

impl JobDescriptor {
    pub fn new(
        trainable: String,
        algorithm: String,
        param_space: ParameterSpace,
        run_config: RunConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trainable,
            algorithm,
            param_space,
            run_config,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Trainable target identifier.
    pub fn trainable(&self) -> &str {
        &self.trainable
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn param_space(&self) -> &ParameterSpace {
        &self.param_space
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Payload for the Python-side `tune.Tuner` driver.
    pub fn to_tune_payload(&self) -> Value {
        json!({
            "job_id": self.id,
            "trainable": self.trainable,
            "algorithm": self.algorithm,
            "param_space": self.param_space.flatten(),
            "run_config": {
                "stop": self.run_config.stop,
                "checkpoint_config": self.run_config.checkpoint,
                "verbose": self.run_config.verbose,
            },
            "created_at": self.created_at,
        })
    }
}
