//! Proximal policy optimization construct.
//!
//! Directive file layout:
//!
//! ```yaml
//! env-directive:
//!   prefix: { choice: CartPole-v1 }
//! ppo-directive:
//!   framework: { choice: torch }
//!   rollouts: { num-workers: ..., num-envs-per-worker: ..., rollout_fragment_length: ... }
//!   training: { lr: ..., lambda_: ..., gamma: ..., sgd_minibatch_size: ..., use_gae: ...,
//!               train_batch_size: ..., num_sgd_iter: ..., clip_param: ..., model: ... }
//!   resources: { num_gpus: ... }
//!   evaluation: { evaluation-interval: ..., evaluation-duration: ... }
//! ```

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

use rf_types::{load_directive_file, DirectiveNode, DirectiveTree, ParameterSection, RfError, RfResult};

use crate::construct::{Construct, ConstructRegistryDirective, SectionResult};

const ENV_DIRECTIVE: &str = "env-directive";
const PPO_DIRECTIVE: &str = "ppo-directive";

// (directive key, committed key) pairs per section.
const ROLLOUT_KEYS: &[(&str, &str)] = &[
    ("num-workers", "num_rollout_workers"),
    ("num-envs-per-worker", "num_envs_per_worker"),
    ("rollout_fragment_length", "rollout_fragment_length"),
];

const TRAINING_KEYS: &[(&str, &str)] = &[
    ("lr", "lr"),
    ("lambda_", "lambda_"),
    ("gamma", "gamma"),
    ("sgd_minibatch_size", "sgd_minibatch_size"),
    ("use_gae", "use_gae"),
    ("train_batch_size", "train_batch_size"),
    ("num_sgd_iter", "num_sgd_iter"),
    ("clip_param", "clip_param"),
    ("model", "model"),
];

const RESOURCE_KEYS: &[(&str, &str)] = &[("num_gpus", "num_gpus")];

const EVALUATION_KEYS: &[(&str, &str)] = &[
    ("evaluation-interval", "evaluation_interval"),
    ("evaluation-duration", "evaluation_duration"),
];

/// Translates a PPO directive file into an RLlib-shaped parameter space.
#[derive(Debug, Clone)]
pub struct PpoConstruct {
    registry_directive: ConstructRegistryDirective,
    configuration: Option<DirectiveTree>,
}

impl PpoConstruct {
    pub const CONSTRUCT_TYPE: &'static str = "ppo";
    pub const ALGORITHM: &'static str = "PPO";

    /// An unloaded construct; [`PpoConstruct::load`] must run before commit.
    pub fn new(registry_directive: ConstructRegistryDirective) -> Self {
        Self {
            registry_directive,
            configuration: None,
        }
    }

    pub fn from_construct_registry_directive(
        registry_directive: &ConstructRegistryDirective,
        trainable_dir: &Path,
    ) -> RfResult<Self> {
        let mut construct = Self::new(registry_directive.clone());
        construct.load(trainable_dir)?;
        Ok(construct)
    }

    /// Build from an already parsed directive tree.
    pub fn with_configuration(
        registry_directive: ConstructRegistryDirective,
        configuration: DirectiveTree,
    ) -> Self {
        Self {
            registry_directive,
            configuration: Some(configuration),
        }
    }

    /// Registry entry point.
    pub fn factory(
        registry_directive: &ConstructRegistryDirective,
        trainable_dir: &Path,
    ) -> RfResult<Box<dyn Construct>> {
        Ok(Box::new(Self::from_construct_registry_directive(
            registry_directive,
            trainable_dir,
        )?))
    }

    pub fn load(&mut self, trainable_dir: &Path) -> RfResult<()> {
        let path = self.registry_directive.construct_file(trainable_dir);
        info!("Loading PPO construct from {}", path.display());
        self.configuration = Some(load_directive_file(&path)?);
        Ok(())
    }

    fn configuration(&self) -> RfResult<&DirectiveTree> {
        self.configuration.as_ref().ok_or_else(|| RfError::NotInitialized {
            construct: Self::CONSTRUCT_TYPE.to_string(),
        })
    }

    fn env_config(config: &DirectiveTree) -> RfResult<Map<String, Value>> {
        let env = config.section(ENV_DIRECTIVE)?;
        collect(&env, &[("prefix", "env")])
    }

    fn framework_config(ppo: &DirectiveNode<'_>) -> RfResult<Map<String, Value>> {
        collect(ppo, &[("framework", "framework")])
    }

    fn subsection_config(
        ppo: &DirectiveNode<'_>,
        name: &str,
        keys: &[(&str, &str)],
    ) -> RfResult<Map<String, Value>> {
        collect(&ppo.section(name)?, keys)
    }
}

impl Construct for PpoConstruct {
    fn construct_type(&self) -> &'static str {
        Self::CONSTRUCT_TYPE
    }

    fn algorithm(&self) -> &'static str {
        Self::ALGORITHM
    }

    fn is_loaded(&self) -> bool {
        self.configuration.is_some()
    }

    fn resolve_sections(&self) -> RfResult<Vec<SectionResult>> {
        let config = self.configuration()?;

        let env = Self::env_config(config).map(|values| (ParameterSection::Environment, values));

        // The five algorithm sections share one parent; a missing parent is a
        // single failure, not five.
        let ppo = match config.section(PPO_DIRECTIVE) {
            Ok(ppo) => ppo,
            Err(err) => return Ok(vec![env, Err(err)]),
        };

        let sections = vec![
            (ParameterSection::Framework, Self::framework_config(&ppo)),
            (
                ParameterSection::Rollouts,
                Self::subsection_config(&ppo, "rollouts", ROLLOUT_KEYS),
            ),
            (
                ParameterSection::Training,
                Self::subsection_config(&ppo, "training", TRAINING_KEYS),
            ),
            (
                ParameterSection::Resources,
                Self::subsection_config(&ppo, "resources", RESOURCE_KEYS),
            ),
            (
                ParameterSection::Evaluation,
                Self::subsection_config(&ppo, "evaluation", EVALUATION_KEYS),
            ),
        ];

        debug!("Resolved {} PPO sections", sections.len() + 1);
        Ok(std::iter::once(env)
            .chain(
                sections
                    .into_iter()
                    .map(|(section, result)| result.map(|values| (section, values))),
            )
            .collect())
    }

    fn target(&self) -> RfResult<String> {
        let config = self.configuration()?;
        let path = format!("{ENV_DIRECTIVE}.prefix");
        match config.resolve(&path)? {
            Value::String(prefix) => Ok(prefix),
            other => Err(RfError::InvalidValue {
                path,
                message: format!("environment prefix must be a string, found {other}"),
            }),
        }
    }
}

/// Unwrap each listed key of `node`, renaming it for the committed mapping.
/// Stops at the first missing key.
fn collect(node: &DirectiveNode<'_>, keys: &[(&str, &str)]) -> RfResult<Map<String, Value>> {
    let mut values = Map::new();
    for (directive_key, committed_key) in keys {
        values.insert(committed_key.to_string(), node.choice(directive_key)?);
    }
    Ok(values)
}
