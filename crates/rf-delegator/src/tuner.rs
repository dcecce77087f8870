//! Tuner-level delegation: run configuration plus the trainable's parameter
//! space, assembled into a job descriptor.

use std::path::Path;
use tracing::info;

use rf_construct::{ConstructRegistry, ConstructRegistryDirective};
use rf_types::{DirectiveNode, DirectiveTree, JobDescriptor, RfResult};

use crate::run_config::resolve_run_config;
use crate::trainable::TrainableConstructDelegator;

/// Composes a [`TrainableConstructDelegator`] with the run configuration of a
/// tuner directive.
#[derive(Debug)]
pub struct TunerDelegator {
    tuner_directive: DirectiveTree,
    trainable_delegator: TrainableConstructDelegator,
}

impl TunerDelegator {
    /// `construct_directive` is the `{ choice, path_to_construct_file }` node,
    /// `tuner_directive` the node holding `ai-runtime-conditions`.
    pub fn from_trial_directive(
        construct_directive: &DirectiveNode<'_>,
        tuner_directive: &DirectiveNode<'_>,
        trainable_dir: &Path,
    ) -> RfResult<Self> {
        Self::with_registry(
            ConstructRegistry::global(),
            construct_directive,
            tuner_directive,
            trainable_dir,
        )
    }

    pub fn with_registry(
        registry: &ConstructRegistry,
        construct_directive: &DirectiveNode<'_>,
        tuner_directive: &DirectiveNode<'_>,
        trainable_dir: &Path,
    ) -> RfResult<Self> {
        let directive = ConstructRegistryDirective::from_directive(construct_directive)?;
        let trainable_delegator =
            TrainableConstructDelegator::with_registry(registry, directive, trainable_dir)?;

        Ok(Self {
            tuner_directive: tuner_directive.to_tree(),
            trainable_delegator,
        })
    }

    /// Resolve the run configuration, commit the trainable and assemble the
    /// job descriptor. Nothing is returned unless every step succeeds.
    pub fn delegate_tuner_entity(self) -> RfResult<JobDescriptor> {
        let run_config = resolve_run_config(&self.tuner_directive.root())?;
        let committed = self.trainable_delegator.into_committed()?;

        let job = JobDescriptor::new(
            committed.target,
            committed.algorithm,
            committed.param_space,
            run_config,
        );
        info!(
            "Assembled job {} for {} on {}",
            job.id(),
            job.algorithm(),
            job.trainable()
        );
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_types::{load_directive_file, ParameterSection, RfError};
    use serde_json::json;
    use std::path::PathBuf;

    fn trainables_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/trainables")
    }

    fn construct_file() -> serde_json::Value {
        let tree = load_directive_file(&trainables_dir().join("ppo-cartpole.yaml")).unwrap();
        tree.as_value().clone()
    }

    fn top_level(path: &str) -> DirectiveTree {
        DirectiveTree::new(json!({
            "construct-registry": { "choice": "ppo", "path_to_construct_file": path },
            "tuner-space": {
                "ai-runtime-conditions": {
                    "run-config": { "verbose": { "choice": 2 } },
                    "stop-config": {
                        "training_iteration": { "choice": 100 },
                        "timesteps_total": { "choice": 100000 },
                        "episode_reward_mean": { "choice": 475 }
                    },
                    "checkpoint-config": {
                        "checkpoint_frequency": { "choice": 5 },
                        "checkpoint_at_end": { "choice": true }
                    }
                }
            }
        }))
    }

    fn delegator(tree: &DirectiveTree, dir: &Path) -> RfResult<TunerDelegator> {
        TunerDelegator::from_trial_directive(
            &tree.section("construct-registry")?,
            &tree.section("tuner-space")?,
            dir,
        )
    }

    #[test]
    fn assembles_job_descriptor() {
        let dir = trainables_dir();
        let tree = top_level("ppo-cartpole.yaml");

        let job = delegator(&tree, &dir).unwrap().delegate_tuner_entity().unwrap();

        assert_eq!(job.trainable(), "CartPole-v1");
        assert_eq!(job.algorithm(), "PPO");
        assert_eq!(job.param_space().len(), 6);
        assert_eq!(
            job.param_space().section(ParameterSection::Training).unwrap()["lr"],
            json!(0.0003)
        );
        assert_eq!(job.run_config().stop.get("timesteps_total"), Some(&json!(100000)));
        assert!(job.run_config().checkpoint.checkpoint_at_end);
        assert_eq!(job.run_config().verbose, 2);
    }

    #[test]
    fn nonexistent_construct_file_fails_at_construction() {
        let dir = trainables_dir();
        let tree = top_level("does-not-exist.yaml");

        let err = delegator(&tree, &dir).unwrap_err();
        assert!(matches!(err, RfError::ConfigNotFound { .. }));
    }

    #[test]
    fn run_config_failure_aborts_assembly() {
        let dir = trainables_dir();
        let mut value = top_level("ppo-cartpole.yaml").as_value().clone();
        value["tuner-space"]["ai-runtime-conditions"]["run-config"] = json!({});
        let tree = DirectiveTree::new(value);

        let err = delegator(&tree, &dir)
            .unwrap()
            .delegate_tuner_entity()
            .unwrap_err();
        assert_eq!(
            err.directive_path(),
            Some("tuner-space.ai-runtime-conditions.run-config.verbose")
        );
    }

    #[test]
    fn construct_failure_aborts_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = construct_file();
        file["ppo-directive"].as_object_mut().unwrap().remove("evaluation");
        std::fs::write(dir.path().join("ppo-cartpole.yaml"), file.to_string()).unwrap();
        let tree = top_level("ppo-cartpole.yaml");

        let err = delegator(&tree, dir.path())
            .unwrap()
            .delegate_tuner_entity()
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::MissingSection { ref section } if section == "ppo-directive.evaluation"
        ));
    }

    #[test]
    fn unknown_construct_type_fails() {
        let dir = trainables_dir();
        let mut value = top_level("ppo-cartpole.yaml").as_value().clone();
        value["construct-registry"]["choice"] = json!("sac");
        let tree = DirectiveTree::new(value);

        let err = delegator(&tree, &dir).unwrap_err();
        assert!(matches!(err, RfError::UnknownConstruct { ref construct_type } if construct_type == "sac"));
    }
}
