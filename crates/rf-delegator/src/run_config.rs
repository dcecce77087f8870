//! Run configuration resolution from a tuner directive.
//!
//! ```yaml
//! ai-runtime-conditions:
//!   run-config:        { verbose: { choice: 1 } }
//!   stop-config:       { training_iteration: ..., timesteps_total: ..., episode_reward_mean: ... }
//!   checkpoint-config: { checkpoint_frequency: ..., checkpoint_at_end: ... }
//! ```

use tracing::debug;

use rf_types::{CheckpointConfig, DirectiveNode, RfResult, RunConfig, StopConditions};

pub const AI_RUNTIME_CONDITIONS: &str = "ai-runtime-conditions";
pub const RUN_CONFIG: &str = "run-config";
pub const STOP_CONFIG: &str = "stop-config";
pub const CHECKPOINT_CONFIG: &str = "checkpoint-config";

/// Resolve stop, checkpoint and verbosity settings under
/// `ai-runtime-conditions` of the tuner directive.
pub fn resolve_run_config(tuner_directive: &DirectiveNode<'_>) -> RfResult<RunConfig> {
    let conditions = tuner_directive.section(AI_RUNTIME_CONDITIONS)?;

    let stop = resolve_stop_conditions(&conditions.section(STOP_CONFIG)?)?;

    let checkpoint_section = conditions.section(CHECKPOINT_CONFIG)?;
    let checkpoint = CheckpointConfig {
        checkpoint_frequency: checkpoint_section.choice_as("checkpoint_frequency")?,
        checkpoint_at_end: checkpoint_section.choice_as("checkpoint_at_end")?,
    };

    let verbose = conditions.section(RUN_CONFIG)?.choice_as("verbose")?;

    debug!(
        "Resolved run config: {} stop conditions, checkpoint every {} iterations",
        stop.len(),
        checkpoint.checkpoint_frequency
    );

    Ok(RunConfig {
        stop,
        checkpoint,
        verbose,
    })
}

/// The three standard limits are mandatory; any other enveloped entry is
/// kept as an extra stop criterion.
fn resolve_stop_conditions(stop: &DirectiveNode<'_>) -> RfResult<StopConditions> {
    let mut conditions = StopConditions::new();
    for metric in StopConditions::REQUIRED {
        conditions = conditions.with(metric, stop.choice(metric)?);
    }
    for metric in stop.keys() {
        if !StopConditions::REQUIRED.iter().any(|required| *required == metric) {
            conditions = conditions.with(metric, stop.choice(metric)?);
        }
    }
    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_types::{DirectiveTree, RfError};
    use serde_json::json;

    fn tuner_tree() -> serde_json::Value {
        json!({
            "ai-runtime-conditions": {
                "run-config": { "verbose": { "choice": 1 } },
                "stop-config": {
                    "training_iteration": { "choice": 200 },
                    "timesteps_total": { "choice": 100000 },
                    "episode_reward_mean": { "choice": 475.0 }
                },
                "checkpoint-config": {
                    "checkpoint_frequency": { "choice": 10 },
                    "checkpoint_at_end": { "choice": true }
                }
            }
        })
    }

    #[test]
    fn resolves_full_run_config() {
        let tree = DirectiveTree::new(tuner_tree());
        let run_config = resolve_run_config(&tree.root()).unwrap();

        assert_eq!(run_config.stop.get("timesteps_total"), Some(&json!(100000)));
        assert_eq!(run_config.stop.get("episode_reward_mean"), Some(&json!(475.0)));
        assert_eq!(run_config.stop.len(), 3);
        assert!(run_config.checkpoint.checkpoint_at_end);
        assert_eq!(run_config.checkpoint.checkpoint_frequency, 10);
        assert_eq!(run_config.verbose, 1);
    }

    #[test]
    fn extra_stop_metrics_are_kept() {
        let mut value = tuner_tree();
        value["ai-runtime-conditions"]["stop-config"]["time_total_s"] = json!({ "choice": 3600 });

        let tree = DirectiveTree::new(value);
        let run_config = resolve_run_config(&tree.root()).unwrap();
        assert_eq!(run_config.stop.get("time_total_s"), Some(&json!(3600)));
        assert_eq!(run_config.stop.len(), 4);
    }

    #[test]
    fn missing_stop_metric_is_reported() {
        let mut value = tuner_tree();
        value["ai-runtime-conditions"]["stop-config"]
            .as_object_mut()
            .unwrap()
            .remove("timesteps_total");

        let tree = DirectiveTree::new(value);
        let err = resolve_run_config(&tree.root()).unwrap_err();
        assert_eq!(
            err.directive_path(),
            Some("ai-runtime-conditions.stop-config.timesteps_total")
        );
    }

    #[test]
    fn missing_checkpoint_section_is_reported() {
        let mut value = tuner_tree();
        value["ai-runtime-conditions"]
            .as_object_mut()
            .unwrap()
            .remove("checkpoint-config");

        let tree = DirectiveTree::new(value);
        let err = resolve_run_config(&tree.root()).unwrap_err();
        assert!(matches!(
            err,
            RfError::MissingSection { ref section } if section == "ai-runtime-conditions.checkpoint-config"
        ));
    }

    #[test]
    fn mistyped_checkpoint_flag_is_invalid() {
        let mut value = tuner_tree();
        value["ai-runtime-conditions"]["checkpoint-config"]["checkpoint_at_end"] =
            json!({ "choice": "yes" });

        let tree = DirectiveTree::new(value);
        let err = resolve_run_config(&tree.root()).unwrap_err();
        assert!(matches!(err, RfError::InvalidValue { .. }));
    }
}
