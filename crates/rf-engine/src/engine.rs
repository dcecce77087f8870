// Top-level orchestration: load the experiment directive, delegate it into a
// job descriptor and submit it inside a scoped execution runtime.

use tracing::{info, warn};

use rf_delegator::TunerDelegator;
use rf_types::{load_directive_file, DirectiveTree, JobDescriptor, RfResult};

use crate::runtime::{ExecutionRuntime, ResultsHandle, RuntimeGuard};
use crate::settings::EngineSettings;

/// Top-level section holding the construct registry directive.
pub const CONSTRUCT_REGISTRY: &str = "construct-registry";
/// Top-level section holding the tuner directive.
pub const TUNER_SPACE: &str = "tuner-space";

/// Drives the delegation chain for a single-construct experiment.
#[derive(Debug)]
pub struct Engine {
    settings: EngineSettings,
    config: DirectiveTree,
}

impl Engine {
    /// Load the top-level directive named by the settings.
    pub fn from_settings(settings: EngineSettings) -> RfResult<Self> {
        let config = load_directive_file(&settings.config_path)?;
        info!("Loaded experiment directive from {}", settings.config_path.display());
        Ok(Self::new(settings, config))
    }

    pub fn new(settings: EngineSettings, config: DirectiveTree) -> Self {
        Self { settings, config }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Resolve the full job descriptor without touching any runtime.
    pub fn build_job(&self) -> RfResult<JobDescriptor> {
        let tuner = TunerDelegator::from_trial_directive(
            &self.config.section(CONSTRUCT_REGISTRY)?,
            &self.config.section(TUNER_SPACE)?,
            &self.settings.trainable_config_dir,
        )?;
        tuner.delegate_tuner_entity()
    }

    /// Acquire the runtime, build and submit the job, then release the
    /// runtime whether or not anything failed.
    pub fn start_rollout_and_learn<R>(&self, runtime: &mut R) -> RfResult<ResultsHandle>
    where
        R: ExecutionRuntime + ?Sized,
    {
        let mut guard = RuntimeGuard::acquire(runtime)?;
        let outcome = self.build_job().and_then(|job| guard.submit(job));
        let released = guard.release();

        if let (Err(_), Err(release_err)) = (&outcome, &released) {
            warn!("Runtime shutdown also failed: {}", release_err);
        }
        let handle = outcome?;
        released?;
        Ok(handle)
    }
}
