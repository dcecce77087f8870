//! Execution runtime configuration and the scoped runtime guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use rf_types::{runtime_error, JobDescriptor, JobId, RfResult};

/// Configuration for the execution runtime the job is handed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Ray cluster address (e.g. "ray://localhost:10001"); `None` lets the
    /// driver start or discover a local cluster.
    pub address: Option<String>,

    /// Namespace for submitted jobs.
    pub namespace: String,

    /// Runtime environment packages (pip requirements).
    pub runtime_env: Option<RuntimeEnv>,

    /// Directory the driver picks job descriptors up from.
    pub spool_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            address: None,
            namespace: "rollout-forge".to_string(),
            runtime_env: None,
            spool_dir: PathBuf::from(".rollout-forge/spool"),
        }
    }
}

/// Runtime environment for workers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuntimeEnv {
    /// Python packages to install on workers.
    pub pip: Vec<String>,
    /// Working directory (uploaded to cluster).
    pub working_dir: Option<String>,
    /// Environment variables.
    pub env_vars: HashMap<String, String>,
}

/// Handle returned by a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsHandle {
    pub job_id: JobId,
    pub trainable: String,
    /// Where the runtime recorded the submission.
    pub location: PathBuf,
    pub submitted_at: DateTime<Utc>,
}

/// The external tuning engine, seen from this side of the boundary.
pub trait ExecutionRuntime {
    fn init(&mut self) -> RfResult<()>;

    /// One-shot submission; the descriptor is consumed.
    fn submit(&mut self, job: JobDescriptor) -> RfResult<ResultsHandle>;

    fn shutdown(&mut self) -> RfResult<()>;
}

/// Holds an initialized runtime and shuts it down when released or dropped.
pub struct RuntimeGuard<'r, R: ExecutionRuntime + ?Sized> {
    runtime: &'r mut R,
    released: bool,
}

impl<'r, R: ExecutionRuntime + ?Sized> RuntimeGuard<'r, R> {
    pub fn acquire(runtime: &'r mut R) -> RfResult<Self> {
        runtime.init()?;
        info!("Execution runtime acquired");
        Ok(Self {
            runtime,
            released: false,
        })
    }

    pub fn submit(&mut self, job: JobDescriptor) -> RfResult<ResultsHandle> {
        self.runtime.submit(job)
    }

    /// Shut the runtime down, reporting any shutdown failure.
    pub fn release(mut self) -> RfResult<()> {
        self.released = true;
        let result = self.runtime.shutdown();
        info!("Execution runtime released");
        result
    }
}

impl<R: ExecutionRuntime + ?Sized> Drop for RuntimeGuard<'_, R> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.runtime.shutdown() {
                warn!("Failed to shut down execution runtime: {}", e);
            }
        }
    }
}

/// Hands job descriptors to a Ray driver through a spool directory.
///
/// `init` prepares the directory, `submit` writes `<job-id>.json` holding the
/// Tune payload plus the cluster settings, `shutdown` closes the session.
#[derive(Debug)]
pub struct SpoolRuntime {
    config: RuntimeConfig,
    initialized: bool,
}

impl SpoolRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl ExecutionRuntime for SpoolRuntime {
    fn init(&mut self) -> RfResult<()> {
        if self.initialized {
            return Err(runtime_error!("runtime is already initialized"));
        }
        std::fs::create_dir_all(&self.config.spool_dir)?;
        self.initialized = true;
        info!(
            "Spool runtime ready at {} (namespace {})",
            self.config.spool_dir.display(),
            self.config.namespace
        );
        Ok(())
    }

    fn submit(&mut self, job: JobDescriptor) -> RfResult<ResultsHandle> {
        if !self.initialized {
            return Err(runtime_error!("submission before runtime init"));
        }

        let mut payload = job.to_tune_payload();
        payload["cluster"] = json!({
            "address": self.config.address,
            "namespace": self.config.namespace,
            "runtime_env": self.config.runtime_env,
        });

        let location = self.config.spool_dir.join(format!("{}.json", job.id()));
        std::fs::write(&location, serde_json::to_vec_pretty(&payload)?)?;
        info!("Submitted job {} to {}", job.id(), location.display());

        Ok(ResultsHandle {
            job_id: job.id(),
            trainable: job.trainable().to_string(),
            location,
            submitted_at: Utc::now(),
        })
    }

    fn shutdown(&mut self) -> RfResult<()> {
        if self.initialized {
            self.initialized = false;
            info!("Spool runtime shut down");
        }
        Ok(())
    }
}

/// Test double shared by the runtime and engine tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records lifecycle calls; optionally fails submission.
    #[derive(Default)]
    pub(crate) struct RecordingRuntime {
        pub(crate) calls: Vec<&'static str>,
        pub(crate) fail_submit: bool,
    }

    impl ExecutionRuntime for RecordingRuntime {
        fn init(&mut self) -> RfResult<()> {
            self.calls.push("init");
            Ok(())
        }

        fn submit(&mut self, job: JobDescriptor) -> RfResult<ResultsHandle> {
            self.calls.push("submit");
            if self.fail_submit {
                return Err(runtime_error!("cluster unavailable"));
            }
            Ok(ResultsHandle {
                job_id: job.id(),
                trainable: job.trainable().to_string(),
                location: PathBuf::new(),
                submitted_at: Utc::now(),
            })
        }

        fn shutdown(&mut self) -> RfResult<()> {
            self.calls.push("shutdown");
            Ok(())
        }
    }
}
