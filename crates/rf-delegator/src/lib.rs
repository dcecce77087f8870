//! # rf-delegator
//!
//! Delegators sequence construct resolution into higher-level artifacts: the
//! [`TrainableConstructDelegator`] commits one construct into a parameter
//! space, and the [`TunerDelegator`] pairs it with the run configuration to
//! produce a job descriptor.

mod run_config;
mod trainable;
mod tuner;

pub use run_config::{
    resolve_run_config, AI_RUNTIME_CONDITIONS, CHECKPOINT_CONFIG, RUN_CONFIG, STOP_CONFIG,
};
pub use trainable::TrainableConstructDelegator;
pub use tuner::TunerDelegator;
