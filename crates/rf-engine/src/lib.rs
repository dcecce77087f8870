// RolloutForge engine
// Loads an experiment directive, delegates it into a job descriptor and hands
// it to the execution runtime.

pub mod engine;
pub mod runtime;
pub mod settings;
pub mod telemetry;

pub use engine::{Engine, CONSTRUCT_REGISTRY, TUNER_SPACE};
pub use runtime::{
    ExecutionRuntime, ResultsHandle, RuntimeConfig, RuntimeEnv, RuntimeGuard, SpoolRuntime,
};
pub use settings::EngineSettings;
