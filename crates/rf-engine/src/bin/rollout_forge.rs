use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use rf_construct::ConstructRegistry;
use rf_engine::telemetry::init_tracing;
use rf_engine::{Engine, EngineSettings, RuntimeConfig, SpoolRuntime};

/// Resolve an experiment directive into a tuning job and submit it.
#[derive(Debug, Parser)]
#[command(name = "rollout-forge", version)]
struct Cli {
    /// Top-level experiment directive.
    #[arg(long, env = "ROLLOUT_FORGE_CONFIG", default_value = "configs/basic-config.yaml")]
    config: PathBuf,

    /// Directory construct files are resolved against.
    #[arg(long, env = "ROLLOUT_FORGE_TRAINABLE_DIR", default_value = "configs/trainables")]
    trainable_dir: PathBuf,

    /// Directory the Ray driver picks job descriptors up from.
    #[arg(long, env = "ROLLOUT_FORGE_SPOOL_DIR", default_value = ".rollout-forge/spool")]
    spool_dir: PathBuf,

    /// Ray cluster address.
    #[arg(long, env = "RAY_ADDRESS")]
    ray_address: Option<String>,

    #[arg(long, default_value = "rollout-forge")]
    namespace: String,

    /// Print the job descriptor instead of submitting it.
    #[arg(long)]
    dry_run: bool,

    /// List registered construct types and exit.
    #[arg(long)]
    list_constructs: bool,

    #[arg(long)]
    json_logs: bool,

    #[arg(long, default_value = "info")]
    log_level: Level,
}

impl Cli {
    fn settings(&self) -> EngineSettings {
        EngineSettings::default()
            .with_config_path(&self.config)
            .with_trainable_config_dir(&self.trainable_dir)
            .with_runtime(RuntimeConfig {
                address: self.ray_address.clone(),
                namespace: self.namespace.clone(),
                runtime_env: None,
                spool_dir: self.spool_dir.clone(),
            })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs, cli.log_level);

    if cli.list_constructs {
        for construct_type in ConstructRegistry::global().construct_types() {
            println!("{construct_type}");
        }
        return Ok(());
    }

    let engine = Engine::from_settings(cli.settings())
        .with_context(|| format!("could not load {}", cli.config.display()))?;

    if cli.dry_run {
        let job = engine.build_job()?;
        println!("{}", serde_json::to_string_pretty(&job.to_tune_payload())?);
        return Ok(());
    }

    let mut runtime = SpoolRuntime::new(engine.settings().runtime.clone());
    let handle = engine.start_rollout_and_learn(&mut runtime)?;
    info!("Job {} handed off", handle.job_id);
    println!("{}", serde_json::to_string_pretty(&handle)?);
    Ok(())
}
