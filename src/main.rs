use anyhow::Result;
use clap::Parser;
use section_runner::cli::{Action, Args};
use section_runner::config::{ConfigStore, FileStorage, LoadOrigin};
use section_runner::executor::SimulatedExecutor;
use section_runner::orchestrator::SectionOrchestrator;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let (store, origin) = ConfigStore::load_or_init(FileStorage::new(&args.config))?;
    if origin == LoadOrigin::Created {
        println!(
            "Created default configuration file: {}",
            args.config.display()
        );
    }
    let executor = SimulatedExecutor::from_env()?;
    tracing::debug!(
        latency_ms = executor.latency().as_millis() as u64,
        "simulated executor ready"
    );
    let mut orchestrator = SectionOrchestrator::new(store, executor, std::io::stdout().lock());

    match args.action() {
        Action::List => orchestrator.list_sections()?,
        Action::Enable(name) => {
            orchestrator.enable_section(&name)?;
        }
        Action::Disable(name) => {
            orchestrator.disable_section(&name)?;
        }
        Action::Summary => orchestrator.summary()?,
        Action::RunAll => {
            orchestrator.run_all_enabled()?;
        }
        Action::RunNamed(names) => {
            orchestrator.run_sections(&names)?;
        }
        Action::RunPolicy => {
            orchestrator.run_from_policy()?;
        }
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
