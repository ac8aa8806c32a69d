use clap::Parser;
use topology::Provisioner;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, EnvFilter};

use provisioner::{cli::Cli, commands, types::Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    // Use JSON format for staging/production, regular format for development
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let (config, command) = Cli::parse().into_parts(&environment);
    info!("Starting provisioner in {:?} environment", environment);

    let provisioner = Provisioner::connect(config).await;

    if let Err(e) = commands::run(&provisioner, command, &mut std::io::stdout()).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
