use anyhow::Result;
use clap::Parser;
use light_client::{
    config::{client_config::Config, CliConfig},
    consensus::rpc::nimbus_rpc::NimbusRpc,
    database::FileDB,
    utils::init_tracing_logger,
    Client, ClientBuilder,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing_logger();

    let cli_config = CliConfig::parse();
    let network = cli_config.network()?;
    let config = Config::from_file(cli_config.config_path.as_deref(), network, &cli_config)?;

    let mut client: Client<FileDB, NimbusRpc> = ClientBuilder::new()
        .network(network)
        .config(config)
        .build()?;

    info!(%network, "Starting consensus light client...");
    client.start().await?;

    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    client.shutdown().await;

    Ok(())
}
