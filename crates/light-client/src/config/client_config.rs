use std::path::{Path, PathBuf};

use alloy::primitives::{FixedBytes, B256};
use anyhow::{anyhow, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::Deserialize;

use crate::config::{BaseConfig, ChainConfig, CliConfig, Forks, Network};

pub const ENV_PREFIX: &str = "LIGHT_CLIENT_";

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Config {
    pub consensus_rpc: String,
    pub default_checkpoint: B256,
    #[serde(default)]
    pub checkpoint: Option<B256>,
    pub data_dir: Option<PathBuf>,
    pub chain: ChainConfig,
    pub forks: Forks,
    pub max_checkpoint_age: u64,
    pub fallback: Option<String>,
    #[serde(default)]
    pub strict_checkpoint_age: bool,
}

impl Config {
    /// Layers the built-in network config, the optional TOML file, `LIGHT_CLIENT_*` environment
    /// variables and finally the command line flags.
    pub fn from_file(
        config_path: Option<&Path>,
        network: Network,
        cli_config: &CliConfig,
    ) -> Result<Self> {
        let profile = network.to_string();
        let mut figment =
            Figment::new().merge(Serialized::from(network.to_base_config(), profile.as_str()));

        if let Some(config_path) = config_path {
            figment = figment.merge(Toml::file(config_path).nested());
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).global())
            .merge(cli_config.as_provider())
            .select(profile.as_str())
            .extract()
            .map_err(|err| match err.kind {
                figment::error::Kind::MissingField(field) => {
                    let field = field.replace('_', "-");
                    anyhow!(
                        "missing configuration field: {field}, try supplying the proper command line argument: --{field}"
                    )
                }
                _ => anyhow!("cannot parse configuration: {err}"),
            })
    }

    pub fn fork_version(&self, slot: u64) -> FixedBytes<4> {
        self.forks.fork_version(slot)
    }

    pub fn to_base_config(&self) -> BaseConfig {
        BaseConfig {
            consensus_rpc: Some(self.consensus_rpc.clone()),
            default_checkpoint: self.default_checkpoint,
            chain: self.chain.clone(),
            forks: self.forks.clone(),
            max_checkpoint_age: self.max_checkpoint_age,
        }
    }
}
