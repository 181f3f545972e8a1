use std::{collections::HashMap, path::PathBuf};

use alloy::primitives::B256;
use clap::Parser;
use figment::{providers::Serialized, value::Value};

use crate::config::Network;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "light-client", about = "Beacon chain light client")]
pub struct CliConfig {
    #[arg(short, long, default_value = "mainnet")]
    pub network: String,

    #[arg(long, help = "Path to a TOML config file, keyed by network name")]
    pub config_path: Option<PathBuf>,

    #[arg(short = 'w', long, help = "Trusted checkpoint block root")]
    pub checkpoint: Option<B256>,

    #[arg(short, long)]
    pub consensus_rpc: Option<String>,

    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, help = "Checkpointz provider used when the checkpoint is too old")]
    pub fallback: Option<String>,

    #[arg(short = 's', long)]
    pub strict_checkpoint_age: bool,
}

impl CliConfig {
    pub fn network(&self) -> Result<Network, strum::ParseError> {
        self.network.parse()
    }

    /// Only the flags that were actually passed, so they override lower layers without
    /// clobbering them with defaults.
    pub fn as_provider(&self) -> Serialized<HashMap<&'static str, Value>> {
        let mut user_dict = HashMap::new();

        if let Some(checkpoint) = &self.checkpoint {
            user_dict.insert("checkpoint", Value::from(checkpoint.to_string()));
        }

        if let Some(rpc) = &self.consensus_rpc {
            user_dict.insert("consensus_rpc", Value::from(rpc.clone()));
        }

        if let Some(data_dir) = &self.data_dir {
            user_dict.insert("data_dir", Value::from(data_dir.display().to_string()));
        }

        if let Some(fallback) = &self.fallback {
            user_dict.insert("fallback", Value::from(fallback.clone()));
        }

        if self.strict_checkpoint_age {
            user_dict.insert("strict_checkpoint_age", Value::from(true));
        }

        Serialized::globals(user_dict)
    }
}
