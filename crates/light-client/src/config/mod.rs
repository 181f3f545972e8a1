pub mod base;
pub mod cli;
pub mod client_config;
pub mod networks;
pub mod types;

pub use base::BaseConfig;
pub use cli::CliConfig;
pub use networks::Network;
pub use types::{ChainConfig, Fork, Forks};
