use std::env;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Encode bytes as a `0x` prefixed hex string.
pub fn hex_encode<T: AsRef<[u8]>>(data: T) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decode a hex string, with or without the `0x` prefix.
pub fn hex_decode(data: &str) -> Result<Vec<u8>> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    Ok(hex::decode(stripped)?)
}

/// Installs the global `tracing` subscriber, honouring `RUST_LOG` and defaulting to `info`.
pub fn init_tracing_logger() {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let env_filter = match rust_log.is_empty() {
        true => EnvFilter::builder().parse_lossy("info"),
        false => EnvFilter::builder().parse_lossy(rust_log),
    };

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
