use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};

use alloy::primitives::B256;
use anyhow::Result;

use crate::{config::client_config::Config, consensus::types::BeaconBlockHeader};

const CHECKPOINT_FILE: &str = "checkpoint";
const FINALIZED_LOG_FILE: &str = "finalized.log";

pub trait Database: Send + Sync + 'static {
    fn new(config: &Config) -> Result<Self>
    where
        Self: Sized;
    fn save_checkpoint(&self, checkpoint: B256) -> Result<()>;
    fn load_checkpoint(&self) -> Result<B256>;
    /// Records a newly finalized header.
    fn append_finalized_header(&self, header: &BeaconBlockHeader) -> Result<()>;
    fn load_finalized_headers(&self) -> Result<Vec<BeaconBlockHeader>>;
}

#[derive(Clone)]
pub struct FileDB {
    data_dir: PathBuf,
    default_checkpoint: B256,
}

impl Database for FileDB {
    fn new(config: &Config) -> Result<Self> {
        if let Some(data_dir) = &config.data_dir {
            return Ok(FileDB {
                data_dir: data_dir.to_path_buf(),
                default_checkpoint: config.default_checkpoint,
            });
        }

        anyhow::bail!("data dir not in config")
    }

    fn save_checkpoint(&self, checkpoint: B256) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::write(self.data_dir.join(CHECKPOINT_FILE), checkpoint.as_slice())?;
        Ok(())
    }

    fn load_checkpoint(&self) -> Result<B256> {
        let Ok(bytes) = fs::read(self.data_dir.join(CHECKPOINT_FILE)) else {
            return Ok(self.default_checkpoint);
        };
        Ok(B256::try_from(bytes.as_slice()).unwrap_or(self.default_checkpoint))
    }

    // One JSON encoded header per line.
    fn append_finalized_header(&self, header: &BeaconBlockHeader) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.data_dir.join(FINALIZED_LOG_FILE))?;
        writeln!(file, "{}", serde_json::to_string(header)?)?;
        Ok(())
    }

    fn load_finalized_headers(&self) -> Result<Vec<BeaconBlockHeader>> {
        let Ok(file) = fs::File::open(self.data_dir.join(FINALIZED_LOG_FILE)) else {
            return Ok(vec![]);
        };

        let mut headers = vec![];
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            headers.push(serde_json::from_str(&line)?);
        }
        Ok(headers)
    }
}

pub struct ConfigDB {
    checkpoint: B256,
}

impl Database for ConfigDB {
    fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            checkpoint: config.checkpoint.unwrap_or(config.default_checkpoint),
        })
    }

    fn load_checkpoint(&self) -> Result<B256> {
        Ok(self.checkpoint)
    }

    fn save_checkpoint(&self, _checkpoint: B256) -> Result<()> {
        Ok(())
    }

    fn append_finalized_header(&self, _header: &BeaconBlockHeader) -> Result<()> {
        Ok(())
    }

    fn load_finalized_headers(&self) -> Result<Vec<BeaconBlockHeader>> {
        Ok(vec![])
    }
}
