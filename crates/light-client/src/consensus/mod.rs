pub mod constants;
pub mod errors;
pub mod merkle;
pub mod rpc;
pub mod store;
pub mod types;
pub mod utils;

mod consensus_client;
pub use crate::consensus::consensus_client::*;
