#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unwrap_used)]
mod client;
pub use crate::client::*;

pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod consensus;
pub mod database;
pub mod errors;
pub mod node;
pub mod test_utils;
pub mod utils;
