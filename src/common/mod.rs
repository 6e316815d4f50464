//! Common utilities and types shared across kvfab

pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

pub use config::{Config, EngineConfig, NodeConfig, NodeIdentity, TlsConfig, CLIENT_PORT, PEER_PORT};
pub use error::{Error, Result};
pub use logging::{init_logging, LogHandle};
pub use utils::{Sleeper, TokioSleeper};
