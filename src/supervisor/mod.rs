//! Engine process supervision
//!
//! Renders the engine command line and launches it, recording its PID.

pub mod args;
pub mod process;

pub use args::engine_args;
pub use process::ProcessSupervisor;

use crate::common::Result;
use async_trait::async_trait;

/// Starts the storage engine.
#[async_trait]
pub trait Supervisor: Send {
    /// Launch the engine with `args` and record its PID.
    async fn start(&mut self, args: Vec<String>) -> Result<()>;

    /// PID of the started engine, if any
    fn pid(&self) -> Option<u32>;
}
