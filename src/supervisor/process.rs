//! Engine launcher backed by `tokio::process`

use crate::common::{Error, Result};
use crate::supervisor::Supervisor;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

pub struct ProcessSupervisor {
    program: PathBuf,
    pid_file: PathBuf,
    child: Option<Child>,
}

impl ProcessSupervisor {
    pub fn new(program: impl Into<PathBuf>, pid_file: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            pid_file: pid_file.into(),
            child: None,
        }
    }
}

/// Record `pid` at `path`, creating parent directories.
async fn write_pid(path: &Path, pid: u32) -> Result<()> {
    let pid_file_err = |source| Error::PidFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(pid_file_err)?;
        }
    }
    tokio::fs::write(path, pid.to_string())
        .await
        .map_err(pid_file_err)
}

#[async_trait]
impl Supervisor for ProcessSupervisor {
    async fn start(&mut self, args: Vec<String>) -> Result<()> {
        tracing::info!(
            action = "supervisor.start",
            program = %self.program.display(),
            args = ?args
        );

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| Error::ProcessStart {
                program: self.program.display().to_string(),
                source,
            })?;

        let pid = child.id().ok_or_else(|| {
            Error::Other(format!(
                "{} exited before reporting a pid",
                self.program.display()
            ))
        })?;
        self.child = Some(child);

        write_pid(&self.pid_file, pid).await?;
        tracing::info!(action = "supervisor.started", pid, pid_file = %self.pid_file.display());
        Ok(())
    }

    fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }
}
