use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use super::RenderError;

/// Installs the runtime a renderer needs (for Chrome: the browser itself)
#[async_trait]
pub trait RuntimeInstaller: Send + Sync {
    async fn install(&self) -> Result<(), RenderError>;
}

/// Runs a configured shell-free command line, e.g. `npx @puppeteer/browsers install chrome@stable`
pub struct CommandInstaller {
    command: String,
}

impl CommandInstaller {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.trim().to_string(),
        }
    }
}

#[async_trait]
impl RuntimeInstaller for CommandInstaller {
    async fn install(&self) -> Result<(), RenderError> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| RenderError::InstallFailed("no install command configured".to_string()))?;

        info!(command = %self.command, "Installing rendering runtime");
        let output = Command::new(program)
            .args(parts)
            .output()
            .await
            .map_err(|e| RenderError::InstallFailed(format!("{}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, stderr = %stderr, "Runtime installation failed");
            return Err(RenderError::InstallFailed(format!("{} ({})", output.status, stderr)));
        }

        info!("Rendering runtime installed");
        Ok(())
    }
}
