//! Service configuration

use anyhow::Result;
use std::path::PathBuf;

/// Check-in service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Root directory for stored submission content
    pub upload_dir: PathBuf,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDR`: Listen address (default: 0.0.0.0:3000)
    /// - `UPLOAD_DIR`: Submission content root (default: uploads)
    pub fn from_env() -> Result<Self> {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let upload_dir = std::env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "uploads".to_string())
            .into();

        Ok(AppConfig {
            bind_addr,
            upload_dir,
        })
    }
}
