#![forbid(unsafe_code)]

use clap::Parser;
use std::path::PathBuf;

/// Runtime configuration. Every flag falls back to its environment variable, then the default.
#[derive(Clone, Debug, Parser)]
#[command(name = "roadmap_server", version, about = "Roadmap document sync server")]
pub struct ServerConfig {
    /// Directory holding the document database.
    #[arg(long, env = "ROADMAP_STORAGE_DIR", default_value = ".roadmap")]
    pub storage_dir: PathBuf,

    #[arg(long, env = "ROADMAP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "ROADMAP_PORT", default_value_t = 8080)]
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
