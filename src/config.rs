use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const APP_NAME: &str = "applytrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DATABASE_FILE: &str = "applytrack.db";
const UPLOADS_DIR: &str = "uploads";

/// Where the database and uploads live, and where the server listens.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub bind: SocketAddr,
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>, bind: SocketAddr) -> Self {
        let data_dir = data_dir.unwrap_or_else(Self::default_data_dir);
        Self {
            database_path: data_dir.join(DATABASE_FILE),
            uploads_dir: data_dir.join(UPLOADS_DIR),
            data_dir,
            bind,
        }
    }

    pub fn default_data_dir() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", APP_NAME) {
            proj_dirs.data_dir().to_path_buf()
        } else {
            // Fallback to current directory
            PathBuf::from(".")
        }
    }

    pub fn default_bind() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 3000))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.uploads_dir)?;
        Ok(())
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }
}
