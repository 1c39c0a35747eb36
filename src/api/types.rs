//! Shared state for the API router.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::error::ApiError;
use crate::db::Database;
use crate::uploads::FileStore;

/// Shared context for all API routes. The connection is not `Sync`, so
/// handlers take the lock for the duration of their synchronous work and
/// never hold it across an `.await`.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Database>>,
    pub files: Arc<FileStore>,
}

impl ApiContext {
    pub fn new(db: Database, files: FileStore) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            files: Arc::new(files),
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}
