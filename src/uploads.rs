//! On-disk storage for uploaded documents.
//!
//! Files live at `<root>/<applicationId>/<prefix>-<uuid><ext>` and are
//! referenced as `/uploads/<applicationId>/<file>`, which is also the URL they
//! are served under.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::{Result, TrackerError};
use crate::models::DocumentRole;

pub const ALLOWED_EXTENSIONS: [&str; 3] = [".pdf", ".doc", ".docx"];
pub const PUBLIC_PREFIX: &str = "/uploads";

static UNSAFE_PREFIX_CHARS: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]"));

/// Lower-cased extension with its dot, if it is one we accept.
pub fn validate_extension(file_name: &str) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()));

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        Some(ext) => Err(TrackerError::UnsupportedFileType { extension: ext }),
        None => Err(TrackerError::UnsupportedFileType {
            extension: "unknown".to_string(),
        }),
    }
}

fn stored_file_name(prefix: &str, extension: &str) -> Result<String> {
    let re = UNSAFE_PREFIX_CHARS.as_ref().map_err(Clone::clone)?;
    let safe = re.replace_all(&prefix.to_lowercase(), "").into_owned();
    let safe = if safe.is_empty() { "file".to_string() } else { safe };
    Ok(format!("{}-{}{}", safe, Uuid::new_v4(), extension))
}

fn is_plain_component(part: &str) -> bool {
    let mut components = Path::new(part).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` for the application and returns the stored reference.
    /// The extension is checked before anything touches the disk.
    pub fn save(
        &self,
        application_id: &str,
        role: DocumentRole,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let extension = validate_extension(original_name)?;
        if !is_plain_component(application_id) {
            return Err(TrackerError::validation("Invalid application id"));
        }

        let dir = self.root.join(application_id);
        std::fs::create_dir_all(&dir)?;

        let file_name = stored_file_name(role.prefix(), &extension)?;
        std::fs::write(dir.join(&file_name), bytes)?;

        tracing::info!(
            application_id,
            file = %file_name,
            size = bytes.len(),
            "stored upload"
        );
        Ok(format!("{PUBLIC_PREFIX}/{application_id}/{file_name}"))
    }

    /// Maps a stored reference back to a path under the root. References that
    /// point anywhere else yield `None`.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let relative = reference
            .strip_prefix(PUBLIC_PREFIX)?
            .trim_start_matches('/');
        let parts: Vec<&str> = relative.split('/').collect();
        if parts.len() != 2 || !parts.iter().all(|part| is_plain_component(part)) {
            return None;
        }
        Some(self.root.join(parts[0]).join(parts[1]))
    }

    /// Removes a stored file. A file that is already gone is not an error;
    /// any other failure is.
    pub fn delete(&self, reference: &str) -> Result<()> {
        let Some(path) = self.resolve(reference) else {
            tracing::warn!(reference, "not a stored upload reference; skipping delete");
            return Ok(());
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(reference, "upload already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drops the application's upload directory if it is empty.
    pub fn remove_application_dir(&self, application_id: &str) {
        if !is_plain_component(application_id) {
            return;
        }
        if let Err(e) = std::fs::remove_dir(self.root.join(application_id)) {
            tracing::debug!(application_id, error = %e, "upload directory left in place");
        }
    }
}
