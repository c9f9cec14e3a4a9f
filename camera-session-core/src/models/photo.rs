use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata stored alongside a captured photo.
///
/// Serializable for the JSON sidecar written by the directory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub id: String,
    pub file_path: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub created_at: String,
}

impl PhotoMetadata {
    /// Creates metadata for `data` about to be written to `file_path`.
    pub fn new(file_path: &Path, data: &[u8]) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_string_lossy().into_owned(),
            size_bytes: data.len() as u64,
            checksum: sha256_hex(data),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{:02x}", b)).collect()
}
