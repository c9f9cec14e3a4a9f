use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::StorageError;
use crate::models::photo::PhotoMetadata;

/// Path of the JSON sidecar for a photo: `{stem}.metadata.json`.
pub fn metadata_path(photo_path: &Path) -> PathBuf {
    photo_path.with_extension("metadata.json")
}

/// Write photo metadata as a JSON sidecar file next to the photo.
pub fn write_metadata(metadata: &PhotoMetadata, photo_path: &Path) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| StorageError::Serialization(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(photo_path), json)
        .map_err(|e| StorageError::Io(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read photo metadata from its JSON sidecar file.
pub fn read_metadata(photo_path: &Path) -> Result<PhotoMetadata, StorageError> {
    let json = fs::read_to_string(metadata_path(photo_path))
        .map_err(|e| StorageError::Io(format!("failed to read metadata: {}", e)))?;
    let metadata: PhotoMetadata = serde_json::from_str(&json)
        .map_err(|e| StorageError::Serialization(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}
