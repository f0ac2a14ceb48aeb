//! Audio file selected for transcription.
//!
//! Format and size checks belong to whoever picks the file (the CLI here);
//! the controller accepts any [`AudioAsset`] it is given.

use bytes::Bytes;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Largest file the picker accepts (100 MB)
pub const MAX_ASSET_BYTES: u64 = 100 * 1024 * 1024;

pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "audio/mp3",
    "audio/wav",
    "audio/mpeg",
    "audio/ogg",
    "audio/m4a",
    "audio/x-m4a",
];

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Unsupported audio type {0:?}. Please use MP3, WAV, M4A or OGG")]
    UnsupportedType(String),
    #[error("File too large: {size_bytes} bytes (limit is 100MB)")]
    TooLarge { size_bytes: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory audio payload plus the metadata the service needs.
///
/// Immutable once built; the controller shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    name: String,
    mime_type: String,
    data: Bytes,
}

impl AudioAsset {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing the MIME type from its extension.
    pub async fn from_path(path: &Path) -> Result<Self, AssetError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        let mime_type = mime_from_extension(path).unwrap_or("application/octet-stream");

        let data = tokio::fs::read(path).await?;
        debug!("Loaded {} ({} bytes, {})", name, data.len(), mime_type);

        Ok(Self::new(name, mime_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Raw bytes. Cloning is cheap (reference counted).
    pub fn data(&self) -> Bytes {
        self.data.clone()
    }

    /// Check type and size the same way the file picker does.
    pub fn validate(&self) -> Result<(), AssetError> {
        if !ACCEPTED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(AssetError::UnsupportedType(self.mime_type.clone()));
        }
        if self.size() > MAX_ASSET_BYTES {
            return Err(AssetError::TooLarge {
                size_bytes: self.size(),
            });
        }
        Ok(())
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "mpeg" | "mpga" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "ogg" | "oga" => Some("audio/ogg"),
        "m4a" => Some("audio/x-m4a"),
        _ => None,
    }
}
